// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! Free local TCP port allocation for installer mutex coordination (spec §6).

use std::net::{Ipv4Addr, SocketAddrV4, TcpListener};

use crate::errors::BootstrapError;

/// Preferred starting port for the `network:<port>` mutex. Installers that
/// need cross-invocation coordination (e.g. `yarn`) bind this to serialize
/// concurrent invocations against each other.
pub const PREFERRED_PORT: u16 = 42_424;

/// Allocates a free local TCP port, bound to the wildcard address.
///
/// Tries [`PREFERRED_PORT`] first so repeated runs land on a stable port
/// when nothing else is using it, then falls back to an OS-assigned
/// ephemeral port. The bound listener is dropped immediately: this merely
/// reserves the port number that gets embedded in the `mutex` option, it
/// does not hold it open across the installer invocations that use it.
pub fn allocate_free_port() -> Result<u16, BootstrapError> {
    let preferred = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, PREFERRED_PORT);

    if let Ok(listener) = TcpListener::bind(preferred) {
        return listener
            .local_addr()
            .map(|addr| addr.port())
            .map_err(BootstrapError::PortAllocationFailed);
    }

    let any = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0);
    let listener = TcpListener::bind(any).map_err(BootstrapError::PortAllocationFailed)?;

    listener
        .local_addr()
        .map(|addr| addr.port())
        .map_err(BootstrapError::PortAllocationFailed)
}

/// Builds the `mutex = "network:<port>"` value the orchestrator sets when
/// none was configured and the installer needs it.
pub fn allocate_network_mutex() -> Result<String, BootstrapError> {
    allocate_free_port().map(|port| format!("network:{port}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_a_usable_port() {
        let mutex = allocate_network_mutex().expect("port allocation should succeed");
        assert!(mutex.starts_with("network:"));
    }
}
