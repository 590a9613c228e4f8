// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! Progress & Diagnostics Channel (spec §2.6, §6): structured events
//! surfaced to an external logger. The source's global mutable logger
//! becomes an injected sink here (spec §9) so tests can substitute a
//! recording sink instead of asserting on log output.

use std::sync::Mutex;

use strum::Display;

/// One of the named lifecycle phases the orchestrator drives (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    /// Phase A.
    #[strum(serialize = "preinstall")]
    Preinstall,
    /// Phase B.
    #[strum(serialize = "install")]
    Install,
    /// Phase C.
    #[strum(serialize = "symlink")]
    SymlinkSiblings,
    /// Phase D.
    #[strum(serialize = "postinstall")]
    Postinstall,
    /// Phase E.
    #[strum(serialize = "prepublish")]
    Prepublish,
    /// Phase F.
    #[strum(serialize = "prepare")]
    Prepare,
}

/// A warning code emitted by the planner (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum WarningCode {
    /// The root manifest's range for a hoisted dependency disagrees with
    /// the most commonly requested range.
    #[strum(serialize = "EHOIST_ROOT_VERSION")]
    HoistRootVersion,
    /// A package requested a different range than the one hoisted to root.
    #[strum(serialize = "EHOIST_PKG_VERSION")]
    HoistPkgVersion,
}

/// A single structured progress or diagnostic event (spec §6).
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// An informational line, e.g. `bootstrapping 12 packages`.
    Info(String),
    /// An `EHOIST_*` warning. Warnings are informational only and never
    /// halt execution (spec §7).
    Warning { code: WarningCode, message: String },
    /// A phase has started.
    PhaseBegin(Phase),
    /// A phase has finished successfully.
    PhaseEnd(Phase),
    /// `count` new work units were queued in `phase`.
    WorkAdded { phase: Phase, count: usize },
    /// `count` work units in `phase` finished.
    WorkCompleted { phase: Phase, count: usize },
}

/// Sink that progress and diagnostic events are delivered to.
///
/// Implementations must not block the caller for long: phases call this
/// synchronously as actions start and finish.
pub trait ProgressSink: Send + Sync {
    /// Handles one event.
    fn emit(&self, event: ProgressEvent);
}

/// Default sink: forwards every event to `tracing` at the level spec §6
/// assigns it (info for informational/phase markers, warn for `EHOIST_*`,
/// debug for per-action counters).
#[derive(Debug, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Info(message) => tracing::info!("{message}"),
            ProgressEvent::Warning { code, message } => tracing::warn!("{code}: {message}"),
            ProgressEvent::PhaseBegin(phase) => tracing::info!(":: starting {phase} phase"),
            ProgressEvent::PhaseEnd(phase) => tracing::info!(":: finished {phase} phase"),
            ProgressEvent::WorkAdded { phase, count } => {
                tracing::debug!("{phase}: {count} work unit(s) queued")
            }
            ProgressEvent::WorkCompleted { phase, count } => {
                tracing::debug!("{phase}: {count} work unit(s) completed")
            }
        }
    }
}

/// Test/embedding sink that records every event it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().expect("recording sink mutex poisoned").push(event);
    }
}

impl RecordingSink {
    /// Returns a clone of every event recorded so far, in emission order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("recording sink mutex poisoned").clone()
    }

    /// Convenience filter for warnings of a specific code.
    pub fn warnings_of(&self, code: WarningCode) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::Warning { code: c, message } if c == code => Some(message),
                _ => None,
            })
            .collect()
    }
}
