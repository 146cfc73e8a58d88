//! Phase 1 and phase 2 stage implementations, each a thin, independently
//! testable function the [`Orchestrator`](super::Orchestrator) sequences.

pub mod analytics;
pub mod clone;
pub mod embed;
pub mod graph_sync;
pub mod parse_dispatch;
