//! Agora App - Headless Forum View Cores
//!
//! The portable application core of the forum. Each view here owns the
//! reconciled list a rendering layer displays: the topic board and one
//! topic's comment thread. Views merge a one-time snapshot with live
//! created/deleted events and local mutation outcomes into a single ordered,
//! de-duplicated sequence, and expose the minimal surface any UI (web, CLI,
//! TUI) needs: items, readiness, composers, action handlers, and the last
//! error/notice.
//!
//! Views are generic over the collaborator traits in `agora-client`;
//! production wires the HTTP and realtime transports, tests the in-memory
//! backend from `agora-testkit`.

#![forbid(unsafe_code)]

/// Explicit authenticated-session lifecycle
pub mod session;

/// Headless input state behind a create form
pub mod composer;

/// View cores and list reconciliation
pub mod views;

pub use composer::Composer;
pub use session::Session;
pub use views::{Keyed, ListPhase, LiveList, ThreadView, TopicBoard};
