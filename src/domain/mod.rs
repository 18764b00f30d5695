//! Domain types for exam date coordination.
//!
//! This module contains the core data structures:
//! - Record: per-course exam date state
//! - Proposal: candidate dates with confirmations and corrections
//! - Actor: the user performing an action
//! - Events: notifications emitted by the workflows

pub mod actor;
pub mod events;
pub mod proposal;
pub mod record;

// Re-export commonly used types
pub use actor::Actor;
pub use events::{EventType, ExamDateEvent};
pub use proposal::{
    generate_id, Confirmation, Correction, Proposal, ProposalStatus, QUORUM_THRESHOLD,
};
pub use record::{ExamDateRecord, RecordStatus};
