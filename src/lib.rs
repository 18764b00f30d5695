//! examdates - Community exam date coordination
//!
//! Students propose exam dates for their courses, peers confirm them until
//! a quorum validates the date, and anyone but the proposer may correct a
//! proposal. Official dates seeded by the faculty are final.
//!
//! # Architecture
//!
//! - Records are stored per course in one JSON document
//! - Every write checks the record's version, so concurrent writers get a
//!   conflict instead of silently overwriting each other
//! - Workflows publish notifications to an injected notification center
//!
//! # Modules
//!
//! - `domain`: Data structures (ExamDateRecord, Proposal, Confirmation, Correction)
//! - `core`: Store, workflows, access policy, notifications, fixtures
//! - `courses`: Course catalog lookups
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Propose a date
//! examdates --user alice propose loi-gauss 2026-06-12
//!
//! # Confirm it
//! examdates --user bob confirm <proposal-id>
//!
//! # Show a course
//! examdates show loi-gauss
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod courses;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::core::{can_user_interact, ExamDateStore, ExamDates, NotificationCenter, Permissions};
pub use crate::courses::{CourseCatalog, CourseInfo, StaticCatalog};
pub use crate::domain::{
    Actor, Confirmation, Correction, ExamDateRecord, Proposal, ProposalStatus, RecordStatus,
    QUORUM_THRESHOLD,
};
