//! Core exam date coordination logic.
//!
//! This module contains:
//! - Store: keyed, versioned record persistence
//! - Policy: who may confirm or correct
//! - Workflow: propose / confirm / correct
//! - Notifications: in-memory pub/sub for workflow events
//! - Fixtures: seed data

pub mod fixtures;
pub mod notifications;
pub mod policy;
pub mod store;
pub mod workflow;

// Re-export commonly used types
pub use fixtures::fixture_records;
pub use notifications::{Notification, NotificationCenter};
pub use policy::{can_user_interact, Permissions, Rejection};
pub use store::{ExamDateStore, StoreError, SCHEMA_VERSION};
pub use workflow::{ExamDates, WorkflowError, WorkflowResult};
