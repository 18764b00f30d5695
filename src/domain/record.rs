//! Per-course exam date record.
//!
//! Status lifecycle:
//!
//! ```text
//! undefined → proposed → community-validated
//!                ↑               │
//!                └── correction ─┘
//! official (seeded only, absorbing)
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::proposal::{calendar_date, Proposal};

/// Status of a course's exam date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordStatus {
    /// No date has been proposed yet
    Undefined,

    /// A proposal is waiting for confirmations
    Proposed,

    /// The current proposal reached the quorum
    CommunityValidated,

    /// Administrator-sourced date; final
    Official,
}

impl Default for RecordStatus {
    fn default() -> Self {
        Self::Undefined
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Undefined => "undefined",
            Self::Proposed => "proposed",
            Self::CommunityValidated => "community-validated",
            Self::Official => "official",
        };
        f.write_str(label)
    }
}

/// Exam date state for a single course
///
/// Serialized with camelCase field names, the shape older documents use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamDateRecord {
    pub course_id: String,
    pub course_name: String,
    pub faculty_id: String,

    #[serde(default)]
    pub status: RecordStatus,

    /// Authoritative date, set only when `status` is official
    #[serde(
        default,
        deserialize_with = "calendar_date::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub official_date: Option<NaiveDate>,

    /// Where the official date came from (e.g. the faculty registrar)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_source: Option<String>,

    /// The single active proposal, if any
    #[serde(default)]
    pub current_proposal: Option<Proposal>,

    /// Superseded proposals, oldest first
    #[serde(default)]
    pub previous_proposals: Vec<Proposal>,

    #[serde(default)]
    pub total_students_in_course: u32,

    #[serde(default)]
    pub participating_students: u32,

    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,

    /// Optimistic concurrency counter, bumped by the store on every write
    #[serde(default)]
    pub version: u64,
}

impl ExamDateRecord {
    /// Create an empty record with no proposal
    pub fn new(
        course_id: impl Into<String>,
        course_name: impl Into<String>,
        faculty_id: impl Into<String>,
        total_students_in_course: u32,
    ) -> Self {
        Self {
            course_id: course_id.into(),
            course_name: course_name.into(),
            faculty_id: faculty_id.into(),
            status: RecordStatus::Undefined,
            official_date: None,
            official_source: None,
            current_proposal: None,
            previous_proposals: Vec::new(),
            total_students_in_course,
            participating_students: 0,
            last_updated: Utc::now(),
            version: 0,
        }
    }

    /// Mark the record official with an authoritative date
    pub fn with_official_date(mut self, date: NaiveDate, source: impl Into<String>) -> Self {
        self.status = RecordStatus::Official;
        self.official_date = Some(date);
        self.official_source = Some(source.into());
        self
    }

    /// Check whether the date is final
    pub fn is_official(&self) -> bool {
        self.status == RecordStatus::Official
    }

    /// Check whether the current proposal has the given id
    pub fn has_current_proposal(&self, proposal_id: &str) -> bool {
        self.current_proposal
            .as_ref()
            .map(|p| p.id == proposal_id)
            .unwrap_or(false)
    }

    /// Install `proposal` as current, archiving the previous one.
    ///
    /// The record always returns to `proposed`, whatever its prior
    /// validation state.
    pub fn replace_proposal(&mut self, proposal: Proposal) {
        if let Some(previous) = self.current_proposal.take() {
            self.previous_proposals.push(previous);
        }
        self.current_proposal = Some(proposal);
        self.status = RecordStatus::Proposed;
        self.last_updated = Utc::now();
    }

    /// The date students should plan for: official first, then the proposal
    pub fn effective_date(&self) -> Option<NaiveDate> {
        if self.is_official() {
            return self.official_date;
        }
        self.current_proposal.as_ref().map(|p| p.proposed_date)
    }
}
