//! Events emitted by the exam date workflows.
//!
//! Every successful mutation produces one or more events. They are fanned
//! out by the notification center; they are not persisted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single workflow event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamDateEvent {
    /// Unique identifier for this event
    pub id: Uuid,

    /// When this event occurred (ISO 8601)
    pub timestamp: DateTime<Utc>,

    /// Course the event concerns
    pub course_id: String,

    /// Human readable course name
    pub course_name: String,

    /// Type of event
    pub event_type: EventType,

    /// User id that triggered the event
    pub actor_id: String,

    /// Proposal involved (the new one for proposals and corrections)
    pub proposal_id: String,

    /// Date carried by the proposal
    pub date: NaiveDate,

    /// Human-readable summary
    pub summary: String,
}

impl ExamDateEvent {
    /// Create a new event with the current timestamp
    pub fn new(
        event_type: EventType,
        course_id: impl Into<String>,
        course_name: impl Into<String>,
        actor_id: impl Into<String>,
        proposal_id: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        let course_name = course_name.into();
        let summary = event_type.describe(&course_name, date);

        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            course_id: course_id.into(),
            course_name,
            event_type,
            actor_id: actor_id.into(),
            proposal_id: proposal_id.into(),
            date,
            summary,
        }
    }
}

/// Types of workflow events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A new date was proposed
    Proposed,

    /// A peer confirmed the current proposal
    Confirmed,

    /// The current proposal reached the quorum
    Validated,

    /// A peer replaced the current proposal with a new date
    Corrected,
}

impl EventType {
    fn describe(self, course_name: &str, date: NaiveDate) -> String {
        match self {
            Self::Proposed => format!("New exam date proposed for {}: {}", course_name, date),
            Self::Confirmed => format!("Exam date for {} confirmed by a peer", course_name),
            Self::Validated => {
                format!("Exam date for {} validated by the community: {}", course_name, date)
            }
            Self::Corrected => format!("Exam date for {} corrected to {}", course_name, date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 12).unwrap();
        let event = ExamDateEvent::new(
            EventType::Validated,
            "loi-gauss",
            "Loi de Gauss",
            "dave",
            "prop-1-abcdef12",
            date,
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"validated\""));

        let parsed: ExamDateEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_summary_mentions_course_and_date() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 19).unwrap();
        let event = ExamDateEvent::new(
            EventType::Corrected,
            "loi-gauss",
            "Loi de Gauss",
            "eve",
            "prop-2-abcdef12",
            date,
        );

        assert!(event.summary.contains("Loi de Gauss"));
        assert!(event.summary.contains("2026-06-19"));
    }
}
