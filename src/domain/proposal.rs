//! Proposals and the peer actions recorded against them.
//!
//! A proposal is a single candidate exam date. Peers either confirm it
//! (counting towards the quorum) or correct it, which supersedes it with a
//! new proposal while keeping the original for audit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actor::Actor;

/// Number of independent peer confirmations that validate a proposal
pub const QUORUM_THRESHOLD: usize = 3;

/// Generate an identifier of the form `{prefix}-{millis}-{8 hex}`
///
/// The random suffix keeps ids unique when several are minted within the
/// same millisecond.
pub fn generate_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), &suffix[..8])
}

/// Calendar dates accept `YYYY-MM-DD` or a full RFC 3339 timestamp.
///
/// Older documents stored proposed dates as timestamps at midnight UTC.
pub(crate) mod calendar_date {
    use chrono::{DateTime, NaiveDate};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {}", raw)))
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {}", raw))))
            .transpose()
    }
}

/// Validation status of a single proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProposalStatus {
    /// Waiting for peer confirmations
    Pending,

    /// Quorum reached
    CommunityValidated,
}

impl Default for ProposalStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// A user-submitted candidate exam date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    /// Unique identifier (`prop-{millis}-{suffix}`)
    pub id: String,

    /// Course the date applies to
    pub course_id: String,

    /// Faculty of the course
    pub faculty_id: String,

    /// The proposed exam date
    #[serde(deserialize_with = "calendar_date::deserialize")]
    pub proposed_date: NaiveDate,

    /// User id of the proposer
    pub proposed_by: String,

    /// Display name of the proposer
    pub proposed_by_name: String,

    /// When the proposal was submitted
    pub proposed_at: DateTime<Utc>,

    /// Current validation status
    #[serde(default)]
    pub status: ProposalStatus,

    /// Peer confirmations (unique per user, proposer excluded)
    #[serde(default)]
    pub confirmations: Vec<Confirmation>,

    /// Corrections filed against this proposal
    #[serde(default)]
    pub corrections: Vec<Correction>,
}

impl Proposal {
    /// Create a new pending proposal with no confirmations
    pub fn new(
        course_id: impl Into<String>,
        faculty_id: impl Into<String>,
        proposed_date: NaiveDate,
        proposer: &Actor,
    ) -> Self {
        Self {
            id: generate_id("prop"),
            course_id: course_id.into(),
            faculty_id: faculty_id.into(),
            proposed_date,
            proposed_by: proposer.id.clone(),
            proposed_by_name: proposer.name.clone(),
            proposed_at: Utc::now(),
            status: ProposalStatus::Pending,
            confirmations: Vec::new(),
            corrections: Vec::new(),
        }
    }

    /// Check whether the given user submitted this proposal
    pub fn is_proposed_by(&self, user_id: &str) -> bool {
        self.proposed_by == user_id
    }

    /// Check whether the given user already confirmed this proposal
    pub fn is_confirmed_by(&self, user_id: &str) -> bool {
        self.confirmations.iter().any(|c| c.confirmed_by == user_id)
    }

    /// Number of confirmations recorded so far
    pub fn confirmation_count(&self) -> usize {
        self.confirmations.len()
    }

    /// Check whether the confirmations have reached the quorum
    pub fn has_quorum(&self) -> bool {
        self.confirmations.len() >= QUORUM_THRESHOLD
    }
}

/// A peer's confirmation of a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub id: String,
    pub proposal_id: String,
    pub confirmed_by: String,
    pub confirmed_by_name: String,
    pub confirmed_at: DateTime<Utc>,
    /// Faculty of the confirming user
    pub faculty: String,
}

impl Confirmation {
    /// Record a confirmation by `actor` for the given proposal
    pub fn new(proposal_id: impl Into<String>, actor: &Actor) -> Self {
        Self {
            id: generate_id("conf"),
            proposal_id: proposal_id.into(),
            confirmed_by: actor.id.clone(),
            confirmed_by_name: actor.name.clone(),
            confirmed_at: Utc::now(),
            faculty: actor.faculty_id.clone(),
        }
    }
}

/// A peer's correction superseding a proposal with a new date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub id: String,
    pub original_proposal_id: String,
    pub corrected_by: String,
    pub corrected_by_name: String,
    pub corrected_at: DateTime<Utc>,
    #[serde(deserialize_with = "calendar_date::deserialize")]
    pub new_proposed_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Correction {
    /// Record a correction by `actor` against the given proposal
    pub fn new(
        original_proposal_id: impl Into<String>,
        new_proposed_date: NaiveDate,
        actor: &Actor,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: generate_id("corr"),
            original_proposal_id: original_proposal_id.into(),
            corrected_by: actor.id.clone(),
            corrected_by_name: actor.name.clone(),
            corrected_at: Utc::now(),
            new_proposed_date,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_id("prop");
        let b = generate_id("prop");

        assert_ne!(a, b);
        assert!(a.starts_with("prop-"));

        // prefix, millis, suffix
        let parts: Vec<&str> = a.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn test_new_proposal_is_pending_and_empty() {
        let alice = Actor::new("alice", "Alice", "sciences");
        let proposal = Proposal::new("loi-gauss", "sciences", date(2026, 6, 12), &alice);

        assert_eq!(proposal.status, ProposalStatus::Pending);
        assert!(proposal.confirmations.is_empty());
        assert!(proposal.corrections.is_empty());
        assert!(proposal.is_proposed_by("alice"));
        assert!(!proposal.is_proposed_by("bob"));
    }

    #[test]
    fn test_quorum_counting() {
        let alice = Actor::new("alice", "Alice", "sciences");
        let mut proposal = Proposal::new("loi-gauss", "sciences", date(2026, 6, 12), &alice);

        for user in ["bob", "carol"] {
            let peer = Actor::new(user, user, "sciences");
            proposal.confirmations.push(Confirmation::new(&proposal.id, &peer));
        }
        assert!(!proposal.has_quorum());
        assert!(proposal.is_confirmed_by("bob"));

        let dave = Actor::new("dave", "Dave", "sciences");
        proposal.confirmations.push(Confirmation::new(&proposal.id, &dave));
        assert!(proposal.has_quorum());
        assert_eq!(proposal.confirmation_count(), QUORUM_THRESHOLD);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&ProposalStatus::CommunityValidated).unwrap();
        assert_eq!(json, "\"community-validated\"");
    }

    #[test]
    fn test_correction_reason_is_optional_in_json() {
        let eve = Actor::new("eve", "Eve", "sciences");
        let correction = Correction::new("prop-1-abc", date(2026, 6, 19), &eve, None);

        let json = serde_json::to_string(&correction).unwrap();
        assert!(!json.contains("reason"));

        let parsed: Correction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, correction);
    }

    #[test]
    fn test_proposal_uses_camel_case_fields() {
        let alice = Actor::new("alice", "Alice", "sciences");
        let proposal = Proposal::new("loi-gauss", "sciences", date(2026, 6, 12), &alice);

        let json: serde_json::Value = serde_json::to_value(&proposal).unwrap();
        assert_eq!(json["courseId"], "loi-gauss");
        assert_eq!(json["proposedDate"], "2026-06-12");
        assert_eq!(json["proposedByName"], "Alice");
        assert!(json.get("course_id").is_none());
    }

    #[test]
    fn test_calendar_date_accepts_timestamps() {
        assert_eq!(calendar_date::parse("2026-06-12"), Some(date(2026, 6, 12)));
        assert_eq!(
            calendar_date::parse("2026-06-12T00:00:00.000Z"),
            Some(date(2026, 6, 12))
        );
        assert_eq!(calendar_date::parse("12/06/2026"), None);

        let confirmation: Confirmation = serde_json::from_str(
            r#"{"id": "conf-1", "proposalId": "prop-1", "confirmedBy": "bob",
                "confirmedByName": "Bob", "confirmedAt": "2026-05-01T09:30:00Z",
                "faculty": "sciences"}"#,
        )
        .unwrap();
        assert_eq!(confirmation.proposal_id, "prop-1");

        let correction: Correction = serde_json::from_str(
            r#"{"id": "corr-1", "originalProposalId": "prop-1", "correctedBy": "eve",
                "correctedByName": "Eve", "correctedAt": "2026-05-02T10:00:00Z",
                "newProposedDate": "2026-06-19T00:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(correction.new_proposed_date, date(2026, 6, 19));
        assert!(correction.reason.is_none());
    }
}
