//! Access rules for peer actions on an exam date record.
//!
//! Decides who may confirm or correct the current proposal:
//! - Nobody acts on official dates or records without a proposal
//! - Proposers cannot confirm or correct their own proposal
//! - A user confirms a given proposal at most once

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ExamDateRecord;

/// What a user may do with a record's current proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permissions {
    pub can_confirm: bool,
    pub can_correct: bool,
}

/// Why a workflow action was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("No current proposal with id {0}")]
    ProposalNotFound(String),

    #[error("Exam date for {0} is official and cannot change")]
    OfficialDate(String),

    #[error("Users cannot act on their own proposal")]
    OwnProposal,

    #[error("User {0} already confirmed this proposal")]
    AlreadyConfirmed(String),
}

/// Compute the actions available to `user_id` on `record`
pub fn can_user_interact(record: &ExamDateRecord, user_id: &str) -> Permissions {
    let proposal = match &record.current_proposal {
        Some(p) if !record.is_official() => p,
        _ => return Permissions::default(),
    };

    let is_proposer = proposal.is_proposed_by(user_id);

    Permissions {
        can_confirm: !is_proposer && !proposal.is_confirmed_by(user_id),
        can_correct: !is_proposer,
    }
}

/// Refuse any workflow on an official record
pub fn ensure_not_official(record: &ExamDateRecord) -> Result<(), Rejection> {
    if record.is_official() {
        return Err(Rejection::OfficialDate(record.course_id.clone()));
    }
    Ok(())
}

/// Validate that `user_id` may confirm the record's current proposal
pub fn check_confirm(record: &ExamDateRecord, user_id: &str) -> Result<(), Rejection> {
    ensure_not_official(record)?;

    let proposal = record
        .current_proposal
        .as_ref()
        .ok_or_else(|| Rejection::ProposalNotFound(record.course_id.clone()))?;

    if proposal.is_proposed_by(user_id) {
        return Err(Rejection::OwnProposal);
    }
    if proposal.is_confirmed_by(user_id) {
        return Err(Rejection::AlreadyConfirmed(user_id.to_string()));
    }

    Ok(())
}

/// Validate that `user_id` may correct the record's current proposal
pub fn check_correct(record: &ExamDateRecord, user_id: &str) -> Result<(), Rejection> {
    ensure_not_official(record)?;

    let proposal = record
        .current_proposal
        .as_ref()
        .ok_or_else(|| Rejection::ProposalNotFound(record.course_id.clone()))?;

    if proposal.is_proposed_by(user_id) {
        return Err(Rejection::OwnProposal);
    }

    Ok(())
}
