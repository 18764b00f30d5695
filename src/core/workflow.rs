//! Exam date workflows: propose, confirm, correct.
//!
//! Every workflow reads one record, applies the change in memory and
//! writes it back through the store's version check. A refused action
//! leaves the store untouched and returns [`WorkflowError::Rejected`].

use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::{ResolvedConfig, Settings};
use crate::courses::{CourseCatalog, StaticCatalog};
use crate::domain::{
    Actor, Correction, Confirmation, EventType, ExamDateEvent, ExamDateRecord, Proposal,
    ProposalStatus, RecordStatus,
};

use super::fixtures::fixture_records;
use super::notifications::NotificationCenter;
use super::policy::{self, Permissions, Rejection};
use super::store::{ExamDateStore, StoreError};

/// Errors returned by the workflows
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The action is not allowed; nothing was persisted
    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WorkflowError {
    /// Check if this is a refused action rather than a storage failure
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Exam date coordination service
pub struct ExamDates {
    store: ExamDateStore,
    catalog: Arc<dyn CourseCatalog>,
    notifications: Arc<NotificationCenter>,
    settings: Settings,
}

impl ExamDates {
    /// Create a service from explicit collaborators
    pub fn new(
        store: ExamDateStore,
        catalog: Arc<dyn CourseCatalog>,
        notifications: Arc<NotificationCenter>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            catalog,
            notifications,
            settings,
        }
    }

    /// Create a service from resolved configuration
    pub async fn from_config(config: &ResolvedConfig) -> anyhow::Result<Self> {
        if let Some(parent) = config.store.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let catalog = match &config.catalog {
            Some(path) => StaticCatalog::load(path).await?,
            None => StaticCatalog::builtin(),
        };

        Ok(Self::new(
            ExamDateStore::new(config.store.clone()),
            Arc::new(catalog),
            Arc::new(NotificationCenter::new(config.settings.notification_capacity)),
            config.settings.clone(),
        ))
    }

    pub fn store(&self) -> &ExamDateStore {
        &self.store
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    /// Write the fixture records if the store is empty
    pub async fn seed(&self) -> WorkflowResult<bool> {
        let seeded = self
            .store
            .seed_if_empty(fixture_records(self.catalog.as_ref(), Utc::now()))
            .await?;
        if seeded {
            info!("Seeded exam date store with fixtures");
        }
        Ok(seeded)
    }

    /// All records of a faculty, seeding fixtures on first use
    pub async fn get_all(&self, faculty_id: &str) -> WorkflowResult<Vec<ExamDateRecord>> {
        self.seed().await?;
        Ok(self.store.get_all(faculty_id).await?)
    }

    /// A course's record within a faculty
    pub async fn get_by_course(
        &self,
        course_id: &str,
        faculty_id: &str,
    ) -> WorkflowResult<Option<ExamDateRecord>> {
        Ok(self.store.get_by_course(course_id, faculty_id).await?)
    }

    /// What `user_id` may do on a course; nothing if the course is unknown
    pub async fn permissions(&self, course_id: &str, user_id: &str) -> WorkflowResult<Permissions> {
        let record = self.store.get(course_id).await?;
        Ok(record
            .map(|r| policy::can_user_interact(&r, user_id))
            .unwrap_or_default())
    }

    /// Delete every record
    pub async fn reset(&self) -> WorkflowResult<bool> {
        let removed = self.store.reset().await?;
        info!(removed, "Exam date store reset");
        Ok(removed)
    }

    fn new_record(&self, course_id: &str, faculty_id: &str) -> ExamDateRecord {
        let (name, size) = self
            .catalog
            .course(course_id)
            .map(|c| (c.name.clone(), c.enrollment))
            .unwrap_or_else(|| (course_id.to_string(), self.settings.default_total_students));

        ExamDateRecord::new(course_id, name, faculty_id, size)
    }

    fn publish(&self, event_type: EventType, record: &ExamDateRecord, actor: &Actor, proposal: &Proposal) {
        let event = ExamDateEvent::new(
            event_type,
            &record.course_id,
            &record.course_name,
            &actor.id,
            &proposal.id,
            proposal.proposed_date,
        );
        debug!(summary = %event.summary, "Publishing notification");
        self.notifications.publish(event);
    }

    /// Propose a date for a course, superseding any current proposal.
    ///
    /// The record is created if the course has none yet. The date is not
    /// validated.
    #[instrument(skip(self, proposer), fields(user = %proposer.id))]
    pub async fn propose(
        &self,
        course_id: &str,
        faculty_id: &str,
        proposed_date: NaiveDate,
        proposer: &Actor,
    ) -> WorkflowResult<Proposal> {
        let existing = self.store.get_by_course(course_id, faculty_id).await?;
        let is_new = existing.is_none();
        let mut record = existing.unwrap_or_else(|| self.new_record(course_id, faculty_id));

        if let Err(rejection) = policy::ensure_not_official(&record) {
            warn!(%rejection, "Proposal rejected");
            return Err(rejection.into());
        }

        let proposal = Proposal::new(course_id, faculty_id, proposed_date, proposer);
        record.replace_proposal(proposal.clone());
        record.participating_students = record.participating_students.max(1);

        let stored = if is_new {
            self.store.insert(record).await?
        } else {
            self.store.update(record).await?
        };

        info!(proposal_id = %proposal.id, date = %proposed_date, "Exam date proposed");
        self.publish(EventType::Proposed, &stored, proposer, &proposal);

        Ok(proposal)
    }

    /// Confirm the current proposal with the given id.
    ///
    /// Reaching the quorum moves the proposal and the record to
    /// community-validated.
    #[instrument(skip(self, confirmer), fields(user = %confirmer.id))]
    pub async fn confirm(
        &self,
        proposal_id: &str,
        confirmer: &Actor,
    ) -> WorkflowResult<ExamDateRecord> {
        let mut record = self.find_current(proposal_id).await?;

        if let Err(rejection) = policy::check_confirm(&record, &confirmer.id) {
            warn!(%rejection, "Confirmation rejected");
            return Err(rejection.into());
        }

        let Some(proposal) = record.current_proposal.as_mut() else {
            return Err(Rejection::ProposalNotFound(proposal_id.to_string()).into());
        };

        proposal
            .confirmations
            .push(Confirmation::new(&proposal.id, confirmer));

        let confirmations = proposal.confirmation_count();
        let reached_quorum = proposal.has_quorum() && proposal.status == ProposalStatus::Pending;
        if proposal.has_quorum() {
            proposal.status = ProposalStatus::CommunityValidated;
        }
        let proposal = proposal.clone();

        if proposal.status == ProposalStatus::CommunityValidated {
            record.status = RecordStatus::CommunityValidated;
        }
        record.participating_students = record
            .participating_students
            .max(confirmations as u32 + 1);
        record.last_updated = Utc::now();

        let stored = self.store.update(record).await?;

        info!(confirmations, "Exam date confirmed");
        self.publish(EventType::Confirmed, &stored, confirmer, &proposal);

        if reached_quorum {
            info!(date = %proposal.proposed_date, "Exam date validated by the community");
            self.publish(EventType::Validated, &stored, confirmer, &proposal);
        }

        Ok(stored)
    }

    /// Replace the current proposal with a corrected date.
    ///
    /// The original proposal keeps the correction for audit and moves to
    /// `previous_proposals`; the corrector becomes the new proposer.
    #[instrument(skip(self, corrector, reason), fields(user = %corrector.id))]
    pub async fn correct(
        &self,
        original_proposal_id: &str,
        new_date: NaiveDate,
        corrector: &Actor,
        reason: Option<String>,
    ) -> WorkflowResult<Correction> {
        let mut record = self.find_current(original_proposal_id).await?;

        if let Err(rejection) = policy::check_correct(&record, &corrector.id) {
            warn!(%rejection, "Correction rejected");
            return Err(rejection.into());
        }

        let Some(original) = record.current_proposal.as_mut() else {
            return Err(Rejection::ProposalNotFound(original_proposal_id.to_string()).into());
        };

        let correction = Correction::new(&original.id, new_date, corrector, reason);
        original.corrections.push(correction.clone());

        let replacement = Proposal::new(&record.course_id, &record.faculty_id, new_date, corrector);
        record.replace_proposal(replacement.clone());
        record.participating_students = record.participating_students.max(1);

        let stored = self.store.update(record).await?;

        info!(
            original = %original_proposal_id,
            replacement = %replacement.id,
            date = %new_date,
            "Exam date corrected"
        );
        self.publish(EventType::Corrected, &stored, corrector, &replacement);

        Ok(correction)
    }

    async fn find_current(&self, proposal_id: &str) -> WorkflowResult<ExamDateRecord> {
        match self.store.find_by_proposal(proposal_id).await? {
            Some(record) => Ok(record),
            None => {
                let rejection = Rejection::ProposalNotFound(proposal_id.to_string());
                warn!(%rejection, "No matching proposal");
                Err(rejection.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service() -> (ExamDates, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = ExamDateStore::new(temp.path().join("exam_dates.json"));
        let service = ExamDates::new(
            store,
            Arc::new(StaticCatalog::builtin()),
            Arc::new(NotificationCenter::default()),
            Settings::default(),
        );
        (service, temp)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
    }

    #[tokio::test]
    async fn test_propose_creates_record_from_catalog() {
        let (service, _temp) = service();
        let alice = Actor::new("alice", "Alice", "sciences");

        service
            .propose("loi-gauss", "sciences", date(12), &alice)
            .await
            .unwrap();

        let record = service
            .get_by_course("loi-gauss", "sciences")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.course_name, "Électromagnétisme : loi de Gauss");
        assert_eq!(record.total_students_in_course, 142);
        assert_eq!(record.participating_students, 1);
        assert_eq!(record.version, 1);
    }

    #[tokio::test]
    async fn test_unknown_course_uses_default_size() {
        let (service, _temp) = service();
        let alice = Actor::new("alice", "Alice", "sciences");

        service
            .propose("optique", "sciences", date(12), &alice)
            .await
            .unwrap();

        let record = service.store().get("optique").await.unwrap().unwrap();
        assert_eq!(record.course_name, "optique");
        assert_eq!(record.total_students_in_course, 120);
    }

    #[tokio::test]
    async fn test_reproposing_archives_previous() {
        let (service, _temp) = service();
        let alice = Actor::new("alice", "Alice", "sciences");

        let first = service
            .propose("loi-gauss", "sciences", date(12), &alice)
            .await
            .unwrap();
        let second = service
            .propose("loi-gauss", "sciences", date(13), &alice)
            .await
            .unwrap();

        let record = service.store().get("loi-gauss").await.unwrap().unwrap();
        assert!(record.has_current_proposal(&second.id));
        assert_eq!(record.previous_proposals.len(), 1);
        assert_eq!(record.previous_proposals[0].id, first.id);
    }

    #[tokio::test]
    async fn test_unknown_proposal_is_rejected() {
        let (service, _temp) = service();
        let bob = Actor::new("bob", "Bob", "sciences");

        let err = service.confirm("prop-0-missing", &bob).await.unwrap_err();
        assert!(err.is_rejection());

        let err = service
            .correct("prop-0-missing", date(20), &bob, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Rejected(Rejection::ProposalNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_permissions_for_unknown_course() {
        let (service, _temp) = service();

        let perms = service.permissions("nowhere", "bob").await.unwrap();
        assert_eq!(perms, Permissions::default());
    }

    #[tokio::test]
    async fn test_get_all_seeds_once() {
        let (service, _temp) = service();

        let records = service.get_all("sciences").await.unwrap();
        assert_eq!(records.len(), 4);
        assert!(!service.seed().await.unwrap());

        assert!(service.reset().await.unwrap());
        assert!(service.store().is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_from_config_uses_configured_store() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        let config = ResolvedConfig {
            home: home.clone(),
            store: home.join("data").join("exam_dates.json"),
            catalog: None,
            config_file: None,
            settings: Settings::default(),
        };

        let service = ExamDates::from_config(&config).await.unwrap();
        assert_eq!(service.store().path(), config.store.as_path());
        assert!(home.join("data").is_dir());

        service.seed().await.unwrap();
        assert!(config.store.exists());
    }
}
