//! Seed data for a fresh store.
//!
//! Covers every record status so a new installation shows the whole
//! workflow: an official date, a validated proposal, a proposal still
//! collecting confirmations, and a course with nothing proposed.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::courses::CourseCatalog;
use crate::domain::{
    Actor, Confirmation, ExamDateRecord, Proposal, ProposalStatus, RecordStatus,
};

/// Faculty the fixtures belong to
pub const FIXTURE_FACULTY: &str = "sciences";

fn course_record(catalog: &dyn CourseCatalog, course_id: &str, fallback_size: u32) -> ExamDateRecord {
    let (name, size) = catalog
        .course(course_id)
        .map(|c| (c.name.clone(), c.enrollment))
        .unwrap_or_else(|| (course_id.to_string(), fallback_size));

    ExamDateRecord::new(course_id, name, FIXTURE_FACULTY, size)
}

fn proposal_with_confirmations(
    course_id: &str,
    date: NaiveDate,
    proposer: &Actor,
    peers: &[Actor],
    proposed_at: DateTime<Utc>,
) -> Proposal {
    let mut proposal = Proposal::new(course_id, FIXTURE_FACULTY, date, proposer);
    proposal.proposed_at = proposed_at;

    for (i, peer) in peers.iter().enumerate() {
        let mut confirmation = Confirmation::new(&proposal.id, peer);
        confirmation.confirmed_at = proposed_at + Duration::hours(i as i64 + 1);
        proposal.confirmations.push(confirmation);
    }

    if proposal.has_quorum() {
        proposal.status = ProposalStatus::CommunityValidated;
    }
    proposal
}

/// Build the seed collection relative to `now`
pub fn fixture_records(catalog: &dyn CourseCatalog, now: DateTime<Utc>) -> Vec<ExamDateRecord> {
    let today = now.date_naive();
    let student = |id: &str, name: &str| Actor::new(id, name, FIXTURE_FACULTY);

    let camille = student("student-camille", "Camille");
    let hugo = student("student-hugo", "Hugo");
    let ines = student("student-ines", "Inès");
    let lucas = student("student-lucas", "Lucas");
    let manon = student("student-manon", "Manon");

    // Official: set by the faculty, workflows no longer apply
    let analyse = course_record(catalog, "analyse-1", 200)
        .with_official_date(today + Duration::days(21), "Secrétariat de la faculté des sciences");

    // Community-validated: quorum reached
    let mut algebre = course_record(catalog, "algebre-lineaire", 180);
    algebre.replace_proposal(proposal_with_confirmations(
        "algebre-lineaire",
        today + Duration::days(28),
        &camille,
        &[hugo.clone(), ines.clone(), lucas.clone()],
        now - Duration::days(6),
    ));
    algebre.status = RecordStatus::CommunityValidated;
    algebre.participating_students = 4;

    // Proposed: one confirmation so far
    let mut quantique = course_record(catalog, "mecanique-quantique", 90);
    quantique.replace_proposal(proposal_with_confirmations(
        "mecanique-quantique",
        today + Duration::days(35),
        &manon,
        &[camille.clone()],
        now - Duration::days(2),
    ));
    quantique.participating_students = 2;

    // Undefined: nothing proposed yet
    let gauss = course_record(catalog, "loi-gauss", 140);

    let mut records = vec![analyse, algebre, quantique, gauss];
    for record in &mut records {
        record.last_updated = now;
    }
    records
}
