//! Command-line interface for examdates.
//!
//! Provides commands for listing and inspecting exam dates, proposing,
//! confirming and correcting them, and managing the local store.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::config::{self, ResolvedConfig};
use crate::core::ExamDates;
use crate::courses::StaticCatalog;
use crate::domain::{Actor, ExamDateRecord, Proposal, QUORUM_THRESHOLD};

/// examdates - Community exam date coordination
#[derive(Parser, Debug)]
#[command(name = "examdates")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Acting user id
    #[arg(long, global = true, env = "EXAMDATES_USER")]
    pub user: Option<String>,

    /// Acting user's display name (defaults to the id)
    #[arg(long, global = true, env = "EXAMDATES_USER_NAME")]
    pub name: Option<String>,

    /// Faculty of the acting user
    #[arg(long, global = true, env = "EXAMDATES_FACULTY", default_value = "sciences")]
    pub faculty: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List exam dates of the faculty
    List,

    /// Show a course's exam date and proposal history
    Show {
        /// Course ID
        course_id: String,
    },

    /// Propose an exam date for a course
    Propose {
        /// Course ID
        course_id: String,

        /// Proposed date (YYYY-MM-DD)
        date: NaiveDate,
    },

    /// Confirm a proposal
    Confirm {
        /// Proposal ID
        proposal_id: String,
    },

    /// Correct a proposal with a new date
    Correct {
        /// Proposal ID
        proposal_id: String,

        /// Corrected date (YYYY-MM-DD)
        date: NaiveDate,

        /// Why the original date is wrong
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Show what the acting user may do on a course
    Access {
        /// Course ID
        course_id: String,
    },

    /// Search the course catalog
    Courses {
        /// Search query (lists the faculty's courses if omitted)
        query: Option<String>,
    },

    /// Write fixture data into an empty store
    Seed,

    /// Delete every stored exam date
    Reset {
        /// Skip the safety prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Build the acting user from the global flags
    fn actor(&self) -> Result<Actor> {
        let id = self
            .user
            .clone()
            .context("No user given. Use --user <id> or set EXAMDATES_USER")?;
        let name = self.name.clone().unwrap_or_else(|| id.clone());
        Ok(Actor::new(id, name, self.faculty.clone()))
    }

    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = config::config()?;

        if let Commands::Config = self.command {
            return show_config(config);
        }

        let service = ExamDates::from_config(config).await?;

        match &self.command {
            Commands::List => list_dates(&service, &self.faculty).await,
            Commands::Show { course_id } => show_course(&service, course_id, &self.faculty).await,
            Commands::Propose { course_id, date } => {
                let actor = self.actor()?;
                let proposal = service
                    .propose(course_id, &self.faculty, *date, &actor)
                    .await?;
                println!("Proposed {} for {}", proposal.proposed_date, course_id);
                println!("Proposal ID: {}", proposal.id);
                Ok(())
            }
            Commands::Confirm { proposal_id } => {
                let actor = self.actor()?;
                let record = service.confirm(proposal_id, &actor).await?;
                let count = record
                    .current_proposal
                    .as_ref()
                    .map(Proposal::confirmation_count)
                    .unwrap_or(0);
                println!(
                    "Confirmed ({}/{}) - {} is now {}",
                    count, QUORUM_THRESHOLD, record.course_id, record.status
                );
                Ok(())
            }
            Commands::Correct {
                proposal_id,
                date,
                reason,
            } => {
                let actor = self.actor()?;
                let correction = service
                    .correct(proposal_id, *date, &actor, reason.clone())
                    .await?;
                println!(
                    "Corrected {} to {}",
                    correction.original_proposal_id, correction.new_proposed_date
                );
                Ok(())
            }
            Commands::Access { course_id } => {
                let actor = self.actor()?;
                let perms = service.permissions(course_id, &actor.id).await?;
                println!("User: {}", actor.id);
                println!("Can confirm: {}", perms.can_confirm);
                println!("Can correct: {}", perms.can_correct);
                Ok(())
            }
            Commands::Courses { query } => list_courses(config, query.as_deref(), &self.faculty).await,
            Commands::Seed => {
                if service.seed().await? {
                    println!("Seeded {}", service.store().path().display());
                } else {
                    println!("Store already contains data; nothing seeded");
                }
                Ok(())
            }
            Commands::Reset { yes } => {
                if !yes {
                    anyhow::bail!("Refusing to delete all exam dates without --yes");
                }
                if service.reset().await? {
                    println!("Deleted {}", service.store().path().display());
                } else {
                    println!("Nothing to delete");
                }
                Ok(())
            }
            Commands::Config => Ok(()),
        }
    }
}

/// Show resolved configuration
fn show_config(config: &ResolvedConfig) -> Result<()> {
    println!("Home: {}", config.home.display());
    println!("Store: {}", config.store.display());
    match &config.catalog {
        Some(path) => println!("Catalog: {}", path.display()),
        None => println!("Catalog: (built-in)"),
    }
    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none)"),
    }
    println!("Default cohort size: {}", config.settings.default_total_students);
    println!("Notification capacity: {}", config.settings.notification_capacity);
    Ok(())
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

/// List the faculty's exam dates
async fn list_dates(service: &ExamDates, faculty: &str) -> Result<()> {
    let records = service.get_all(faculty).await?;

    if records.is_empty() {
        println!("No exam dates found for {}", faculty);
        return Ok(());
    }

    println!(
        "{:<24} {:<22} {:<12} {:<8} {:<8}",
        "COURSE", "STATUS", "DATE", "CONF", "STUDENTS"
    );
    println!("{}", "-".repeat(78));

    for record in records {
        let confirmations = record
            .current_proposal
            .as_ref()
            .map(|p| p.confirmation_count().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:<22} {:<12} {:<8} {}/{}",
            record.course_id,
            record.status.to_string(),
            format_date(record.effective_date()),
            confirmations,
            record.participating_students,
            record.total_students_in_course
        );
    }

    Ok(())
}

fn print_proposal(proposal: &Proposal) {
    println!(
        "  {} {} by {} ({:?})",
        proposal.id, proposal.proposed_date, proposal.proposed_by_name, proposal.status
    );
    for confirmation in &proposal.confirmations {
        println!(
            "    confirmed by {} at {}",
            confirmation.confirmed_by_name, confirmation.confirmed_at
        );
    }
    for correction in &proposal.corrections {
        println!(
            "    corrected by {} to {}{}",
            correction.corrected_by_name,
            correction.new_proposed_date,
            correction
                .reason
                .as_ref()
                .map(|r| format!(" ({})", r))
                .unwrap_or_default()
        );
    }
}

/// Show one course in detail
async fn show_course(service: &ExamDates, course_id: &str, faculty: &str) -> Result<()> {
    let record: ExamDateRecord = service
        .get_by_course(course_id, faculty)
        .await?
        .with_context(|| format!("No exam date record for {} in {}", course_id, faculty))?;

    println!("Course: {} ({})", record.course_name, record.course_id);
    println!("Status: {}", record.status);
    if let (Some(date), Some(source)) = (record.official_date, &record.official_source) {
        println!("Official date: {} (source: {})", date, source);
    }
    println!(
        "Participants: {}/{}",
        record.participating_students, record.total_students_in_course
    );
    println!("Last updated: {}", record.last_updated);

    if let Some(proposal) = &record.current_proposal {
        println!("\nCurrent proposal:");
        print_proposal(proposal);
    }

    if !record.previous_proposals.is_empty() {
        println!("\nPrevious proposals:");
        for proposal in record.previous_proposals.iter().rev() {
            print_proposal(proposal);
        }
    }

    Ok(())
}

/// Search the course catalog
async fn list_courses(config: &ResolvedConfig, query: Option<&str>, faculty: &str) -> Result<()> {
    let catalog = match &config.catalog {
        Some(path) => StaticCatalog::load(path).await?,
        None => StaticCatalog::builtin(),
    };

    let courses = match query {
        Some(q) => catalog.search(q),
        None => catalog.filter_by_faculty(faculty),
    };

    if courses.is_empty() {
        println!("No courses found");
        return Ok(());
    }

    println!("{:<24} {:<40} {:<8}", "ID", "NAME", "STUDENTS");
    println!("{}", "-".repeat(74));
    for course in courses {
        println!("{:<24} {:<40} {}", course.id, course.name, course.enrollment);
    }

    Ok(())
}
