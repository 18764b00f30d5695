//! Course catalog used to name courses and size their cohorts.
//!
//! Simple JSON-backed list that can be searched and filtered by faculty.
//! The built-in catalog covers the platform's science courses.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Lookup of course metadata by id
pub trait CourseCatalog: Send + Sync {
    /// Get a course by id
    fn course(&self, course_id: &str) -> Option<&CourseInfo>;
}

/// A single course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInfo {
    /// Course identifier (slug)
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Owning faculty
    pub faculty_id: String,

    /// Number of enrolled students
    #[serde(default)]
    pub enrollment: u32,
}

impl CourseInfo {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        faculty_id: impl Into<String>,
        enrollment: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            faculty_id: faculty_id.into(),
            enrollment,
        }
    }
}

/// In-memory catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    /// All known courses
    pub courses: Vec<CourseInfo>,
}

impl StaticCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The platform's built-in course list
    pub fn builtin() -> Self {
        let courses = [
            ("loi-gauss", "Électromagnétisme : loi de Gauss", 142),
            ("analyse-1", "Analyse I", 215),
            ("algebre-lineaire", "Algèbre linéaire", 188),
            ("mecanique-quantique", "Mécanique quantique", 96),
            ("chimie-organique", "Chimie organique", 160),
            ("thermodynamique", "Thermodynamique", 131),
        ];

        Self {
            courses: courses
                .into_iter()
                .map(|(id, name, enrollment)| CourseInfo::new(id, name, "sciences", enrollment))
                .collect(),
        }
    }

    /// Load a catalog from a JSON file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read course catalog: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse course catalog JSON")
    }

    /// Add a course, replacing any course with the same id
    pub fn add(&mut self, course: CourseInfo) {
        if let Some(existing) = self.courses.iter_mut().find(|c| c.id == course.id) {
            *existing = course;
        } else {
            self.courses.push(course);
        }
    }

    /// Search courses by name or id (case-insensitive substring match)
    pub fn search(&self, query: &str) -> Vec<&CourseInfo> {
        let query_lower = query.to_lowercase();

        self.courses
            .iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&query_lower)
                    || c.id.to_lowercase().contains(&query_lower)
            })
            .collect()
    }

    /// Courses belonging to a faculty
    pub fn filter_by_faculty(&self, faculty_id: &str) -> Vec<&CourseInfo> {
        self.courses
            .iter()
            .filter(|c| c.faculty_id == faculty_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl CourseCatalog for StaticCatalog {
    fn course(&self, course_id: &str) -> Option<&CourseInfo> {
        self.courses.iter().find(|c| c.id == course_id)
    }
}
