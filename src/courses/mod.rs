//! Course metadata consumed by the exam date workflows.
//!
//! The workflows only need `course_id → name / enrollment`; anything that
//! implements [`CourseCatalog`] can provide it.

pub mod catalog;

pub use catalog::{CourseCatalog, CourseInfo, StaticCatalog};
