//! `gradecheck-engine` — transcript-to-CGPA engine.
//!
//! Pure engine crate: receives extracted transcript lines, returns a
//! deduplicated, classified course list with CGPA and goal projections.
//! No CLI or IO dependencies.

pub mod cgpa;
pub mod classify;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod goal;
pub mod model;
pub mod parser;

pub use config::{CapstoneMode, GoalConfig, GradeConfig};
pub use engine::{compare_capstone_modes, run, run_records, run_with_scenarios, TranscriptInput};
pub use error::{GoalUndefined, GradeError};
pub use model::{CourseRecord, Report};
