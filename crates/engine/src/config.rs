use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::GradeError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Immutable run configuration. Every stage borrows it; none mutates it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradeConfig {
    #[serde(default)]
    pub capstone_mode: CapstoneMode,
    #[serde(default)]
    pub pass_fail_course_codes: BTreeSet<String>,
    /// Grade point assigned to pass/fail courses when `capstone_mode = include`.
    #[serde(default)]
    pub pass_fail_grade_point: Option<f64>,
    #[serde(default = "default_grade_point_table")]
    pub grade_point_table: BTreeMap<String, f64>,
    #[serde(default = "default_in_progress_results")]
    pub in_progress_results: Vec<String>,
    #[serde(default = "default_transfer_markers")]
    pub transfer_markers: Vec<String>,
    #[serde(default = "default_transfer_section_markers")]
    pub transfer_section_markers: Vec<String>,
    #[serde(default)]
    pub goal: Option<GoalConfig>,
}

impl Default for GradeConfig {
    fn default() -> Self {
        Self {
            capstone_mode: CapstoneMode::default(),
            pass_fail_course_codes: BTreeSet::new(),
            pass_fail_grade_point: None,
            grade_point_table: default_grade_point_table(),
            in_progress_results: default_in_progress_results(),
            transfer_markers: default_transfer_markers(),
            transfer_section_markers: default_transfer_section_markers(),
            goal: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Capstone mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapstoneMode {
    Include,
    #[default]
    Exclude,
}

impl std::fmt::Display for CapstoneMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Include => write!(f, "include"),
            Self::Exclude => write!(f, "exclude"),
        }
    }
}

impl std::str::FromStr for CapstoneMode {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "include" => Ok(Self::Include),
            "exclude" => Ok(Self::Exclude),
            other => Err(GradeError::ConfigValidation(format!(
                "capstone_mode must be \"include\" or \"exclude\", got \"{other}\""
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Goal
// ---------------------------------------------------------------------------

/// Target CGPA plus the credits still to be taken.
///
/// `remaining_credits` wins over `total_required_credits` when both are set;
/// otherwise remaining = total required - credits counted so far.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoalConfig {
    pub goal_cgpa: f64,
    #[serde(default)]
    pub remaining_credits: Option<f64>,
    #[serde(default)]
    pub total_required_credits: Option<f64>,
}

impl GoalConfig {
    pub fn resolve_remaining(&self, total_credits_counted: f64) -> Option<f64> {
        match (self.remaining_credits, self.total_required_credits) {
            (Some(remaining), _) => Some(remaining),
            (None, Some(total)) => Some(total - total_credits_counted),
            (None, None) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_grade_point_table() -> BTreeMap<String, f64> {
    [
        ("A+", 4.3),
        ("A", 4.0),
        ("A-", 3.7),
        ("B+", 3.3),
        ("B", 3.0),
        ("B-", 2.7),
        ("C+", 2.3),
        ("C", 2.0),
        ("D+", 1.3),
        ("D", 1.0),
        ("F", 0.0),
    ]
    .into_iter()
    .map(|(symbol, point)| (symbol.to_string(), point))
    .collect()
}

fn default_in_progress_results() -> Vec<String> {
    vec!["R".into(), "#".into()]
}

fn default_transfer_markers() -> Vec<String> {
    vec!["RC".into()]
}

fn default_transfer_section_markers() -> Vec<String> {
    vec!["Credit Transfer".into()]
}

/// Withdrawal is a recognized transcript token even though no rule counts it.
pub const WITHDRAWAL_RESULT: &str = "W";

// ---------------------------------------------------------------------------
// Lookups used by the pipeline stages
// ---------------------------------------------------------------------------

impl GradeConfig {
    pub fn grade_point(&self, result: &str) -> Option<f64> {
        self.grade_point_table.get(result).copied()
    }

    pub fn is_in_progress(&self, result: &str) -> bool {
        self.in_progress_results.iter().any(|r| r == result)
    }

    pub fn is_transfer(&self, result: &str, section: &str) -> bool {
        self.transfer_markers.iter().any(|m| m == result)
            || self
                .transfer_section_markers
                .iter()
                .any(|m| section.to_lowercase().contains(&m.to_lowercase()))
    }

    pub fn is_pass_fail(&self, course_code: &str) -> bool {
        self.pass_fail_course_codes.contains(course_code)
    }

    /// A result the transcript vocabulary knows about, as opposed to an empty
    /// cell or a placeholder.
    pub fn is_recognized_result(&self, result: &str) -> bool {
        !result.is_empty()
            && (self.grade_point_table.contains_key(result)
                || self.is_in_progress(result)
                || self.transfer_markers.iter().any(|m| m == result)
                || result == WITHDRAWAL_RESULT)
    }

    /// Highest point in the table; the scale the CGPA is reported on.
    pub fn max_grade_point(&self) -> f64 {
        self.grade_point_table
            .values()
            .copied()
            .fold(0.0_f64, f64::max)
    }

    /// Copy of this config with a different capstone mode.
    pub fn with_capstone_mode(&self, mode: CapstoneMode) -> Self {
        Self {
            capstone_mode: mode,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl GradeConfig {
    pub fn from_toml(input: &str) -> Result<Self, GradeError> {
        let mut config: GradeConfig =
            toml::from_str(input).map_err(|e| GradeError::ConfigParse(e.to_string()))?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Uppercase pass/fail codes so they compare against normalized course codes.
    pub fn normalize(&mut self) {
        self.pass_fail_course_codes = self
            .pass_fail_course_codes
            .iter()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
    }

    pub fn validate(&self) -> Result<(), GradeError> {
        if self.grade_point_table.is_empty() {
            return Err(GradeError::ConfigValidation(
                "grade_point_table must not be empty".into(),
            ));
        }

        for (symbol, point) in &self.grade_point_table {
            if symbol.trim().is_empty() {
                return Err(GradeError::ConfigValidation(
                    "grade_point_table contains an empty grade symbol".into(),
                ));
            }
            if !point.is_finite() || *point < 0.0 {
                return Err(GradeError::ConfigValidation(format!(
                    "grade '{symbol}' has invalid point {point}"
                )));
            }
        }

        // Letter grades are matched first; a shared token would never reach in_progress.
        for token in &self.in_progress_results {
            if self.grade_point_table.contains_key(token) {
                return Err(GradeError::ConfigValidation(format!(
                    "'{token}' is both a grade and an in-progress result"
                )));
            }
        }

        match (self.capstone_mode, self.pass_fail_grade_point) {
            (CapstoneMode::Include, None) if !self.pass_fail_course_codes.is_empty() => {
                return Err(GradeError::ConfigValidation(
                    "capstone_mode = \"include\" requires pass_fail_grade_point".into(),
                ));
            }
            (_, Some(point))
                if !point.is_finite() || point < 0.0 || point > self.max_grade_point() =>
            {
                return Err(GradeError::ConfigValidation(format!(
                    "pass_fail_grade_point must be between 0 and {}, got {point}",
                    self.max_grade_point()
                )));
            }
            _ => {}
        }

        if let Some(ref goal) = self.goal {
            let max = self.max_grade_point();
            if !goal.goal_cgpa.is_finite() || goal.goal_cgpa < 0.0 || goal.goal_cgpa > max {
                return Err(GradeError::ConfigValidation(format!(
                    "goal_cgpa must be between 0 and {max}, got {}",
                    goal.goal_cgpa
                )));
            }
            if goal.remaining_credits.is_none() && goal.total_required_credits.is_none() {
                return Err(GradeError::ConfigValidation(
                    "[goal] needs remaining_credits or total_required_credits".into(),
                ));
            }
            for (name, value) in [
                ("remaining_credits", goal.remaining_credits),
                ("total_required_credits", goal.total_required_credits),
            ] {
                if let Some(v) = value {
                    if !v.is_finite() {
                        return Err(GradeError::ConfigValidation(format!(
                            "{name} must be a finite number"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
