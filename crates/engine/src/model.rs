use serde::Serialize;

use crate::config::CapstoneMode;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One course occurrence as read from a transcript line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRecord {
    /// 1-based position in the input line sequence. Stable record reference.
    pub line_no: usize,
    pub course_code: String,
    pub course_title: String,
    pub credits: f64,
    pub result: String,
    pub year_sem: String,
    pub section: String,
    /// Transcript printed its own duplicate marker (`Y`) on this row.
    pub marked_duplicate: bool,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusion_reason: Option<ExclusionReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_point: Option<f64>,
}

impl CourseRecord {
    /// Identity of a logical course occurrence: (course_code, year_sem, credits).
    pub fn occurrence_key(&self) -> OccurrenceKey {
        OccurrenceKey {
            course_code: self.course_code.clone(),
            year_sem: self.year_sem.clone(),
            milli_credits: (self.credits * 1000.0).round() as i64,
        }
    }

    pub fn as_ref_entry(&self) -> RecordRef {
        RecordRef {
            line_no: self.line_no,
            course_code: self.course_code.clone(),
            year_sem: self.year_sem.clone(),
            credits: self.credits,
            result: self.result.clone(),
            section: self.section.clone(),
            status: self.status,
        }
    }

    pub fn is_included(&self) -> bool {
        self.status == RecordStatus::Included
    }
}

/// Credits are held in thousandths so the key can be hashed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceKey {
    pub course_code: String,
    pub year_sem: String,
    pub milli_credits: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Parsed, not yet classified.
    Pending,
    /// Dropped by the deduplicator. Only seen in `dedup_logs[].dropped`.
    Duplicate,
    Included,
    Excluded,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::Included => write!(f, "included"),
            Self::Excluded => write!(f, "excluded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExclusionReason {
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "missing grade")]
    MissingGrade,
    #[serde(rename = "transfer credit without grade")]
    TransferWithoutGrade,
    #[serde(rename = "pass/fail, non-counted")]
    PassFailNonCounted,
    #[serde(rename = "unknown status")]
    UnknownStatus,
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "in-progress"),
            Self::MissingGrade => write!(f, "missing grade"),
            Self::TransferWithoutGrade => write!(f, "transfer credit without grade"),
            Self::PassFailNonCounted => write!(f, "pass/fail, non-counted"),
            Self::UnknownStatus => write!(f, "unknown status"),
        }
    }
}

/// Snapshot of a record used in logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRef {
    pub line_no: usize,
    pub course_code: String,
    pub year_sem: String,
    pub credits: f64,
    pub result: String,
    pub section: String,
    pub status: RecordStatus,
}

// ---------------------------------------------------------------------------
// Parse failures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailureKind {
    /// First token is not a course code and the line is not a section header.
    NotACourseRow,
    MissingCredits,
    InvalidCredits,
    MalformedDelimitedRow,
}

impl std::fmt::Display for ParseFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotACourseRow => write!(f, "not a course row"),
            Self::MissingCredits => write!(f, "missing credits"),
            Self::InvalidCredits => write!(f, "invalid credits"),
            Self::MalformedDelimitedRow => write!(f, "malformed delimited row"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseFailure {
    pub line_no: usize,
    pub line: String,
    pub kind: ParseFailureKind,
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupAmbiguity {
    /// No record in the group carries a recognized result.
    NoRecognizedResult,
    /// Records in the group carry different recognized results.
    ConflictingResults,
}

impl std::fmt::Display for DedupAmbiguity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRecognizedResult => write!(f, "no_recognized_result"),
            Self::ConflictingResults => write!(f, "conflicting_results"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DedupLogEntry {
    pub kept: RecordRef,
    pub dropped: RecordRef,
    pub reason: String,
    pub ambiguity: Option<DedupAmbiguity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExclusionLogEntry {
    pub record: RecordRef,
    pub reason: ExclusionReason,
}

// ---------------------------------------------------------------------------
// Summary + Goal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// `None` when no credits were counted.
    pub current_cgpa: Option<f64>,
    pub total_credits_counted: f64,
    pub grade_points_sum: f64,
    pub included_count: usize,
    pub excluded_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cgpa_undefined_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalOutlook {
    AlreadyMet,
    Attainable,
    Unattainable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalAnalysis {
    pub goal_cgpa: f64,
    pub remaining_credits: f64,
    /// Raw, unclamped. `None` when the computation is undefined.
    pub required_average_gp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_equivalent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlook: Option<GoalOutlook>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undefined_reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Scenario comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub capstone_mode: CapstoneMode,
    pub summary: Summary,
    pub goal_analysis: Option<GoalAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapstoneComparison {
    pub capstone_included: ScenarioOutcome,
    pub capstone_excluded: ScenarioOutcome,
}

// ---------------------------------------------------------------------------
// Issues + Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ExtractionError,
    DuplicateResolutionAmbiguous,
    ClassificationUnknown,
    GoalComputationUndefined,
    /// `--compare-capstone` was requested but one of the modes cannot be computed.
    ScenarioUnavailable,
}

/// A degraded condition that did not stop the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub grading_scale: f64,
    pub capstone_mode: CapstoneMode,
    pub lines_read: usize,
    pub non_course_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub courses: Vec<CourseRecord>,
    pub dedup_logs: Vec<DedupLogEntry>,
    pub excluded_logs: Vec<ExclusionLogEntry>,
    pub parse_failures: Vec<ParseFailure>,
    pub summary: Summary,
    pub goal_analysis: Option<GoalAnalysis>,
    pub capstone_comparison: Option<CapstoneComparison>,
    pub issues: Vec<Issue>,
}
