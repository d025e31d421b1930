use crate::cgpa::compute_summary;
use crate::classify::classify_records;
use crate::config::{CapstoneMode, GradeConfig};
use crate::dedup::{deduplicate, DedupOutput};
use crate::error::GradeError;
use crate::goal::analyze_goal;
use crate::model::{
    CapstoneComparison, CourseRecord, ExclusionReason, Issue, IssueKind, Report, ReportMeta,
    ScenarioOutcome,
};
use crate::parser::{parse_lines, ParsedLines};

/// Extracted transcript text, one entry per line, in document order.
#[derive(Debug, Clone, Default)]
pub struct TranscriptInput {
    pub lines: Vec<String>,
}

impl TranscriptInput {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }
}

/// Run the full pipeline: parse, deduplicate, classify, average, project.
///
/// Never fails. Every degraded condition ends up in the report's logs or
/// `issues` instead.
pub fn run(config: &GradeConfig, input: &TranscriptInput) -> Report {
    build_report(config, parse_lines(&input.lines), false)
}

/// Same as [`run`], plus the capstone included/excluded comparison.
pub fn run_with_scenarios(config: &GradeConfig, input: &TranscriptInput) -> Report {
    build_report(config, parse_lines(&input.lines), true)
}

/// Run the pipeline on records that were already parsed elsewhere.
pub fn run_records(config: &GradeConfig, records: Vec<CourseRecord>) -> Report {
    let parsed = ParsedLines {
        lines_read: records.len(),
        records,
        ..ParsedLines::default()
    };
    build_report(config, parsed, false)
}

fn build_report(config: &GradeConfig, parsed: ParsedLines, compare: bool) -> Report {
    let mut issues = Vec::new();

    if !parsed.failures.is_empty() {
        let lines: Vec<String> = parsed.failures.iter().map(|f| f.line_no.to_string()).collect();
        issues.push(Issue {
            kind: IssueKind::ExtractionError,
            message: format!(
                "{} course row(s) skipped: line {}",
                parsed.failures.len(),
                lines.join(", ")
            ),
        });
    }

    let DedupOutput {
        unique: mut courses,
        logs: dedup_logs,
        ambiguous,
    } = deduplicate(parsed.records, config);

    for (key, kind) in &ambiguous {
        issues.push(Issue {
            kind: IssueKind::DuplicateResolutionAmbiguous,
            message: format!(
                "{} {} ({} credits): {kind}; kept first entry",
                key.course_code,
                if key.year_sem.is_empty() { "-" } else { key.year_sem.as_str() },
                key.milli_credits as f64 / 1000.0,
            ),
        });
    }

    let excluded_logs = classify_records(&mut courses, config);

    for entry in excluded_logs
        .iter()
        .filter(|e| e.reason == ExclusionReason::UnknownStatus)
    {
        issues.push(Issue {
            kind: IssueKind::ClassificationUnknown,
            message: format!(
                "line {}: {} result '{}' matched no rule",
                entry.record.line_no, entry.record.course_code, entry.record.result
            ),
        });
    }

    let summary = compute_summary(&courses);
    if let Some(ref why) = summary.cgpa_undefined_reason {
        issues.push(Issue {
            kind: IssueKind::GoalComputationUndefined,
            message: format!("current_cgpa: {why}"),
        });
    }

    let goal_analysis = analyze_goal(&summary, config);
    if let Some(why) = goal_analysis.as_ref().and_then(|g| g.undefined_reason.as_ref()) {
        issues.push(Issue {
            kind: IssueKind::GoalComputationUndefined,
            message: format!("required_average_gp: {why}"),
        });
    }

    let capstone_comparison = if compare {
        match compare_capstone_modes(&courses, config) {
            Ok(comparison) => Some(comparison),
            Err(e) => {
                log::warn!("{e}");
                issues.push(Issue {
                    kind: IssueKind::ScenarioUnavailable,
                    message: e.to_string(),
                });
                None
            }
        }
    } else {
        None
    };

    log::debug!(
        "report: {} courses, {} dedup drops, {} excluded, {} issues",
        courses.len(),
        dedup_logs.len(),
        excluded_logs.len(),
        issues.len(),
    );

    Report {
        meta: ReportMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            grading_scale: config.max_grade_point(),
            capstone_mode: config.capstone_mode,
            lines_read: parsed.lines_read,
            non_course_lines: parsed.non_course_lines,
        },
        courses,
        dedup_logs,
        excluded_logs,
        parse_failures: parsed.failures,
        summary,
        goal_analysis,
        capstone_comparison,
        issues,
    }
}

/// Classify, average and project the same unique records under both capstone
/// modes. Each run works on its own copy; the input is left untouched.
pub fn compare_capstone_modes(
    unique: &[CourseRecord],
    config: &GradeConfig,
) -> Result<CapstoneComparison, GradeError> {
    if config.pass_fail_grade_point.is_none() && !config.pass_fail_course_codes.is_empty() {
        return Err(GradeError::ScenarioUnavailable(
            "capstone comparison needs pass_fail_grade_point".into(),
        ));
    }

    let scenario = |mode: CapstoneMode| {
        let scenario_config = config.with_capstone_mode(mode);
        let mut records = unique.to_vec();
        classify_records(&mut records, &scenario_config);
        let summary = compute_summary(&records);
        let goal_analysis = analyze_goal(&summary, &scenario_config);
        ScenarioOutcome {
            capstone_mode: mode,
            summary,
            goal_analysis,
        }
    };

    Ok(CapstoneComparison {
        capstone_included: scenario(CapstoneMode::Include),
        capstone_excluded: scenario(CapstoneMode::Exclude),
    })
}
