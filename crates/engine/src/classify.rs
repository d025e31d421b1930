use crate::config::{CapstoneMode, GradeConfig};
use crate::model::{CourseRecord, ExclusionLogEntry, ExclusionReason, RecordStatus};

/// What a matching rule decides for a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Included { grade_point: f64 },
    Excluded(ExclusionReason),
}

/// One entry of the ordered rule list: a predicate and the outcome it yields.
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&CourseRecord, &GradeConfig) -> bool,
    pub outcome: fn(&CourseRecord, &GradeConfig) -> Outcome,
}

/// Evaluated top to bottom; the first rule that applies decides.
/// Reordering this list changes reports.
pub const RULES: &[Rule] = &[
    Rule {
        name: "letter_grade",
        applies: has_letter_grade,
        outcome: include_letter_grade,
    },
    Rule {
        name: "in_progress",
        applies: is_in_progress,
        outcome: exclude_in_progress,
    },
    Rule {
        name: "missing_grade",
        applies: is_missing_grade,
        outcome: exclude_missing_grade,
    },
    Rule {
        name: "transfer_without_grade",
        applies: is_transfer_without_grade,
        outcome: exclude_transfer,
    },
    Rule {
        name: "pass_fail",
        applies: is_pass_fail,
        outcome: pass_fail_outcome,
    },
    Rule {
        name: "unknown_status",
        applies: always,
        outcome: exclude_unknown,
    },
];

fn always(_: &CourseRecord, _: &GradeConfig) -> bool {
    true
}

fn exclude_in_progress(_: &CourseRecord, _: &GradeConfig) -> Outcome {
    Outcome::Excluded(ExclusionReason::InProgress)
}

fn exclude_missing_grade(_: &CourseRecord, _: &GradeConfig) -> Outcome {
    Outcome::Excluded(ExclusionReason::MissingGrade)
}

fn exclude_transfer(_: &CourseRecord, _: &GradeConfig) -> Outcome {
    Outcome::Excluded(ExclusionReason::TransferWithoutGrade)
}

fn exclude_unknown(_: &CourseRecord, _: &GradeConfig) -> Outcome {
    Outcome::Excluded(ExclusionReason::UnknownStatus)
}

fn has_letter_grade(r: &CourseRecord, config: &GradeConfig) -> bool {
    config.grade_point(&r.result).is_some()
}

fn include_letter_grade(r: &CourseRecord, config: &GradeConfig) -> Outcome {
    match config.grade_point(&r.result) {
        Some(grade_point) => Outcome::Included { grade_point },
        None => Outcome::Excluded(ExclusionReason::UnknownStatus),
    }
}

fn is_in_progress(r: &CourseRecord, config: &GradeConfig) -> bool {
    config.is_in_progress(&r.result)
}

fn is_missing_grade(r: &CourseRecord, _: &GradeConfig) -> bool {
    r.result.trim().is_empty()
}

fn is_transfer_without_grade(r: &CourseRecord, config: &GradeConfig) -> bool {
    config.is_transfer(&r.result, &r.section)
}

fn is_pass_fail(r: &CourseRecord, config: &GradeConfig) -> bool {
    config.is_pass_fail(&r.course_code)
}

fn pass_fail_outcome(r: &CourseRecord, config: &GradeConfig) -> Outcome {
    match (config.capstone_mode, config.pass_fail_grade_point) {
        (CapstoneMode::Include, Some(grade_point)) => Outcome::Included { grade_point },
        (CapstoneMode::Include, None) => {
            log::warn!(
                "{}: capstone_mode is include but no pass_fail_grade_point is set; not counted",
                r.course_code
            );
            Outcome::Excluded(ExclusionReason::PassFailNonCounted)
        }
        (CapstoneMode::Exclude, _) => Outcome::Excluded(ExclusionReason::PassFailNonCounted),
    }
}

/// Run the rule list against one record and write the verdict into it.
/// Returns the name of the rule that decided.
pub fn classify_record(record: &mut CourseRecord, config: &GradeConfig) -> &'static str {
    let (name, outcome) = {
        let view: &CourseRecord = record;
        let rule = RULES
            .iter()
            .find(|rule| (rule.applies)(view, config))
            .unwrap_or(&RULES[RULES.len() - 1]);
        (rule.name, (rule.outcome)(view, config))
    };

    match outcome {
        Outcome::Included { grade_point } => {
            record.status = RecordStatus::Included;
            record.exclusion_reason = None;
            record.grade_point = Some(grade_point);
        }
        Outcome::Excluded(reason) => {
            record.status = RecordStatus::Excluded;
            record.exclusion_reason = Some(reason);
            record.grade_point = None;
        }
    }
    name
}

/// Classify every unique record in place. Returns the exclusion log.
pub fn classify_records(records: &mut [CourseRecord], config: &GradeConfig) -> Vec<ExclusionLogEntry> {
    let mut excluded = Vec::new();
    for record in records.iter_mut() {
        let rule = classify_record(record, config);
        if let Some(reason) = record.exclusion_reason {
            if reason == ExclusionReason::UnknownStatus {
                log::warn!(
                    "line {}: {} result '{}' matched no rule",
                    record.line_no,
                    record.course_code,
                    record.result
                );
            }
            excluded.push(ExclusionLogEntry {
                record: record.as_ref_entry(),
                reason,
            });
        }
        log::trace!("line {}: {} -> {rule}", record.line_no, record.course_code);
    }
    excluded
}
