use std::path::PathBuf;

use gradecheck_engine::config::{CapstoneMode, GradeConfig};
use gradecheck_engine::engine::{run, run_with_scenarios, TranscriptInput};
use gradecheck_engine::model::{
    ExclusionReason, GoalOutlook, IssueKind, ParseFailureKind, RecordStatus, Report,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_config() -> GradeConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join("gradecheck.toml")).unwrap();
    GradeConfig::from_toml(&toml).unwrap()
}

fn load_transcript() -> TranscriptInput {
    let path = fixtures_dir().join("transcript.txt");
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    TranscriptInput::from_text(&text)
}

fn course<'a>(report: &'a Report, code: &str) -> &'a gradecheck_engine::CourseRecord {
    report
        .courses
        .iter()
        .find(|c| c.course_code == code)
        .unwrap_or_else(|| panic!("{code} not in courses"))
}

// -------------------------------------------------------------------------
// Full transcript
// -------------------------------------------------------------------------

#[test]
fn transcript_line_accounting() {
    let report = run(&load_config(), &load_transcript());

    assert_eq!(report.meta.lines_read, 34);
    assert_eq!(report.meta.non_course_lines, 5);
    assert_eq!(report.meta.capstone_mode, CapstoneMode::Exclude);
    assert_eq!(report.meta.grading_scale, 4.3);

    assert_eq!(report.parse_failures.len(), 1);
    assert_eq!(report.parse_failures[0].line_no, 30);
    assert_eq!(report.parse_failures[0].kind, ParseFailureKind::MissingCredits);

    // 17 course rows, one listed twice.
    assert_eq!(report.courses.len(), 16);
    assert!(report
        .courses
        .windows(2)
        .all(|w| w[0].line_no < w[1].line_no));
}

#[test]
fn transcript_sections() {
    let report = run(&load_config(), &load_transcript());

    assert_eq!(course(&report, "COMP1011").section, "Major/DSR - Compulsory");
    assert_eq!(course(&report, "COMP4431").section, "Major/DSR - COMP Elective");
    assert_eq!(course(&report, "COMP2000").section, "Major/DSR - WIE");
    assert_eq!(course(&report, "APSS1L01").section, "LIPD");
    assert_eq!(course(&report, "SD2100").section, "Service Learning");
    assert_eq!(course(&report, "ELC1011").section, "LCR");
    assert_eq!(course(&report, "MATH1001").section, "Credit Transfer");
}

#[test]
fn cross_section_duplicate_is_logged_once() {
    let report = run(&load_config(), &load_transcript());

    assert_eq!(report.dedup_logs.len(), 1);
    let log = &report.dedup_logs[0];
    assert_eq!(log.kept.course_code, "AMA1110");
    assert_eq!(log.kept.line_no, 19);
    assert_eq!(log.kept.section, "Major/DSR - Free elective");
    assert_eq!(log.dropped.line_no, 24);
    assert_eq!(log.dropped.section, "GUR");
    assert!(log.ambiguity.is_none());
    assert!(log.reason.contains("GUR"));

    let ama = course(&report, "AMA1110");
    assert!(ama.marked_duplicate);
    assert_eq!(ama.status, RecordStatus::Included);
}

#[test]
fn transcript_classification() {
    let report = run(&load_config(), &load_transcript());

    let reason = |code: &str| course(&report, code).exclusion_reason;
    assert_eq!(reason("COMP1011"), None);
    assert_eq!(reason("COMP3511"), Some(ExclusionReason::UnknownStatus));
    assert_eq!(reason("COMP4913"), Some(ExclusionReason::InProgress));
    assert_eq!(reason("CBS1101"), Some(ExclusionReason::InProgress));
    assert_eq!(reason("COMP2000"), Some(ExclusionReason::PassFailNonCounted));
    assert_eq!(reason("ELC1011"), Some(ExclusionReason::MissingGrade));
    assert_eq!(reason("MATH1001"), Some(ExclusionReason::TransferWithoutGrade));

    assert_eq!(report.excluded_logs.len(), 6);
    for entry in &report.excluded_logs {
        assert_eq!(
            course(&report, &entry.record.course_code).exclusion_reason,
            Some(entry.reason)
        );
    }

    let included = report.courses.iter().filter(|c| c.is_included()).count();
    assert_eq!(included + report.excluded_logs.len(), report.courses.len());
}

#[test]
fn transcript_cgpa_and_goal() {
    let report = run(&load_config(), &load_transcript());

    assert_eq!(report.summary.included_count, 10);
    assert_eq!(report.summary.excluded_count, 6);
    assert_eq!(report.summary.total_credits_counted, 30.0);
    assert!((report.summary.grade_points_sum - 105.9).abs() < 1e-9);
    assert_eq!(report.summary.current_cgpa, Some(3.53));

    let goal = report.goal_analysis.as_ref().unwrap();
    assert_eq!(goal.goal_cgpa, 3.6);
    assert_eq!(goal.remaining_credits, 79.0);
    // (3.6 * 109 - 3.53 * 30) / 79
    let required = goal.required_average_gp.unwrap();
    assert!((required - 3.626_582).abs() < 1e-5);
    assert_eq!(goal.outlook, Some(GoalOutlook::Attainable));
    assert_eq!(goal.letter_equivalent.as_deref(), Some("~A-"));
}

#[test]
fn transcript_issues() {
    let report = run(&load_config(), &load_transcript());

    let kinds: Vec<IssueKind> = report.issues.iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        [IssueKind::ExtractionError, IssueKind::ClassificationUnknown]
    );
    assert!(report.issues[0].message.contains("30"));
    assert!(report.issues[1].message.contains("COMP3511"));
}

#[test]
fn capstone_comparison_on_transcript() {
    let report = run_with_scenarios(&load_config(), &load_transcript());
    let cmp = report.capstone_comparison.as_ref().unwrap();

    assert_eq!(cmp.capstone_excluded.summary, report.summary);
    assert_eq!(cmp.capstone_excluded.goal_analysis, report.goal_analysis);

    // COMP2000 counts at 4.0; COMP4913 is still in progress.
    let inc = &cmp.capstone_included.summary;
    assert_eq!(inc.total_credits_counted, 33.0);
    assert_eq!(inc.current_cgpa, Some(3.57));
    assert_eq!(
        cmp.capstone_included.goal_analysis.as_ref().unwrap().remaining_credits,
        76.0
    );

    // The primary report still reflects the configured mode.
    assert_eq!(
        course(&report, "COMP2000").exclusion_reason,
        Some(ExclusionReason::PassFailNonCounted)
    );
}

#[test]
fn include_mode_counts_pass_fail_courses() {
    let config = load_config().with_capstone_mode(CapstoneMode::Include);
    let report = run(&config, &load_transcript());

    let wie = course(&report, "COMP2000");
    assert_eq!(wie.status, RecordStatus::Included);
    assert_eq!(wie.grade_point, Some(4.0));
    assert_eq!(report.summary.current_cgpa, Some(3.57));
    assert_eq!(report.meta.capstone_mode, CapstoneMode::Include);
}

#[test]
fn report_is_idempotent() {
    let config = load_config();
    let input = load_transcript();
    let a = serde_json::to_string(&run_with_scenarios(&config, &input)).unwrap();
    let b = serde_json::to_string(&run_with_scenarios(&config, &input)).unwrap();
    assert_eq!(a, b);
}

// -------------------------------------------------------------------------
// Delimited input
// -------------------------------------------------------------------------

#[test]
fn delimited_rows_with_explicit_sections() {
    let text = "\
Code | Title | Credits | Result | Year/Sem | Section
COMP2011 | Data Structures | 3.0 | B+ | 2023/1 | Major/DSR - Compulsory
COMP2011 | Data Structures | 3.0 | B+ | 2023/1 | Free Elective
ELC1011 | Practical English | 3.0 | | 2021/1 | LCR
COMP4913 | Capstone Project | 6.0 | R | 2024/2 | Major/DSR - Compulsory
COMP3011 | Algorithms | three | A | 2023/1 | Major/DSR - Compulsory
";
    let report = run(&GradeConfig::default(), &TranscriptInput::from_text(text));

    assert_eq!(report.courses.len(), 3);
    assert_eq!(report.dedup_logs.len(), 1);
    assert_eq!(report.dedup_logs[0].dropped.section, "Free Elective");
    assert_eq!(report.parse_failures.len(), 1);
    assert_eq!(report.parse_failures[0].kind, ParseFailureKind::InvalidCredits);
    assert_eq!(report.parse_failures[0].line_no, 6);
    // Header row is counted, not reported.
    assert_eq!(report.meta.non_course_lines, 1);

    assert_eq!(report.summary.current_cgpa, Some(3.3));
    assert_eq!(report.summary.total_credits_counted, 3.0);
    assert!(report.goal_analysis.is_none());
}

// -------------------------------------------------------------------------
// JSON contract
// -------------------------------------------------------------------------

#[test]
fn json_contract_keys_and_literals() {
    let report = run_with_scenarios(&load_config(), &load_transcript());
    let json = serde_json::to_value(&report).unwrap();

    for key in [
        "meta",
        "courses",
        "dedup_logs",
        "excluded_logs",
        "parse_failures",
        "summary",
        "goal_analysis",
        "capstone_comparison",
        "issues",
    ] {
        assert!(json.get(key).is_some(), "missing top-level key {key}");
    }

    let reasons: Vec<&str> = json["excluded_logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["reason"].as_str().unwrap())
        .collect();
    assert!(reasons.contains(&"in-progress"));
    assert!(reasons.contains(&"missing grade"));
    assert!(reasons.contains(&"transfer credit without grade"));
    assert!(reasons.contains(&"pass/fail, non-counted"));
    assert!(reasons.contains(&"unknown status"));

    assert_eq!(json["meta"]["capstone_mode"], "exclude");
    assert_eq!(json["parse_failures"][0]["kind"], "missing_credits");
    assert_eq!(json["issues"][0]["kind"], "extraction_error");
    assert_eq!(json["goal_analysis"]["outlook"], "attainable");
    assert_eq!(
        json["capstone_comparison"]["capstone_included"]["capstone_mode"],
        "include"
    );
}
