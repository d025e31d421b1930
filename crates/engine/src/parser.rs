//! Row parser: one extracted text line in, one candidate course record out.
//!
//! Two line shapes are understood:
//!
//! - positional, as a PDF text extractor emits it:
//!   `CODE TITLE... CREDITS [RESULT] [YEAR/SEM] [Y]`
//! - delimited: `CODE | TITLE | CREDITS | RESULT | YEAR/SEM [| SECTION]`
//!
//! Section headers between course rows set the section of the rows that follow.

use regex::Regex;

use crate::model::{CourseRecord, ParseFailure, ParseFailureKind, RecordStatus};

pub const UNKNOWN_SECTION: &str = "UNKNOWN";

/// Trailing token some transcripts print on rows they list twice.
const DUPLICATE_MARKER: &str = "Y";

/// Compiled patterns for the line grammar. Build once per run.
#[derive(Debug, Clone)]
pub struct LineGrammar {
    course_code: Regex,
    credits: Regex,
    year_sem: Regex,
    progress_header: Regex,
}

impl Default for LineGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl LineGrammar {
    pub fn new() -> Self {
        Self {
            course_code: Regex::new(r"^[A-Za-z]{2,5}\d[A-Za-z0-9]{2,7}$")
                .expect("course code pattern"),
            credits: Regex::new(r"^\d+\.\d+$").expect("credits pattern"),
            year_sem: Regex::new(r"^\d{4}/[1-3]$").expect("year/sem pattern"),
            progress_header: Regex::new(
                r"^\d+/\d+\s+(Compulsory|COMP Elective|Free elective|WIE)\b",
            )
            .expect("progress header pattern"),
        }
    }

    pub fn is_course_code(&self, token: &str) -> bool {
        self.course_code.is_match(token)
    }

    /// Parse one whitespace-normalized line under the given section context.
    pub fn parse_line(
        &self,
        line_no: usize,
        line: &str,
        section: &str,
    ) -> Result<CourseRecord, ParseFailure> {
        if line.contains('|') {
            self.parse_delimited(line_no, line, section)
        } else {
            self.parse_positional(line_no, line, section)
        }
    }

    fn parse_positional(
        &self,
        line_no: usize,
        line: &str,
        section: &str,
    ) -> Result<CourseRecord, ParseFailure> {
        let fail = |kind| ParseFailure {
            line_no,
            line: line.to_string(),
            kind,
        };

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let code = match tokens.first() {
            Some(t) if self.is_course_code(t) => *t,
            _ => return Err(fail(ParseFailureKind::NotACourseRow)),
        };

        let credit_idx = tokens
            .iter()
            .skip(1)
            .position(|t| self.credits.is_match(t))
            .map(|i| i + 1)
            .ok_or_else(|| fail(ParseFailureKind::MissingCredits))?;

        let credits = parse_credits(tokens[credit_idx])
            .ok_or_else(|| fail(ParseFailureKind::InvalidCredits))?;

        let title = tokens[1..credit_idx].join(" ");

        let mut rest = &tokens[credit_idx + 1..];
        let mut marked_duplicate = false;
        if rest.last() == Some(&DUPLICATE_MARKER) {
            marked_duplicate = true;
            rest = &rest[..rest.len() - 1];
        }

        let mut year_sem = "";
        if let Some(last) = rest.last() {
            if self.year_sem.is_match(last) {
                year_sem = *last;
                rest = &rest[..rest.len() - 1];
            }
        }

        let result = rest.first().copied().unwrap_or("");

        Ok(new_record(
            line_no,
            code,
            &title,
            credits,
            result,
            year_sem,
            section,
            marked_duplicate,
        ))
    }

    fn parse_delimited(
        &self,
        line_no: usize,
        line: &str,
        section: &str,
    ) -> Result<CourseRecord, ParseFailure> {
        let fail = |kind| ParseFailure {
            line_no,
            line: line.to_string(),
            kind,
        };

        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if !self.is_course_code(fields[0]) {
            return Err(fail(ParseFailureKind::NotACourseRow));
        }
        if fields.len() < 5 {
            return Err(fail(ParseFailureKind::MalformedDelimitedRow));
        }

        if fields[2].is_empty() {
            return Err(fail(ParseFailureKind::MissingCredits));
        }
        let credits =
            parse_credits(fields[2]).ok_or_else(|| fail(ParseFailureKind::InvalidCredits))?;

        let section = match fields.get(5) {
            Some(s) if !s.is_empty() => *s,
            _ => section,
        };

        Ok(new_record(
            line_no, fields[0], fields[1], credits, fields[3], fields[4], section, false,
        ))
    }
}

fn parse_credits(token: &str) -> Option<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|c| c.is_finite() && *c >= 0.0)
}

#[allow(clippy::too_many_arguments)]
fn new_record(
    line_no: usize,
    code: &str,
    title: &str,
    credits: f64,
    result: &str,
    year_sem: &str,
    section: &str,
    marked_duplicate: bool,
) -> CourseRecord {
    CourseRecord {
        line_no,
        course_code: code.to_uppercase(),
        course_title: title.trim().to_string(),
        credits,
        result: result.trim().to_string(),
        year_sem: year_sem.trim().to_string(),
        section: section.trim().to_string(),
        marked_duplicate,
        status: RecordStatus::Pending,
        exclusion_reason: None,
        grade_point: None,
    }
}

// ---------------------------------------------------------------------------
// Section tracking
// ---------------------------------------------------------------------------

/// Running section label, updated by header lines as the transcript is read.
#[derive(Debug, Clone)]
pub struct SectionTracker {
    current: String,
}

impl Default for SectionTracker {
    fn default() -> Self {
        Self {
            current: UNKNOWN_SECTION.to_string(),
        }
    }
}

impl SectionTracker {
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Update the section if `line` is a header. Returns whether it was one.
    pub fn observe(&mut self, line: &str, grammar: &LineGrammar) -> bool {
        match detect_section(line, &self.current, grammar) {
            Some(section) => {
                self.current = section;
                true
            }
            None => false,
        }
    }
}

fn detect_section(line: &str, current: &str, grammar: &LineGrammar) -> Option<String> {
    let line = line.trim();
    if line == "Major/DSR" {
        return Some("Major/DSR".into());
    }
    if let Some(caps) = grammar.progress_header.captures(line) {
        let kind = &caps[1];
        return Some(if current.contains("Major/DSR") {
            let major = current.split(" - ").next().unwrap_or(current);
            format!("{major} - {kind}")
        } else {
            kind.to_string()
        });
    }
    if line == "GUR" || line == "LCR" {
        return Some(line.to_string());
    }

    const BRACKETED: &[(&str, &str)] = &[
        ("(Service Learning)", "Service Learning"),
        ("(LIPD)", "LIPD"),
        ("(LCR-Chinese)", "LCR-Chinese"),
        ("(LCR-English)", "LCR-English"),
        ("Credit Transfer", "Credit Transfer"),
    ];
    BRACKETED
        .iter()
        .find(|(needle, _)| line.contains(needle))
        .map(|(_, label)| label.to_string())
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Outcome of parsing a whole line sequence.
#[derive(Debug, Clone, Default)]
pub struct ParsedLines {
    pub records: Vec<CourseRecord>,
    /// Lines that looked like course rows but failed the grammar.
    pub failures: Vec<ParseFailure>,
    /// Non-blank lines that were neither headers nor course rows.
    pub non_course_lines: usize,
    pub lines_read: usize,
}

/// Collapse runs of whitespace into one space and trim.
pub fn normalize_line(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse every line in order. `line_no` is the 1-based input position;
/// blank lines are skipped but still counted for numbering.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> ParsedLines {
    let grammar = LineGrammar::new();
    let mut tracker = SectionTracker::default();
    let mut out = ParsedLines {
        lines_read: lines.len(),
        ..ParsedLines::default()
    };

    for (idx, raw) in lines.iter().enumerate() {
        let line = normalize_line(raw.as_ref());
        if line.is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let is_header = tracker.observe(&line, &grammar);

        match grammar.parse_line(line_no, &line, tracker.current()) {
            Ok(record) => out.records.push(record),
            Err(failure) if failure.kind == ParseFailureKind::NotACourseRow => {
                if !is_header {
                    out.non_course_lines += 1;
                    log::trace!("line {line_no}: not a course row");
                }
            }
            Err(failure) => {
                log::debug!("line {line_no}: {} ({})", failure.kind, failure.line);
                out.failures.push(failure);
            }
        }
    }

    log::debug!(
        "parsed {} lines: {} records, {} failures, {} non-course",
        out.lines_read,
        out.records.len(),
        out.failures.len(),
        out.non_course_lines,
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<CourseRecord, ParseFailure> {
        LineGrammar::new().parse_line(1, line, "Major/DSR - Compulsory")
    }

    #[test]
    fn positional_full_row() {
        let r = parse("comp2011 Data Structures 3.0 B+ 2023/1").unwrap();
        assert_eq!(r.course_code, "COMP2011");
        assert_eq!(r.course_title, "Data Structures");
        assert_eq!(r.credits, 3.0);
        assert_eq!(r.result, "B+");
        assert_eq!(r.year_sem, "2023/1");
        assert_eq!(r.section, "Major/DSR - Compulsory");
        assert!(!r.marked_duplicate);
        assert_eq!(r.status, RecordStatus::Pending);
    }

    #[test]
    fn positional_with_duplicate_marker() {
        let r = parse("AMA1110 Basic Mathematics I 3.0 A- 2022/1 Y").unwrap();
        assert_eq!(r.result, "A-");
        assert_eq!(r.year_sem, "2022/1");
        assert!(r.marked_duplicate);
    }

    #[test]
    fn positional_without_result_or_period() {
        let r = parse("APSS1BN04 Understanding Society 3.0").unwrap();
        assert_eq!(r.course_code, "APSS1BN04");
        assert_eq!(r.result, "");
        assert_eq!(r.year_sem, "");
    }

    #[test]
    fn positional_in_progress_without_period() {
        let r = parse("COMP4913 Capstone Project 6.0 R").unwrap();
        assert_eq!(r.result, "R");
        assert_eq!(r.year_sem, "");
        assert_eq!(r.credits, 6.0);
    }

    #[test]
    fn title_with_digits_is_not_credits() {
        let r = parse("AF1000 Accounting 101 Basics 2.0 C 2021/2").unwrap();
        assert_eq!(r.course_title, "Accounting 101 Basics");
        assert_eq!(r.credits, 2.0);
    }

    #[test]
    fn missing_credits_is_a_failure() {
        let err = parse("COMP1011 Programming Fundamentals A 2021/1").unwrap_err();
        assert_eq!(err.kind, ParseFailureKind::MissingCredits);
        assert_eq!(err.line_no, 1);
    }

    #[test]
    fn non_course_line() {
        let err = parse("Student Name: Chan Tai Man").unwrap_err();
        assert_eq!(err.kind, ParseFailureKind::NotACourseRow);
    }

    #[test]
    fn delimited_row_with_section() {
        let r = parse("COMP2011 | Data Structures | 3.0 | B+ | 2023/1 | Free Elective").unwrap();
        assert_eq!(r.course_code, "COMP2011");
        assert_eq!(r.section, "Free Elective");
        assert_eq!(r.result, "B+");
    }

    #[test]
    fn delimited_row_inherits_section() {
        let r = parse("ELC1011 | English I | 3 | | ").unwrap();
        assert_eq!(r.credits, 3.0);
        assert_eq!(r.result, "");
        assert_eq!(r.year_sem, "");
        assert_eq!(r.section, "Major/DSR - Compulsory");
    }

    #[test]
    fn delimited_failures() {
        assert_eq!(
            parse("COMP2011 | Data Structures | three | A | 2023/1").unwrap_err().kind,
            ParseFailureKind::InvalidCredits
        );
        assert_eq!(
            parse("COMP2011 | Data Structures | -3.0 | A | 2023/1").unwrap_err().kind,
            ParseFailureKind::InvalidCredits
        );
        assert_eq!(
            parse("COMP2011 | Data Structures |  | A | 2023/1").unwrap_err().kind,
            ParseFailureKind::MissingCredits
        );
        assert_eq!(
            parse("COMP2011 | Data Structures | 3.0").unwrap_err().kind,
            ParseFailureKind::MalformedDelimitedRow
        );
    }

    #[test]
    fn section_tracking() {
        let grammar = LineGrammar::new();
        let mut tracker = SectionTracker::default();
        assert_eq!(tracker.current(), UNKNOWN_SECTION);

        assert!(tracker.observe("Major/DSR", &grammar));
        assert!(tracker.observe("45/60 Compulsory", &grammar));
        assert_eq!(tracker.current(), "Major/DSR - Compulsory");
        assert!(tracker.observe("6/12 Free elective", &grammar));
        assert_eq!(tracker.current(), "Major/DSR - Free elective");

        assert!(tracker.observe("LCR", &grammar));
        assert_eq!(tracker.current(), "LCR");
        assert!(tracker.observe("3/3 WIE", &grammar));
        assert_eq!(tracker.current(), "WIE");

        assert!(!tracker.observe("COMP2011 Data Structures 3.0 B+ 2023/1", &grammar));
        assert_eq!(tracker.current(), "WIE");
    }

    #[test]
    fn batch_parse_tracks_sections_and_counts() {
        let lines = [
            "Academic Transcript",
            "",
            "Major/DSR",
            "30/60   Compulsory",
            "COMP2011 Data Structures 3.0 B+ 2023/1",
            "COMP1011 Programming 3.0 A 2021/1 Y",
            "COMP9999 Broken Row A 2021/1",
            "GUR",
            "APSS1L01 Tomorrow's Leaders (LIPD) 3.0 A 2022/1",
        ];
        let parsed = parse_lines(&lines);
        assert_eq!(parsed.lines_read, 9);
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.failures.len(), 1);
        assert_eq!(parsed.failures[0].line_no, 7);
        assert_eq!(parsed.non_course_lines, 1);

        assert_eq!(parsed.records[0].line_no, 5);
        assert_eq!(parsed.records[0].section, "Major/DSR - Compulsory");
        assert!(parsed.records[1].marked_duplicate);
        assert_eq!(parsed.records[2].section, "LIPD");
    }

    #[test]
    fn delimited_header_is_not_a_course_row() {
        assert_eq!(
            parse("Code | Title | Credits | Result | Year/Sem").unwrap_err().kind,
            ParseFailureKind::NotACourseRow
        );

        let lines = [
            "Code | Title | Credits | Result | Year/Sem",
            "Page 1 | 3",
            "COMP2011 | Data Structures | 3.0 | B+ | 2023/1",
        ];
        let parsed = parse_lines(&lines);
        assert!(parsed.failures.is_empty());
        assert_eq!(parsed.non_course_lines, 2);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].line_no, 3);
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_line("  COMP2011\t Data   Structures 3.0 "), "COMP2011 Data Structures 3.0");
        assert_eq!(normalize_line("   "), "");
    }
}
