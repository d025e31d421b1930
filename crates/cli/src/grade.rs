//! `gradecheck run` / `gradecheck validate` — transcript lines in, CGPA report out.

use std::path::{Path, PathBuf};

use clap::{Subcommand, ValueEnum};
use gradecheck_engine::{CapstoneMode, GoalConfig, GradeConfig, Report, TranscriptInput};

use crate::exit_codes::{grade_exit_code, EXIT_IO};
use crate::CliError;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CapstoneArg {
    /// Count pass/fail courses at `pass_fail_grade_point`
    Include,
    /// Leave pass/fail courses out of the CGPA
    Exclude,
}

impl From<CapstoneArg> for CapstoneMode {
    fn from(arg: CapstoneArg) -> Self {
        match arg {
            CapstoneArg::Include => CapstoneMode::Include,
            CapstoneArg::Exclude => CapstoneMode::Exclude,
        }
    }
}

#[derive(Subcommand)]
pub enum GradeCommands {
    /// Compute CGPA and goal projection from extracted transcript lines
    #[command(after_help = "\
Examples:
  gradecheck run transcript.txt
  gradecheck run transcript.txt --json
  gradecheck run transcript.txt --config gradecheck.toml --output report.json
  gradecheck run transcript.txt --goal 3.5 --total-required-credits 109
  gradecheck run transcript.txt --config gradecheck.toml --compare-capstone --json")]
    Run {
        /// Text file with one extracted transcript line per line
        lines: PathBuf,

        /// TOML config (grade table, pass/fail courses, goal)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Override `capstone_mode` from the config
        #[arg(long, value_enum)]
        capstone: Option<CapstoneArg>,

        /// Target CGPA (overrides `[goal] goal_cgpa`)
        #[arg(long, value_name = "CGPA")]
        goal: Option<f64>,

        /// Credits still to be taken
        #[arg(long, value_name = "N", conflicts_with = "total_required_credits")]
        remaining_credits: Option<f64>,

        /// Credits required to graduate; remaining = this - credits counted
        #[arg(long, value_name = "N")]
        total_required_credits: Option<f64>,

        /// Also compute CGPA and goal with the capstone both included and excluded
        #[arg(long)]
        compare_capstone: bool,

        /// Output JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write JSON report to file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Validate a config file without running
    #[command(after_help = "\
Examples:
  gradecheck validate gradecheck.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },
}

/// Goal-related flags, applied on top of the config file.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoalOverrides {
    pub goal: Option<f64>,
    pub remaining_credits: Option<f64>,
    pub total_required_credits: Option<f64>,
}

impl GoalOverrides {
    fn is_empty(&self) -> bool {
        self.goal.is_none()
            && self.remaining_credits.is_none()
            && self.total_required_credits.is_none()
    }
}

pub fn cmd_grade(cmd: GradeCommands) -> Result<(), CliError> {
    match cmd {
        GradeCommands::Run {
            lines,
            config,
            capstone,
            goal,
            remaining_credits,
            total_required_credits,
            compare_capstone,
            json,
            output,
        } => {
            let overrides = GoalOverrides {
                goal,
                remaining_credits,
                total_required_credits,
            };
            cmd_run(
                lines,
                config,
                capstone.map(CapstoneMode::from),
                overrides,
                compare_capstone,
                json,
                output,
            )
        }
        GradeCommands::Validate { config } => cmd_validate(config),
    }
}

fn io_err(msg: impl Into<String>) -> CliError {
    CliError {
        code: EXIT_IO,
        message: msg.into(),
        hint: None,
    }
}

fn grade_err(err: gradecheck_engine::GradeError) -> CliError {
    CliError {
        code: grade_exit_code(&err),
        message: err.to_string(),
        hint: None,
    }
}

fn load_config(path: Option<&Path>) -> Result<GradeConfig, CliError> {
    let Some(path) = path else {
        log::info!("no config given; using built-in defaults");
        return Ok(GradeConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| io_err(format!("cannot read config {}: {e}", path.display())))?;
    GradeConfig::from_toml(&text)
        .map_err(|e| grade_err(e).with_hint(format!("in {}", path.display())))
}

/// Apply flag overrides to a loaded config and re-validate.
pub fn apply_overrides(
    mut config: GradeConfig,
    capstone: Option<CapstoneMode>,
    overrides: GoalOverrides,
) -> Result<GradeConfig, CliError> {
    if let Some(mode) = capstone {
        config.capstone_mode = mode;
    }

    if !overrides.is_empty() {
        let existing = config.goal.take();
        let goal_cgpa = overrides
            .goal
            .or(existing.as_ref().map(|g| g.goal_cgpa))
            .ok_or_else(|| {
                CliError::usage("credit flags need a target CGPA")
                    .with_hint("pass --goal or add a [goal] table to the config")
            })?;

        let (remaining_credits, total_required_credits) =
            if overrides.remaining_credits.is_some() || overrides.total_required_credits.is_some() {
                (overrides.remaining_credits, overrides.total_required_credits)
            } else {
                existing
                    .as_ref()
                    .map(|g| (g.remaining_credits, g.total_required_credits))
                    .unwrap_or((None, None))
            };

        if remaining_credits.is_none() && total_required_credits.is_none() {
            return Err(CliError::usage("--goal needs the credits still to be taken")
                .with_hint("pass --remaining-credits or --total-required-credits"));
        }

        config.goal = Some(GoalConfig {
            goal_cgpa,
            remaining_credits,
            total_required_credits,
        });
    }

    config.validate().map_err(grade_err)?;
    Ok(config)
}

fn read_lines(path: &Path) -> Result<TranscriptInput, CliError> {
    let bytes = std::fs::read(path)
        .map_err(|e| io_err(format!("cannot read {}: {e}", path.display())))?;
    // Text extracted from PDFs is not always clean UTF-8.
    let text = String::from_utf8_lossy(&bytes);
    Ok(TranscriptInput::from_text(&text))
}

fn cmd_run(
    lines_path: PathBuf,
    config_path: Option<PathBuf>,
    capstone: Option<CapstoneMode>,
    overrides: GoalOverrides,
    compare_capstone: bool,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = apply_overrides(load_config(config_path.as_deref())?, capstone, overrides)?;
    let input = read_lines(&lines_path)?;
    log::info!("read {} lines from {}", input.lines.len(), lines_path.display());

    let report = if compare_capstone {
        gradecheck_engine::run_with_scenarios(&config, &input)
    } else {
        gradecheck_engine::run(&config, &input)
    };

    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| io_err(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| io_err(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    print_summary(&report);
    Ok(())
}

/// Human summary to stderr.
fn print_summary(report: &Report) {
    let s = &report.summary;
    eprintln!(
        "{} courses: {} counted, {} excluded, {} duplicates dropped, {} unreadable rows",
        report.courses.len(),
        s.included_count,
        s.excluded_count,
        report.dedup_logs.len(),
        report.parse_failures.len(),
    );

    match s.current_cgpa {
        Some(cgpa) => eprintln!(
            "CGPA: {cgpa:.2} / {} over {} credits (capstone {})",
            report.meta.grading_scale, s.total_credits_counted, report.meta.capstone_mode,
        ),
        None => eprintln!("CGPA: n/a (no credits counted)"),
    }

    if let Some(ref goal) = report.goal_analysis {
        match goal.required_average_gp {
            Some(required) => eprintln!(
                "goal {:.2}: need {required:.2} average over {} remaining credits{}",
                goal.goal_cgpa,
                goal.remaining_credits,
                goal.letter_equivalent
                    .as_deref()
                    .map(|l| format!(" ({l})"))
                    .unwrap_or_default(),
            ),
            None => eprintln!(
                "goal {:.2}: undefined ({})",
                goal.goal_cgpa,
                goal.undefined_reason.as_deref().unwrap_or("unknown"),
            ),
        }
    }

    if let Some(ref cmp) = report.capstone_comparison {
        for outcome in [&cmp.capstone_included, &cmp.capstone_excluded] {
            let cgpa = outcome
                .summary
                .current_cgpa
                .map(|c| format!("{c:.2}"))
                .unwrap_or_else(|| "n/a".into());
            eprintln!("  capstone {}: CGPA {cgpa}", outcome.capstone_mode);
        }
    }

    for issue in &report.issues {
        eprintln!("warning: {}", issue.message);
    }
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path))?;
    eprintln!(
        "{}: ok ({} grades on a {} scale, capstone {}, {} pass/fail course(s){})",
        config_path.display(),
        config.grade_point_table.len(),
        config.max_grade_point(),
        config.capstone_mode,
        config.pass_fail_course_codes.len(),
        match config.goal {
            Some(ref g) => format!(", goal {}", g.goal_cgpa),
            None => String::new(),
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::{EXIT_CONFIG_INVALID, EXIT_USAGE};

    #[test]
    fn flags_override_config_goal() {
        let base = GradeConfig::from_toml(
            "[goal]\ngoal_cgpa = 3.0\ntotal_required_credits = 120.0\n",
        )
        .unwrap();
        let config = apply_overrides(
            base,
            Some(CapstoneMode::Include),
            GoalOverrides {
                goal: Some(3.5),
                ..GoalOverrides::default()
            },
        )
        .unwrap();
        assert_eq!(config.capstone_mode, CapstoneMode::Include);
        let goal = config.goal.unwrap();
        assert_eq!(goal.goal_cgpa, 3.5);
        assert_eq!(goal.total_required_credits, Some(120.0));
    }

    #[test]
    fn credit_flag_replaces_both_credit_fields() {
        let base = GradeConfig::from_toml(
            "[goal]\ngoal_cgpa = 3.0\ntotal_required_credits = 120.0\n",
        )
        .unwrap();
        let config = apply_overrides(
            base,
            None,
            GoalOverrides {
                remaining_credits: Some(30.0),
                ..GoalOverrides::default()
            },
        )
        .unwrap();
        let goal = config.goal.unwrap();
        assert_eq!(goal.goal_cgpa, 3.0);
        assert_eq!(goal.remaining_credits, Some(30.0));
        assert_eq!(goal.total_required_credits, None);
    }

    #[test]
    fn goal_without_credits_is_usage_error() {
        let err = apply_overrides(
            GradeConfig::default(),
            None,
            GoalOverrides {
                goal: Some(3.5),
                ..GoalOverrides::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.hint.is_some());
    }

    #[test]
    fn credits_without_goal_is_usage_error() {
        let err = apply_overrides(
            GradeConfig::default(),
            None,
            GoalOverrides {
                remaining_credits: Some(30.0),
                ..GoalOverrides::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
    }

    #[test]
    fn goal_above_scale_is_config_invalid() {
        let err = apply_overrides(
            GradeConfig::default(),
            None,
            GoalOverrides {
                goal: Some(5.0),
                remaining_credits: Some(30.0),
                ..GoalOverrides::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.code, EXIT_CONFIG_INVALID);
    }

    #[test]
    fn include_mode_needs_grade_point_for_listed_codes() {
        let base = GradeConfig::from_toml("pass_fail_course_codes = [\"COMP4913\"]\n").unwrap();
        let err = apply_overrides(base, Some(CapstoneMode::Include), GoalOverrides::default())
            .unwrap_err();
        assert_eq!(err.code, EXIT_CONFIG_INVALID);
        assert!(err.message.contains("pass_fail_grade_point"));
    }
}
