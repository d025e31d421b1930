//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Description                                            |
//! |------|--------------------------------------------------------|
//! | 0    | Success (including reports that carry `issues[]`)      |
//! | 2    | CLI usage error (bad args, conflicting flags)          |
//! | 3    | Config invalid (TOML parse or validation failure)      |
//! | 4    | I/O failure (unreadable input, unwritable output)      |
//!
//! A transcript with unparseable rows, ambiguous duplicates or an undefined
//! goal is still a successful run. Those conditions live in the report.
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `grade_exit_code` or the command's error handling

use gradecheck_engine::GradeError;

/// Success - command completed.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
/// Matches the code clap uses for its own argument errors.
pub const EXIT_USAGE: u8 = 2;

/// Config file failed to parse or validate.
pub const EXIT_CONFIG_INVALID: u8 = 3;

/// Cannot read the lines file or config, or cannot write `--output`.
pub const EXIT_IO: u8 = 4;

/// Map an engine error to its exit code.
pub fn grade_exit_code(err: &GradeError) -> u8 {
    match err {
        GradeError::ConfigParse(_) | GradeError::ConfigValidation(_) => EXIT_CONFIG_INVALID,
        // The pipeline reports this inside the document; reaching the CLI
        // means flags asked for something the config cannot provide.
        GradeError::ScenarioUnavailable(_) => EXIT_USAGE,
    }
}
