use crate::config::{GoalConfig, GradeConfig};
use crate::error::GoalUndefined;
use crate::model::{GoalAnalysis, GoalOutlook, Summary};

/// Average grade point needed over `remaining_credits` to finish at `goal_cgpa`.
///
/// The value is not clamped: below zero means the goal is met whatever the
/// remaining grades, above the scale maximum means it cannot be reached.
pub fn required_average_gp(
    current_cgpa: f64,
    total_credits_counted: f64,
    goal_cgpa: f64,
    remaining_credits: f64,
) -> Result<f64, GoalUndefined> {
    if ![current_cgpa, total_credits_counted, goal_cgpa, remaining_credits]
        .iter()
        .all(|v| v.is_finite())
    {
        return Err(GoalUndefined::NonFiniteInput);
    }
    if remaining_credits <= 0.0 {
        return Err(GoalUndefined::NonPositiveRemainingCredits);
    }
    let needed_total = goal_cgpa * (total_credits_counted + remaining_credits);
    Ok((needed_total - current_cgpa * total_credits_counted) / remaining_credits)
}

/// Build the goal section of a report. `None` when no goal is configured.
pub fn analyze_goal(summary: &Summary, config: &GradeConfig) -> Option<GoalAnalysis> {
    let goal = config.goal.as_ref()?;
    Some(analyze(summary, goal, config))
}

fn analyze(summary: &Summary, goal: &GoalConfig, config: &GradeConfig) -> GoalAnalysis {
    let remaining = goal.resolve_remaining(summary.total_credits_counted);
    // No counted credits: the current term contributes nothing.
    let current = summary.current_cgpa.unwrap_or(0.0);

    let computed = match remaining {
        Some(r) => required_average_gp(current, summary.total_credits_counted, goal.goal_cgpa, r),
        None => Err(GoalUndefined::MissingRemainingCredits),
    };

    match computed {
        Ok(required) => {
            let outlook = outlook(required, config.max_grade_point());
            GoalAnalysis {
                goal_cgpa: goal.goal_cgpa,
                remaining_credits: remaining.unwrap_or(0.0),
                required_average_gp: Some(required),
                letter_equivalent: match outlook {
                    GoalOutlook::Attainable => letter_equivalent(required, config),
                    _ => None,
                },
                outlook: Some(outlook),
                undefined_reason: None,
            }
        }
        Err(why) => {
            log::warn!("goal analysis undefined: {why}");
            GoalAnalysis {
                goal_cgpa: goal.goal_cgpa,
                remaining_credits: remaining.unwrap_or(0.0),
                required_average_gp: None,
                letter_equivalent: None,
                outlook: None,
                undefined_reason: Some(why.to_string()),
            }
        }
    }
}

pub fn outlook(required: f64, max_grade_point: f64) -> GoalOutlook {
    if required <= 0.0 {
        GoalOutlook::AlreadyMet
    } else if required <= max_grade_point {
        GoalOutlook::Attainable
    } else {
        GoalOutlook::Unattainable
    }
}

/// Nearest grade symbol to a grade point, as `~SYMBOL`. Ties go to the higher grade.
pub fn letter_equivalent(grade_point: f64, config: &GradeConfig) -> Option<String> {
    config
        .grade_point_table
        .iter()
        .min_by(|(_, a), (_, b)| {
            let da = (*a - grade_point).abs();
            let db = (*b - grade_point).abs();
            da.total_cmp(&db).then(b.total_cmp(a))
        })
        .map(|(symbol, _)| format!("~{symbol}"))
}
