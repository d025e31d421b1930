use crate::model::{CourseRecord, RecordStatus, Summary};

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Credit-weighted grade point average over included records.
///
/// Only `Included` records contribute. With zero counted credits the CGPA is
/// `None` and the reason is carried in the summary.
pub fn compute_summary(records: &[CourseRecord]) -> Summary {
    let mut total_credits = 0.0;
    let mut grade_points_sum = 0.0;
    let mut included_count = 0;
    let mut excluded_count = 0;

    for r in records {
        match r.status {
            RecordStatus::Included => {
                included_count += 1;
                total_credits += r.credits;
                grade_points_sum += r.credits * r.grade_point.unwrap_or(0.0);
            }
            RecordStatus::Excluded => excluded_count += 1,
            RecordStatus::Pending | RecordStatus::Duplicate => {}
        }
    }

    let (current_cgpa, cgpa_undefined_reason) = if total_credits > 0.0 {
        (Some(round2(grade_points_sum / total_credits)), None)
    } else {
        (None, Some("no credits counted toward CGPA".to_string()))
    };

    Summary {
        current_cgpa,
        total_credits_counted: total_credits,
        grade_points_sum,
        included_count,
        excluded_count,
        cgpa_undefined_reason,
    }
}
