use std::collections::HashMap;

use crate::config::GradeConfig;
use crate::model::{CourseRecord, DedupAmbiguity, DedupLogEntry, OccurrenceKey, RecordStatus};

/// Unique records plus a log line for every dropped duplicate.
#[derive(Debug, Clone, Default)]
pub struct DedupOutput {
    /// Canonical records, in input order.
    pub unique: Vec<CourseRecord>,
    pub logs: Vec<DedupLogEntry>,
    /// Groups that were resolved without a clean winner.
    pub ambiguous: Vec<(OccurrenceKey, DedupAmbiguity)>,
}

/// Collapse records sharing (course_code, year_sem, credits) into one.
///
/// The canonical record is the first one carrying a recognized result, or the
/// first one in the group when none does. Groups with no recognized result or
/// with differing recognized results are reported as ambiguous.
pub fn deduplicate(records: Vec<CourseRecord>, config: &GradeConfig) -> DedupOutput {
    let mut index: HashMap<OccurrenceKey, usize> = HashMap::new();
    let mut groups: Vec<(OccurrenceKey, Vec<(usize, CourseRecord)>)> = Vec::new();

    for (pos, record) in records.into_iter().enumerate() {
        let key = record.occurrence_key();
        match index.get(&key) {
            Some(&g) => groups[g].1.push((pos, record)),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![(pos, record)]));
            }
        }
    }

    let mut kept: Vec<(usize, CourseRecord)> = Vec::with_capacity(groups.len());
    let mut out = DedupOutput::default();

    for (key, mut members) in groups {
        if members.len() == 1 {
            kept.extend(members);
            continue;
        }

        let canonical_idx = members
            .iter()
            .position(|(_, r)| config.is_recognized_result(&r.result))
            .unwrap_or(0);
        let ambiguity = group_ambiguity(&members, config);

        if let Some(kind) = ambiguity {
            log::warn!(
                "ambiguous duplicate group {} {} ({} records): {kind}",
                key.course_code,
                key.year_sem,
                members.len(),
            );
            out.ambiguous.push((key, kind));
        }

        let (canonical_pos, canonical) = members.remove(canonical_idx);
        for (_, mut dropped) in members {
            dropped.status = RecordStatus::Duplicate;
            out.logs.push(DedupLogEntry {
                reason: format!(
                    "duplicate of {} listed under '{}'; kept entry from '{}'",
                    dropped.course_code, dropped.section, canonical.section,
                ),
                kept: canonical.as_ref_entry(),
                dropped: dropped.as_ref_entry(),
                ambiguity,
            });
        }
        kept.push((canonical_pos, canonical));
    }

    kept.sort_by_key(|(pos, _)| *pos);
    out.unique = kept.into_iter().map(|(_, r)| r).collect();

    log::debug!(
        "dedup: {} unique, {} dropped, {} ambiguous groups",
        out.unique.len(),
        out.logs.len(),
        out.ambiguous.len(),
    );
    out
}

fn group_ambiguity(
    members: &[(usize, CourseRecord)],
    config: &GradeConfig,
) -> Option<DedupAmbiguity> {
    let mut recognized: Vec<&str> = members
        .iter()
        .map(|(_, r)| r.result.as_str())
        .filter(|result| config.is_recognized_result(result))
        .collect();

    if recognized.is_empty() {
        return Some(DedupAmbiguity::NoRecognizedResult);
    }
    recognized.sort_unstable();
    recognized.dedup();
    if recognized.len() > 1 {
        Some(DedupAmbiguity::ConflictingResults)
    } else {
        None
    }
}
