//! Time-bounded constituent weights for a benchmark or fund.
//!
//! Segments arrive flat from the metadata store, tagged with a group id (one
//! rebalancing event). Every segment in a group shares one effective range.
//! Loading validates the rows and rejects the whole schedule on the first
//! malformed segment: a partially loaded schedule would misstate every blended
//! value downstream.

use crate::domain::error::FundbenchError;
use crate::ports::schedule_port::SchedulePort;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

/// One constituent weight row as stored upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSegment {
    pub group_id: i64,
    pub security: String,
    pub weight: f64,
    pub effective_start: NaiveDate,
    pub effective_end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constituent {
    pub security: String,
    pub weight: f64,
}

/// All constituents of one rebalancing event.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentGroup {
    pub group_id: i64,
    pub effective_start: NaiveDate,
    pub effective_end: NaiveDate,
    pub constituents: Vec<Constituent>,
}

impl SegmentGroup {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.effective_start <= date && date <= self.effective_end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightSchedule {
    pub id: i64,
    /// Sorted by effective start, then group id.
    groups: Vec<SegmentGroup>,
}

impl WeightSchedule {
    /// Load and validate the schedule for `id` from the metadata store.
    pub fn load(store: &dyn SchedulePort, id: i64) -> Result<Self, FundbenchError> {
        let segments = store.load_weight_segments(id)?;
        Self::from_segments(id, segments)
    }

    pub fn from_segments(id: i64, segments: Vec<WeightSegment>) -> Result<Self, FundbenchError> {
        if segments.is_empty() {
            return Err(FundbenchError::integrity(format!(
                "schedule {id} has no weight segments"
            )));
        }

        let mut grouped: BTreeMap<i64, SegmentGroup> = BTreeMap::new();
        let mut seen: HashSet<(i64, String)> = HashSet::new();

        for segment in segments {
            validate_segment(id, &segment)?;

            if !seen.insert((segment.group_id, segment.security.clone())) {
                return Err(FundbenchError::integrity(format!(
                    "schedule {id} group {} lists {} more than once",
                    segment.group_id, segment.security
                )));
            }

            let group = grouped
                .entry(segment.group_id)
                .or_insert_with(|| SegmentGroup {
                    group_id: segment.group_id,
                    effective_start: segment.effective_start,
                    effective_end: segment.effective_end,
                    constituents: Vec::new(),
                });

            if group.effective_start != segment.effective_start
                || group.effective_end != segment.effective_end
            {
                return Err(FundbenchError::integrity(format!(
                    "schedule {id} group {} mixes ranges {}..{} and {}..{}",
                    segment.group_id,
                    group.effective_start,
                    group.effective_end,
                    segment.effective_start,
                    segment.effective_end
                )));
            }

            group.constituents.push(Constituent {
                security: segment.security,
                weight: segment.weight,
            });
        }

        let mut groups: Vec<SegmentGroup> = grouped.into_values().collect();
        groups.sort_by_key(|g| (g.effective_start, g.group_id));
        Ok(Self { id, groups })
    }

    pub fn groups(&self) -> &[SegmentGroup] {
        &self.groups
    }

    /// Every security referenced by any group, in first-seen order.
    pub fn constituent_universe(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.groups
            .iter()
            .flat_map(|g| g.constituents.iter())
            .filter(|c| seen.insert(c.security.as_str()))
            .map(|c| c.security.clone())
            .collect()
    }

    /// Groups whose effective range contains `date`, in schedule order.
    pub fn groups_on(&self, date: NaiveDate) -> Vec<&SegmentGroup> {
        self.groups.iter().filter(|g| g.contains(date)).collect()
    }

    /// Earliest effective start and latest effective end.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.groups.iter().map(|g| g.effective_start).min()?;
        let end = self.groups.iter().map(|g| g.effective_end).max()?;
        Some((start, end))
    }
}

fn validate_segment(id: i64, segment: &WeightSegment) -> Result<(), FundbenchError> {
    if segment.effective_start > segment.effective_end {
        return Err(FundbenchError::integrity(format!(
            "schedule {id} group {} segment for {} starts {} after it ends {}",
            segment.group_id, segment.security, segment.effective_start, segment.effective_end
        )));
    }
    if !segment.weight.is_finite() {
        return Err(FundbenchError::integrity(format!(
            "schedule {id} group {} weight for {} is not finite",
            segment.group_id, segment.security
        )));
    }
    if segment.security.trim().is_empty() {
        return Err(FundbenchError::integrity(format!(
            "schedule {id} group {} has a segment without a security",
            segment.group_id
        )));
    }
    Ok(())
}
