//! Folds a weight schedule and a price panel into one blended value series.
//!
//! For each panel date the active segment group supplies the weights and the
//! blended value is `sum(price * weight)` over that group's constituents. A
//! date is left out of the series when no group covers it or when any
//! security of the schedule's constituent universe has no price on it.

use crate::domain::price_panel::PricePanel;
use crate::domain::value_series::{BlendedSeries, SeriesPoint, ValueSeries};
use crate::domain::weight_schedule::{SegmentGroup, WeightSchedule};
use chrono::NaiveDate;

/// Something noteworthy that happened while blending one date.
#[derive(Debug, Clone, PartialEq)]
pub enum BlendDiagnostic {
    /// More than one group claimed the date; `chosen` won the tie-break.
    OverlappingGroups {
        date: NaiveDate,
        chosen: i64,
        ignored: Vec<i64>,
    },
    /// A universe security had no price, so the date was excluded.
    MissingPrice { date: NaiveDate, security: String },
    /// No group covers the date, so it was excluded.
    NoActiveGroup { date: NaiveDate },
}

#[derive(Debug, Clone, Default)]
pub struct BlendOutcome {
    pub series: BlendedSeries,
    pub diagnostics: Vec<BlendDiagnostic>,
}

impl BlendOutcome {
    pub fn overlap_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, BlendDiagnostic::OverlappingGroups { .. }))
            .count()
    }

    pub fn excluded_count(&self) -> usize {
        self.diagnostics.len() - self.overlap_count()
    }
}

/// Blend `panel` with `schedule`, discarding diagnostics.
pub fn build(schedule: &WeightSchedule, panel: &PricePanel) -> BlendedSeries {
    build_with_diagnostics(schedule, panel).series
}

pub fn build_with_diagnostics(schedule: &WeightSchedule, panel: &PricePanel) -> BlendOutcome {
    let universe = schedule.constituent_universe();
    let mut points = Vec::with_capacity(panel.len());
    let mut diagnostics = Vec::new();

    for date in panel.dates() {
        let Some(group) = active_group(schedule, date, &mut diagnostics) else {
            tracing::debug!(%date, schedule = schedule.id, "no active weight group");
            diagnostics.push(BlendDiagnostic::NoActiveGroup { date });
            continue;
        };

        if let Some(security) = universe.iter().find(|s| panel.price(date, s).is_none()) {
            tracing::debug!(%date, %security, "universe price missing, date excluded");
            diagnostics.push(BlendDiagnostic::MissingPrice {
                date,
                security: security.clone(),
            });
            continue;
        }

        match blend_date(group, panel, date) {
            Ok(value) => points.push(SeriesPoint { date, value }),
            Err(security) => {
                tracing::debug!(%date, %security, "constituent price missing, date excluded");
                diagnostics.push(BlendDiagnostic::MissingPrice { date, security });
            }
        }
    }

    BlendOutcome {
        series: ValueSeries::from_ordered(points),
        diagnostics,
    }
}

/// Pick the group covering `date`. Overlaps are an upstream data defect: the
/// group with the later effective start wins (then the larger group id) and a
/// warning is recorded instead of failing the build.
fn active_group<'a>(
    schedule: &'a WeightSchedule,
    date: NaiveDate,
    diagnostics: &mut Vec<BlendDiagnostic>,
) -> Option<&'a SegmentGroup> {
    let candidates = schedule.groups_on(date);
    let chosen = *candidates
        .iter()
        .max_by_key(|g| (g.effective_start, g.group_id))?;

    if candidates.len() > 1 {
        let ignored: Vec<i64> = candidates
            .iter()
            .filter(|g| g.group_id != chosen.group_id)
            .map(|g| g.group_id)
            .collect();
        tracing::warn!(
            %date,
            schedule = schedule.id,
            chosen = chosen.group_id,
            ?ignored,
            "overlapping weight groups"
        );
        diagnostics.push(BlendDiagnostic::OverlappingGroups {
            date,
            chosen: chosen.group_id,
            ignored,
        });
    }

    Some(chosen)
}

/// Weighted sum for one date, or the first constituent without a price.
fn blend_date(group: &SegmentGroup, panel: &PricePanel, date: NaiveDate) -> Result<f64, String> {
    group.constituents.iter().try_fold(0.0, |acc, c| {
        panel
            .price(date, &c.security)
            .map(|price| acc + price * c.weight)
            .ok_or_else(|| c.security.clone())
    })
}
