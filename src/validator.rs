//! Timeline validation
//!
//! Pure, deterministic checks over a [`Timeline`] producing advisory
//! findings: coverage gaps, overlapping periods and malformed periods.
//! Findings are data returned from a successful call, never errors, and
//! validating an unchanged timeline twice yields identical results.

use crate::model::TariffPeriod;
use crate::timeline::Timeline;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A date range covered by no period.
///
/// `after_end` is the end of the earlier period and `before_start` the
/// start of the later one; exact one-day adjacency is not a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    /// End date of the period before the gap
    pub after_end: NaiveDate,

    /// Start date of the period after the gap
    pub before_start: NaiveDate,
}

/// Two periods whose date ranges intersect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlap {
    /// Earlier-starting period
    pub first: Uuid,

    /// Later-starting period
    pub second: Uuid,
}

/// Reason code for a malformed period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// End date precedes start date
    EndBeforeStart,
}

/// A period flagged as individually malformed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidPeriodFinding {
    /// Offending period
    pub id: Uuid,

    /// Why it was flagged
    pub reason: InvalidReason,
}

/// Structured findings from one validation pass.
///
/// This is the exact shape rendered by the operator-facing gap/overlap
/// display; all lists are ordered by start date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Date ranges covered by no period
    pub gaps: Vec<Gap>,

    /// Pairs of intersecting periods
    pub overlaps: Vec<Overlap>,

    /// Individually malformed periods with reason codes
    pub invalid_periods: Vec<InvalidPeriodFinding>,
}

impl ValidationReport {
    /// Whether the pass produced no findings at all
    pub fn is_clean(&self) -> bool {
        self.gaps.is_empty() && self.overlaps.is_empty() && self.invalid_periods.is_empty()
    }

    /// Total number of findings
    pub fn finding_count(&self) -> usize {
        self.gaps.len() + self.overlaps.len() + self.invalid_periods.len()
    }
}

/// Validate a timeline, reporting gaps, overlaps and malformed periods.
///
/// Operates on a sorted view; the timeline itself is never mutated.
/// Malformed periods have untrustworthy boundaries and are excluded from
/// the pairwise gap/overlap walk, but still reported.
pub fn validate(timeline: &Timeline) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut sorted: Vec<&TariffPeriod> = timeline.periods().iter().collect();
    sorted.sort_by_key(|p| p.start);

    for period in &sorted {
        if let Some(end) = period.end
            && end < period.start
        {
            report.invalid_periods.push(InvalidPeriodFinding {
                id: period.id,
                reason: InvalidReason::EndBeforeStart,
            });
        }
    }

    let valid: Vec<&TariffPeriod> = sorted
        .iter()
        .copied()
        .filter(|p| !report.invalid_periods.iter().any(|f| f.id == p.id))
        .collect();

    for (i, current) in valid.iter().enumerate() {
        match current.end {
            // An open-ended period logically extends forever, so any
            // period after it in sorted order is an overlap.
            None => {
                for later in &valid[i + 1..] {
                    report.overlaps.push(Overlap {
                        first: current.id,
                        second: later.id,
                    });
                }
            }
            Some(end) => {
                let Some(next) = valid.get(i + 1) else {
                    continue;
                };
                if end >= next.start {
                    // Boundary equality counts as overlap; adjacency needs
                    // the one-day gap convention.
                    report.overlaps.push(Overlap {
                        first: current.id,
                        second: next.id,
                    });
                } else if end
                    .checked_add_days(Days::new(1))
                    .is_some_and(|bound| bound < next.start)
                {
                    report.gaps.push(Gap {
                        after_end: end,
                        before_start: next.start,
                    });
                }
            }
        }
    }

    report
}
