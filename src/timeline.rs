//! Ordered tariff period sequences
//!
//! A [`Timeline`] owns the full ordered history of periods for one flow
//! direction. Insertion is permissive about gaps and overlaps so that
//! historical back-filling stays possible; those issues are advisory and
//! surfaced by the validator instead.

use crate::error::{FaradayError, Result};
use crate::model::{FlowDirection, PeriodStatus, Rate, StandingCharge, TariffPeriod};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordered collection of tariff periods for one flow direction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    /// Direction every member period must share
    pub flow_direction: FlowDirection,

    /// Periods ordered by start date
    periods: Vec<TariffPeriod>,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new(flow_direction: FlowDirection) -> Self {
        Self {
            flow_direction,
            periods: Vec::new(),
        }
    }

    /// Read-only view of the periods, ordered by start date
    pub fn periods(&self) -> &[TariffPeriod] {
        &self.periods
    }

    /// Number of periods in the timeline
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Whether the timeline has no periods
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Insert a period, keeping start-date order.
    ///
    /// Rejects inverted bounds and direction mismatches; never rejects gaps
    /// or overlaps (the validator reports those).
    pub fn add_period(&mut self, period: TariffPeriod) -> Result<()> {
        if period.flow_direction != self.flow_direction {
            return Err(FaradayError::invalid_period(format!(
                "period direction {} does not match {} timeline",
                period.flow_direction, self.flow_direction
            )));
        }
        if let Some(end) = period.end
            && end < period.start
        {
            return Err(FaradayError::invalid_period(format!(
                "end date {} precedes start date {}",
                end, period.start
            )));
        }

        self.periods.push(period);
        self.sort_periods();
        Ok(())
    }

    /// Remove a period by ID
    pub fn remove_period(&mut self, id: Uuid) -> Result<TariffPeriod> {
        match self.periods.iter().position(|p| p.id == id) {
            Some(index) => Ok(self.periods.remove(index)),
            None => Err(FaradayError::not_found(format!(
                "no {} period with id {}",
                self.flow_direction, id
            ))),
        }
    }

    /// Look up a period by ID
    pub fn period(&self, id: Uuid) -> Option<&TariffPeriod> {
        self.periods.iter().find(|p| p.id == id)
    }

    /// The period covering `date`, if any.
    ///
    /// Tie-break on data-entry overlaps: the latest-starting matching
    /// period wins (most recently started assignment takes precedence).
    /// The overlap itself is still a validator finding.
    pub fn period_at(&self, date: NaiveDate) -> Option<&TariffPeriod> {
        self.periods
            .iter()
            .filter(|p| p.contains_date(date))
            .max_by_key(|p| p.start)
    }

    /// The open-ended period with the latest start, if any
    pub fn current_active_period(&self) -> Option<&TariffPeriod> {
        self.periods
            .iter()
            .filter(|p| p.is_open_ended())
            .max_by_key(|p| p.start)
    }

    /// Lifecycle state of a period relative to `date`, with the timeline
    /// tie-break applied: a period that covers `date` but loses to a
    /// later-starting one reports as superseded.
    pub fn period_status(&self, id: Uuid, date: NaiveDate) -> Result<PeriodStatus> {
        let period = self
            .period(id)
            .ok_or_else(|| FaradayError::not_found(format!("no period with id {}", id)))?;

        let status = period.status_on(date);
        if status == PeriodStatus::Active
            && self.period_at(date).map(|winner| winner.id) != Some(id)
        {
            return Ok(PeriodStatus::Superseded);
        }
        Ok(status)
    }

    /// Replace a period's fetched schedule in one atomic assignment.
    ///
    /// Re-fetching must not duplicate or corrupt existing entries, so the
    /// whole schedule for the requested window is swapped, never appended.
    pub fn set_schedule(
        &mut self,
        id: Uuid,
        rates: Vec<Rate>,
        standing_charges: Vec<StandingCharge>,
    ) -> Result<()> {
        let direction = self.flow_direction;
        let period = self
            .periods
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| {
                FaradayError::not_found(format!("no {} period with id {}", direction, id))
            })?;

        period.rates = rates;
        period.standing_charges = standing_charges;
        period.last_updated = Some(Utc::now());
        Ok(())
    }

    /// Copy-on-write insert: returns a new timeline with the period added
    pub fn with_period(&self, period: TariffPeriod) -> Result<Self> {
        let mut next = self.clone();
        next.add_period(period)?;
        Ok(next)
    }

    /// Copy-on-write removal: returns a new timeline without the period
    pub fn without_period(&self, id: Uuid) -> Result<Self> {
        let mut next = self.clone();
        next.remove_period(id)?;
        Ok(next)
    }

    fn sort_periods(&mut self) {
        // Stable by construction; equal starts keep insertion order and are
        // reported as overlaps by the validator.
        self.periods.sort_by_key(|p| p.start);
    }
}
