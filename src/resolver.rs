//! Point-in-time rate resolution
//!
//! Given a timeline and a timestamp, finds the owning period and resolves
//! the exact unit rate (or standing charge) from that period's schedule,
//! applying the tariff-type-specific lookup strategy.

use crate::config::Economy7Config;
use crate::error::{FaradayError, Result};
use crate::logging::get_logger;
use crate::model::{Rate, RateType, StandingCharge, TariffPeriod, TariffType};
use crate::timeline::Timeline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The resolved unit rate for one timestamp: both VAT variants plus the
/// validity bounds, so the caller chooses which value to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRate {
    /// Pence per kWh excluding VAT
    pub value_exc_vat: f64,

    /// Pence per kWh including VAT
    pub value_inc_vat: f64,

    /// Start of the matched rate's validity
    pub valid_from: DateTime<Utc>,

    /// End of the matched rate's validity, if bounded
    pub valid_to: Option<DateTime<Utc>>,

    /// Register the rate came from
    pub rate_type: RateType,

    /// Whether the rate came from the export timeline
    pub is_export: bool,
}

/// The resolved daily standing charge for one timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStandingCharge {
    /// Pence per day excluding VAT
    pub value_exc_vat: f64,

    /// Pence per day including VAT
    pub value_inc_vat: f64,

    /// Start of the matched charge's validity
    pub valid_from: DateTime<Utc>,

    /// End of the matched charge's validity, if bounded
    pub valid_to: Option<DateTime<Utc>>,
}

/// Which register a timestamp resolves against for a given tariff type.
///
/// The behavior table is one exhaustive match: adding a tariff type forces
/// a decision here.
pub fn expected_rate_type(
    tariff_type: TariffType,
    timestamp: DateTime<Utc>,
    economy7: &Economy7Config,
) -> RateType {
    match tariff_type {
        TariffType::Fixed | TariffType::Variable | TariffType::Agile | TariffType::Go => {
            RateType::Standard
        }
        TariffType::Economy7 => {
            if economy7.is_night(timestamp.time()) {
                RateType::Night
            } else {
                RateType::Day
            }
        }
    }
}

/// Resolve the unit rate in effect at `timestamp`.
///
/// Fails with `NoCoverage` when no period owns the timestamp and with
/// `RateNotFound` when the owning period's schedule has no matching entry
/// (the two are distinct so callers can render precise messages).
pub fn resolve_rate(
    timeline: &Timeline,
    timestamp: DateTime<Utc>,
    economy7: &Economy7Config,
) -> Result<ResolvedRate> {
    let direction = timeline.flow_direction;
    let period = timeline
        .period_at(timestamp.date_naive())
        .ok_or_else(|| FaradayError::no_coverage(timestamp, direction))?;

    let wanted = expected_rate_type(period.tariff_type, timestamp, economy7);
    let rate = select_rate(period, timestamp, wanted)
        .ok_or_else(|| FaradayError::rate_not_found(timestamp, direction))?;

    Ok(ResolvedRate {
        value_exc_vat: rate.value_exc_vat,
        value_inc_vat: rate.value_inc_vat,
        valid_from: rate.valid_from,
        valid_to: rate.valid_to,
        rate_type: rate.rate_type,
        is_export: direction == crate::model::FlowDirection::Export,
    })
}

/// Resolve the daily standing charge in effect at `timestamp`.
///
/// Standing charges are only meaningful on the import timeline; callers
/// resolve against that one.
pub fn resolve_standing_charge(
    timeline: &Timeline,
    timestamp: DateTime<Utc>,
) -> Result<ResolvedStandingCharge> {
    let direction = timeline.flow_direction;
    let period = timeline
        .period_at(timestamp.date_naive())
        .ok_or_else(|| FaradayError::no_coverage(timestamp, direction))?;

    let charge = select_standing_charge(period, timestamp)
        .ok_or_else(|| FaradayError::rate_not_found(timestamp, direction))?;

    Ok(ResolvedStandingCharge {
        value_exc_vat: charge.value_exc_vat,
        value_inc_vat: charge.value_inc_vat,
        valid_from: charge.valid_from,
        valid_to: charge.valid_to,
    })
}

/// Pick the schedule entry covering `timestamp` for the wanted register.
///
/// When the external fetch delivered overlapping entries, the latest
/// `valid_from` wins (same most-recent-wins policy as period resolution)
/// and the anomaly is logged; the resolver does not repair the schedule.
fn select_rate(period: &TariffPeriod, timestamp: DateTime<Utc>, wanted: RateType) -> Option<&Rate> {
    let mut matches: Vec<&Rate> = period
        .rates
        .iter()
        .filter(|r| r.rate_type == wanted && r.contains(timestamp))
        .collect();

    if matches.len() > 1 {
        get_logger("resolver").warn(&format!(
            "{} overlapping {} rates in '{}' at {}, using latest valid_from",
            matches.len(),
            wanted,
            period.display_name,
            timestamp
        ));
        matches.sort_by_key(|r| r.valid_from);
    }
    matches.last().copied()
}

fn select_standing_charge(
    period: &TariffPeriod,
    timestamp: DateTime<Utc>,
) -> Option<&StandingCharge> {
    let mut matches: Vec<&StandingCharge> = period
        .standing_charges
        .iter()
        .filter(|c| c.contains(timestamp))
        .collect();

    if matches.len() > 1 {
        get_logger("resolver").warn(&format!(
            "{} overlapping standing charges in '{}' at {}, using latest valid_from",
            matches.len(),
            period.display_name,
            timestamp
        ));
        matches.sort_by_key(|c| c.valid_from);
    }
    matches.last().copied()
}
