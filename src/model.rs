//! Core data entities for tariff tracking
//!
//! This module defines the period, rate and standing-charge types shared by
//! the timeline, validator and resolver, along with the closed enums that
//! drive rate-resolution behavior.

use crate::error::{FaradayError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of energy flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    /// Energy drawn from the grid
    Import,

    /// Energy sent to the grid (e.g. solar generation)
    Export,
}

impl FlowDirection {
    /// Stable lowercase name used in logs and serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Export => "export",
        }
    }
}

impl std::fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commercial tariff structure, selecting the rate-resolution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TariffType {
    /// Fixed unit rate for the whole contract
    Fixed,

    /// Supplier-variable standard rate
    Variable,

    /// Half-hourly dynamic pricing
    Agile,

    /// Day/night split metering
    Economy7,

    /// EV-oriented off-peak tariff
    Go,
}

impl TariffType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Variable => "variable",
            Self::Agile => "agile",
            Self::Economy7 => "economy7",
            Self::Go => "go",
        }
    }
}

impl std::fmt::Display for TariffType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rate classification within a period's schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    /// Single-register rate (all tariff types except Economy 7)
    Standard,

    /// Economy 7 day register
    Day,

    /// Economy 7 night register
    Night,
}

impl RateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Day => "day",
            Self::Night => "night",
        }
    }
}

impl std::fmt::Display for RateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UK grid supply point group, determining the regional rate schedule.
///
/// The letters I and O are not assigned, leaving 14 valid regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    J,
    K,
    L,
    M,
    N,
    P,
}

impl Region {
    /// The single-letter code used in tariff codes
    pub fn letter(&self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
            Self::H => 'H',
            Self::J => 'J',
            Self::K => 'K',
            Self::L => 'L',
            Self::M => 'M',
            Self::N => 'N',
            Self::P => 'P',
        }
    }

    /// Parse a one-letter regional code
    pub fn from_letter(letter: char) -> Result<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Ok(Self::A),
            'B' => Ok(Self::B),
            'C' => Ok(Self::C),
            'D' => Ok(Self::D),
            'E' => Ok(Self::E),
            'F' => Ok(Self::F),
            'G' => Ok(Self::G),
            'H' => Ok(Self::H),
            'J' => Ok(Self::J),
            'K' => Ok(Self::K),
            'L' => Ok(Self::L),
            'M' => Ok(Self::M),
            'N' => Ok(Self::N),
            'P' => Ok(Self::P),
            other => Err(FaradayError::validation(
                "region".to_string(),
                format!("Unknown region code: {}", other),
            )),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A priced value valid over a sub-interval of a tariff period.
///
/// Validity is half-open: `valid_from` inclusive, `valid_to` exclusive,
/// `None` meaning unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    /// Start of validity (inclusive)
    pub valid_from: DateTime<Utc>,

    /// End of validity (exclusive); `None` = open-ended
    pub valid_to: Option<DateTime<Utc>>,

    /// Pence per kWh excluding VAT
    pub value_exc_vat: f64,

    /// Pence per kWh including VAT
    pub value_inc_vat: f64,

    /// Register this rate applies to
    pub rate_type: RateType,
}

impl Rate {
    /// Whether `timestamp` falls inside the `[valid_from, valid_to)` window
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.valid_from <= timestamp && self.valid_to.is_none_or(|to| timestamp < to)
    }
}

/// A fixed daily charge with its own validity window; import-only in meaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingCharge {
    /// Start of validity (inclusive)
    pub valid_from: DateTime<Utc>,

    /// End of validity (exclusive); `None` = open-ended
    pub valid_to: Option<DateTime<Utc>>,

    /// Pence per day excluding VAT
    pub value_exc_vat: f64,

    /// Pence per day including VAT
    pub value_inc_vat: f64,
}

impl StandingCharge {
    /// Whether `timestamp` falls inside the `[valid_from, valid_to)` window
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.valid_from <= timestamp && self.valid_to.is_none_or(|to| timestamp < to)
    }
}

/// Conceptual lifecycle state of a period, recomputed at query time.
///
/// Never persisted: deriving it from `(period, query date, timeline)` on
/// every query removes staleness bugs by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Start date is in the future
    Pending,

    /// The query date falls within `[start, end or unbounded)`
    Active,

    /// End date has passed, or a later-starting period covers the date
    Superseded,
}

/// A single tariff assignment: one date range during which one commercial
/// product applied to one flow direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffPeriod {
    /// Unique period ID
    pub id: Uuid,

    /// First day the assignment applies (inclusive)
    pub start: NaiveDate,

    /// Last day the assignment applies (inclusive); `None` = open-ended
    pub end: Option<NaiveDate>,

    /// Opaque commercial product code (e.g. "AGILE-FLEX-22-11-25")
    pub product_code: String,

    /// Regional/metered tariff variant; `None` until resolved
    pub tariff_code: Option<String>,

    /// Human label, not semantically load-bearing
    pub display_name: String,

    /// Structure selecting the rate-resolution strategy
    pub tariff_type: TariffType,

    /// Timeline this period belongs to
    pub flow_direction: FlowDirection,

    /// Grid supply point group
    pub region: Region,

    /// Unit rates, empty until fetched
    #[serde(default)]
    pub rates: Vec<Rate>,

    /// Daily charges, empty until fetched; only meaningful for import
    #[serde(default)]
    pub standing_charges: Vec<StandingCharge>,

    /// Free-text notes
    #[serde(default)]
    pub notes: String,

    /// Timestamp of the last successful rate fetch
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl TariffPeriod {
    /// Create a period with validated bounds and no schedule yet
    pub fn new(
        start: NaiveDate,
        end: Option<NaiveDate>,
        product_code: impl Into<String>,
        display_name: impl Into<String>,
        tariff_type: TariffType,
        flow_direction: FlowDirection,
        region: Region,
    ) -> Result<Self> {
        if let Some(end) = end
            && end < start
        {
            return Err(FaradayError::invalid_period(format!(
                "end date {} precedes start date {}",
                end, start
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            start,
            end,
            product_code: product_code.into(),
            tariff_code: None,
            display_name: display_name.into(),
            tariff_type,
            flow_direction,
            region,
            rates: Vec::new(),
            standing_charges: Vec::new(),
            notes: String::new(),
            last_updated: None,
        })
    }

    /// Whether the period's `[start, end]` range covers `date`
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && self.end.is_none_or(|end| date <= end)
    }

    /// Whether the period is open-ended
    pub fn is_open_ended(&self) -> bool {
        self.end.is_none()
    }

    /// Period length in days, or `None` when open-ended
    pub fn duration_days(&self) -> Option<i64> {
        self.end
            .map(|end| (end - self.start).num_days() + 1)
    }

    /// Lifecycle state relative to `date`, ignoring timeline tie-breaks.
    ///
    /// The timeline refines this: an otherwise-active period loses to a
    /// later-starting one on overlap and reports as superseded there.
    pub fn status_on(&self, date: NaiveDate) -> PeriodStatus {
        if date < self.start {
            PeriodStatus::Pending
        } else if self.contains_date(date) {
            PeriodStatus::Active
        } else {
            PeriodStatus::Superseded
        }
    }
}

/// Raw caller input for registering a period, with string dates.
///
/// Parsing happens here so that unparseable dates are rejected eagerly at
/// the insertion boundary and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodDraft {
    /// ISO-8601 start date (required)
    pub start: String,

    /// ISO-8601 end date, absent for an open-ended assignment
    #[serde(default)]
    pub end: Option<String>,

    /// Commercial product code
    pub product_code: String,

    /// Human label
    pub display_name: String,

    /// Tariff structure
    pub tariff_type: TariffType,

    /// Flow direction
    pub flow_direction: FlowDirection,

    /// One-letter regional code
    pub region: Region,

    /// Free-text notes
    #[serde(default)]
    pub notes: String,
}

impl PeriodDraft {
    /// Parse and validate into a [`TariffPeriod`]
    pub fn into_period(self) -> Result<TariffPeriod> {
        let start = self
            .start
            .parse::<NaiveDate>()
            .map_err(|e| FaradayError::invalid_period(format!("bad start date '{}': {}", self.start, e)))?;
        let end = match &self.end {
            Some(raw) => Some(raw.parse::<NaiveDate>().map_err(|e| {
                FaradayError::invalid_period(format!("bad end date '{}': {}", raw, e))
            })?),
            None => None,
        };

        let mut period = TariffPeriod::new(
            start,
            end,
            self.product_code,
            self.display_name,
            self.tariff_type,
            self.flow_direction,
            self.region,
        )?;
        period.notes = self.notes;
        Ok(period)
    }
}
