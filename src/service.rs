//! Tariff service: the exposed timeline management API
//!
//! Coordinates the two timelines, the validator, the resolver and the
//! external rate fetch. Import and export timelines sit behind independent
//! locks and never need cross-locking; rate fetches run with no lock held
//! and apply their result in a single write-locked assignment, so a slow or
//! failing network call never blocks concurrent read queries.

use crate::config::Config;
use crate::error::{FaradayError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::model::{
    FlowDirection, PeriodDraft, PeriodStatus, Rate, StandingCharge, TariffPeriod, TariffType,
};
use crate::octopus::{FetchRequest, RateFetcher, build_tariff_code};
use crate::resolver::{self, ResolvedRate, ResolvedStandingCharge};
use crate::store::{TimelineDocument, TimelineStore};
use crate::timeline::Timeline;
use crate::validator::{ValidationReport, validate};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Product-code prefix marking hand-entered schedules that refresh must
/// never overwrite
const MANUAL_PRODUCT_PREFIX: &str = "MANUAL-";

/// Validation findings for both timelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Import timeline findings
    pub import: ValidationReport,

    /// Export timeline findings
    pub export: ValidationReport,
}

/// Digest of the configured timelines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineSummary {
    /// Number of import periods
    pub import_periods: usize,

    /// Number of export periods
    pub export_periods: usize,

    /// Display name of the current open-ended import period, if any
    pub import_active: Option<String>,

    /// Display name of the current open-ended export period, if any
    pub export_active: Option<String>,

    /// Validation findings for both timelines
    pub validation: ValidationSummary,
}

/// Outcome of a bulk rate refresh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshSummary {
    /// Periods whose schedules were replaced
    pub refreshed: usize,

    /// Periods skipped to preserve manual data
    pub skipped: usize,

    /// Periods whose fetch failed (existing schedules left untouched)
    pub failed: usize,
}

/// Fetch parameters copied out of a period under the read lock, so the
/// network call can run with no lock held
struct FetchPlan {
    request: FetchRequest,
    display_name: String,
}

/// The tariff timeline service
pub struct TariffService {
    import: RwLock<Timeline>,
    export: RwLock<Timeline>,
    fetcher: Arc<dyn RateFetcher>,
    store: Arc<dyn TimelineStore>,
    config: Config,
    logger: StructuredLogger,
}

impl TariffService {
    /// Create a service from persisted state
    pub fn new(
        config: Config,
        fetcher: Arc<dyn RateFetcher>,
        store: Arc<dyn TimelineStore>,
    ) -> Result<Self> {
        let document = store.load()?;
        let logger = get_logger("service");
        logger.info(&format!(
            "Tariff service initialized - import periods: {}, export periods: {}",
            document.import_timeline.len(),
            document.export_timeline.len()
        ));

        Ok(Self {
            import: RwLock::new(document.import_timeline),
            export: RwLock::new(document.export_timeline),
            fetcher,
            store,
            config,
            logger,
        })
    }

    fn timeline(&self, direction: FlowDirection) -> &RwLock<Timeline> {
        match direction {
            FlowDirection::Import => &self.import,
            FlowDirection::Export => &self.export,
        }
    }

    /// Register a new tariff assignment from raw caller input.
    ///
    /// The tariff code is derived from product and region; structural
    /// problems (unparseable dates, inverted bounds) are rejected here and
    /// never stored. Gaps and overlaps are allowed so back-filling works.
    pub async fn add_period(&self, draft: PeriodDraft) -> Result<Uuid> {
        let direction = draft.flow_direction;
        let mut period = draft.into_period()?;
        period.tariff_code = Some(build_tariff_code(
            &period.product_code,
            period.region,
            direction,
        ));
        let id = period.id;
        let name = period.display_name.clone();

        {
            let mut timeline = self.timeline(direction).write().await;
            timeline.add_period(period)?;
        }
        self.persist().await?;

        self.logger.info(&format!(
            "Added {} period '{}' ({})",
            direction, name, id
        ));
        Ok(id)
    }

    /// List all periods of one timeline, ordered by start date
    pub async fn list_periods(&self, direction: FlowDirection) -> Vec<TariffPeriod> {
        self.timeline(direction).read().await.periods().to_vec()
    }

    /// Fetch one period by ID
    pub async fn get_period(&self, direction: FlowDirection, id: Uuid) -> Result<TariffPeriod> {
        self.timeline(direction)
            .read()
            .await
            .period(id)
            .cloned()
            .ok_or_else(|| {
                FaradayError::not_found(format!("no {} period with id {}", direction, id))
            })
    }

    /// Delete a period from one timeline
    pub async fn delete_period(&self, direction: FlowDirection, id: Uuid) -> Result<()> {
        let removed = {
            let mut timeline = self.timeline(direction).write().await;
            timeline.remove_period(id)?
        };
        self.persist().await?;

        self.logger.info(&format!(
            "Deleted {} period '{}' ({})",
            direction, removed.display_name, id
        ));
        Ok(())
    }

    /// Run the validator on one timeline
    pub async fn validate(&self, direction: FlowDirection) -> ValidationReport {
        let timeline = self.timeline(direction).read().await;
        validate(&timeline)
    }

    /// Run the validator on both timelines
    pub async fn validate_all(&self) -> ValidationSummary {
        ValidationSummary {
            import: self.validate(FlowDirection::Import).await,
            export: self.validate(FlowDirection::Export).await,
        }
    }

    /// Resolve the unit rate in effect at `timestamp` for one direction
    pub async fn resolve_rate(
        &self,
        timestamp: DateTime<Utc>,
        direction: FlowDirection,
    ) -> Result<ResolvedRate> {
        let timeline = self.timeline(direction).read().await;
        resolver::resolve_rate(&timeline, timestamp, &self.config.economy7)
    }

    /// Resolve the daily standing charge at `timestamp` (import timeline)
    pub async fn resolve_standing_charge(
        &self,
        timestamp: DateTime<Utc>,
    ) -> Result<ResolvedStandingCharge> {
        let timeline = self.import.read().await;
        resolver::resolve_standing_charge(&timeline, timestamp)
    }

    /// Lifecycle state of a period on a given date
    pub async fn period_status(
        &self,
        direction: FlowDirection,
        id: Uuid,
        date: NaiveDate,
    ) -> Result<PeriodStatus> {
        self.timeline(direction).read().await.period_status(id, date)
    }

    /// Refresh one period's schedule from the supplier API.
    ///
    /// The fetch runs with no lock held; on success the new schedule
    /// replaces the old one in a single write-locked assignment. On failure
    /// the existing schedule is left untouched and the error is surfaced.
    pub async fn refresh_period(&self, direction: FlowDirection, id: Uuid) -> Result<()> {
        let plan = {
            let timeline = self.timeline(direction).read().await;
            let period = timeline.period(id).ok_or_else(|| {
                FaradayError::not_found(format!("no {} period with id {}", direction, id))
            })?;
            self.fetch_plan(period)?
        };

        if direction == FlowDirection::Export {
            // The supplier API serves no export tariff data; schedules are
            // entered manually and must survive a refresh.
            self.logger.warn(&format!(
                "Export tariffs are not available via the API - manual entry required for '{}'",
                plan.display_name
            ));
            return Ok(());
        }

        // Network I/O happens here, outside any timeline lock
        let rates = self.fetcher.fetch_rates(&plan.request).await?;
        let standing_charges = self
            .fetcher
            .fetch_standing_charges(&plan.request)
            .await?;

        let rate_count = rates.len();
        let charge_count = standing_charges.len();
        {
            let mut timeline = self.timeline(direction).write().await;
            timeline.set_schedule(id, rates, standing_charges)?;
        }
        self.persist().await?;

        self.logger.info(&format!(
            "Fetched {} rates and {} standing charges for '{}'",
            rate_count, charge_count, plan.display_name
        ));
        Ok(())
    }

    /// Refresh every period in both timelines, skipping manual schedules.
    ///
    /// Failures are logged and counted, never fatal: one broken product
    /// must not abort the rest of the sweep.
    pub async fn refresh_all(&self) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        for direction in [FlowDirection::Import, FlowDirection::Export] {
            let candidates: Vec<(Uuid, String, bool)> = {
                let timeline = self.timeline(direction).read().await;
                timeline
                    .periods()
                    .iter()
                    .map(|p| (p.id, p.display_name.clone(), Self::should_skip_refresh(p)))
                    .collect()
            };

            for (id, name, skip) in candidates {
                if skip {
                    self.logger
                        .info(&format!("Skipping refresh for '{}' (manual rates)", name));
                    summary.skipped += 1;
                    continue;
                }
                match self.refresh_period(direction, id).await {
                    Ok(()) => summary.refreshed += 1,
                    Err(e) => {
                        self.logger.error(&format!(
                            "Failed to refresh rates for {} period '{}': {}",
                            direction, name, e
                        ));
                        summary.failed += 1;
                    }
                }
            }
        }

        summary
    }

    /// Replace a period's schedule with manually entered data.
    ///
    /// Used for Economy 7 and export tariffs, which the supplier API does
    /// not serve; the replacement is a single atomic assignment.
    pub async fn set_manual_schedule(
        &self,
        direction: FlowDirection,
        id: Uuid,
        rates: Vec<Rate>,
        standing_charges: Vec<StandingCharge>,
    ) -> Result<()> {
        {
            let mut timeline = self.timeline(direction).write().await;
            timeline.set_schedule(id, rates, standing_charges)?;
        }
        self.persist().await?;

        self.logger
            .info(&format!("Stored manual schedule for {} period {}", direction, id));
        Ok(())
    }

    /// Digest of both timelines for operator display
    pub async fn summary(&self) -> TimelineSummary {
        let (import_periods, import_active) = {
            let timeline = self.import.read().await;
            (
                timeline.len(),
                timeline
                    .current_active_period()
                    .map(|p| p.display_name.clone()),
            )
        };
        let (export_periods, export_active) = {
            let timeline = self.export.read().await;
            (
                timeline.len(),
                timeline
                    .current_active_period()
                    .map(|p| p.display_name.clone()),
            )
        };

        TimelineSummary {
            import_periods,
            export_periods,
            import_active,
            export_active,
            validation: self.validate_all().await,
        }
    }

    /// Periods whose schedules were entered by hand keep them on refresh:
    /// Economy 7 and export data never come from the API, and `MANUAL-`
    /// product codes mark explicit operator entry.
    fn should_skip_refresh(period: &TariffPeriod) -> bool {
        period.tariff_type == TariffType::Economy7
            || period.flow_direction == FlowDirection::Export
            || period.product_code.starts_with(MANUAL_PRODUCT_PREFIX)
    }

    /// Build the fetch request for a period: full days in UTC, from the
    /// start date up to the day after the end date (or after today for an
    /// open-ended period)
    fn fetch_plan(&self, period: &TariffPeriod) -> Result<FetchPlan> {
        let tariff_code = period.tariff_code.clone().unwrap_or_else(|| {
            build_tariff_code(&period.product_code, period.region, period.flow_direction)
        });

        let fetch_end = period.end.unwrap_or_else(|| Utc::now().date_naive());
        let exclusive_end = fetch_end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| FaradayError::validation("end", "date out of range"))?;

        let period_from = period
            .start
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| FaradayError::validation("start", "invalid date"))?
            .and_utc();
        let period_to = exclusive_end
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| FaradayError::validation("end", "invalid date"))?
            .and_utc();

        Ok(FetchPlan {
            request: FetchRequest {
                product_code: period.product_code.clone(),
                tariff_code,
                tariff_type: period.tariff_type,
                flow_direction: period.flow_direction,
                period_from,
                period_to,
            },
            display_name: period.display_name.clone(),
        })
    }

    /// Write both timelines back through the store
    async fn persist(&self) -> Result<()> {
        let document = TimelineDocument {
            import_timeline: self.import.read().await.clone(),
            export_timeline: self.export.read().await.clone(),
        };
        self.store.save(&document)
    }
}
