use async_trait::async_trait;
use chrono::{DateTime, Utc};
use faraday::config::Config;
use faraday::error::{FaradayError, Result};
use faraday::model::{
    FlowDirection, PeriodDraft, PeriodStatus, Rate, RateType, Region, StandingCharge, TariffType,
};
use faraday::octopus::{FetchRequest, RateFetcher};
use faraday::service::TariffService;
use faraday::store::JsonFileStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Canned fetcher standing in for the supplier API
struct MockFetcher {
    rates: Vec<Rate>,
    charges: Vec<StandingCharge>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockFetcher {
    fn with_rates(rates: Vec<Rate>) -> Self {
        Self {
            rates,
            charges: Vec::new(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            rates: Vec::new(),
            charges: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RateFetcher for MockFetcher {
    async fn fetch_rates(&self, _request: &FetchRequest) -> Result<Vec<Rate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FaradayError::fetch("connection refused"));
        }
        Ok(self.rates.clone())
    }

    async fn fetch_standing_charges(&self, _request: &FetchRequest) -> Result<Vec<StandingCharge>> {
        if self.fail {
            return Err(FaradayError::fetch("connection refused"));
        }
        Ok(self.charges.clone())
    }
}

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn standard_rate(from: &str, value: f64) -> Rate {
    Rate {
        valid_from: ts(from),
        valid_to: None,
        value_exc_vat: value / 1.05,
        value_inc_vat: value,
        rate_type: RateType::Standard,
    }
}

fn draft(
    start: &str,
    end: Option<&str>,
    name: &str,
    tariff_type: TariffType,
    direction: FlowDirection,
) -> PeriodDraft {
    PeriodDraft {
        start: start.to_string(),
        end: end.map(str::to_string),
        product_code: "VAR-22-11-01".to_string(),
        display_name: name.to_string(),
        tariff_type,
        flow_direction: direction,
        region: Region::C,
        notes: String::new(),
    }
}

fn service_with(fetcher: MockFetcher, dir: &tempfile::TempDir) -> TariffService {
    let store = Arc::new(JsonFileStore::new(
        dir.path().join("timelines.json").to_str().unwrap(),
    ));
    TariffService::new(Config::default(), Arc::new(fetcher), store).unwrap()
}

#[tokio::test]
async fn add_list_delete_period() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(MockFetcher::with_rates(vec![]), &dir);

    let id = service
        .add_period(draft(
            "2023-01-01",
            None,
            "Flexible",
            TariffType::Variable,
            FlowDirection::Import,
        ))
        .await
        .unwrap();

    let periods = service.list_periods(FlowDirection::Import).await;
    assert_eq!(periods.len(), 1);
    // Tariff code derived from product and region
    assert_eq!(
        periods[0].tariff_code.as_deref(),
        Some("E-1R-VAR-22-11-01-C")
    );
    assert!(service.list_periods(FlowDirection::Export).await.is_empty());

    service.delete_period(FlowDirection::Import, id).await.unwrap();
    assert!(service.list_periods(FlowDirection::Import).await.is_empty());

    let err = service
        .delete_period(FlowDirection::Import, id)
        .await
        .unwrap_err();
    assert!(matches!(err, FaradayError::NotFound { .. }));
}

#[tokio::test]
async fn add_period_rejects_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(MockFetcher::with_rates(vec![]), &dir);

    let err = service
        .add_period(draft(
            "not-a-date",
            None,
            "Broken",
            TariffType::Variable,
            FlowDirection::Import,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, FaradayError::InvalidPeriod { .. }));

    let err = service
        .add_period(draft(
            "2023-06-30",
            Some("2023-01-01"),
            "Inverted",
            TariffType::Variable,
            FlowDirection::Import,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, FaradayError::InvalidPeriod { .. }));

    // Nothing was stored
    assert!(service.list_periods(FlowDirection::Import).await.is_empty());
}

#[tokio::test]
async fn refresh_applies_fetched_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::with_rates(vec![standard_rate("2023-01-01T00:00:00Z", 28.0)]);
    let service = service_with(fetcher, &dir);

    let id = service
        .add_period(draft(
            "2023-01-01",
            None,
            "Flexible",
            TariffType::Variable,
            FlowDirection::Import,
        ))
        .await
        .unwrap();

    // Before the fetch the schedule is empty: active period, no rates
    let err = service
        .resolve_rate(ts("2023-03-01T12:00:00Z"), FlowDirection::Import)
        .await
        .unwrap_err();
    assert!(matches!(err, FaradayError::RateNotFound { .. }));

    service.refresh_period(FlowDirection::Import, id).await.unwrap();

    let resolved = service
        .resolve_rate(ts("2023-03-01T12:00:00Z"), FlowDirection::Import)
        .await
        .unwrap();
    assert_eq!(resolved.value_inc_vat, 28.0);
    assert!(!resolved.is_export);

    let period = service.get_period(FlowDirection::Import, id).await.unwrap();
    assert!(period.last_updated.is_some());
}

#[tokio::test]
async fn failed_fetch_leaves_schedule_untouched() {
    let dir = tempfile::tempdir().unwrap();

    // First service seeds a schedule through a working fetcher
    let id = {
        let fetcher = MockFetcher::with_rates(vec![standard_rate("2023-01-01T00:00:00Z", 28.0)]);
        let service = service_with(fetcher, &dir);
        let id = service
            .add_period(draft(
                "2023-01-01",
                None,
                "Flexible",
                TariffType::Variable,
                FlowDirection::Import,
            ))
            .await
            .unwrap();
        service.refresh_period(FlowDirection::Import, id).await.unwrap();
        id
    };

    // Second service sees the persisted schedule and a broken network
    let service = service_with(MockFetcher::failing(), &dir);
    let err = service
        .refresh_period(FlowDirection::Import, id)
        .await
        .unwrap_err();
    assert!(matches!(err, FaradayError::Fetch { .. }));

    // Previously fetched data still resolves
    let resolved = service
        .resolve_rate(ts("2023-03-01T12:00:00Z"), FlowDirection::Import)
        .await
        .unwrap();
    assert_eq!(resolved.value_inc_vat, 28.0);
}

#[tokio::test]
async fn refresh_all_skips_manual_schedules() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::with_rates(vec![standard_rate("2023-01-01T00:00:00Z", 28.0)]);
    let service = service_with(fetcher, &dir);

    service
        .add_period(draft(
            "2023-01-01",
            None,
            "Flexible import",
            TariffType::Variable,
            FlowDirection::Import,
        ))
        .await
        .unwrap();
    service
        .add_period(draft(
            "2023-01-01",
            None,
            "Economy 7",
            TariffType::Economy7,
            FlowDirection::Import,
        ))
        .await
        .unwrap();
    service
        .add_period(draft(
            "2023-01-01",
            None,
            "Outgoing",
            TariffType::Fixed,
            FlowDirection::Export,
        ))
        .await
        .unwrap();
    let mut manual = draft(
        "2023-01-01",
        None,
        "Hand-entered",
        TariffType::Variable,
        FlowDirection::Import,
    );
    manual.product_code = "MANUAL-LEGACY".to_string();
    service.add_period(manual).await.unwrap();

    let summary = service.refresh_all().await;
    assert_eq!(summary.refreshed, 1);
    assert_eq!(summary.skipped, 3);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn refresh_all_counts_failures_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(MockFetcher::failing(), &dir);

    service
        .add_period(draft(
            "2023-01-01",
            Some("2023-06-30"),
            "First",
            TariffType::Variable,
            FlowDirection::Import,
        ))
        .await
        .unwrap();
    service
        .add_period(draft(
            "2023-07-01",
            None,
            "Second",
            TariffType::Agile,
            FlowDirection::Import,
        ))
        .await
        .unwrap();

    let summary = service.refresh_all().await;
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.refreshed, 0);
}

#[tokio::test]
async fn manual_schedule_for_export_period() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(MockFetcher::with_rates(vec![]), &dir);

    let id = service
        .add_period(draft(
            "2023-01-01",
            None,
            "Outgoing fixed",
            TariffType::Fixed,
            FlowDirection::Export,
        ))
        .await
        .unwrap();

    // No VAT applies to export sales, so both values match
    service
        .set_manual_schedule(
            FlowDirection::Export,
            id,
            vec![Rate {
                valid_from: ts("2023-01-01T00:00:00Z"),
                valid_to: None,
                value_exc_vat: 15.0,
                value_inc_vat: 15.0,
                rate_type: RateType::Standard,
            }],
            Vec::new(),
        )
        .await
        .unwrap();

    let resolved = service
        .resolve_rate(ts("2023-05-01T12:00:00Z"), FlowDirection::Export)
        .await
        .unwrap();
    assert_eq!(resolved.value_inc_vat, 15.0);
    assert!(resolved.is_export);

    // A refresh sweep must not clobber the manual schedule
    let summary = service.refresh_all().await;
    assert_eq!(summary.skipped, 1);
    let resolved = service
        .resolve_rate(ts("2023-05-01T12:00:00Z"), FlowDirection::Export)
        .await
        .unwrap();
    assert_eq!(resolved.value_inc_vat, 15.0);
}

#[tokio::test]
async fn standing_charge_resolution_through_service() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(MockFetcher::with_rates(vec![]), &dir);

    let id = service
        .add_period(draft(
            "2023-01-01",
            None,
            "Flexible",
            TariffType::Variable,
            FlowDirection::Import,
        ))
        .await
        .unwrap();

    service
        .set_manual_schedule(
            FlowDirection::Import,
            id,
            vec![standard_rate("2023-01-01T00:00:00Z", 28.0)],
            vec![StandingCharge {
                valid_from: ts("2023-01-01T00:00:00Z"),
                valid_to: None,
                value_exc_vat: 45.0,
                value_inc_vat: 47.25,
            }],
        )
        .await
        .unwrap();

    let charge = service
        .resolve_standing_charge(ts("2023-03-01T12:00:00Z"))
        .await
        .unwrap();
    assert_eq!(charge.value_inc_vat, 47.25);
}

#[tokio::test]
async fn overlap_resolution_prefers_latest_start() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(MockFetcher::with_rates(vec![]), &dir);

    let old_id = service
        .add_period(draft(
            "2023-01-01",
            Some("2023-12-31"),
            "Period1",
            TariffType::Variable,
            FlowDirection::Import,
        ))
        .await
        .unwrap();
    let new_id = service
        .add_period(draft(
            "2023-06-01",
            None,
            "Period2",
            TariffType::Variable,
            FlowDirection::Import,
        ))
        .await
        .unwrap();

    service
        .set_manual_schedule(
            FlowDirection::Import,
            old_id,
            vec![standard_rate("2023-01-01T00:00:00Z", 20.0)],
            Vec::new(),
        )
        .await
        .unwrap();
    service
        .set_manual_schedule(
            FlowDirection::Import,
            new_id,
            vec![standard_rate("2023-06-01T00:00:00Z", 30.0)],
            Vec::new(),
        )
        .await
        .unwrap();

    // Scenario B: inside the overlap the later-starting period wins
    let resolved = service
        .resolve_rate(ts("2023-08-01T12:00:00Z"), FlowDirection::Import)
        .await
        .unwrap();
    assert_eq!(resolved.value_inc_vat, 30.0);

    // The overlap is still reported by the validator
    let report = service.validate(FlowDirection::Import).await;
    assert_eq!(report.overlaps.len(), 1);
    assert_eq!(report.overlaps[0].first, old_id);
    assert_eq!(report.overlaps[0].second, new_id);

    // Status machine agrees: the losing period reports superseded
    let status = service
        .period_status(FlowDirection::Import, old_id, "2023-08-01".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(status, PeriodStatus::Superseded);
}

#[tokio::test]
async fn summary_reflects_both_timelines() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(MockFetcher::with_rates(vec![]), &dir);

    service
        .add_period(draft(
            "2023-01-01",
            Some("2023-06-30"),
            "Old import",
            TariffType::Fixed,
            FlowDirection::Import,
        ))
        .await
        .unwrap();
    service
        .add_period(draft(
            "2023-07-02",
            None,
            "Current import",
            TariffType::Agile,
            FlowDirection::Import,
        ))
        .await
        .unwrap();

    let summary = service.summary().await;
    assert_eq!(summary.import_periods, 2);
    assert_eq!(summary.export_periods, 0);
    assert_eq!(summary.import_active.as_deref(), Some("Current import"));
    assert!(summary.export_active.is_none());
    // The one-day hole between 2023-06-30 and 2023-07-02 shows up
    assert_eq!(summary.validation.import.gaps.len(), 1);
    assert!(summary.validation.export.is_clean());
}
