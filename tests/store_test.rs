use chrono::NaiveDate;
use faraday::model::{FlowDirection, Rate, RateType, Region, TariffPeriod, TariffType};
use faraday::store::{JsonFileStore, TimelineDocument, TimelineStore};
use faraday::validator::validate;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn period(start: &str, end: Option<&str>, direction: FlowDirection) -> TariffPeriod {
    TariffPeriod::new(
        date(start),
        end.map(date),
        "VAR-22-11-01",
        "Flexible",
        TariffType::Variable,
        direction,
        Region::H,
    )
    .unwrap()
}

#[test]
fn document_round_trip_preserves_schedules() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timelines.json");
    let store = JsonFileStore::new(path.to_str().unwrap());

    let mut document = TimelineDocument::default();
    let mut import = period("2023-01-01", Some("2023-06-30"), FlowDirection::Import);
    import.rates.push(Rate {
        valid_from: "2023-01-01T00:00:00Z".parse().unwrap(),
        valid_to: None,
        value_exc_vat: 26.67,
        value_inc_vat: 28.0,
        rate_type: RateType::Standard,
    });
    document.import_timeline.add_period(import).unwrap();
    document
        .export_timeline
        .add_period(period("2023-01-01", None, FlowDirection::Export))
        .unwrap();

    store.save(&document).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded.import_timeline.len(), 1);
    assert_eq!(loaded.export_timeline.len(), 1);
    let restored = &loaded.import_timeline.periods()[0];
    assert_eq!(restored.rates.len(), 1);
    assert_eq!(restored.rates[0].value_inc_vat, 28.0);
    assert_eq!(restored.rates[0].rate_type, RateType::Standard);
}

#[test]
fn round_trip_preserves_validation_findings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timelines.json");
    let store = JsonFileStore::new(path.to_str().unwrap());

    let mut document = TimelineDocument::default();
    document
        .import_timeline
        .add_period(period("2023-01-01", Some("2023-03-31"), FlowDirection::Import))
        .unwrap();
    document
        .import_timeline
        .add_period(period("2023-05-01", None, FlowDirection::Import))
        .unwrap();
    let before = validate(&document.import_timeline);
    assert_eq!(before.gaps.len(), 1);

    store.save(&document).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(validate(&loaded.import_timeline), before);
}

#[test]
fn corrupt_document_surfaces_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timelines.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = JsonFileStore::new(path.to_str().unwrap());
    let err = store.load().unwrap_err();
    assert!(err.to_string().contains("Serialization error"));
}
