mod support;

use std::time::Duration;

use serde_json::json;

use biomass_explorer::api::{AreaOfInterest, CheckedItem, Sensor};
use biomass_explorer::models::DateRange;
use biomass_explorer::remote::{Operation, RecordedCall, RemoteError};
use biomass_explorer::services::analysis::STATUS_NO_IMAGES;
use biomass_explorer::services::aoi::{ActiveAoi, AoiSource};
use biomass_explorer::services::{
    AnalysisInput, AnalysisOutcome, ExplorerError, PreconditionError, StatusKind,
};

use support::{analysis_result, d, ids, local_session, observation, FIELD_RING};

fn today() -> chrono::NaiveDate {
    d("2024-08-01")
}

fn input(name: &str, indices: &[&str]) -> AnalysisInput {
    AnalysisInput {
        field_name: name.to_string(),
        date_range: Some(DateRange::new(d("2024-05-01"), d("2024-05-31"))),
        indices: ids(indices),
    }
}

#[tokio::test]
async fn test_empty_timeseries_takes_no_data_path() {
    let (backend, session) = local_session();
    session.apply_pasted_coordinates(FIELD_RING).unwrap();
    backend.script_analysis(Ok(analysis_result(&[("NDVI", None)], vec![])));

    let report = session.run_analysis_on(input("North", &["NDVI"]), today()).await.unwrap();

    assert!(matches!(report.outcome, AnalysisOutcome::NoData { .. }));
    let status = session.status().current().unwrap();
    assert_eq!(status.kind, StatusKind::Info);
    assert_eq!(status.message, STATUS_NO_IMAGES);
}

#[tokio::test]
async fn test_all_null_summary_takes_no_data_path() {
    let (backend, session) = local_session();
    session.apply_pasted_coordinates(FIELD_RING).unwrap();
    backend.script_analysis(Ok(analysis_result(
        &[("NDVI", None), ("LST", None)],
        vec![
            observation("2024-05-02", Sensor::Sentinel2, &[("NDVI", None)]),
            observation("2024-05-04", Sensor::Landsat, &[("LST", None)]),
        ],
    )));

    let report = session
        .run_analysis_on(input("North", &["NDVI", "LST"]), today())
        .await
        .unwrap();

    assert!(matches!(report.outcome, AnalysisOutcome::NoData { .. }));
    // Nothing to remember when no data came back.
    assert!(session.saved_fields().is_empty());
}

#[tokio::test]
async fn test_partial_summary_takes_results_path() {
    let (backend, session) = local_session();
    session.apply_pasted_coordinates(FIELD_RING).unwrap();
    backend.script_analysis(Ok(analysis_result(
        &[("NDVI", Some(0.62)), ("LST", None)],
        vec![
            observation("2024-05-02", Sensor::Sentinel2, &[("NDVI", Some(0.6))]),
            observation("2024-05-07", Sensor::Sentinel2, &[("NDVI", Some(0.64))]),
        ],
    )));

    let report = session
        .run_analysis_on(input("North", &["NDVI", "LST"]), today())
        .await
        .unwrap();

    let AnalysisOutcome::Results(view) = report.outcome else {
        panic!("expected results");
    };
    assert_eq!(view.tiles.len(), 1);
    assert_eq!(view.tiles[0].index, "NDVI");
    assert_eq!(view.observation_count, 2);
    let warning = view.warning.expect("LST is missing");
    assert_eq!(warning.missing, 1);
    assert_eq!(warning.total, 2);

    let status = session.status().snapshot();
    let current = status.current.unwrap();
    assert_eq!(current.kind, StatusKind::Success);
    assert!(current.message.starts_with("Analysis complete: 2 cloud-free observations"));
    assert_eq!(status.progress, None);

    let saved = session.saved_fields();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].name, "North");
}

#[tokio::test]
async fn test_preconditions_stop_before_the_request() {
    let (backend, session) = local_session();

    let no_dates = AnalysisInput {
        date_range: None,
        ..input("North", &["NDVI"])
    };
    let err = session.run_analysis_on(no_dates, today()).await.unwrap_err();
    assert!(matches!(err, ExplorerError::Precondition(PreconditionError::MissingDateRange)));

    let err = session
        .run_analysis_on(input("North", &["NDVI"]), today())
        .await
        .unwrap_err();
    assert!(matches!(err, ExplorerError::Precondition(PreconditionError::MissingAoi)));

    session.apply_pasted_coordinates(FIELD_RING).unwrap();
    let err = session.run_analysis_on(input("North", &[]), today()).await.unwrap_err();
    assert!(matches!(err, ExplorerError::Precondition(PreconditionError::NoIndices)));

    let future = AnalysisInput {
        date_range: Some(DateRange::new(d("2024-07-20"), d("2024-08-20"))),
        ..input("North", &["NDVI"])
    };
    let err = session.run_analysis_on(future, today()).await.unwrap_err();
    assert!(matches!(err, ExplorerError::DateRange(_)));

    assert!(backend.calls().is_empty());
    assert_eq!(session.status().current().unwrap().kind, StatusKind::Warning);
}

#[tokio::test]
async fn test_malformed_aoi_stops_before_the_request() {
    let (backend, session) = local_session();
    let no_type = AreaOfInterest {
        geometry_type: String::new(),
        coordinates: json!([[[21.0, 52.0], [21.1, 52.0], [21.0, 52.0]]]),
    };
    for geometry in [AreaOfInterest::polygon(json!([])), no_type] {
        session
            .set_aoi(ActiveAoi::new(geometry, AoiSource::Pasted { vertex_count: 0 }, None))
            .unwrap();
        let err = session
            .run_analysis_on(input("North", &["NDVI"]), today())
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::Precondition(PreconditionError::InvalidAoi(_))));
    }

    assert!(backend.calls().is_empty());
    assert!(session.last_analysis().is_none());
    assert_eq!(session.status().current().unwrap().kind, StatusKind::Warning);
}

#[tokio::test]
async fn test_failed_request_keeps_previous_record() {
    let (backend, session) = local_session();
    session.apply_pasted_coordinates(FIELD_RING).unwrap();

    session.run_analysis_on(input("North", &["NDVI"]), today()).await.unwrap();
    let first = session.last_analysis().unwrap();

    backend.script_analysis(Err(RemoteError::status(
        Operation::Analyze,
        500,
        Some("Earth Engine quota exceeded".into()),
    )));
    let err = session
        .run_analysis_on(input("South", &["LST"]), today())
        .await
        .unwrap_err();
    assert!(matches!(err, ExplorerError::Remote(_)));

    let kept = session.last_analysis().unwrap();
    assert_eq!(kept.field_id, first.field_id);
    assert_eq!(kept.requested_indices, ids(&["NDVI"]));

    let status = session.status().snapshot();
    let current = status.current.unwrap();
    assert_eq!(current.kind, StatusKind::Error);
    assert_eq!(current.message, "Error: Earth Engine quota exceeded");
    assert_eq!(status.progress, None);
}

#[tokio::test]
async fn test_query_carries_form_and_config() {
    let (backend, session) = local_session();
    session.apply_pasted_coordinates(FIELD_RING).unwrap();

    let report = session
        .run_analysis_on(input("  ", &["NDVI", "LST"]), today())
        .await
        .unwrap();

    assert_eq!(report.field_id, "Field_1");
    let calls = backend.calls();
    let RecordedCall::Analyze(query) = &calls[0] else {
        panic!("expected an analysis call");
    };
    assert_eq!(query.field_id, "Field_1");
    assert_eq!(query.start_date, d("2024-05-01"));
    assert_eq!(query.end_date, d("2024-05-31"));
    assert_eq!(query.indices, ids(&["NDVI", "LST"]));
    assert_eq!(query.cloud_cover, 20);
    assert_eq!(query.geojson, session.aoi().unwrap().geometry);
}

#[tokio::test]
async fn test_long_range_warns_but_runs() {
    let (_backend, session) = local_session();
    session.apply_pasted_coordinates(FIELD_RING).unwrap();

    let long = AnalysisInput {
        date_range: Some(DateRange::new(d("2023-01-01"), d("2024-07-01"))),
        ..input("North", &["NDVI"])
    };
    let report = session.run_analysis_on(long, today()).await.unwrap();
    assert!(report.date_warning.is_some());
}

#[tokio::test]
async fn test_new_analysis_clears_overlays_and_sets_chart() {
    let (_backend, session) = local_session();
    session.apply_pasted_coordinates(FIELD_RING).unwrap();
    session.run_analysis_on(input("North", &["NDVI", "LST"]), today()).await.unwrap();

    session
        .load_overlays(vec![CheckedItem::new(d("2024-05-01"), Sensor::Sentinel2)], None)
        .await
        .unwrap();
    assert_eq!(session.overlays().len(), 2);

    session.run_analysis_on(input("North", &["NDVI"]), today()).await.unwrap();
    assert!(session.overlays().is_empty());

    let tabs = session.chart_tabs().unwrap();
    assert_eq!(tabs.len(), 2);
    let chart = session.chart("all").unwrap();
    assert_eq!(chart.datasets.len(), 1);
    assert!(!chart.labels.is_empty());
}

#[tokio::test]
async fn test_slow_analysis_superseded_by_newer_one() {
    let (backend, session) = local_session();
    session.apply_pasted_coordinates(FIELD_RING).unwrap();
    backend.script_analysis_delayed(
        Duration::from_millis(150),
        Ok(analysis_result(
            &[("NDVI", Some(0.5))],
            vec![observation("2024-05-02", Sensor::Sentinel2, &[("NDVI", Some(0.5))])],
        )),
    );

    let slow = session.run_analysis_on(input("Slow", &["NDVI"]), today());
    let fast = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        backend.script_analysis(Ok(analysis_result(
            &[("EVI", Some(0.4))],
            vec![observation("2024-05-03", Sensor::Sentinel2, &[("EVI", Some(0.4))])],
        )));
        session.run_analysis_on(input("Fast", &["EVI"]), today()).await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert!(matches!(slow, Err(ExplorerError::Superseded)));
    assert_eq!(fast.unwrap().field_id, "Fast");
    let record = session.last_analysis().unwrap();
    assert_eq!(record.field_id, "Fast");
    assert_eq!(record.requested_indices, ids(&["EVI"]));
}
