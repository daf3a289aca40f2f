//! Analysis orchestration.
//!
//! Builds the query from the form inputs, runs it against the backend and
//! decides between the "no data" and "results available" paths. The result is
//! always stored together with the indices that were requested for it.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

use super::aoi::require_valid;
use super::error::{ExplorerResult, PreconditionError};
use super::results::{build_view, is_empty_result, missing_data_warning, MissingDataWarning, ResultsView};
use super::status::{ProgressSink, StatusKind};
use crate::api::{AnalysisQuery, AnalysisResult, AreaOfInterest, IndexId};
use crate::models::{DateRange, DateRangeWarning};
use crate::remote::{ExplorerBackend, RemoteResult};

pub const STATUS_SEARCHING: &str = "Searching for cloud-free satellite images over your field...";
pub const STATUS_NO_IMAGES: &str =
    "No cloud-free images were found for this period. Try a wider date range.";

pub const PROGRESS_STARTED: u8 = 10;
pub const PROGRESS_REQUEST_SENT: u8 = 25;
pub const PROGRESS_RESPONSE_RECEIVED: u8 = 80;

/// Form state an analysis run starts from.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    /// Empty means "use the generated default name".
    pub field_name: String,
    pub date_range: Option<DateRange>,
    pub indices: Vec<IndexId>,
}

/// A response together with the request it answers.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    pub field_id: String,
    pub date_range: DateRange,
    pub requested_indices: Vec<IndexId>,
    pub result: AnalysisResult,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl AnalysisRecord {
    pub fn outcome(&self) -> AnalysisOutcome {
        classify(&self.result, &self.requested_indices)
    }
}

/// Which path the results panel takes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    NoData { warning: Option<MissingDataWarning> },
    Results(ResultsView),
}

/// What a finished run reports back to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub field_id: String,
    pub outcome: AnalysisOutcome,
    pub date_warning: Option<String>,
    pub elapsed_secs: f64,
}

/// Validate the inputs in the order the form checks them.
///
/// Returns the date range and any non-blocking warning about its length.
pub fn check_preconditions(
    input: &AnalysisInput,
    aoi: Option<&AreaOfInterest>,
    today: NaiveDate,
) -> ExplorerResult<(DateRange, Option<DateRangeWarning>)> {
    let range = input.date_range.ok_or(PreconditionError::MissingDateRange)?;
    require_valid(aoi)?;
    if input.indices.is_empty() {
        return Err(PreconditionError::NoIndices.into());
    }
    let warning = range.validate(today)?;
    Ok((range, warning))
}

pub fn build_query(
    field_id: &str,
    range: DateRange,
    indices: &[IndexId],
    aoi: &AreaOfInterest,
    cloud_cover: u8,
) -> AnalysisQuery {
    AnalysisQuery {
        field_id: field_id.to_string(),
        start_date: range.start,
        end_date: range.end,
        indices: indices.to_vec(),
        geojson: aoi.clone(),
        cloud_cover,
    }
}

/// "No data" when there are no observations or every requested index is null.
pub fn classify(result: &AnalysisResult, requested: &[IndexId]) -> AnalysisOutcome {
    if is_empty_result(result, requested) {
        AnalysisOutcome::NoData {
            warning: missing_data_warning(result, requested, 0, 0),
        }
    } else {
        AnalysisOutcome::Results(build_view(result, requested))
    }
}

/// Final status line for a stored outcome.
pub fn completion_status(outcome: &AnalysisOutcome, elapsed: Duration) -> (StatusKind, String) {
    match outcome {
        AnalysisOutcome::NoData { .. } => (StatusKind::Info, STATUS_NO_IMAGES.to_string()),
        AnalysisOutcome::Results(view) => (
            StatusKind::Success,
            format!(
                "Analysis complete: {} cloud-free observations found in {:.1}s.",
                view.observation_count,
                elapsed.as_secs_f64()
            ),
        ),
    }
}

/// Send the query and time the round trip.
pub async fn execute(
    backend: &dyn ExplorerBackend,
    query: &AnalysisQuery,
    sink: &dyn ProgressSink,
) -> RemoteResult<(AnalysisResult, Duration)> {
    sink.progress(PROGRESS_REQUEST_SENT);
    let started = Instant::now();
    debug!(
        "Analyzing '{}' {}..{} for {} indices",
        query.field_id,
        query.start_date,
        query.end_date,
        query.indices.len()
    );
    let result = backend.analyze(query).await;
    sink.progress(PROGRESS_RESPONSE_RECEIVED);
    let result = result?;
    let elapsed = started.elapsed();
    info!(
        "Analysis for '{}' returned {} observations in {:.1}s",
        query.field_id,
        result.timeseries.len(),
        elapsed.as_secs_f64()
    );
    Ok((result, elapsed))
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ObservationRecord, Sensor};
    use crate::services::error::ExplorerError;
    use crate::models::DateRangeError;
    use serde_json::json;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn aoi() -> AreaOfInterest {
        AreaOfInterest::polygon(json!([[[19.0, 50.0], [19.1, 50.0], [19.1, 50.1], [19.0, 50.0]]]))
    }

    fn input(range: Option<(&str, &str)>, indices: &[&str]) -> AnalysisInput {
        AnalysisInput {
            field_name: String::new(),
            date_range: range.map(|(s, e)| DateRange::new(d(s), d(e))),
            indices: indices.iter().map(|i| IndexId::from(*i)).collect(),
        }
    }

    #[test]
    fn test_precondition_order() {
        let today = d("2024-06-30");
        let area = aoi();
        let err = check_preconditions(&input(None, &[]), None, today).unwrap_err();
        assert!(matches!(err, ExplorerError::Precondition(PreconditionError::MissingDateRange)));

        let with_range = input(Some(("2024-05-01", "2024-05-31")), &[]);
        let err = check_preconditions(&with_range, None, today).unwrap_err();
        assert!(matches!(err, ExplorerError::Precondition(PreconditionError::MissingAoi)));

        let err = check_preconditions(&with_range, Some(&area), today).unwrap_err();
        assert!(matches!(err, ExplorerError::Precondition(PreconditionError::NoIndices)));

        let future = input(Some(("2024-05-01", "2024-07-31")), &["NDVI"]);
        let err = check_preconditions(&future, Some(&area), today).unwrap_err();
        assert!(matches!(err, ExplorerError::DateRange(DateRangeError::EndInFuture)));

        let ok = input(Some(("2024-05-01", "2024-05-31")), &["NDVI"]);
        let (range, warning) = check_preconditions(&ok, Some(&area), today).unwrap();
        assert_eq!(range.days(), 30);
        assert!(warning.is_none());
    }

    #[test]
    fn test_classify_routes_partial_result_to_results() {
        let requested: Vec<IndexId> = vec!["NDVI".into(), "LST".into()];
        let result = AnalysisResult {
            period_summary: [("NDVI".into(), Some(0.5)), ("LST".into(), None)].into_iter().collect(),
            timeseries: vec![ObservationRecord {
                date: d("2024-05-01"),
                sensor: Sensor::Sentinel2,
                values: Default::default(),
            }],
        };
        let outcome = classify(&result, &requested);
        let AnalysisOutcome::Results(view) = &outcome else {
            panic!("expected results, got {:?}", outcome);
        };
        assert_eq!(view.tiles.len(), 1);
        assert!(view.warning.is_some());

        let (kind, message) = completion_status(&outcome, Duration::from_millis(2340));
        assert_eq!(kind, StatusKind::Success);
        assert_eq!(message, "Analysis complete: 1 cloud-free observations found in 2.3s.");
    }

    #[test]
    fn test_classify_no_data() {
        let requested: Vec<IndexId> = vec!["NDVI".into()];
        let outcome = classify(&AnalysisResult::default(), &requested);
        assert!(matches!(outcome, AnalysisOutcome::NoData { .. }));
        let (kind, message) = completion_status(&outcome, Duration::ZERO);
        assert_eq!(kind, StatusKind::Info);
        assert_eq!(message, STATUS_NO_IMAGES);
    }

    #[test]
    fn test_build_query_uses_cloud_cover() {
        let range = DateRange::new(d("2024-05-01"), d("2024-05-31"));
        let query = build_query("Field_1", range, &["NDVI".into()], &aoi(), 35);
        assert_eq!(query.cloud_cover, 35);
        assert_eq!(query.start_date, d("2024-05-01"));
        assert_eq!(query.field_id, "Field_1");
    }
}
