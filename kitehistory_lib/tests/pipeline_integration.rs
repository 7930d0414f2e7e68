use std::sync::Arc;

use chrono::NaiveDate;
use kitehistory_lib::kite_api::{Client, Credentials};
use kitehistory_lib::{
    ChunkFetchError, FetchLimits, FetcherConfig, HistoryError, HistoryService, Instruments,
    Interval, KiteSource,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RELIANCE: &str = "/instruments/historical/738561/minute";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn service_for(server: &MockServer) -> HistoryService<KiteSource> {
    let client =
        Client::with_base_url(&server.uri(), Credentials::new("test-key", "test-token")).unwrap();
    let source = KiteSource::new(client, Arc::new(Instruments::nifty50().unwrap()));
    HistoryService::new(
        Arc::new(FetchLimits::embedded().unwrap()),
        source,
        FetcherConfig::immediate(),
    )
}

fn candles(rows: &[(&str, f64)]) -> serde_json::Value {
    let candles: Vec<serde_json::Value> = rows
        .iter()
        .map(|(ts, close)| json!([ts, close, close + 1.0, close - 1.0, close, 1000]))
        .collect();
    json!({ "status": "success", "data": { "candles": candles } })
}

async fn mount_chunk(server: &MockServer, from: &str, to: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(RELIANCE))
        .and(query_param("from", from))
        .and(query_param("to", to))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn two_chunks_merge_and_drop_boundary_duplicate() {
    let server = MockServer::start().await;
    mount_chunk(
        &server,
        "2023-01-01 00:00:00",
        "2023-03-02 23:59:59",
        ResponseTemplate::new(200).set_body_json(candles(&[
            ("2023-01-02T09:15:00+0530", 2500.0),
            ("2023-03-02T09:15:00+0530", 2400.0),
        ])),
    )
    .await;
    mount_chunk(
        &server,
        "2023-03-02 00:00:00",
        "2023-04-01 23:59:59",
        ResponseTemplate::new(200).set_body_json(candles(&[
            ("2023-03-02T09:15:00+0530", 2400.0),
            ("2023-03-31T15:29:00+0530", 2350.0),
        ])),
    )
    .await;

    let result = service_for(&server)
        .fetch_historical("reliance", date(2023, 1, 1), date(2023, 4, 1), Interval::Minute)
        .await
        .unwrap();

    assert_eq!(result.records.len(), 3);
    assert!(result.failures.is_empty());
    assert!(result.conflicts.is_empty());
    assert_eq!(result.records[0].close, 2500.0);
    assert_eq!(result.records[2].close, 2350.0);
}

#[tokio::test]
async fn failed_chunk_yields_partial_result() {
    let server = MockServer::start().await;
    mount_chunk(
        &server,
        "2023-01-01 00:00:00",
        "2023-03-02 23:59:59",
        ResponseTemplate::new(200).set_body_json(candles(&[
            ("2023-01-02T09:15:00+0530", 2500.0),
            ("2023-01-02T09:16:00+0530", 2501.0),
        ])),
    )
    .await;
    mount_chunk(
        &server,
        "2023-03-02 00:00:00",
        "2023-04-01 23:59:59",
        ResponseTemplate::new(500).set_body_string("upstream timeout"),
    )
    .await;

    let result = service_for(&server)
        .fetch_historical("RELIANCE", date(2023, 1, 1), date(2023, 4, 1), Interval::Minute)
        .await
        .unwrap();

    assert_eq!(result.records.len(), 2);
    assert!(result.is_partial());
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].chunk.index, 1);
    assert!(result.failures[0].reason.contains("500"));
}

#[tokio::test]
async fn boundary_conflict_keeps_earlier_chunk() {
    let server = MockServer::start().await;
    mount_chunk(
        &server,
        "2023-01-01 00:00:00",
        "2023-03-02 23:59:59",
        ResponseTemplate::new(200)
            .set_body_json(candles(&[("2023-03-02T09:15:00+0530", 2400.0)])),
    )
    .await;
    mount_chunk(
        &server,
        "2023-03-02 00:00:00",
        "2023-04-01 23:59:59",
        ResponseTemplate::new(200)
            .set_body_json(candles(&[("2023-03-02T09:15:00+0530", 2405.0)])),
    )
    .await;

    let result = service_for(&server)
        .fetch_historical("RELIANCE", date(2023, 1, 1), date(2023, 4, 1), Interval::Minute)
        .await
        .unwrap();

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].close, 2400.0);
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].kept_chunk, 0);
    assert_eq!(result.conflicts[0].dropped_chunk, 1);
}

#[tokio::test]
async fn token_exception_stops_after_first_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RELIANCE))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "status": "error",
            "message": "Incorrect `api_key` or `access_token`.",
            "error_type": "TokenException"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = service_for(&server)
        .fetch_historical("RELIANCE", date(2023, 1, 1), date(2023, 12, 31), Interval::Minute)
        .await
        .unwrap_err();

    match err {
        HistoryError::AggregateFetch { reason, failures } => {
            assert!(reason.contains("TokenException") || reason.contains("access_token"));
            assert!(matches!(failures[0].error, ChunkFetchError::Unauthorized(_)));
            assert!(failures[1..]
                .iter()
                .all(|f| matches!(f.error, ChunkFetchError::Skipped(_))));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_symbol_makes_no_http_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = service_for(&server)
        .fetch_historical("AAPL", date(2023, 1, 1), date(2023, 4, 1), Interval::Minute)
        .await
        .unwrap_err();
    assert!(matches!(err, HistoryError::AggregateFetch { .. }));
}

#[tokio::test]
async fn six_years_of_minute_data_makes_no_http_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = service_for(&server)
        .fetch_historical("RELIANCE", date(2018, 1, 1), date(2024, 1, 1), Interval::Minute)
        .await
        .unwrap_err();
    assert!(matches!(err, HistoryError::RangeTooLarge { span_days: 2191, .. }));
}
