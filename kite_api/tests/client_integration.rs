use chrono::NaiveDate;
use kite_api::types::Interval;
use kite_api::{Client, Credentials, Error, HistoricalQuery};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn client_for(server: &MockServer) -> Client {
    Client::with_base_url(&server.uri(), Credentials::new("test-key", "test-token")).unwrap()
}

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, day).unwrap()
}

#[tokio::test]
async fn get_historical_success() {
    let mock_server = MockServer::start().await;
    let body = load_fixture("historical_minute.json");

    Mock::given(method("GET"))
        .and(path("/instruments/historical/738561/minute"))
        .and(query_param("from", "2023-01-02 00:00:00"))
        .and(query_param("to", "2023-01-02 23:59:59"))
        .and(header("X-Kite-Version", "3"))
        .and(header("Authorization", "token test-key:test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(&body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let candles = client
        .get_historical(738561, Interval::Minute, &HistoricalQuery::for_dates(jan(2), jan(2)))
        .await
        .unwrap();
    assert_eq!(candles.len(), 3);
    assert_eq!(candles[2].close, 2577.1);
}

#[tokio::test]
async fn get_historical_hour_alias_uses_sixty_minute_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/instruments/historical/408065/60minute"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("historical_empty.json")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let interval: Interval = "hour".parse().unwrap();
    let candles = client
        .get_historical(408065, interval, &HistoricalQuery::for_dates(jan(2), jan(3)))
        .await
        .unwrap();
    assert!(candles.is_empty());
}

#[tokio::test]
async fn get_historical_token_exception() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/instruments/historical/738561/day"))
        .respond_with(ResponseTemplate::new(403).set_body_string(load_fixture("token_exception.json")))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .get_historical(738561, Interval::Day, &HistoricalQuery::for_dates(jan(1), jan(31)))
        .await
        .unwrap_err();
    assert!(err.is_auth_failure());
    match err {
        Error::Api {
            status, error_type, ..
        } => {
            assert_eq!(status, 403);
            assert_eq!(error_type, "TokenException");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn get_historical_input_exception_is_not_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/instruments/historical/738561/minute"))
        .respond_with(ResponseTemplate::new(400).set_body_string(load_fixture("input_exception.json")))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .get_historical(738561, Interval::Minute, &HistoricalQuery::for_dates(jan(1), jan(31)))
        .await
        .unwrap_err();
    assert!(!err.is_retryable());
    assert!(!err.is_auth_failure());
    assert!(err.to_string().contains("InputException"));
}

#[tokio::test]
async fn get_historical_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .get_historical(738561, Interval::Minute, &HistoricalQuery::for_dates(jan(1), jan(2)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RateLimited));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn get_historical_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .get_historical(738561, Interval::Day, &HistoricalQuery::for_dates(jan(1), jan(2)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn get_historical_malformed_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not valid json}"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .get_historical(738561, Interval::Day, &HistoricalQuery::for_dates(jan(1), jan(2)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[tokio::test]
async fn get_historical_success_status_without_data() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"success"}"#))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .get_historical(738561, Interval::Day, &HistoricalQuery::for_dates(jan(1), jan(2)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}
