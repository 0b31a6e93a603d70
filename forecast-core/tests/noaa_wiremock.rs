//! NOAA client behaviour against a mock api.weather.gov.

use chrono::{Duration, Utc};
use forecast_core::{
    Coordinate, ForecastError, NoaaClient, NoaaConfig, TimeLimited, WeatherService,
    upcoming_periods,
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn period(start_in_hours: i64, temperature: i64) -> Value {
    let start = Utc::now() + Duration::hours(start_in_hours);
    let end = start + Duration::hours(1);

    json!({
        "number": 1,
        "name": "",
        "startTime": start.to_rfc3339(),
        "endTime": end.to_rfc3339(),
        "isDaytime": true,
        "temperature": temperature,
        "temperatureUnit": "F",
        "temperatureTrend": "",
        "probabilityOfPrecipitation": { "unitCode": "wmoUnit:percent", "value": 3 },
        "dewpoint": { "unitCode": "wmoUnit:degC", "value": 11.11111111111111 },
        "relativeHumidity": { "unitCode": "wmoUnit:percent", "value": 58 },
        "windSpeed": "8 mph",
        "windDirection": "S",
        "icon": "/icons/land/day/sct?size=small",
        "shortForecast": "Partly Cloudy",
        "detailedForecast": ""
    })
}

fn client(server: &MockServer) -> NoaaClient {
    NoaaClient::new(NoaaConfig {
        base_url: server.uri(),
        user_agent: "forecast-tests/0.1 test@example.com".into(),
        timeout_secs: 5,
    })
    .expect("client builds")
}

fn coordinate() -> Coordinate {
    Coordinate::new(40.7128, -74.006).unwrap()
}

async fn mount_points(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/points/40.7128,-74.006"))
        .and(header("user-agent", "forecast-tests/0.1 test@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": {
                "forecastHourly": format!("{}/gridpoints/OKX/33,35/forecast/hourly", server.uri())
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn follows_points_to_hourly_periods() {
    let server = MockServer::start().await;
    mount_points(&server).await;

    Mock::given(method("GET"))
        .and(path("/gridpoints/OKX/33,35/forecast/hourly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": { "periods": [period(1, 60), period(2, 61)] }
        })))
        .mount(&server)
        .await;

    let periods = client(&server).fetch_hourly_periods(coordinate()).await.unwrap();
    assert_eq!(periods.len(), 2);
    assert_eq!(periods[0]["temperature"], 60);
}

#[tokio::test]
async fn upcoming_periods_filters_and_sorts_live_response() {
    let server = MockServer::start().await;
    mount_points(&server).await;

    Mock::given(method("GET"))
        .and(path("/gridpoints/OKX/33,35/forecast/hourly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": { "periods": [period(3, 63), period(-2, 40), period(1, 61), period(2, 62)] }
        })))
        .mount(&server)
        .await;

    let periods = upcoming_periods(&client(&server), coordinate(), 2).await.unwrap();

    let temps: Vec<i64> = periods.iter().map(|p| p.temperature).collect();
    assert_eq!(temps, vec![61, 62]);
    assert_eq!(periods[0].icon.as_str(), "https://api.weather.gov/icons/land/day/sct");
}

#[tokio::test]
async fn upstream_error_status_is_a_fetch_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/points/40.7128,-74.006"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Unexpected Problem"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_hourly_periods(coordinate()).await.unwrap_err();
    match err {
        ForecastError::FetchFailure(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("Unexpected Problem"));
        }
        other => panic!("expected FetchFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_upstream_hits_the_caller_deadline() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/points/40.7128,-74.006"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "properties": {} }))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let service = TimeLimited::new(client(&server), std::time::Duration::from_millis(100));
    let err = service.fetch_hourly_periods(coordinate()).await.unwrap_err();
    assert!(matches!(err, ForecastError::FetchFailure(ref m) if m.contains("within")));
}

#[tokio::test]
async fn missing_hourly_url_is_a_fetch_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/points/40.7128,-74.006"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "properties": {} })))
        .mount(&server)
        .await;

    let err = client(&server).fetch_hourly_periods(coordinate()).await.unwrap_err();
    assert!(matches!(err, ForecastError::FetchFailure(ref m) if m.contains("forecastHourly")));
}

#[tokio::test]
async fn malformed_period_fails_the_whole_fetch() {
    let server = MockServer::start().await;
    mount_points(&server).await;

    let mut bad = period(2, 50);
    bad["relativeHumidity"]["unitCode"] = "wmoUnit:furlongs".into();

    Mock::given(method("GET"))
        .and(path("/gridpoints/OKX/33,35/forecast/hourly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": { "periods": [period(1, 60), bad] }
        })))
        .mount(&server)
        .await;

    let err = upcoming_periods(&client(&server), coordinate(), 4).await.unwrap_err();
    assert!(matches!(err, ForecastError::UnrecognizedUnit(ref u) if u == "wmoUnit:furlongs"));
}
