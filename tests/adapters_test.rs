mod common;

use common::fast_config;
use httpmock::prelude::*;
use nlrb_scrape::domain::ports::{BrowserLauncher, BrowserSession, HttpFetch};
use nlrb_scrape::{PortalError, ReqwestFetcher, WebDriverLauncher};
use serde_json::json;
use std::time::Duration;
use url::Url;

#[tokio::test]
async fn test_fetcher_maps_status_codes() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/case/05-CA-000001");
            then.status(404).body("<h1>Page not found</h1>");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/broken");
            then.status(500);
        })
        .await;

    let fetcher = ReqwestFetcher::new(&fast_config(&server.base_url())).unwrap();

    let err = fetcher
        .get_text(&Url::parse(&server.url("/case/05-CA-000001")).unwrap(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::NotFound { .. }));

    let err = fetcher
        .get_bytes(&Url::parse(&server.url("/broken")).unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), Some(500));
}

#[tokio::test]
async fn test_fetcher_sends_query_and_reads_json() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/sort-case-decision-docket/05-CA-1/ds_activity_date/desc")
                .query_param("page", "2")
                .query_param("_wrapper_format", "drupal_ajax");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!([{"command": "settings"}]));
        })
        .await;

    let fetcher = ReqwestFetcher::new(&fast_config(&server.base_url())).unwrap();
    let url = Url::parse(&server.url("/sort-case-decision-docket/05-CA-1/ds_activity_date/desc")).unwrap();
    let query = vec![
        ("page".to_string(), "2".to_string()),
        ("_wrapper_format".to_string(), "drupal_ajax".to_string()),
    ];

    let value = fetcher.get_json(&url, &query).await.unwrap();

    mock.assert_async().await;
    assert_eq!(value[0]["command"], "settings");
}

#[tokio::test]
async fn test_webdriver_session_round_trip() {
    let server = MockServer::start_async().await;

    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/session");
            then.status(200)
                .json_body(json!({"value": {"sessionId": "s1", "capabilities": {}}}));
        })
        .await;
    let navigate = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/session/s1/url")
                .json_body(json!({"url": "https://www.nlrb.gov/search/case"}));
            then.status(200).json_body(json!({"value": null}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/session/s1/element")
                .json_body(json!({"using": "css selector", "value": "#download-button"}));
            then.status(200).json_body(
                json!({"value": {"element-6066-11e4-a52e-4f735466cecf": "el-7"}}),
            );
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/session/s1/element/el-7/attribute/data-cacheid");
            then.status(200).json_body(json!({"value": "abc123"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/session/s1/cookie/nlrb-dl-sessid");
            then.status(404).json_body(
                json!({"value": {"error": "no such cookie", "message": "", "stacktrace": ""}}),
            );
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/session/s1/source");
            then.status(200)
                .json_body(json!({"value": "<html><body>ok</body></html>"}));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/session/s1");
            then.status(200).json_body(json!({"value": null}));
        })
        .await;

    let mut config = fast_config("https://www.nlrb.gov");
    config.browser.webdriver_url = server.base_url();
    let launcher = WebDriverLauncher::new(&config).unwrap();

    let mut session = launcher.launch().await.unwrap();
    session
        .navigate(&Url::parse("https://www.nlrb.gov/search/case").unwrap())
        .await
        .unwrap();
    assert!(session
        .wait_for_element("#download-button", Duration::from_millis(50))
        .await
        .unwrap());
    assert_eq!(
        session
            .attribute("#download-button", "data-cacheid")
            .await
            .unwrap()
            .as_deref(),
        Some("abc123")
    );
    assert_eq!(session.cookie("nlrb-dl-sessid").await.unwrap(), None);
    assert!(session.page_source().await.unwrap().contains("ok"));
    session.close().await.unwrap();

    create.assert_async().await;
    navigate.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_webdriver_missing_element_times_out_as_false() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/session");
            then.status(200)
                .json_body(json!({"value": {"sessionId": "s2", "capabilities": {}}}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/session/s2/element");
            then.status(404).json_body(
                json!({"value": {"error": "no such element", "message": "not found"}}),
            );
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/session/s2/source");
            then.status(500).json_body(
                json!({"value": {"error": "invalid session id", "message": "session deleted"}}),
            );
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/session/s2");
            then.status(200).json_body(json!({"value": null}));
        })
        .await;

    let mut config = fast_config("https://www.nlrb.gov");
    config.browser.webdriver_url = server.base_url();
    let mut session = WebDriverLauncher::new(&config).unwrap().launch().await.unwrap();

    let found = session
        .wait_for_element("div.results-wrapper", Duration::from_millis(20))
        .await
        .unwrap();
    assert!(!found);

    let err = session.page_source().await.unwrap_err();
    assert!(err.is_session_fatal());
    assert!(err.to_string().contains("invalid session id"));

    session.close().await.unwrap();
}
