use cid_compare::config::settings::CompareSettings;
use cid_compare::core::ConfigProvider;
use cid_compare::domain::model::{ProbeTarget, RunEvent};
use cid_compare::{CompareEngine, CompareError, HttpOfferSource, LocalStorage, ReportExporter, TomlConfig};
use httpmock::prelude::*;
use std::io::Write;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};

const PAGE_PATH: &str = "/hotel/seoul.html";

fn settings_for(server: &MockServer) -> CompareSettings {
    CompareSettings {
        site_origin: server.base_url(),
        site_domain: "127.0.0.1".to_string(),
        page_timeout_secs: 2,
        api_timeout_secs: 2,
        curated_codes: vec![ProbeTarget::new("A", 100), ProbeTarget::new("B", 200)],
        random_code_count: 0,
        backoff_base_ms: 10,
        min_delay_ms: 0,
        max_delay_ms: 0,
        ..CompareSettings::default()
    }
}

fn engine_for(settings: CompareSettings) -> CompareEngine<HttpOfferSource> {
    let source = HttpOfferSource::from_settings(&settings).unwrap();
    CompareEngine::new(source, settings)
}

fn page_html(code: u64) -> String {
    format!(
        r#"<html><head><script data-selenium="script-initparam">var apiUrl = "/api/offer?cid={}&amp;los=1";</script></head><body></body></html>"#,
        code
    )
}

/// 為指定 cid 掛上頁面與 API 兩個 mock
fn mock_offer<'a>(
    server: &'a MockServer,
    code: u64,
    body: serde_json::Value,
) -> (httpmock::Mock<'a>, httpmock::Mock<'a>) {
    let code_text = code.to_string();
    let page = server.mock(|when, then| {
        when.method(GET)
            .path(PAGE_PATH)
            .query_param("cid", code_text.as_str());
        then.status(200)
            .header("Content-Type", "text/html")
            .body(page_html(code));
    });
    let api = server.mock(|when, then| {
        when.method(GET)
            .path("/api/offer")
            .query_param("cid", code_text.as_str())
            .query_param("los", "1");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(body);
    });
    (page, api)
}

#[tokio::test]
async fn test_one_priced_code_and_one_failing_code() -> anyhow::Result<()> {
    let server = MockServer::start();
    let (page_a, api_a) = mock_offer(
        &server,
        100,
        serde_json::json!({
            "discount": {"cheapestPrice": 50000},
            "hotelInfo": {"name": "Grand Seoul"}
        }),
    );
    let page_b = server.mock(|when, then| {
        when.method(GET).path(PAGE_PATH).query_param("cid", "200");
        then.status(500);
    });

    let engine = engine_for(settings_for(&server));
    let response = engine
        .compare(&server.url("/hotel/seoul.html?cid=-1"))
        .await?;

    page_a.assert();
    api_a.assert();
    page_b.assert_hits(3);

    assert!(response.success);
    assert_eq!(response.hotel, "Grand Seoul");
    assert_eq!(response.total_cids, 2);
    assert_eq!(response.collected_results, 2);

    let a = &response.priced[0];
    assert_eq!((a.label.as_str(), a.code, a.price, a.sold_out), ("A", 100, 50000.0, false));
    assert_eq!(a.rewritten_url, server.url("/hotel/seoul.html?cid=100"));
    let b = &response.priced[1];
    assert_eq!((b.label.as_str(), b.code, b.price, b.sold_out), ("B", 200, 0.0, true));

    let cheapest = response.cheapest.unwrap();
    assert_eq!(cheapest.code, 100);
    Ok(())
}

#[tokio::test]
async fn test_all_sold_out_keeps_hotel_name() -> anyhow::Result<()> {
    let server = MockServer::start();
    mock_offer(
        &server,
        100,
        serde_json::json!({"hotelInfo": {"name": "Grand Seoul"}, "rooms": []}),
    );
    mock_offer(
        &server,
        200,
        serde_json::json!({"discount": {"cheapestPrice": 0}}),
    );

    let engine = engine_for(settings_for(&server));
    let response = engine
        .compare(&server.url("/hotel/seoul.html?cid=-1"))
        .await?;

    assert!(response.cheapest.is_none());
    assert_eq!(response.hotel, "Grand Seoul");
    assert!(response.priced.iter().all(|r| r.sold_out && r.price == 0.0));
    Ok(())
}

#[tokio::test]
async fn test_invalid_url_makes_no_requests() -> anyhow::Result<()> {
    let server = MockServer::start();
    let any_request = server.mock(|when, then| {
        when.path_contains("/");
        then.status(200);
    });

    let engine = engine_for(settings_for(&server));
    let err = engine
        .compare(&server.url("/hotel/seoul.html?checkIn=2025-07-01"))
        .await
        .unwrap_err();

    match err {
        CompareError::ValidationError { message } => {
            assert_eq!(message, "The URL must contain a cid parameter")
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    any_request.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_streaming_reports_progress_then_complete() -> anyhow::Result<()> {
    let server = MockServer::start();
    mock_offer(&server, 100, serde_json::json!({"discount": {"cheapestPrice": 70000}}));
    mock_offer(&server, 200, serde_json::json!({"discount": {"cheapestPrice": 65000}}));

    let engine = Arc::new(engine_for(settings_for(&server)));
    let mut rx = engine.compare_streaming(server.url("/hotel/seoul.html?cid=1"));

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 3);
    assert_eq!(events[0], RunEvent::Progress { percentage: 50 });
    assert_eq!(events[1], RunEvent::Progress { percentage: 100 });
    match &events[2] {
        RunEvent::Complete { result } => {
            assert_eq!(result.cheapest.as_ref().map(|c| c.code), Some(200));
            assert_eq!(result.hotel, "Hotel name not found");
        }
        other => panic!("expected complete event, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_toml_config_drives_engine_and_export() -> anyhow::Result<()> {
    let server = MockServer::start();
    mock_offer(
        &server,
        1881505,
        serde_json::json!({
            "rooms": [{"directPrice": {"originalPrice": 91000}}],
            "hotelInfo": {"name": "Lotte Hotel"}
        }),
    );

    let export_dir = TempDir::new()?;
    let toml_content = format!(
        r#"
[site]
origin = "{origin}"
domain = "127.0.0.1"

[compare]
mode = "sequential"
max_attempts = 1
min_delay_ms = 0
max_delay_ms = 0

[catalog]
random_code_count = 0

[[catalog.codes]]
label = "Naver"
cid = 1881505

[output]
export_dir = "{export_dir}"
"#,
        origin = server.base_url(),
        export_dir = export_dir.path().display()
    );
    let mut config_file = NamedTempFile::new()?;
    config_file.write_all(toml_content.as_bytes())?;

    let config = TomlConfig::from_file(config_file.path())?;
    let settings = config.compare_settings()?;
    let engine = engine_for(settings);

    let run = engine
        .run(&server.url("/hotel/seoul.html?cid=-1&los=1"), None)
        .await?;
    assert!(!run.timed_out);
    assert_eq!(run.report.hotel_name, "Lotte Hotel");
    assert_eq!(run.report.cheapest.as_ref().map(|c| c.price), Some(91000.0));
    assert!(run.report.first_raw_response.is_some());

    let dir = config.export_dir().unwrap().to_string();
    let exporter = ReportExporter::new(LocalStorage::new(dir.clone()));
    let filename = exporter.export(&run).await?;

    let zip_data = std::fs::read(std::path::Path::new(&dir).join(&filename))?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data))?;
    let mut csv_content = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("results.csv")?, &mut csv_content)?;

    assert!(csv_content.starts_with("label,cid,url,price,sold_out,hotel_name"));
    assert!(csv_content.contains("Naver,1881505,"));
    assert!(archive.by_name("first_response.json").is_ok());
    Ok(())
}
