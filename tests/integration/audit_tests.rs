//! Integration tests for the audit engine
//!
//! These tests use wiremock to serve a root page and its assets and run
//! the full audit cycle end-to-end.

use elmo::audit::{admit_assets, run_audit};
use elmo::config::{Config, TimingMode};
use elmo::output::InfluxExporter;
use elmo::url::DomainFilter;
use elmo::AuditError;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts a GET route answering `body` with status 200
async fn mount_body(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::for_url(format!("{}/", server.uri()));
    config.transport.connect_timeout = 500;
    config.transport.request_timeout = 5000;
    config
}

fn sorted_urls(urls: impl Iterator<Item = String>) -> Vec<String> {
    let mut urls: Vec<String> = urls.collect();
    urls.sort();
    urls
}

#[test]
fn test_fixture_page_yields_five_assets() {
    let body = r#"<head>
		<link rel="alternate" type="application/rss+xml" title="Flux" href="http://test.com/feed/" />
		<link rel="stylesheet" href="http://test.com/1.css" type="text/css" media="all" />
		</head><body>
		<img src="http://test.com/1.png"/>
		<img src="http://test.com/É.png"/>
		<img src="http://test.com/3.png">
		<script type="text/javascript" src="http://test.com/1.js">
	</body>"#;

    let base = url::Url::parse("http://test.com/").unwrap();
    let mut admission = admit_assets(body.as_bytes(), &base, &DomainFilter::default());

    assert_eq!(admission.discovered, 5);
    assert_eq!(admission.queue.len(), 5);

    let mut urls = Vec::new();
    while let Some(url) = admission.queue.pop() {
        assert!(url.starts_with("http"));
        urls.push(url);
    }
    assert!(!urls.contains(&"http://test.com/feed/".to_string()));
    assert_eq!(urls[0], "http://test.com/1.css");
    assert_eq!(urls[2], "http://test.com/É.png");
}

#[tokio::test]
async fn test_full_audit_aggregates_sizes() {
    let server = MockServer::start().await;

    let root_body = r#"<html><head>
        <link rel="stylesheet" href="/1.css">
        <link rel="alternate" href="/feed/">
        </head><body>
        <img src="img/2.png">
        <div style="background: url('/3.png')"></div>
        </body></html>"#;

    mount_body(&server, "/", root_body).await;
    mount_body(&server, "/1.css", "a").await;
    mount_body(&server, "/img/2.png", "bb").await;
    mount_body(&server, "/3.png", "ccc").await;
    Mock::given(method("GET"))
        .and(path("/feed/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let report = run_audit(&config).await.expect("audit failed");

    let root_size = root_body.len() as u64;
    assert_eq!(report.root.response_size, root_size);
    assert_eq!(report.root.status_code, 200);
    assert_eq!(report.admitted, 3);
    assert_eq!(report.assets.len(), 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.total.total_response_size, root_size + 6);

    let base = server.uri();
    assert_eq!(
        sorted_urls(report.assets.iter().map(|s| s.url.clone())),
        vec![
            format!("{}/1.css", base),
            format!("{}/3.png", base),
            format!("{}/img/2.png", base),
        ]
    );
}

#[tokio::test]
async fn test_http_error_status_is_recorded() {
    let server = MockServer::start().await;

    mount_body(&server, "/", r#"<img src="/missing.png">"#).await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&server)
        .await;

    let report = run_audit(&config_for(&server)).await.expect("audit failed");

    assert_eq!(report.assets.len(), 1);
    assert_eq!(report.assets[0].status_code, 404);
    assert_eq!(report.assets[0].response_size, 4);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn test_failed_asset_is_dropped() {
    let server = MockServer::start().await;

    mount_body(
        &server,
        "/",
        r#"<img src="/ok.png"><img src="http://127.0.0.1:1/unreachable.png">"#,
    )
    .await;
    mount_body(&server, "/ok.png", "12345").await;

    let report = run_audit(&config_for(&server)).await.expect("audit failed");

    assert_eq!(report.admitted, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.assets.len(), 1);
    assert!(report.assets[0].url.ends_with("/ok.png"));
}

#[tokio::test]
async fn test_root_network_error_aborts() {
    let mut config = Config::for_url("http://127.0.0.1:1/");
    config.transport.connect_timeout = 500;

    let result = run_audit(&config).await;
    assert!(matches!(result, Err(AuditError::RootFetch { .. })));
}

#[tokio::test]
async fn test_keyword_missing_aborts_before_assets() {
    let server = MockServer::start().await;

    mount_body(&server, "/", r#"<h1>Maintenance</h1><img src="/a.png">"#).await;
    Mock::given(method("GET"))
        .and(path("/a.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.audit.keyword = Some("Welcome".to_string());

    let result = run_audit(&config).await;
    assert!(matches!(result, Err(AuditError::KeywordMissing { .. })));
}

#[tokio::test]
async fn test_keyword_present_continues() {
    let server = MockServer::start().await;

    mount_body(&server, "/", r#"<h1>Welcome</h1><img src="/a.png">"#).await;
    mount_body(&server, "/a.png", "x").await;

    let mut config = config_for(&server);
    config.audit.keyword = Some("Welcome".to_string());

    let report = run_audit(&config).await.expect("audit failed");
    assert_eq!(report.assets.len(), 1);
}

#[tokio::test]
async fn test_domain_filter_rejects_other_hosts() {
    let server = MockServer::start().await;
    let port = url::Url::parse(&server.uri()).unwrap().port().unwrap();

    mount_body(
        &server,
        "/",
        &format!(
            r#"<img src="/same-host.png"><img src="http://localhost:{}/other-host.png">"#,
            port
        ),
    )
    .await;
    mount_body(&server, "/same-host.png", "x").await;
    Mock::given(method("GET"))
        .and(path("/other-host.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.audit.allowed_domains = vec!["127.0.0.1".to_string()];

    let report = run_audit(&config).await.expect("audit failed");
    assert_eq!(report.filtered, 1);
    assert_eq!(report.admitted, 1);
    assert_eq!(report.assets.len(), 1);
}

#[tokio::test]
async fn test_response_header_timeout_fails_asset() {
    let server = MockServer::start().await;

    mount_body(&server, "/", r#"<script src="/slow.js"></script>"#).await;
    Mock::given(method("GET"))
        .and(path("/slow.js"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("x")
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.transport.response_header_timeout = 200;

    let report = run_audit(&config).await.expect("audit failed");
    assert_eq!(report.failed, 1);
    assert!(report.assets.is_empty());
}

#[tokio::test]
async fn test_configured_headers_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("x-audit", "yes"))
        .and(header("user-agent", "audit-bot/2.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>ok</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config
        .audit
        .headers
        .insert("X-Audit".to_string(), "yes".to_string());
    config.audit.user_agent = "audit-bot/2.0".to_string();

    let report = run_audit(&config).await.expect("audit failed");
    assert_eq!(report.root.status_code, 200);
    assert_eq!(report.admitted, 0);
}

#[tokio::test]
async fn test_resolve_rule_rewrites_host() {
    let server = MockServer::start().await;
    let port = url::Url::parse(&server.uri()).unwrap().port().unwrap();

    mount_body(&server, "/", r#"<img src="/a.png">"#).await;
    mount_body(&server, "/a.png", "xy").await;

    let mut config = Config::for_url(format!("http://audit.invalid:{}/", port));
    config.transport.resolve = Some(format!("audit.invalid:{}:127.0.0.1", port));

    let report = run_audit(&config).await.expect("audit failed");
    assert_eq!(report.assets.len(), 1);
    assert_eq!(
        report.assets[0].url,
        format!("http://audit.invalid:{}/a.png", port)
    );
}

#[tokio::test]
async fn test_cumulative_timing_sums_response_times() {
    let server = MockServer::start().await;

    mount_body(&server, "/", r#"<img src="/a.png"><img src="/b.png">"#).await;
    Mock::given(method("GET"))
        .and(path("/a.png"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(100)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.png"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(100)))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.audit.timing = TimingMode::Cumulative;

    let report = run_audit(&config).await.expect("audit failed");
    let summed: Duration = report.all_statistics().map(|s| s.response_time).sum();
    assert_eq!(report.total.total_response_time, summed);
    assert!(report.total.total_response_time >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_influx_export_posts_line_protocol() {
    let app = MockServer::start().await;
    let influx = MockServer::start().await;

    mount_body(&app, "/", r#"<img src="/a.png">"#).await;
    mount_body(&app, "/a.png", "xyz").await;

    Mock::given(method("POST"))
        .and(path("/write"))
        .and(query_param("db", "assets"))
        .and(query_param("precision", "s"))
        .and(body_string_contains("responseSize=3i"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&influx)
        .await;

    let mut config = config_for(&app);
    config.influx.url = influx.uri();
    config.influx.database = "assets".to_string();

    let report = run_audit(&config).await.expect("audit failed");
    let exporter = InfluxExporter::new(&config.influx).unwrap();
    exporter.export(&report).await.expect("export failed");
}

#[tokio::test]
async fn test_influx_error_status_is_reported() {
    let influx = MockServer::start().await;
    let app = MockServer::start().await;

    mount_body(&app, "/", "<p>empty</p>").await;
    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(ResponseTemplate::new(404).set_body_string("database not found"))
        .mount(&influx)
        .await;

    let mut config = config_for(&app);
    config.influx.url = influx.uri();

    let report = run_audit(&config).await.expect("audit failed");
    let result = InfluxExporter::new(&config.influx)
        .unwrap()
        .export(&report)
        .await;
    assert!(matches!(result, Err(AuditError::Export(_))));
}
