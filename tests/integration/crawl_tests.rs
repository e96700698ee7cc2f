//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up a mock registry portal and drive
//! the full crawl cycle end-to-end through the HTTP driver.

use registry_harvest::challenge::ChannelSignal;
use registry_harvest::config::{
    BrowserConfig, Config, CrawlConfig, OutputConfig, PortalConfig, TimingConfig,
};
use registry_harvest::crawler::{run_crawl, CrawlCoordinator, CrawlPhase};
use registry_harvest::driver::HttpDriver;
use registry_harvest::HarvestError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOME_PAGE: &str = r#"<html><head><title>Secretary of State</title></head>
    <body><a href="/search">Business Entity Search</a></body></html>"#;

const SEARCH_PAGE: &str = r#"<html><head><title>Business Entity Search</title></head><body>
    <form method="post" action="/search">
    <input type="hidden" name="__VIEWSTATE" value="search">
    <input type="radio" name="rblSearchType" id="MainContent_rblSearchType_0" value="Name">
    <input type="radio" name="rblSearchType" id="MainContent_rblSearchType_1" value="ID" checked>
    <input type="radio" name="rblNameSearchType" id="MainContent_rblNameSearchType_0" value="Contains">
    <input type="text" name="txtSearchEntityName" id="MainContent_txtSearchEntityName" value="">
    <input type="submit" name="btnSearchEntity" id="MainContent_btnSearchEntity" value="Search">
    </form></body></html>"#;

const RESULTS_PAGE: &str = r#"<html><body>
    <form method="post" action="/search">
    <input type="hidden" name="__VIEWSTATE" value="list">
    <table class="gvResults">
    <tr><th>ID</th><th>Name</th><th></th></tr>
    <tr><td>1001</td><td>Acme LLC</td><td><input type="submit" name="selectRow1" value="Select Business"></td></tr>
    <tr><td>1002</td><td>Acme Holdings Inc</td><td><input type="submit" name="selectRow2" value="Select Business"></td></tr>
    </table></form></body></html>"#;

const NO_RESULTS_PAGE: &str = r#"<html><body>
    <p>No business entities matched your search.</p></body></html>"#;

const ACME_DETAIL: &str = r#"<html><body><form method="post" action="/search">
    <input type="hidden" name="__VIEWSTATE" value="detail">
    <span id="MainContent_lblEntityID">1001</span>
    <span id="MainContent_lblEntityName">Acme LLC</span>
    <span id="MainContent_lblEntityType">Limited Liability Company</span>
    <span id="MainContent_lblEntityStatus">Active and in good standing</span>
    <span id="MainContent_lblPOAddress">100 Main St</span>
    <span id="MainContent_lblPOAddressCity">Topeka</span>
    <span id="MainContent_lblPOAddressState">KS</span>
    <span id="MainContent_lblPOAddressZip">66612</span>
    <input type="submit" name="btnReturnToSearchResults" id="MainContent_btnReturnToSearchResults" value="Return">
    </form></body></html>"#;

// Marker present but empty; the values only appear in the detail table
const HOLDINGS_DETAIL: &str = r#"<html><body><form method="post" action="/search">
    <input type="hidden" name="__VIEWSTATE" value="detail">
    <span id="MainContent_lblEntityID"></span>
    <table>
    <tr><th>Business ID:</th><td>1002</td></tr>
    <tr><th>Business Name:</th><td>Acme Holdings Inc</td></tr>
    <tr><th>Jurisdiction:</th><td>Delaware</td></tr>
    </table>
    <input type="submit" name="btnReturnToSearchResults" id="MainContent_btnReturnToSearchResults" value="Return">
    </form></body></html>"#;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Mounts the search flow on `server`, leaving the homepage to the caller
async fn mount_portal(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(SEARCH_PAGE))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string_contains("btnSearchEntity"))
        .and(body_string_contains("txtSearchEntityName=acme"))
        .respond_with(html(RESULTS_PAGE))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string_contains("btnSearchEntity"))
        .and(body_string_contains("txtSearchEntityName=zzz"))
        .respond_with(html(NO_RESULTS_PAGE))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string_contains("selectRow1="))
        .respond_with(html(ACME_DETAIL))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string_contains("selectRow2="))
        .respond_with(html(HOLDINGS_DETAIL))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string_contains("btnReturnToSearchResults"))
        .respond_with(html(RESULTS_PAGE))
        .mount(server)
        .await;
}

async fn mount_home(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(HOME_PAGE))
        .mount(server)
        .await;
}

/// Creates a test configuration pointing at the mock portal
fn create_test_config(base_url: &str, output: &Path, terms: &[&str]) -> Config {
    Config {
        portal: PortalConfig {
            home_url: format!("{}/", base_url),
            search_url: format!("{}/search", base_url),
        },
        crawl: CrawlConfig {
            search_terms: terms.iter().map(|t| t.to_string()).collect(),
            max_rows_per_term: 5,
        },
        timing: TimingConfig::immediate(),
        output: OutputConfig {
            directory: output.to_path_buf(),
            filename_limit: 30,
            preview_limit: 500,
        },
        browser: BrowserConfig::default(),
    }
}

fn create_coordinator(config: &Config) -> CrawlCoordinator<HttpDriver> {
    let driver =
        HttpDriver::new(&config.browser.user_agent).expect("Failed to build HTTP driver");
    let (_sender, signal) = ChannelSignal::new();
    CrawlCoordinator::new(config, "test-hash", driver, Box::new(signal))
        .expect("Failed to create coordinator")
}

fn read_json(path: &Path) -> serde_json::Value {
    let bytes = fs::read(path).expect("Failed to read artifact");
    serde_json::from_slice(&bytes).expect("Artifact is not valid JSON")
}

fn json_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .expect("Failed to list directory")
        .map(|e| e.expect("Failed to read entry").path())
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn test_full_crawl_against_mock_portal() {
    let mock_server = MockServer::start().await;
    mount_home(&mock_server).await;
    mount_portal(&mock_server).await;

    let output = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), output.path(), &["acme"]);
    let mut coordinator = create_coordinator(&config);

    let report = run_crawl(&mut coordinator, std::future::pending())
        .await
        .expect("Crawl failed");

    assert_eq!(coordinator.phase(), CrawlPhase::Done);
    assert_eq!(report.total_successes, 2);
    let term = report.term("acme").expect("Missing term report");
    assert_eq!(term.rows_found, 2);
    assert_eq!(term.persisted, 2);
    assert_eq!(term.failed, 0);

    let records = json_files(&output.path().join("json"));
    assert_eq!(records.len(), 2);
    let record_named = |name: &str| {
        records
            .iter()
            .map(|p| read_json(p))
            .find(|r| r["business_name"] == name)
            .expect("Record not written")
    };

    let acme = record_named("Acme LLC");
    assert_eq!(acme["business_id"], "1001");
    assert_eq!(acme["business_name"], "Acme LLC");
    assert_eq!(acme["entity_status"], "Active and in good standing");
    assert_eq!(acme["principal_office_address"], "100 Main St | Topeka, KS 66612");
    assert_eq!(acme["search_term"], "acme");
    assert_eq!(acme["status"], "success");

    // Second record only resolves through the detail table
    let holdings = record_named("Acme Holdings Inc");
    assert_eq!(holdings["business_id"], "1002");
    assert_eq!(holdings["jurisdiction"], "Delaware");

    let combined = report.combined.expect("Combined artifact missing");
    assert!(combined.is_structured());
    let saved = read_json(combined.path());
    assert_eq!(saved["total_companies"], 2);
    assert_eq!(saved["config_hash"], "test-hash");
    assert_eq!(saved["search_terms_used"][0], "acme");

    assert!(json_files(&output.path().join("errors")).is_empty());
    assert!(coordinator.session().is_closed());
}

#[tokio::test]
async fn test_term_without_results_is_skipped() {
    let mock_server = MockServer::start().await;
    mount_home(&mock_server).await;
    mount_portal(&mock_server).await;

    let output = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), output.path(), &["zzz", "acme"]);
    let mut coordinator = create_coordinator(&config);

    let report = run_crawl(&mut coordinator, std::future::pending())
        .await
        .expect("Crawl failed");

    let skipped = report.term("zzz").expect("Missing term report");
    assert!(skipped.is_skipped());
    assert_eq!(skipped.rows_found, 0);
    assert_eq!(skipped.rows_attempted, 0);

    // The next term still runs from a fresh search page
    assert_eq!(report.term("acme").expect("Missing term report").persisted, 2);
    assert_eq!(report.total_successes, 2);
    assert!(json_files(&output.path().join("errors")).is_empty());
}

#[tokio::test]
async fn test_homepage_failure_falls_back_to_search_page() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    mount_portal(&mock_server).await;

    let output = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), output.path(), &["acme"]);
    let mut coordinator = create_coordinator(&config);

    let report = run_crawl(&mut coordinator, std::future::pending())
        .await
        .expect("Crawl failed");

    assert_eq!(report.total_successes, 2);
    assert!(coordinator.history().contains(&CrawlPhase::SearchNav));
    assert_eq!(coordinator.phase(), CrawlPhase::Done);
}

#[tokio::test]
async fn test_unreachable_portal_aborts_and_closes_session() {
    // Nothing mounted: every request is answered with 404
    let mock_server = MockServer::start().await;

    let output = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), output.path(), &["acme"]);
    let mut coordinator = create_coordinator(&config);

    let result = run_crawl(&mut coordinator, std::future::pending()).await;

    match result {
        Err(HarvestError::Bootstrap { primary, fallback }) => {
            assert!(primary.contains("404"), "primary: {}", primary);
            assert!(fallback.contains("/search"), "fallback: {}", fallback);
        }
        other => panic!("Expected bootstrap failure, got {:?}", other.map(|r| r.total_successes)),
    }
    assert_eq!(coordinator.phase(), CrawlPhase::Aborted);
    assert!(coordinator.session().is_closed());
    assert!(json_files(&output.path().join("json")).is_empty());
}

#[tokio::test]
async fn test_failing_detail_page_is_recorded_and_crawl_continues() {
    let mock_server = MockServer::start().await;
    mount_home(&mock_server).await;

    // Row 1 fails; mounted first so it wins over the regular detail mock
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string_contains("selectRow1="))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_portal(&mock_server).await;

    let output = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), output.path(), &["acme"]);
    let mut coordinator = create_coordinator(&config);

    let report = run_crawl(&mut coordinator, std::future::pending())
        .await
        .expect("Crawl failed");

    let term = report.term("acme").expect("Missing term report");
    assert_eq!(term.rows_attempted, 2);
    assert_eq!(term.failed, 1);
    assert_eq!(term.persisted, 1);

    let errors = json_files(&output.path().join("errors"));
    assert_eq!(errors.len(), 1);
    let error = read_json(&errors[0]);
    assert_eq!(error["search_term"], "acme");
    assert_eq!(error["error_type"], "crawling_error");

    let records = json_files(&output.path().join("json"));
    assert_eq!(records.len(), 1);
    assert_eq!(read_json(&records[0])["business_id"], "1002");
}
