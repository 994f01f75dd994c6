//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small program directory and run the
//! full crawl cycle end-to-end against a temporary database, with the
//! browser disabled.

use funding_crawler::admin::{reset, verify};
use funding_crawler::config::{
    Config, CrawlerConfig, OutputConfig, RendererConfig, ScheduleConfig, UserAgentConfig,
};
use funding_crawler::crawler::{run_crawl, CrawlEnd};
use funding_crawler::storage::{open_store, ProgramStore};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            base_url: base_url.to_string(),
            start_url: format!("{}/liste-1.html", base_url),
            page_delay_ms: 10, // Very short for testing
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        renderer: RendererConfig {
            enabled: false,
            ..RendererConfig::default()
        },
        output: OutputConfig {
            database_path: db_path.to_string_lossy().into_owned(),
        },
        schedule: ScheduleConfig::default(),
    }
}

fn listing_page(slugs: &[&str], next: Option<&str>) -> String {
    let mut cards = String::new();
    for slug in slugs {
        cards.push_str(&format!(
            r#"<div class="card card--fundingprogram">
                 <a class="bookmark" href="/merken/{0}">Merken</a>
                 <a href="/FDB/Content/DE/Foerderprogramm/{0}.html">
                   <span class="link--label">Programm {0}</span>
                 </a>
               </div>"#,
            slug
        ));
    }
    // A card without label must be ignored
    cards.push_str(r#"<div class="card--fundingprogram"><a href="/kaputt.html"></a></div>"#);

    let pagination = match next {
        Some(next) => format!(
            r#"<div class="pagination"><a class="backward button" href="/liste-1.html">Zurück</a>
               <a class="forward button" href="{}">Weiter</a></div>"#,
            next
        ),
        None => r#"<div class="pagination"><a class="backward button" href="/liste-1.html">Zurück</a></div>"#
            .to_string(),
    };

    format!("<html><body>{}{}</body></html>", cards, pagination)
}

fn detail_page(slug: &str) -> String {
    format!(
        r#"<html><body>
        <h1 class="title">Programm {0}</h1>
        <dl class="grid-modul--two-elements document-info-fundingprogram">
          <dt>Förderart:</dt><dd>Zuschuss</dd>
          <dt>Förderbereich:</dt><dd>Existenzgründung</dd>
          <dt>Fördergebiet:</dt><dd>Bund</dd>
          <dt>Förderberechtigte:</dt><dd>Unternehmen</dd>
          <dt>Ansprechpunkt:</dt>
          <dd>
            <p class="card--title">Förderbank {0}</p>
            <div class="address">Hauptstraße 1, 10115 Berlin</div>
            <p class="tel">Tel: +49 30 1234</p>
            <p class="fax">Fax: +49 30 5678</p>
            <p class="email"><a href="mailto:info@{0}.example">E-Mail</a></p>
            <p class="website"><a href="https://{0}.example">Website</a></p>
          </dd>
          <dt>Weiterführende Links:</dt>
          <dd><a href="https://a.example/1">A</a><a href="https://a.example/2">B</a></dd>
        </dl>
        <article id="tab1"><p>Kurztext {0}</p></article>
        <article id="tab2"><p>Zusatz</p></article>
        <article id="tab3"><p>Richtlinie</p></article>
        </body></html>"#,
        slug
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(expected_hits)
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, slug: &str, expected_hits: u64) {
    mount_page(
        server,
        &format!("/FDB/Content/DE/Foerderprogramm/{}.html", slug),
        detail_page(slug),
        expected_hits,
    )
    .await;
}

/// Two listing pages with two and one programs
async fn mount_directory(server: &MockServer, crawls: u64) {
    mount_page(
        server,
        "/liste-1.html",
        listing_page(&["alpha", "beta"], Some("/liste-2.html")),
        crawls,
    )
    .await;
    mount_page(server, "/liste-2.html", listing_page(&["gamma"], None), crawls).await;

    // Detail pages are fetched once no matter how often we crawl
    for slug in ["alpha", "beta", "gamma"] {
        mount_detail(server, slug, 1).await;
    }
}

#[tokio::test]
async fn test_full_crawl() {
    let mock_server = MockServer::start().await;
    mount_directory(&mock_server, 1).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("funding.db");
    let config = create_test_config(&mock_server.uri(), &db_path);

    let stats = run_crawl(&config).await.expect("crawl should start");
    assert_eq!(stats.listing_pages, 2);
    assert_eq!(stats.discovered, 3);
    assert_eq!(stats.created, 3);
    assert_eq!(stats.details_created, 3);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.end, CrawlEnd::Exhausted);

    let store = open_store(&db_path).unwrap();
    let url = format!(
        "{}/FDB/Content/DE/Foerderprogramm/beta.html",
        mock_server.uri()
    );
    let program = store.find_program_by_url(&url).unwrap().unwrap();
    assert_eq!(program.name, "Programm beta");
    assert!(program.is_scraped);
    assert!(program.scraped_at.is_some());

    let details = store.get_details(program.id).unwrap().unwrap();
    assert_eq!(details.funding_type, "Zuschuss");
    assert_eq!(details.support_area, "Existenzgründung");
    assert_eq!(details.funding_area, "Bund");
    assert_eq!(details.eligibility, "Unternehmen");
    assert_eq!(details.provider_name, "Förderbank beta");
    assert_eq!(details.provider_phone, "+49 30 1234");
    assert_eq!(details.provider_fax, "+49 30 5678");
    assert_eq!(details.provider_email, "info@beta.example");
    assert_eq!(details.provider_website, "https://beta.example");
    assert_eq!(
        details.further_links,
        vec![
            "https://a.example/1".to_string(),
            "https://a.example/2".to_string()
        ]
    );
    assert_eq!(details.short_summary, "Kurztext beta");
    assert_eq!(details.additional_information, "Zusatz");
    assert_eq!(details.legal_basis, "Richtlinie");
}

#[tokio::test]
async fn test_second_crawl_is_idempotent() {
    let mock_server = MockServer::start().await;
    mount_directory(&mock_server, 2).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("funding.db");
    let config = create_test_config(&mock_server.uri(), &db_path);

    run_crawl(&config).await.unwrap();
    let second = run_crawl(&config).await.unwrap();

    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(second.scraped(), 0);

    let store = open_store(&db_path).unwrap();
    assert_eq!(store.count_programs().unwrap(), 3);
    assert_eq!(store.count_with_details().unwrap(), 3);
    assert_eq!(store.count_scraped_without_details().unwrap(), 0);
}

#[tokio::test]
async fn test_failed_detail_is_retried_next_run() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/liste-1.html",
        listing_page(&["alpha", "broken"], None),
        2,
    )
    .await;
    mount_detail(&mock_server, "alpha", 1).await;
    Mock::given(method("GET"))
        .and(path("/FDB/Content/DE/Foerderprogramm/broken.html"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("funding.db");
    let config = create_test_config(&mock_server.uri(), &db_path);

    let first = run_crawl(&config).await.unwrap();
    assert_eq!(first.details_created, 1);
    assert_eq!(first.failed, 1);

    let second = run_crawl(&config).await.unwrap();
    assert_eq!(second.skipped, 1);
    assert_eq!(second.failed, 1);

    let store = open_store(&db_path).unwrap();
    let report = verify(&store).unwrap();
    assert_eq!(report.total_programs, 2);
    assert_eq!(report.with_details, 1);
    assert_eq!(report.scraped, 1);
    assert!(report.is_consistent());
}

#[tokio::test]
async fn test_listing_failure_ends_crawl() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/liste-1.html",
        listing_page(&["alpha"], Some("/liste-2.html")),
        1,
    )
    .await;
    mount_detail(&mock_server, "alpha", 1).await;
    Mock::given(method("GET"))
        .and(path("/liste-2.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("funding.db");
    let config = create_test_config(&mock_server.uri(), &db_path);

    let stats = run_crawl(&config).await.unwrap();
    assert_eq!(stats.listing_pages, 1);
    assert_eq!(stats.details_created, 1);
    assert_eq!(
        stats.end,
        CrawlEnd::ListingFailed {
            url: format!("{}/liste-2.html", mock_server.uri())
        }
    );
}

#[tokio::test]
async fn test_reset_then_verify() {
    let mock_server = MockServer::start().await;
    mount_directory(&mock_server, 1).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("funding.db");
    let config = create_test_config(&mock_server.uri(), &db_path);
    run_crawl(&config).await.unwrap();

    let mut store = open_store(&db_path).unwrap();
    let before = verify(&store).unwrap();
    assert_eq!(before.total_programs, 3);
    let sample = before.sample.expect("a sample program");
    assert_eq!(sample.funding_type, "Zuschuss");
    assert!(sample.summary_preview.starts_with("Kurztext"));

    let summary = reset(&mut store).unwrap();
    assert_eq!(summary.details_deleted, 3);
    assert_eq!(summary.programs_deleted, 3);

    let after = verify(&store).unwrap();
    assert_eq!(after.total_programs, 0);
    assert_eq!(after.with_details, 0);
    assert!(after.sample.is_none());

    // Reset on an empty database succeeds
    let again = reset(&mut store).unwrap();
    assert_eq!(again.programs_deleted, 0);
}
