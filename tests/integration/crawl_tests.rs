//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up a fake storefront and run the full
//! crawl cycle end-to-end, from discovery through cart probing to the CSV.

use shelf_sounder::config::Config;
use shelf_sounder::crawler::{Coordinator, HttpTransport};
use shelf_sounder::output::CsvSink;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const CART_PATH: &str = "/checkout/cart/add";

/// Creates a test configuration pointing every endpoint at the mock server
fn create_test_config(base_url: &str, products_dir: &Path) -> Config {
    let mut config: Config = toml::from_str(&format!(
        r#"
[site]
base-url = "{base_url}"
sitemap-url = "{base_url}/sitemap.xml"
add-to-cart-url = "{base_url}{CART_PATH}"
form-key = "TESTKEY"

[crawler]
retry-backoff-ms = 10
request-timeout-secs = 5

[user-agent]
agents = ["TestBot/1.0"]

[output]
products-dir = "unused"
"#
    ))
    .expect("Failed to parse test config");

    config.output.products_dir = products_dir.display().to_string();
    config
}

/// Cart endpoint that accepts a quantity up to a per-product limit
struct CartLimits {
    limits: HashMap<String, u32>,
}

impl Respond for CartLimits {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let form: HashMap<String, String> = url::form_urlencoded::parse(&request.body)
            .into_owned()
            .collect();

        let limit = form
            .get("product")
            .and_then(|id| self.limits.get(id))
            .copied()
            .unwrap_or(0);
        let qty: u32 = form.get("qty").and_then(|q| q.parse().ok()).unwrap_or(u32::MAX);

        if form.get("form_key").map(String::as_str) == Some("TESTKEY") && qty <= limit {
            ResponseTemplate::new(200)
                .set_body_string("<div class=\"message-success\">Successfully added to cart.</div>")
        } else {
            ResponseTemplate::new(200).set_body_string(
                "<div class=\"message-error\">The requested qty is not available</div>",
            )
        }
    }
}

fn sitemap(base_url: &str, paths: &[&str]) -> String {
    let locs: String = paths
        .iter()
        .map(|p| format!("<url><loc>{}{}</loc></url>", base_url, p))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset>{}</urlset>"#,
        locs
    )
}

fn product_page(payload: &str, carts: &[(&str, &str)]) -> String {
    let forms: String = carts
        .iter()
        .map(|(sku, id)| format!(r#"<form data-product-sku="{}" data-product-id="{}"></form>"#, sku, id))
        .collect();
    format!(
        r#"<html><head><script type="application/ld+json">{payload}</script></head><body>
        <div data-product-image="https://cdn.example.com/media/catalog/product/cache/abc123/p/1.jpg"></div>
        <table id="product-attribute-specs-table"><tbody>
          <tr><th class="col label">UPC</th><td class="col data">0123456789</td></tr>
        </tbody></table>
        {forms}
        </body></html>"#
    )
}

fn single(id: &str, availability: &str) -> String {
    format!(
        r#"{{"productID": "{id}", "name": "Product {id}", "brand": {{"name": "Acme"}},
            "sku": "{id}", "offers": {{"price": "19.99", "availability": "https://schema.org/{availability}"}}}}"#
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("Failed to open products CSV");
    reader
        .records()
        .map(|r| r.expect("Bad CSV row").iter().map(String::from).collect())
        .collect()
}

fn run_coordinator(config: Config, input_urls: Vec<String>) -> Coordinator {
    let transport = HttpTransport::new(&config).expect("Failed to build transport");
    let sink = CsvSink::open(&config.output.products_path()).expect("Failed to open sink");
    Coordinator::new(config, Arc::new(transport), Box::new(sink)).with_input_urls(input_urls)
}

#[tokio::test]
async fn test_full_crawl_probes_in_stock_products() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().expect("Failed to create temp dir");

    mount_page(&mock_server, "/", "<html><body>Home</body></html>".to_string()).await;
    mount_page(
        &mock_server,
        "/sitemap.xml",
        sitemap(
            &base_url,
            &[
                "/in-stock.html",
                "/in-stock.html/",
                "/sold-out.html",
                "/variants.html",
                "/category/",
            ],
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/in-stock.html",
        product_page(&single("IN-1", "InStock"), &[("IN-1", "101")]),
    )
    .await;
    mount_page(
        &mock_server,
        "/sold-out.html",
        product_page(&single("OUT-1", "OutOfStock"), &[("OUT-1", "102")]),
    )
    .await;

    let variants = format!(
        r#"{{"name": "Family", "children": [{}, {}]}}"#,
        single("VAR-1", "InStock"),
        single("VAR-2", "OutOfStock")
    );
    mount_page(
        &mock_server,
        "/variants.html",
        product_page(&variants, &[("VAR-1", "201"), ("VAR-2", "202")]),
    )
    .await;

    Mock::given(method("POST"))
        .and(path(CART_PATH))
        .respond_with(CartLimits {
            limits: HashMap::from([("101".to_string(), 42), ("201".to_string(), 5)]),
        })
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, dir.path());
    let products_path = config.output.products_path();

    // The input list repeats a sitemap URL; it must only be fetched once.
    let mut coordinator = run_coordinator(config, vec![format!("{}/in-stock.html", base_url)]);
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.records_emitted, 4);
    assert_eq!(stats.records_in_stock, 2);
    assert_eq!(stats.records_out_of_stock, 2);
    assert_eq!(stats.pages_parsed, 3);
    assert!(stats.probes_answered <= 20);

    let rows = read_rows(&products_path);
    assert_eq!(rows.len(), 5, "header plus four records");
    assert_eq!(rows[0][0], "date");

    let quantities: HashMap<&str, &str> = rows[1..]
        .iter()
        .map(|row| (row[1].as_str(), row[3].as_str()))
        .collect();
    assert_eq!(quantities["IN-1"], "42");
    assert_eq!(quantities["OUT-1"], "0");
    assert_eq!(quantities["VAR-1"], "5");
    assert_eq!(quantities["VAR-2"], "0");

    let in_stock = rows[1..].iter().find(|row| row[1] == "IN-1").unwrap();
    assert_eq!(in_stock[4], "0123456789");
    assert_eq!(in_stock[5], "Acme");
    assert_eq!(
        in_stock[11],
        "https://cdn.example.com/media/catalog/product/p/1.jpg"
    );
    assert_eq!(in_stock[13], "101");

    let product_fetches = mock_server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/in-stock.html")
        .count();
    assert_eq!(product_fetches, 1);
}

#[tokio::test]
async fn test_sitemap_not_found_falls_back_to_categories() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/",
        r#"<html><body><nav class="navigation"><ul>
            <li class="level0"><a href="/pumps.html">Pumps</a></li>
        </ul></nav></body></html>"#
            .to_string(),
    )
    .await;

    // Mounted first so the paged listing wins over the bare path.
    Mock::given(method("GET"))
        .and(path("/pumps.html"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<ol><li><a class="product-item-link" href="/wave-pump.html">Wave</a></li></ol>"#,
        ))
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/pumps.html",
        r#"<ol><li><a class="product-item-link" href="/return-pump.html">Return</a></li></ol>
        <a class="action next" href="/pumps.html?p=2">Next</a>"#
            .to_string(),
    )
    .await;

    mount_page(
        &mock_server,
        "/return-pump.html",
        product_page(&single("RET-1", "OutOfStock"), &[("RET-1", "301")]),
    )
    .await;
    mount_page(
        &mock_server,
        "/wave-pump.html",
        product_page(&single("WAV-1", "OutOfStock"), &[("WAV-1", "302")]),
    )
    .await;

    let config = create_test_config(&base_url, dir.path());
    let products_path = config.output.products_path();

    let mut coordinator = run_coordinator(config, Vec::new());
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.not_found, 1);
    assert_eq!(stats.records_emitted, 2);

    let mut ids: Vec<String> = read_rows(&products_path)[1..]
        .iter()
        .map(|row| row[1].clone())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["RET-1", "WAV-1"]);
}

#[tokio::test]
async fn test_failures_retry_then_drop_and_not_found_is_final() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().expect("Failed to create temp dir");

    mount_page(&mock_server, "/", "<html></html>".to_string()).await;
    mount_page(
        &mock_server,
        "/sitemap.xml",
        sitemap(&base_url, &["/flaky.html", "/gone.html", "/fine.html"]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/flaky.html"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/fine.html",
        product_page(&single("FINE-1", "OutOfStock"), &[("FINE-1", "401")]),
    )
    .await;

    let config = create_test_config(&base_url, dir.path());
    let mut coordinator = run_coordinator(config, Vec::new());
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.retries, 3);
    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.not_found, 1);
    assert_eq!(stats.records_emitted, 1);

    // Wiremock verifies the expect() counts when the server drops.
}

#[tokio::test]
async fn test_rerun_appends_to_existing_csv() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().expect("Failed to create temp dir");

    mount_page(&mock_server, "/", "<html></html>".to_string()).await;
    mount_page(
        &mock_server,
        "/sitemap.xml",
        sitemap(&base_url, &["/sold-out.html"]),
    )
    .await;
    mount_page(
        &mock_server,
        "/sold-out.html",
        product_page(&single("OUT-1", "OutOfStock"), &[("OUT-1", "102")]),
    )
    .await;

    let config = create_test_config(&base_url, dir.path());
    let products_path = config.output.products_path();

    for _ in 0..2 {
        let mut coordinator = run_coordinator(config.clone(), Vec::new());
        coordinator.run().await.expect("Crawl failed");
    }

    let rows = read_rows(&products_path);
    assert_eq!(rows.len(), 3, "one header and one row per run");
    assert_eq!(rows[1][1], "OUT-1");
    assert_eq!(rows[2][1], "OUT-1");
}

#[tokio::test]
async fn test_redirected_product_records_canonical_url() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().expect("Failed to create temp dir");

    mount_page(&mock_server, "/", "<html></html>".to_string()).await;
    mount_page(
        &mock_server,
        "/sitemap.xml",
        sitemap(&base_url, &["/old-name.html"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old-name.html"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new-name.html", base_url).as_str()),
        )
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/new-name.html",
        product_page(&single("OUT-1", "OutOfStock"), &[("OUT-1", "102")]),
    )
    .await;

    let config = create_test_config(&base_url, dir.path());
    let products_path = config.output.products_path();

    let mut coordinator = run_coordinator(config, Vec::new());
    coordinator.run().await.expect("Crawl failed");

    let rows = read_rows(&products_path);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][10], format!("{}/new-name.html", base_url));
}
