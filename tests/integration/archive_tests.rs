//! End-to-end archive runs against a mocked archive host

use std::path::Path;
use tempfile::TempDir;
use wayback_mirror::config::{parse_config, Config};
use wayback_mirror::crawler::run_archive;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SNAPSHOT: &str = "20170509211847";

/// Builds a configuration pointing both archive endpoints at the mock server
fn create_test_config(server: &MockServer, out_dir: &Path, entry_url: &str, extra: &str) -> Config {
    let toml = format!(
        r#"
[site]
domain = "site.test"
entry-url = "{entry_url}"
snapshot = "{SNAPSHOT}"
title = "Site Test"

[crawler]
asset-workers = 2
request-timeout = 5
{extra}

[user-agent]
crawler-name = "TestMirror"
crawler-version = "1.0.0"
contact-email = "test@example.com"

[archive]
index-endpoint = "{uri}/cdx/search/cdx"
replay-endpoint = "{uri}/web"

[output]
directory = "{out}"
"#,
        uri = server.uri(),
        out = out_dir.display(),
    );
    parse_config(&toml).expect("test config is valid")
}

/// CDX JSON body with a header row followed by `(original, timestamp)` rows
fn index_body(rows: &[(&str, &str)]) -> String {
    let mut body = vec![serde_json::json!(["original", "timestamp", "mimetype"])];
    body.extend(
        rows.iter()
            .map(|(url, ts)| serde_json::json!([url, ts, "text/html"])),
    );
    serde_json::Value::Array(body).to_string()
}

/// Mounts a raw capture at `/web/<ts>id_/<original path>`
async fn mount_capture(server: &MockServer, timestamp: &str, original: &str, body: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/web/{}id_/{}", timestamp, original)))
        .respond_with(body)
        .mount(server)
        .await;
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_full_archive_with_dispatch_pages() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/cdx/search/cdx"))
        .and(query_param("from", "20170509"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_body(&[
            ("http://site.test/", SNAPSHOT),
            ("http://site.test/index.php?action=events", "20170509000000"),
        ])))
        .mount(&server)
        .await;

    mount_capture(
        &server,
        SNAPSHOT,
        "http://site.test/",
        html(
            r#"<html><head>
<script src="https://web.archive.org/_static/js/wombat.js"></script>
<link rel="stylesheet" href="/css/site.css">
</head><body>
<!-- BEGIN WAYBACK TOOLBAR INSERT --><div id="wm-ipp">toolbar</div><!-- END WAYBACK TOOLBAR INSERT -->
<a href="index.php?action=events">Events</a>
<img src="https://web.archive.org/web/20170509211847im_/http://site.test/img/logo.png">
<script src="https://cdn.example.com/lib.js"></script>
</body></html>"#,
        ),
    )
    .await;

    // Dispatch query strings travel on the replay URL itself
    Mock::given(method("GET"))
        .and(path("/web/20170509000000id_/http://site.test/index.php"))
        .and(query_param("action", "events"))
        .respond_with(html(
            r#"<html><body><a href="/">Home</a> <a href="index.php?action=contact">Contact</a></body></html>"#,
        ))
        .mount(&server)
        .await;

    mount_capture(
        &server,
        SNAPSHOT,
        "http://site.test/css/site.css",
        ResponseTemplate::new(200).set_body_string(
            "body { background: url(https://web.archive.org/web/20170509211847im_/http://site.test/img/logo.png); }",
        ),
    )
    .await;

    mount_capture(
        &server,
        SNAPSHOT,
        "http://site.test/img/logo.png",
        ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']),
    )
    .await;

    mount_capture(
        &server,
        SNAPSHOT,
        "https://cdn.example.com/lib.js",
        ResponseTemplate::new(200)
            .set_body_string(r#"var api = "https://web.archive.org/web/20170509211847/http://site.test/api";"#),
    )
    .await;

    let config = create_test_config(&server, out.path(), "http://site.test/", "");
    let summary = run_archive(config).await.expect("archive should complete");

    assert_eq!(summary.pages_stored, 2);
    assert_eq!(summary.pages_failed, 1, "the contact page has no capture");
    assert_eq!(summary.assets_requested, 3);
    assert_eq!(summary.assets_saved, 3);
    assert_eq!(summary.css_rewritten, 1);
    assert_eq!(summary.scripts_cleaned, 1);
    assert_eq!(summary.entry_path.as_deref(), Some("index.html"));
    assert_eq!(summary.redirect_target, None, "entry page is the root index");

    let index = std::fs::read_to_string(out.path().join("index.html")).unwrap();
    assert!(index.contains(r#"href="events.html""#), "{}", index);
    assert!(index.contains(r#"href="css/site.css""#), "{}", index);
    assert!(index.contains(r#"src="img/logo.png""#), "{}", index);
    assert!(index.contains(r#"src="lib.js""#), "{}", index);
    assert!(!index.contains("web.archive.org"), "{}", index);
    assert!(!index.contains("wm-ipp"), "{}", index);

    let events = std::fs::read_to_string(out.path().join("events.html")).unwrap();
    assert!(events.contains(r#"href="index.html""#), "{}", events);
    assert!(events.contains(r#"href="contact.html""#), "{}", events);

    let css = std::fs::read_to_string(out.path().join("css/site.css")).unwrap();
    assert!(css.contains("../img/logo.png"), "{}", css);
    assert!(!css.contains("web.archive.org"), "{}", css);

    let script = std::fs::read_to_string(out.path().join("lib.js")).unwrap();
    assert!(script.contains(r#""http://site.test/api""#), "{}", script);

    assert_eq!(
        std::fs::read(out.path().join("img/logo.png")).unwrap(),
        vec![0x89, b'P', b'N', b'G']
    );
}

#[tokio::test]
async fn test_year_fallback_and_redirect() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    // Nothing captured on the snapshot day, for either host form
    Mock::given(method("GET"))
        .and(path("/cdx/search/cdx"))
        .and(query_param("from", "20170509"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cdx/search/cdx"))
        .and(query_param("from", "2017"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(index_body(&[("http://site.test/start/", "20170301000000")])),
        )
        .expect(2)
        .mount(&server)
        .await;

    mount_capture(
        &server,
        "20170301000000",
        "http://site.test/start/",
        html("<html><body><p>Start</p></body></html>"),
    )
    .await;

    let config = create_test_config(&server, out.path(), "http://site.test/start/", "");
    let summary = run_archive(config).await.expect("archive should complete");

    assert_eq!(summary.pages_stored, 1);
    assert_eq!(summary.redirect_target.as_deref(), Some("start/index.html"));

    let index = std::fs::read_to_string(out.path().join("index.html")).unwrap();
    assert!(index.contains(r#"content="0; url=start/index.html""#));
    assert!(index.contains("<title>Redirecting to Site Test Archive</title>"));
    assert!(out.path().join("start/index.html").exists());
}

#[tokio::test]
async fn test_unavailable_entry_page() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/cdx/search/cdx"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = create_test_config(&server, out.path(), "http://site.test/", "");
    let summary = run_archive(config)
        .await
        .expect("resource failures do not abort the run");

    assert_eq!(summary.pages_stored, 0);
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.entry_path, None);
    assert_eq!(summary.redirect_target, None);
    assert!(!out.path().join("index.html").exists());
}

#[tokio::test]
async fn test_page_cap_and_external_assets_disabled() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/cdx/search/cdx"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_body(&[
            ("http://site.test/", SNAPSHOT),
            ("http://site.test/about/", SNAPSHOT),
        ])))
        .mount(&server)
        .await;

    mount_capture(
        &server,
        SNAPSHOT,
        "http://site.test/",
        html(r#"<html><body><a href="/about/">About</a><img src="https://cdn.example.com/x.png"></body></html>"#),
    )
    .await;

    let config = create_test_config(
        &server,
        out.path(),
        "http://site.test/",
        "max-pages = 1\nmirror-external-assets = false",
    );
    let summary = run_archive(config).await.expect("archive should complete");

    assert_eq!(summary.pages_stored, 1);
    assert!(summary.capped);
    assert_eq!(summary.assets_requested, 0);

    let index = std::fs::read_to_string(out.path().join("index.html")).unwrap();
    assert!(index.contains(r#"src="https://cdn.example.com/x.png""#), "{}", index);
    assert!(index.contains(r#"href="about/""#), "{}", index);
    assert!(!out.path().join("about/index.html").exists());
}

#[tokio::test]
async fn test_non_utf8_assets_saved_verbatim() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/cdx/search/cdx"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_body(&[(
            "http://site.test/",
            SNAPSHOT,
        )])))
        .mount(&server)
        .await;

    mount_capture(
        &server,
        SNAPSHOT,
        "http://site.test/",
        html(r#"<html><head><script src="/js/legacy.js"></script><link rel="stylesheet" href="/css/latin1.css"></head><body></body></html>"#),
    )
    .await;

    // Windows-1252 text served without a charset
    let script = b"var s=\"\xE9\"; var u=\"https://web.archive.org/web/2017/http://site.test/x\";".to_vec();
    let css = b"/* caf\xE9 */ body { background: url(/img/bg.png); }".to_vec();

    mount_capture(
        &server,
        SNAPSHOT,
        "http://site.test/js/legacy.js",
        ResponseTemplate::new(200).set_body_raw(script.clone(), "application/javascript"),
    )
    .await;
    mount_capture(
        &server,
        SNAPSHOT,
        "http://site.test/css/latin1.css",
        ResponseTemplate::new(200).set_body_raw(css.clone(), "text/css"),
    )
    .await;

    let config = create_test_config(&server, out.path(), "http://site.test/", "");
    let summary = run_archive(config).await.expect("archive should complete");

    assert_eq!(summary.assets_saved, 2);
    assert_eq!(summary.css_rewritten, 0);
    assert_eq!(summary.scripts_cleaned, 0);
    assert_eq!(std::fs::read(out.path().join("js/legacy.js")).unwrap(), script);
    assert_eq!(std::fs::read(out.path().join("css/latin1.css")).unwrap(), css);
}
