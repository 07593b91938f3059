//! Archive index (CDX) queries
//!
//! Enumerates the HTML captures of the site around the snapshot timestamp so
//! discovery starts from every page the archive knows about, not only the
//! ones reachable by links.

use crate::crawler::frontier::PageCandidate;
use crate::url::SiteScope;
use crate::MirrorError;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::collections::HashMap;

/// Fields requested from the index, in row order
const INDEX_FIELDS: &[&str] = &["original", "timestamp", "mimetype"];

/// Builder for CDX search URLs
#[derive(Debug, Clone)]
pub struct IndexQuery {
    endpoint: String,
    url_pattern: String,
    fields: Vec<String>,
    filters: Vec<String>,
    from_date: Option<String>,
    to_date: Option<String>,
}

impl IndexQuery {
    /// Creates a query for a URL prefix pattern such as `example.org/*`
    pub fn new(endpoint: impl Into<String>, url_pattern: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            url_pattern: url_pattern.into(),
            fields: Vec::new(),
            filters: Vec::new(),
            from_date: None,
            to_date: None,
        }
    }

    /// Sets the returned fields (`fl=`)
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Appends a filter (`filter=`)
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// Restricts captures to a date window (`from=` / `to=`)
    pub fn window(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from_date = Some(from.into());
        self.to_date = Some(to.into());
        self
    }

    /// Query parameters in request order
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("url", self.url_pattern.clone()),
            ("output", "json".to_string()),
        ];

        if !self.fields.is_empty() {
            params.push(("fl", self.fields.join(",")));
        }
        params.extend(self.filters.iter().map(|f| ("filter", f.clone())));
        if let Some(from) = &self.from_date {
            params.push(("from", from.clone()));
        }
        if let Some(to) = &self.to_date {
            params.push(("to", to.clone()));
        }

        params
    }

    /// Prepares the GET request against the index endpoint
    pub fn request(&self, client: &Client) -> RequestBuilder {
        client.get(&self.endpoint).query(&self.params())
    }
}

/// Parses a CDX JSON body into data rows (header row removed)
///
/// An empty body is treated as an empty result rather than an error.
pub fn parse_index_rows(body: &str) -> Result<Vec<Vec<String>>, MirrorError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<Vec<String>> = serde_json::from_str(body)
        .map_err(|e| MirrorError::Index(format!("Failed to parse index JSON: {}", e)))?;

    Ok(rows.into_iter().skip(1).collect())
}

/// Picks one timestamp per HTML page: the capture closest to `snapshot`
///
/// Rows need at least `[original, timestamp]`; the optional third column is
/// the mimetype, and only HTML or unspecified mimetypes are kept. Pages keep
/// the order in which they first appear.
pub fn select_closest(rows: &[Vec<String>], snapshot: &str) -> Vec<PageCandidate> {
    let target = timestamp_value(snapshot);
    let mut order: Vec<&str> = Vec::new();
    let mut best: HashMap<&str, &str> = HashMap::new();

    for row in rows {
        let (Some(original), Some(timestamp)) = (row.first(), row.get(1)) else {
            continue;
        };
        let mimetype = row.get(2).map(String::as_str).unwrap_or("");
        if !(mimetype.is_empty() || mimetype.contains("text/html")) {
            continue;
        }
        let Some(value) = timestamp_value(timestamp) else {
            continue;
        };

        match best.get(original.as_str()).copied() {
            None => {
                order.push(original);
                best.insert(original, timestamp);
            }
            Some(current) => {
                if let (Some(target), Some(current_value)) = (target, timestamp_value(current)) {
                    if value.abs_diff(target) < current_value.abs_diff(target) {
                        best.insert(original, timestamp);
                    }
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|url| {
            best.get(url).map(|ts| PageCandidate {
                url: url.to_string(),
                timestamp: ts.to_string(),
            })
        })
        .collect()
}

/// Numeric value of a timestamp right-padded with zeros to 14 digits
fn timestamp_value(timestamp: &str) -> Option<u64> {
    if timestamp.is_empty() || timestamp.len() > 14 || !timestamp.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    format!("{:0<14}", timestamp).parse().ok()
}

/// Enumerates candidate pages for the site around the snapshot
///
/// Queries the `www.` and apex host forms for captures on the snapshot's
/// day; if that yields nothing, repeats the queries for the whole year.
/// Index failures are logged and count as "no captures".
pub async fn enumerate_pages(
    client: &Client,
    endpoint: &str,
    scope: &SiteScope,
    snapshot: &str,
) -> Vec<PageCandidate> {
    let day = &snapshot[..snapshot.len().min(8)];
    let pages = query_window(client, endpoint, scope, snapshot, day).await;
    if !pages.is_empty() {
        return pages;
    }

    let year = &snapshot[..snapshot.len().min(4)];
    tracing::info!(
        "No captures found for {}, searching the whole of {}",
        day,
        year
    );
    query_window(client, endpoint, scope, snapshot, year).await
}

async fn query_window(
    client: &Client,
    endpoint: &str,
    scope: &SiteScope,
    snapshot: &str,
    window: &str,
) -> Vec<PageCandidate> {
    let mut pages = Vec::new();

    for pattern in scope.index_patterns() {
        let query = IndexQuery::new(endpoint, pattern.as_str())
            .fields(INDEX_FIELDS)
            .filter("statuscode:200")
            .window(window, window);

        match fetch_rows(client, &query).await {
            Ok(rows) => {
                let selected = select_closest(&rows, snapshot);
                tracing::debug!(
                    "Index returned {} rows ({} pages) for {}",
                    rows.len(),
                    selected.len(),
                    pattern
                );
                pages.extend(selected);
            }
            Err(e) => tracing::warn!("Index query for {} failed: {}", pattern, e),
        }
    }

    pages
}

async fn fetch_rows(client: &Client, query: &IndexQuery) -> Result<Vec<Vec<String>>, MirrorError> {
    let request = query.request(client).build()?;
    let url = request.url().to_string();

    let response = client
        .execute(request)
        .await
        .map_err(|source| MirrorError::Http {
            url: url.clone(),
            source,
        })?;

    if response.status() != StatusCode::OK {
        return Err(MirrorError::Index(format!(
            "index returned HTTP {}",
            response.status().as_u16()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|source| MirrorError::Http { url, source })?;

    parse_index_rows(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_query() {
        let request = IndexQuery::new("https://web.archive.org/cdx/search/cdx", "www.example.org/*")
            .fields(INDEX_FIELDS)
            .filter("statuscode:200")
            .window("20170509", "20170509")
            .request(&Client::new())
            .build()
            .unwrap();

        assert_eq!(request.url().path(), "/cdx/search/cdx");
        let pairs: Vec<(String, String)> = request.url().query_pairs().into_owned().collect();
        let expected = [
            ("url", "www.example.org/*"),
            ("output", "json"),
            ("fl", "original,timestamp,mimetype"),
            ("filter", "statuscode:200"),
            ("from", "20170509"),
            ("to", "20170509"),
        ];
        assert_eq!(
            pairs,
            expected
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_parse_index_rows() {
        let body = r#"[["original","timestamp","mimetype"],
            ["http://example.org/","20170509211847","text/html"]]"#;
        let rows = parse_index_rows(body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "http://example.org/");

        assert!(parse_index_rows("").unwrap().is_empty());
        assert!(parse_index_rows("[]").unwrap().is_empty());
        assert!(parse_index_rows("not json").is_err());
    }

    #[test]
    fn test_select_closest_prefers_nearest_capture() {
        let rows = vec![
            row(&["http://example.org/a", "20170509000000", "text/html"]),
            row(&["http://example.org/b", "20170509100000", "text/html; charset=utf-8"]),
            row(&["http://example.org/a", "20170509211000", "text/html"]),
            row(&["http://example.org/a", "20170509235959", "text/html"]),
        ];

        let pages = select_closest(&rows, "20170509211847");
        assert_eq!(
            pages,
            vec![
                PageCandidate {
                    url: "http://example.org/a".to_string(),
                    timestamp: "20170509211000".to_string(),
                },
                PageCandidate {
                    url: "http://example.org/b".to_string(),
                    timestamp: "20170509100000".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_select_closest_filters_mimetypes() {
        let rows = vec![
            row(&["http://example.org/style.css", "20170509000000", "text/css"]),
            row(&["http://example.org/logo.png", "20170509000000", "image/png"]),
            row(&["http://example.org/unknown", "20170509000000", ""]),
            row(&["http://example.org/two-columns", "20170509000000"]),
            row(&["http://example.org/bad-ts", "2017-05-09", "text/html"]),
        ];

        let urls: Vec<_> = select_closest(&rows, "20170509")
            .into_iter()
            .map(|p| p.url)
            .collect();
        assert_eq!(
            urls,
            vec!["http://example.org/unknown", "http://example.org/two-columns"]
        );
    }

    #[test]
    fn test_timestamp_value_pads() {
        assert_eq!(timestamp_value("20170509"), Some(20170509000000));
        assert_eq!(timestamp_value("20170509211847"), Some(20170509211847));
        assert_eq!(timestamp_value("x"), None);
        assert_eq!(timestamp_value(""), None);
    }
}
