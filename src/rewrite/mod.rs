//! Link rewriting module
//!
//! Turns fetched pages and downloaded stylesheets and scripts into files that
//! reference each other through relative local paths. Rewriting only reads
//! the URL table; it runs after every page and asset was registered.

mod css;
mod html;
mod resolver;
mod script;

pub use css::rewrite_css;
pub use html::rewrite_html;
pub use resolver::{fix_protocol_and_local_links, LinkResolver};
pub use script::clean_script;

use crate::html::strip_artifacts;
use crate::mapper::PathMapper;
use crate::state::{PageRecord, UrlTable};
use crate::url::SiteScope;
use std::path::Path;

/// Counts of the file-scoped stylesheet and script passes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticRewriteStats {
    /// Stylesheets whose content changed
    pub css_rewritten: usize,
    /// Scripts whose archive URLs were un-wrapped
    pub scripts_cleaned: usize,
    /// Files that could not be read or written
    pub skipped: usize,
}

/// Rewrites pages and static files against the global URL table
#[derive(Debug)]
pub struct Rewriter<'a> {
    table: &'a UrlTable,
    mapper: &'a PathMapper,
    scope: &'a SiteScope,
}

impl<'a> Rewriter<'a> {
    /// Creates a rewriter over a finished URL table
    pub fn new(table: &'a UrlTable, mapper: &'a PathMapper, scope: &'a SiteScope) -> Self {
        Self {
            table,
            mapper,
            scope,
        }
    }

    /// Builds the resolver for one file
    pub fn resolver_for(&self, local_path: &Path, base_url: Option<&str>) -> LinkResolver<'a> {
        LinkResolver::new(self.table, self.mapper, self.scope, local_path, base_url)
    }

    /// Produces the final markup of a page
    ///
    /// Artifacts are stripped again so the rewriter is safe on raw captures.
    /// If streaming rewriting fails the stripped markup is returned as is.
    pub fn rewrite_page(&self, record: &PageRecord) -> String {
        let html = strip_artifacts(&record.html);
        let resolver = self.resolver_for(&record.local_path, Some(&record.url));

        match rewrite_html(&html, &resolver) {
            Ok(rewritten) => rewritten,
            Err(e) => {
                tracing::warn!("Could not rewrite links in {}: {}", record.url, e);
                html
            }
        }
    }

    /// Rewrites a downloaded stylesheet in place
    ///
    /// Returns `Ok(true)` if the file changed. Non-UTF-8 files are skipped.
    pub fn rewrite_css_file(&self, path: &Path) -> std::io::Result<bool> {
        let Some(css) = read_text(path)? else {
            return Ok(false);
        };

        let base_url = self.table.source_for(path);
        let resolver = self.resolver_for(path, base_url.as_deref());
        let rewritten = rewrite_css(&css, &resolver);
        if rewritten == css {
            return Ok(false);
        }

        std::fs::write(path, rewritten.as_bytes())?;
        Ok(true)
    }

    /// Un-wraps archive URLs in a downloaded script in place
    ///
    /// The file is only written when its text changed.
    pub fn rewrite_script_file(&self, path: &Path) -> std::io::Result<bool> {
        let Some(script) = read_text(path)? else {
            return Ok(false);
        };

        let cleaned = clean_script(&script);
        if cleaned == script {
            return Ok(false);
        }

        std::fs::write(path, cleaned.as_bytes())?;
        Ok(true)
    }

    /// Runs the stylesheet and script passes over every file under `root`
    ///
    /// Per-file failures are logged and skipped.
    pub fn rewrite_static_files(&self, root: &Path) -> StaticRewriteStats {
        let mut stats = StaticRewriteStats::default();

        let files = jwalk::WalkDir::new(root)
            .skip_hidden(false)
            .sort(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.path());

        for path in files {
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase);

            let result = match extension.as_deref() {
                Some("css") => self
                    .rewrite_css_file(&path)
                    .map(|changed| stats.css_rewritten += usize::from(changed)),
                Some("js") => self
                    .rewrite_script_file(&path)
                    .map(|changed| stats.scripts_cleaned += usize::from(changed)),
                _ => continue,
            };

            if let Err(e) = result {
                tracing::warn!("Could not rewrite {}: {}", path.display(), e);
                stats.skipped += 1;
            }
        }

        tracing::info!(
            "Rewrote {} stylesheets and cleaned {} scripts",
            stats.css_rewritten,
            stats.scripts_cleaned
        );
        stats
    }
}

/// Reads a file as UTF-8, returning `None` for undecodable content
fn read_text(path: &Path) -> std::io::Result<Option<String>> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(Some(text)),
        Err(_) => {
            tracing::debug!("Skipping non-UTF-8 file {}", path.display());
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        table: UrlTable,
        mapper: PathMapper,
        scope: SiteScope,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let mapper = PathMapper::new(dir.path());
            Self {
                dir,
                table: UrlTable::new(),
                mapper,
                scope: SiteScope::new("site.test"),
            }
        }

        fn write(&self, relative: &str, content: &[u8]) -> std::path::PathBuf {
            let path = self.dir.path().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }

        fn rewriter(&self) -> Rewriter<'_> {
            Rewriter::new(&self.table, &self.mapper, &self.scope)
        }
    }

    #[test]
    fn test_rewrite_page() {
        let fx = Fixture::new();
        let index = fx.dir.path().join("index.html");
        fx.table.insert("http://site.test/", index.clone());
        fx.table
            .insert("http://site.test/css/site.css", fx.dir.path().join("css/site.css"));

        let record = PageRecord {
            url: "http://site.test/".to_string(),
            timestamp: "20170509211847".to_string(),
            html: r#"<link rel="stylesheet" href="https://web.archive.org/web/20170509211847cs_/http://site.test/css/site.css"><a href="/index.php?action=events">Events</a>"#.to_string(),
            local_path: index,
        };

        assert_eq!(
            fx.rewriter().rewrite_page(&record),
            r#"<link rel="stylesheet" href="css/site.css"><a href="events.html">Events</a>"#
        );
    }

    #[test]
    fn test_css_file_pass() {
        let fx = Fixture::new();
        let css = fx.write("css/style.css", b"body { background: url(/images/bg.png) }");
        fx.table.insert("http://site.test/css/style.css", css.clone());
        fx.table
            .insert("http://site.test/images/bg.png", fx.dir.path().join("images/bg.png"));

        assert!(fx.rewriter().rewrite_css_file(&css).unwrap());
        assert_eq!(
            fs::read_to_string(&css).unwrap(),
            r#"body { background: url("../images/bg.png") }"#
        );
    }

    #[test]
    fn test_script_written_only_when_changed() {
        let fx = Fixture::new();
        let wrapped = fx.write(
            "js/a.js",
            b"var u = 'https://web.archive.org/web/2017js_/http://site.test/x.png';",
        );
        let plain = fx.write("js/b.js", b"var u = '/x.png';");

        let rewriter = fx.rewriter();
        assert!(rewriter.rewrite_script_file(&wrapped).unwrap());
        assert!(!rewriter.rewrite_script_file(&plain).unwrap());
        assert_eq!(
            fs::read_to_string(&wrapped).unwrap(),
            "var u = 'http://site.test/x.png';"
        );
    }

    #[test]
    fn test_static_pass_skips_non_utf8() {
        let fx = Fixture::new();
        fx.write("css/binary.css", &[0xff, 0xfe, 0x00, 0x75, 0x72, 0x6c]);
        fx.write("css/ok.css", b"a { background: url(https://web.archive.org/web/2017im_/http://cdn.example.com/a.png) }");
        fx.write("js/app.js", b"var base = 'https://web.archive.org/web/2017/http://site.test/';");
        fx.write("img/logo.png", &[0x89, 0x50, 0x4e, 0x47]);

        let stats = fx.rewriter().rewrite_static_files(fx.dir.path());
        assert_eq!(stats.css_rewritten, 1);
        assert_eq!(stats.scripts_cleaned, 1);
        assert_eq!(stats.skipped, 0);
        assert_eq!(
            fs::read(fx.dir.path().join("css/binary.css")).unwrap(),
            vec![0xff, 0xfe, 0x00, 0x75, 0x72, 0x6c]
        );
        assert_eq!(
            fs::read_to_string(fx.dir.path().join("css/ok.css")).unwrap(),
            r#"a { background: url("http://cdn.example.com/a.png") }"#
        );
    }
}
