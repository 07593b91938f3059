//! Root entry file pointing at the mirrored site's entry page

use std::path::{Path, PathBuf};

/// Conventional page names tried when the entry page is unavailable
const FALLBACK_ENTRY_NAMES: &[&str] = &["home.html", "main.html"];

/// What happened to the root `index.html`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// A redirect file was written pointing at `target`
    Written { target: String },
    /// The root `index.html` is a real page and was left alone
    RootIsPage,
    /// No page to redirect to was found
    NoTarget,
}

/// Builds the redirect page markup
///
/// # Example
///
/// ```
/// use wayback_mirror::output::redirect_html;
///
/// let html = redirect_html("www/index.html", "Example.org");
/// assert!(html.contains(r#"<meta http-equiv="refresh" content="0; url=www/index.html">"#));
/// assert!(html.contains("<title>Redirecting to Example.org Archive</title>"));
/// ```
pub fn redirect_html(target: &str, title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta http-equiv="refresh" content="0; url={target}">
    <title>Redirecting to {title} Archive</title>
</head>
<body>
    <p>Redirecting to <a href="{target}">{target}</a>...</p>
</body>
</html>
"#
    )
}

/// Picks the page the root `index.html` should redirect to
///
/// # Rules
///
/// 1. An entry page stored somewhere other than the root file is the target
/// 2. An entry page stored as the root file needs no redirect
/// 3. Otherwise, if no root file exists, the first existing fallback name
///    (`home.html`, `main.html`) is the target
pub fn redirect_target(output_root: &Path, entry_path: Option<&Path>) -> Result<String, RedirectOutcome> {
    let root_index = output_root.join("index.html");

    if let Some(entry) = entry_path {
        if entry == root_index {
            return Err(RedirectOutcome::RootIsPage);
        }
        if let Some(target) = relative_to_root(output_root, entry) {
            return Ok(target);
        }
    }

    if root_index.exists() {
        return Err(RedirectOutcome::RootIsPage);
    }

    FALLBACK_ENTRY_NAMES
        .iter()
        .map(|name| output_root.join(name))
        .find(|candidate| candidate.exists())
        .and_then(|candidate| relative_to_root(output_root, &candidate))
        .ok_or(RedirectOutcome::NoTarget)
}

/// Writes the root redirect file if one is needed
///
/// # Arguments
///
/// * `output_root` - Root of the generated site
/// * `entry_path` - Local path of the entry page, if it was stored
/// * `title` - Site name shown in the page title
pub async fn write_redirect(
    output_root: &Path,
    entry_path: Option<&Path>,
    title: &str,
) -> std::io::Result<RedirectOutcome> {
    let root = output_root.to_path_buf();
    let entry = entry_path.map(Path::to_path_buf);
    let lookup = tokio::task::spawn_blocking(move || redirect_target(&root, entry.as_deref()))
        .await
        .map_err(std::io::Error::other)?;

    let target = match lookup {
        Ok(target) => target,
        Err(outcome) => {
            match outcome {
                RedirectOutcome::NoTarget => {
                    tracing::warn!("No entry page found, root index.html not created")
                }
                _ => tracing::info!("Entry page is the root index.html, no redirect needed"),
            }
            return Ok(outcome);
        }
    };

    let index_path: PathBuf = output_root.join("index.html");
    super::write_file(&index_path, redirect_html(&target, title)).await?;
    tracing::info!("Created index.html -> {}", target);

    Ok(RedirectOutcome::Written { target })
}

/// Path of `path` below `root` with `/` separators
fn relative_to_root(root: &Path, path: &Path) -> Option<String> {
    let relative = pathdiff::diff_paths(path, root)?;
    Some(relative.to_string_lossy().replace('\\', "/"))
}
