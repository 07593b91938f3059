//! Run summary
//!
//! Collects the counters of one archive run and prints them for the CLI.

use std::path::PathBuf;
use std::time::Duration;

/// Summary of a finished archive run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Root of the generated site
    pub output_root: PathBuf,

    /// Pages fetched and written
    pub pages_stored: usize,

    /// Pages sharing the local file of another stored page
    pub pages_aliased: usize,

    /// Pages the archive could not serve
    pub pages_failed: usize,

    /// Queued pages outside the site
    pub pages_off_site: usize,

    /// True if the page cap stopped discovery early
    pub capped: bool,

    /// Assets selected for download
    pub assets_requested: usize,

    /// Assets fetched and written
    pub assets_saved: usize,

    /// Assets that could not be fetched or written
    pub assets_failed: usize,

    /// Dispatch URLs given generated file names
    pub dispatch_mappings: usize,

    /// Stylesheets changed by the CSS pass
    pub css_rewritten: usize,

    /// Scripts changed by the script pass
    pub scripts_cleaned: usize,

    /// Local path of the entry page relative to the output root
    pub entry_path: Option<String>,

    /// Target of the root redirect file, if one was written
    pub redirect_target: Option<String>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl ArchiveSummary {
    /// Share of attempted pages that ended up on disk, in percent
    pub fn page_success_rate(&self) -> f64 {
        let attempted = self.pages_stored + self.pages_failed;
        if attempted == 0 {
            0.0
        } else {
            (self.pages_stored as f64 / attempted as f64) * 100.0
        }
    }

    /// Share of requested assets that ended up on disk, in percent
    pub fn asset_success_rate(&self) -> f64 {
        if self.assets_requested == 0 {
            0.0
        } else {
            (self.assets_saved as f64 / self.assets_requested as f64) * 100.0
        }
    }
}

/// Prints the run summary to stdout
pub fn print_summary(summary: &ArchiveSummary) {
    println!("=== Archive Summary ===\n");

    println!("Output:");
    println!("  Directory: {}", summary.output_root.display());
    if let Some(entry) = &summary.entry_path {
        println!("  Entry page: {}", entry);
    }
    match &summary.redirect_target {
        Some(target) => println!("  index.html -> {}", target),
        None => println!("  index.html: no redirect"),
    }
    println!();

    println!("Pages:");
    println!("  Stored: {}", summary.pages_stored);
    println!("  Aliased: {}", summary.pages_aliased);
    println!("  Failed: {}", summary.pages_failed);
    println!("  Off-site: {}", summary.pages_off_site);
    if summary.capped {
        println!("  Page cap reached; some queued pages were not fetched");
    }
    println!();

    println!("Assets:");
    println!("  Requested: {}", summary.assets_requested);
    println!("  Saved: {}", summary.assets_saved);
    println!("  Failed: {}", summary.assets_failed);
    println!();

    println!("Rewriting:");
    println!("  Dispatch mappings: {}", summary.dispatch_mappings);
    println!("  Stylesheets rewritten: {}", summary.css_rewritten);
    println!("  Scripts cleaned: {}", summary.scripts_cleaned);
    println!();

    println!(
        "Success Rate: {:.1}% of pages, {:.1}% of assets ({:.1}s)",
        summary.page_success_rate(),
        summary.asset_success_rate(),
        summary.elapsed.as_secs_f64()
    );
}
