//! State module for tracking mirror progress
//!
//! # Components
//!
//! - `PageState`: The per-page discovery state machine
//! - `UrlTable`: The shared URL → local path table built during a run
//! - `PageRecord`: A fetched, artifact-stripped page awaiting rewriting

mod page_record;
mod page_state;
mod url_table;

// Re-export main types
pub use page_record::PageRecord;
pub use page_state::PageState;
pub use url_table::UrlTable;
