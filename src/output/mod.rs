//! Output module for writing the generated site and reporting on it
//!
//! This module handles:
//! - Writing pages and assets under the output root
//! - Creating the root redirect file
//! - Summarizing a finished run

mod redirect;
pub mod stats;
mod writer;

pub use redirect::{redirect_html, redirect_target, write_redirect, RedirectOutcome};
pub use stats::{print_summary, ArchiveSummary};
pub use writer::write_file;
