//! Integration tests for Wayback-Mirror
//!
//! Each test runs a full archive against a wiremock server standing in for
//! both the archive index and the replay endpoint.

mod archive_tests;
