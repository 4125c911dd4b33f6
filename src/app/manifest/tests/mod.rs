//! Tests for manifest retrieval and theme filtering
//!
//! These tests drive the fetcher with an in-memory source and a temporary
//! snapshot file to exercise both the network path and the fallback path.
