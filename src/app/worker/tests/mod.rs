//! Pool-level tests
//!
//! These drive a whole `FetchPool` against an in-memory source to check the
//! concurrency bound, failure isolation and result completeness.
