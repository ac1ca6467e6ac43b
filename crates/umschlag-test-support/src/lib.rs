#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Shared test helpers used across the Umschlag suites.
//! Layout: fixtures.rs (sample records), mocks.rs (in-memory API client).

pub mod fixtures;
pub mod mocks;
