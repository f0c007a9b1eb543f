//! Browse a podcast show's episode catalog from a paginated upstream API.
//!
//! podcast-catalog fetches every episode of a show in rate-limited batches,
//! numbers them newest first, caches a number-to-episode mapping per show and
//! serves windows, episode-number lookups and date filters over the result.
//!
//! # Features
//!
//! - Bulk catalog fetch that survives individual page failures
//! - Stable reverse-chronological numbering (newest episode is #1)
//! - Page windows with clamping and position-preserving resize
//! - Episode-number search via upstream search, cached mapping, or full scan
//! - Release-date filters (last 30/90 days, last year, custom range)
//!
//! # Usage
//!
//! ```bash
//! # First page of a show, 10 episodes per page
//! cargo run -- 4rOoJ6Egrf8K2IrywzwOMk
//!
//! # Jump to episode 150
//! cargo run -- 4rOoJ6Egrf8K2IrywzwOMk --episode 150
//!
//! # Episodes from the last 90 days, all on one page
//! cargo run -- 4rOoJ6Egrf8K2IrywzwOMk --filter 90days --page-size unlimited
//! ```

pub mod api;
pub mod browser;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod ordering;
pub mod pagination;
pub mod search;
pub mod source;
pub mod types;
