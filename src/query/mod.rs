//! Async data fetching for the UI event loop.
//!
//! `QueryCache` holds list results keyed by their request filter and
//! deduplicates in-flight fetches; `Mutation` is a single-shot write
//! operation. Both report through channels polled once per tick, so no
//! await happens on the UI thread.

mod cache;
mod mutation;

pub use cache::{QueryCache, QuerySnapshot, QueryStatus};
pub use mutation::Mutation;
