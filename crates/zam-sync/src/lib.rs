//! Upstream synchronisation: the Assemblée nationale and Sénat adapters,
//! reconciliation against the store, batches, article refresh and the
//! per-lecture fetch orchestrator.
//!
//! Everything that reaches the network goes through an injected
//! [`HttpClient`]; the live reqwest implementation is behind the `http`
//! feature, and [`testing::StaticClient`] serves canned responses.

pub mod an;
pub mod articles;
pub mod batch;
pub mod clean;
pub mod client;
pub mod config;
pub mod context;
pub mod dates;
mod error;
pub mod opendata;
pub mod orchestrator;
pub mod reconcile;
pub mod senat;
pub mod source;
pub mod tables;
pub mod testing;
pub mod xml;

#[cfg(feature = "http")]
pub mod http;

pub use client::HttpClient;
pub use config::SyncConfig;
pub use context::FetchContext;
pub use error::{BatchError, FetchError};
pub use orchestrator::{Report, fetch_amendement, get_amendements, get_articles, refresh_lecture};
pub use source::FetchResult;
