//! fitdump_core: uoffisiell klient for fitbit.com sine web-endepunkter.
//!
//! [`Session`] eier innloggingen (cookies, bruker-id); [`Client`] henter
//! intradag-serier og aktivitetslogger oppå den; [`archive`] skriver dem ut
//! som CSV per dag.

pub mod activity;
pub mod archive;
pub mod client;
pub mod config;
pub mod error;
pub mod graph;
pub mod intraday;
pub mod models;
pub mod observer;
pub mod scrape;
pub mod session;
pub mod xml;

pub use activity::ActivityRecord;
pub use archive::{Archive, DumpSummary, Metric, MetricSource};
pub use client::Client;
pub use config::{ClientConfig, DumpConfig};
pub use error::{Error, Result};
pub use intraday::IntradayMetric;
pub use models::{ActivityLogEntry, ActivityLogSample, Sample, Series};
pub use observer::{LogObserver, Method, MetricsObserver, ObserverSet, RequestObserver};
pub use session::Session;
