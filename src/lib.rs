//! # tsbridge: Time-Series Data-Movement Pipelines
//!
//! tsbridge moves data between a time-series database service and
//! external systems. It ships two independent, non-interacting
//! pipelines:
//!
//! - [`export::ColumnExporter`] queries a single column from the
//!   database and writes it to a local numeric text file, one value
//!   per line.
//! - [`import::MetricsImporter`] enumerates historical runs from an
//!   experiment-tracking service and replays each run's metric history
//!   into the database, one table per run.
//!
//! Both pipelines are strictly sequential: every call to a collaborator
//! service is awaited to completion before the next one is issued.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tsbridge::config::ExportConfig;
//! use tsbridge::export::ColumnExporter;
//!
//! # async fn example() -> tsbridge::Result<()> {
//! let exporter = ColumnExporter::new(ExportConfig::default());
//! let path = exporter.export("episode_reward[env=xor]").await?;
//! println!("wrote {}", path.display());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod import;
pub mod retry;
pub mod series;
pub mod tracking;

pub use error::{Error, Result};
