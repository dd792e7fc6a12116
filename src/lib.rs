//! # Faraday - Tariff Timeline Engine
//!
//! A Rust implementation of a tariff timeline tracker for UK-style energy
//! supplier tariffs: it records which commercial tariff applied on every
//! moment of an import and an export timeline, fetches the matching unit
//! rates, and answers "what rate applied at time T" queries.
//!
//! ## Features
//!
//! - **Two independent timelines**: import and export periods, mutated and
//!   queried without cross-locking
//! - **Permissive insertion**: historical back-filling is always possible;
//!   gaps and overlaps are advisory validator findings, never errors
//! - **Exact interval algebra**: inclusive period dates, half-open rate
//!   validity, one-day adjacency convention, latest-start tie-breaks
//! - **Tariff-type aware resolution**: fixed, variable, half-hourly Agile,
//!   Economy 7 day/night and Go handled by one exhaustive behavior table
//! - **Supplier API client**: paginated rate and standing-charge fetches
//!   applied atomically, so failures never corrupt existing schedules
//! - **Configuration**: YAML-based configuration with validation
//!
//! ## Architecture
//!
//! The crate follows a modular architecture with clear separation of concerns:
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `model`: Periods, rates, standing charges and the closed tariff enums
//! - `timeline`: Ordered period sequences with insertion/removal/queries
//! - `validator`: Pure gap/overlap/malformed-period analysis
//! - `resolver`: Point-in-time rate and standing-charge resolution
//! - `octopus`: The external rate-fetch contract and its REST client
//! - `store`: Timeline persistence behind a repository seam
//! - `service`: The exposed timeline management API

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod octopus;
pub mod resolver;
pub mod service;
pub mod store;
pub mod timeline;
pub mod validator;

// Re-export commonly used types
pub use config::Config;
pub use error::{FaradayError, Result};
pub use model::{FlowDirection, TariffPeriod, TariffType};
pub use service::TariffService;
pub use timeline::Timeline;
pub use validator::{ValidationReport, validate};
