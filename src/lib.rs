//! Executable test suite for CSW 3.0 catalogue services and their OpenSearch binding.

pub mod assertions;
pub mod capabilities;
pub mod config;
pub mod conformance;
pub mod dataset;
pub mod envelope;
pub mod error;
pub mod http;
pub mod metadata;
pub mod namespaces;
pub mod opensearch;
pub mod protocol;
pub mod report;
pub mod runner;
pub mod suite;
pub mod validation;
pub mod xml;

pub use config::Config;
pub use error::{EtsError, EtsResult};
pub use report::RunReport;
pub use runner::Executor;
pub use suite::SuiteContext;
