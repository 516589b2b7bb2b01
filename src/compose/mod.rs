//! Compose manifest parsing and translation
//!
//! A manifest is parsed into [`Manifest`], each service field is normalized
//! by its own module, and [`ManifestTranslator`] assembles the results into
//! the requests the runtime accepts.

pub mod config;
pub mod duration;
pub mod healthcheck;
pub mod networks;
pub mod parser;
pub mod ports;
pub mod translator;
pub mod volumes;

pub use config::{Manifest, ServiceSpec};
pub use parser::ComposeParser;
pub use translator::ManifestTranslator;
