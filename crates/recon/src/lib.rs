//! `joinery-recon`: Schema reconciliation and link restoration.
//!
//! Pure engine crate: receives pre-loaded extracts and template headers,
//! returns template-conformant tables. No CLI or IO dependencies.

pub mod align;
pub mod config;
pub mod engine;
pub mod error;
pub mod link;
pub mod model;
pub mod registry;

pub use config::JoineryConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{Dataset, FinalizedDataset, RecordSet, Reconciliation, SheetKind};
pub use registry::SchemaRegistry;
