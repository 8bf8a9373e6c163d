//! Record keeping for a small grow: plants and their lifecycle stage, feedings,
//! strains, expenses, sales and seed stock, with an Excel export.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod logger;
pub mod models;
pub mod session;
pub mod stage;

pub use db::{Collection, GrowStore, PlantRow, PlantUpdate, Snapshot};
pub use error::{Result, TrackerError};
pub use stage::{compute_stage, Stage};
