pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod trading;
pub mod utils;
pub mod validation;

pub use error::{Error, Result};
