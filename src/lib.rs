pub mod assumptions;
pub mod config;
pub mod duration;
pub mod format;
pub mod models;
pub mod valuation;
