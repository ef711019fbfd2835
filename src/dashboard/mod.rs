//! Dashboard module
//!
//! Provides an overview page with the user's totals, a per-category summary
//! and their transactions, plus the dialog for adding transactions.

mod aggregation;
mod cards;
mod handlers;
mod tables;

pub use handlers::{get_dashboard_page, get_dashboard_summary};
