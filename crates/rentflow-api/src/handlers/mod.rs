//! HTTP request handlers

pub mod health;
pub mod utility_bill;

pub use health::configure as configure_health;
pub use utility_bill::configure as configure_utility_bills;
