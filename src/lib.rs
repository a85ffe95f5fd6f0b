pub mod config;
pub mod contract;
pub mod dashboard;
pub mod domain;
pub mod helpers;
pub mod interactions;
pub mod logging;
pub mod sim;
pub mod store;
