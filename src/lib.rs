pub mod chart;
pub mod client;
pub mod config;
pub mod controller;
pub mod format;
pub mod output;
pub mod session;
pub mod views;

#[cfg(test)]
pub(crate) mod fixtures;
