pub mod app;
pub mod aws;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod tui;

#[cfg(test)]
pub(crate) mod testing;
