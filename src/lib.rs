pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod platform;
pub mod store;
pub mod switcher;
#[cfg(test)]
mod test_utils;
pub mod window;
