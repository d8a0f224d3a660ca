// Supermarket sales dashboard: load a sales CSV, filter it, aggregate it and
// export the results. The `sales-dashboard` binary drives these modules.
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod output;
pub mod reports;
pub mod session;
pub mod types;
pub mod util;

#[cfg(test)]
mod fixtures;
