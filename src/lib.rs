// lazyorg: memoized GitHub organization lookups and lazy batch reads over MySQL.

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod github;
pub mod nested;
pub mod store;

pub use batch::{
    Page, Paginator, Row, RowSource, batch_processing, filter_batches, lazy_paginate, older_than,
    stream_batches,
};
pub use config::Config;
pub use error::{LazyOrgError, Result};
pub use github::{GitHubClient, JsonSource, OrgClient, has_license};
pub use nested::access_nested_map;
pub use store::UserStore;

/// Initialise `env_logger`, honouring `RUST_LOG` and defaulting to `info`.
pub fn init_logging() {
    let mut logger_builder = env_logger::builder();
    match std::env::var("RUST_LOG") {
        Ok(rust_log) => {
            logger_builder.parse_filters(&rust_log);
        }
        Err(_) => {
            logger_builder.filter_level(log::LevelFilter::Info);
        }
    }
    let _ = logger_builder.try_init();
    log::debug!("max logging level is {}", log::max_level());
}
