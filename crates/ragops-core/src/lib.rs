//! Configuration types shared across all ragops crates.

pub mod config;

pub use config::{
    CleanupConfig, ConfigError, IndexConfig, PollConfig, RollbackConfig, Settings,
    WorkspaceConfig, parse_flag_pairs,
};
