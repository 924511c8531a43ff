pub mod cli;
pub mod load_config;
pub mod nuxeo;
pub mod registry;
pub mod s3;

pub use cli::{run, Cli, CliOutcome, Commands};
