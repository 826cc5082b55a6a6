//! Command-line interface

mod args;
pub mod commands;

pub use args::{
    CacheAction, CacheArgs, Cli, Commands, ConfigAction, ConfigArgs, GetArgs, OutputFormat,
};
