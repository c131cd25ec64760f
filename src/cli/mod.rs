//! CLI module for the record cache service

pub mod serve;

use clap::{Parser, Subcommand};

/// Record cache API - cache-aside reads over pluggable storage
#[derive(Parser)]
#[command(name = "record-cache-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(serve::ServeArgs),
}
