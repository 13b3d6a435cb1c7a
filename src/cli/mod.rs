//! CLI module for the decision engine
//!
//! Provides subcommands for the two entry points:
//! - `serve`: run the HTTP API server
//! - `run`: execute one decision synchronously and print the summary

pub mod run;
pub mod serve;

use clap::{Parser, Subcommand};

/// Decision Engine - evaluator-gated decision workflows over LLMs
#[derive(Parser)]
#[command(name = "decision-engine")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Run one decision synchronously and print the result
    Run(run::RunArgs),
}
