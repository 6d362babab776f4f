//! Worldloom - command-line client for the worldbuilding backend
//!
//! This crate is the *composition root*: it loads configuration, wires the
//! adapters into the application services and runs one command.

mod cli;
mod composition;
mod run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run::run().await
}
