use std::fs;

use anyhow::Context;
use clap::Parser;
use ispyb_graphql::{
    config::{Cli, Command},
    schema_sdl, serve_dev_app, serve_prod_app,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().unwrap_or_default();
    let Cli { command } = Cli::parse();

    match command {
        Command::Dev {
            server,
            fixture,
            identity,
        } => serve_dev_app(server, fixture, identity).await?,
        Command::Prod { config, log_dir } => serve_prod_app(config, log_dir).await?,
        Command::Schema { output } => match output {
            Some(path) => {
                fs::write(&path, schema_sdl())
                    .context(format!("failed to write schema to {path}"))?;
            }
            None => println!("{}", schema_sdl()),
        },
    }

    Ok(())
}
