use anyhow::Context;
use camino::Utf8PathBuf;

use crate::{
    auth::Identity,
    config::{Config, ServerConfig},
    db::local::LocalRepository,
    server::AppState,
};

pub mod auth;
pub mod config;
pub mod db;
pub mod graphql;
pub mod loader;
pub mod pagination;
pub mod server;
#[cfg(test)]
mod test_util;

/// # Errors
pub async fn serve_dev_app(
    server: ServerConfig,
    fixture: Option<Utf8PathBuf>,
    identity: Option<String>,
) -> anyhow::Result<()> {
    server::initialize_logging(None);

    let repository = match fixture {
        Some(path) => LocalRepository::from_path(&path)?,
        None => LocalRepository::bundled().context("failed to load bundled fixture")?,
    };

    server::serve(AppState::dev(server, repository, identity.map(Identity::new))).await
}

/// # Errors
pub async fn serve_prod_app(
    mut config: Config,
    log_dir: Option<Utf8PathBuf>,
) -> anyhow::Result<()> {
    server::initialize_logging(log_dir);

    config
        .read_credentials()
        .context("failed to read ISPyB credentials")?;

    let app_state = AppState::prod(&config).context("failed to initialize app state")?;
    tracing::info!("initialized app state");

    server::serve(app_state).await
}

/// The schema in GraphQL SDL.
#[must_use]
pub fn schema_sdl() -> String {
    graphql::schema().sdl()
}
