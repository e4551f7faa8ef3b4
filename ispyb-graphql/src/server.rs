use std::sync::Arc;

use anyhow::Context;
use axum::{Router, routing::get};
use camino::Utf8PathBuf;
use diesel_async::{
    AsyncMysqlConnection,
    pooled_connection::{AsyncDieselConnectionManager, deadpool::Pool},
};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;

use crate::{
    auth::Identity,
    config::{Config, ServerConfig},
    db::{
        self, Repository,
        local::LocalRepository,
        mysql::{DbPool, MysqlRepository},
    },
    graphql::{self, IspybSchema},
};

mod api;
mod auth;

/// # Errors
pub async fn serve(app_state: AppState) -> anyhow::Result<()> {
    let app_addr = app_state.server_config().app_address();

    let listener = TcpListener::bind(&app_addr)
        .await
        .context(format!("failed to listen on {app_addr}"))?;
    tracing::info!("ispyb-graphql listening on {app_addr}");

    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("failed to serve app")?;

    Ok(())
}

pub fn initialize_logging(log_dir: Option<Utf8PathBuf>) {
    use tracing::Level;
    use tracing_subscriber::{filter::Targets, prelude::*};

    let log_layer = tracing_subscriber::fmt::layer();

    match log_dir {
        None => {
            let dev_log_filter = Targets::new()
                .with_target("ispyb_graphql", Level::DEBUG)
                .with_target("async_graphql", Level::DEBUG)
                .with_target("tower_http", Level::TRACE);
            let log_layer = log_layer.pretty().with_filter(dev_log_filter);

            tracing_subscriber::registry().with(log_layer).init();
        }
        Some(path) => {
            let log_writer = tracing_appender::rolling::daily(path, "ispyb-graphql.log");
            let prod_log_filter = Targets::new()
                .with_target("ispyb_graphql", Level::INFO)
                .with_target("tower_http", Level::INFO);
            let log_layer = log_layer
                .json()
                .with_writer(log_writer)
                .with_filter(prod_log_filter);

            tracing_subscriber::registry().with(log_layer).init();
        }
    }
}

#[derive(Clone)]
pub enum AppState {
    Dev {
        repository: LocalRepository,
        identity: Option<Identity>,
        schema: IspybSchema,
        server: Arc<ServerConfig>,
    },
    Prod {
        db_pool: DbPool,
        schema: IspybSchema,
        server: Arc<ServerConfig>,
    },
}
impl AppState {
    /// Serves `repository`. When `identity` is given, every request is made as that login.
    #[must_use]
    pub fn dev(
        server: ServerConfig,
        repository: LocalRepository,
        identity: Option<Identity>,
    ) -> Self {
        Self::Dev {
            repository,
            identity,
            schema: graphql::schema(),
            server: Arc::new(server),
        }
    }

    /// # Errors
    pub fn prod(config: &Config) -> anyhow::Result<Self> {
        let db_config = AsyncDieselConnectionManager::<AsyncMysqlConnection>::new(
            config.db_url().context("failed to build database url")?,
        );
        let db_pool = Pool::builder(db_config)
            .max_size(config.db_pool_size())
            .build()
            .context("failed to build database connection pool")?;

        Ok(Self::Prod {
            db_pool,
            schema: graphql::schema(),
            server: Arc::new(config.server().clone()),
        })
    }

    fn schema(&self) -> &IspybSchema {
        use AppState::{Dev, Prod};

        match self {
            Dev { schema, .. } | Prod { schema, .. } => schema,
        }
    }

    fn server_config(&self) -> &ServerConfig {
        use AppState::{Dev, Prod};

        match self {
            Dev { server, .. } | Prod { server, .. } => server,
        }
    }

    /// A repository for one request. In production, this holds a pooled connection until dropped.
    async fn repository(&self) -> db::error::Result<Arc<dyn Repository>> {
        use AppState::{Dev, Prod};

        match self {
            Dev { repository, .. } => Ok(Arc::new(repository.clone())),
            Prod { db_pool, .. } => Ok(Arc::new(MysqlRepository::from_pool(db_pool).await?)),
        }
    }
}

pub fn app(app_state: AppState) -> Router {
    api::router()
        .layer(TraceLayer::new_for_http())
        .route("/health", get(async || ()))
        .with_state(app_state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutting down");
}
