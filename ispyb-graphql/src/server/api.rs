use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Router,
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
};
use tracing::Instrument;
use uuid::Uuid;

use super::AppState;
use crate::{auth::Identity, graphql::RequestContext};
use error::Result;

mod error;

const GRAPHQL_ENDPOINT: &str = "/graphql";

pub(super) fn router() -> Router<AppState> {
    Router::new().route(GRAPHQL_ENDPOINT, get(graphiql).post(graphql))
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_ENDPOINT).finish())
}

async fn graphql(
    State(app_state): State<AppState>,
    identity: Option<Identity>,
    request: GraphQLRequest,
) -> Result<GraphQLResponse> {
    let request_id = Uuid::now_v7();
    let span = tracing::info_span!(
        "graphql_request",
        %request_id,
        login = identity.as_ref().map(Identity::login)
    );

    execute(app_state, identity, request).instrument(span).await
}

async fn execute(
    app_state: AppState,
    identity: Option<Identity>,
    request: GraphQLRequest,
) -> Result<GraphQLResponse> {
    let repository = app_state.repository().await?;
    let login_url = app_state.server_config().login_url().cloned();

    let context = RequestContext::new(repository, identity, login_url);
    let response = app_state
        .schema()
        .execute(request.into_inner().data(context))
        .await;

    if response.is_err() {
        tracing::warn!(n_errors = response.errors.len(), "request finished with errors");
    }

    Ok(response.into())
}
