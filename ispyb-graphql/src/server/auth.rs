use std::convert::Infallible;

use axum::{extract::OptionalFromRequestParts, http::request::Parts};

use super::AppState;
use crate::auth::Identity;

/// The login forwarded by the authentication proxy, if any. Development servers may instead act
/// as one fixed login.
impl OptionalFromRequestParts<AppState> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        app_state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        if let AppState::Dev {
            identity: Some(identity),
            ..
        } = app_state
        {
            return Ok(Some(identity.clone()));
        }

        let header = app_state.server_config().identity_header();

        let identity = parts
            .headers
            .get(header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|login| !login.is_empty())
            .map(Identity::new);

        if identity.is_none() {
            tracing::debug!(header, "no identity on request");
        }

        Ok(identity)
    }
}
