use async_graphql::ErrorExtensions;
use url::Url;

use crate::db;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Database(#[from] db::error::Error),
    #[error("you must be logged in to see this")]
    LoginRequired { login_url: Option<Url> },
    #[error("you do not have permission to see this")]
    Forbidden,
}
impl Error {
    /// The `code` extension clients can match on.
    #[must_use]
    pub fn code(&self) -> &'static str {
        use db::error::Error::{
            InvalidCursor, InvalidName, InvalidPageSize, InvalidTimeWindow, Other, RecordNotFound,
        };

        match self {
            Self::LoginRequired { .. } => "LOGIN_REQUIRED",
            Self::Forbidden => "FORBIDDEN",
            Self::Database(inner) => match inner {
                RecordNotFound { .. } => "NOT_FOUND",
                InvalidName { .. }
                | InvalidCursor { .. }
                | InvalidPageSize { .. }
                | InvalidTimeWindow { .. } => "BAD_USER_INPUT",
                Other { .. } => "INTERNAL_SERVER_ERROR",
            },
        }
    }
}

impl ErrorExtensions for Error {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();

        let message = if code == "INTERNAL_SERVER_ERROR" {
            tracing::error!(error = %self, "failed to resolve field");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        async_graphql::Error::new(message).extend_with(|_, extensions| {
            extensions.set("code", code);

            if let Self::LoginRequired {
                login_url: Some(login_url),
            } = self
            {
                extensions.set("loginUrl", login_url.as_str());
            }
        })
    }
}

/// Converts any of this crate's errors into a GraphQL field error carrying its code.
pub(crate) trait IntoFieldResult<T> {
    fn into_field(self) -> async_graphql::Result<T>;
}

impl<T, E> IntoFieldResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn into_field(self) -> async_graphql::Result<T> {
        self.map_err(|err| err.into().extend())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
