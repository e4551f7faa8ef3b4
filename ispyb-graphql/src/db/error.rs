use diesel_async::pooled_connection::deadpool;
use serde::Serialize;

#[derive(thiserror::Error, Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Error {
    #[error("{entity} {key} not found")]
    RecordNotFound { entity: String, key: String },
    #[error("{name:?} is not a valid {entity} name")]
    InvalidName { entity: String, name: String },
    #[error("{cursor:?} is not a valid cursor")]
    InvalidCursor { cursor: String },
    #[error("page size must not be negative, got {first}")]
    InvalidPageSize { first: i32 },
    #[error("end of time window ({end}) must be after its start ({start})")]
    InvalidTimeWindow { start: String, end: String },
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    pub(crate) fn not_found(entity: &str, key: impl ToString) -> Self {
        Self::RecordNotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn from_other_error(err: impl std::fmt::Debug) -> Self {
        Self::Other {
            message: format!("{err:?}"),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound { .. })
    }

    /// Whether this error was caused by the caller's input rather than the database.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidName { .. }
                | Self::InvalidCursor { .. }
                | Self::InvalidPageSize { .. }
                | Self::InvalidTimeWindow { .. }
        )
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::Error::NotFound;

        match err {
            NotFound => Self::RecordNotFound {
                entity: "record".to_string(),
                key: String::new(),
            },
            _ => Self::from_other_error(err),
        }
    }
}

impl From<deadpool::PoolError> for Error {
    fn from(err: deadpool::PoolError) -> Self {
        Self::from_other_error(err)
    }
}

impl From<diesel::ConnectionError> for Error {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::from_other_error(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
