use async_graphql::{
    OutputType,
    connection::{Connection, Edge},
};

use crate::db::error::{Error, Result};

pub const DEFAULT_PAGE_SIZE: i32 = 10;

/// Forward-only cursor pagination over primary keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    first: usize,
    after: Option<u32>,
}
impl PageRequest {
    /// # Errors
    /// When `first` is negative or `after` is not a primary key.
    pub fn new(first: i32, after: Option<&str>) -> Result<Self> {
        let first = usize::try_from(first).map_err(|_| Error::InvalidPageSize { first })?;

        let after = after
            .map(|cursor| {
                cursor.parse().map_err(|_| Error::InvalidCursor {
                    cursor: cursor.to_string(),
                })
            })
            .transpose()?;

        Ok(Self { first, after })
    }

    #[must_use]
    pub fn first(&self) -> usize {
        self.first
    }

    /// Exclusive lower bound on the primary key.
    #[must_use]
    pub fn after(&self) -> Option<u32> {
        self.after
    }

    /// One more than requested, so the extra row tells us whether another page exists.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.first + 1
    }

    pub(crate) fn limit_i64(&self) -> i64 {
        i64::try_from(self.limit()).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next_page: bool,
}
impl<T> Page<T> {
    /// Cuts a fetch of up to `first + 1` rows down to one page.
    #[must_use]
    pub fn from_fetched(mut fetched: Vec<T>, first: usize) -> Self {
        let has_next_page = fetched.len() > first;
        fetched.truncate(first);

        Self {
            items: fetched,
            has_next_page,
        }
    }

    pub fn try_map<U, E>(
        self,
        f: impl FnMut(T) -> std::result::Result<U, E>,
    ) -> std::result::Result<Page<U>, E> {
        let Self {
            items,
            has_next_page,
        } = self;

        Ok(Page {
            items: items
                .into_iter()
                .map(f)
                .collect::<std::result::Result<_, _>>()?,
            has_next_page,
        })
    }

    /// Wraps the page into a relay connection whose cursors are decimal primary keys. Start and
    /// end cursors come from the first and last edges.
    pub fn into_connection(self, key: impl Fn(&T) -> u32) -> Connection<String, T>
    where
        T: OutputType,
    {
        let Self {
            items,
            has_next_page,
        } = self;

        let mut connection = Connection::new(false, has_next_page);
        connection.edges.extend(
            items
                .into_iter()
                .map(|item| Edge::new(key(&item).to_string(), item)),
        );

        connection
    }
}
