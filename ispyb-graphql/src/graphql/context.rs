use std::sync::Arc;

use async_graphql::{Context, ID, connection::Connection};
use url::Url;

use super::{
    entities::{AutoProcessingResult, Container, DataCollection, MergingStatistics, Sample},
    error::{Error, Result},
};
use crate::{
    auth::{self, Access, Identity, Resource},
    db::{self, DataCollectionParent, Repository, model::ScanType, util::align_by_key},
    loader::{BatchFn, BatchLoader},
    pagination::{Page, PageRequest},
};

/// Everything a resolver needs for one request. Dropping it releases the request's connection.
pub struct RequestContext {
    repository: Arc<dyn Repository>,
    identity: Option<Identity>,
    login_url: Option<Url>,
    pub(crate) loaders: Loaders,
}
impl RequestContext {
    pub fn new(
        repository: Arc<dyn Repository>,
        identity: Option<Identity>,
        login_url: Option<Url>,
    ) -> Self {
        Self {
            loaders: Loaders::new(&repository),
            repository,
            identity,
            login_url,
        }
    }

    /// # Errors
    /// When the schema was executed without a request context.
    pub fn get<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Self> {
        ctx.data::<Self>()
    }

    pub fn repository(&self) -> &dyn Repository {
        self.repository.as_ref()
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// # Errors
    /// [`Error::LoginRequired`] or [`Error::Forbidden`] unless the requester may see `resource`.
    pub async fn authorize(&self, resource: Resource<'_>) -> Result<()> {
        match auth::authorize(self.repository(), self.identity(), resource).await? {
            Access::Allowed => Ok(()),
            Access::Unauthenticated => Err(Error::LoginRequired {
                login_url: self.login_url.clone(),
            }),
            Access::Forbidden => Err(Error::Forbidden),
        }
    }

    /// One page of the data collections of `parent`.
    ///
    /// # Errors
    /// On an invalid page request, or when a listed collection cannot be loaded.
    pub async fn data_collection_page(
        &self,
        parent: DataCollectionParent<'_>,
        scan_type: Option<ScanType>,
        first: i32,
        after: Option<ID>,
    ) -> Result<Connection<String, DataCollection>> {
        let request = PageRequest::new(first, after.as_ref().map(|id| id.as_str()))?;

        let ids = self
            .repository
            .data_collection_ids(parent, scan_type, request)
            .await?;
        let Page {
            items: ids,
            has_next_page,
        } = Page::from_fetched(ids, request.first());

        let loaded = self
            .loaders
            .data_collections
            .load_many(ids.iter().copied())
            .await?;

        let page = Page {
            items: ids.into_iter().zip(loaded).collect(),
            has_next_page,
        }
        .try_map(|(dcid, data_collection)| {
            data_collection.ok_or_else(|| db::error::Error::not_found("data collection", dcid))
        })?;

        Ok(page.into_connection(|data_collection| data_collection.dcid))
    }
}

pub struct Loaders {
    pub data_collections: BatchLoader<DataCollectionsById>,
    pub samples: BatchLoader<SamplesById>,
    pub containers: BatchLoader<ContainersById>,
    pub auto_processing_results: BatchLoader<AutoProcessingResultsByDcid>,
    pub merging_statistics: BatchLoader<MergingStatisticsByAutoProcId>,
}
impl Loaders {
    fn new(repository: &Arc<dyn Repository>) -> Self {
        Self {
            data_collections: BatchLoader::new(DataCollectionsById(Arc::clone(repository))),
            samples: BatchLoader::new(SamplesById(Arc::clone(repository))),
            containers: BatchLoader::new(ContainersById(Arc::clone(repository))),
            auto_processing_results: BatchLoader::new(AutoProcessingResultsByDcid(Arc::clone(
                repository,
            ))),
            merging_statistics: BatchLoader::new(MergingStatisticsByAutoProcId(Arc::clone(
                repository,
            ))),
        }
    }
}

pub struct DataCollectionsById(Arc<dyn Repository>);

impl BatchFn for DataCollectionsById {
    type Key = u32;
    type Value = Option<DataCollection>;

    const NAME: &'static str = "data_collections";

    async fn load(&self, keys: &[u32]) -> db::error::Result<Vec<Option<DataCollection>>> {
        let Self(repository) = self;
        let rows = repository.data_collections(keys).await?;

        Ok(align_by_key(keys, rows, |row| row.data_collection_id)
            .into_iter()
            .map(|row| row.map(DataCollection::from))
            .collect())
    }
}

pub struct SamplesById(Arc<dyn Repository>);

impl BatchFn for SamplesById {
    type Key = u32;
    type Value = Option<Sample>;

    const NAME: &'static str = "samples";

    async fn load(&self, keys: &[u32]) -> db::error::Result<Vec<Option<Sample>>> {
        let Self(repository) = self;
        let rows = repository.samples(keys).await?;

        Ok(align_by_key(keys, rows, |row| row.sample_id)
            .into_iter()
            .map(|row| row.map(Sample::from))
            .collect())
    }
}

pub struct ContainersById(Arc<dyn Repository>);

impl BatchFn for ContainersById {
    type Key = u32;
    type Value = Option<Container>;

    const NAME: &'static str = "containers";

    async fn load(&self, keys: &[u32]) -> db::error::Result<Vec<Option<Container>>> {
        let Self(repository) = self;
        let rows = repository.containers(keys).await?;

        Ok(align_by_key(keys, rows, |row| row.container_id)
            .into_iter()
            .map(|row| row.map(Container::from))
            .collect())
    }
}

pub struct AutoProcessingResultsByDcid(Arc<dyn Repository>);

impl BatchFn for AutoProcessingResultsByDcid {
    type Key = u32;
    type Value = Vec<AutoProcessingResult>;

    const NAME: &'static str = "auto_processing_results";

    async fn load(&self, keys: &[u32]) -> db::error::Result<Vec<Vec<AutoProcessingResult>>> {
        let Self(repository) = self;
        let groups = repository.auto_processing_results(keys).await?;

        Ok(groups
            .into_iter()
            .map(|group| group.into_iter().map(AutoProcessingResult::from).collect())
            .collect())
    }
}

pub struct MergingStatisticsByAutoProcId(Arc<dyn Repository>);

impl BatchFn for MergingStatisticsByAutoProcId {
    type Key = u32;
    type Value = Vec<MergingStatistics>;

    const NAME: &'static str = "merging_statistics";

    async fn load(&self, keys: &[u32]) -> db::error::Result<Vec<Vec<MergingStatistics>>> {
        let Self(repository) = self;
        let groups = repository.merging_statistics(keys).await?;

        Ok(groups
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .filter_map(MergingStatistics::from_row)
                    .collect()
            })
            .collect())
    }
}
