use async_graphql::{ComplexObject, Context, ID, SimpleObject, connection::Connection};

use super::DataCollection;
use crate::{
    db::{
        DataCollectionParent,
        error::Error,
        model::{ContainerRow, SampleRow, ScanType},
    },
    graphql::{context::RequestContext, error::IntoFieldResult},
    pagination::DEFAULT_PAGE_SIZE,
};

#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct Sample {
    pub sample_id: u32,
    pub name: Option<String>,
    pub crystal_id: Option<u32>,
    pub container_id: Option<u32>,
}

impl From<SampleRow> for Sample {
    fn from(row: SampleRow) -> Self {
        let SampleRow {
            sample_id,
            crystal_id,
            container_id,
            name,
        } = row;

        Self {
            sample_id,
            name,
            crystal_id,
            container_id,
        }
    }
}

#[ComplexObject]
impl Sample {
    async fn data_collections(
        &self,
        ctx: &Context<'_>,
        scan_type: Option<ScanType>,
        #[graphql(default_with = "DEFAULT_PAGE_SIZE")] first: i32,
        after: Option<ID>,
    ) -> async_graphql::Result<Option<Connection<String, DataCollection>>> {
        RequestContext::get(ctx)?
            .data_collection_page(
                DataCollectionParent::Sample(self.sample_id),
                scan_type,
                first,
                after,
            )
            .await
            .map(Some)
            .into_field()
    }

    async fn container(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<Container>> {
        let Some(container_id) = self.container_id else {
            return Ok(None);
        };

        RequestContext::get(ctx)?
            .loaders
            .containers
            .load(container_id)
            .await
            .and_then(|container| {
                container
                    .map(Some)
                    .ok_or_else(|| Error::not_found("container", container_id))
            })
            .into_field()
    }
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct Container {
    pub container_id: u32,
    pub code: Option<String>,
    pub container_type: Option<String>,
    pub capacity: Option<i32>,
    pub barcode: Option<String>,
}

impl From<ContainerRow> for Container {
    fn from(row: ContainerRow) -> Self {
        let ContainerRow {
            container_id,
            code,
            container_type,
            capacity,
            barcode,
        } = row;

        Self {
            container_id,
            code,
            container_type,
            capacity,
            barcode,
        }
    }
}
