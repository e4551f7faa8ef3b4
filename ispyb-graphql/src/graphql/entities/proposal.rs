use async_graphql::{ComplexObject, Context, ID, SimpleObject, connection::Connection};

use super::{DataCollection, Sample};
use crate::{
    db::{
        DataCollectionParent,
        model::{ProposalRow, ScanType},
    },
    graphql::{context::RequestContext, error::IntoFieldResult},
    pagination::DEFAULT_PAGE_SIZE,
};

#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct Proposal {
    pub proposal_id: u32,
    /// Proposal code followed by proposal number, e.g. `cm14451`.
    pub name: String,
}

impl From<ProposalRow> for Proposal {
    fn from(row: ProposalRow) -> Self {
        Self {
            name: row.name(),
            proposal_id: row.proposal_id,
        }
    }
}

#[ComplexObject]
impl Proposal {
    /// Data collections from every visit of the proposal, by ascending id.
    async fn data_collections(
        &self,
        ctx: &Context<'_>,
        scan_type: Option<ScanType>,
        #[graphql(default_with = "DEFAULT_PAGE_SIZE")] first: i32,
        after: Option<ID>,
    ) -> async_graphql::Result<Option<Connection<String, DataCollection>>> {
        RequestContext::get(ctx)?
            .data_collection_page(
                DataCollectionParent::Proposal(self.proposal_id),
                scan_type,
                first,
                after,
            )
            .await
            .map(Some)
            .into_field()
    }

    async fn samples(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<Vec<Sample>>> {
        let rows = RequestContext::get(ctx)?
            .repository()
            .proposal_samples(self.proposal_id)
            .await
            .into_field()?;

        Ok(Some(rows.into_iter().map(Sample::from).collect()))
    }
}
