use async_graphql::{
    Context, EmptyMutation, EmptySubscription, ID, Object, Schema, extensions::Tracing,
};

use crate::{
    auth::Resource,
    db::{
        error::Error as DbError,
        model::{ProposalName, VisitName},
    },
};
pub use context::RequestContext;
use entities::{Beamline, DataCollection, Proposal, Sample, Visit};
use error::IntoFieldResult;

mod context;
pub mod entities;
pub mod error;

pub type IspybSchema = Schema<Query, EmptyMutation, EmptySubscription>;

#[must_use]
pub fn schema() -> IspybSchema {
    Schema::build(Query, EmptyMutation, EmptySubscription)
        .extension(Tracing)
        .finish()
}

/// Every root field checks access before touching the data it names.
pub struct Query;

#[Object]
impl Query {
    async fn proposal(
        &self,
        ctx: &Context<'_>,
        name: ID,
    ) -> async_graphql::Result<Option<Proposal>> {
        let request = RequestContext::get(ctx)?;
        let name: ProposalName = name.parse().into_field()?;

        request
            .authorize(Resource::Proposal(&name))
            .await
            .into_field()?;

        let proposal = request.repository().proposal(&name).await.into_field()?;

        Ok(Some(proposal.into()))
    }

    async fn visit(&self, ctx: &Context<'_>, name: ID) -> async_graphql::Result<Option<Visit>> {
        let request = RequestContext::get(ctx)?;
        let name: VisitName = name.parse().into_field()?;

        request.authorize(Resource::Visit(&name)).await.into_field()?;

        let visit = request.repository().visit(&name).await.into_field()?;

        Ok(Some(visit.into()))
    }

    async fn beamline(
        &self,
        ctx: &Context<'_>,
        name: ID,
    ) -> async_graphql::Result<Option<Beamline>> {
        let request = RequestContext::get(ctx)?;

        request
            .authorize(Resource::Beamline(name.as_str()))
            .await
            .into_field()?;

        Ok(Some(Beamline { name: name.0 }))
    }

    async fn data_collection(
        &self,
        ctx: &Context<'_>,
        dcid: u32,
    ) -> async_graphql::Result<Option<DataCollection>> {
        let request = RequestContext::get(ctx)?;

        request
            .authorize(Resource::DataCollection(dcid))
            .await
            .into_field()?;

        request
            .loaders
            .data_collections
            .load(dcid)
            .await
            .and_then(|data_collection| {
                data_collection
                    .map(Some)
                    .ok_or_else(|| DbError::not_found("data collection", dcid))
            })
            .into_field()
    }

    async fn sample(
        &self,
        ctx: &Context<'_>,
        sample_id: u32,
    ) -> async_graphql::Result<Option<Sample>> {
        let request = RequestContext::get(ctx)?;

        request
            .authorize(Resource::Sample(sample_id))
            .await
            .into_field()?;

        request
            .loaders
            .samples
            .load(sample_id)
            .await
            .and_then(|sample| {
                sample
                    .map(Some)
                    .ok_or_else(|| DbError::not_found("sample", sample_id))
            })
            .into_field()
    }
}
