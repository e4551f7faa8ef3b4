use async_graphql::{ComplexObject, Context, ID, SimpleObject, connection::Connection};
use chrono::NaiveDateTime;

use super::DataCollection;
use crate::{
    db::{
        DataCollectionParent,
        model::{self, ScanType},
    },
    graphql::{context::RequestContext, error::IntoFieldResult},
    pagination::DEFAULT_PAGE_SIZE,
};

/// A session on a beamline, named after its proposal, e.g. `cm14451-1`.
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct Visit {
    pub session_id: u32,
    pub name: String,
    pub visit_number: Option<u32>,
    pub beamline: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
}

impl From<model::Visit> for Visit {
    fn from(visit: model::Visit) -> Self {
        let name = visit.name();
        let model::Visit { session, .. } = visit;

        Self {
            session_id: session.session_id,
            name,
            visit_number: session.visit_number,
            beamline: session.beamline_name,
            start_time: session.start_date,
            end_time: session.end_date,
        }
    }
}

#[ComplexObject]
impl Visit {
    async fn data_collections(
        &self,
        ctx: &Context<'_>,
        scan_type: Option<ScanType>,
        #[graphql(default_with = "DEFAULT_PAGE_SIZE")] first: i32,
        after: Option<ID>,
    ) -> async_graphql::Result<Option<Connection<String, DataCollection>>> {
        RequestContext::get(ctx)?
            .data_collection_page(
                DataCollectionParent::Visit(self.session_id),
                scan_type,
                first,
                after,
            )
            .await
            .map(Some)
            .into_field()
    }
}
