use async_graphql::{ComplexObject, Context, ID, SimpleObject, connection::Connection};
use chrono::{Local, NaiveDateTime};

use super::{DataCollection, Visit};
use crate::{
    db::{DataCollectionParent, TimeWindow, error::Result, model::ScanType},
    graphql::{context::RequestContext, error::IntoFieldResult},
    pagination::DEFAULT_PAGE_SIZE,
};

/// A beamline, known only by the name its sessions were recorded with.
#[derive(SimpleObject, Debug, Clone, PartialEq, Eq)]
#[graphql(complex)]
pub struct Beamline {
    pub name: String,
}

/// The window ends now unless told otherwise.
fn window(
    start_time: Option<NaiveDateTime>,
    end_time: Option<NaiveDateTime>,
) -> Result<TimeWindow> {
    let end_time = end_time.unwrap_or_else(|| Local::now().naive_local());

    TimeWindow::new(start_time, Some(end_time))
}

#[ComplexObject]
impl Beamline {
    /// Visits overlapping the window, by ascending session id.
    async fn visits(
        &self,
        ctx: &Context<'_>,
        start_time: Option<NaiveDateTime>,
        end_time: Option<NaiveDateTime>,
    ) -> async_graphql::Result<Option<Vec<Visit>>> {
        let window = window(start_time, end_time).into_field()?;

        let visits = RequestContext::get(ctx)?
            .repository()
            .beamline_visits(&self.name, window)
            .await
            .into_field()?;

        Ok(Some(visits.into_iter().map(Visit::from).collect()))
    }

    /// Data collections that started after `startTime` and ended by `endTime`.
    async fn data_collections(
        &self,
        ctx: &Context<'_>,
        start_time: Option<NaiveDateTime>,
        end_time: Option<NaiveDateTime>,
        scan_type: Option<ScanType>,
        #[graphql(default_with = "DEFAULT_PAGE_SIZE")] first: i32,
        after: Option<ID>,
    ) -> async_graphql::Result<Option<Connection<String, DataCollection>>> {
        let window = window(start_time, end_time).into_field()?;

        RequestContext::get(ctx)?
            .data_collection_page(
                DataCollectionParent::Beamline {
                    name: &self.name,
                    window,
                },
                scan_type,
                first,
                after,
            )
            .await
            .map(Some)
            .into_field()
    }
}
