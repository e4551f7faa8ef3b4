use async_graphql::{ComplexObject, Context, SimpleObject};
use chrono::NaiveDateTime;

use super::{AutoProcessingResult, Sample};
use crate::{
    db::{error::Error, model::DataCollectionRow},
    graphql::{context::RequestContext, error::IntoFieldResult},
};

/// One acquisition of a set of images.
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct DataCollection {
    pub dcid: u32,
    /// Image directory followed by the file template.
    pub filename: Option<String>,
    pub sample_id: Option<u32>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub axis_start: Option<f32>,
    pub axis_end: Option<f32>,
    pub axis_range: Option<f32>,
    pub overlap: Option<f32>,
    pub number_of_images: Option<u32>,
    pub start_image_number: Option<u32>,
    pub exposure_time: Option<f32>,
    pub rotation_axis: Option<String>,
    pub phi_start: Option<f32>,
    pub kappa_start: Option<f32>,
    pub omega_start: Option<f32>,
    pub chi_start: Option<f32>,
}

impl From<DataCollectionRow> for DataCollection {
    fn from(row: DataCollectionRow) -> Self {
        Self {
            dcid: row.data_collection_id,
            filename: row.filename(),
            sample_id: row.sample_id,
            start_time: row.start_time,
            end_time: row.end_time,
            axis_start: row.axis_start,
            axis_end: row.axis_end,
            axis_range: row.axis_range,
            overlap: row.overlap,
            number_of_images: row.number_of_images,
            start_image_number: row.start_image_number,
            exposure_time: row.exposure_time,
            rotation_axis: row.rotation_axis,
            phi_start: row.phi_start,
            kappa_start: row.kappa_start,
            omega_start: row.omega_start,
            chi_start: row.chi_start,
        }
    }
}

#[ComplexObject]
impl DataCollection {
    async fn auto_processings(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Option<Vec<AutoProcessingResult>>> {
        RequestContext::get(ctx)?
            .loaders
            .auto_processing_results
            .load(self.dcid)
            .await
            .map(Some)
            .into_field()
    }

    /// Null when no sample was recorded. A recorded sample that cannot be found is an error.
    async fn sample(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<Sample>> {
        let Some(sample_id) = self.sample_id else {
            return Ok(None);
        };

        RequestContext::get(ctx)?
            .loaders
            .samples
            .load(sample_id)
            .await
            .and_then(|sample| {
                sample
                    .map(Some)
                    .ok_or_else(|| Error::not_found("sample", sample_id))
            })
            .into_field()
    }
}
