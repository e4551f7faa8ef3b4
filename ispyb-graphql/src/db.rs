use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::pagination::PageRequest;
use error::{Error, Result};
use model::{
    AutoProcessingRow, ContainerRow, DataCollectionRow, PermissionGrant, ProposalName, ProposalRow,
    SampleRow, ScalingStatisticsRow, ScanType, Visit, VisitName,
};

pub mod error;
pub mod local;
pub mod model;
pub mod mysql;
mod schema;
pub(crate) mod util;

/// An optional time range. Both ends are inclusive of the values the database stores for them,
/// see the individual queries for the exact comparison used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
}
impl TimeWindow {
    /// # Errors
    /// When both ends are given and `end` is not after `start`.
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Result<Self> {
        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                return Err(Error::InvalidTimeWindow {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }

        Ok(Self { start, end })
    }

    #[must_use]
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }
}

/// The entity whose data collections are being listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCollectionParent<'a> {
    Proposal(u32),
    Visit(u32),
    Sample(u32),
    /// Collections from every session on the beamline whose start and end fall in the window.
    Beamline {
        name: &'a str,
        window: TimeWindow,
    },
}

/// Read access to the ISPyB database.
///
/// Batch operations take a list of keys. Operations returning `Vec<Vec<_>>` return one group per
/// key, in key order; the others return the rows that exist, in no particular order.
#[async_trait]
pub trait Repository: Send + Sync {
    /// # Errors
    /// [`Error::RecordNotFound`] unless exactly one proposal has this name.
    async fn proposal(&self, name: &ProposalName) -> Result<ProposalRow>;

    /// # Errors
    /// [`Error::RecordNotFound`] unless exactly one session has this name.
    async fn visit(&self, name: &VisitName) -> Result<Visit>;

    async fn visit_by_id(&self, session_id: u32) -> Result<Visit>;

    /// At most `page.limit()` data collection ids of `parent`, ascending, after `page.after()`.
    async fn data_collection_ids(
        &self,
        parent: DataCollectionParent<'_>,
        scan_type: Option<ScanType>,
        page: PageRequest,
    ) -> Result<Vec<u32>>;

    async fn data_collections(&self, ids: &[u32]) -> Result<Vec<DataCollectionRow>>;

    async fn samples(&self, ids: &[u32]) -> Result<Vec<SampleRow>>;

    /// Samples reachable through crystal and protein, ordered by id.
    async fn proposal_samples(&self, proposal_id: u32) -> Result<Vec<SampleRow>>;

    async fn sample_proposal_id(&self, sample_id: u32) -> Result<Option<u32>>;

    async fn containers(&self, ids: &[u32]) -> Result<Vec<ContainerRow>>;

    async fn auto_processing_results(&self, dcids: &[u32]) -> Result<Vec<Vec<AutoProcessingRow>>>;

    async fn merging_statistics(
        &self,
        auto_proc_ids: &[u32],
    ) -> Result<Vec<Vec<ScalingStatisticsRow>>>;

    /// Sessions on the beamline that overlap the window, ordered by id.
    async fn beamline_visits(&self, beamline: &str, window: TimeWindow) -> Result<Vec<Visit>>;

    async fn proposal_has_person(&self, proposal_id: u32, login: &str) -> Result<bool>;

    async fn session_has_person(&self, session_id: u32, login: &str) -> Result<bool>;

    async fn permissions(&self, login: &str) -> Result<Vec<PermissionGrant>>;
}
