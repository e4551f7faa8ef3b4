use async_trait::async_trait;
use diesel::{
    mysql::Mysql,
    prelude::*,
    sql_types::{Integer, Unsigned},
};
use diesel_async::{
    AsyncMysqlConnection, RunQueryDsl,
    pooled_connection::deadpool::{Object, Pool},
};
use tokio::sync::Mutex;

use super::{
    DataCollectionParent, Repository, TimeWindow,
    error::Result,
    model::{
        AutoProcRow, AutoProcessingRow, ContainerRow, DataCollectionRow, PermissionGrant,
        ProposalName, ProposalRow, SampleRow, ScalingStatisticsRow, ScanType, SessionRow, Visit,
        VisitName,
    },
    schema::{
        auto_proc, auto_proc_integration, auto_proc_program, auto_proc_scaling,
        auto_proc_scaling_statistics, bl_sample, bl_session, container, crystal,
        data_collection as dc, grid_info, permission, person, proposal, proposal_has_person,
        protein, session_has_person, user_group, user_group_has_permission,
        user_group_has_person,
    },
    util::{exactly_one, group_by_key},
};
use crate::pagination::PageRequest;

pub type DbPool = Pool<AsyncMysqlConnection>;
pub type DbConnection = Object<AsyncMysqlConnection>;

/// A [`Repository`] holding one pooled connection for the lifetime of a request. The connection
/// goes back to the pool when this is dropped.
pub struct MysqlRepository {
    db_conn: Mutex<DbConnection>,
}
impl MysqlRepository {
    #[must_use]
    pub fn new(db_conn: DbConnection) -> Self {
        Self {
            db_conn: Mutex::new(db_conn),
        }
    }

    /// # Errors
    pub async fn from_pool(db_pool: &DbPool) -> Result<Self> {
        Ok(Self::new(db_pool.get().await?))
    }
}

/// Data collection ids, ascending, as a boxed statement that filters can be added to.
type DataCollectionIds<'a> = dc::BoxedQuery<'a, Mysql, Unsigned<Integer>>;

fn filter_by_scan_type(
    statement: DataCollectionIds<'_>,
    scan_type: ScanType,
) -> DataCollectionIds<'_> {
    let grid_scans = || {
        grid_info::table
            .filter(grid_info::data_collection_id.is_not_null())
            .select(grid_info::data_collection_id.assume_not_null())
    };

    match scan_type {
        ScanType::Grid => statement.filter(dc::data_collection_id.eq_any(grid_scans())),
        ScanType::Rotation => statement
            .filter(dc::overlap.assume_not_null().eq(0.0_f32))
            .filter(dc::axis_range.assume_not_null().gt(0.0_f32))
            .filter(dc::data_collection_id.ne_all(grid_scans())),
        ScanType::Screening => statement
            .filter(dc::data_collection_id.ne_all(grid_scans()))
            .filter(
                dc::overlap
                    .is_null()
                    .or(dc::axis_range.is_null())
                    .or(dc::overlap.assume_not_null().ne(0.0_f32))
                    .or(dc::axis_range.assume_not_null().le(0.0_f32)),
            ),
    }
}

/// Restricts `statement` to the collections of `parent`, of `scan_type` when given, with ids
/// above `after`. Every parent goes through here so the scan types mean the same everywhere.
fn filter_data_collections<'a>(
    mut statement: DataCollectionIds<'a>,
    parent: DataCollectionParent<'a>,
    scan_type: Option<ScanType>,
    after: Option<u32>,
) -> DataCollectionIds<'a> {
    use DataCollectionParent::{Beamline, Proposal, Sample, Visit};

    statement = match parent {
        Proposal(proposal_id) => statement.filter(
            dc::session_id.assume_not_null().eq_any(
                bl_session::table
                    .filter(bl_session::proposal_id.eq(proposal_id))
                    .select(bl_session::session_id),
            ),
        ),
        Visit(session_id) => statement.filter(dc::session_id.assume_not_null().eq(session_id)),
        Sample(sample_id) => statement.filter(dc::sample_id.assume_not_null().eq(sample_id)),
        Beamline { name, window } => {
            statement = statement.filter(
                dc::session_id.assume_not_null().eq_any(
                    bl_session::table
                        .filter(bl_session::beamline_name.assume_not_null().eq(name))
                        .select(bl_session::session_id),
                ),
            );

            if let Some(start) = window.start() {
                statement = statement.filter(dc::start_time.assume_not_null().gt(start));
            }

            if let Some(end) = window.end() {
                statement = statement.filter(dc::end_time.assume_not_null().le(end));
            }

            statement
        }
    };

    if let Some(scan_type) = scan_type {
        statement = filter_by_scan_type(statement, scan_type);
    }

    if let Some(after) = after {
        statement = statement.filter(dc::data_collection_id.gt(after));
    }

    statement
}

fn visit_from_row((session, proposal): (SessionRow, ProposalRow)) -> Visit {
    Visit { session, proposal }
}

#[async_trait]
impl Repository for MysqlRepository {
    async fn proposal(&self, name: &ProposalName) -> Result<ProposalRow> {
        let mut db_conn = self.db_conn.lock().await;

        let rows = proposal::table
            .filter(proposal::proposal_code.eq(name.code()))
            .filter(proposal::proposal_number.eq(name.number()))
            .select(ProposalRow::as_select())
            .limit(2)
            .load(&mut **db_conn)
            .await?;

        exactly_one(rows, "proposal", name)
    }

    async fn visit(&self, name: &VisitName) -> Result<Visit> {
        let mut db_conn = self.db_conn.lock().await;
        let proposal_name = name.proposal();

        let rows: Vec<(SessionRow, ProposalRow)> = bl_session::table
            .inner_join(proposal::table.on(proposal::proposal_id.eq(bl_session::proposal_id)))
            .filter(proposal::proposal_code.eq(proposal_name.code()))
            .filter(proposal::proposal_number.eq(proposal_name.number()))
            .filter(bl_session::visit_number.eq(name.visit_number()))
            .select((SessionRow::as_select(), ProposalRow::as_select()))
            .limit(2)
            .load(&mut **db_conn)
            .await?;

        exactly_one(rows, "visit", name).map(visit_from_row)
    }

    async fn visit_by_id(&self, session_id: u32) -> Result<Visit> {
        let mut db_conn = self.db_conn.lock().await;

        let rows: Vec<(SessionRow, ProposalRow)> = bl_session::table
            .inner_join(proposal::table.on(proposal::proposal_id.eq(bl_session::proposal_id)))
            .filter(bl_session::session_id.eq(session_id))
            .select((SessionRow::as_select(), ProposalRow::as_select()))
            .load(&mut **db_conn)
            .await?;

        exactly_one(rows, "visit", session_id).map(visit_from_row)
    }

    async fn data_collection_ids(
        &self,
        parent: DataCollectionParent<'_>,
        scan_type: Option<ScanType>,
        page: PageRequest,
    ) -> Result<Vec<u32>> {
        let statement = dc::table
            .select(dc::data_collection_id)
            .order_by(dc::data_collection_id.asc())
            .limit(page.limit_i64())
            .into_boxed::<Mysql>();
        let statement = filter_data_collections(statement, parent, scan_type, page.after());

        let mut db_conn = self.db_conn.lock().await;
        let ids = statement.load(&mut **db_conn).await?;
        tracing::debug!(?parent, ?scan_type, n_ids = ids.len(), "listed data collections");

        Ok(ids)
    }

    async fn data_collections(&self, ids: &[u32]) -> Result<Vec<DataCollectionRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut db_conn = self.db_conn.lock().await;

        Ok(dc::table
            .filter(dc::data_collection_id.eq_any(ids.to_vec()))
            .select(DataCollectionRow::as_select())
            .load(&mut **db_conn)
            .await?)
    }

    async fn samples(&self, ids: &[u32]) -> Result<Vec<SampleRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut db_conn = self.db_conn.lock().await;

        Ok(bl_sample::table
            .filter(bl_sample::sample_id.eq_any(ids.to_vec()))
            .select(SampleRow::as_select())
            .load(&mut **db_conn)
            .await?)
    }

    async fn proposal_samples(&self, proposal_id: u32) -> Result<Vec<SampleRow>> {
        let mut db_conn = self.db_conn.lock().await;

        Ok(bl_sample::table
            .inner_join(
                crystal::table.on(crystal::crystal_id.eq(bl_sample::crystal_id.assume_not_null())),
            )
            .inner_join(protein::table.on(protein::protein_id.eq(crystal::protein_id)))
            .inner_join(
                container::table
                    .on(container::container_id.eq(bl_sample::container_id.assume_not_null())),
            )
            .filter(protein::proposal_id.eq(proposal_id))
            .select(SampleRow::as_select())
            .order_by(bl_sample::sample_id.asc())
            .load(&mut **db_conn)
            .await?)
    }

    async fn sample_proposal_id(&self, sample_id: u32) -> Result<Option<u32>> {
        let mut db_conn = self.db_conn.lock().await;

        Ok(bl_sample::table
            .inner_join(
                crystal::table.on(crystal::crystal_id.eq(bl_sample::crystal_id.assume_not_null())),
            )
            .inner_join(protein::table.on(protein::protein_id.eq(crystal::protein_id)))
            .filter(bl_sample::sample_id.eq(sample_id))
            .select(protein::proposal_id)
            .first(&mut **db_conn)
            .await
            .optional()?)
    }

    async fn containers(&self, ids: &[u32]) -> Result<Vec<ContainerRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut db_conn = self.db_conn.lock().await;

        Ok(container::table
            .filter(container::container_id.eq_any(ids.to_vec()))
            .select(ContainerRow::as_select())
            .load(&mut **db_conn)
            .await?)
    }

    async fn auto_processing_results(&self, dcids: &[u32]) -> Result<Vec<Vec<AutoProcessingRow>>> {
        if dcids.is_empty() {
            return Ok(Vec::new());
        }

        let mut db_conn = self.db_conn.lock().await;

        let rows: Vec<(u32, AutoProcRow, Option<String>)> = auto_proc::table
            .inner_join(
                auto_proc_program::table.on(auto_proc_program::auto_proc_program_id
                    .eq(auto_proc::auto_proc_program_id.assume_not_null())),
            )
            .inner_join(auto_proc_integration::table.on(
                auto_proc_integration::auto_proc_program_id
                    .assume_not_null()
                    .eq(auto_proc_program::auto_proc_program_id),
            ))
            .filter(auto_proc_integration::data_collection_id.eq_any(dcids.to_vec()))
            .select((
                auto_proc_integration::data_collection_id,
                AutoProcRow::as_select(),
                auto_proc_program::processing_programs,
            ))
            .order_by((
                auto_proc_integration::data_collection_id.asc(),
                auto_proc::auto_proc_id.asc(),
            ))
            .load(&mut **db_conn)
            .await?;

        let rows = rows
            .into_iter()
            .map(|(dcid, auto_proc, program)| (dcid, AutoProcessingRow { auto_proc, program }));

        Ok(group_by_key(dcids, rows))
    }

    async fn merging_statistics(
        &self,
        auto_proc_ids: &[u32],
    ) -> Result<Vec<Vec<ScalingStatisticsRow>>> {
        if auto_proc_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut db_conn = self.db_conn.lock().await;

        let rows: Vec<(u32, ScalingStatisticsRow)> = auto_proc_scaling_statistics::table
            .inner_join(auto_proc_scaling::table.on(
                auto_proc_scaling::auto_proc_scaling_id
                    .eq(auto_proc_scaling_statistics::auto_proc_scaling_id.assume_not_null()),
            ))
            .filter(
                auto_proc_scaling::auto_proc_id
                    .assume_not_null()
                    .eq_any(auto_proc_ids.to_vec()),
            )
            .select((
                auto_proc_scaling::auto_proc_id.assume_not_null(),
                ScalingStatisticsRow::as_select(),
            ))
            .order_by(auto_proc_scaling_statistics::auto_proc_scaling_statistics_id.asc())
            .load(&mut **db_conn)
            .await?;

        Ok(group_by_key(auto_proc_ids, rows))
    }

    async fn beamline_visits(&self, beamline: &str, window: TimeWindow) -> Result<Vec<Visit>> {
        let mut statement = bl_session::table
            .inner_join(proposal::table.on(proposal::proposal_id.eq(bl_session::proposal_id)))
            .filter(bl_session::beamline_name.eq(beamline))
            .select((SessionRow::as_select(), ProposalRow::as_select()))
            .order_by(bl_session::session_id.asc())
            .into_boxed::<Mysql>();

        if let Some(start) = window.start() {
            statement = statement.filter(bl_session::end_date.assume_not_null().ge(start));
        }

        if let Some(end) = window.end() {
            statement = statement.filter(bl_session::start_date.assume_not_null().le(end));
        }

        let mut db_conn = self.db_conn.lock().await;
        let rows: Vec<(SessionRow, ProposalRow)> = statement.load(&mut **db_conn).await?;

        Ok(rows.into_iter().map(visit_from_row).collect())
    }

    async fn proposal_has_person(&self, proposal_id: u32, login: &str) -> Result<bool> {
        let mut db_conn = self.db_conn.lock().await;

        let n_memberships: i64 = proposal_has_person::table
            .inner_join(person::table.on(person::person_id.eq(proposal_has_person::person_id)))
            .filter(proposal_has_person::proposal_id.eq(proposal_id))
            .filter(person::login.eq(login))
            .count()
            .get_result(&mut **db_conn)
            .await?;

        Ok(n_memberships > 0)
    }

    async fn session_has_person(&self, session_id: u32, login: &str) -> Result<bool> {
        let mut db_conn = self.db_conn.lock().await;

        let n_memberships: i64 = session_has_person::table
            .inner_join(person::table.on(person::person_id.eq(session_has_person::person_id)))
            .filter(session_has_person::session_id.eq(session_id))
            .filter(person::login.eq(login))
            .count()
            .get_result(&mut **db_conn)
            .await?;

        Ok(n_memberships > 0)
    }

    async fn permissions(&self, login: &str) -> Result<Vec<PermissionGrant>> {
        let mut db_conn = self.db_conn.lock().await;

        Ok(permission::table
            .inner_join(
                user_group_has_permission::table
                    .on(user_group_has_permission::permission_id.eq(permission::permission_id)),
            )
            .inner_join(
                user_group::table
                    .on(user_group::user_group_id.eq(user_group_has_permission::user_group_id)),
            )
            .inner_join(
                user_group_has_person::table
                    .on(user_group_has_person::user_group_id.eq(user_group::user_group_id)),
            )
            .inner_join(person::table.on(person::person_id.eq(user_group_has_person::person_id)))
            .filter(person::login.eq(login))
            .select((permission::permission_type, user_group::name))
            .load(&mut **db_conn)
            .await?)
    }
}
