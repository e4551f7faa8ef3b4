use std::{collections::HashSet, fs, sync::Arc};

use async_trait::async_trait;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use super::{
    DataCollectionParent, Repository, TimeWindow,
    error::{Error, Result},
    model::{
        AutoProcRow, AutoProcessingRow, ContainerRow, DataCollectionRow, PermissionGrant,
        ProposalName, ProposalRow, SampleRow, ScalingStatisticsRow, ScanType, SessionRow, Visit,
        VisitName,
    },
    util::{exactly_one, group_by_key},
};
use crate::pagination::PageRequest;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
struct CrystalRow {
    crystal_id: u32,
    protein_id: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
struct ProteinRow {
    protein_id: u32,
    proposal_id: u32,
}

/// An `AutoProc` row with the program and integration it came from and its scaling statistics.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
struct AutoProcessingRecord {
    data_collection_id: u32,
    program: Option<String>,
    #[serde(flatten)]
    auto_proc: AutoProcRow,
    #[serde(default)]
    merging_statistics: Vec<ScalingStatisticsRow>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
struct PersonRecord {
    login: String,
    #[serde(default)]
    proposals: Vec<u32>,
    #[serde(default)]
    sessions: Vec<u32>,
    #[serde(default)]
    user_groups: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
struct UserGroupRecord {
    name: String,
    permissions: Vec<String>,
}

/// A snapshot of ISPyB rows. Link tables are folded into the records that own them.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Fixture {
    proposals: Vec<ProposalRow>,
    sessions: Vec<SessionRow>,
    samples: Vec<SampleRow>,
    crystals: Vec<CrystalRow>,
    proteins: Vec<ProteinRow>,
    containers: Vec<ContainerRow>,
    data_collections: Vec<DataCollectionRow>,
    grid_scans: HashSet<u32>,
    auto_processing: Vec<AutoProcessingRecord>,
    people: Vec<PersonRecord>,
    user_groups: Vec<UserGroupRecord>,
}

/// A small snapshot around proposal `cm14451`, served by default in development.
pub const BUNDLED_FIXTURE: &str = include_str!("../../fixtures/cm14451.json");

/// A [`Repository`] answering from a [`Fixture`] held in memory.
#[derive(Clone, Debug, Default)]
pub struct LocalRepository(Arc<Fixture>);
impl LocalRepository {
    #[must_use]
    pub fn new(fixture: Fixture) -> Self {
        Self(Arc::new(fixture))
    }

    /// # Errors
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// # Errors
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_json(BUNDLED_FIXTURE)
    }

    /// # Errors
    pub fn from_path(path: &Utf8Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let json = fs::read_to_string(path).context(format!("failed to read fixture {path}"))?;
        Self::from_json(&json).context(format!("failed to parse fixture {path}"))
    }

    fn fixture(&self) -> &Fixture {
        let Self(fixture) = self;
        fixture
    }

    fn join_proposal(&self, session: &SessionRow) -> Option<Visit> {
        self.fixture()
            .proposals
            .iter()
            .find(|p| p.proposal_id == session.proposal_id)
            .map(|proposal| Visit {
                session: session.clone(),
                proposal: proposal.clone(),
            })
    }

    fn sessions_where(&self, predicate: impl Fn(&SessionRow) -> bool) -> HashSet<u32> {
        self.fixture()
            .sessions
            .iter()
            .filter(|s| predicate(s))
            .map(|s| s.session_id)
            .collect()
    }

    fn owning_proposal(&self, sample: &SampleRow) -> Option<u32> {
        let Fixture {
            crystals, proteins, ..
        } = self.fixture();

        let crystal = crystals
            .iter()
            .find(|c| Some(c.crystal_id) == sample.crystal_id)?;
        let protein = proteins
            .iter()
            .find(|p| p.protein_id == crystal.protein_id)?;

        Some(protein.proposal_id)
    }

    fn person(&self, login: &str) -> Option<&PersonRecord> {
        self.fixture().people.iter().find(|p| p.login == login)
    }

    fn matches_parent(&self, row: &DataCollectionRow, parent: &DataCollectionParent) -> bool {
        use DataCollectionParent::{Beamline, Proposal, Sample, Visit};

        match *parent {
            Proposal(proposal_id) => {
                let sessions = self.sessions_where(|s| s.proposal_id == proposal_id);
                row.session_id.is_some_and(|id| sessions.contains(&id))
            }
            Visit(session_id) => row.session_id == Some(session_id),
            Sample(sample_id) => row.sample_id == Some(sample_id),
            Beamline { name, window } => {
                let sessions = self.sessions_where(|s| s.beamline_name.as_deref() == Some(name));

                row.session_id.is_some_and(|id| sessions.contains(&id))
                    && window
                        .start()
                        .is_none_or(|start| row.start_time.is_some_and(|t| t > start))
                    && window
                        .end()
                        .is_none_or(|end| row.end_time.is_some_and(|t| t <= end))
            }
        }
    }
}

#[async_trait]
impl Repository for LocalRepository {
    async fn proposal(&self, name: &ProposalName) -> Result<ProposalRow> {
        let rows = self
            .fixture()
            .proposals
            .iter()
            .filter(|p| p.is_named(name))
            .cloned()
            .collect();

        exactly_one(rows, "proposal", name)
    }

    async fn visit(&self, name: &VisitName) -> Result<Visit> {
        let rows = self
            .fixture()
            .sessions
            .iter()
            .filter(|s| s.visit_number == Some(name.visit_number()))
            .filter_map(|s| self.join_proposal(s))
            .filter(|v| v.proposal.is_named(name.proposal()))
            .collect();

        exactly_one(rows, "visit", name)
    }

    async fn visit_by_id(&self, session_id: u32) -> Result<Visit> {
        self.fixture()
            .sessions
            .iter()
            .find(|s| s.session_id == session_id)
            .and_then(|s| self.join_proposal(s))
            .ok_or_else(|| Error::not_found("visit", session_id))
    }

    async fn data_collection_ids(
        &self,
        parent: DataCollectionParent<'_>,
        scan_type: Option<ScanType>,
        page: PageRequest,
    ) -> Result<Vec<u32>> {
        let Fixture {
            data_collections,
            grid_scans,
            ..
        } = self.fixture();

        let mut ids: Vec<u32> = data_collections
            .iter()
            .filter(|row| self.matches_parent(row, &parent))
            .filter(|row| {
                scan_type.is_none_or(|scan_type| {
                    ScanType::classify(row, grid_scans.contains(&row.data_collection_id))
                        == scan_type
                })
            })
            .map(|row| row.data_collection_id)
            .filter(|id| page.after().is_none_or(|after| *id > after))
            .collect();

        ids.sort_unstable();
        ids.truncate(page.limit());

        Ok(ids)
    }

    async fn data_collections(&self, ids: &[u32]) -> Result<Vec<DataCollectionRow>> {
        Ok(self
            .fixture()
            .data_collections
            .iter()
            .filter(|row| ids.contains(&row.data_collection_id))
            .cloned()
            .collect())
    }

    async fn samples(&self, ids: &[u32]) -> Result<Vec<SampleRow>> {
        Ok(self
            .fixture()
            .samples
            .iter()
            .filter(|row| ids.contains(&row.sample_id))
            .cloned()
            .collect())
    }

    async fn proposal_samples(&self, proposal_id: u32) -> Result<Vec<SampleRow>> {
        let Fixture {
            samples,
            containers,
            ..
        } = self.fixture();

        let mut rows: Vec<SampleRow> = samples
            .iter()
            .filter(|s| self.owning_proposal(s) == Some(proposal_id))
            .filter(|s| {
                containers
                    .iter()
                    .any(|c| Some(c.container_id) == s.container_id)
            })
            .cloned()
            .collect();
        rows.sort_unstable_by_key(|s| s.sample_id);

        Ok(rows)
    }

    async fn sample_proposal_id(&self, sample_id: u32) -> Result<Option<u32>> {
        Ok(self
            .fixture()
            .samples
            .iter()
            .find(|s| s.sample_id == sample_id)
            .and_then(|s| self.owning_proposal(s)))
    }

    async fn containers(&self, ids: &[u32]) -> Result<Vec<ContainerRow>> {
        Ok(self
            .fixture()
            .containers
            .iter()
            .filter(|row| ids.contains(&row.container_id))
            .cloned()
            .collect())
    }

    async fn auto_processing_results(&self, dcids: &[u32]) -> Result<Vec<Vec<AutoProcessingRow>>> {
        let mut records: Vec<&AutoProcessingRecord> =
            self.fixture().auto_processing.iter().collect();
        records.sort_by_key(|r| (r.data_collection_id, r.auto_proc.auto_proc_id));

        let rows = records.into_iter().map(|r| {
            (
                r.data_collection_id,
                AutoProcessingRow {
                    auto_proc: r.auto_proc.clone(),
                    program: r.program.clone(),
                },
            )
        });

        Ok(group_by_key(dcids, rows))
    }

    async fn merging_statistics(
        &self,
        auto_proc_ids: &[u32],
    ) -> Result<Vec<Vec<ScalingStatisticsRow>>> {
        let rows = self.fixture().auto_processing.iter().flat_map(|r| {
            r.merging_statistics
                .iter()
                .map(|statistics| (r.auto_proc.auto_proc_id, statistics.clone()))
        });

        Ok(group_by_key(auto_proc_ids, rows))
    }

    async fn beamline_visits(&self, beamline: &str, window: TimeWindow) -> Result<Vec<Visit>> {
        let mut visits: Vec<Visit> = self
            .fixture()
            .sessions
            .iter()
            .filter(|s| s.beamline_name.as_deref() == Some(beamline))
            .filter(|s| {
                window
                    .start()
                    .is_none_or(|start| s.end_date.is_some_and(|end_date| end_date >= start))
            })
            .filter(|s| {
                window
                    .end()
                    .is_none_or(|end| s.start_date.is_some_and(|start_date| start_date <= end))
            })
            .filter_map(|s| self.join_proposal(s))
            .collect();
        visits.sort_unstable_by_key(|v| v.session.session_id);

        Ok(visits)
    }

    async fn proposal_has_person(&self, proposal_id: u32, login: &str) -> Result<bool> {
        Ok(self
            .person(login)
            .is_some_and(|p| p.proposals.contains(&proposal_id)))
    }

    async fn session_has_person(&self, session_id: u32, login: &str) -> Result<bool> {
        Ok(self
            .person(login)
            .is_some_and(|p| p.sessions.contains(&session_id)))
    }

    async fn permissions(&self, login: &str) -> Result<Vec<PermissionGrant>> {
        let Some(person) = self.person(login) else {
            return Ok(Vec::new());
        };

        Ok(self
            .fixture()
            .user_groups
            .iter()
            .filter(|g| person.user_groups.contains(&g.name))
            .flat_map(|g| {
                g.permissions.iter().map(|permission_type| PermissionGrant {
                    permission_type: permission_type.clone(),
                    group_name: g.name.clone(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::test_util::{PROPOSAL, VISIT, repository};

    fn everything() -> PageRequest {
        PageRequest::new(1000, None).unwrap()
    }

    async fn ids(
        repository: &LocalRepository,
        parent: DataCollectionParent<'_>,
        scan_type: Option<ScanType>,
    ) -> BTreeSet<u32> {
        repository
            .data_collection_ids(parent, scan_type, everything())
            .await
            .unwrap()
            .into_iter()
            .collect()
    }

    #[rstest]
    #[tokio::test]
    async fn scan_types_partition_collections(repository: LocalRepository) {
        let proposal = repository.proposal(&PROPOSAL.parse().unwrap()).await.unwrap();
        let parent = DataCollectionParent::Proposal(proposal.proposal_id);

        let all = ids(&repository, parent, None).await;
        let rotation = ids(&repository, parent, Some(ScanType::Rotation)).await;
        let grid = ids(&repository, parent, Some(ScanType::Grid)).await;
        let screening = ids(&repository, parent, Some(ScanType::Screening)).await;

        assert!(rotation.is_disjoint(&grid));
        assert!(rotation.is_disjoint(&screening));
        assert!(grid.is_disjoint(&screening));

        let union: BTreeSet<u32> = rotation
            .iter()
            .chain(&grid)
            .chain(&screening)
            .copied()
            .collect();
        assert_eq!(union, all);
    }

    #[rstest]
    #[tokio::test]
    async fn visit_collections_by_scan_type(repository: LocalRepository) {
        let visit = repository.visit(&VISIT.parse().unwrap()).await.unwrap();
        let parent = DataCollectionParent::Visit(visit.session.session_id);

        assert_eq!(visit.session.session_id, 55167);
        assert_eq!(
            ids(&repository, parent, Some(ScanType::Grid)).await,
            BTreeSet::from([6_017_405])
        );
        assert_eq!(
            ids(&repository, parent, Some(ScanType::Rotation)).await,
            BTreeSet::from([993_677, 1_002_287])
        );
    }

    #[rstest]
    #[tokio::test]
    async fn ambiguous_proposal_is_not_found() {
        let proposal = ProposalRow {
            proposal_id: 1,
            proposal_code: Some("cm".to_string()),
            proposal_number: Some("1".to_string()),
        };
        let repository = LocalRepository::new(Fixture {
            proposals: vec![
                proposal.clone(),
                ProposalRow {
                    proposal_id: 2,
                    ..proposal
                },
            ],
            ..Default::default()
        });

        let err = repository.proposal(&"cm1".parse().unwrap()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[rstest]
    #[tokio::test]
    async fn beamline_visits_overlap_the_window(repository: LocalRepository) {
        let names = |visits: Vec<Visit>| visits.iter().map(Visit::name).collect::<Vec<_>>();

        let all = repository
            .beamline_visits("i03", TimeWindow::default())
            .await
            .unwrap();
        assert_eq!(names(all), ["cm14451-1", "cm14451-2"]);

        let window = TimeWindow::new(
            Some("2016-01-15T00:00:00".parse().unwrap()),
            Some("2016-01-16T00:00:00".parse().unwrap()),
        )
        .unwrap();
        let in_window = repository.beamline_visits("i03", window).await.unwrap();
        assert_eq!(names(in_window), ["cm14451-1"]);
    }

    #[rstest]
    #[tokio::test]
    async fn grouped_fetches_keep_key_order(repository: LocalRepository) {
        let groups = repository
            .auto_processing_results(&[6_017_405, 993_677, 12, 993_677])
            .await
            .unwrap();

        let lengths: Vec<usize> = groups.iter().map(Vec::len).collect();
        assert_eq!(lengths, [0, 8, 0, 8]);
        assert_eq!(groups[1], groups[3]);

        let auto_proc_id = groups[1][0].auto_proc.auto_proc_id;
        let statistics = repository
            .merging_statistics(&[auto_proc_id, auto_proc_id])
            .await
            .unwrap();
        assert_eq!(statistics[0].len(), 3);
        assert_eq!(statistics[0], statistics[1]);
    }

    #[rstest]
    fn inverted_time_window_is_rejected() {
        let err = TimeWindow::new(
            Some("2016-01-16T00:00:00".parse().unwrap()),
            Some("2016-01-15T00:00:00".parse().unwrap()),
        )
        .unwrap_err();

        assert!(err.is_input_error());
    }
}
