use std::{fmt::Display, str::FromStr, sync::LazyLock};

use async_graphql::Enum;
use chrono::NaiveDateTime;
use diesel::{mysql::Mysql, prelude::*};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{
    error::{Error, Result},
    schema,
};

static PROPOSAL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]{2})([0-9]+)$").unwrap());
static VISIT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]{2})([0-9]+)-([0-9]+)$").unwrap());

/// The natural key of a proposal, e.g. `cm14451`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProposalName {
    code: String,
    number: String,
}
impl ProposalName {
    /// Proposal numbers are compared as integers, so `number` loses its leading zeros.
    fn new(code: &str, number: &str) -> Option<Self> {
        let number: u32 = number.parse().ok()?;

        Some(Self {
            code: code.to_string(),
            number: number.to_string(),
        })
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }
}

impl FromStr for ProposalName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PROPOSAL_NAME
            .captures(s)
            .and_then(|captures| Self::new(&captures[1], &captures[2]))
            .ok_or_else(|| Error::InvalidName {
                entity: "proposal".to_string(),
                name: s.to_string(),
            })
    }
}

impl Display for ProposalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self { code, number } = self;
        write!(f, "{code}{number}")
    }
}

/// The natural key of a visit, e.g. `cm14451-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VisitName {
    proposal: ProposalName,
    visit_number: u32,
}
impl VisitName {
    #[must_use]
    pub fn proposal(&self) -> &ProposalName {
        &self.proposal
    }

    #[must_use]
    pub fn visit_number(&self) -> u32 {
        self.visit_number
    }
}

impl FromStr for VisitName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidName {
            entity: "visit".to_string(),
            name: s.to_string(),
        };

        let Some(captures) = VISIT_NAME.captures(s) else {
            return Err(invalid());
        };

        Ok(Self {
            proposal: ProposalName::new(&captures[1], &captures[2]).ok_or_else(invalid)?,
            visit_number: captures[3].parse().map_err(|_| invalid())?,
        })
    }
}

impl Display for VisitName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            proposal,
            visit_number,
        } = self;
        write!(f, "{proposal}-{visit_number}")
    }
}

/// How a data collection was acquired. Classification happens at query time.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanType {
    /// Overlap of zero and a positive oscillation range, without a grid.
    Rotation,
    /// A `GridInfo` row exists for the data collection.
    Grid,
    /// Anything that is neither a rotation nor a grid scan.
    Screening,
}
impl ScanType {
    /// Classifies a row in memory. The SQL filter in [`super::mysql`] expresses the same predicates.
    #[must_use]
    pub fn classify(row: &DataCollectionRow, has_grid: bool) -> Self {
        if has_grid {
            return Self::Grid;
        }

        match (row.overlap, row.axis_range) {
            (Some(overlap), Some(axis_range)) if overlap == 0.0 && axis_range > 0.0 => {
                Self::Rotation
            }
            _ => Self::Screening,
        }
    }
}

#[derive(
    Enum,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum MergingStatisticsType {
    Overall,
    InnerShell,
    OuterShell,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = schema::proposal, check_for_backend(Mysql))]
pub struct ProposalRow {
    pub proposal_id: u32,
    pub proposal_code: Option<String>,
    pub proposal_number: Option<String>,
}
impl ProposalRow {
    #[must_use]
    pub fn name(&self) -> String {
        let Self {
            proposal_code,
            proposal_number,
            ..
        } = self;

        format!(
            "{}{}",
            proposal_code.as_deref().unwrap_or_default(),
            proposal_number.as_deref().unwrap_or_default()
        )
    }

    pub(crate) fn is_named(&self, name: &ProposalName) -> bool {
        self.proposal_code.as_deref() == Some(name.code())
            && self.proposal_number.as_deref() == Some(name.number())
    }
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = schema::bl_session, check_for_backend(Mysql))]
pub struct SessionRow {
    pub session_id: u32,
    pub proposal_id: u32,
    pub beamline_name: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub visit_number: Option<u32>,
}

/// A session together with the proposal it belongs to, which is needed to name it.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub session: SessionRow,
    pub proposal: ProposalRow,
}
impl Visit {
    #[must_use]
    pub fn name(&self) -> String {
        let Self { session, proposal } = self;

        match session.visit_number {
            Some(visit_number) => format!("{}-{visit_number}", proposal.name()),
            None => proposal.name(),
        }
    }
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = schema::bl_sample, check_for_backend(Mysql))]
pub struct SampleRow {
    pub sample_id: u32,
    pub crystal_id: Option<u32>,
    pub container_id: Option<u32>,
    pub name: Option<String>,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = schema::container, check_for_backend(Mysql))]
pub struct ContainerRow {
    pub container_id: u32,
    pub code: Option<String>,
    pub container_type: Option<String>,
    pub capacity: Option<i32>,
    pub barcode: Option<String>,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = schema::data_collection, check_for_backend(Mysql))]
pub struct DataCollectionRow {
    pub data_collection_id: u32,
    pub sample_id: Option<u32>,
    pub session_id: Option<u32>,
    pub image_directory: Option<String>,
    pub file_template: Option<String>,
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
impl DataCollectionRow {
    /// The image directory joined with the file template.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        match (&self.image_directory, &self.file_template) {
            (None, None) => None,
            (directory, template) => Some(format!(
                "{}{}",
                directory.as_deref().unwrap_or_default(),
                template.as_deref().unwrap_or_default()
            )),
        }
    }
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = schema::auto_proc, check_for_backend(Mysql))]
pub struct AutoProcRow {
    pub auto_proc_id: u32,
    pub auto_proc_program_id: Option<u32>,
    pub space_group: Option<String>,
    pub refined_cell_a: Option<f32>,
    pub refined_cell_b: Option<f32>,
    pub refined_cell_c: Option<f32>,
    pub refined_cell_alpha: Option<f32>,
    pub refined_cell_beta: Option<f32>,
    pub refined_cell_gamma: Option<f32>,
}

/// An `AutoProc` row with the name of the program that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoProcessingRow {
    pub auto_proc: AutoProcRow,
    pub program: Option<String>,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = schema::auto_proc_scaling_statistics, check_for_backend(Mysql))]
pub struct ScalingStatisticsRow {
    pub auto_proc_scaling_statistics_id: u32,
    pub auto_proc_scaling_id: Option<u32>,
    pub scaling_statistics_type: String,
    pub resolution_limit_low: Option<f32>,
    pub resolution_limit_high: Option<f32>,
    pub r_merge: Option<f32>,
    pub mean_i_over_sig_i: Option<f32>,
    pub completeness: Option<f32>,
    pub multiplicity: Option<f32>,
    pub anomalous_completeness: Option<f32>,
    pub anomalous_multiplicity: Option<f32>,
    pub cc_half: Option<f32>,
    pub cc_anomalous: Option<f32>,
}
impl ScalingStatisticsRow {
    /// `None` when the database holds a shell name this service does not know about.
    #[must_use]
    pub fn shell(&self) -> Option<MergingStatisticsType> {
        self.scaling_statistics_type.parse().ok()
    }
}

/// One permission held by a person through one of their user groups.
#[derive(Queryable, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PermissionGrant {
    pub permission_type: String,
    pub group_name: String,
}
