use async_graphql::{ComplexObject, Context, SimpleObject};

use crate::{
    db::model::{AutoProcessingRow, MergingStatisticsType, ScalingStatisticsRow},
    graphql::{context::RequestContext, error::IntoFieldResult},
};

#[derive(SimpleObject, Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    pub a: Option<f32>,
    pub b: Option<f32>,
    pub c: Option<f32>,
    pub alpha: Option<f32>,
    pub beta: Option<f32>,
    pub gamma: Option<f32>,
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct AutoProcessingResult {
    pub program: Option<String>,
    pub space_group: Option<String>,
    pub unit_cell: UnitCell,
    #[graphql(skip)]
    pub auto_proc_id: u32,
}

impl From<AutoProcessingRow> for AutoProcessingResult {
    fn from(row: AutoProcessingRow) -> Self {
        let AutoProcessingRow { auto_proc, program } = row;

        Self {
            program,
            space_group: auto_proc.space_group,
            unit_cell: UnitCell {
                a: auto_proc.refined_cell_a,
                b: auto_proc.refined_cell_b,
                c: auto_proc.refined_cell_c,
                alpha: auto_proc.refined_cell_alpha,
                beta: auto_proc.refined_cell_beta,
                gamma: auto_proc.refined_cell_gamma,
            },
            auto_proc_id: auto_proc.auto_proc_id,
        }
    }
}

#[ComplexObject]
impl AutoProcessingResult {
    async fn merging_statistics(
        &self,
        ctx: &Context<'_>,
        shell: MergingStatisticsType,
    ) -> async_graphql::Result<Option<MergingStatistics>> {
        let statistics = RequestContext::get(ctx)?
            .loaders
            .merging_statistics
            .load(self.auto_proc_id)
            .await
            .into_field()?;

        Ok(statistics.into_iter().find(|s| s.shell == shell))
    }
}

/// Scaling statistics of one resolution shell. Missing metrics are null, never zero.
#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct MergingStatistics {
    pub shell: MergingStatisticsType,
    /// High resolution limit.
    pub d_min: Option<f32>,
    /// Low resolution limit.
    pub d_max: Option<f32>,
    pub r_merge: Option<f32>,
    pub mean_isigi: Option<f32>,
    pub completeness: Option<f32>,
    pub multiplicity: Option<f32>,
    pub anomalous_completeness: Option<f32>,
    pub anomalous_multiplicity: Option<f32>,
    pub cc_half: Option<f32>,
    pub cc_anom: Option<f32>,
}
impl MergingStatistics {
    /// `None` for shells of an unknown type.
    pub fn from_row(row: ScalingStatisticsRow) -> Option<Self> {
        let Some(shell) = row.shell() else {
            tracing::warn!(
                id = row.auto_proc_scaling_statistics_id,
                scaling_statistics_type = %row.scaling_statistics_type,
                "skipping scaling statistics of unknown type"
            );
            return None;
        };

        Some(Self {
            shell,
            d_min: row.resolution_limit_high,
            d_max: row.resolution_limit_low,
            r_merge: row.r_merge,
            mean_isigi: row.mean_i_over_sig_i,
            completeness: row.completeness,
            multiplicity: row.multiplicity,
            anomalous_completeness: row.anomalous_completeness,
            anomalous_multiplicity: row.anomalous_multiplicity,
            cc_half: row.cc_half,
            cc_anom: row.cc_anomalous,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn row(scaling_statistics_type: &str) -> ScalingStatisticsRow {
        ScalingStatisticsRow {
            auto_proc_scaling_statistics_id: 1,
            auto_proc_scaling_id: Some(2),
            scaling_statistics_type: scaling_statistics_type.to_string(),
            resolution_limit_low: Some(55.79),
            resolution_limit_high: Some(1.41),
            r_merge: None,
            mean_i_over_sig_i: Some(14.9),
            completeness: Some(99.9),
            multiplicity: Some(6.6),
            anomalous_completeness: None,
            anomalous_multiplicity: None,
            cc_half: Some(0.999),
            cc_anomalous: None,
        }
    }

    #[rstest]
    fn resolution_limits_become_d_min_and_d_max() {
        let statistics = MergingStatistics::from_row(row("outerShell")).unwrap();

        assert_eq!(statistics.shell, MergingStatisticsType::OuterShell);
        assert_eq!(statistics.d_min, Some(1.41));
        assert_eq!(statistics.d_max, Some(55.79));
        assert_eq!(statistics.r_merge, None);
    }

    #[rstest]
    fn unknown_shells_are_skipped() {
        assert_eq!(MergingStatistics::from_row(row("middleShell")), None);
    }
}
