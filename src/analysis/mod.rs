//! Discussion insights: fetching analysis records and deriving the bias
//! ranking and perspective map from them.
//!
//! One fetch feeds both views. [`AnalysisFetcher`] owns the network side and
//! the stale-response guard; [`rank_biases`] and [`PerspectiveMap::build`] are
//! pure functions over the fetched records.

mod aggregator;
mod fetcher;
mod projector;

use std::sync::Arc;

pub use aggregator::{rank_biases, BiasTally, BIAS_CONFIDENCE_THRESHOLD, MAX_RANKED_BIASES};
pub use fetcher::{fixture_records, AnalysisFetcher, AnalysisState, FetchOutcome};
pub use projector::{
    interpolate_rd_yl_gn, normalize_sentiment, project_points, sentiment_color, CanvasLayout,
    CoordinatePolicy, LinearScale, Margins, PerspectiveMap, PerspectivePoint, PlottedPoint, Rgb,
    AXIS_TICKS, POINT_RADIUS, X_AXIS_LABEL, Y_AXIS_LABEL,
};

use crate::api::AnalysisRecord;

/// A single fetched record set with both derived views.
#[derive(Debug, Clone, Default)]
pub struct DiscussionInsights {
    records: Arc<[AnalysisRecord]>,
}

impl DiscussionInsights {
    pub fn new(records: impl Into<Arc<[AnalysisRecord]>>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Insights for whatever a fetcher currently holds.
    pub fn from_state(state: &AnalysisState) -> Self {
        match state {
            AnalysisState::Loaded { records, .. } => Self {
                records: Arc::clone(records),
            },
            _ => Self::default(),
        }
    }

    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Top biases by occurrence.
    pub fn biases(&self) -> Vec<BiasTally> {
        rank_biases(&self.records)
    }

    /// Scatterplot model, or `None` when nothing is plottable.
    pub fn perspective_map(&self, policy: CoordinatePolicy) -> Option<PerspectiveMap> {
        PerspectiveMap::build(&self.records, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DetectedBias;

    #[test]
    fn test_both_views_from_one_record_set() {
        let records = vec![
            AnalysisRecord::new("a1", "msg-0001")
                .with_values(vec![0.2, 0.8])
                .with_bias(DetectedBias::new("Anchoring Bias", 0.9)),
            AnalysisRecord::new("a2", "msg-0002")
                .with_values(vec![0.5])
                .with_bias(DetectedBias::new("Anchoring Bias", 0.5)),
        ];
        let insights = DiscussionInsights::new(records);

        let biases = insights.biases();
        assert_eq!(biases.len(), 1);
        assert_eq!(biases[0].count, 2);

        let map = insights
            .perspective_map(CoordinatePolicy::PassThrough)
            .expect("one plottable record");
        assert_eq!(map.points.len(), 1);
        assert_eq!(map.points[0].point.message_id, "msg-0001");
    }

    #[test]
    fn test_empty_insights() {
        let insights = DiscussionInsights::from_state(&AnalysisState::Idle);
        assert!(insights.is_empty());
        assert!(insights.biases().is_empty());
        assert!(insights.perspective_map(CoordinatePolicy::Clamp).is_none());
    }
}
