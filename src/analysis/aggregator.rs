//! Bias ranking over fetched analysis records.

use serde::Serialize;
use std::collections::HashMap;

use crate::api::AnalysisRecord;

/// Biases at or below this confidence are ignored.
pub const BIAS_CONFIDENCE_THRESHOLD: f64 = 0.3;

/// Length cap of the ranking.
pub const MAX_RANKED_BIASES: usize = 5;

/// Occurrence count of one bias name across a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiasTally {
    pub name: String,
    pub count: usize,
}

impl BiasTally {
    /// Name with its first underscore shown as a space.
    pub fn display_name(&self) -> String {
        self.name.replacen('_', " ", 1)
    }

    pub fn occurrence_label(&self) -> String {
        if self.count == 1 {
            "1 occurrence".to_string()
        } else {
            format!("{} occurrences", self.count)
        }
    }

    /// Bar width in percent, 20 per occurrence, capped at 100.
    pub fn bar_percent(&self) -> usize {
        (self.count * 20).min(100)
    }
}

/// Rank biases by how many records flagged them with confidence above the
/// threshold.
///
/// Counts occurrences, not summed confidence. Ties keep the order in which
/// names were first seen, and the result holds at most
/// [`MAX_RANKED_BIASES`] entries.
pub fn rank_biases(records: &[AnalysisRecord]) -> Vec<BiasTally> {
    let mut tallies: Vec<BiasTally> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    let confident = records
        .iter()
        .flat_map(|record| record.detected_biases.biases.iter())
        .filter(|bias| bias.confidence > BIAS_CONFIDENCE_THRESHOLD);

    for bias in confident {
        match positions.get(bias.name.as_str()) {
            Some(&index) => tallies[index].count += 1,
            None => {
                positions.insert(bias.name.as_str(), tallies.len());
                tallies.push(BiasTally {
                    name: bias.name.clone(),
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable, so equal counts stay in first-seen order
    tallies.sort_by(|a, b| b.count.cmp(&a.count));
    tallies.truncate(MAX_RANKED_BIASES);
    tallies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DetectedBias;
    use pretty_assertions::assert_eq;

    fn record_with(biases: &[(&str, f64)]) -> AnalysisRecord {
        biases
            .iter()
            .fold(AnalysisRecord::new("a", "m"), |record, (name, confidence)| {
                record.with_bias(DetectedBias::new(*name, *confidence))
            })
    }

    fn tally(name: &str, count: usize) -> BiasTally {
        BiasTally {
            name: name.to_string(),
            count,
        }
    }

    #[test]
    fn test_confirmation_bias_scenario() {
        let records = vec![record_with(&[
            ("Confirmation Bias", 0.7),
            ("Confirmation Bias", 0.4),
            ("Anchoring Bias", 0.2),
        ])];

        assert_eq!(rank_biases(&records), vec![tally("Confirmation Bias", 2)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank_biases(&[]).is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let records = vec![record_with(&[("Anchoring Bias", 0.3), ("Framing", 0.30001)])];
        assert_eq!(rank_biases(&records), vec![tally("Framing", 1)]);
    }

    #[test]
    fn test_all_below_threshold() {
        let records = vec![
            record_with(&[("Anchoring Bias", 0.1)]),
            record_with(&[("Halo Effect", 0.29)]),
        ];
        assert!(rank_biases(&records).is_empty());
    }

    #[test]
    fn test_nan_confidence_excluded() {
        let records = vec![record_with(&[("Anchoring Bias", f64::NAN)])];
        assert!(rank_biases(&records).is_empty());
    }

    #[test]
    fn test_counts_span_records() {
        let records = vec![
            record_with(&[("Groupthink", 0.9)]),
            record_with(&[("Halo Effect", 0.5), ("Groupthink", 0.6)]),
            record_with(&[("Groupthink", 0.35)]),
        ];

        assert_eq!(
            rank_biases(&records),
            vec![tally("Groupthink", 3), tally("Halo Effect", 1)]
        );
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let records = vec![
            record_with(&[("Beta", 0.9), ("Alpha", 0.9)]),
            record_with(&[("Gamma", 0.9), ("Alpha", 0.9), ("Beta", 0.9)]),
        ];

        assert_eq!(
            rank_biases(&records),
            vec![tally("Beta", 2), tally("Alpha", 2), tally("Gamma", 1)]
        );
    }

    #[test]
    fn test_truncates_to_five_keeping_highest() {
        let records = vec![record_with(&[
            ("One", 0.9),
            ("Two", 0.9),
            ("Three", 0.9),
            ("Four", 0.9),
            ("Five", 0.9),
            ("Six", 0.9),
            ("Six", 0.9),
            ("Seven", 0.9),
        ])];

        let ranked = rank_biases(&records);
        assert_eq!(ranked.len(), MAX_RANKED_BIASES);
        assert_eq!(ranked[0], tally("Six", 2));
        assert!(!ranked.iter().any(|t| t.name == "Seven"));
    }

    #[test]
    fn test_output_invariants_hold() {
        let names = ["A", "B", "C", "D", "E", "F", "G"];
        let records: Vec<AnalysisRecord> = (0..40)
            .map(|i| {
                let name = names[(i * 7 + i / 3) % names.len()];
                let confidence = (i % 10) as f64 / 10.0;
                record_with(&[(name, confidence)])
            })
            .collect();

        let ranked = rank_biases(&records);
        assert!(ranked.len() <= MAX_RANKED_BIASES);
        assert!(ranked.windows(2).all(|w| w[0].count >= w[1].count));
        assert!(ranked.iter().all(|t| t.count >= 1));
    }

    #[test]
    fn test_display_helpers() {
        let t = tally("confirmation_bias_strong", 1);
        assert_eq!(t.display_name(), "confirmation bias_strong");
        assert_eq!(t.occurrence_label(), "1 occurrence");
        assert_eq!(t.bar_percent(), 20);

        let t = tally("Groupthink", 7);
        assert_eq!(t.occurrence_label(), "7 occurrences");
        assert_eq!(t.bar_percent(), 100);
    }
}
