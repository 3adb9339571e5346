//! Projects correlation factors onto a single-column heatmap.
use crate::core::market::FactorEntry;
use std::collections::HashSet;

pub const EXCHANGE_RATE_COLUMN: &str = "Exchange Rate";

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapCell {
    pub row: String,
    pub col: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub cells: Vec<HeatmapCell>,
}

impl Heatmap {
    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty()
    }

    pub fn value(&self, row: &str) -> Option<f64> {
        self.cells.iter().find(|c| c.row == row).map(|c| c.value)
    }
}

/// Builds one row per distinct valid factor name, in first occurrence order.
///
/// Entries without a name or numeric coefficient are dropped before row labels
/// are derived. A duplicate name keeps the first coefficient seen.
pub fn project(factors: &[FactorEntry]) -> Heatmap {
    let mut seen = HashSet::new();
    let mut row_labels = Vec::new();
    let mut cells = Vec::new();

    for factor in factors.iter().filter_map(FactorEntry::validate) {
        if !seen.insert(factor.name.clone()) {
            continue;
        }
        row_labels.push(factor.name.clone());
        cells.push(HeatmapCell {
            row: factor.name,
            col: EXCHANGE_RATE_COLUMN.to_string(),
            value: factor.coefficient,
        });
    }

    Heatmap {
        row_labels,
        col_labels: vec![EXCHANGE_RATE_COLUMN.to_string()],
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_and_malformed_entries() {
        let factors = vec![
            FactorEntry::new("GDP", 0.7),
            FactorEntry::new("GDP", 0.7),
            FactorEntry {
                name: Some("bad".to_string()),
                coefficient: None,
            },
        ];

        let heatmap = project(&factors);
        assert_eq!(heatmap.row_labels, vec!["GDP".to_string()]);
        assert_eq!(heatmap.col_labels, vec![EXCHANGE_RATE_COLUMN.to_string()]);
        assert_eq!(heatmap.cells.len(), 1);
        assert_eq!(heatmap.value("GDP"), Some(0.7));
        assert_eq!(heatmap.value("bad"), None);
    }

    #[test]
    fn test_first_occurrence_order() {
        let factors = vec![
            FactorEntry::new("Inflation", -0.2),
            FactorEntry::default(),
            FactorEntry::new("Interest Rates", 0.55),
            FactorEntry::new("Inflation", 0.9),
            FactorEntry::new("News Sentiment", 0.1),
        ];

        let heatmap = project(&factors);
        assert_eq!(
            heatmap.row_labels,
            vec!["Inflation", "Interest Rates", "News Sentiment"]
        );
        assert_eq!(heatmap.value("Inflation"), Some(-0.2));
    }

    #[test]
    fn test_no_valid_factors_is_empty() {
        assert!(project(&[]).is_empty());
        let only_bad = vec![FactorEntry {
            name: None,
            coefficient: Some(0.3),
        }];
        let heatmap = project(&only_bad);
        assert!(heatmap.is_empty());
        assert!(heatmap.cells.is_empty());
    }
}
