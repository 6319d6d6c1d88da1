//! What the result panels should show for a given query result.
//!
//! Both the table and the chart are pure functions of the list of
//! resources; this module derives that list and the per-condition counts so
//! the front-end only has to draw them.

use crate::models::{PatientResource, QueryResult};

pub const NO_RESULTS_MESSAGE: &str = "No results found for your query.";
pub const NO_TABLE_DATA_MESSAGE: &str = "No patient data to display.";
pub const NO_CHART_DATA_MESSAGE: &str = "No chart data to display.";

/// Label for resources that carry no condition
pub const UNKNOWN_CONDITION: &str = "unknown";

#[derive(Debug, Clone, PartialEq)]
pub enum ResultView<'a> {
    /// No result yet, or a result without an `entry` field
    Absent,
    /// `entry` present but empty
    Empty,
    Rows(Vec<&'a PatientResource>),
}

impl<'a> ResultView<'a> {
    pub fn of(result: Option<&'a QueryResult>) -> Self {
        match result.and_then(|r| r.entry.as_ref()) {
            None => ResultView::Absent,
            Some(entries) if entries.is_empty() => ResultView::Empty,
            Some(entries) => ResultView::Rows(entries.iter().map(|e| &e.resource).collect()),
        }
    }
}

/// One slice of the condition chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionSlice {
    pub label: String,
    pub count: usize,
}

impl ConditionSlice {
    /// Share of `total`, in percent
    pub fn percent(&self, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            self.count as f64 * 100.0 / total as f64
        }
    }
}

/// Count resources per condition, slices in first-seen order
pub fn condition_breakdown(rows: &[&PatientResource]) -> Vec<ConditionSlice> {
    let mut slices: Vec<ConditionSlice> = Vec::new();
    for resource in rows {
        let condition = resource.condition_str();
        let label = if condition.is_empty() {
            UNKNOWN_CONDITION
        } else {
            condition.as_ref()
        };

        match slices.iter_mut().find(|s| s.label == label) {
            Some(slice) => slice.count += 1,
            None => slices.push(ConditionSlice {
                label: label.to_string(),
                count: 1,
            }),
        }
    }
    slices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> QueryResult {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_single_asthma_row() {
        let result = parse(
            r#"{"entry": [{"resource": {"name": "Jane", "age": 34, "condition": "asthma"}}]}"#,
        );
        let view = ResultView::of(Some(&result));

        let rows = match view {
            ResultView::Rows(rows) => rows,
            other => panic!("expected rows, got {:?}", other),
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name_str(), "Jane");

        let slices = condition_breakdown(&rows);
        assert_eq!(
            slices,
            vec![ConditionSlice { label: "asthma".to_string(), count: 1 }]
        );
        assert_eq!(slices[0].percent(1), 100.0);
    }

    #[test]
    fn test_empty_entry_is_empty_view() {
        let result = parse(r#"{"entry": []}"#);
        assert_eq!(ResultView::of(Some(&result)), ResultView::Empty);
    }

    #[test]
    fn test_absent_views() {
        assert_eq!(ResultView::of(None), ResultView::Absent);
        let result = parse(r#"{"resourceType": "Patient"}"#);
        assert_eq!(ResultView::of(Some(&result)), ResultView::Absent);
    }

    #[test]
    fn test_breakdown_groups_in_first_seen_order() {
        let result = parse(
            r#"{"entry": [
                {"resource": {"name": "A", "condition": "diabetic"}},
                {"resource": {"name": "B", "condition": "hypertension"}},
                {"resource": {"name": "C", "condition": "diabetic"}},
                {"resource": {"name": "D"}}
            ]}"#,
        );
        let rows = result.resources();
        let slices = condition_breakdown(&rows);

        let labels: Vec<&str> = slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["diabetic", "hypertension", UNKNOWN_CONDITION]);
        assert_eq!(slices[0].count, 2);
        assert_eq!(slices[0].percent(4), 50.0);
    }

    #[test]
    fn test_breakdown_of_nothing() {
        assert!(condition_breakdown(&[]).is_empty());
        let slice = ConditionSlice { label: "x".to_string(), count: 0 };
        assert_eq!(slice.percent(0), 0.0);
    }
}
