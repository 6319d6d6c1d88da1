use std::borrow::Cow;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Payload returned by the query endpoint.
///
/// Only the fields the client renders are typed. Anything else the service
/// sends is kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(
        rename = "resourceType",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_type: Option<String>,
    /// Summary only; a malformed `filters` object reads as absent
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub filters: Option<QueryFilters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<Vec<QueryEntry>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QueryResult {
    /// The resources inside `entry`, in response order
    pub fn resources(&self) -> Vec<&PatientResource> {
        self.entry
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|e| &e.resource)
            .collect()
    }

    pub fn has_entries(&self) -> bool {
        self.entry.as_ref().map(|e| !e.is_empty()).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryEntry {
    #[serde(default)]
    pub resource: PatientResource,
}

/// A simulated patient record. Not a real FHIR schema.
///
/// Field values are kept as the service sent them; a string age or a
/// numeric name is displayed verbatim rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PatientResource {
    pub fn name_str(&self) -> Cow<'_, str> {
        display_value(self.name.as_ref())
    }

    pub fn age_str(&self) -> Cow<'_, str> {
        display_value(self.age.as_ref())
    }

    pub fn condition_str(&self) -> Cow<'_, str> {
        display_value(self.condition.as_ref())
    }
}

/// Table text for a field: strings as-is, missing or null as blank,
/// anything else as its JSON text
fn display_value(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

/// Decode `T` if the value has the expected shape, otherwise treat it as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Filters the service extracted from the free-text query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub condition: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<AgeFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub medications: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeFilter {
    pub operator: String,
    pub value: u32,
}

impl AgeFilter {
    pub fn symbol(&self) -> &str {
        match self.operator.as_str() {
            "gt" => ">",
            "lt" => "<",
            other => other,
        }
    }
}

impl QueryFilters {
    pub fn is_empty(&self) -> bool {
        self.condition.is_empty()
            && self.age.is_none()
            && self.gender.is_none()
            && self.medications.is_empty()
    }

    /// One-line summary, e.g. `condition: asthma · age > 60`
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.condition.is_empty() {
            parts.push(format!("condition: {}", self.condition.join(", ")));
        }
        if let Some(ref age) = self.age {
            parts.push(format!("age {} {}", age.symbol(), age.value));
        }
        if let Some(ref gender) = self.gender {
            parts.push(format!("gender: {}", gender));
        }
        if !self.medications.is_empty() {
            parts.push(format!("medications: {}", self.medications.join(", ")));
        }
        parts.join(" · ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_response() {
        let body = r#"{
            "resourceType": "Patient",
            "filters": {"condition": ["asthma"], "age": {"operator": "gt", "value": 30}},
            "entry": [
                {"resource": {"name": "Charlie Lee", "age": 40, "condition": "asthma", "gender": "male"}},
                {"resource": {"name": "Grace Adams", "age": 55, "condition": "diabetic", "medications": ["aspirin"]}}
            ]
        }"#;

        let result: QueryResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.resource_type.as_deref(), Some("Patient"));
        assert!(result.has_entries());

        let resources = result.resources();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].name_str(), "Charlie Lee");
        assert_eq!(resources[0].age_str(), "40");
        assert_eq!(
            resources[1].medications,
            Some(serde_json::json!(["aspirin"]))
        );

        let filters = result.filters.unwrap();
        assert_eq!(filters.summary(), "condition: asthma · age > 30");
    }

    #[test]
    fn test_absent_and_empty_entry_are_distinct() {
        let absent: QueryResult = serde_json::from_str("{}").unwrap();
        let empty: QueryResult = serde_json::from_str(r#"{"entry": []}"#).unwrap();

        assert!(absent.entry.is_none());
        assert_eq!(empty.entry.as_ref().map(Vec::len), Some(0));
        assert!(!absent.has_entries());
        assert!(!empty.has_entries());
    }

    #[test]
    fn test_unknown_fields_are_kept() {
        let body = r#"{"entry": [], "total": 0, "meta": {"source": "mock"}}"#;
        let result: QueryResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.extra.get("total"), Some(&Value::from(0)));
        assert!(result.extra.contains_key("meta"));
    }

    #[test]
    fn test_wrong_entry_shape_is_an_error() {
        let body = r#"{"entry": "not a list"}"#;
        assert!(serde_json::from_str::<QueryResult>(body).is_err());
    }

    #[test]
    fn test_missing_resource_fields_render_blank() {
        let body = r#"{"entry": [{"resource": {}}]}"#;
        let result: QueryResult = serde_json::from_str(body).unwrap();
        let resource = result.resources()[0];
        assert_eq!(resource.name_str(), "");
        assert_eq!(resource.age_str(), "");
        assert_eq!(resource.condition_str(), "");
    }

    #[test]
    fn test_loosely_shaped_rows_still_parse() {
        let body = r#"{
            "entry": [
                {"resource": {"name": "Jane", "age": "34", "condition": "asthma", "medications": null}},
                {"resource": {"name": 7, "age": 34.5, "condition": null}},
                {"resource": {"age": -1}},
                {}
            ]
        }"#;
        let result: QueryResult = serde_json::from_str(body).unwrap();
        let rows = result.resources();
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].age_str(), "34");
        assert_eq!(rows[0].medications, None);
        assert_eq!(rows[1].name_str(), "7");
        assert_eq!(rows[1].age_str(), "34.5");
        assert_eq!(rows[1].condition_str(), "");
        assert_eq!(rows[2].age_str(), "-1");
        assert_eq!(rows[3].name_str(), "");
    }

    #[test]
    fn test_malformed_filters_read_as_absent() {
        let body = r#"{"filters": {"age": {"operator": "gt", "value": "sixty"}}, "entry": []}"#;
        let result: QueryResult = serde_json::from_str(body).unwrap();
        assert!(result.filters.is_none());
        assert_eq!(result.entry.as_ref().map(Vec::len), Some(0));
    }

    #[test]
    fn test_empty_filters_summary() {
        let filters = QueryFilters::default();
        assert!(filters.is_empty());
        assert_eq!(filters.summary(), "");
    }
}
