//! Project fields collected during conversational project creation.
//!
//! The assistant gathers a fixed set of fields about a PBL (problem-based
//! learning) project. The running [`ExtractionState`] round-trips through
//! the client on every turn; the server never stores it.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A field the assistant extracts from the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectField {
    Title,
    Description,
    ProblemStatement,
    TargetAudience,
    ExpectedOutcome,
}

impl ProjectField {
    /// Every field, in prompt order.
    pub const ALL: [ProjectField; 5] = [
        ProjectField::Title,
        ProjectField::ProblemStatement,
        ProjectField::Description,
        ProjectField::TargetAudience,
        ProjectField::ExpectedOutcome,
    ];

    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectField::Title => "title",
            ProjectField::Description => "description",
            ProjectField::ProblemStatement => "problem_statement",
            ProjectField::TargetAudience => "target_audience",
            ProjectField::ExpectedOutcome => "expected_outcome",
        }
    }

    /// Human-readable label used in the system prompt.
    pub fn label(&self) -> &'static str {
        match self {
            ProjectField::Title => "project title",
            ProjectField::Description => "project description",
            ProjectField::ProblemStatement => "problem statement",
            ProjectField::TargetAudience => "target audience",
            ProjectField::ExpectedOutcome => "expected outcome",
        }
    }

    /// A project cannot be created without this field.
    pub fn is_required(&self) -> bool {
        matches!(self, ProjectField::Title | ProjectField::ProblemStatement)
    }
}

impl fmt::Display for ProjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a key does not name a known project field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown project field: {0}")]
pub struct UnknownFieldError(pub String);

impl FromStr for ProjectField {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownFieldError(s.to_string()))
    }
}

/// Field values gathered so far, keyed by [`ProjectField`].
///
/// Also used for partial updates: a structured payload carries only the
/// fields it sets or changes. Merging overwrites values but never removes
/// a field that was already set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtractionState(BTreeMap<ProjectField, String>);

impl ExtractionState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from a loosely typed JSON object.
    ///
    /// Unknown keys, non-string values and blank strings are skipped.
    pub fn from_json_map(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut state = Self::new();
        for (key, value) in map {
            let field = match key.parse::<ProjectField>() {
                Ok(field) => field,
                Err(e) => {
                    tracing::debug!("Ignoring extracted key: {}", e);
                    continue;
                }
            };
            match value.as_str() {
                Some(text) if !text.trim().is_empty() => {
                    state.set(field, text);
                }
                Some(_) => tracing::debug!(field = %field, "Ignoring blank field value"),
                None => tracing::debug!(field = %field, "Ignoring non-string field value"),
            }
        }
        state
    }

    /// Sets a single field.
    pub fn with(mut self, field: ProjectField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets or overwrites a field.
    pub fn set(&mut self, field: ProjectField, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    /// Returns the value of a field, if set.
    pub fn get(&self, field: ProjectField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Applies a partial update. Returns the fields whose value changed.
    pub fn merge(&mut self, update: &ExtractionState) -> Vec<ProjectField> {
        let mut changed = Vec::new();
        for (field, value) in &update.0 {
            if self.0.get(field) != Some(value) {
                self.0.insert(*field, value.clone());
                changed.push(*field);
            }
        }
        changed
    }

    /// Required fields that are still missing.
    pub fn missing_required(&self) -> Vec<ProjectField> {
        ProjectField::ALL
            .iter()
            .copied()
            .filter(|field| field.is_required() && !self.0.contains_key(field))
            .collect()
    }

    /// True once every required field is present.
    pub fn has_required(&self) -> bool {
        self.missing_required().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Pretty JSON rendering for the system prompt.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<'de> Deserialize<'de> for ExtractionState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(Self::from_json_map(&map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod project_field {
        use super::*;

        #[test]
        fn parses_wire_names() {
            assert_eq!("title".parse::<ProjectField>(), Ok(ProjectField::Title));
            assert_eq!(
                "problem_statement".parse::<ProjectField>(),
                Ok(ProjectField::ProblemStatement)
            );
            assert!("budget".parse::<ProjectField>().is_err());
        }

        #[test]
        fn serializes_snake_case() {
            let json = serde_json::to_string(&ProjectField::TargetAudience).unwrap();
            assert_eq!(json, "\"target_audience\"");
        }

        #[test]
        fn only_title_and_problem_statement_are_required() {
            let required: Vec<_> = ProjectField::ALL
                .iter()
                .filter(|f| f.is_required())
                .collect();
            assert_eq!(
                required,
                vec![&ProjectField::Title, &ProjectField::ProblemStatement]
            );
        }
    }

    mod extraction_state {
        use super::*;

        #[test]
        fn deserializes_known_string_fields() {
            let state: ExtractionState = serde_json::from_value(json!({
                "title": "Rain gardens",
                "target_audience": "Grade 7"
            }))
            .unwrap();

            assert_eq!(state.get(ProjectField::Title), Some("Rain gardens"));
            assert_eq!(state.get(ProjectField::TargetAudience), Some("Grade 7"));
            assert_eq!(state.len(), 2);
        }

        #[test]
        fn skips_unknown_keys_and_non_strings() {
            let state: ExtractionState = serde_json::from_value(json!({
                "title": "Bridges",
                "budget": "100",
                "description": 42,
                "expected_outcome": null,
                "problem_statement": "   "
            }))
            .unwrap();

            assert_eq!(state.len(), 1);
            assert_eq!(state.get(ProjectField::Title), Some("Bridges"));
        }

        #[test]
        fn serializes_as_plain_object() {
            let state = ExtractionState::new()
                .with(ProjectField::Title, "Bridges")
                .with(ProjectField::ProblemStatement, "Why do bridges fail?");

            let value = serde_json::to_value(&state).unwrap();
            assert_eq!(
                value,
                json!({"title": "Bridges", "problem_statement": "Why do bridges fail?"})
            );
        }

        #[test]
        fn merge_overwrites_but_never_drops() {
            let mut state = ExtractionState::new()
                .with(ProjectField::Title, "Old title")
                .with(ProjectField::Description, "Kept");
            let update = ExtractionState::new()
                .with(ProjectField::Title, "New title")
                .with(ProjectField::TargetAudience, "Grade 5");

            let changed = state.merge(&update);

            assert_eq!(changed, vec![ProjectField::Title, ProjectField::TargetAudience]);
            assert_eq!(state.get(ProjectField::Title), Some("New title"));
            assert_eq!(state.get(ProjectField::Description), Some("Kept"));
            assert_eq!(state.get(ProjectField::TargetAudience), Some("Grade 5"));
        }

        #[test]
        fn merge_reports_nothing_for_identical_values() {
            let mut state = ExtractionState::new().with(ProjectField::Title, "Same");
            let update = ExtractionState::new().with(ProjectField::Title, "Same");

            assert!(state.merge(&update).is_empty());
        }

        #[test]
        fn missing_required_lists_unset_required_fields() {
            let state = ExtractionState::new().with(ProjectField::Description, "x");
            assert_eq!(
                state.missing_required(),
                vec![ProjectField::Title, ProjectField::ProblemStatement]
            );
            assert!(!state.has_required());

            let state = state
                .with(ProjectField::Title, "t")
                .with(ProjectField::ProblemStatement, "p");
            assert!(state.has_required());
        }
    }

    mod diagnostics {
        use super::*;
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        fn debug_log_of(f: impl FnOnce()) -> String {
            let captured = Captured::default();
            let writer = captured.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::DEBUG)
                .with_ansi(false)
                .with_writer(move || writer.clone())
                .finish();
            tracing::subscriber::with_default(subscriber, f);
            let bytes = captured.0.lock().unwrap().clone();
            String::from_utf8(bytes).unwrap()
        }

        #[test]
        fn blank_value_is_logged_when_skipped() {
            let map = json!({ "title": "  ", "description": "kept" });
            let log = debug_log_of(|| {
                let state = ExtractionState::from_json_map(map.as_object().unwrap());
                assert_eq!(state.len(), 1);
            });

            assert!(log.contains("Ignoring blank field value"), "log was: {}", log);
            assert!(log.contains("title"));
        }

        #[test]
        fn non_string_value_is_logged_when_skipped() {
            let map = json!({ "description": 7 });
            let log = debug_log_of(|| {
                assert!(ExtractionState::from_json_map(map.as_object().unwrap()).is_empty());
            });

            assert!(log.contains("Ignoring non-string field value"), "log was: {}", log);
        }
    }
}
