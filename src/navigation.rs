//! Subject/paper navigation and filename search.
//!
//! Selection state is an explicit [`NavigationState`] value: every transition
//! takes the current state and returns the next one, so callers (CLI, HTTP
//! clients) own it and nothing is kept process-wide.

use crate::error::{OptionExt, PapersError, Result};
use crate::render::{self, DisplayBlock};
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Prompt shown when nothing is selected
pub const NOTHING_SELECTED: &str = "Select a paper to view details.";

/// Current selection across both navigation flows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationState {
    /// Subject chosen in the browse flow
    pub subject: Option<String>,
    /// Paper chosen under `subject`
    pub paper: Option<String>,
    /// Last filename search
    pub query: String,
    /// Record currently on display, from either flow
    pub selected: Option<String>,
}

/// One user interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NavAction {
    ChooseSubject { subject: String },
    ChoosePaper { id: String },
    Search { query: String },
    Select { id: String },
}

/// What to display for a state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub selected: Option<String>,
    pub blocks: Vec<DisplayBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Navigation over a record store
pub struct Navigator<'a> {
    store: &'a RecordStore,
}

impl<'a> Navigator<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Subject names, sorted
    pub fn get_subjects(&self) -> Result<Vec<String>> {
        Ok(self.store.index_by_subject()?.keys().cloned().collect())
    }

    /// Papers under `subject` in filename order; empty for unknown subjects
    pub fn get_papers(&self, subject: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .index_by_subject()?
            .get(subject)
            .cloned()
            .unwrap_or_default())
    }

    /// Record ids whose filename contains `query`, case-insensitively
    pub fn search(&self, query: &str) -> Result<Vec<String>> {
        let needle = query.trim().to_lowercase();
        let ids = self.store.list_records()?;
        if needle.is_empty() {
            return Ok(ids);
        }
        Ok(ids
            .into_iter()
            .filter(|id| id.to_lowercase().contains(&needle))
            .collect())
    }

    /// Pick a subject; the paper selection moves to its first paper
    pub fn choose_subject(&self, state: &NavigationState, subject: &str) -> Result<NavigationState> {
        let first = self
            .get_papers(subject)?
            .into_iter()
            .next()
            .ok_or_not_found(&format!("subject '{}'", subject))?;
        Ok(NavigationState {
            subject: Some(subject.to_string()),
            paper: Some(first.clone()),
            selected: Some(first),
            ..state.clone()
        })
    }

    /// Pick a paper listed under the current subject
    pub fn choose_paper(&self, state: &NavigationState, id: &str) -> Result<NavigationState> {
        let subject = state
            .subject
            .as_deref()
            .ok_or_else(|| PapersError::Validation("Choose a subject first".to_string()))?;
        if !self.get_papers(subject)?.iter().any(|p| p == id) {
            return Err(PapersError::NotFound(id.to_string()));
        }
        Ok(NavigationState {
            paper: Some(id.to_string()),
            selected: Some(id.to_string()),
            ..state.clone()
        })
    }

    /// Select a record from the search flow
    pub fn select(&self, state: &NavigationState, id: &str) -> Result<NavigationState> {
        if !self.store.list_records()?.iter().any(|r| r == id) {
            return Err(PapersError::NotFound(id.to_string()));
        }
        debug!(id = id, "Selected record");
        Ok(NavigationState {
            selected: Some(id.to_string()),
            ..state.clone()
        })
    }

    /// Apply one interaction; on error the caller keeps its previous state
    pub fn apply(&self, state: &NavigationState, action: &NavAction) -> Result<NavigationState> {
        match action {
            NavAction::ChooseSubject { subject } => self.choose_subject(state, subject),
            NavAction::ChoosePaper { id } => self.choose_paper(state, id),
            NavAction::Search { query } => Ok(NavigationState {
                query: query.clone(),
                ..state.clone()
            }),
            NavAction::Select { id } => self.select(state, id),
        }
    }

    /// Render the selected record, or explain why there is nothing to show
    pub fn current_view(&self, state: &NavigationState) -> View {
        let Some(id) = state.selected.as_deref() else {
            return View {
                selected: None,
                blocks: Vec::new(),
                message: Some(NOTHING_SELECTED.to_string()),
            };
        };

        match self.store.load(id) {
            Ok(record) => View {
                selected: Some(id.to_string()),
                blocks: render::render_with_id(&record, id),
                message: None,
            },
            Err(e) => {
                warn!(id = id, error = %e, "Failed to load selected paper");
                View {
                    selected: Some(id.to_string()),
                    blocks: Vec::new(),
                    message: Some(format!("Failed to load selected paper: {}", e)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, RecordStore) {
        let dir = TempDir::new().unwrap();
        let files = [
            ("alpha_2023.json", r#"{"paper_title": "Alpha", "subject_area": {"areas": [{"name": "NLP"}]}}"#),
            ("Beta_2024.json", r#"{"subject_area": {"areas": ["Biology", {"name": "NLP"}]}}"#),
            ("gamma.json", "{broken"),
        ];
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        let store = RecordStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_subjects_and_papers() {
        let (_dir, store) = fixture();
        let nav = Navigator::new(&store);
        assert_eq!(nav.get_subjects().unwrap(), vec!["Biology", "NLP"]);
        assert_eq!(
            nav.get_papers("NLP").unwrap(),
            vec!["Beta_2024.json", "alpha_2023.json"]
        );
        assert!(nav.get_papers("Physics").unwrap().is_empty());
    }

    #[test]
    fn test_search_case_insensitive() {
        let (_dir, store) = fixture();
        let nav = Navigator::new(&store);
        assert_eq!(nav.search("BETA").unwrap(), vec!["Beta_2024.json"]);
        assert_eq!(nav.search("").unwrap().len(), 3);
        assert!(nav.search("zzz").unwrap().is_empty());
    }

    #[test]
    fn test_cascading_selection() {
        let (_dir, store) = fixture();
        let nav = Navigator::new(&store);
        let state = nav
            .choose_subject(&NavigationState::default(), "NLP")
            .unwrap();
        assert_eq!(state.paper.as_deref(), Some("Beta_2024.json"));

        let state = nav.choose_paper(&state, "alpha_2023.json").unwrap();
        assert_eq!(state.selected.as_deref(), Some("alpha_2023.json"));

        assert!(matches!(
            nav.choose_paper(&state, "gamma.json"),
            Err(PapersError::NotFound(_))
        ));

        let state = nav.choose_subject(&state, "Biology").unwrap();
        assert_eq!(state.paper.as_deref(), Some("Beta_2024.json"));
    }

    #[test]
    fn test_select_and_view() {
        let (_dir, store) = fixture();
        let nav = Navigator::new(&store);

        let empty = nav.current_view(&NavigationState::default());
        assert_eq!(empty.message.as_deref(), Some(NOTHING_SELECTED));

        let state = nav
            .apply(
                &NavigationState::default(),
                &NavAction::Select {
                    id: "alpha_2023.json".into(),
                },
            )
            .unwrap();
        let view = nav.current_view(&state);
        assert_eq!(view.blocks[0], DisplayBlock::heading(1, "Alpha"));

        assert!(nav.select(&state, "missing.json").is_err());

        let broken = nav.select(&state, "gamma.json").unwrap();
        let view = nav.current_view(&broken);
        assert!(view.blocks.is_empty());
        assert!(view.message.unwrap().starts_with("Failed to load selected paper"));
    }
}
