//! Session-scoped persisted state.
//!
//! Everything a user has entered in one session lives in a single JSON file.
//! Restarting the questionnaire deletes it.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::questionnaire::AnswerHistory;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    /// Answers given in the applicability questionnaire.
    pub survey_results: AnswerHistory,
    /// Outcome id reached, if the questionnaire was finished.
    pub risk_level: Option<String>,
    /// Free-text documentation answers keyed by documentation question id.
    pub documentation_answers: BTreeMap<String, String>,
    /// Checked state of checklist items by index.
    pub documentation_checklist: BTreeMap<usize, bool>,
    pub documentation_checklist_items: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved state; a missing file is an empty session.
    pub fn load(&self) -> Result<SessionState, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no session file at {}", self.path.display());
                return Ok(SessionState::default());
            }
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(state).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("session saved to {}", self.path.display());
        Ok(())
    }

    /// Load, apply `f`, save.
    pub fn update(&self, f: impl FnOnce(&mut SessionState)) -> Result<SessionState, SessionError> {
        let mut state = self.load()?;
        f(&mut state);
        self.save(&state)?;
        Ok(state)
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("session cleared ({})", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::{colorado, Survey};

    #[test]
    fn test_missing_file_is_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert_eq!(store.load().unwrap(), SessionState::default());
        store.clear().unwrap();
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let graph = colorado::graph().unwrap();
        let mut survey = Survey::new(&graph);
        survey.select("no").unwrap();

        let saved = store
            .update(|s| {
                s.survey_results = survey.history().clone();
                s.risk_level = Some(colorado::NOT_SUBJECT.into());
                s.documentation_checklist.insert(2, true);
            })
            .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.survey_results.answer_value("q1"), Some("no"));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"riskLevel\""));
        assert!(raw.contains("\"surveyResults\""));

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.load().unwrap(), SessionState::default());
    }

    #[test]
    fn test_corrupt_file_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        let err = SessionStore::new(&path).load().unwrap_err();
        assert!(matches!(err, SessionError::Corrupt { .. }));
    }
}
