use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::components::history::{DocumentSnapshot, HistoryManager};
use crate::document::Document;
use crate::io::{self, ProjectError};
use crate::ops::actions::{self, ActionError, ActionReport, AiAction};

/// Single open document with its undo history.
pub struct Project {
    pub id: Uuid,
    pub document: Document,
    pub history: HistoryManager,
    /// `None` for unsaved/untitled files.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,

    /// Display name (derived from path or "Untitled-X")
    pub name: String,
}

impl Project {
    pub fn new_untitled(untitled_counter: usize, width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            document: Document::new(width, height),
            history: HistoryManager::default(),
            path: None,
            is_dirty: false,
            name: format!("Untitled-{}", untitled_counter),
        }
    }

    pub fn from_file(path: PathBuf, document: Document) -> Self {
        let mut project = Self {
            id: Uuid::new_v4(),
            document,
            history: HistoryManager::default(),
            path: Some(path),
            is_dirty: false,
            name: String::new(),
        };
        project.update_name_from_path();
        project
    }

    /// Load a `.mwv` project or JSON document from disk.
    pub fn open(path: &Path) -> Result<Self, ProjectError> {
        Ok(Self::from_file(path.to_path_buf(), io::load_document(path)?))
    }

    /// Save to the current path.
    pub fn save(&mut self) -> Result<(), ProjectError> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| ProjectError::InvalidFormat("project has no file path".into()))?;
        self.save_as(path)
    }

    pub fn save_as(&mut self, path: PathBuf) -> Result<(), ProjectError> {
        io::save_document(&self.document, &path)?;
        self.path = Some(path);
        self.update_name_from_path();
        self.mark_clean();
        Ok(())
    }

    /// Run a document edit as one undoable step. The step is recorded only
    /// when the edit succeeds.
    pub fn edit<T, E>(
        &mut self,
        description: &str,
        f: impl FnOnce(&mut Document) -> Result<T, E>,
    ) -> Result<T, E> {
        let before = DocumentSnapshot::capture(&self.document);
        match f(&mut self.document) {
            Ok(value) => {
                self.history.push(description, before, &self.document);
                self.mark_dirty();
                Ok(value)
            }
            Err(e) => {
                before.restore_into(&mut self.document);
                Err(e)
            }
        }
    }

    pub fn apply_actions(&mut self, batch: &[AiAction]) -> Result<ActionReport, ActionError> {
        let report = actions::apply_actions(&mut self.document, &mut self.history, batch)?;
        if !batch.is_empty() {
            self.mark_dirty();
        }
        Ok(report)
    }

    pub fn undo(&mut self) -> Option<String> {
        let desc = self.history.undo(&mut self.document)?;
        self.mark_dirty();
        Some(desc)
    }

    pub fn redo(&mut self) -> Option<String> {
        let desc = self.history.redo(&mut self.document)?;
        self.mark_dirty();
        Some(desc)
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn update_name_from_path(&mut self) {
        if let Some(ref path) = self.path {
            self.name = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
        }
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}
