use std::collections::VecDeque;

use uuid::Uuid;

use crate::document::{Document, Layer};

pub const DEFAULT_HISTORY_SIZE: usize = 50;

// ============================================================================
// COMMAND TRAIT
// ============================================================================

/// Trait for undoable/redoable document edits.
pub trait Command: Send + Sync {
    fn undo(&self, doc: &mut Document);
    fn redo(&self, doc: &mut Document);
    fn description(&self) -> String;
    fn memory_size(&self) -> usize;
}

// ============================================================================
// DOCUMENT SNAPSHOT: whole layer list + selection
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct DocumentSnapshot {
    pub layers: Vec<Layer>,
    pub selected_layer: Option<Uuid>,
}

impl DocumentSnapshot {
    pub fn capture(doc: &Document) -> Self {
        Self {
            layers: doc.layers.clone(),
            selected_layer: doc.selected_layer,
        }
    }

    pub fn restore_into(&self, doc: &mut Document) {
        doc.layers = self.layers.clone();
        doc.selected_layer = self.selected_layer;
    }

    /// Rough heap footprint; content strings (data URIs) dominate.
    fn memory_bytes(&self) -> usize {
        self.layers
            .iter()
            .map(|l| {
                l.name.len()
                    + l.content.as_ref().map_or(0, |c| c.len())
                    + l.modifiers.len() * 256
                    + l.connections.len() * 96
                    + std::mem::size_of::<Layer>()
            })
            .sum()
    }
}

// ============================================================================
// SNAPSHOT COMMAND
// ============================================================================

/// Before/after snapshots around one edit (or one atomic batch of edits).
pub struct SnapshotCommand {
    description: String,
    before: DocumentSnapshot,
    after: Option<DocumentSnapshot>,
}

impl SnapshotCommand {
    /// Create a snapshot command. Call BEFORE performing the operation,
    /// then `set_after()` once it has completed.
    pub fn new(description: String, doc: &Document) -> Self {
        Self {
            description,
            before: DocumentSnapshot::capture(doc),
            after: None,
        }
    }

    pub fn from_snapshot(description: String, before: DocumentSnapshot) -> Self {
        Self { description, before, after: None }
    }

    pub fn set_after(&mut self, doc: &Document) {
        self.after = Some(DocumentSnapshot::capture(doc));
    }
}

impl Command for SnapshotCommand {
    fn undo(&self, doc: &mut Document) {
        self.before.restore_into(doc);
    }

    fn redo(&self, doc: &mut Document) {
        if let Some(ref after) = self.after {
            after.restore_into(doc);
        }
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn memory_size(&self) -> usize {
        self.before.memory_bytes() + self.after.as_ref().map_or(0, |a| a.memory_bytes())
    }
}

// ============================================================================
// HISTORY MANAGER - Manages undo/redo stacks with memory limits
// ============================================================================

/// Undo/redo history manager with memory limits.
pub struct HistoryManager {
    undo_stack: VecDeque<Box<dyn Command>>,
    redo_stack: VecDeque<Box<dyn Command>>,
    max_history_size: usize,
    /// Optional memory cap in bytes.
    max_memory_bytes: Option<usize>,
    /// Running memory total across both stacks.
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl HistoryManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size,
            max_memory_bytes: Some(100 * 1024 * 1024), // 100 MB default limit
            total_memory: 0,
        }
    }

    pub fn with_memory_limit(mut self, max_bytes: Option<usize>) -> Self {
        self.max_memory_bytes = max_bytes;
        self
    }

    /// Record an edit whose pre-edit state is `before`; the post-edit state
    /// is captured from `doc`.
    pub fn push(&mut self, description: impl Into<String>, before: DocumentSnapshot, doc: &Document) {
        let mut cmd = SnapshotCommand::from_snapshot(description.into(), before);
        cmd.set_after(doc);
        self.push_command(Box::new(cmd));
    }

    pub fn push_command(&mut self, command: Box<dyn Command>) {
        // Clear redo stack when a new action is performed
        for cmd in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(cmd.memory_size());
        }

        self.total_memory += command.memory_size();
        self.undo_stack.push_back(command);

        self.prune();
    }

    pub fn undo(&mut self, doc: &mut Document) -> Option<String> {
        let command = self.undo_stack.pop_back()?;
        let description = command.description();
        command.undo(doc);
        crate::log_info!("undo: {}", description);
        self.redo_stack.push_back(command);
        Some(description)
    }

    pub fn redo(&mut self, doc: &mut Document) -> Option<String> {
        let command = self.redo_stack.pop_back()?;
        let description = command.description();
        command.redo(doc);
        crate::log_info!("redo: {}", description);
        self.undo_stack.push_back(command);
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|c| c.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(|c| c.description())
    }

    /// All undo descriptions, most recent first.
    pub fn undo_history(&self) -> Vec<String> {
        self.undo_stack.iter().rev().map(|c| c.description()).collect()
    }

    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    fn prune(&mut self) {
        while self.undo_stack.len() > self.max_history_size {
            if let Some(removed) = self.undo_stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            }
        }

        if let Some(max_bytes) = self.max_memory_bytes {
            while self.total_memory > max_bytes && self.undo_stack.len() > 1 {
                if let Some(removed) = self.undo_stack.pop_front() {
                    self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
    }

    /// Undo `steps` entries (0 = nothing).
    pub fn undo_to(&mut self, steps: usize, doc: &mut Document) {
        for _ in 0..steps {
            if self.undo(doc).is_none() {
                break;
            }
        }
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}
