// ============================================================================
// ACTION BRIDGE: assistant-issued JSON mutations applied to the document
// ============================================================================
//
// A batch of actions targets the currently selected layer and is applied
// atomically: any failure rolls the document back to the pre-batch snapshot,
// and a successful batch becomes a single undo entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::components::history::{DocumentSnapshot, HistoryManager};
use crate::document::{Connection, Document, DocumentError};
use crate::modifier::{Modifier, ModifierType, ParamValue};

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("invalid action JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("action #{index} failed: {source}")]
    Failed {
        index: usize,
        #[source]
        source: DocumentError,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AiAction {
    UpdateModifierParams {
        #[serde(rename = "modId", alias = "mod_id")]
        mod_id: Uuid,
        params: BTreeMap<String, ParamValue>,
    },
    AddModifier {
        #[serde(rename = "type")]
        kind: ModifierType,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        params: BTreeMap<String, ParamValue>,
    },
    CreateConnection {
        #[serde(rename = "fromModId", alias = "from_mod_id")]
        from_mod_id: Uuid,
        #[serde(rename = "fromPort", alias = "from_port")]
        from_port: String,
        #[serde(rename = "toModId", alias = "to_mod_id")]
        to_mod_id: Uuid,
        #[serde(rename = "toPort", alias = "to_port")]
        to_port: String,
    },
    ReplaceLayerContent {
        content: String,
    },
}

impl AiAction {
    pub fn label(&self) -> String {
        match self {
            AiAction::UpdateModifierParams { .. } => "Update modifier".to_string(),
            AiAction::AddModifier { kind, .. } => format!("Add {}", kind.label()),
            AiAction::CreateConnection { .. } => "Connect modifiers".to_string(),
            AiAction::ReplaceLayerContent { .. } => "Replace content".to_string(),
        }
    }
}

/// Outcome of one applied batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionReport {
    pub layer_id: Option<Uuid>,
    pub applied: usize,
    /// Duplicate connections that were ignored.
    pub skipped_duplicates: usize,
    /// Ids of modifiers created by `add_modifier`, in order.
    pub added_modifiers: Vec<Uuid>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<AiAction>),
    One(AiAction),
}

/// Parse either a single action object or an array of them.
pub fn parse_actions(json: &str) -> Result<Vec<AiAction>, ActionError> {
    let parsed: OneOrMany = match serde_json::from_str(json) {
        Ok(v) => v,
        // The untagged error is uninformative; re-parse for a precise message.
        Err(_) if json.trim_start().starts_with('[') => {
            OneOrMany::Many(serde_json::from_str::<Vec<AiAction>>(json)?)
        }
        Err(_) => OneOrMany::One(serde_json::from_str::<AiAction>(json)?),
    };
    Ok(match parsed {
        OneOrMany::Many(v) => v,
        OneOrMany::One(a) => vec![a],
    })
}

/// Apply `actions` to the selected layer of `doc`.
pub fn apply_actions(
    doc: &mut Document,
    history: &mut HistoryManager,
    actions: &[AiAction],
) -> Result<ActionReport, ActionError> {
    let layer_id = doc.selected_id()?;
    doc.layer(layer_id)?;

    let before = DocumentSnapshot::capture(doc);
    let mut report = ActionReport {
        layer_id: Some(layer_id),
        ..Default::default()
    };

    for (index, action) in actions.iter().enumerate() {
        if let Err(source) = apply_one(doc, layer_id, action, &mut report) {
            before.restore_into(doc);
            crate::log_warn!(
                "action batch rolled back at #{} ({}): {}",
                index, action.label(), source
            );
            return Err(ActionError::Failed { index, source });
        }
    }

    if !actions.is_empty() {
        let description = match actions {
            [single] => single.label(),
            _ => format!("Assistant: {} actions", actions.len()),
        };
        history.push(description, before, doc);
    }
    crate::log_info!(
        "applied {} action(s) to layer {} ({} duplicate connection(s) skipped)",
        report.applied, layer_id, report.skipped_duplicates
    );
    Ok(report)
}

fn apply_one(
    doc: &mut Document,
    layer_id: Uuid,
    action: &AiAction,
    report: &mut ActionReport,
) -> Result<(), DocumentError> {
    match action {
        AiAction::UpdateModifierParams { mod_id, params } => {
            doc.update_modifier_params(layer_id, *mod_id, params.clone())?;
        }
        AiAction::AddModifier { kind, params } => {
            let mut modifier = Modifier::new(*kind);
            modifier.merge_params(params.clone());
            report.added_modifiers.push(doc.push_modifier(layer_id, modifier)?);
        }
        AiAction::CreateConnection { from_mod_id, from_port, to_mod_id, to_port } => {
            let conn = Connection {
                from_mod_id: *from_mod_id,
                from_port: from_port.clone(),
                to_mod_id: *to_mod_id,
                to_port: to_port.clone(),
            };
            if !doc.add_connection(layer_id, conn)? {
                report.skipped_duplicates += 1;
                return Ok(());
            }
        }
        AiAction::ReplaceLayerContent { content } => {
            doc.set_layer_content(layer_id, content.clone())?;
        }
    }
    report.applied += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Layer, LayerKind};

    fn setup() -> (Document, HistoryManager, Uuid, Uuid, Uuid) {
        let mut doc = Document::new(640, 480);
        let layer = doc.add_layer(Layer::new("Photo", LayerKind::Image, 640.0, 480.0));
        let a = doc.add_modifier(layer, ModifierType::Blur).unwrap();
        let b = doc.add_modifier(layer, ModifierType::Brightness).unwrap();
        (doc, HistoryManager::default(), layer, a, b)
    }

    #[test]
    fn parses_single_object_and_array() {
        let one = parse_actions(r#"{"action":"add_modifier","type":"sepia"}"#).unwrap();
        assert_eq!(one, vec![AiAction::AddModifier { kind: ModifierType::Sepia, params: BTreeMap::new() }]);

        let many = parse_actions(
            r#"[{"action":"replace_layer_content","content":"hello"},
                {"action":"add_modifier","type":"blur","params":{"radius":4}}]"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);
        assert!(matches!(&many[1], AiAction::AddModifier { params, .. } if params["radius"] == ParamValue::Number(4.0)));

        assert!(matches!(parse_actions(r#"{"action":"explode"}"#), Err(ActionError::Parse(_))));
    }

    #[test]
    fn batch_applies_and_is_one_undo_step() {
        let (mut doc, mut history, layer, a, b) = setup();
        let json = format!(
            r#"[{{"action":"update_modifier_params","modId":"{a}","params":{{"radius":12}}}},
                {{"action":"create_connection","fromModId":"{a}","fromPort":"radius","toModId":"{b}","toPort":"amount"}},
                {{"action":"create_connection","fromModId":"{a}","fromPort":"radius","toModId":"{b}","toPort":"amount"}},
                {{"action":"add_modifier","type":"invert"}}]"#
        );
        let actions = parse_actions(&json).unwrap();
        let report = apply_actions(&mut doc, &mut history, &actions).unwrap();

        assert_eq!(report.applied, 3);
        assert_eq!(report.skipped_duplicates, 1);
        assert_eq!(report.added_modifiers.len(), 1);
        let l = doc.layer(layer).unwrap();
        assert_eq!(l.connections.len(), 1);
        assert_eq!(l.modifiers.len(), 3);
        assert_eq!(l.modifier(a).unwrap().number("radius", 0.0), 12.0);

        assert_eq!(history.undo_count(), 1);
        history.undo(&mut doc);
        assert_eq!(doc.layer(layer).unwrap().modifiers.len(), 2);
        assert!(doc.layer(layer).unwrap().connections.is_empty());
    }

    #[test]
    fn failure_rolls_back_everything() {
        let (mut doc, mut history, _, a, _) = setup();
        let snapshot = doc.clone();
        let actions = vec![
            AiAction::ReplaceLayerContent { content: "new".into() },
            AiAction::UpdateModifierParams { mod_id: Uuid::new_v4(), params: BTreeMap::new() },
            AiAction::UpdateModifierParams { mod_id: a, params: BTreeMap::new() },
        ];
        let err = apply_actions(&mut doc, &mut history, &actions).unwrap_err();
        assert!(matches!(err, ActionError::Failed { index: 1, .. }));
        assert_eq!(doc, snapshot);
        assert_eq!(history.undo_count(), 0);
    }

    #[test]
    fn requires_selection() {
        let mut doc = Document::new(10, 10);
        let mut history = HistoryManager::default();
        let err = apply_actions(&mut doc, &mut history, &[]).unwrap_err();
        assert!(matches!(err, ActionError::Document(DocumentError::NoSelection)));
    }
}
