// ============================================================================
// DOCUMENT MODEL: layers, modifier stacks, same-layer connection graphs
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modifier::{Modifier, ModifierType, ParamValue};
use crate::ops::pattern::{self, GeneratorState, MaskData};
use crate::ops::preview::{self, PreviewStyle};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("layer {0} not found")]
    LayerNotFound(Uuid),
    #[error("modifier {modifier} not found on layer {layer}")]
    ModifierNotFound { layer: Uuid, modifier: Uuid },
    #[error("no layer is selected")]
    NoSelection,
    #[error("a modifier cannot be connected to itself")]
    SelfConnection,
    #[error("layer {0} is not a procedural layer")]
    NotProcedural(Uuid),
    #[error("layer index {index} out of range ({len} layers)")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    #[default]
    Image,
    Text,
    Shape,
    Procedural,
}

/// Directed parameter route between two modifiers of the same layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from_mod_id: Uuid,
    pub from_port: String,
    pub to_mod_id: Uuid,
    pub to_port: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub opacity: f64,
    /// Image data URI, text body, or rendered procedural output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Pattern configuration for procedural layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorState>,
}

impl Layer {
    pub fn new(name: impl Into<String>, kind: LayerKind, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            x: 0.0,
            y: 0.0,
            width,
            height,
            rotation: 0.0,
            opacity: 1.0,
            content: None,
            modifiers: Vec::new(),
            connections: Vec::new(),
            generator: (kind == LayerKind::Procedural).then(GeneratorState::default),
        }
    }

    pub fn modifier(&self, id: Uuid) -> Option<&Modifier> {
        self.modifiers.iter().find(|m| m.id == id)
    }

    pub fn modifier_mut(&mut self, id: Uuid) -> Option<&mut Modifier> {
        self.modifiers.iter_mut().find(|m| m.id == id)
    }

    fn modifier_index(&self, id: Uuid) -> Result<usize, DocumentError> {
        self.modifiers
            .iter()
            .position(|m| m.id == id)
            .ok_or(DocumentError::ModifierNotFound { layer: self.id, modifier: id })
    }

    /// Insert a connection. Returns `Ok(false)` when an identical connection
    /// already exists (nothing is stored).
    pub fn add_connection(&mut self, conn: Connection) -> Result<bool, DocumentError> {
        if conn.from_mod_id == conn.to_mod_id {
            return Err(DocumentError::SelfConnection);
        }
        self.modifier_index(conn.from_mod_id)?;
        self.modifier_index(conn.to_mod_id)?;
        if self.connections.contains(&conn) {
            crate::log_info!(
                "layer {}: duplicate connection {}:{} -> {}:{} skipped",
                self.id, conn.from_mod_id, conn.from_port, conn.to_mod_id, conn.to_port
            );
            return Ok(false);
        }
        self.connections.push(conn);
        Ok(true)
    }

    /// Preview style of this layer's modifier stack.
    pub fn preview_style(&self) -> PreviewStyle {
        preview::approximate(&self.modifiers)
    }
}

/// The whole document: an ordered layer list (bottom first) and selection.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub selected_layer: Option<Uuid>,
}

impl Document {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
            selected_layer: None,
        }
    }

    // -- Layers ----------------------------------------------------------

    /// Append a layer on top and select it.
    pub fn add_layer(&mut self, layer: Layer) -> Uuid {
        let id = layer.id;
        self.layers.push(layer);
        self.selected_layer = Some(id);
        id
    }

    pub fn remove_layer(&mut self, id: Uuid) -> Result<Layer, DocumentError> {
        let idx = self.layer_index(id)?;
        let removed = self.layers.remove(idx);
        if self.selected_layer == Some(id) {
            self.selected_layer = self.layers.last().map(|l| l.id);
        }
        Ok(removed)
    }

    pub fn move_layer(&mut self, id: Uuid, to_index: usize) -> Result<(), DocumentError> {
        let from = self.layer_index(id)?;
        if to_index >= self.layers.len() {
            return Err(DocumentError::IndexOutOfRange { index: to_index, len: self.layers.len() });
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to_index, layer);
        Ok(())
    }

    pub fn layer_index(&self, id: Uuid) -> Result<usize, DocumentError> {
        self.layers
            .iter()
            .position(|l| l.id == id)
            .ok_or(DocumentError::LayerNotFound(id))
    }

    pub fn layer(&self, id: Uuid) -> Result<&Layer, DocumentError> {
        self.layers.iter().find(|l| l.id == id).ok_or(DocumentError::LayerNotFound(id))
    }

    pub fn layer_mut(&mut self, id: Uuid) -> Result<&mut Layer, DocumentError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(DocumentError::LayerNotFound(id))
    }

    pub fn select(&mut self, id: Uuid) -> Result<(), DocumentError> {
        self.layer_index(id)?;
        self.selected_layer = Some(id);
        Ok(())
    }

    pub fn selected_id(&self) -> Result<Uuid, DocumentError> {
        self.selected_layer.ok_or(DocumentError::NoSelection)
    }

    pub fn set_layer_content(&mut self, id: Uuid, content: impl Into<String>) -> Result<(), DocumentError> {
        self.layer_mut(id)?.content = Some(content.into());
        Ok(())
    }

    // -- Modifiers -------------------------------------------------------

    /// Append a modifier of `kind` to the end of the layer's stack.
    pub fn add_modifier(&mut self, layer_id: Uuid, kind: ModifierType) -> Result<Uuid, DocumentError> {
        self.push_modifier(layer_id, Modifier::new(kind))
    }

    pub fn push_modifier(&mut self, layer_id: Uuid, modifier: Modifier) -> Result<Uuid, DocumentError> {
        let id = modifier.id;
        self.layer_mut(layer_id)?.modifiers.push(modifier);
        Ok(id)
    }

    /// Remove a modifier and every connection touching it.
    pub fn remove_modifier(&mut self, layer_id: Uuid, mod_id: Uuid) -> Result<Modifier, DocumentError> {
        let layer = self.layer_mut(layer_id)?;
        let idx = layer.modifier_index(mod_id)?;
        layer
            .connections
            .retain(|c| c.from_mod_id != mod_id && c.to_mod_id != mod_id);
        Ok(layer.modifiers.remove(idx))
    }

    pub fn update_modifier_params(
        &mut self,
        layer_id: Uuid,
        mod_id: Uuid,
        params: BTreeMap<String, ParamValue>,
    ) -> Result<(), DocumentError> {
        let layer = self.layer_mut(layer_id)?;
        let idx = layer.modifier_index(mod_id)?;
        layer.modifiers[idx].merge_params(params);
        Ok(())
    }

    /// Flip a modifier's `active` flag; returns the new state.
    pub fn toggle_modifier(&mut self, layer_id: Uuid, mod_id: Uuid) -> Result<bool, DocumentError> {
        let layer = self.layer_mut(layer_id)?;
        let idx = layer.modifier_index(mod_id)?;
        let m = &mut layer.modifiers[idx];
        m.active = !m.active;
        Ok(m.active)
    }

    pub fn reorder_modifier(&mut self, layer_id: Uuid, mod_id: Uuid, to_index: usize) -> Result<(), DocumentError> {
        let layer = self.layer_mut(layer_id)?;
        let from = layer.modifier_index(mod_id)?;
        if to_index >= layer.modifiers.len() {
            return Err(DocumentError::IndexOutOfRange { index: to_index, len: layer.modifiers.len() });
        }
        let m = layer.modifiers.remove(from);
        layer.modifiers.insert(to_index, m);
        Ok(())
    }

    // -- Connections -----------------------------------------------------

    pub fn add_connection(&mut self, layer_id: Uuid, conn: Connection) -> Result<bool, DocumentError> {
        self.layer_mut(layer_id)?.add_connection(conn)
    }

    /// Returns whether a matching connection was removed.
    pub fn remove_connection(&mut self, layer_id: Uuid, conn: &Connection) -> Result<bool, DocumentError> {
        let layer = self.layer_mut(layer_id)?;
        let before = layer.connections.len();
        layer.connections.retain(|c| c != conn);
        Ok(layer.connections.len() != before)
    }

    // -- Rendering -------------------------------------------------------

    pub fn preview_style(&self, layer_id: Uuid) -> Result<PreviewStyle, DocumentError> {
        Ok(self.layer(layer_id)?.preview_style())
    }

    /// Regenerate a procedural layer's SVG and store it as the layer content
    /// (data URI). Returns the render report.
    pub fn render_procedural(
        &mut self,
        layer_id: Uuid,
        mask: Option<&MaskData>,
    ) -> Result<pattern::PatternRender, DocumentError> {
        let layer = self.layer_mut(layer_id)?;
        let state = match (&layer.kind, &layer.generator) {
            (LayerKind::Procedural, Some(state)) => state,
            _ => return Err(DocumentError::NotProcedural(layer_id)),
        };
        let render = pattern::render(state, mask);
        layer.content = Some(pattern::to_data_uri(&render.svg));
        layer.width = render.width;
        layer.height = render.height;
        Ok(render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_two_mods() -> (Document, Uuid, Uuid, Uuid) {
        let mut doc = Document::new(800, 600);
        let layer = doc.add_layer(Layer::new("Photo", LayerKind::Image, 800.0, 600.0));
        let a = doc.add_modifier(layer, ModifierType::Blur).unwrap();
        let b = doc.add_modifier(layer, ModifierType::Glow).unwrap();
        (doc, layer, a, b)
    }

    fn conn(a: Uuid, b: Uuid) -> Connection {
        Connection {
            from_mod_id: a,
            from_port: "out".into(),
            to_mod_id: b,
            to_port: "radius".into(),
        }
    }

    #[test]
    fn duplicate_connection_is_stored_once() {
        let (mut doc, layer, a, b) = doc_with_two_mods();
        assert_eq!(doc.add_connection(layer, conn(a, b)), Ok(true));
        assert_eq!(doc.add_connection(layer, conn(a, b)), Ok(false));
        assert_eq!(doc.layer(layer).unwrap().connections.len(), 1);
    }

    #[test]
    fn connection_requires_modifiers_on_same_layer() {
        let (mut doc, layer, a, _) = doc_with_two_mods();
        let other = doc.add_layer(Layer::new("Other", LayerKind::Shape, 10.0, 10.0));
        let foreign = doc.add_modifier(other, ModifierType::Sepia).unwrap();
        assert!(matches!(
            doc.add_connection(layer, conn(a, foreign)),
            Err(DocumentError::ModifierNotFound { .. })
        ));
        assert_eq!(doc.add_connection(layer, conn(a, a)), Err(DocumentError::SelfConnection));
    }

    #[test]
    fn removing_modifier_drops_its_connections() {
        let (mut doc, layer, a, b) = doc_with_two_mods();
        doc.add_connection(layer, conn(a, b)).unwrap();
        doc.remove_modifier(layer, b).unwrap();
        let l = doc.layer(layer).unwrap();
        assert!(l.connections.is_empty());
        assert_eq!(l.modifiers.len(), 1);
    }

    #[test]
    fn reorder_changes_preview_order() {
        let (mut doc, layer, _, b) = doc_with_two_mods();
        doc.reorder_modifier(layer, b, 0).unwrap();
        let css = doc.preview_style(layer).unwrap().to_css_filter();
        assert!(css.starts_with("drop-shadow"), "{css}");
        assert!(doc.reorder_modifier(layer, b, 5).is_err());
    }

    #[test]
    fn toggle_and_update_params() {
        let (mut doc, layer, a, _) = doc_with_two_mods();
        assert_eq!(doc.toggle_modifier(layer, a), Ok(false));
        let mut params = BTreeMap::new();
        params.insert("radius".to_string(), ParamValue::Number(9.0));
        doc.update_modifier_params(layer, a, params).unwrap();
        let m = doc.layer(layer).unwrap().modifier(a).unwrap();
        assert_eq!(m.number("radius", 0.0), 9.0);
        assert!(!m.active);
    }

    #[test]
    fn removing_selected_layer_selects_top() {
        let mut doc = Document::new(10, 10);
        let bottom = doc.add_layer(Layer::new("a", LayerKind::Image, 1.0, 1.0));
        let top = doc.add_layer(Layer::new("b", LayerKind::Image, 1.0, 1.0));
        assert_eq!(doc.selected_layer, Some(top));
        doc.remove_layer(top).unwrap();
        assert_eq!(doc.selected_layer, Some(bottom));
    }

    #[test]
    fn render_procedural_sets_content() {
        let mut doc = Document::new(10, 10);
        let id = doc.add_layer(Layer::new("Pattern", LayerKind::Procedural, 1.0, 1.0));
        let render = doc.render_procedural(id, None).unwrap();
        let layer = doc.layer(id).unwrap();
        assert!(layer.content.as_deref().unwrap().starts_with("data:image/svg+xml;base64,"));
        assert_eq!(layer.width, render.width);

        let img = doc.add_layer(Layer::new("Photo", LayerKind::Image, 1.0, 1.0));
        assert_eq!(doc.render_procedural(img, None).unwrap_err(), DocumentError::NotProcedural(img));
    }

    #[test]
    fn document_json_round_trip() {
        let (doc, _, _, _) = doc_with_two_mods();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains(r#""type":"image""#));
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
