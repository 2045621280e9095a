use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{Connection, Document, Layer, LayerKind};
use crate::modifier::{Modifier, ModifierType, ParamValue};
use crate::ops::pattern::{GeneratorState, MaskData, PatternError};

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid pattern state: {0}")]
    Pattern(#[from] PatternError),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// MWV PROJECT FILE FORMAT
// ============================================================================

/// Magic header for the bincode project format.
const MWV_MAGIC_V1: &str = "MWV1";

/// Maximum number of layers in a project file.
const MAX_LAYERS: usize = 256;

// bincode cannot drive untagged enums, so the file uses plain mirrors of the
// document types: params become a tagged enum and generator state is stored
// as its JSON text.

#[derive(Serialize, Deserialize)]
struct ProjectFileV1 {
    magic: String,
    width: u32,
    height: u32,
    selected_layer: Option<Uuid>,
    layers: Vec<LayerDataV1>,
}

#[derive(Serialize, Deserialize)]
struct LayerDataV1 {
    id: Uuid,
    name: String,
    kind: LayerKind,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rotation: f64,
    opacity: f64,
    content: Option<String>,
    modifiers: Vec<ModifierDataV1>,
    connections: Vec<Connection>,
    generator_json: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct ModifierDataV1 {
    id: Uuid,
    kind: ModifierType,
    name: String,
    active: bool,
    params: Vec<(String, ParamData)>,
    last_used: Option<u64>,
    is_favorite: bool,
}

#[derive(Serialize, Deserialize)]
enum ParamData {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl From<&ParamValue> for ParamData {
    fn from(v: &ParamValue) -> Self {
        match v {
            ParamValue::Number(n) => ParamData::Number(*n),
            ParamValue::Bool(b) => ParamData::Bool(*b),
            ParamValue::Text(s) => ParamData::Text(s.clone()),
        }
    }
}

impl From<ParamData> for ParamValue {
    fn from(v: ParamData) -> Self {
        match v {
            ParamData::Number(n) => ParamValue::Number(n),
            ParamData::Bool(b) => ParamValue::Bool(b),
            ParamData::Text(s) => ParamValue::Text(s),
        }
    }
}

fn build_project_v1(doc: &Document) -> Result<ProjectFileV1, ProjectError> {
    let layers = doc
        .layers
        .iter()
        .map(|layer| -> Result<LayerDataV1, ProjectError> {
            let generator_json = layer.generator.as_ref().map(GeneratorState::to_json).transpose()?;
            Ok(LayerDataV1 {
                id: layer.id,
                name: layer.name.clone(),
                kind: layer.kind,
                x: layer.x,
                y: layer.y,
                width: layer.width,
                height: layer.height,
                rotation: layer.rotation,
                opacity: layer.opacity,
                content: layer.content.clone(),
                modifiers: layer
                    .modifiers
                    .iter()
                    .map(|m| ModifierDataV1 {
                        id: m.id,
                        kind: m.kind,
                        name: m.name.clone(),
                        active: m.active,
                        params: m.params.iter().map(|(k, v)| (k.clone(), v.into())).collect(),
                        last_used: m.last_used,
                        is_favorite: m.is_favorite,
                    })
                    .collect(),
                connections: layer.connections.clone(),
                generator_json,
            })
        })
        .collect::<Result<Vec<_>, ProjectError>>()?;

    Ok(ProjectFileV1 {
        magic: MWV_MAGIC_V1.to_string(),
        width: doc.width,
        height: doc.height,
        selected_layer: doc.selected_layer,
        layers,
    })
}

fn document_from_v1(project: ProjectFileV1) -> Result<Document, ProjectError> {
    if project.layers.len() > MAX_LAYERS {
        return Err(ProjectError::InvalidFormat(format!(
            "{} layers exceeds the limit of {}",
            project.layers.len(),
            MAX_LAYERS
        )));
    }

    let mut layers = Vec::with_capacity(project.layers.len());
    for data in project.layers {
        let generator = data
            .generator_json
            .as_deref()
            .map(GeneratorState::from_json)
            .transpose()?;
        layers.push(Layer {
            id: data.id,
            name: data.name,
            kind: data.kind,
            x: data.x,
            y: data.y,
            width: data.width,
            height: data.height,
            rotation: data.rotation,
            opacity: data.opacity,
            content: data.content,
            modifiers: data
                .modifiers
                .into_iter()
                .map(|m| Modifier {
                    id: m.id,
                    kind: m.kind,
                    name: m.name,
                    active: m.active,
                    params: m.params.into_iter().map(|(k, v)| (k, v.into())).collect(),
                    last_used: m.last_used,
                    is_favorite: m.is_favorite,
                })
                .collect(),
            connections: data.connections,
            generator,
        });
    }

    let selected_layer = project
        .selected_layer
        .filter(|id| layers.iter().any(|l| l.id == *id));
    Ok(Document {
        width: project.width,
        height: project.height,
        layers,
        selected_layer,
    })
}

/// Save a document as a `.mwv` project file.
pub fn save_project(doc: &Document, path: &Path) -> Result<(), ProjectError> {
    let project = build_project_v1(doc)?;
    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, &project)?;
    crate::log_info!("saved project {} ({} layers)", path.display(), doc.layers.len());
    Ok(())
}

pub fn load_project(path: &Path) -> Result<Document, ProjectError> {
    let raw = std::fs::read(path)?;
    let doc = project_from_bytes(&raw)?;
    crate::log_info!("loaded project {} ({} layers)", path.display(), doc.layers.len());
    Ok(doc)
}

pub fn project_to_bytes(doc: &Document) -> Result<Vec<u8>, ProjectError> {
    Ok(bincode::serialize(&build_project_v1(doc)?)?)
}

pub fn project_from_bytes(raw: &[u8]) -> Result<Document, ProjectError> {
    if raw.len() < 12 {
        return Err(ProjectError::InvalidFormat("file too small".into()));
    }
    // bincode writes an 8-byte length prefix before the magic string.
    let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
    match magic {
        MWV_MAGIC_V1 => document_from_v1(bincode::deserialize(raw)?),
        _ => Err(ProjectError::InvalidFormat(format!("unknown magic '{}'", magic))),
    }
}

// ============================================================================
// JSON DOCUMENTS
// ============================================================================

pub fn save_document_json(doc: &Document, path: &Path) -> Result<(), ProjectError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, doc)?;
    Ok(())
}

pub fn load_document_json(path: &Path) -> Result<Document, ProjectError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Load a `.mwv` project or a JSON document, chosen by extension.
pub fn load_document(path: &Path) -> Result<Document, ProjectError> {
    if has_extension(path, "mwv") {
        load_project(path)
    } else {
        load_document_json(path)
    }
}

pub fn save_document(doc: &Document, path: &Path) -> Result<(), ProjectError> {
    if has_extension(path, "mwv") {
        save_project(doc, path)
    } else {
        save_document_json(doc, path)
    }
}

/// Read and validate a pattern generator state.
pub fn load_generator_state(path: &Path) -> Result<GeneratorState, ProjectError> {
    let state = GeneratorState::from_json(&std::fs::read_to_string(path)?)?;
    state.validate()?;
    Ok(state)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

// ============================================================================
// IMAGES AND DATA URIS
// ============================================================================

pub fn load_image(path: &Path) -> Result<RgbaImage, ProjectError> {
    Ok(image::open(path)?.into_rgba8())
}

/// Load an image and reduce it to a luminance mask.
pub fn load_mask(path: &Path) -> Result<MaskData, ProjectError> {
    Ok(MaskData::from_image(&load_image(path)?))
}

/// Save an image; the format follows the extension (JPEG drops alpha).
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<(), ProjectError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut writer = BufWriter::new(File::create(path)?);
            JpegEncoder::new_with_quality(&mut writer, 90).write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ColorType::Rgb8,
            )?;
        }
        "png" => {
            let writer = BufWriter::new(File::create(path)?);
            PngEncoder::new(writer).write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        _ => image.save(path)?,
    }
    Ok(())
}

/// A decoded `data:` URI.
#[derive(Clone, Debug, PartialEq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

pub fn encode_png_data_uri(image: &RgbaImage) -> Result<String, ProjectError> {
    let mut buf = Cursor::new(Vec::new());
    PngEncoder::new(&mut buf).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(buf.into_inner())))
}

pub fn decode_data_uri(uri: &str) -> Result<DataUri, ProjectError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ProjectError::InvalidFormat("not a data URI".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ProjectError::InvalidFormat("data URI has no payload".into()))?;

    let (mime, is_base64) = match header.strip_suffix(";base64") {
        Some(m) => (m, true),
        None => (header, false),
    };
    let bytes = if is_base64 {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| ProjectError::InvalidFormat(format!("bad base64: {}", e)))?
    } else {
        payload.as_bytes().to_vec()
    };
    let mime = mime.split(';').next().unwrap_or("");
    Ok(DataUri {
        mime: if mime.is_empty() { "text/plain".to_string() } else { mime.to_string() },
        bytes,
    })
}

/// Decode a raster data URI (PNG, JPEG, ...) into RGBA pixels.
pub fn decode_image_data_uri(uri: &str) -> Result<RgbaImage, ProjectError> {
    let data = decode_data_uri(uri)?;
    if !data.mime.starts_with("image/") || data.mime == "image/svg+xml" {
        return Err(ProjectError::InvalidFormat(format!("'{}' is not a raster image", data.mime)));
    }
    Ok(image::load_from_memory(&data.bytes)?.into_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::pattern::{self, MaskAttribute};
    use image::Rgba;

    fn sample_document() -> Document {
        let mut doc = Document::new(320, 200);
        let photo = doc.add_layer(Layer::new("Photo", LayerKind::Image, 320.0, 200.0));
        let a = doc.add_modifier(photo, ModifierType::Blur).unwrap();
        let b = doc.add_modifier(photo, ModifierType::Duotone).unwrap();
        doc.layer_mut(photo).unwrap().modifiers[1]
            .params
            .insert("color".into(), ParamValue::Text("#ff8800".into()));
        doc.add_connection(
            photo,
            Connection { from_mod_id: a, from_port: "out".into(), to_mod_id: b, to_port: "amount".into() },
        )
        .unwrap();

        let mut pattern_layer = Layer::new("Dots", LayerKind::Procedural, 10.0, 10.0);
        if let Some(state) = pattern_layer.generator.as_mut() {
            state.mask.settings.enable(MaskAttribute::Width, 0.2, 1.0);
        }
        doc.add_layer(pattern_layer);
        doc.select(photo).unwrap();
        doc
    }

    #[test]
    fn bincode_project_round_trip() {
        let doc = sample_document();
        let bytes = project_to_bytes(&doc).unwrap();
        assert_eq!(&bytes[8..12], b"MWV1");
        assert_eq!(project_from_bytes(&bytes).unwrap(), doc);
    }

    #[test]
    fn rejects_unknown_magic() {
        let mut bytes = project_to_bytes(&sample_document()).unwrap();
        bytes[8..12].copy_from_slice(b"PFE1");
        assert!(matches!(project_from_bytes(&bytes), Err(ProjectError::InvalidFormat(_))));
        assert!(matches!(project_from_bytes(b"MW"), Err(ProjectError::InvalidFormat(_))));
    }

    #[test]
    fn png_data_uri_round_trip() {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        img.put_pixel(2, 1, Rgba([200, 0, 0, 128]));
        let uri = encode_png_data_uri(&img).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(decode_image_data_uri(&uri).unwrap(), img);
    }

    #[test]
    fn svg_data_uri_decodes_to_markup() {
        let svg = pattern::generate(&GeneratorState::default(), None);
        let data = decode_data_uri(&pattern::to_data_uri(&svg)).unwrap();
        assert_eq!(data.mime, "image/svg+xml");
        assert_eq!(String::from_utf8(data.bytes).unwrap(), svg);
        assert!(decode_image_data_uri(&pattern::to_data_uri(&svg)).is_err());
    }

    #[test]
    fn plain_data_uri() {
        let data = decode_data_uri("data:,hello").unwrap();
        assert_eq!(data.mime, "text/plain");
        assert_eq!(data.bytes, b"hello");
        assert!(decode_data_uri("http://example.com").is_err());
    }
}
