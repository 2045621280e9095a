#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod logger;

pub mod cli;
pub mod components;
pub mod document;
pub mod io;
pub mod math;
pub mod modifier;
pub mod ops;
pub mod project;

pub use document::{Connection, Document, DocumentError, Layer, LayerKind};
pub use modifier::{Modifier, ModifierType, ParamValue};
pub use project::Project;
