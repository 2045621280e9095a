pub mod actions;
pub mod filters;
pub mod liquify;
pub mod pattern;
pub mod preview;
