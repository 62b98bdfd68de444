//! The editable document: ordered layers, colors and typography settings.

pub mod color;
pub mod model;
pub mod typography;
