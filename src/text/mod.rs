//! Fonts, shaping and the typography renderer for text layers.

pub mod fonts;
pub mod layout;
pub mod renderer;
