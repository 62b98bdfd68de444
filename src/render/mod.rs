//! Raster targets and the layer compositor.

pub mod compositor;
pub mod surface;
