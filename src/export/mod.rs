//! Raster export of documents to PNG and JPEG.

pub mod raster;
