//! Asset decoding and the per-session asset store.

pub mod decode;
pub mod store;
