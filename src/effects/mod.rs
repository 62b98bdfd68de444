//! Per-layer effects: the filter chain, its CPU interpreter and the blend kernels.

pub mod blend;
pub mod filter;
pub mod filter_cpu;
