//! Optimizer phases
//!
//! - `normalize`:  phase 0, input indexing and sanitation
//! - `allocation`: phase 1, demand allocation and reference fallback
//! - `filler`:     phase 2, free-shipping packing
//! - `finalize`:   phase 3, strict trimming and plan assembly

mod allocation;
mod filler;
mod finalize;
mod normalize;
mod pipeline;
mod state;

pub use pipeline::{run_pipeline, run_pipeline_with_config};
