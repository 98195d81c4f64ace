//! Render pipelines and their bind group layouts.
//!
//! - `basic`: the shared pipeline builder and the lit model pipeline
//! - `light`: the light uniform and its GPU resources
//! - `transition`: the transparent, double sided pipeline of the ground plane

pub mod basic;
pub mod light;
pub mod transition;
