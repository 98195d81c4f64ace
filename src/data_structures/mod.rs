//! Scene data structures: models, textures, instances and the transition plane.
//!
//! - `model` contains mesh and material definitions, GPU resources for the loaded model
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-object transformation data
//! - `plane` builds the ground plane and its transition material

pub mod instance;
pub mod model;
pub mod plane;
pub mod texture;
