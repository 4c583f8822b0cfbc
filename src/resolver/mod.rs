//! Selection and material resolution.
//!
//! This module decides, for a user's choice of variant and optional elements, which
//! model file to import, which object anchors it, and which materials bind to which
//! material slots.

pub mod material;
pub mod selection;
pub mod state;

pub use material::{
    classify_slot, required_materials, EyeSide, MaterialKind, MaterialSet, SlotMaterial,
};
pub use selection::{resolve_selection, ResolvedSelection, TexturePaths};
pub use state::SelectionState;
