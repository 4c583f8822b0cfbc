//! Interchange scene input.
//!
//! Models arrive as glTF-style JSON documents converted from the pack's FBX files. The
//! converter splits each mesh into one triangulated primitive per material and adds two
//! custom channels: an `ORIGINAL_INDICES` vertex attribute mapping local vertices back to
//! the source mesh, and a per-triangle `faceindices` accessor holding the source polygon.

pub mod accessor;
pub mod document;
pub mod loader;
pub mod scene;

pub use accessor::{resolve_accessor, AccessorData, AccessorLayout, ComponentType, ElementType};
pub use loader::{load_gltf, parse_gltf};
pub use scene::{InterchangeScene, Mesh, Node, Primitive, Skin};
