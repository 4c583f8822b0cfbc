//! # ChatAvatar Import
//!
//! A Rust library for importing ChatAvatar content packs and rebuilding their
//! skinned, blend-shape-bearing head meshes as USD.
//!
//! ## Overview
//!
//! A ChatAvatar pack is a zip archive with up to four model/texture variants
//! (2K or 4K textures, MetaHuman or Default topology) and optional elements for
//! Default packs: a rigged body, eye and teeth components, expression blend shapes
//! and back-of-head textures. This library:
//!
//! - detects which variants and elements a pack carries and extracts it without
//!   overwriting existing files,
//! - resolves a user's selection to a model file, an anchor object and the
//!   material set to bind,
//! - reads the glTF-style interchange document converted from the chosen model and
//!   rebuilds the original polygon mesh (quads, material subsets, blend shapes,
//!   skeleton and joint influences),
//! - writes the result as a USDA layer.
//!
//! ## Quick Start
//!
//! ```ignore
//! use chatavatar_import::{
//!     export_usda, load_gltf, load_pack, reconstruct, AdditionalElements, PackVariant,
//!     TextureResolution, Topology, UnpackMode, UsdExportOptions,
//! };
//!
//! // Inspect and extract a pack
//! let pack = load_pack("path/to/avatar.zip", UnpackMode::Temp)?;
//! let variant = PackVariant::new(TextureResolution::TwoK, Topology::Default);
//! let selection = pack.resolve(variant, AdditionalElements::BLEND_SHAPES)?;
//! println!("model: {}", selection.model_path_in(&pack.root).display());
//!
//! // Rebuild a converted model and export it
//! let scene = load_gltf("path/to/model.gltf")?;
//! let mesh = reconstruct(&scene)?;
//! let usda = export_usda(&mesh, &UsdExportOptions::default())?;
//! ```

pub mod error;
pub mod export;
pub mod interchange;
pub mod pack;
pub mod reconstruct;
pub mod resolver;
pub mod types;

// Re-export main types for convenience
pub use error::{ImportError, Result};
pub use export::{export_usda, write_usda, UsdExportOptions};
pub use interchange::{load_gltf, parse_gltf, InterchangeScene};
pub use pack::{generate_mtl_files, UnpackMode, UnpackedPack};
pub use reconstruct::{
    reconstruct, MergeTolerance, ReconstructConfig, ReconstructedMesh, Reconstructor,
};
pub use resolver::{
    classify_slot, required_materials, resolve_selection, MaterialKind, MaterialSet,
    ResolvedSelection, SelectionState, SlotMaterial,
};
pub use types::{AdditionalElements, PackVariant, TextureResolution, Topology};

/// Open a pack archive and extract it.
pub fn load_pack<P: AsRef<std::path::Path>>(path: P, mode: UnpackMode) -> Result<UnpackedPack> {
    UnpackedPack::open(path, mode)
}
