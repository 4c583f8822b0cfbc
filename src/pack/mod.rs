//! ChatAvatar pack archives.
//!
//! A pack is a zip archive holding up to four model/texture variants plus optional
//! elements. [`rules`] decides what an entry list offers, [`extract`] unpacks it
//! without overwriting anything, and [`UnpackedPack`] ties both together.

pub mod extract;
pub mod loader;
pub mod mtl;
pub mod rules;

pub use extract::{extract, extract_with_rng};
pub use loader::{pack_name, UnpackMode, UnpackedPack};
pub use mtl::generate_mtl_files;
pub use rules::{additional_elements, list_packs, EntryList};
