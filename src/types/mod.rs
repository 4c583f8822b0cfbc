//! Shared types used throughout the library.

mod elements;
mod table;
mod transform;
mod variant;

pub use elements::AdditionalElements;
pub use table::Table;
pub use transform::{convert_basis, to_row_matrix, NodeTransform, RowMatrix, COORD_CONVERT};
pub use variant::{FileRole, PackVariant, TextureResolution, Topology};

/// Replace characters that are not legal in scene-document prim names.
pub fn safe_prim_name(name: &str) -> String {
    name.replace('.', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_prim_name() {
        assert_eq!(safe_prim_name("head.001"), "head_001");
        assert_eq!(safe_prim_name("Mesh"), "Mesh");
    }
}
