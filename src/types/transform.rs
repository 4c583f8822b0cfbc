//! Node transforms and the interchange-to-scene change of basis.

use glam::{DMat4, DQuat, DVec3};

/// A 4x4 matrix in scene-document layout: row-vector convention, translation in the
/// last row. Row `i` of this array equals column `i` of the math matrix.
pub type RowMatrix = [[f64; 4]; 4];

/// Change of basis applied to every joint matrix: swap Y/Z, negate the new Z.
pub const COORD_CONVERT: RowMatrix = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Local translation/rotation/scale of an interchange node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translation: [f32; 3],
    /// Quaternion as (x, y, z, w).
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            translation: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
        }
    }
}

impl NodeTransform {
    /// Check if this is an identity transform.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Compose the math matrix `T * R * S`.
    pub fn to_mat4(&self) -> DMat4 {
        let [x, y, z, w] = self.rotation.map(f64::from);
        DMat4::from_scale_rotation_translation(
            DVec3::from_array(self.scale.map(f64::from)),
            DQuat::from_xyzw(x, y, z, w).normalize(),
            DVec3::from_array(self.translation.map(f64::from)),
        )
    }
}

/// Lay out a math matrix in scene-document row order.
pub fn to_row_matrix(m: DMat4) -> RowMatrix {
    m.to_cols_array_2d()
}

/// Right-multiply a math matrix, in row layout, by [`COORD_CONVERT`].
pub fn convert_basis(m: DMat4) -> RowMatrix {
    // Columns built from the rows of COORD_CONVERT give its transpose.
    let convert_t = DMat4::from_cols_array_2d(&COORD_CONVERT);
    to_row_matrix(convert_t * m)
}
