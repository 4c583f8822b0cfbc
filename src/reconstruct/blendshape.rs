//! Blend shape reconstruction.

use super::merge::{merge_primitive_arrays, MergeTolerance};
use crate::error::{ImportError, Result};
use crate::interchange::scene::{Mesh, POSITION};
use crate::types::{safe_prim_name, Table};

/// A blend shape as sparse offsets over the shared points.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendShape {
    pub name: String,
    pub point_indices: Vec<usize>,
    pub offsets: Vec<[f32; 3]>,
}

impl BlendShape {
    /// Keep only points that move.
    pub fn from_dense(name: String, offsets: &Table) -> Self {
        let (point_indices, offsets) = offsets
            .rows()
            .enumerate()
            .filter(|(_, row)| row.iter().any(|&v| v != 0.0))
            .map(|(i, row)| (i, [row[0] as f32, row[1] as f32, row[2] as f32]))
            .unzip();
        Self {
            name,
            point_indices,
            offsets,
        }
    }
}

/// Merge every blend shape target of `mesh` into the shared vertex space.
///
/// A mesh declares blend shapes by carrying default weights; without them the result
/// is empty.
pub fn build_blend_shapes(
    mesh: &Mesh,
    original_indices: &[&[usize]],
    vertex_count: usize,
    tolerance: &MergeTolerance,
) -> Result<Vec<BlendShape>> {
    let Some(weights) = &mesh.weights else {
        return Ok(Vec::new());
    };

    let count = weights.len();
    if mesh.target_names.len() != count
        || mesh.primitives.iter().any(|p| p.targets.len() != count)
    {
        let targets: Vec<usize> = mesh.primitives.iter().map(|p| p.targets.len()).collect();
        return Err(ImportError::Format(format!(
            "mesh {}: {} weights, {} target names, primitive targets {:?}",
            mesh.name,
            count,
            mesh.target_names.len(),
            targets
        )));
    }

    let mut shapes = Vec::with_capacity(count);
    for (shape, target_name) in mesh.target_names.iter().enumerate() {
        let arrays = mesh
            .primitives
            .iter()
            .enumerate()
            .map(|(p, primitive)| {
                let data = primitive.targets[shape].get(POSITION).ok_or_else(|| {
                    ImportError::Format(format!(
                        "primitive {}: blend shape {} has no {}",
                        p, target_name, POSITION
                    ))
                })?;
                if data.width() != 3 {
                    return Err(ImportError::Format(format!(
                        "primitive {}: blend shape {} offsets are not 3D",
                        p, target_name
                    )));
                }
                Ok(data.table().clone())
            })
            .collect::<Result<Vec<_>>>()?;

        let dense = merge_primitive_arrays(&arrays, original_indices, vertex_count, tolerance)?;
        shapes.push(BlendShape::from_dense(safe_prim_name(target_name), &dense));
    }
    Ok(shapes)
}
