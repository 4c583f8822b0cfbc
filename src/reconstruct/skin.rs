//! Skeleton and skin weight reconstruction.

use super::merge::{merge_primitive_arrays, MergeTolerance};
use crate::error::{ImportError, Result};
use crate::interchange::scene::{
    InterchangeScene, Primitive, Skin, JOINTS_PREFIX, WEIGHTS_PREFIX,
};
use crate::types::{convert_basis, safe_prim_name, RowMatrix, Table};
use std::collections::HashSet;

/// Skeleton joints with their bind and rest transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonData {
    /// Prim name, taken from the node above the root joint.
    pub name: String,
    /// `/`-separated joint paths starting at the root joint.
    pub joints: Vec<String>,
    pub bind_transforms: Vec<RowMatrix>,
    pub rest_transforms: Vec<RowMatrix>,
}

/// Per-vertex joint influences, `element_size` per shared vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinWeights {
    pub element_size: usize,
    pub joint_indices: Vec<i32>,
    pub joint_weights: Vec<f32>,
}

/// Build the skeleton of `skin`.
pub fn build_skeleton(scene: &InterchangeScene, skin: &Skin) -> Result<SkeletonData> {
    let joint_set: HashSet<usize> = skin.joints.iter().copied().collect();
    let roots: Vec<usize> = skin
        .joints
        .iter()
        .copied()
        .filter(|&j| !scene.parents[j].is_some_and(|p| joint_set.contains(&p)))
        .collect();
    let &[root_joint] = roots.as_slice() else {
        return Err(ImportError::Format(format!(
            "skin must have exactly one root joint, found {}",
            roots.len()
        )));
    };

    let holder = scene.parents[root_joint].ok_or_else(|| {
        ImportError::Format(format!(
            "root joint {} has no parent to name the skeleton",
            scene.nodes[root_joint].name
        ))
    })?;
    if scene.nodes[holder].children.len() != 1 {
        return Err(ImportError::Format(format!(
            "skeleton node {} must have exactly one child, has {}",
            scene.nodes[holder].name,
            scene.nodes[holder].children.len()
        )));
    }

    let joints = skin
        .joints
        .iter()
        .map(|&joint| joint_path(scene, joint, root_joint))
        .collect::<Result<Vec<_>>>()?;
    let bind_transforms = skin
        .inverse_bind_matrices
        .iter()
        .map(|ibm| convert_basis(ibm.inverse()))
        .collect();
    let rest_transforms = skin
        .joints
        .iter()
        .map(|&joint| convert_basis(scene.nodes[joint].transform.to_mat4()))
        .collect();

    Ok(SkeletonData {
        name: safe_prim_name(&scene.nodes[holder].name),
        joints,
        bind_transforms,
        rest_transforms,
    })
}

/// Node names from `root` down to `joint`, joined by `/`.
fn joint_path(scene: &InterchangeScene, joint: usize, root: usize) -> Result<String> {
    let mut names = vec![scene.nodes[joint].name.as_str()];
    let mut current = joint;
    // Bounded by the node count so a malformed hierarchy cannot loop.
    for _ in 0..scene.nodes.len() {
        if current == root {
            names.reverse();
            return Ok(names.join("/"));
        }
        current = scene.parents[current].ok_or_else(|| {
            ImportError::Format(format!(
                "joint {} is not below the root joint {}",
                scene.nodes[joint].name, scene.nodes[root].name
            ))
        })?;
        names.push(scene.nodes[current].name.as_str());
    }
    Err(ImportError::Format(format!(
        "joint {} does not reach the root joint",
        scene.nodes[joint].name
    )))
}

/// Joint index and weight columns of one primitive, sets joined in numeric order.
fn influence_columns(primitive: &Primitive, prefix: &str) -> Result<Option<Table>> {
    let sets: Vec<Table> = primitive
        .attribute_sets(prefix)
        .into_iter()
        .map(|(_, data)| data.table().clone())
        .collect();
    if sets.is_empty() {
        return Ok(None);
    }
    Table::hstack(&sets).map(Some)
}

/// Merge joint influences of all primitives, zero-padded to the widest primitive.
pub fn merge_skin_weights(
    primitives: &[Primitive],
    original_indices: &[&[usize]],
    vertex_count: usize,
    tolerance: &MergeTolerance,
) -> Result<SkinWeights> {
    let mut joints = Vec::with_capacity(primitives.len());
    let mut weights = Vec::with_capacity(primitives.len());
    for (p, primitive) in primitives.iter().enumerate() {
        let j = influence_columns(primitive, JOINTS_PREFIX)?;
        let w = influence_columns(primitive, WEIGHTS_PREFIX)?;
        let (jw, ww) = (j.as_ref().map_or(0, Table::width), w.as_ref().map_or(0, Table::width));
        if jw != ww {
            return Err(ImportError::Format(format!(
                "primitive {}: {} joint columns but {} weight columns",
                p, jw, ww
            )));
        }
        joints.push(j);
        weights.push(w);
    }

    let element_size = joints
        .iter()
        .map(|t| t.as_ref().map_or(0, Table::width))
        .max()
        .unwrap_or(0);
    if element_size == 0 {
        return Err(ImportError::Format(
            "skinned mesh has no joint influences".to_string(),
        ));
    }

    let pad = |tables: Vec<Option<Table>>| -> Result<Vec<Table>> {
        tables
            .into_iter()
            .zip(original_indices)
            .map(|(table, indices)| match table {
                Some(table) => Ok(table.padded(element_size)),
                None => Table::zeros(indices.len(), element_size),
            })
            .collect()
    };
    // Joint indices are integers and must agree exactly.
    let joints = merge_primitive_arrays(
        &pad(joints)?,
        original_indices,
        vertex_count,
        &MergeTolerance::EXACT,
    )?;
    let weights =
        merge_primitive_arrays(&pad(weights)?, original_indices, vertex_count, tolerance)?;

    Ok(SkinWeights {
        element_size,
        joint_indices: joints.values().iter().map(|&v| v as i32).collect(),
        joint_weights: weights.values().iter().map(|&v| v as f32).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::scene::Node;
    use crate::interchange::{
        resolve_accessor, AccessorData, AccessorLayout, ComponentType, ElementType,
    };
    use crate::types::{NodeTransform, COORD_CONVERT};
    use glam::DMat4;

    fn node(name: &str, children: Vec<usize>) -> Node {
        Node {
            name: name.to_string(),
            children,
            ..Default::default()
        }
    }

    /// root -> Armature -> hips -> spine
    fn rig() -> InterchangeScene {
        let mut nodes = vec![
            node("root", vec![1]),
            node("Armature.001", vec![2]),
            node("hips", vec![3]),
            node("spine", vec![]),
        ];
        nodes[3].transform = NodeTransform {
            translation: [0.0, 1.0, 0.0],
            ..Default::default()
        };
        InterchangeScene {
            nodes,
            parents: vec![None, Some(0), Some(1), Some(2)],
            ..Default::default()
        }
    }

    fn vec4_accessor(values: &[u8], normalized: bool) -> AccessorData {
        let layout = AccessorLayout {
            component_type: ComponentType::U8,
            element_type: ElementType::Vec4,
            count: values.len() / 4,
            byte_offset: 0,
            normalized,
        };
        resolve_accessor(0, values, &layout).unwrap()
    }

    #[test]
    fn test_skeleton_paths_and_transforms() {
        let scene = rig();
        let skin = Skin {
            joints: vec![2, 3],
            inverse_bind_matrices: vec![
                DMat4::IDENTITY,
                DMat4::from_translation(glam::DVec3::new(0.0, -1.0, 0.0)),
            ],
        };
        let skeleton = build_skeleton(&scene, &skin).unwrap();
        assert_eq!(skeleton.name, "Armature_001");
        assert_eq!(skeleton.joints, vec!["hips", "hips/spine"]);
        assert_eq!(skeleton.bind_transforms[0], COORD_CONVERT);
        // Translation (0, 1, 0) becomes (0, 0, 1) after the basis change.
        assert_eq!(skeleton.bind_transforms[1][3], [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(skeleton.rest_transforms[1], skeleton.bind_transforms[1]);
    }

    #[test]
    fn test_two_root_joints_rejected() {
        let mut scene = rig();
        scene.nodes.push(node("stray", vec![]));
        scene.parents.push(Some(0));
        scene.nodes[0].children.push(4);
        let skin = Skin {
            joints: vec![2, 4],
            inverse_bind_matrices: vec![DMat4::IDENTITY; 2],
        };
        assert!(matches!(build_skeleton(&scene, &skin), Err(ImportError::Format(_))));
    }

    #[test]
    fn test_skeleton_holder_needs_single_child() {
        let mut scene = rig();
        scene.nodes.push(node("mesh", vec![]));
        scene.parents.push(Some(1));
        scene.nodes[1].children.push(4);
        let skin = Skin {
            joints: vec![2, 3],
            inverse_bind_matrices: vec![DMat4::IDENTITY; 2],
        };
        let err = build_skeleton(&scene, &skin).unwrap_err();
        assert!(err.to_string().contains("Armature.001"));
    }

    #[test]
    fn test_weights_padded_to_widest_primitive() {
        let mut narrow = Primitive::default();
        narrow
            .attributes
            .insert("JOINTS_0".to_string(), vec4_accessor(&[1, 0, 0, 0], false));
        narrow
            .attributes
            .insert("WEIGHTS_0".to_string(), vec4_accessor(&[255, 0, 0, 0], true));

        let mut wide = narrow.clone();
        wide.attributes
            .insert("JOINTS_1".to_string(), vec4_accessor(&[2, 0, 0, 0], false));
        wide.attributes
            .insert("WEIGHTS_1".to_string(), vec4_accessor(&[0, 0, 0, 0], true));

        let indices: [&[usize]; 2] = [&[0], &[1]];
        let merged =
            merge_skin_weights(&[narrow, wide], &indices, 2, &MergeTolerance::default()).unwrap();
        assert_eq!(merged.element_size, 8);
        assert_eq!(
            merged.joint_indices,
            vec![1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0]
        );
        assert_eq!(merged.joint_weights[0], 1.0);
        assert_eq!(merged.joint_weights.len(), 16);
    }

    #[test]
    fn test_mismatched_influence_columns_rejected() {
        let mut primitive = Primitive::default();
        primitive
            .attributes
            .insert("JOINTS_0".to_string(), vec4_accessor(&[1, 0, 0, 0], false));
        let indices: [&[usize]; 1] = [&[0]];
        let err = merge_skin_weights(&[primitive], &indices, 1, &MergeTolerance::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::Format(_)));
    }

    #[test]
    fn test_joint_indices_compared_exactly() {
        let influenced = |joint: u8| {
            let mut primitive = Primitive::default();
            primitive
                .attributes
                .insert("JOINTS_0".to_string(), vec4_accessor(&[joint, 0, 0, 0], false));
            primitive
                .attributes
                .insert("WEIGHTS_0".to_string(), vec4_accessor(&[255, 0, 0, 0], true));
            primitive
        };
        let indices: [&[usize]; 2] = [&[0], &[0]];
        let loose = MergeTolerance {
            relative: 0.0,
            absolute: 1.5,
        };

        let err = merge_skin_weights(&[influenced(1), influenced(2)], &indices, 1, &loose)
            .unwrap_err();
        assert!(err.is_geometry_error());
        assert!(merge_skin_weights(&[influenced(1), influenced(1)], &indices, 1, &loose).is_ok());
    }
}
