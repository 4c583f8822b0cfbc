//! Mesh reconstruction.
//!
//! Turns an [`InterchangeScene`] back into the single polygon mesh it was converted from:
//! one shared point buffer, triangles folded back into quads, one face subset per
//! material, sparse blend shapes and a skeleton with uniform-width joint influences.

pub mod blendshape;
pub mod fold;
pub mod merge;
pub mod skin;

pub use blendshape::BlendShape;
pub use fold::{fold_triangles, FoldSource, FoldedFaces};
pub use merge::{merge_primitive_arrays, MergeTolerance};
pub use skin::{SkeletonData, SkinWeights};

use crate::error::{ImportError, Result};
use crate::interchange::scene::{InterchangeScene, Mesh, ORIGINAL_INDICES, POSITION, TEXCOORD_0};
use crate::types::{safe_prim_name, Table};
use std::collections::HashSet;

/// Configuration for reconstruction.
#[derive(Debug, Clone)]
pub struct ReconstructConfig {
    /// Tolerance for vertices written by several primitives.
    pub tolerance: MergeTolerance,
    /// Rebuild blend shapes when the mesh has them.
    pub blend_shapes: bool,
    /// Rebuild the skeleton and joint influences when the mesh is skinned.
    pub skinning: bool,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            tolerance: MergeTolerance::default(),
            blend_shapes: true,
            skinning: true,
        }
    }
}

impl ReconstructConfig {
    pub fn with_tolerance(mut self, tolerance: MergeTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn without_blend_shapes(mut self) -> Self {
        self.blend_shapes = false;
        self
    }

    pub fn without_skinning(mut self) -> Self {
        self.skinning = false;
        self
    }
}

/// Faces bound to one material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSubset {
    pub material: usize,
    /// Prim-safe material name.
    pub name: String,
    /// Face ids in traversal order, without repeats.
    pub faces: Vec<usize>,
}

/// The rebuilt mesh, ready for a scene writer.
#[derive(Debug, Clone)]
pub struct ReconstructedMesh {
    /// Prim-safe name of the scene's root node.
    pub root_name: String,
    /// Prim-safe name of the mesh node.
    pub mesh_name: String,
    /// Prim-safe material names, by material id.
    pub materials: Vec<String>,
    pub points: Vec<[f32; 3]>,
    pub face_vertex_counts: Vec<u32>,
    pub face_vertex_indices: Vec<usize>,
    /// Face-varying texture coordinates.
    pub texcoords: Option<Vec<[f32; 2]>>,
    pub subsets: Vec<MaterialSubset>,
    pub blend_shapes: Vec<BlendShape>,
    pub skeleton: Option<SkeletonData>,
    pub skin_weights: Option<SkinWeights>,
}

impl ReconstructedMesh {
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub fn face_count(&self) -> usize {
        self.face_vertex_counts.len()
    }

    pub fn quad_count(&self) -> usize {
        self.face_vertex_counts.iter().filter(|&&c| c == 4).count()
    }

    pub fn is_skinned(&self) -> bool {
        self.skeleton.is_some()
    }
}

/// Rebuilds meshes from interchange scenes.
#[derive(Debug, Clone, Default)]
pub struct Reconstructor {
    config: ReconstructConfig,
}

impl Reconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReconstructConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconstructConfig {
        &self.config
    }

    /// Rebuild the single mesh of `scene`.
    ///
    /// The scene must have exactly one root node, exactly one mesh node and at most
    /// one skin.
    pub fn reconstruct(&self, scene: &InterchangeScene) -> Result<ReconstructedMesh> {
        let roots = scene.root_nodes();
        let &[root] = roots.as_slice() else {
            return Err(ImportError::Format(format!(
                "expected exactly one root node, found {}",
                roots.len()
            )));
        };
        let mesh_nodes = scene.mesh_nodes();
        let &[mesh_node] = mesh_nodes.as_slice() else {
            return Err(ImportError::Format(format!(
                "expected exactly one mesh node, found {}",
                mesh_nodes.len()
            )));
        };
        if scene.skins.len() > 1 {
            return Err(ImportError::Format(format!(
                "expected at most one skin, found {}",
                scene.skins.len()
            )));
        }

        let node = &scene.nodes[mesh_node];
        let mesh = node
            .mesh
            .and_then(|m| scene.meshes.get(m))
            .ok_or_else(|| ImportError::Format(format!("node {}: mesh missing", node.name)))?;
        if mesh.primitives.is_empty() {
            return Err(ImportError::Format(format!("mesh {} has no primitives", mesh.name)));
        }

        let original_indices = original_indices(mesh)?;
        let index_refs: Vec<&[usize]> = original_indices.iter().map(Vec::as_slice).collect();
        let vertex_count = index_refs
            .iter()
            .flat_map(|i| i.iter())
            .max()
            .map_or(0, |&m| m.saturating_add(1));
        let face_count = mesh
            .primitives
            .iter()
            .flat_map(|p| p.face_ids.iter())
            .max()
            .map_or(0, |&m| m.saturating_add(1));

        let positions = mesh
            .primitives
            .iter()
            .enumerate()
            .map(|(p, primitive)| match primitive.attribute(POSITION) {
                Some(data) if data.width() == 3 => Ok(data.table().clone()),
                _ => Err(ImportError::Format(format!(
                    "primitive {}: missing 3D {}",
                    p, POSITION
                ))),
            })
            .collect::<Result<Vec<Table>>>()?;
        let points =
            merge_primitive_arrays(&positions, &index_refs, vertex_count, &self.config.tolerance)?;

        let sources: Vec<FoldSource<'_>> = mesh
            .primitives
            .iter()
            .zip(&index_refs)
            .map(|(primitive, indices)| FoldSource {
                original_indices: indices,
                indices: &primitive.indices,
                face_ids: &primitive.face_ids,
                texcoords: primitive.attribute(TEXCOORD_0).map(|d| d.table()),
            })
            .collect();
        let folded = fold_triangles(&sources, face_count)?;

        let blend_shapes = if self.config.blend_shapes {
            blendshape::build_blend_shapes(mesh, &index_refs, vertex_count, &self.config.tolerance)?
        } else {
            Vec::new()
        };

        let (skeleton, skin_weights) = match node.skin.and_then(|s| scene.skins.get(s)) {
            Some(skin) if self.config.skinning => {
                let skeleton = skin::build_skeleton(scene, skin)?;
                let weights = skin::merge_skin_weights(
                    &mesh.primitives,
                    &index_refs,
                    vertex_count,
                    &self.config.tolerance,
                )?;
                (Some(skeleton), Some(weights))
            }
            _ => (None, None),
        };

        let reconstructed = ReconstructedMesh {
            root_name: safe_prim_name(&scene.nodes[root].name),
            mesh_name: safe_prim_name(&node.name),
            materials: scene.materials.iter().map(|m| safe_prim_name(m)).collect(),
            points: points.to_vec3(),
            face_vertex_counts: folded.face_vertex_counts,
            face_vertex_indices: folded.face_vertex_indices,
            texcoords: folded.texcoords,
            subsets: material_subsets(scene, mesh),
            blend_shapes,
            skeleton,
            skin_weights,
        };
        log::info!(
            "Reconstructed {}: {} points, {} faces ({} quads), {} subsets, {} blend shapes, \
             skinned: {}",
            reconstructed.mesh_name,
            reconstructed.vertex_count(),
            reconstructed.face_count(),
            reconstructed.quad_count(),
            reconstructed.subsets.len(),
            reconstructed.blend_shapes.len(),
            reconstructed.is_skinned()
        );
        Ok(reconstructed)
    }
}

/// Rebuild the single mesh of `scene` with the default configuration.
pub fn reconstruct(scene: &InterchangeScene) -> Result<ReconstructedMesh> {
    Reconstructor::new().reconstruct(scene)
}

fn original_indices(mesh: &Mesh) -> Result<Vec<Vec<usize>>> {
    mesh.primitives
        .iter()
        .enumerate()
        .map(|(p, primitive)| {
            let data = primitive.attribute(ORIGINAL_INDICES).ok_or_else(|| {
                ImportError::Format(format!("primitive {}: no {}", p, ORIGINAL_INDICES))
            })?;
            let indices = data
                .as_indices()
                .filter(|_| data.width() == 1)
                .ok_or_else(|| {
                    ImportError::Format(format!(
                        "primitive {}: {} must be unsigned integer scalars",
                        p, ORIGINAL_INDICES
                    ))
                })?;
            Ok(indices)
        })
        .collect()
}

/// One subset per material id, in order of first use.
fn material_subsets(scene: &InterchangeScene, mesh: &Mesh) -> Vec<MaterialSubset> {
    let mut subsets: Vec<MaterialSubset> = Vec::new();
    let mut seen: Vec<HashSet<usize>> = Vec::new();

    for primitive in &mesh.primitives {
        let Some(material) = primitive.material else {
            log::debug!("Primitive without material left unbound");
            continue;
        };
        let slot = match subsets.iter().position(|s| s.material == material) {
            Some(slot) => slot,
            None => {
                subsets.push(MaterialSubset {
                    material,
                    name: safe_prim_name(scene.material_name(material).unwrap_or_default()),
                    faces: Vec::new(),
                });
                seen.push(HashSet::new());
                subsets.len() - 1
            }
        };
        for &face in &primitive.face_ids {
            if seen[slot].insert(face) {
                subsets[slot].faces.push(face);
            }
        }
    }
    subsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::scene::{Node, Primitive};
    use crate::interchange::{
        resolve_accessor, AccessorData, AccessorLayout, ComponentType, ElementType,
    };
    use std::collections::BTreeMap;

    fn accessor(
        component_type: ComponentType,
        element_type: ElementType,
        bytes: Vec<u8>,
    ) -> AccessorData {
        let layout = AccessorLayout {
            component_type,
            element_type,
            count: bytes.len() / (component_type.size() * element_type.components()),
            byte_offset: 0,
            normalized: false,
        };
        resolve_accessor(0, &bytes, &layout).unwrap()
    }

    fn floats(element_type: ElementType, values: &[f32]) -> AccessorData {
        accessor(
            ComponentType::F32,
            element_type,
            values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        )
    }

    fn uints(values: &[u32]) -> AccessorData {
        accessor(
            ComponentType::U32,
            ElementType::Scalar,
            values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        )
    }

    fn primitive(
        original: &[u32],
        positions: &[f32],
        indices: &[usize],
        faces: &[usize],
        material: usize,
    ) -> Primitive {
        let mut attributes = BTreeMap::new();
        attributes.insert(ORIGINAL_INDICES.to_string(), uints(original));
        attributes.insert(POSITION.to_string(), floats(ElementType::Vec3, positions));
        Primitive {
            attributes,
            indices: indices.to_vec(),
            face_ids: faces.to_vec(),
            material: Some(material),
            targets: Vec::new(),
        }
    }

    /// A quad (polygon 0) in material 0 and a triangle (polygon 1) in material 1
    /// sharing vertices 1 and 2.
    fn scene() -> InterchangeScene {
        let quad = primitive(
            &[0, 1, 2, 3],
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            &[0, 1, 2, 0, 2, 3],
            &[0, 0],
            0,
        );
        let triangle = primitive(
            &[1, 4, 2],
            &[1.0, 0.0, 0.0, 2.0, 0.5, 0.0, 1.0, 1.0, 0.0],
            &[0, 1, 2],
            &[1],
            1,
        );
        InterchangeScene {
            materials: vec!["M_Face".to_string(), "M_Back.Head".to_string()],
            nodes: vec![
                Node {
                    name: "scene.root".to_string(),
                    children: vec![1],
                    ..Default::default()
                },
                Node {
                    name: "Mesh".to_string(),
                    mesh: Some(0),
                    ..Default::default()
                },
            ],
            parents: vec![None, Some(0)],
            meshes: vec![Mesh {
                name: "Mesh".to_string(),
                primitives: vec![quad, triangle],
                ..Default::default()
            }],
            skins: Vec::new(),
        }
    }

    #[test]
    fn test_reconstruct_mixed_polygons() {
        let mesh = reconstruct(&scene()).unwrap();
        assert_eq!(mesh.root_name, "scene_root");
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.points[4], [2.0, 0.5, 0.0]);
        assert_eq!(mesh.face_vertex_counts, vec![4, 3]);
        assert_eq!(mesh.face_vertex_indices, vec![0, 1, 2, 3, 1, 4, 2]);
        assert_eq!(mesh.texcoords, None);
        assert!(!mesh.is_skinned());

        assert_eq!(mesh.subsets.len(), 2);
        assert_eq!(mesh.subsets[0].faces, vec![0]);
        assert_eq!(mesh.subsets[1].name, "M_Back_Head");
        assert_eq!(mesh.subsets[1].faces, vec![1]);
    }

    #[test]
    fn test_conflicting_shared_vertex() {
        let mut scene = scene();
        let moved = floats(ElementType::Vec3, &[1.5, 0.0, 0.0, 2.0, 0.5, 0.0, 1.0, 1.0, 0.0]);
        scene.meshes[0].primitives[1]
            .attributes
            .insert(POSITION.to_string(), moved);
        let err = reconstruct(&scene).unwrap_err();
        assert!(err.is_geometry_error());
        assert!(err.to_string().contains("vertex 1"));

        let tolerance = MergeTolerance {
            relative: 0.0,
            absolute: 1.0,
        };
        let config = ReconstructConfig::default().with_tolerance(tolerance);
        let loose = Reconstructor::with_config(config);
        assert!(loose.reconstruct(&scene).is_ok());
    }

    #[test]
    fn test_two_roots_rejected() {
        let mut scene = scene();
        scene.nodes.push(Node::default());
        scene.parents.push(None);
        assert!(matches!(reconstruct(&scene), Err(ImportError::Format(_))));
    }

    #[test]
    fn test_float_original_indices_rejected() {
        let mut scene = scene();
        let float_indices = floats(ElementType::Scalar, &[0.0, 1.0, 2.0, 3.0]);
        scene.meshes[0].primitives[0]
            .attributes
            .insert(ORIGINAL_INDICES.to_string(), float_indices);
        let err = reconstruct(&scene).unwrap_err();
        assert!(err.to_string().contains(ORIGINAL_INDICES));
    }

    #[test]
    fn test_out_of_range_original_index_rejected() {
        let mut scene = scene();
        scene.meshes[0].primitives[1]
            .attributes
            .insert(ORIGINAL_INDICES.to_string(), uints(&[1, u32::MAX, 2]));
        let err = reconstruct(&scene).unwrap_err();
        assert!(err.is_geometry_error());
        assert!(err.to_string().contains("vertex 4"));
    }

    #[test]
    fn test_out_of_range_polygon_id_rejected() {
        let mut scene = scene();
        scene.meshes[0].primitives[1].face_ids = vec![usize::MAX - 1];
        assert!(matches!(
            reconstruct(&scene),
            Err(ImportError::UnsupportedTopology {
                face_id: 1,
                triangles: 0
            })
        ));
    }
}
