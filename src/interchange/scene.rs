//! Decoded interchange scene.

use super::accessor::AccessorData;
use crate::types::NodeTransform;
use glam::DMat4;
use std::collections::BTreeMap;

/// Attribute holding each vertex's index in the shared vertex space.
pub const ORIGINAL_INDICES: &str = "ORIGINAL_INDICES";
pub const POSITION: &str = "POSITION";
pub const TEXCOORD_0: &str = "TEXCOORD_0";
pub const JOINTS_PREFIX: &str = "JOINTS_";
pub const WEIGHTS_PREFIX: &str = "WEIGHTS_";

/// A fully decoded scene: every accessor reference is replaced by its data.
#[derive(Debug, Clone, Default)]
pub struct InterchangeScene {
    /// Material names, by material id.
    pub materials: Vec<String>,
    pub nodes: Vec<Node>,
    /// Parent of each node, `None` for roots.
    pub parents: Vec<Option<usize>>,
    pub meshes: Vec<Mesh>,
    pub skins: Vec<Skin>,
}

impl InterchangeScene {
    /// Indices of nodes without a parent.
    pub fn root_nodes(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.parents[i].is_none())
            .collect()
    }

    /// Indices of nodes that own a mesh.
    pub fn mesh_nodes(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.nodes[i].mesh.is_some())
            .collect()
    }

    pub fn material_name(&self, id: usize) -> Option<&str> {
        self.materials.get(id).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: String,
    pub children: Vec<usize>,
    pub transform: NodeTransform,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
    /// Default blend shape weights. Blend shapes exist only when this is set.
    pub weights: Option<Vec<f32>>,
    pub target_names: Vec<String>,
}

/// One material's share of a mesh, triangulated.
#[derive(Debug, Clone, Default)]
pub struct Primitive {
    pub attributes: BTreeMap<String, AccessorData>,
    /// Local vertex indices, three per triangle.
    pub indices: Vec<usize>,
    /// Shared polygon id of each triangle.
    pub face_ids: Vec<usize>,
    pub material: Option<usize>,
    /// Blend shape targets, keyed like `attributes`.
    pub targets: Vec<BTreeMap<String, AccessorData>>,
}

impl Primitive {
    pub fn attribute(&self, name: &str) -> Option<&AccessorData> {
        self.attributes.get(name)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Attribute sets named `<prefix><n>`, sorted by `n`.
    pub fn attribute_sets(&self, prefix: &str) -> Vec<(u32, &AccessorData)> {
        let mut sets: Vec<(u32, &AccessorData)> = self
            .attributes
            .iter()
            .filter_map(|(name, data)| {
                let set = name.strip_prefix(prefix)?.parse().ok()?;
                Some((set, data))
            })
            .collect();
        sets.sort_by_key(|(set, _)| *set);
        sets
    }
}

#[derive(Debug, Clone, Default)]
pub struct Skin {
    /// Joint node indices.
    pub joints: Vec<usize>,
    /// One per joint.
    pub inverse_bind_matrices: Vec<DMat4>,
}
