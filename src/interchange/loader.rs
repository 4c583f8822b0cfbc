//! Interchange document loading.

use super::accessor::{
    resolve_accessor, AccessorData, AccessorLayout, ComponentType, ElementType,
};
use super::document::{AccessorDef, BufferDef, Document, MeshDef, NodeDef, SkinDef};
use super::scene::{InterchangeScene, Mesh, Node, Primitive, Skin};
use crate::error::{ImportError, Result};
use crate::types::NodeTransform;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use glam::DMat4;
use std::collections::BTreeMap;
use std::path::Path;

/// Accepted prefixes for embedded buffers.
const DATA_URI_PREFIXES: [&str; 2] = [
    "data:application/octet-stream;base64,",
    "data:application/gltf-buffer;base64,",
];

/// Load an interchange document from a file. External buffers resolve next to it.
pub fn load_gltf<P: AsRef<Path>>(path: P) -> Result<InterchangeScene> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let scene = parse_gltf(&json, path.parent())?;
    log::debug!(
        "Loaded {:?}: {} nodes, {} meshes, {} skins",
        path,
        scene.nodes.len(),
        scene.meshes.len(),
        scene.skins.len()
    );
    Ok(scene)
}

/// Parse an interchange document.
///
/// `base_dir` resolves buffers stored in separate files; without it only embedded
/// buffers are accepted.
pub fn parse_gltf(json: &str, base_dir: Option<&Path>) -> Result<InterchangeScene> {
    let document: Document = serde_json::from_str(json)?;

    if document.scenes.len() != 1 {
        return Err(ImportError::Format(format!(
            "expected exactly one scene, found {}",
            document.scenes.len()
        )));
    }

    let buffers = document
        .buffers
        .iter()
        .enumerate()
        .map(|(i, buffer)| decode_buffer(i, buffer, base_dir))
        .collect::<Result<Vec<_>>>()?;

    let accessors = document
        .accessors
        .iter()
        .enumerate()
        .map(|(i, accessor)| decode_accessor(i, accessor, &document, &buffers))
        .collect::<Result<Vec<_>>>()?;

    let parents = node_parents(&document.nodes)?;
    let nodes = document
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| convert_node(i, node, &document))
        .collect::<Result<Vec<_>>>()?;

    let meshes = document
        .meshes
        .iter()
        .enumerate()
        .map(|(i, mesh)| convert_mesh(i, mesh, &accessors, document.materials.len()))
        .collect::<Result<Vec<_>>>()?;

    let skins = document
        .skins
        .iter()
        .enumerate()
        .map(|(i, skin)| convert_skin(i, skin, &accessors, nodes.len()))
        .collect::<Result<Vec<_>>>()?;

    Ok(InterchangeScene {
        materials: document.materials.into_iter().map(|m| m.name).collect(),
        nodes,
        parents,
        meshes,
        skins,
    })
}

fn decode_buffer(index: usize, buffer: &BufferDef, base_dir: Option<&Path>) -> Result<Vec<u8>> {
    let uri = buffer.uri.as_deref().ok_or_else(|| {
        ImportError::Format(format!("buffer {}: binary chunk buffers are not supported", index))
    })?;

    let data = match DATA_URI_PREFIXES.iter().find_map(|p| uri.strip_prefix(*p)) {
        Some(encoded) => BASE64_STANDARD.decode(encoded)?,
        None if uri.starts_with("data:") => {
            return Err(ImportError::Format(format!(
                "buffer {}: unsupported data URI",
                index
            )));
        }
        None => {
            let base_dir = base_dir.ok_or_else(|| {
                ImportError::Format(format!(
                    "buffer {}: external file {} without a base directory",
                    index, uri
                ))
            })?;
            std::fs::read(base_dir.join(uri))?
        }
    };

    if data.len() != buffer.byte_length {
        return Err(ImportError::Format(format!(
            "buffer {}: decoded {} bytes, declared {}",
            index,
            data.len(),
            buffer.byte_length
        )));
    }
    Ok(data)
}

fn decode_accessor(
    index: usize,
    accessor: &AccessorDef,
    document: &Document,
    buffers: &[Vec<u8>],
) -> Result<AccessorData> {
    let component_type = ComponentType::from_code(accessor.component_type).ok_or_else(|| {
        ImportError::Format(format!(
            "accessor {}: unsupported component type {}",
            index, accessor.component_type
        ))
    })?;
    let element_type = ElementType::from_name(&accessor.element_type).ok_or_else(|| {
        ImportError::Format(format!(
            "accessor {}: unsupported element type {}",
            index, accessor.element_type
        ))
    })?;
    let layout = AccessorLayout {
        component_type,
        element_type,
        count: accessor.count,
        byte_offset: accessor.byte_offset,
        normalized: accessor.normalized,
    };

    let Some(view_index) = accessor.buffer_view else {
        let buffer_bytes = buffers.iter().map(Vec::len).sum();
        return AccessorData::zeroed(index, &layout, buffer_bytes);
    };
    let view = document.buffer_views.get(view_index).ok_or_else(|| {
        ImportError::Format(format!(
            "accessor {}: buffer view {} does not exist",
            index, view_index
        ))
    })?;
    if let Some(stride) = view.byte_stride {
        if stride != layout.element_size() {
            return Err(ImportError::Format(format!(
                "accessor {}: interleaved buffer view {} (stride {}) is not supported",
                index, view_index, stride
            )));
        }
    }

    let buffer = buffers.get(view.buffer).ok_or_else(|| {
        ImportError::Format(format!(
            "buffer view {}: buffer {} does not exist",
            view_index, view.buffer
        ))
    })?;
    let bytes = view
        .byte_offset
        .checked_add(view.byte_length)
        .and_then(|end| buffer.get(view.byte_offset..end))
        .ok_or_else(|| {
            ImportError::Format(format!(
                "buffer view {}: range {}+{} exceeds buffer {} of {} bytes",
                view_index,
                view.byte_offset,
                view.byte_length,
                view.buffer,
                buffer.len()
            ))
        })?;

    resolve_accessor(index, bytes, &layout)
}

/// Parent of each node. A node listed as a child twice is rejected.
fn node_parents(nodes: &[NodeDef]) -> Result<Vec<Option<usize>>> {
    let mut parents = vec![None; nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        for &child in &node.children {
            if child >= nodes.len() || child == i {
                return Err(ImportError::Format(format!(
                    "node {}: invalid child {}",
                    i, child
                )));
            }
            if let Some(previous) = parents[child] {
                return Err(ImportError::Format(format!(
                    "node {}: child of both node {} and node {}",
                    child, previous, i
                )));
            }
            parents[child] = Some(i);
        }
    }
    Ok(parents)
}

fn convert_node(index: usize, node: &NodeDef, document: &Document) -> Result<Node> {
    if node.mesh.is_some_and(|m| m >= document.meshes.len()) {
        return Err(ImportError::Format(format!("node {}: mesh out of range", index)));
    }
    if node.skin.is_some_and(|s| s >= document.skins.len()) {
        return Err(ImportError::Format(format!("node {}: skin out of range", index)));
    }

    let defaults = NodeTransform::default();
    Ok(Node {
        name: node.name.clone(),
        children: node.children.clone(),
        transform: NodeTransform {
            translation: node.translation.unwrap_or(defaults.translation),
            rotation: node.rotation.unwrap_or(defaults.rotation),
            scale: node.scale.unwrap_or(defaults.scale),
        },
        mesh: node.mesh,
        skin: node.skin,
    })
}

fn lookup<'a>(
    accessors: &'a [AccessorData],
    index: usize,
    owner: &dyn Fn() -> String,
) -> Result<&'a AccessorData> {
    accessors.get(index).ok_or_else(|| {
        ImportError::Format(format!("{}: accessor {} does not exist", owner(), index))
    })
}

fn lookup_indices(
    accessors: &[AccessorData],
    index: usize,
    owner: &dyn Fn() -> String,
) -> Result<Vec<usize>> {
    lookup(accessors, index, owner)?.as_indices().ok_or_else(|| {
        ImportError::Format(format!(
            "{}: accessor {} does not hold unsigned integers",
            owner(),
            index
        ))
    })
}

fn lookup_map(
    accessors: &[AccessorData],
    map: &BTreeMap<String, usize>,
    owner: &dyn Fn() -> String,
) -> Result<BTreeMap<String, AccessorData>> {
    map.iter()
        .map(|(name, &index)| -> Result<(String, AccessorData)> {
            Ok((name.clone(), lookup(accessors, index, owner)?.clone()))
        })
        .collect()
}

fn convert_mesh(
    index: usize,
    mesh: &MeshDef,
    accessors: &[AccessorData],
    material_count: usize,
) -> Result<Mesh> {
    let mut primitives = Vec::with_capacity(mesh.primitives.len());
    for (p, primitive) in mesh.primitives.iter().enumerate() {
        let owner = || format!("mesh {} primitive {}", index, p);

        let indices_accessor = primitive
            .indices
            .ok_or_else(|| ImportError::Format(format!("{}: not indexed", owner())))?;
        let face_accessor = primitive
            .faceindices
            .ok_or_else(|| ImportError::Format(format!("{}: no face indices", owner())))?;
        if primitive.material.is_some_and(|m| m >= material_count) {
            return Err(ImportError::Format(format!("{}: material out of range", owner())));
        }

        primitives.push(Primitive {
            attributes: lookup_map(accessors, &primitive.attributes, &owner)?,
            indices: lookup_indices(accessors, indices_accessor, &owner)?,
            face_ids: lookup_indices(accessors, face_accessor, &owner)?,
            material: primitive.material,
            targets: primitive
                .targets
                .iter()
                .map(|target| lookup_map(accessors, target, &owner))
                .collect::<Result<Vec<_>>>()?,
        });
    }

    Ok(Mesh {
        name: mesh.name.clone(),
        primitives,
        weights: mesh.weights.clone(),
        target_names: mesh
            .extras
            .as_ref()
            .map(|e| e.target_names.clone())
            .unwrap_or_default(),
    })
}

fn convert_skin(
    index: usize,
    skin: &SkinDef,
    accessors: &[AccessorData],
    node_count: usize,
) -> Result<Skin> {
    let owner = || format!("skin {}", index);
    if let Some(&joint) = skin.joints.iter().find(|&&j| j >= node_count) {
        return Err(ImportError::Format(format!(
            "{}: joint node {} does not exist",
            owner(),
            joint
        )));
    }

    let inverse_bind_matrices = match skin.inverse_bind_matrices {
        Some(accessor) => {
            let matrices = lookup(accessors, accessor, &owner)?.as_mat4().ok_or_else(|| {
                ImportError::Format(format!("{}: inverse bind matrices are not MAT4", owner()))
            })?;
            if matrices.len() != skin.joints.len() {
                return Err(ImportError::Format(format!(
                    "{}: {} inverse bind matrices for {} joints",
                    owner(),
                    matrices.len(),
                    skin.joints.len()
                )));
            }
            matrices.iter().map(DMat4::from_cols_array).collect()
        }
        None => vec![DMat4::IDENTITY; skin.joints.len()],
    };

    Ok(Skin {
        joints: skin.joints.clone(),
        inverse_bind_matrices,
    })
}
