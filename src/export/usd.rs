//! USDA export.
//!
//! Generates USDA (ASCII) format manually via string formatting. The layer holds a
//! `/root` Xform that turns the Z-up centimeter source into a Y-up stage, a SkelRoot
//! with the mesh and its skeleton, and a `Looks` scope with one material per subset.

use crate::error::{ImportError, Result};
use crate::reconstruct::{BlendShape, ReconstructedMesh, SkeletonData, SkinWeights};
use crate::types::RowMatrix;
use std::fmt::Write;
use std::path::Path;

/// Prim path of the stage's default prim.
pub const ROOT_PATH: &str = "/root";
/// Prim path of the material scope.
pub const LOOKS_PATH: &str = "/root/Looks";

const HALF_SQRT_2: f32 = std::f32::consts::FRAC_1_SQRT_2;
const XFORM_OP_ORDER: &str = r#""xformOp:translate", "xformOp:orient", "xformOp:scale""#;

/// Options for USDA generation.
#[derive(Debug, Clone, PartialEq)]
pub struct UsdExportOptions {
    /// Stage `metersPerUnit`.
    pub meters_per_unit: f64,
    /// Catmull-Clark refinement level; `None` exports an unsubdivided mesh.
    pub subdivision_level: Option<u32>,
}

impl Default for UsdExportOptions {
    fn default() -> Self {
        Self {
            meters_per_unit: 0.01,
            subdivision_level: None,
        }
    }
}

impl UsdExportOptions {
    pub fn with_subdivision(mut self, level: u32) -> Self {
        self.subdivision_level = Some(level);
        self
    }

    pub fn with_meters_per_unit(mut self, meters_per_unit: f64) -> Self {
        self.meters_per_unit = meters_per_unit;
        self
    }
}

/// Export a reconstructed mesh as USDA text.
pub fn export_usda(mesh: &ReconstructedMesh, options: &UsdExportOptions) -> Result<String> {
    if mesh.points.is_empty() || mesh.face_vertex_counts.is_empty() {
        return Err(ImportError::Export(format!(
            "Cannot export empty mesh {}",
            mesh.mesh_name
        )));
    }

    let skel_root_path = format!("{}/{}", ROOT_PATH, mesh.root_name);
    let mesh_path = format!("{}/{}", skel_root_path, mesh.mesh_name);

    // ~40 bytes per point and face corner, plus skin data
    let influences = mesh
        .skin_weights
        .as_ref()
        .map_or(0, |w| w.joint_indices.len());
    let estimated_size = 4096
        + mesh.points.len() * 40
        + mesh.face_vertex_indices.len() * 40
        + influences * 16;
    let mut usda = String::with_capacity(estimated_size);

    // Header
    writeln!(usda, "#usda 1.0").unwrap();
    writeln!(usda, "(").unwrap();
    writeln!(usda, "    defaultPrim = \"root\"").unwrap();
    writeln!(usda, "    metersPerUnit = {}", options.meters_per_unit).unwrap();
    writeln!(usda, "    upAxis = \"Y\"").unwrap();
    writeln!(usda, ")\n").unwrap();

    writeln!(usda, "def Xform \"root\"").unwrap();
    writeln!(usda, "{{").unwrap();
    write_xform_ops(&mut usda, 1, [HALF_SQRT_2, -HALF_SQRT_2, 0.0, 0.0], 100.0);
    writeln!(usda).unwrap();

    writeln!(usda, "    def SkelRoot \"{}\"", mesh.root_name).unwrap();
    writeln!(usda, "    {{").unwrap();
    write_xform_ops(&mut usda, 2, [1.0, 0.0, 0.0, 0.0], 1.0);
    writeln!(usda).unwrap();

    let skeleton_path = mesh
        .skeleton
        .as_ref()
        .map(|s| format!("{}/{}", skel_root_path, s.name));
    write_mesh_prim(&mut usda, mesh, &mesh_path, skeleton_path.as_deref(), options);
    if let Some(skeleton) = &mesh.skeleton {
        write_skeleton(&mut usda, skeleton);
    }
    writeln!(usda, "    }}\n").unwrap();

    // Materials
    writeln!(usda, "    def Scope \"Looks\"").unwrap();
    writeln!(usda, "    {{").unwrap();
    for material in &mesh.materials {
        writeln!(usda, "        def Material \"{}\"", material).unwrap();
        writeln!(usda, "        {{").unwrap();
        writeln!(usda, "        }}").unwrap();
    }
    writeln!(usda, "    }}").unwrap();

    // Close root Xform
    writeln!(usda, "}}").unwrap();

    log::debug!("Generated {} bytes of USDA for {}", usda.len(), mesh_path);
    Ok(usda)
}

/// Export a reconstructed mesh and write it to `path`.
pub fn write_usda<P: AsRef<Path>>(
    mesh: &ReconstructedMesh,
    path: P,
    options: &UsdExportOptions,
) -> Result<()> {
    let usda = export_usda(mesh, options)?;
    std::fs::write(path.as_ref(), usda)?;
    log::info!("Wrote {}", path.as_ref().display());
    Ok(())
}

fn indent(level: usize) -> String {
    "    ".repeat(level)
}

/// Translate (zero), orient and uniform scale ops.
fn write_xform_ops(usda: &mut String, level: usize, orient: [f32; 4], scale: f32) {
    let pad = indent(level);
    writeln!(usda, "{}float3 xformOp:translate = (0, 0, 0)", pad).unwrap();
    writeln!(
        usda,
        "{}quatf xformOp:orient = ({}, {}, {}, {})",
        pad, orient[0], orient[1], orient[2], orient[3]
    )
    .unwrap();
    writeln!(usda, "{}float3 xformOp:scale = ({}, {}, {})", pad, scale, scale, scale).unwrap();
    writeln!(usda, "{}uniform token[] xformOpOrder = [{}]", pad, XFORM_OP_ORDER).unwrap();
}

/// Write a comma-separated array inline, streaming values directly to the buffer.
fn write_array_inline<T, F>(usda: &mut String, items: &[T], mut fmt: F)
where
    F: FnMut(&T, &mut String),
{
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            usda.push_str(", ");
        }
        fmt(item, usda);
    }
}

fn write_matrix(usda: &mut String, m: &RowMatrix) {
    write!(usda, "(").unwrap();
    write_array_inline(usda, m, |row, s| {
        write!(s, "({}, {}, {}, {})", row[0], row[1], row[2], row[3]).unwrap();
    });
    write!(usda, ")").unwrap();
}

fn write_mesh_prim(
    usda: &mut String,
    mesh: &ReconstructedMesh,
    mesh_path: &str,
    skeleton_path: Option<&str>,
    options: &UsdExportOptions,
) {
    let mut schemas = vec!["\"MaterialBindingAPI\""];
    if skeleton_path.is_some() || !mesh.blend_shapes.is_empty() {
        schemas.push("\"SkelBindingAPI\"");
    }
    writeln!(usda, "        def Mesh \"{}\" (", mesh.mesh_name).unwrap();
    writeln!(usda, "            prepend apiSchemas = [{}]", schemas.join(", ")).unwrap();
    writeln!(usda, "        )").unwrap();
    writeln!(usda, "        {{").unwrap();

    writeln!(usda, "            uniform bool doubleSided = 1").unwrap();

    write!(usda, "            int[] faceVertexCounts = [").unwrap();
    write_array_inline(usda, &mesh.face_vertex_counts, |c, s| {
        write!(s, "{}", c).unwrap();
    });
    writeln!(usda, "]").unwrap();

    write!(usda, "            int[] faceVertexIndices = [").unwrap();
    write_array_inline(usda, &mesh.face_vertex_indices, |i, s| {
        write!(s, "{}", i).unwrap();
    });
    writeln!(usda, "]").unwrap();

    write!(usda, "            point3f[] points = [").unwrap();
    write_array_inline(usda, &mesh.points, |p, s| {
        write!(s, "({}, {}, {})", p[0], p[1], p[2]).unwrap();
    });
    writeln!(usda, "]").unwrap();

    // UVs (face-varying)
    if let Some(texcoords) = &mesh.texcoords {
        write!(usda, "            texCoord2f[] primvars:st = [").unwrap();
        write_array_inline(usda, texcoords, |uv, s| {
            write!(s, "({}, {})", uv[0], uv[1]).unwrap();
        });
        writeln!(usda, "] (").unwrap();
        writeln!(usda, "                interpolation = \"faceVarying\"").unwrap();
        writeln!(usda, "            )").unwrap();
    }

    match options.subdivision_level {
        Some(level) => {
            writeln!(
                usda,
                "            uniform token subdivisionScheme = \"catmullClark\""
            )
            .unwrap();
            writeln!(usda, "            bool refinementEnableOverride = 1").unwrap();
            writeln!(usda, "            int refinementLevel = {}", level).unwrap();
        }
        None => {
            writeln!(usda, "            uniform token subdivisionScheme = \"none\"").unwrap();
        }
    }

    writeln!(
        usda,
        "            uniform token subsetFamily:materialBind:familyType = \"nonOverlapping\""
    )
    .unwrap();

    if !mesh.blend_shapes.is_empty() {
        write!(usda, "            uniform token[] skel:blendShapes = [").unwrap();
        write_array_inline(usda, &mesh.blend_shapes, |b, s| {
            write!(s, "\"{}\"", b.name).unwrap();
        });
        writeln!(usda, "]").unwrap();
        write!(usda, "            rel skel:blendShapeTargets = [").unwrap();
        write_array_inline(usda, &mesh.blend_shapes, |b, s| {
            write!(s, "<{}/{}>", mesh_path, b.name).unwrap();
        });
        writeln!(usda, "]").unwrap();
    }

    if let (Some(weights), Some(skeleton_path)) = (&mesh.skin_weights, skeleton_path) {
        write_skin_primvars(usda, weights);
        writeln!(usda, "            rel skel:skeleton = <{}>", skeleton_path).unwrap();
    }

    write_xform_ops(usda, 3, [HALF_SQRT_2, HALF_SQRT_2, 0.0, 0.0], 1.0);

    for subset in &mesh.subsets {
        writeln!(usda).unwrap();
        writeln!(usda, "            def GeomSubset \"{}\" (", subset.name).unwrap();
        writeln!(usda, "                prepend apiSchemas = [\"MaterialBindingAPI\"]").unwrap();
        writeln!(usda, "            )").unwrap();
        writeln!(usda, "            {{").unwrap();
        writeln!(usda, "                uniform token elementType = \"face\"").unwrap();
        writeln!(usda, "                uniform token familyName = \"materialBind\"").unwrap();
        write!(usda, "                int[] indices = [").unwrap();
        write_array_inline(usda, &subset.faces, |f, s| {
            write!(s, "{}", f).unwrap();
        });
        writeln!(usda, "]").unwrap();
        writeln!(
            usda,
            "                rel material:binding = <{}/{}>",
            LOOKS_PATH, subset.name
        )
        .unwrap();
        writeln!(usda, "            }}").unwrap();
    }

    for shape in &mesh.blend_shapes {
        writeln!(usda).unwrap();
        write_blend_shape(usda, shape);
    }

    writeln!(usda, "        }}\n").unwrap();
}

fn write_skin_primvars(usda: &mut String, weights: &SkinWeights) {
    write!(usda, "            int[] primvars:skel:jointIndices = [").unwrap();
    write_array_inline(usda, &weights.joint_indices, |j, s| {
        write!(s, "{}", j).unwrap();
    });
    writeln!(usda, "] (").unwrap();
    writeln!(usda, "                elementSize = {}", weights.element_size).unwrap();
    writeln!(usda, "                interpolation = \"vertex\"").unwrap();
    writeln!(usda, "            )").unwrap();

    write!(usda, "            float[] primvars:skel:jointWeights = [").unwrap();
    write_array_inline(usda, &weights.joint_weights, |w, s| {
        write!(s, "{}", w).unwrap();
    });
    writeln!(usda, "] (").unwrap();
    writeln!(usda, "                elementSize = {}", weights.element_size).unwrap();
    writeln!(usda, "                interpolation = \"vertex\"").unwrap();
    writeln!(usda, "            )").unwrap();
}

fn write_blend_shape(usda: &mut String, shape: &BlendShape) {
    writeln!(usda, "            def BlendShape \"{}\"", shape.name).unwrap();
    writeln!(usda, "            {{").unwrap();
    write!(usda, "                uniform vector3f[] offsets = [").unwrap();
    write_array_inline(usda, &shape.offsets, |o, s| {
        write!(s, "({}, {}, {})", o[0], o[1], o[2]).unwrap();
    });
    writeln!(usda, "]").unwrap();
    write!(usda, "                uniform int[] pointIndices = [").unwrap();
    write_array_inline(usda, &shape.point_indices, |i, s| {
        write!(s, "{}", i).unwrap();
    });
    writeln!(usda, "]").unwrap();
    writeln!(usda, "            }}").unwrap();
}

fn write_skeleton(usda: &mut String, skeleton: &SkeletonData) {
    writeln!(usda, "        def Skeleton \"{}\" (", skeleton.name).unwrap();
    writeln!(usda, "            prepend apiSchemas = [\"SkelBindingAPI\"]").unwrap();
    writeln!(usda, "        )").unwrap();
    writeln!(usda, "        {{").unwrap();

    write!(usda, "            uniform token[] joints = [").unwrap();
    write_array_inline(usda, &skeleton.joints, |j, s| {
        write!(s, "\"{}\"", j).unwrap();
    });
    writeln!(usda, "]").unwrap();

    write!(usda, "            uniform matrix4d[] bindTransforms = [").unwrap();
    write_array_inline(usda, &skeleton.bind_transforms, |m, s| write_matrix(s, m));
    writeln!(usda, "]").unwrap();

    write!(usda, "            uniform matrix4d[] restTransforms = [").unwrap();
    write_array_inline(usda, &skeleton.rest_transforms, |m, s| write_matrix(s, m));
    writeln!(usda, "]").unwrap();

    writeln!(usda, "        }}").unwrap();
}
