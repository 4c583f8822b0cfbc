//! Folding triangles back into the polygons they were split from.

use crate::error::{ImportError, Result};
use crate::types::Table;
use std::collections::BTreeSet;

/// Triangle data of one primitive, in the primitive's local vertex space.
#[derive(Debug, Clone, Copy)]
pub struct FoldSource<'a> {
    /// Shared vertex of each local vertex.
    pub original_indices: &'a [usize],
    /// Local vertex indices, three per triangle.
    pub indices: &'a [usize],
    /// Polygon id of each triangle.
    pub face_ids: &'a [usize],
    /// Per local vertex, at least two columns wide.
    pub texcoords: Option<&'a Table>,
}

impl FoldSource<'_> {
    fn triangle(&self, triangle: usize) -> [usize; 3] {
        let i = triangle * 3;
        [self.indices[i], self.indices[i + 1], self.indices[i + 2]]
    }

    fn texcoord(&self, local: usize) -> Option<[f32; 2]> {
        self.texcoords.map(|t| {
            let row = t.row(local);
            [row[0] as f32, row[1] as f32]
        })
    }

    fn validate(&self, primitive: usize) -> Result<()> {
        let fail = |message: String| -> Result<()> {
            Err(ImportError::Format(format!("primitive {}: {}", primitive, message)))
        };
        if self.indices.len() % 3 != 0 {
            return fail(format!("{} indices do not form triangles", self.indices.len()));
        }
        if self.indices.len() / 3 != self.face_ids.len() {
            return fail(format!(
                "{} triangles but {} face indices",
                self.indices.len() / 3,
                self.face_ids.len()
            ));
        }
        let vertex_count = self.original_indices.len();
        if let Some(&local) = self.indices.iter().find(|&&i| i >= vertex_count) {
            return fail(format!("index {} outside {} vertices", local, vertex_count));
        }
        if let Some(texcoords) = self.texcoords {
            if texcoords.len() != vertex_count || texcoords.width() < 2 {
                return fail(format!(
                    "texcoords are {}x{}, expected {}x2",
                    texcoords.len(),
                    texcoords.width(),
                    vertex_count
                ));
            }
        }
        Ok(())
    }
}

/// Polygon topology over the shared vertex space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoldedFaces {
    /// 3 or 4 per face, faces ordered by polygon id.
    pub face_vertex_counts: Vec<u32>,
    pub face_vertex_indices: Vec<usize>,
    /// Face-varying, aligned with `face_vertex_indices`.
    pub texcoords: Option<Vec<[f32; 2]>>,
}

impl FoldedFaces {
    pub fn face_count(&self) -> usize {
        self.face_vertex_counts.len()
    }

    pub fn quad_count(&self) -> usize {
        self.face_vertex_counts.iter().filter(|&&c| c == 4).count()
    }

    fn push_face(&mut self, source: &FoldSource<'_>, locals: &[usize]) {
        self.face_vertex_counts.push(locals.len() as u32);
        self.face_vertex_indices
            .extend(locals.iter().map(|&i| source.original_indices[i]));
        if let Some(texcoords) = self.texcoords.as_mut() {
            texcoords.extend(locals.iter().filter_map(|&i| source.texcoord(i)));
        }
    }
}

/// Rebuild polygons `0..face_count` from the triangles that reference them.
///
/// A polygon with one triangle keeps the triangle's winding. A polygon with two
/// triangles becomes a quad; both must come from the same primitive and share exactly
/// one edge.
pub fn fold_triangles(sources: &[FoldSource<'_>], face_count: usize) -> Result<FoldedFaces> {
    for (primitive, source) in sources.iter().enumerate() {
        source.validate(primitive)?;
    }
    let with_texcoords = sources.iter().filter(|s| s.texcoords.is_some()).count();
    if with_texcoords != 0 && with_texcoords != sources.len() {
        return Err(ImportError::Format(format!(
            "{} of {} primitives have texcoords",
            with_texcoords,
            sources.len()
        )));
    }

    // Every polygon needs a triangle, so more polygons than triangles leaves one empty.
    let triangle_count: usize = sources.iter().map(|s| s.face_ids.len()).sum();
    if face_count > triangle_count {
        let referenced: BTreeSet<usize> = sources
            .iter()
            .flat_map(|s| s.face_ids.iter().copied())
            .collect();
        let face_id = (0..=triangle_count)
            .find(|f| !referenced.contains(f))
            .unwrap_or(triangle_count);
        return Err(ImportError::UnsupportedTopology {
            face_id,
            triangles: 0,
        });
    }

    let mut groups: Vec<Vec<(usize, usize)>> = vec![Vec::new(); face_count];
    for (primitive, source) in sources.iter().enumerate() {
        for (triangle, &face_id) in source.face_ids.iter().enumerate() {
            let group = groups.get_mut(face_id).ok_or_else(|| {
                ImportError::GeometryIntegrity(format!(
                    "primitive {}: polygon {} outside {} polygons",
                    primitive, face_id, face_count
                ))
            })?;
            group.push((primitive, triangle));
        }
    }

    let mut folded = FoldedFaces {
        face_vertex_counts: Vec::with_capacity(face_count),
        face_vertex_indices: Vec::with_capacity(face_count * 4),
        texcoords: (with_texcoords > 0).then(|| Vec::with_capacity(face_count * 4)),
    };

    for (face_id, group) in groups.iter().enumerate() {
        match *group.as_slice() {
            [(primitive, triangle)] => {
                let source = &sources[primitive];
                folded.push_face(source, &source.triangle(triangle));
            }
            [(p1, t1), (p2, t2)] => {
                if p1 != p2 {
                    return Err(ImportError::GeometryIntegrity(format!(
                        "polygon {}: triangles come from primitives {} and {}",
                        face_id, p1, p2
                    )));
                }
                let source = &sources[p1];
                let (first, second) = (source.triangle(t1), source.triangle(t2));
                let corners = quad_corners(face_id, source, first, second)?;
                folded.push_face(source, &corners);
            }
            _ => {
                return Err(ImportError::UnsupportedTopology {
                    face_id,
                    triangles: group.len(),
                });
            }
        }
    }

    Ok(folded)
}

/// Local corners of the quad formed by two triangles sharing an edge.
fn quad_corners(
    face_id: usize,
    source: &FoldSource<'_>,
    a: [usize; 3],
    b: [usize; 3],
) -> Result<[usize; 4]> {
    let shared = |t: [usize; 3]| t.map(|i| source.original_indices[i]);
    let (a_shared, b_shared) = (shared(a), shared(b));

    let mut distinct: Vec<usize> = a_shared.iter().chain(&b_shared).copied().collect();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() != 4 {
        return Err(ImportError::GeometryIntegrity(format!(
            "polygon {}: triangles span {} distinct vertices, expected 4",
            face_id,
            distinct.len()
        )));
    }

    let (first, second) = if a_shared[1] == b_shared[2] { (b, a) } else { (a, b) };
    Ok([first[0], first[1], first[2], second[2]])
}
