//! Merging per-primitive vertex data into the shared vertex space.

use crate::error::{ImportError, Result};
use crate::types::Table;
use std::collections::BTreeSet;

/// Closeness test for values written to the same shared vertex more than once.
///
/// Two values match when `|a - b| <= absolute + relative * |b|`, `b` being the value
/// written first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeTolerance {
    pub relative: f64,
    pub absolute: f64,
}

impl Default for MergeTolerance {
    fn default() -> Self {
        Self {
            relative: 1e-5,
            absolute: 1e-8,
        }
    }
}

impl MergeTolerance {
    /// Only bit-identical values match.
    pub const EXACT: MergeTolerance = MergeTolerance {
        relative: 0.0,
        absolute: 0.0,
    };

    pub fn close(&self, a: f64, b: f64) -> bool {
        a == b || (a - b).abs() <= self.absolute + self.relative * b.abs()
    }

    pub fn rows_close(&self, a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| self.close(x, y))
    }
}

/// Scatter each primitive's rows into a table of `vertex_count` shared vertices.
///
/// `original_indices[p][r]` is the shared vertex of row `r` of `arrays[p]`. A vertex
/// written by more than one primitive must get matching values every time, and every
/// vertex must be written at least once.
pub fn merge_primitive_arrays(
    arrays: &[Table],
    original_indices: &[&[usize]],
    vertex_count: usize,
    tolerance: &MergeTolerance,
) -> Result<Table> {
    if arrays.len() != original_indices.len() {
        return Err(ImportError::Format(format!(
            "{} arrays but {} original index lists",
            arrays.len(),
            original_indices.len()
        )));
    }

    // Every vertex needs a row, so more vertices than rows leaves one unreferenced.
    let row_count: usize = original_indices.iter().map(|i| i.len()).sum();
    if vertex_count > row_count {
        let referenced: BTreeSet<usize> =
            original_indices.iter().flat_map(|i| i.iter().copied()).collect();
        let vertex = (0..=row_count)
            .find(|v| !referenced.contains(v))
            .unwrap_or(row_count);
        return Err(unreferenced_vertex(vertex));
    }

    let width = arrays.first().map(Table::width).unwrap_or(0);
    let mut merged = Table::zeros(vertex_count, width)?;
    let mut written = vec![false; vertex_count];

    for (primitive, (array, indices)) in arrays.iter().zip(original_indices).enumerate() {
        if array.width() != width {
            return Err(ImportError::Format(format!(
                "primitive {}: rows are {} wide, expected {}",
                primitive,
                array.width(),
                width
            )));
        }
        if array.len() != indices.len() {
            return Err(ImportError::Format(format!(
                "primitive {}: {} rows but {} original indices",
                primitive,
                array.len(),
                indices.len()
            )));
        }

        for (row, &vertex) in array.rows().zip(indices.iter()) {
            if vertex >= vertex_count {
                return Err(ImportError::GeometryIntegrity(format!(
                    "primitive {}: vertex {} outside {} shared vertices",
                    primitive, vertex, vertex_count
                )));
            }
            if written[vertex] && !tolerance.rows_close(row, merged.row(vertex)) {
                return Err(ImportError::GeometryIntegrity(format!(
                    "vertex {}: primitive {} has {:?}, an earlier primitive has {:?}",
                    vertex,
                    primitive,
                    row,
                    merged.row(vertex)
                )));
            }
            merged.row_mut(vertex).copy_from_slice(row);
            written[vertex] = true;
        }
    }

    if let Some(vertex) = written.iter().position(|w| !w) {
        return Err(unreferenced_vertex(vertex));
    }
    Ok(merged)
}

fn unreferenced_vertex(vertex: usize) -> ImportError {
    ImportError::GeometryIntegrity(format!(
        "vertex {} is not referenced by any primitive",
        vertex
    ))
}
