//! Row-major numeric tables.

use crate::error::{ImportError, Result};

/// A dense table of `f64` rows, all `width` values wide.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    width: usize,
    values: Vec<f64>,
}

impl Table {
    /// Build a table from flat row-major values.
    pub fn new(width: usize, values: Vec<f64>) -> Result<Self> {
        if width == 0 && !values.is_empty() || width != 0 && values.len() % width != 0 {
            return Err(ImportError::Format(format!(
                "{} values do not form rows of width {}",
                values.len(),
                width
            )));
        }
        Ok(Self { width, values })
    }

    /// A table of `rows` zero rows. Fails when the value count overflows.
    pub fn zeros(rows: usize, width: usize) -> Result<Self> {
        let len = rows.checked_mul(width).ok_or_else(|| {
            ImportError::Format(format!("{} rows of width {} overflow", rows, width))
        })?;
        Ok(Self {
            width,
            values: vec![0.0; len],
        })
    }

    pub fn from_rows<const N: usize>(rows: &[[f64; N]]) -> Self {
        Self {
            width: N,
            values: rows.iter().flatten().copied().collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.values.len() / self.width
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.values[index * self.width..(index + 1) * self.width]
    }

    pub fn row_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self.values[index * self.width..(index + 1) * self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size.
        self.values.chunks_exact(self.width.max(1))
    }

    /// Copy of the table, right-padded with zero columns to `width`.
    pub fn padded(&self, width: usize) -> Table {
        if width <= self.width {
            return self.clone();
        }
        let mut values = Vec::with_capacity(self.len() * width);
        for row in self.rows() {
            values.extend_from_slice(row);
            values.resize(values.len() + width - self.width, 0.0);
        }
        Table { width, values }
    }

    /// Join tables column-wise. All tables must have the same row count.
    pub fn hstack(tables: &[Table]) -> Result<Table> {
        let rows = tables.first().map(Table::len).unwrap_or(0);
        if let Some(bad) = tables.iter().find(|t| t.len() != rows) {
            return Err(ImportError::Format(format!(
                "cannot join tables of {} and {} rows",
                rows,
                bad.len()
            )));
        }
        let width = tables.iter().map(Table::width).sum();
        let mut values = Vec::with_capacity(rows * width);
        for row in 0..rows {
            for table in tables {
                values.extend_from_slice(table.row(row));
            }
        }
        Ok(Table { width, values })
    }

    /// Rows narrowed to `f32` triples. The table must be 3 wide.
    pub fn to_vec3(&self) -> Vec<[f32; 3]> {
        self.rows()
            .map(|r| [r[0] as f32, r[1] as f32, r[2] as f32])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_ragged_values() {
        assert!(Table::new(3, vec![0.0; 7]).is_err());
        assert!(Table::new(0, vec![1.0]).is_err());
        assert_eq!(Table::new(2, vec![0.0; 6]).unwrap().len(), 3);
    }

    #[test]
    fn test_padded() {
        let table = Table::from_rows(&[[1.0, 2.0], [3.0, 4.0]]);
        let padded = table.padded(4);
        assert_eq!(padded.width(), 4);
        assert_eq!(padded.row(1), &[3.0, 4.0, 0.0, 0.0]);
        assert_eq!(table.padded(1), table);
    }

    #[test]
    fn test_hstack() {
        let a = Table::from_rows(&[[1.0], [2.0]]);
        let b = Table::from_rows(&[[3.0, 4.0], [5.0, 6.0]]);
        let joined = Table::hstack(&[a, b]).unwrap();
        assert_eq!(joined.width(), 3);
        assert_eq!(joined.row(0), &[1.0, 3.0, 4.0]);
        assert_eq!(joined.row(1), &[2.0, 5.0, 6.0]);

        let short = Table::from_rows(&[[0.0]]);
        assert!(Table::hstack(&[joined, short]).is_err());
    }

    #[test]
    fn test_empty_width_has_no_rows() {
        let table = Table::zeros(5, 0).unwrap();
        assert_eq!(table.len(), 0);
        assert_eq!(table.rows().count(), 0);
    }

    #[test]
    fn test_zeros_overflow() {
        assert!(matches!(
            Table::zeros(usize::MAX, 2),
            Err(ImportError::Format(_))
        ));
        assert_eq!(Table::zeros(2, 3).unwrap().values(), &[0.0; 6]);
    }
}
