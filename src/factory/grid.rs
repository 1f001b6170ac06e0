use std::fmt;

use super::{FactoryResult, MultiArrayFactory};
use crate::{
    error::FactoryError,
    value::{FromValue, Value},
};

/// Rectangular two-dimensional array stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid<T> {
    rows: usize,
    columns: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Fails with [`FactoryError::Length`] when the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<T>>) -> FactoryResult<Self> {
        let columns = rows.first().map_or(0, Vec::len);
        let row_count = rows.len();
        let mut cells = Vec::with_capacity(row_count * columns);
        for row in rows {
            if row.len() != columns {
                return Err(FactoryError::Length {
                    expected: columns,
                    found: row.len(),
                });
            }
            cells.extend(row);
        }
        Ok(Self {
            rows: row_count,
            columns,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn dimensions(&self) -> [usize; 2] {
        [self.rows, self.columns]
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&T> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        self.cells.get(row * self.columns + column)
    }

    pub fn row(&self, row: usize) -> Option<&[T]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.columns;
        self.cells.get(start..start + self.columns)
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        (0..self.rows).filter_map(|row| self.row(row))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    pub fn into_vec(self) -> Vec<T> {
        self.cells
    }
}

/// Builds a [`Grid`] from positioned elements; every position must be set
/// before `end`.
pub struct GridFactory<T> {
    dimensions: Option<[usize; 2]>,
    cells: Vec<Option<T>>,
}

impl<T> Default for GridFactory<T> {
    fn default() -> Self {
        Self {
            dimensions: None,
            cells: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for GridFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridFactory")
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl<T> MultiArrayFactory for GridFactory<T>
where
    T: FromValue + Send + 'static,
{
    fn begin(&mut self, lengths: &[usize]) -> FactoryResult<()> {
        if self.dimensions.is_some() {
            return Err(FactoryError::AlreadyStarted);
        }
        let &[rows, columns] = lengths else {
            return Err(FactoryError::Rank {
                expected: 2,
                found: lengths.len(),
            });
        };
        self.dimensions = Some([rows, columns]);
        self.cells = Vec::with_capacity(rows * columns);
        self.cells.resize_with(rows * columns, || None);
        Ok(())
    }

    fn set(&mut self, indices: &[usize], item: Value) -> FactoryResult<()> {
        let [rows, columns] = self
            .dimensions
            .ok_or(FactoryError::NotStarted { operation: "set" })?;
        let &[row, column] = indices else {
            return Err(FactoryError::Rank {
                expected: 2,
                found: indices.len(),
            });
        };
        if row >= rows {
            return Err(FactoryError::IndexOutOfRange { index: row, len: rows });
        }
        if column >= columns {
            return Err(FactoryError::IndexOutOfRange {
                index: column,
                len: columns,
            });
        }
        self.cells[row * columns + column] = Some(T::from_value(item)?);
        Ok(())
    }

    fn end(&mut self) -> FactoryResult<Value> {
        let [rows, columns] = self
            .dimensions
            .take()
            .ok_or(FactoryError::NotStarted { operation: "end" })?;
        let cells = std::mem::take(&mut self.cells)
            .into_iter()
            .enumerate()
            .map(|(position, cell)| cell.ok_or(FactoryError::MissingElement { position }))
            .collect::<FactoryResult<Vec<T>>>()?;
        Ok(Value::object(Grid {
            rows,
            columns,
            cells,
        }))
    }

    fn reset(&mut self) {
        self.dimensions = None;
        self.cells.clear();
    }
}

pub fn grid_factory<T>() -> Box<dyn MultiArrayFactory>
where
    T: FromValue + Send + 'static,
{
    Box::new(GridFactory::<T>::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_factory_fills_row_major() {
        let mut factory = grid_factory::<i64>();
        factory.begin(&[2, 3]).unwrap();
        for row in 0..2 {
            for column in 0..3 {
                factory
                    .set(&[row, column], Value::Int((row * 10 + column) as i64))
                    .unwrap();
            }
        }
        let grid: Grid<i64> = factory.end().unwrap().into_object().unwrap();
        assert_eq!(grid.dimensions(), [2, 3]);
        assert_eq!(grid.row(1), Some(&[10, 11, 12][..]));
        assert_eq!(grid.get(0, 2), Some(&2));
        assert_eq!(grid.get(2, 0), None);
    }

    #[test]
    fn grid_factory_validates_rank_bounds_and_completeness() {
        let mut factory = grid_factory::<i64>();
        assert!(matches!(
            factory.begin(&[1, 2, 3]),
            Err(FactoryError::Rank { expected: 2, found: 3 })
        ));
        factory.begin(&[1, 2]).unwrap();
        assert!(matches!(
            factory.set(&[0, 2], Value::Int(1)),
            Err(FactoryError::IndexOutOfRange { index: 2, len: 2 })
        ));
        factory.set(&[0, 1], Value::Int(1)).unwrap();
        assert!(matches!(
            factory.end(),
            Err(FactoryError::MissingElement { position: 0 })
        ));
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let grid = Grid::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
        assert_eq!(grid.iter_rows().count(), 2);
        assert!(matches!(
            Grid::from_rows(vec![vec![1, 2], vec![3]]),
            Err(FactoryError::Length { expected: 2, found: 1 })
        ));
    }
}
