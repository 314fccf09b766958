use serde::Serialize;
use std::ops::{Index, IndexMut};

/// A cell position, `row` and `col` both in `[0, size)`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub struct GridCoord {
    pub row: usize,
    pub col: usize,
}

impl GridCoord {
    pub fn new(row: usize, col: usize) -> Self {
        GridCoord { row, col }
    }
}

const MOORE_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    ( 0, -1),          ( 0, 1),
    ( 1, -1), ( 1, 0), ( 1, 1),
];

/// A square grid stored in row-major order.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Grid<T> {
    size: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(size: usize, value: T) -> Self {
        Grid {
            size,
            cells: vec![value; size * size],
        }
    }
}

impl<T> Grid<T> {
    /// Builds a grid by calling `f` once per cell in row-major order.
    pub fn from_fn(size: usize, mut f: impl FnMut(GridCoord) -> T) -> Self {
        let mut cells = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                cells.push(f(GridCoord::new(row, col)));
            }
        }
        Grid { size, cells }
    }

    /// Side length of the grid.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn contains(&self, coord: GridCoord) -> bool {
        coord.row < self.size && coord.col < self.size
    }

    pub fn get(&self, coord: GridCoord) -> Option<&T> {
        if self.contains(coord) {
            Some(&self.cells[self.offset(coord)])
        } else {
            None
        }
    }

    /// Iterates over every cell with its coordinate, in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, &T)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, value)| (GridCoord::new(idx / size, idx % size), value))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.cells.iter()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.cells.iter_mut()
    }

    /// Rows as slices, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        // `chunks` panics on a zero chunk size; an empty grid simply has no rows.
        self.cells.chunks(self.size.max(1))
    }

    /// The in-bounds cells of the 8-cell Moore neighborhood of `coord`. There
    /// is no wraparound, so edge cells have 5 neighbors and corners 3.
    pub fn moore_neighbors(&self, coord: GridCoord) -> impl Iterator<Item = GridCoord> + '_ {
        MOORE_OFFSETS.iter().filter_map(move |&(d_row, d_col)| {
            let row = coord.row.checked_add_signed(d_row)?;
            let col = coord.col.checked_add_signed(d_col)?;
            let neighbor = GridCoord::new(row, col);
            self.contains(neighbor).then_some(neighbor)
        })
    }

    fn offset(&self, coord: GridCoord) -> usize {
        coord.row * self.size + coord.col
    }
}

impl<T> Index<GridCoord> for Grid<T> {
    type Output = T;

    fn index(&self, coord: GridCoord) -> &T {
        assert!(self.contains(coord), "{coord:?} is outside a grid of size {}", self.size);
        &self.cells[self.offset(coord)]
    }
}

impl<T> IndexMut<GridCoord> for Grid<T> {
    fn index_mut(&mut self, coord: GridCoord) -> &mut T {
        assert!(self.contains(coord), "{coord:?} is outside a grid of size {}", self.size);
        let offset = self.offset(coord);
        &mut self.cells[offset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_is_row_major() {
        let grid = Grid::from_fn(3, |c| c.row * 10 + c.col);
        let rows: Vec<Vec<usize>> = grid.rows().map(<[usize]>::to_vec).collect();
        assert_eq!(rows, vec![vec![0, 1, 2], vec![10, 11, 12], vec![20, 21, 22]]);
        assert_eq!(grid[GridCoord::new(2, 1)], 21);
        assert_eq!(grid.len(), 9);
    }

    #[test]
    fn get_out_of_bounds() {
        let grid = Grid::filled(2, 'x');
        assert_eq!(grid.get(GridCoord::new(1, 1)), Some(&'x'));
        assert_eq!(grid.get(GridCoord::new(2, 0)), None);
    }

    #[test]
    fn neighbor_counts_by_position() {
        let grid = Grid::filled(3, ());
        assert_eq!(grid.moore_neighbors(GridCoord::new(1, 1)).count(), 8);
        assert_eq!(grid.moore_neighbors(GridCoord::new(0, 1)).count(), 5);
        assert_eq!(grid.moore_neighbors(GridCoord::new(2, 2)).count(), 3);

        let single = Grid::filled(1, ());
        assert_eq!(single.moore_neighbors(GridCoord::new(0, 0)).count(), 0);
    }

    #[test]
    fn neighbors_exclude_self() {
        let grid = Grid::filled(5, ());
        let center = GridCoord::new(2, 2);
        assert!(grid.moore_neighbors(center).all(|n| n != center));
    }

    #[test]
    fn empty_grid_has_no_rows() {
        let grid: Grid<u8> = Grid::from_fn(0, |_| 0);
        assert!(grid.is_empty());
        assert_eq!(grid.rows().count(), 0);
    }
}
