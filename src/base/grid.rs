use crate::StrError;

/// Holds the grid topology and geometry needed by the finite-volume discretization
///
/// Only internal faces are represented; boundaries are no-flow.
#[derive(Clone, Debug)]
pub struct Grid {
    /// Pore volume of each cell
    pub pore_volume: Vec<f64>,

    /// Depth of each cell centroid (z points downwards)
    pub depth: Vec<f64>,

    /// Cells (c0, c1) of each internal face
    pub face_cells: Vec<(usize, usize)>,

    /// Transmissibility of each internal face
    pub transmissibility: Vec<f64>,
}

impl Grid {
    /// Allocates a new instance
    pub fn new(
        pore_volume: Vec<f64>,
        depth: Vec<f64>,
        face_cells: Vec<(usize, usize)>,
        transmissibility: Vec<f64>,
    ) -> Result<Self, StrError> {
        let nc = pore_volume.len();
        if nc == 0 {
            return Err("the grid must have at least one cell");
        }
        if depth.len() != nc {
            return Err("depth must have one entry per cell");
        }
        if transmissibility.len() != face_cells.len() {
            return Err("transmissibility must have one entry per internal face");
        }
        if pore_volume.iter().any(|pv| *pv <= 0.0) {
            return Err("pore volumes must be > 0.0");
        }
        if face_cells.iter().any(|(c0, c1)| *c0 >= nc || *c1 >= nc) {
            return Err("face cell index is out of bounds");
        }
        Ok(Grid {
            pore_volume,
            depth,
            face_cells,
            transmissibility,
        })
    }

    /// Allocates a one-dimensional column of cells (cell i connected to cell i+1)
    ///
    /// # Input
    ///
    /// * `ncell` -- number of cells
    /// * `pore_volume` -- pore volume of every cell
    /// * `dz` -- depth increment from one cell to the next (zero gives a horizontal line)
    /// * `trans` -- transmissibility of every face
    pub fn line(ncell: usize, pore_volume: f64, dz: f64, trans: f64) -> Result<Self, StrError> {
        let faces: Vec<(usize, usize)> = (1..ncell).map(|i| (i - 1, i)).collect();
        let nface = faces.len();
        Grid::new(
            vec![pore_volume; ncell],
            (0..ncell).map(|i| (i as f64) * dz).collect(),
            faces,
            vec![trans; nface],
        )
    }

    /// Returns the number of cells
    pub fn ncell(&self) -> usize {
        self.pore_volume.len()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Grid;

    #[test]
    fn new_handles_errors() {
        assert_eq!(
            Grid::new(vec![], vec![], vec![], vec![]).err(),
            Some("the grid must have at least one cell")
        );
        assert_eq!(
            Grid::new(vec![1.0], vec![], vec![], vec![]).err(),
            Some("depth must have one entry per cell")
        );
        assert_eq!(
            Grid::new(vec![1.0], vec![0.0], vec![(0, 1)], vec![]).err(),
            Some("transmissibility must have one entry per internal face")
        );
        assert_eq!(
            Grid::new(vec![0.0], vec![0.0], vec![], vec![]).err(),
            Some("pore volumes must be > 0.0")
        );
        assert_eq!(
            Grid::new(vec![1.0], vec![0.0], vec![(0, 1)], vec![1.0]).err(),
            Some("face cell index is out of bounds")
        );
    }

    #[test]
    fn line_works() {
        let grid = Grid::line(3, 2.0, 0.5, 10.0).unwrap();
        assert_eq!(grid.ncell(), 3);
        assert_eq!(grid.face_cells, &[(0, 1), (1, 2)]);
        assert_eq!(grid.depth, &[0.0, 0.5, 1.0]);
        assert_eq!(grid.transmissibility, &[10.0, 10.0]);
        let single = Grid::line(1, 1.0, 0.0, 1.0).unwrap();
        assert_eq!(single.face_cells.len(), 0);
    }
}
