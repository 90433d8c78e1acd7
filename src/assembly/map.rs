use crate::error::LinSysError;

/// Maps each element's local boundary dofs onto the global boundary numbering.
///
/// Global boundary indices `0..num_dirichlet()` carry prescribed values; the remaining
/// indices are unknowns. A dof shared by several elements maps to the same global index from
/// each of them, with a sign of `±1` that reconciles the orientation of their local modes.
pub trait LocalToGlobalMap: Send + Sync {
    fn num_elements(&self) -> usize;

    fn boundary_map(&self, element: usize) -> &[usize];

    fn boundary_sign(&self, element: usize) -> &[f64];

    fn num_global_boundary(&self) -> usize;

    fn num_dirichlet(&self) -> usize {
        0
    }
}

/// Plain table-backed [`LocalToGlobalMap`].
#[derive(Debug, Clone)]
pub struct AssemblyMap {
    bmap: Vec<Vec<usize>>,
    bsign: Vec<Vec<f64>>,
    num_global_boundary: usize,
    num_dirichlet: usize,
}

impl AssemblyMap {
    pub fn new(
        bmap: Vec<Vec<usize>>,
        bsign: Vec<Vec<f64>>,
        num_global_boundary: usize,
    ) -> Result<Self, LinSysError> {
        LinSysError::check_len("boundary sign tables", bmap.len(), bsign.len())?;
        for (e, (indices, signs)) in bmap.iter().zip(&bsign).enumerate() {
            LinSysError::check_len("boundary signs of an element", indices.len(), signs.len())?;
            if let Some(&g) = indices.iter().find(|&&g| g >= num_global_boundary) {
                return Err(LinSysError::Configuration(format!(
                    "element {e} maps to global boundary index {g}, but only {num_global_boundary} exist"
                )));
            }
            if let Some(s) = signs.iter().find(|s| s.abs() != 1.0) {
                return Err(LinSysError::Configuration(format!(
                    "element {e} has boundary sign {s}, expected +1 or -1"
                )));
            }
        }
        Ok(Self {
            bmap,
            bsign,
            num_global_boundary,
            num_dirichlet: 0,
        })
    }

    /// Map with every sign `+1`.
    pub fn without_signs(
        bmap: Vec<Vec<usize>>,
        num_global_boundary: usize,
    ) -> Result<Self, LinSysError> {
        let bsign = bmap.iter().map(|m| vec![1.0; m.len()]).collect();
        Self::new(bmap, bsign, num_global_boundary)
    }

    /// Mark global boundary indices `0..n` as Dirichlet.
    pub fn with_dirichlet(mut self, n: usize) -> Result<Self, LinSysError> {
        if n > self.num_global_boundary {
            return Err(LinSysError::Configuration(format!(
                "{n} Dirichlet dofs requested but the boundary has only {}",
                self.num_global_boundary
            )));
        }
        self.num_dirichlet = n;
        Ok(self)
    }
}

impl LocalToGlobalMap for AssemblyMap {
    fn num_elements(&self) -> usize {
        self.bmap.len()
    }

    fn boundary_map(&self, element: usize) -> &[usize] {
        &self.bmap[element]
    }

    fn boundary_sign(&self, element: usize) -> &[f64] {
        &self.bsign[element]
    }

    fn num_global_boundary(&self) -> usize {
        self.num_global_boundary
    }

    fn num_dirichlet(&self) -> usize {
        self.num_dirichlet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_indices_and_signs() {
        assert!(AssemblyMap::new(vec![vec![0, 3]], vec![vec![1.0, 1.0]], 3).is_err());
        assert!(AssemblyMap::new(vec![vec![0, 1]], vec![vec![1.0, 0.5]], 3).is_err());
        assert!(matches!(
            AssemblyMap::new(vec![vec![0, 1]], vec![vec![1.0]], 3),
            Err(LinSysError::DimensionMismatch { .. })
        ));
        let map = AssemblyMap::new(vec![vec![0, 1], vec![1, 2]], vec![vec![1.0, -1.0], vec![-1.0, 1.0]], 3)
            .unwrap()
            .with_dirichlet(1)
            .unwrap();
        assert_eq!(map.num_elements(), 2);
        assert_eq!(map.num_dirichlet(), 1);
        assert_eq!(map.boundary_sign(1), &[-1.0, 1.0]);
        assert!(map.with_dirichlet(4).is_err());
    }
}
