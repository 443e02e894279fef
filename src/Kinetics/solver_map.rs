//! Lookups from global species indices to the solver's derivative and sparse Jacobian
//! offsets.
//!
//! Derivative offsets are handed out consecutively to the tracked species in index order.
//! Jacobian offsets follow compressed-sparse-column order: column (independent species)
//! major, row (dependent species) minor, over the flagged elements whose two species are
//! both tracked. Everything else maps to `None` and is skipped by the reactions.
use crate::Kinetics::rxn_errors::RxnError;
use crate::settings::KineticsSettings;
use log::info;
use nalgebra::DMatrix;

#[derive(Debug, Clone, PartialEq)]
pub struct SolverIndexMap {
    deriv_ids: Vec<Option<usize>>,
    jac_ids: DMatrix<Option<usize>>,
    n_deriv: usize,
    n_jac_elem: usize,
}

impl SolverIndexMap {
    /// `tracked[i]` tells whether species i is a solver variable;
    /// `jac_struct[(dependent, independent)]` is the declared sparsity
    pub fn new(tracked: &[bool], jac_struct: &DMatrix<bool>) -> Result<Self, RxnError> {
        let n_species = tracked.len();
        if jac_struct.shape() != (n_species, n_species) {
            return Err(RxnError::DimensionMismatch {
                what: "Jacobian sparsity matrix",
                expected: format!("{}x{}", n_species, n_species),
                found: format!("{}x{}", jac_struct.nrows(), jac_struct.ncols()),
            });
        }
        let mut n_deriv = 0;
        let deriv_ids: Vec<Option<usize>> = tracked
            .iter()
            .map(|&is_tracked| {
                is_tracked.then(|| {
                    n_deriv += 1;
                    n_deriv - 1
                })
            })
            .collect();

        let mut jac_ids = DMatrix::from_element(n_species, n_species, None);
        let mut n_jac_elem = 0;
        for ind in 0..n_species {
            if !tracked[ind] {
                continue;
            }
            for dep in 0..n_species {
                if tracked[dep] && jac_struct[(dep, ind)] {
                    jac_ids[(dep, ind)] = Some(n_jac_elem);
                    n_jac_elem += 1;
                }
            }
        }
        info!(
            "solver map: {} of {} species tracked, {} Jacobian elements",
            n_deriv, n_species, n_jac_elem
        );
        Ok(Self {
            deriv_ids,
            jac_ids,
            n_deriv,
            n_jac_elem,
        })
    }

    /// every species is a solver variable
    pub fn all_tracked(jac_struct: &DMatrix<bool>) -> Result<Self, RxnError> {
        Self::new(&vec![true; jac_struct.nrows()], jac_struct)
    }

    /// tracked species taken from the settings, all of them if none are listed
    pub fn from_settings(settings: &KineticsSettings, jac_struct: &DMatrix<bool>) -> Result<Self, RxnError> {
        let tracked = settings.tracked_mask(jac_struct.nrows())?;
        Self::new(&tracked, jac_struct)
    }

    pub fn n_species(&self) -> usize {
        self.deriv_ids.len()
    }
    /// length of the solver's derivative array
    pub fn n_deriv(&self) -> usize {
        self.n_deriv
    }
    /// number of stored Jacobian elements
    pub fn n_jac_elem(&self) -> usize {
        self.n_jac_elem
    }
    pub fn deriv_ids(&self) -> &[Option<usize>] {
        &self.deriv_ids
    }
    pub fn jac_ids(&self) -> &DMatrix<Option<usize>> {
        &self.jac_ids
    }
    pub fn jac_id(&self, dep: usize, ind: usize) -> Option<usize> {
        self.jac_ids[(dep, ind)]
    }

    /// expands sparse Jacobian storage into a dense n_deriv x n_deriv matrix over the
    /// tracked species
    pub fn to_dense(&self, jac: &[f64]) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.n_deriv, self.n_deriv);
        for ind in 0..self.n_species() {
            for dep in 0..self.n_species() {
                if let (Some(id), Some(row), Some(col)) =
                    (self.jac_ids[(dep, ind)], self.deriv_ids[dep], self.deriv_ids[ind])
                {
                    dense[(row, col)] = jac[id];
                }
            }
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> DMatrix<bool> {
        // 3 species; column 0 flags rows 0 and 2, column 1 flags row 1
        let mut jac_struct = DMatrix::from_element(3, 3, false);
        jac_struct[(0, 0)] = true;
        jac_struct[(2, 0)] = true;
        jac_struct[(1, 1)] = true;
        jac_struct
    }

    #[test]
    fn test_all_tracked_csc_order() {
        let map = SolverIndexMap::all_tracked(&pattern()).unwrap();
        assert_eq!(map.n_deriv(), 3);
        assert_eq!(map.deriv_ids(), &[Some(0), Some(1), Some(2)]);
        assert_eq!(map.n_jac_elem(), 3);
        assert_eq!(map.jac_id(0, 0), Some(0));
        assert_eq!(map.jac_id(2, 0), Some(1));
        assert_eq!(map.jac_id(1, 1), Some(2));
        assert_eq!(map.jac_id(0, 1), None);
        assert_eq!(map.jac_id(2, 2), None);
    }

    #[test]
    fn test_untracked_species_drop_out() {
        let map = SolverIndexMap::new(&[true, false, true], &pattern()).unwrap();
        assert_eq!(map.deriv_ids(), &[Some(0), None, Some(1)]);
        assert_eq!(map.n_deriv(), 2);
        assert_eq!(map.n_jac_elem(), 2);
        assert_eq!(map.jac_id(1, 1), None);
        assert_eq!(map.jac_id(2, 0), Some(1));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = SolverIndexMap::new(&[true, true], &pattern()).unwrap_err();
        assert!(matches!(err, RxnError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_to_dense() {
        let map = SolverIndexMap::new(&[true, false, true], &pattern()).unwrap();
        let dense = map.to_dense(&[1.5, -2.0]);
        assert_eq!(dense.shape(), (2, 2));
        assert_eq!(dense[(0, 0)], 1.5);
        assert_eq!(dense[(1, 0)], -2.0);
        assert_eq!(dense[(0, 1)], 0.0);
    }
}
