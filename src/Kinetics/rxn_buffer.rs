//! # Packed reaction buffer
//!
//! [`RxnBuffer`] stores every reaction of a mechanism back to back in three flat regions
//! (see [`crate::Kinetics::rxn_record`] for the record layout) and drives the evaluation
//! phases by walking the records with a self-advancing [`RxnCursor`]:
//!
//! 1) `declare_jacobian_sparsity` - once per mechanism, flags the Jacobian elements
//! 2) `bind_indices` - once the solver has fixed its derivative and Jacobian layout
//!    (again whenever the tracked species change)
//! 3) `refresh_rate_constants` - whenever temperature or pressure change
//! 4) `calc_deriv` / `calc_jac` / `contribute` - on every solver evaluation
//!
//! The buffer follows the lifecycle Unbound -> Bound -> Active ([`RxnPhase`]); evaluation is
//! refused unless the buffer is Active.
//!
//! # Examples
//! ```
//! use KiTheRxn::Kinetics::env_state::EnvState;
//! use KiTheRxn::Kinetics::rxn_buffer::{RxnBuffer, RxnDescription};
//! use KiTheRxn::Kinetics::rxn_CMAQ_H2O2::CmaqH2O2Params;
//! use KiTheRxn::Kinetics::rxn_solver::RxnParams;
//! use KiTheRxn::Kinetics::solver_map::SolverIndexMap;
//! use nalgebra::DMatrix;
//! // A -> B
//! let mut buf = RxnBuffer::new(2);
//! let params = CmaqH2O2Params::new(1e-12, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0);
//! buf.add_reaction(&RxnDescription::new(vec![0], vec![1], RxnParams::CmaqH2O2(params))).unwrap();
//! let mut jac_struct = DMatrix::from_element(2, 2, false);
//! buf.declare_jacobian_sparsity(&mut jac_struct).unwrap();
//! let map = SolverIndexMap::all_tracked(&jac_struct).unwrap();
//! buf.bind_indices(&map).unwrap();
//! buf.refresh_rate_constants(&EnvState::new(298.0, 101325.0)).unwrap();
//! let mut deriv = vec![0.0; map.n_deriv()];
//! buf.calc_deriv(&[1e10, 0.0], &mut deriv).unwrap();
//! assert!((deriv[0] + 1e-2).abs() < 1e-12);
//! ```
use crate::Kinetics::env_state::EnvState;
use crate::Kinetics::rxn_errors::RxnError;
use crate::Kinetics::rxn_record::{
    HEADER_LEN, KIND_, MassActionRecord, MassActionRecordMut, RecordHeader, RecordLayout, RxnCursor,
};
use crate::Kinetics::rxn_solver::{RxnKind, RxnParams, RxnSolver};
use crate::Kinetics::solver_map::SolverIndexMap;
use log::{debug, info, warn};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// stoichiometry and rate law of one reaction, the input for packing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RxnDescription {
    /// species indices of the reactants; a repeated index raises the kinetic order
    pub reactants: Vec<usize>,
    pub products: Vec<usize>,
    /// one yield per product
    pub yields: Vec<f64>,
    pub params: RxnParams,
}

impl RxnDescription {
    /// reaction with unit yield for every product
    pub fn new(reactants: Vec<usize>, products: Vec<usize>, params: RxnParams) -> Self {
        let yields = vec![1.0; products.len()];
        Self {
            reactants,
            products,
            yields,
            params,
        }
    }
    pub fn with_yields(mut self, yields: Vec<f64>) -> Self {
        self.yields = yields;
        self
    }
}

/// lifecycle state of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxnPhase {
    /// slots are not resolved
    Unbound,
    /// slots resolved, rate constants not computed for the current conditions
    Bound,
    /// ready for derivative and Jacobian evaluation
    Active,
}

/// flat storage of all reaction records of a mechanism
#[derive(Debug, Clone, Default)]
pub struct RxnBuffer {
    int_data: Vec<usize>,
    float_data: Vec<f64>,
    slot_data: Vec<Option<usize>>,
    n_rxn: usize,
    n_species: usize,
    /// (derivative length, Jacobian length) of the map the slots were bound with
    binding: Option<(usize, usize)>,
    /// conditions the cached rate constants were computed for
    env: Option<EnvState>,
}

impl RxnBuffer {
    /// empty buffer for a system of `n_species` species
    pub fn new(n_species: usize) -> Self {
        Self {
            n_species,
            ..Default::default()
        }
    }

    /// adopts packed int and float regions produced elsewhere; every record is validated
    /// and the slot region is allocated unbound
    pub fn from_raw_parts(
        n_species: usize,
        int_data: Vec<usize>,
        float_data: Vec<f64>,
    ) -> Result<Self, RxnError> {
        let (n_rxn, slot_len) = Self::check_regions(n_species, &int_data, &float_data)?;
        info!(
            "adopted packed buffer: {} reactions, {} ints, {} floats",
            n_rxn,
            int_data.len(),
            float_data.len()
        );
        Ok(Self {
            int_data,
            float_data,
            slot_data: vec![None; slot_len],
            n_rxn,
            n_species,
            binding: None,
            env: None,
        })
    }

    /// packs one reaction at the end of the buffer and returns its record index.
    /// The buffer goes back to Unbound: sparsity and bindings must be redone.
    pub fn add_reaction(&mut self, rxn: &RxnDescription) -> Result<usize, RxnError> {
        if rxn.reactants.is_empty() {
            return Err(RxnError::NoReactants);
        }
        if rxn.yields.len() != rxn.products.len() {
            return Err(RxnError::YieldCountMismatch {
                n_prod: rxn.products.len(),
                n_yields: rxn.yields.len(),
            });
        }
        if let Some(&index) = rxn
            .reactants
            .iter()
            .chain(&rxn.products)
            .find(|&&index| index >= self.n_species)
        {
            return Err(RxnError::SpeciesOutOfRange {
                index,
                n_species: self.n_species,
            });
        }
        let kind = rxn.params.kind();
        let props = rxn.params.to_props();
        kind.validate_props(&props)
            .map_err(RxnError::InvalidParameters)?;

        let header = RecordHeader::mass_action(
            kind.kind_tag(),
            rxn.reactants.len(),
            rxn.products.len(),
            kind.n_float_prop(),
        )
        .ok_or_else(|| RxnError::InvalidParameters("record lengths overflow usize".to_string()))?;
        self.int_data.extend_from_slice(&header.to_ints());
        self.int_data.extend_from_slice(&rxn.reactants);
        self.int_data.extend_from_slice(&rxn.products);
        self.float_data.extend_from_slice(&props);
        self.float_data.extend_from_slice(&rxn.yields);
        self.slot_data
            .resize(self.slot_data.len() + header.slot_len, None);
        let i_rxn = self.n_rxn;
        self.n_rxn += 1;
        self.unbind();
        self.env = None;
        debug!(
            "packed {} reaction #{}: {:?} -> {:?}",
            kind.kind_name(),
            i_rxn,
            rxn.reactants,
            rxn.products
        );
        Ok(i_rxn)
    }

    /// walks the int and float regions and checks every record against its kind.
    /// Returns the number of records and the total slot length they declare.
    fn check_regions(
        n_species: usize,
        int_data: &[usize],
        float_data: &[f64],
    ) -> Result<(usize, usize), RxnError> {
        let malformed = |offset: usize, reason: String| RxnError::MalformedRecord { offset, reason };
        let mut cursor = RxnCursor::default();
        let mut n_rxn = 0;
        while cursor.int_pos < int_data.len() {
            let offset = cursor.int_pos;
            let header = RecordHeader::read(int_data, offset)
                .ok_or_else(|| malformed(offset, "truncated header".to_string()))?;
            let kind = RxnKind::from_tag(header.kind_tag).ok_or(RxnError::UnknownKind {
                tag: header.kind_tag,
                offset,
            })?;
            if header.n_react == 0 {
                return Err(malformed(offset, "no reactants".to_string()));
            }
            // species counts must fit the ints left after the header
            let remaining = int_data.len() - offset - HEADER_LEN;
            if header.n_react > remaining || header.n_prod > remaining - header.n_react {
                return Err(malformed(
                    offset,
                    format!(
                        "{} reactants and {} products do not fit the int region",
                        header.n_react, header.n_prod
                    ),
                ));
            }
            let expected = RecordHeader::mass_action(
                header.kind_tag,
                header.n_react,
                header.n_prod,
                kind.n_float_prop(),
            )
            .ok_or_else(|| malformed(offset, "record lengths overflow usize".to_string()))?;
            if header != expected {
                return Err(malformed(
                    offset,
                    format!(
                        "declared lengths (int {}, float {}, slot {}) do not match a {} record with {} reactants and {} products (int {}, float {}, slot {})",
                        header.int_len,
                        header.float_len,
                        header.slot_len,
                        kind.kind_name(),
                        header.n_react,
                        header.n_prod,
                        expected.int_len,
                        expected.float_len,
                        expected.slot_len
                    ),
                ));
            }
            if offset + header.int_len > int_data.len() {
                return Err(malformed(offset, "int region ends inside the record".to_string()));
            }
            if cursor.float_pos + header.float_len > float_data.len() {
                return Err(malformed(offset, "float region ends inside the record".to_string()));
            }
            let species = &int_data[offset + HEADER_LEN..offset + header.int_len];
            if let Some(&index) = species.iter().find(|&&index| index >= n_species) {
                return Err(RxnError::SpeciesOutOfRange { index, n_species });
            }
            let props = &float_data[cursor.float_pos..cursor.float_pos + kind.n_float_prop()];
            kind.validate_props(props)
                .map_err(RxnError::InvalidParameters)?;
            cursor = cursor.advance(&header);
            n_rxn += 1;
        }
        if cursor.float_pos != float_data.len() {
            return Err(malformed(
                cursor.int_pos,
                format!(
                    "{} floats left after the last record",
                    float_data.len() - cursor.float_pos
                ),
            ));
        }
        Ok((n_rxn, cursor.slot_pos))
    }

    /// re-checks the whole buffer layout
    pub fn validate(&self) -> Result<(), RxnError> {
        let (n_rxn, slot_len) = Self::check_regions(self.n_species, &self.int_data, &self.float_data)?;
        if n_rxn != self.n_rxn || slot_len != self.slot_data.len() {
            return Err(RxnError::MalformedRecord {
                offset: self.int_data.len(),
                reason: format!(
                    "buffer claims {} records and {} slots, regions hold {} and {}",
                    self.n_rxn,
                    self.slot_data.len(),
                    n_rxn,
                    slot_len
                ),
            });
        }
        Ok(())
    }

    /////////////////////////////////ACCESS///////////////////////////////////////////
    pub fn n_rxn(&self) -> usize {
        self.n_rxn
    }
    pub fn n_species(&self) -> usize {
        self.n_species
    }
    pub fn int_data(&self) -> &[usize] {
        &self.int_data
    }
    pub fn float_data(&self) -> &[f64] {
        &self.float_data
    }
    /// conditions of the cached rate constants, None if they are stale
    pub fn env(&self) -> Option<&EnvState> {
        self.env.as_ref()
    }
    pub fn phase(&self) -> RxnPhase {
        match (self.binding, self.env) {
            (None, _) => RxnPhase::Unbound,
            (Some(_), None) => RxnPhase::Bound,
            (Some(_), Some(_)) => RxnPhase::Active,
        }
    }

    /// header of the record at `cursor`
    pub fn header(&self, cursor: RxnCursor) -> RecordHeader {
        RecordHeader::from_slice(&self.int_data[cursor.int_pos..cursor.int_pos + HEADER_LEN])
    }

    pub fn kind_at(&self, cursor: RxnCursor) -> Result<RxnKind, RxnError> {
        let tag = self.int_data[cursor.int_pos + KIND_];
        RxnKind::from_tag(tag).ok_or(RxnError::UnknownKind {
            tag,
            offset: cursor.int_pos,
        })
    }

    /// view of the mass-action record at `cursor`, and the cursor of the next record
    pub fn mass_action_record(
        &self,
        cursor: RxnCursor,
        n_float_prop: usize,
    ) -> (MassActionRecord<'_>, RxnCursor) {
        let header = self.header(cursor);
        let next = cursor.advance(&header);
        let rec = MassActionRecord::new(
            &self.int_data[cursor.int_pos..next.int_pos],
            &self.float_data[cursor.float_pos..next.float_pos],
            &self.slot_data[cursor.slot_pos..next.slot_pos],
            RecordLayout::new(&header, n_float_prop),
        );
        (rec, next)
    }

    pub fn mass_action_record_mut(
        &mut self,
        cursor: RxnCursor,
        n_float_prop: usize,
    ) -> (MassActionRecordMut<'_>, RxnCursor) {
        let header = self.header(cursor);
        let next = cursor.advance(&header);
        let rec = MassActionRecordMut::new(
            &self.int_data[cursor.int_pos..next.int_pos],
            &mut self.float_data[cursor.float_pos..next.float_pos],
            &mut self.slot_data[cursor.slot_pos..next.slot_pos],
            RecordLayout::new(&header, n_float_prop),
        );
        (rec, next)
    }

    /// start cursor of every record, found by skipping
    pub fn record_offsets(&self) -> Result<Vec<RxnCursor>, RxnError> {
        let mut offsets = Vec::with_capacity(self.n_rxn);
        let mut cursor = RxnCursor::default();
        for _ in 0..self.n_rxn {
            offsets.push(cursor);
            cursor = self.kind_at(cursor)?.skip(self, cursor);
        }
        Ok(offsets)
    }

    fn cursor_of(&self, i_rxn: usize) -> Result<RxnCursor, RxnError> {
        if i_rxn >= self.n_rxn {
            return Err(RxnError::NoSuchRecord {
                index: i_rxn,
                n_rxn: self.n_rxn,
            });
        }
        let mut cursor = RxnCursor::default();
        for _ in 0..i_rxn {
            cursor = self.kind_at(cursor)?.skip(self, cursor);
        }
        Ok(cursor)
    }

    /// replaces the rate-law coefficients of record `i_rxn`; the record keeps its kind and
    /// shape. Cached rate constants become stale.
    pub fn update_rxn_params(&mut self, i_rxn: usize, params: &RxnParams) -> Result<(), RxnError> {
        let cursor = self.cursor_of(i_rxn)?;
        let kind = self.kind_at(cursor)?;
        if kind != params.kind() {
            return Err(RxnError::InvalidParameters(format!(
                "record {} is a {} reaction, got {} parameters",
                i_rxn,
                kind.kind_name(),
                params.kind().kind_name()
            )));
        }
        let props = params.to_props();
        kind.validate_props(&props)
            .map_err(RxnError::InvalidParameters)?;
        let (mut rec, _) = self.mass_action_record_mut(cursor, kind.n_float_prop());
        rec.set_props(&props);
        self.env = None;
        Ok(())
    }

    /// cached rate constant of every record
    pub fn rate_constants(&self) -> Result<Vec<f64>, RxnError> {
        let mut k = Vec::with_capacity(self.n_rxn);
        let mut cursor = RxnCursor::default();
        for _ in 0..self.n_rxn {
            let kind = self.kind_at(cursor)?;
            let (rec, next) = self.mass_action_record(cursor, kind.n_float_prop());
            k.push(rec.rate_constant());
            cursor = next;
        }
        Ok(k)
    }

    /////////////////////////////////SETUP PHASES///////////////////////////////////////////
    /// flags jac_struct[(dependent, independent)] for every element any reaction can touch.
    /// `jac_struct` must be n_species x n_species; flags already set are kept.
    pub fn declare_jacobian_sparsity(&self, jac_struct: &mut DMatrix<bool>) -> Result<(), RxnError> {
        if jac_struct.shape() != (self.n_species, self.n_species) {
            return Err(RxnError::DimensionMismatch {
                what: "Jacobian sparsity matrix",
                expected: format!("{}x{}", self.n_species, self.n_species),
                found: format!("{}x{}", jac_struct.nrows(), jac_struct.ncols()),
            });
        }
        let mut cursor = RxnCursor::default();
        for _ in 0..self.n_rxn {
            cursor = self
                .kind_at(cursor)?
                .declare_jacobian_sparsity(self, cursor, jac_struct);
        }
        info!(
            "Jacobian sparsity declared by {} reactions: {} elements flagged",
            self.n_rxn,
            jac_struct.iter().filter(|&&flag| flag).count()
        );
        Ok(())
    }

    /// resolves every derivative and Jacobian slot through the solver map
    pub fn bind_indices(&mut self, map: &SolverIndexMap) -> Result<(), RxnError> {
        if map.n_species() != self.n_species {
            return Err(RxnError::DimensionMismatch {
                what: "solver index map",
                expected: format!("{} species", self.n_species),
                found: format!("{} species", map.n_species()),
            });
        }
        let mut cursor = RxnCursor::default();
        for _ in 0..self.n_rxn {
            let kind = self.kind_at(cursor)?;
            cursor = kind.bind_indices(self, cursor, map.deriv_ids(), map.jac_ids());
        }
        self.binding = Some((map.n_deriv(), map.n_jac_elem()));
        info!(
            "bound {} reactions to {} derivative and {} Jacobian elements",
            self.n_rxn,
            map.n_deriv(),
            map.n_jac_elem()
        );
        Ok(())
    }

    /// forgets all slot bindings, e.g. before the tracked species change
    pub fn unbind(&mut self) {
        self.slot_data.fill(None);
        self.binding = None;
    }

    /// recomputes the cached rate constants for new conditions
    pub fn refresh_rate_constants(&mut self, env: &EnvState) -> Result<(), RxnError> {
        let mut cursor = RxnCursor::default();
        for _ in 0..self.n_rxn {
            let kind = self.kind_at(cursor)?;
            cursor = kind.refresh_rate_constant(self, cursor, env);
        }
        self.env = Some(*env);
        let n_bad = self
            .rate_constants()?
            .iter()
            .filter(|k| !k.is_finite())
            .count();
        if n_bad > 0 {
            warn!(
                "{} of {} rate constants are not finite at T = {} K, P = {} Pa",
                n_bad, self.n_rxn, env.temperature, env.pressure
            );
        }
        debug!(
            "rate constants refreshed at T = {} K, P = {} Pa",
            env.temperature, env.pressure
        );
        Ok(())
    }

    /////////////////////////////////EVALUATION///////////////////////////////////////////
    /// adds every reaction's contribution to `deriv` and, if given, to `jac`.
    ///
    /// `state` holds the concentrations of all species; reactant concentrations must be
    /// non-zero wherever a Jacobian is requested for a reaction with a non-zero rate.
    pub fn contribute(
        &self,
        state: &[f64],
        deriv: &mut [f64],
        jac: Option<&mut [f64]>,
    ) -> Result<(), RxnError> {
        self.evaluate(state, Some(deriv), jac)
    }

    /// adds the time derivative contributions f(t, y)
    pub fn calc_deriv(&self, state: &[f64], deriv: &mut [f64]) -> Result<(), RxnError> {
        self.evaluate(state, Some(deriv), None)
    }

    /// adds the Jacobian contributions, `jac` indexed by the bound sparse element ids
    pub fn calc_jac(&self, state: &[f64], jac: &mut [f64]) -> Result<(), RxnError> {
        self.evaluate(state, None, Some(jac))
    }

    fn evaluate(
        &self,
        state: &[f64],
        mut deriv: Option<&mut [f64]>,
        mut jac: Option<&mut [f64]>,
    ) -> Result<(), RxnError> {
        let (n_deriv, n_jac_elem) = match (self.binding, self.env) {
            (Some(binding), Some(_)) => binding,
            (None, _) => return Err(RxnError::NotReady("indices are not bound")),
            (Some(_), None) => return Err(RxnError::NotReady("rate constants are stale")),
        };
        if state.len() != self.n_species {
            return Err(RxnError::DimensionMismatch {
                what: "state vector",
                expected: self.n_species.to_string(),
                found: state.len().to_string(),
            });
        }
        if let Some(d) = deriv.as_deref() {
            if d.len() < n_deriv {
                return Err(RxnError::DimensionMismatch {
                    what: "derivative array",
                    expected: format!("at least {}", n_deriv),
                    found: d.len().to_string(),
                });
            }
        }
        if let Some(j) = jac.as_deref() {
            if j.len() < n_jac_elem {
                return Err(RxnError::DimensionMismatch {
                    what: "Jacobian array",
                    expected: format!("at least {}", n_jac_elem),
                    found: j.len().to_string(),
                });
            }
        }
        let mut cursor = RxnCursor::default();
        for _ in 0..self.n_rxn {
            cursor = self.kind_at(cursor)?.contribute(
                self,
                cursor,
                state,
                deriv.as_deref_mut(),
                jac.as_deref_mut(),
            );
        }
        Ok(())
    }
}
