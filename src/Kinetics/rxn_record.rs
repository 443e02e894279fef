//! # Packed reaction record
//!
//! One reaction instance occupies a run of three parallel regions of the [`RxnBuffer`]:
//!
//! ```text
//! int region   | KIND | N_REACT | N_PROD | INT_LEN | FLOAT_LEN | SLOT_LEN | react[N_REACT] | prod[N_PROD] |
//! float region | kind properties (the last one is the cached rate constant) | yield[N_PROD] |
//! slot region  | deriv_id[N_REACT + N_PROD] | jac_id[N_REACT * (N_REACT + N_PROD)] |
//! ```
//!
//! The header declares the length of each region, so any consumer can step over a record
//! without knowing its kind. [`RecordLayout`] turns a header into field offsets once;
//! [`MassActionRecord`] and [`MassActionRecordMut`] expose the fields by name and are sliced
//! to exactly the declared lengths, so nothing ever reads into the neighbouring record.
//!
//! The mass-action algorithms shared by every kind (sparsity, id binding, derivative and
//! Jacobian scatter) live here as well; the kinds only differ in how they compute the rate
//! constant.
//!
//! [`RxnBuffer`]: crate::Kinetics::rxn_buffer::RxnBuffer
use nalgebra::DMatrix;

pub const KIND_: usize = 0;
pub const N_REACT_: usize = 1;
pub const N_PROD_: usize = 2;
pub const INT_LEN_: usize = 3;
pub const FLOAT_LEN_: usize = 4;
pub const SLOT_LEN_: usize = 5;
pub const HEADER_LEN: usize = 6;

/// position of a record inside the three regions of the buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxnCursor {
    pub int_pos: usize,
    pub float_pos: usize,
    pub slot_pos: usize,
}

impl RxnCursor {
    /// cursor of the record that follows the one described by `header`
    pub fn advance(self, header: &RecordHeader) -> RxnCursor {
        RxnCursor {
            int_pos: self.int_pos + header.int_len,
            float_pos: self.float_pos + header.float_len,
            slot_pos: self.slot_pos + header.slot_len,
        }
    }
}

/// decoded fixed header of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub kind_tag: usize,
    pub n_react: usize,
    pub n_prod: usize,
    pub int_len: usize,
    pub float_len: usize,
    pub slot_len: usize,
}

impl RecordHeader {
    /// reads the header starting at `at`, None if the int region is too short to hold one
    pub fn read(int_data: &[usize], at: usize) -> Option<RecordHeader> {
        int_data.get(at..at + HEADER_LEN).map(Self::from_slice)
    }

    /// decodes the first HEADER_LEN ints of `h`
    pub fn from_slice(h: &[usize]) -> RecordHeader {
        RecordHeader {
            kind_tag: h[KIND_],
            n_react: h[N_REACT_],
            n_prod: h[N_PROD_],
            int_len: h[INT_LEN_],
            float_len: h[FLOAT_LEN_],
            slot_len: h[SLOT_LEN_],
        }
    }

    /// header of a mass-action record with the given shape, None if a region length
    /// overflows usize
    pub fn mass_action(
        kind_tag: usize,
        n_react: usize,
        n_prod: usize,
        n_float_prop: usize,
    ) -> Option<Self> {
        let n_dep = n_react.checked_add(n_prod)?;
        Some(RecordHeader {
            kind_tag,
            n_react,
            n_prod,
            int_len: HEADER_LEN.checked_add(n_dep)?,
            float_len: n_float_prop.checked_add(n_prod)?,
            slot_len: n_react.checked_mul(n_dep)?.checked_add(n_dep)?,
        })
    }

    pub fn to_ints(&self) -> [usize; HEADER_LEN] {
        [
            self.kind_tag,
            self.n_react,
            self.n_prod,
            self.int_len,
            self.float_len,
            self.slot_len,
        ]
    }
}

/// field offsets inside one mass-action record, relative to the record start of each region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    pub n_react: usize,
    pub n_prod: usize,
    pub n_float_prop: usize,
    react_start: usize,
    prod_start: usize,
    yield_start: usize,
    deriv_start: usize,
    jac_start: usize,
}

impl RecordLayout {
    pub fn new(header: &RecordHeader, n_float_prop: usize) -> Self {
        RecordLayout {
            n_react: header.n_react,
            n_prod: header.n_prod,
            n_float_prop,
            react_start: HEADER_LEN,
            prod_start: HEADER_LEN + header.n_react,
            yield_start: n_float_prop,
            deriv_start: 0,
            jac_start: header.n_react + header.n_prod,
        }
    }
    /// number of dependent species: reactants then products
    pub fn n_dep(&self) -> usize {
        self.n_react + self.n_prod
    }
}

/// read-only view of a mass-action record
#[derive(Debug, Clone, Copy)]
pub struct MassActionRecord<'a> {
    ints: &'a [usize],
    floats: &'a [f64],
    slots: &'a [Option<usize>],
    layout: RecordLayout,
}

impl<'a> MassActionRecord<'a> {
    /// the slices must be exactly the record's declared regions
    pub fn new(
        ints: &'a [usize],
        floats: &'a [f64],
        slots: &'a [Option<usize>],
        layout: RecordLayout,
    ) -> Self {
        Self {
            ints,
            floats,
            slots,
            layout,
        }
    }
    pub fn n_react(&self) -> usize {
        self.layout.n_react
    }
    pub fn n_prod(&self) -> usize {
        self.layout.n_prod
    }
    /// global species index of reactant `i`
    pub fn react(&self, i: usize) -> usize {
        self.ints[self.layout.react_start + i]
    }
    /// global species index of product `i`
    pub fn prod(&self, i: usize) -> usize {
        self.ints[self.layout.prod_start + i]
    }
    /// global species index of dependent species `i` (reactants first, then products)
    pub fn dep(&self, i: usize) -> usize {
        self.ints[self.layout.react_start + i]
    }
    pub fn yield_of(&self, i: usize) -> f64 {
        self.floats[self.layout.yield_start + i]
    }
    /// the cached rate constant is stored as the last kind property
    pub fn rate_constant(&self) -> f64 {
        self.floats[self.layout.n_float_prop - 1]
    }
    pub fn deriv_id(&self, i: usize) -> Option<usize> {
        self.slots[self.layout.deriv_start + i]
    }
    pub fn jac_id(&self, i: usize) -> Option<usize> {
        self.slots[self.layout.jac_start + i]
    }

    /// rate = k * prod(c[react_i]); repeated reactants enter repeatedly
    pub fn rate(&self, state: &[f64]) -> f64 {
        let mut rate = self.rate_constant();
        for i in 0..self.n_react() {
            rate *= state[self.react(i)];
        }
        rate
    }

    /// flags every (dependent, independent reactant) pair of this reaction
    pub fn flag_jac_elem(&self, jac_struct: &mut DMatrix<bool>) {
        for i_ind in 0..self.n_react() {
            let ind = self.react(i_ind);
            for i_dep in 0..self.layout.n_dep() {
                jac_struct[(self.dep(i_dep), ind)] = true;
            }
        }
    }

    /// scatter-adds the derivative contribution at the given rate
    pub fn add_deriv_contrib(&self, rate: f64, deriv: &mut [f64]) {
        let mut i_dep = 0;
        for _ in 0..self.n_react() {
            if let Some(id) = self.deriv_id(i_dep) {
                deriv[id] -= rate;
            }
            i_dep += 1;
        }
        for i_prod in 0..self.n_prod() {
            if let Some(id) = self.deriv_id(i_dep) {
                deriv[id] += rate * self.yield_of(i_prod);
            }
            i_dep += 1;
        }
    }

    /// scatter-adds the Jacobian contribution at the given rate.
    ///
    /// d(rate)/d(c_i) is taken as rate / c_i, exact for a mass-action monomial with one
    /// term per reactant occurrence. Concentrations of reactants must be non-zero; a zero
    /// reactant concentration already makes `rate` zero, and callers skip zero rates.
    pub fn add_jac_contrib(&self, rate: f64, state: &[f64], jac: &mut [f64]) {
        let mut i_elem = 0;
        for i_ind in 0..self.n_react() {
            let d_rate = rate / state[self.react(i_ind)];
            for _ in 0..self.n_react() {
                if let Some(id) = self.jac_id(i_elem) {
                    jac[id] -= d_rate;
                }
                i_elem += 1;
            }
            for i_prod in 0..self.n_prod() {
                if let Some(id) = self.jac_id(i_elem) {
                    jac[id] += self.yield_of(i_prod) * d_rate;
                }
                i_elem += 1;
            }
        }
    }
}

/// mutable view of a mass-action record; shape fields stay read-only
#[derive(Debug)]
pub struct MassActionRecordMut<'a> {
    ints: &'a [usize],
    floats: &'a mut [f64],
    slots: &'a mut [Option<usize>],
    layout: RecordLayout,
}

impl<'a> MassActionRecordMut<'a> {
    pub fn new(
        ints: &'a [usize],
        floats: &'a mut [f64],
        slots: &'a mut [Option<usize>],
        layout: RecordLayout,
    ) -> Self {
        Self {
            ints,
            floats,
            slots,
            layout,
        }
    }
    pub fn as_view(&self) -> MassActionRecord<'_> {
        MassActionRecord::new(self.ints, &*self.floats, &*self.slots, self.layout)
    }
    /// kind-specific float properties, cached rate constant last
    pub fn props(&self) -> &[f64] {
        &self.floats[..self.layout.n_float_prop]
    }
    pub fn set_props(&mut self, props: &[f64]) {
        self.floats[..self.layout.n_float_prop].copy_from_slice(props);
    }
    pub fn set_rate_constant(&mut self, k: f64) {
        self.floats[self.layout.n_float_prop - 1] = k;
    }

    /// resolves derivative ids (reactants, then products) and Jacobian ids
    /// (independent reactant outer, dependent species inner)
    pub fn update_ids(&mut self, deriv_ids: &[Option<usize>], jac_ids: &DMatrix<Option<usize>>) {
        let layout = self.layout;
        let ints = self.ints;
        // reactants and products are contiguous in the int region
        let deps = &ints[layout.react_start..layout.react_start + layout.n_dep()];
        for (i_dep, &spec) in deps.iter().enumerate() {
            self.slots[layout.deriv_start + i_dep] = deriv_ids[spec];
        }
        let mut i_jac = layout.jac_start;
        for &ind in &deps[..layout.n_react] {
            for &dep in deps {
                self.slots[i_jac] = jac_ids[(dep, ind)];
                i_jac += 1;
            }
        }
    }

    pub fn clear_ids(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // A + B -> 0.5 C, 2 kind properties
    fn packed() -> (Vec<usize>, Vec<f64>, Vec<Option<usize>>, RecordLayout) {
        let header = RecordHeader::mass_action(0, 2, 1, 2).unwrap();
        let mut ints = header.to_ints().to_vec();
        ints.extend([0, 1, 2]);
        let floats = vec![7.0, 2.0, 0.5];
        let slots = vec![None; header.slot_len];
        (ints, floats, slots, RecordLayout::new(&header, 2))
    }

    #[test]
    fn test_header_lengths() {
        let header = RecordHeader::mass_action(1, 2, 1, 8).unwrap();
        assert_eq!(header.int_len, HEADER_LEN + 3);
        assert_eq!(header.float_len, 9);
        assert_eq!(header.slot_len, 3 + 2 * 3);
        let ints = header.to_ints();
        assert_eq!(RecordHeader::read(&ints, 0), Some(header));
        assert_eq!(RecordHeader::read(&ints[..3], 0), None);
    }

    #[test]
    fn test_header_lengths_overflow() {
        assert_eq!(RecordHeader::mass_action(1, usize::MAX, 1, 8), None);
        assert_eq!(RecordHeader::mass_action(1, 1 << 33, 1 << 33, 8), None);
        assert_eq!(RecordHeader::mass_action(1, 1, usize::MAX - 4, 8), None);
    }

    #[test]
    fn test_cursor_advance() {
        let header = RecordHeader::mass_action(0, 1, 1, 8).unwrap();
        let next = RxnCursor::default().advance(&header);
        assert_eq!(next.int_pos, HEADER_LEN + 2);
        assert_eq!(next.float_pos, 9);
        assert_eq!(next.slot_pos, 2 + 2);
    }

    #[test]
    fn test_named_accessors() {
        let (ints, floats, slots, layout) = packed();
        let rec = MassActionRecord::new(&ints, &floats, &slots, layout);
        assert_eq!(rec.n_react(), 2);
        assert_eq!(rec.n_prod(), 1);
        assert_eq!((rec.react(0), rec.react(1), rec.prod(0)), (0, 1, 2));
        assert_eq!(rec.dep(2), 2);
        assert_eq!(rec.rate_constant(), 2.0);
        assert_eq!(rec.yield_of(0), 0.5);
        assert_relative_eq!(rec.rate(&[3.0, 5.0, 1.0]), 30.0);
    }

    #[test]
    fn test_update_ids_ordering() {
        let (ints, mut floats, mut slots, layout) = packed();
        let deriv_ids = vec![Some(10), None, Some(12)];
        let jac_ids = DMatrix::from_fn(3, 3, |dep, ind| Some(100 + 10 * dep + ind));
        let mut rec = MassActionRecordMut::new(&ints, &mut floats, &mut slots, layout);
        rec.update_ids(&deriv_ids, &jac_ids);
        let view = rec.as_view();
        assert_eq!(view.deriv_id(0), Some(10));
        assert_eq!(view.deriv_id(1), None);
        assert_eq!(view.deriv_id(2), Some(12));
        // independent reactant 0: deps A, B, C
        assert_eq!(view.jac_id(0), Some(100));
        assert_eq!(view.jac_id(1), Some(110));
        assert_eq!(view.jac_id(2), Some(120));
        // independent reactant 1
        assert_eq!(view.jac_id(3), Some(101));
        assert_eq!(view.jac_id(5), Some(121));
        rec.clear_ids();
        assert!(slots.iter().all(|s| s.is_none()));
    }
}
