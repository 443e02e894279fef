//! Uniform protocol every packed reaction kind satisfies.
//!
//! A kind is a zero-sized marker type implementing [`RxnSolver`]; [`RxnKind`] closes over all
//! kinds and forwards the calls through `enum_dispatch`, so the buffer driver needs only the
//! tag stored in each record header and never allocates or goes through a vtable.
use crate::Kinetics::env_state::EnvState;
use crate::Kinetics::rxn_CMAQ_H2O2::{CmaqH2O2, CmaqH2O2Params};
use crate::Kinetics::rxn_arrhenius::{Arrhenius, ArrheniusParams};
use crate::Kinetics::rxn_buffer::RxnBuffer;
use crate::Kinetics::rxn_record::RxnCursor;
use enum_dispatch::enum_dispatch;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// header tag of Arrhenius records; 0 is never a valid tag
pub const RXN_ARRHENIUS: usize = 1;
/// header tag of CMAQ_H2O2 records
pub const RXN_CMAQ_H2O2: usize = 2;

#[enum_dispatch]
pub trait RxnSolver {
    /// tag written into the KIND_ slot of the record header
    fn kind_tag(&self) -> usize;
    fn kind_name(&self) -> &'static str;
    /// number of kind-specific float properties, the cached rate constant included
    fn n_float_prop(&self) -> usize;
    /// checks the kind-specific float properties of one record
    fn validate_props(&self, props: &[f64]) -> Result<(), String>;
    /// rate constant for the given properties, number of reactants and environment
    fn calc_rate_constant(&self, props: &[f64], n_react: usize, env: &EnvState) -> f64;

    /// flags the Jacobian elements this record can touch: jac_struct[(dependent, independent)]
    fn declare_jacobian_sparsity(
        &self,
        buf: &RxnBuffer,
        cursor: RxnCursor,
        jac_struct: &mut DMatrix<bool>,
    ) -> RxnCursor {
        let (rec, next) = buf.mass_action_record(cursor, self.n_float_prop());
        rec.flag_jac_elem(jac_struct);
        next
    }

    /// resolves the record's derivative and Jacobian ids through the solver lookups
    fn bind_indices(
        &self,
        buf: &mut RxnBuffer,
        cursor: RxnCursor,
        deriv_ids: &[Option<usize>],
        jac_ids: &DMatrix<Option<usize>>,
    ) -> RxnCursor {
        let (mut rec, next) = buf.mass_action_record_mut(cursor, self.n_float_prop());
        rec.update_ids(deriv_ids, jac_ids);
        next
    }

    /// recomputes and caches the rate constant for new environmental conditions
    fn refresh_rate_constant(&self, buf: &mut RxnBuffer, cursor: RxnCursor, env: &EnvState) -> RxnCursor {
        let (mut rec, next) = buf.mass_action_record_mut(cursor, self.n_float_prop());
        let k = self.calc_rate_constant(rec.props(), rec.as_view().n_react(), env);
        rec.set_rate_constant(k);
        next
    }

    /// adds this record's contributions to the derivative and/or Jacobian
    fn contribute(
        &self,
        buf: &RxnBuffer,
        cursor: RxnCursor,
        state: &[f64],
        deriv: Option<&mut [f64]>,
        jac: Option<&mut [f64]>,
    ) -> RxnCursor {
        let (rec, next) = buf.mass_action_record(cursor, self.n_float_prop());
        let rate = rec.rate(state);
        if rate != 0.0 {
            if let Some(deriv) = deriv {
                rec.add_deriv_contrib(rate, deriv);
            }
            if let Some(jac) = jac {
                rec.add_jac_contrib(rate, state, jac);
            }
        }
        next
    }

    /// steps over the record without touching it
    fn skip(&self, buf: &RxnBuffer, cursor: RxnCursor) -> RxnCursor {
        cursor.advance(&buf.header(cursor))
    }
}

/// every reaction kind the buffer can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[enum_dispatch(RxnSolver)]
pub enum RxnKind {
    Arrhenius(Arrhenius),
    CmaqH2O2(CmaqH2O2),
}

impl RxnKind {
    pub fn from_tag(tag: usize) -> Option<RxnKind> {
        match tag {
            RXN_ARRHENIUS => Some(RxnKind::Arrhenius(Arrhenius)),
            RXN_CMAQ_H2O2 => Some(RxnKind::CmaqH2O2(CmaqH2O2)),
            _ => None,
        }
    }
}

/// rate-law parameters of one reaction, one variant per kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RxnParams {
    #[serde(rename = "ARRHENIUS")]
    Arrhenius(ArrheniusParams),
    #[serde(rename = "CMAQ_H2O2")]
    CmaqH2O2(CmaqH2O2Params),
}

impl RxnParams {
    pub fn kind(&self) -> RxnKind {
        match self {
            RxnParams::Arrhenius(_) => RxnKind::Arrhenius(Arrhenius),
            RxnParams::CmaqH2O2(_) => RxnKind::CmaqH2O2(CmaqH2O2),
        }
    }
    /// float properties in packed order, the rate constant slot zeroed
    pub fn to_props(&self) -> Vec<f64> {
        match self {
            RxnParams::Arrhenius(p) => p.to_props(),
            RxnParams::CmaqH2O2(p) => p.to_props(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for tag in [RXN_ARRHENIUS, RXN_CMAQ_H2O2] {
            let kind = RxnKind::from_tag(tag).unwrap();
            assert_eq!(kind.kind_tag(), tag);
        }
        assert_eq!(RxnKind::from_tag(0), None);
        assert_eq!(RxnKind::from_tag(42), None);
    }

    #[test]
    fn test_params_select_kind() {
        let params = RxnParams::CmaqH2O2(CmaqH2O2Params::new(1e-12, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0));
        assert_eq!(params.kind(), RxnKind::CmaqH2O2(CmaqH2O2));
        assert_eq!(params.to_props().len(), params.kind().n_float_prop());
        let params = RxnParams::Arrhenius(ArrheniusParams::new(2.0));
        assert_eq!(params.kind().kind_name(), "ARRHENIUS");
        assert_eq!(params.to_props().len(), params.kind().n_float_prop());
    }

    #[test]
    fn test_params_serde_tagged() {
        let json = r#"{"type":"CMAQ_H2O2","k1_A":1e-12,"k1_B":0.0,"k1_C":0.0,"k2_A":0.0,"k2_B":0.0,"k2_C":0.0,"conv":1.0}"#;
        let params: RxnParams = serde_json::from_str(json).unwrap();
        assert_eq!(
            params,
            RxnParams::CmaqH2O2(CmaqH2O2Params::new(1e-12, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0))
        );
        let back = serde_json::to_string(&params).unwrap();
        assert!(back.contains("\"type\":\"CMAQ_H2O2\""));
    }
}
