//! CMAQ_H2O2 reaction kind: two-term modified Arrhenius rate law with a third-body-like
//! pressure term, as used for the H2O2 channels of the CMAQ mechanisms
//!
//! ```text
//! conv  = CONV * P / T
//! k     = ( k1_A * exp(k1_C/T) * (T/300)^k1_B
//!         + k2_A * exp(k2_C/T) * (T/300)^k2_B * conv ) * conv^(n_react - 1)
//! ```
//! an exponential or power factor whose coefficient is exactly zero is taken as 1.0
#![allow(non_snake_case, non_upper_case_globals)]
use crate::Kinetics::env_state::EnvState;
use crate::Kinetics::rxn_solver::{RXN_CMAQ_H2O2, RxnSolver};
use serde::{Deserialize, Serialize};

pub const k1_A_: usize = 0;
pub const k1_B_: usize = 1;
pub const k1_C_: usize = 2;
pub const k2_A_: usize = 3;
pub const k2_B_: usize = 4;
pub const k2_C_: usize = 5;
pub const CONV_: usize = 6;
pub const RATE_CONSTANT_: usize = 7;
pub const NUM_FLOAT_PROP_: usize = 8;

/// reference temperature of the power terms, K
const T_REF: f64 = 300.0;

/// marker of CMAQ_H2O2 records in a reaction buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CmaqH2O2;

/// rate-law parameters of a CMAQ_H2O2 reaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CmaqH2O2Params {
    pub k1_A: f64,
    pub k1_B: f64,
    pub k1_C: f64,
    /// [M] is folded in through `conv`, not into k2_A
    pub k2_A: f64,
    pub k2_B: f64,
    pub k2_C: f64,
    /// unit conversion constant; conv = CONV * P / T
    pub conv: f64,
}

impl CmaqH2O2Params {
    pub fn new(k1_A: f64, k1_B: f64, k1_C: f64, k2_A: f64, k2_B: f64, k2_C: f64, conv: f64) -> Self {
        Self {
            k1_A,
            k1_B,
            k1_C,
            k2_A,
            k2_B,
            k2_C,
            conv,
        }
    }

    pub fn from_props(props: &[f64]) -> Self {
        Self {
            k1_A: props[k1_A_],
            k1_B: props[k1_B_],
            k1_C: props[k1_C_],
            k2_A: props[k2_A_],
            k2_B: props[k2_B_],
            k2_C: props[k2_C_],
            conv: props[CONV_],
        }
    }

    pub fn to_props(&self) -> Vec<f64> {
        let mut props = vec![0.0; NUM_FLOAT_PROP_];
        props[k1_A_] = self.k1_A;
        props[k1_B_] = self.k1_B;
        props[k1_C_] = self.k1_C;
        props[k2_A_] = self.k2_A;
        props[k2_B_] = self.k2_B;
        props[k2_C_] = self.k2_C;
        props[CONV_] = self.conv;
        props
    }

    /// rate constant for a reaction with `n_react` reactants.
    /// ATTENTION! temperature must be absolute, in Kelvin
    pub fn K_const(&self, n_react: usize, env: &EnvState) -> f64 {
        let Temp = env.temperature;
        let conv = self.conv * env.pressure / Temp;
        let k1 = self.k1_A * arrhenius_exp(self.k1_C, Temp) * temp_power(self.k1_B, Temp);
        let k2 = self.k2_A * arrhenius_exp(self.k2_C, Temp) * temp_power(self.k2_B, Temp) * conv;
        (k1 + k2) * conv.powi(n_react as i32 - 1)
    }
}

fn arrhenius_exp(C: f64, Temp: f64) -> f64 {
    if C == 0.0 { 1.0 } else { f64::exp(C / Temp) }
}

fn temp_power(B: f64, Temp: f64) -> f64 {
    if B == 0.0 { 1.0 } else { (Temp / T_REF).powf(B) }
}

impl RxnSolver for CmaqH2O2 {
    fn kind_tag(&self) -> usize {
        RXN_CMAQ_H2O2
    }
    fn kind_name(&self) -> &'static str {
        "CMAQ_H2O2"
    }
    fn n_float_prop(&self) -> usize {
        NUM_FLOAT_PROP_
    }
    fn validate_props(&self, props: &[f64]) -> Result<(), String> {
        if props.len() != NUM_FLOAT_PROP_ {
            return Err(format!(
                "CMAQ_H2O2 expects {} float properties, got {}",
                NUM_FLOAT_PROP_,
                props.len()
            ));
        }
        Ok(())
    }
    fn calc_rate_constant(&self, props: &[f64], n_react: usize, env: &EnvState) -> f64 {
        CmaqH2O2Params::from_props(props).K_const(n_react, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_term_is_temperature_independent() {
        // k2_A = 0 switches the second term off whatever its exponents are
        let params = CmaqH2O2Params::new(1e-12, 0.0, 0.0, 0.0, 2.5, -700.0, 1.0);
        for Temp in [200.0, 298.0, 350.0] {
            let env = EnvState::new(Temp, 101325.0);
            assert_relative_eq!(params.K_const(1, &env), 1e-12);
        }
        // two reactants pick up one factor of conv
        let env = EnvState::new(250.0, 101325.0);
        let conv = 101325.0 / 250.0;
        assert_relative_eq!(params.K_const(2, &env), 1e-12 * conv, max_relative = 1e-12);
    }

    #[test]
    fn test_two_term_rate_constant() {
        let params = CmaqH2O2Params::new(2.9e-13, 0.0, 460.0, 3.1e-33, 0.0, 920.0, 7.24e-3);
        let env = EnvState::new(270.0, 90000.0);
        let Temp = 270.0;
        let conv = 7.24e-3 * 90000.0 / Temp;
        let k1 = 2.9e-13 * f64::exp(460.0 / Temp);
        let k2 = 3.1e-33 * f64::exp(920.0 / Temp) * conv;
        assert_relative_eq!(params.K_const(2, &env), (k1 + k2) * conv, max_relative = 1e-12);
    }

    #[test]
    fn test_power_terms() {
        let params = CmaqH2O2Params::new(1.0, -2.0, 0.0, 0.5, 1.5, 0.0, 1e-3);
        let env = EnvState::new(320.0, 50000.0);
        let conv = 1e-3 * 50000.0 / 320.0;
        let expected = 1.0 * (320.0_f64 / 300.0).powf(-2.0) + 0.5 * (320.0_f64 / 300.0).powf(1.5) * conv;
        assert_relative_eq!(params.K_const(1, &env), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_props_round_trip_through_packed_order() {
        let params = CmaqH2O2Params::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0);
        let props = params.to_props();
        assert_eq!(props.len(), NUM_FLOAT_PROP_);
        assert_eq!(props[RATE_CONSTANT_], 0.0);
        assert_eq!(CmaqH2O2Params::from_props(&props), params);
        assert!(CmaqH2O2.validate_props(&props).is_ok());
        assert!(CmaqH2O2.validate_props(&props[..7]).is_err());
    }
}
