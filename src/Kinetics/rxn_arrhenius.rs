//! Arrhenius reaction kind
//!
//! ```text
//! conv = CONV * P / T
//! k    = A * exp(C/T) * (T/D)^B * (1 + E*P) * conv^(n_react - 1)
//! ```
//! exp and power factors with a zero coefficient are taken as 1.0
#![allow(non_snake_case, non_upper_case_globals)]
use crate::Kinetics::env_state::EnvState;
use crate::Kinetics::rxn_solver::{RXN_ARRHENIUS, RxnSolver};
use serde::{Deserialize, Serialize};

pub const A_: usize = 0;
pub const B_: usize = 1;
pub const C_: usize = 2;
pub const D_: usize = 3;
pub const E_: usize = 4;
pub const CONV_: usize = 5;
pub const RATE_CONSTANT_: usize = 6;
pub const NUM_FLOAT_PROP_: usize = 7;

/// marker of Arrhenius records in a reaction buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Arrhenius;

fn default_D() -> f64 {
    300.0
}
fn default_conv() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrheniusParams {
    pub A: f64,
    #[serde(default)]
    pub B: f64,
    #[serde(default)]
    pub C: f64,
    #[serde(default = "default_D")]
    pub D: f64,
    /// pressure scaling, 1/Pa
    #[serde(default)]
    pub E: f64,
    #[serde(default = "default_conv")]
    pub conv: f64,
}

impl ArrheniusParams {
    /// temperature- and pressure-independent rate constant A
    pub fn new(A: f64) -> Self {
        Self {
            A,
            B: 0.0,
            C: 0.0,
            D: default_D(),
            E: 0.0,
            conv: default_conv(),
        }
    }

    pub fn from_props(props: &[f64]) -> Self {
        Self {
            A: props[A_],
            B: props[B_],
            C: props[C_],
            D: props[D_],
            E: props[E_],
            conv: props[CONV_],
        }
    }

    pub fn to_props(&self) -> Vec<f64> {
        let mut props = vec![0.0; NUM_FLOAT_PROP_];
        props[A_] = self.A;
        props[B_] = self.B;
        props[C_] = self.C;
        props[D_] = self.D;
        props[E_] = self.E;
        props[CONV_] = self.conv;
        props
    }

    /// ATTENTION! temperature must be absolute, in Kelvin
    pub fn K_const(&self, n_react: usize, env: &EnvState) -> f64 {
        let Temp = env.temperature;
        let P = env.pressure;
        let conv = self.conv * P / Temp;
        let exp_term = if self.C == 0.0 { 1.0 } else { f64::exp(self.C / Temp) };
        let pow_term = if self.B == 0.0 { 1.0 } else { (Temp / self.D).powf(self.B) };
        self.A * exp_term * pow_term * (1.0 + self.E * P) * conv.powi(n_react as i32 - 1)
    }
}

impl RxnSolver for Arrhenius {
    fn kind_tag(&self) -> usize {
        RXN_ARRHENIUS
    }
    fn kind_name(&self) -> &'static str {
        "ARRHENIUS"
    }
    fn n_float_prop(&self) -> usize {
        NUM_FLOAT_PROP_
    }
    fn validate_props(&self, props: &[f64]) -> Result<(), String> {
        if props.len() != NUM_FLOAT_PROP_ {
            return Err(format!(
                "ARRHENIUS expects {} float properties, got {}",
                NUM_FLOAT_PROP_,
                props.len()
            ));
        }
        if props[B_] != 0.0 && props[D_] == 0.0 {
            return Err("ARRHENIUS reference temperature D must be non-zero when B != 0".to_string());
        }
        Ok(())
    }
    fn calc_rate_constant(&self, props: &[f64], n_react: usize, env: &EnvState) -> f64 {
        ArrheniusParams::from_props(props).K_const(n_react, env)
    }
}
