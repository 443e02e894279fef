use serde::{Deserialize, Serialize};

/// Environmental conditions the rate constants depend on.
/// ATTENTION! temperature is absolute, in Kelvin; pressure is in Pa
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvState {
    pub temperature: f64,
    pub pressure: f64,
}

impl EnvState {
    pub fn new(temperature: f64, pressure: f64) -> Self {
        Self {
            temperature,
            pressure,
        }
    }
}

impl Default for EnvState {
    /// 298.15 K and one standard atmosphere
    fn default() -> Self {
        Self {
            temperature: 298.15,
            pressure: 101325.0,
        }
    }
}
