use crate::Kinetics::env_state::EnvState;
use crate::Kinetics::rxn_CMAQ_H2O2::CmaqH2O2Params;
use crate::Kinetics::rxn_arrhenius::ArrheniusParams;
use crate::Kinetics::rxn_buffer::{RxnBuffer, RxnDescription};
use crate::Kinetics::rxn_errors::RxnError;
use crate::Kinetics::rxn_solver::RxnParams;
use crate::Kinetics::solver_map::SolverIndexMap;
use crate::settings::KineticsSettings;
use log::{error, info};
use nalgebra::DMatrix;

pub fn rxn_examples(task: usize, settings: &KineticsSettings) {
    let result = match task {
        0 => first_order_decay(),
        1 => ho2_self_reaction(settings),
        _ => {
            error!("no example number {}", task);
            Ok(())
        }
    };
    if let Err(e) = result {
        error!("example {} failed: {}", task, e);
    }
}

/// A -> B with a constant rate constant of 1e-12
fn first_order_decay() -> Result<(), RxnError> {
    let mut buf = RxnBuffer::new(2);
    let params = CmaqH2O2Params::new(1e-12, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0);
    buf.add_reaction(&RxnDescription::new(vec![0], vec![1], RxnParams::CmaqH2O2(params)))?;

    let mut jac_struct = DMatrix::from_element(2, 2, false);
    buf.declare_jacobian_sparsity(&mut jac_struct)?;
    let map = SolverIndexMap::all_tracked(&jac_struct)?;
    buf.bind_indices(&map)?;
    buf.refresh_rate_constants(&EnvState::new(298.0, 101325.0))?;

    let state = [1e10, 0.0];
    let mut deriv = vec![0.0; map.n_deriv()];
    let mut jac = vec![0.0; map.n_jac_elem()];
    buf.contribute(&state, &mut deriv, Some(&mut jac))?;
    println!("k = {:?}", buf.rate_constants()?);
    println!("dy/dt = {:?}", deriv);
    println!("J = {}", map.to_dense(&jac));
    Ok(())
}

/// HO2 + HO2 -> H2O2 + O2 (CMAQ_H2O2) and H2O2 -> 2 OH (Arrhenius)
///
/// species: 0 HO2, 1 H2O2, 2 OH, 3 O2
fn ho2_self_reaction(settings: &KineticsSettings) -> Result<(), RxnError> {
    let n_species = 4;
    let mut buf = RxnBuffer::new(n_species);
    // molecules/cm3 from P [Pa] and T [K]: 7.243e16 * P / T
    let ho2_ho2 = CmaqH2O2Params::new(2.3e-13, 0.0, 600.0, 1.7e-33, 0.0, 1000.0, 7.243e16 / 1e6);
    buf.add_reaction(&RxnDescription::new(
        vec![0, 0],
        vec![1, 3],
        RxnParams::CmaqH2O2(ho2_ho2),
    ))?;
    buf.add_reaction(
        &RxnDescription::new(
            vec![1],
            vec![2],
            RxnParams::Arrhenius(ArrheniusParams::new(1e-5)),
        )
        .with_yields(vec![2.0]),
    )?;

    let mut jac_struct = DMatrix::from_element(n_species, n_species, false);
    buf.declare_jacobian_sparsity(&mut jac_struct)?;
    let map = SolverIndexMap::from_settings(settings, &jac_struct)?;
    buf.bind_indices(&map)?;
    buf.refresh_rate_constants(&settings.env)?;
    info!(
        "rate constants at T = {} K: {:?}",
        settings.env.temperature,
        buf.rate_constants()?
    );

    let state = [1e8, 1e10, 1e6, 5e18];
    let mut deriv = vec![0.0; map.n_deriv()];
    let mut jac = vec![0.0; map.n_jac_elem()];
    buf.contribute(&state, &mut deriv, Some(&mut jac))?;
    println!("dy/dt = {:?}", deriv);
    println!("J = {}", map.to_dense(&jac));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_examples_run() {
        assert!(first_order_decay().is_ok());
        assert!(ho2_self_reaction(&KineticsSettings::default()).is_ok());
        let settings = KineticsSettings {
            tracked_species: Some(vec![0, 1, 2]),
            ..Default::default()
        };
        assert!(ho2_self_reaction(&settings).is_ok());
    }
}
