/// environmental state (temperature, pressure) the rate constants depend on
pub mod env_state;
/// error type of the reaction kinetics core
pub mod rxn_errors;
/// layout of one packed reaction record: header, cursor and typed views over the three regions
pub mod rxn_record;
/// the protocol every reaction kind implements and the enum that dispatches over the kinds
pub mod rxn_solver;
/// CMAQ_H2O2 rate law: two modified Arrhenius terms, the second one pressure dependent
#[allow(non_snake_case)]
pub mod rxn_CMAQ_H2O2;
/// plain Arrhenius rate law with an optional pressure factor
pub mod rxn_arrhenius;
/// packed reaction buffer: construction, sparsity declaration, index binding, rate constant
/// refresh and derivative/Jacobian contribution
/// ```text
/// RxnBuffer::new / from_raw_parts -> add_reaction ... -> declare_jacobian_sparsity
///   -> bind_indices(SolverIndexMap) -> refresh_rate_constants(EnvState)
///   -> calc_deriv / calc_jac / contribute   (every solver step)
/// ```
pub mod rxn_buffer;
/// derivative and sparse Jacobian offsets handed out by the solver
pub mod solver_map;
