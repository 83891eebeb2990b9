//! The Gordon-McBride equilibrium solver.
//!
//! The outer iteration assembles the reduced correction system, solves
//! it, applies a damped update and tests for convergence. After a
//! converged pass the active condensed set is revised; any change
//! restarts the iteration with a fresh budget. A singular system is
//! recovered by removing condensed species or, once, by reseeding
//! previously vanished gaseous species.

use crate::errors::{CeqError, CeqResult, Stage};
use crate::state::{Case, Problem};
use crate::{SolverOptions, RGAS};
use ndarray::Array1;
use num_dual::linalg::LU;
use std::collections::HashMap;

mod condensed;
mod derivatives;
mod indexing;
mod matrix;

use matrix::GibbsMatrix;
pub(crate) use matrix::SpeciesTables;

const ITERATION_MAX: usize = 100;
const CONV_TOL: f64 = 5e-6;
/// ln of the concentration (relative to the total moles) below which a
/// gaseous species is treated as vanished: ln(1e-8).
const LOG_CONC_TOL: f64 = -18.420681;
/// ln(1e4): trace species may not grow past this fraction of the mixture
/// in a single step.
const TRACE_GROWTH_LOG: f64 = 9.2103404;
const DELTA_LN_T_TOL: f64 = 1e-4;
const INITIAL_TEMPERATURE: f64 = 3800.0;
/// Concentration assigned to vanished species on reinsertion.
const REINSERT_CONC: f64 = 1e-6;

/// Solve the equilibrium composition of a case for the given problem.
///
/// On success the case holds the converged mole numbers, the
/// thermodynamic properties and the equilibrium derivatives. On failure
/// the last iterate is preserved for diagnostics.
pub fn compute_equilibrium(
    case: &mut Case,
    problem: Problem,
    options: SolverOptions,
) -> CeqResult<()> {
    let (max_iter, tol, verbosity) = options.unwrap_or(ITERATION_MAX, CONV_TOL);

    if !case.product.elements_listed {
        indexing::list_elements(case)?;
    }
    if !case.product.species_listed {
        indexing::list_products(case)?;
    }
    indexing::assemble_stoichiometry(case);
    if !case.product.is_equilibrium {
        // condensed species are deferred to the first converged pass
        case.product.n_condensed_active = 0;
    }
    case.product.is_equilibrium = false;

    let b0 = case
        .composition
        .element_balance(&case.propellants, &case.product.elements);
    let h0 = case.composition.enthalpy(&case.propellants);
    let s0 = case.entropy_target / RGAS;

    match problem {
        Problem::TemperaturePressure => {
            if case.temperature <= 0.0 {
                return Err(CeqError::Error(
                    "assigned-temperature problem without a temperature".into(),
                ));
            }
        }
        _ => {
            if case.temperature <= 0.0 {
                case.temperature = INITIAL_TEMPERATURE;
            }
        }
    }
    let with_temperature = problem != Problem::TemperaturePressure;

    let mut evicted: HashMap<usize, u32> = HashMap::new();
    let mut reinserted = false;

    log_iter!(
        verbosity,
        " iter |   lambda   |  temperature  |   gas moles   |  condensed"
    );
    log_iter!(verbosity, "{:-<62}", "");

    let mut iterations = 0;
    'restart: loop {
        for _ in 1..=max_iter {
            iterations += 1;
            let tables = SpeciesTables::new(case);
            let assembler = GibbsMatrix::new(case, with_temperature);
            let (m, rhs) = assembler.equilibrium(case, &tables, problem, &b0, h0, s0);

            let solution = match LU::new(m) {
                Ok(lu) => lu.solve(&rhs),
                Err(_) => {
                    if condensed::remove_condensed(case, &mut evicted, verbosity) {
                        log_result!(verbosity, "singular system: condensed species removed");
                        continue 'restart;
                    }
                    if !reinserted {
                        log_result!(verbosity, "singular system: reinserting gaseous species");
                        reinsert_gas(case);
                        reinserted = true;
                        continue 'restart;
                    }
                    return Err(CeqError::Singular);
                }
            };

            let pi = gas_corrections(case, &tables, &assembler, &solution, with_temperature);
            let lambda = damping(case);
            update(case, lambda);

            if condensed::remove_diverging(case, &mut evicted, verbosity) {
                continue 'restart;
            }

            log_iter!(
                verbosity,
                " {:4} | {:10.4e} | {:13.6} | {:13.8} | {:6}",
                iterations,
                lambda,
                case.temperature,
                case.iteration.n,
                case.product.n_condensed_active,
            );

            if converged(case, tol) {
                let removed = condensed::remove_condensed(case, &mut evicted, verbosity);
                let included = condensed::include_condensed(case, &pi, &evicted, verbosity);
                if removed || included {
                    continue 'restart;
                }
                break 'restart;
            }
        }
        return Err(CeqError::NotConverged(Stage::Equilibrium));
    }

    log_result!(
        verbosity,
        "equilibrium converged in {} iteration(s)\n",
        iterations
    );

    // properties and derivatives of the converged state
    let tables = SpeciesTables::new(case);
    update_properties(case, &tables);
    let assembler = GibbsMatrix::new(case, false);
    derivatives::update_derivatives(case, &tables, &assembler)?;
    case.product.is_equilibrium = true;
    Ok(())
}

/// Back-substitute the reduced solution into the per-species corrections
/// and store the deltas; returns the Lagrange multipliers.
fn gas_corrections(
    case: &mut Case,
    tables: &SpeciesTables,
    assembler: &GibbsMatrix,
    solution: &Array1<f64>,
    with_temperature: bool,
) -> Array1<f64> {
    let (e, nc, iq) = (assembler.e, assembler.nc, assembler.iq);
    let pi: Array1<f64> = solution.slice(ndarray::s![0..e]).to_owned();
    let delta_ln_n = solution[iq];
    let delta_ln_t = if with_temperature { solution[iq + 1] } else { 0.0 };

    let product = &case.product;
    let iteration = &mut case.iteration;
    iteration.delta_ln_n = delta_ln_n;
    iteration.delta_ln_t = delta_ln_t;
    for c in 0..nc {
        iteration.delta_n_condensed[c] = solution[e + c];
    }
    for k in 0..product.gas.len() {
        let pi_sum: f64 = (0..e).map(|i| pi[i] * product.a[[i, k]]).sum();
        iteration.delta_ln_nj[k] =
            -tables.mu[k] + pi_sum + delta_ln_n + tables.h[k] * delta_ln_t;
    }
    pi
}

/// The empirical under-relaxation of RP-1311: large corrections and
/// growing trace species bound the step size.
fn damping(case: &Case) -> f64 {
    let iteration = &case.iteration;
    let product = &case.product;

    let mut lambda1 = iteration.delta_ln_t.abs().max(iteration.delta_ln_n.abs());
    let mut lambda2 = f64::INFINITY;
    for k in 0..product.gas.len() {
        let delta = iteration.delta_ln_nj[k];
        if delta <= 0.0 {
            continue;
        }
        if product.ln_n_gas[k] - iteration.ln_n <= LOG_CONC_TOL {
            let denominator = delta - iteration.delta_ln_n;
            if denominator != 0.0 {
                let bound = ((-product.ln_n_gas[k] + iteration.ln_n - TRACE_GROWTH_LOG)
                    / denominator)
                    .abs();
                lambda2 = lambda2.min(bound);
            }
        } else {
            lambda1 = lambda1.max(delta);
        }
    }
    let lambda1 = 2.0 / (5.0 * lambda1);
    let lambda2 = lambda2.min(1.0);
    1.0_f64.min(lambda1).min(lambda2)
}

/// Apply the damped update to the mole numbers, the temperature and the
/// total-moles iterate.
fn update(case: &mut Case, lambda: f64) {
    let iteration = &mut case.iteration;
    let product = &mut case.product;

    for k in 0..product.gas.len() {
        product.ln_n_gas[k] += lambda * iteration.delta_ln_nj[k];
        if product.ln_n_gas[k] - iteration.ln_n <= LOG_CONC_TOL {
            product.n_gas[k] = 0.0;
        } else {
            product.n_gas[k] = product.ln_n_gas[k].exp();
        }
    }
    for c in 0..product.n_condensed_active {
        product.n_condensed[c] += lambda * iteration.delta_n_condensed[c];
    }
    case.temperature *= (lambda * iteration.delta_ln_t).exp();
    iteration.ln_n += lambda * iteration.delta_ln_n;
    iteration.n = iteration.ln_n.exp();
    iteration.sumn = product.n_gas.sum()
        + product
            .n_condensed
            .iter()
            .take(product.n_condensed_active)
            .sum::<f64>();
}

fn converged(case: &Case, tol: f64) -> bool {
    let iteration = &case.iteration;
    let product = &case.product;
    let sumn = iteration.sumn;

    for k in 0..product.gas.len() {
        if product.n_gas[k] * iteration.delta_ln_nj[k].abs() / sumn > tol {
            return false;
        }
    }
    for c in 0..product.n_condensed_active {
        if iteration.delta_n_condensed[c].abs() / sumn > tol {
            return false;
        }
    }
    if iteration.n * iteration.delta_ln_n.abs() / sumn > tol {
        return false;
    }
    iteration.delta_ln_t.abs() <= DELTA_LN_T_TOL
}

/// Reseed all vanished gaseous species so the matrix regains full rank.
fn reinsert_gas(case: &mut Case) {
    let product = &mut case.product;
    for k in 0..product.gas.len() {
        if product.n_gas[k] == 0.0 {
            product.n_gas[k] = REINSERT_CONC;
            product.ln_n_gas[k] = REINSERT_CONC.ln();
        }
    }
}

/// Mixture enthalpy in kJ/kg at the case temperature.
pub(crate) fn mixture_enthalpy(case: &Case, tables: &SpeciesTables) -> f64 {
    let product = &case.product;
    let h_sum = product.n_gas.dot(&tables.h)
        + (0..product.n_condensed_active)
            .map(|c| product.n_condensed[c] * tables.h_condensed[c])
            .sum::<f64>();
    RGAS * case.temperature * h_sum
}

/// Mixture entropy in kJ/(kg K) at the case temperature and pressure.
pub(crate) fn mixture_entropy(case: &Case, tables: &SpeciesTables) -> f64 {
    let product = &case.product;
    let s_sum = product.n_gas.dot(&tables.s)
        + (0..product.n_condensed_active)
            .map(|c| product.n_condensed[c] * tables.s_condensed[c])
            .sum::<f64>();
    RGAS * s_sum
}

/// Heat capacity of the mixture at fixed composition in kJ/(kg K).
pub(crate) fn frozen_cp(case: &Case, tables: &SpeciesTables) -> f64 {
    let product = &case.product;
    let cp_sum = product.n_gas.dot(&tables.cp)
        + (0..product.n_condensed_active)
            .map(|c| product.n_condensed[c] * tables.cp_condensed[c])
            .sum::<f64>();
    RGAS * cp_sum
}

/// Mixture properties of the converged state: H, U, G, S and the molar
/// mass of the gaseous products.
fn update_properties(case: &mut Case, tables: &SpeciesTables) {
    let t = case.temperature;
    let n = case.iteration.n;
    let enthalpy = mixture_enthalpy(case, tables);
    let entropy = mixture_entropy(case, tables);

    let properties = &mut case.properties;
    properties.pressure = case.pressure;
    properties.temperature = t;
    properties.enthalpy = enthalpy;
    properties.entropy = entropy;
    properties.internal_energy = enthalpy - n * RGAS * t;
    properties.gibbs_energy = enthalpy - t * entropy;
    properties.molar_mass = 1.0 / n;
}
