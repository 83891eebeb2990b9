//! Thermodynamic derivatives of the converged equilibrium.
//!
//! Two further linear solves on the common matrix block give the
//! logarithmic volume derivatives; the equilibrium heat capacities and
//! the sound speed follow from them.

use super::matrix::{GibbsMatrix, SpeciesTables};
use crate::errors::CeqResult;
use crate::state::Case;
use crate::RGAS;
use num_dual::linalg::LU;

pub(crate) fn update_derivatives(
    case: &mut Case,
    tables: &SpeciesTables,
    matrix: &GibbsMatrix,
) -> CeqResult<()> {
    let (e, nc, iq) = (matrix.e, matrix.nc, matrix.iq);
    let n_gas = case.product.n_gas.clone();
    let a = case.product.a.clone();

    // temperature derivatives at constant pressure
    let (m, rhs) = matrix.temperature_derivative(case, tables);
    let x = LU::new(m)?.solve(&rhs);
    let dv_t = 1.0 + x[iq];

    let cp_frozen = n_gas.dot(&tables.cp)
        + (0..nc)
            .map(|c| case.product.n_condensed[c] * tables.cp_condensed[c])
            .sum::<f64>();
    let mut cp_r = cp_frozen
        + n_gas
            .iter()
            .zip(tables.h.iter())
            .map(|(&n, &h)| n * h * h)
            .sum::<f64>();
    for i in 0..e {
        let sum: f64 = (0..n_gas.len())
            .map(|k| a[[i, k]] * n_gas[k] * tables.h[k])
            .sum();
        cp_r += sum * x[i];
    }
    for c in 0..nc {
        cp_r += tables.h_condensed[c] * x[e + c];
    }
    cp_r += n_gas.dot(&tables.h) * x[iq];

    // pressure derivatives at constant temperature
    let (m, rhs) = matrix.pressure_derivative(case, tables);
    let y = LU::new(m)?.solve(&rhs);
    let dv_p = y[iq] - 1.0;

    let n = case.iteration.n;
    let t = case.temperature;
    let cp = cp_r * RGAS;
    let cv = cp + n * RGAS * dv_t * dv_t / dv_p;
    let gamma = -(cp / cv) / dv_p;

    let properties = &mut case.properties;
    properties.dv_t = dv_t;
    properties.dv_p = dv_p;
    properties.cp = cp;
    properties.cv = cv;
    properties.isentropic_exponent = gamma;
    properties.sound_speed = (1000.0 * n * RGAS * t * gamma).sqrt();
    Ok(())
}
