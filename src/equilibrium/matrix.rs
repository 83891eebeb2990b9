//! Assembly of the reduced Gordon-McBride iteration matrix.
//!
//! Unknowns are ordered pi_j (one Lagrange multiplier per element), then
//! delta n for every active condensed species, then delta ln n, then (for
//! assigned enthalpy or entropy) delta ln T. The common block of the
//! matrix is identical across the equilibrium problems and both
//! derivative systems; it is built once per iteration and only the
//! problem-specific row, column and right-hand side are rewritten.

use crate::state::{Case, Problem};
use crate::{ATM_TO_BAR, RGAS};
use ndarray::{Array1, Array2};

/// Dimensionless species properties evaluated at the current iterate.
pub(crate) struct SpeciesTables {
    /// H°/RT of each gaseous candidate.
    pub h: Array1<f64>,
    /// Cp°/R of each gaseous candidate.
    pub cp: Array1<f64>,
    /// mu/RT of each gaseous candidate, including the mixing and pressure
    /// terms. Species at zero concentration use their retained ln nj.
    pub mu: Array1<f64>,
    /// Partial molar entropy s/R of each gaseous candidate.
    pub s: Array1<f64>,
    /// H°/RT of each active condensed species.
    pub h_condensed: Array1<f64>,
    /// Cp°/R of each active condensed species.
    pub cp_condensed: Array1<f64>,
    /// G°/RT of each active condensed species; equals mu/RT.
    pub g_condensed: Array1<f64>,
    /// S°/R of each active condensed species.
    pub s_condensed: Array1<f64>,
}

impl SpeciesTables {
    pub fn new(case: &Case) -> Self {
        let t = case.temperature;
        let ln_p = (case.pressure * ATM_TO_BAR).ln();
        let ln_n = case.iteration.ln_n;
        let product = &case.product;

        let ng = product.gas.len();
        let mut h = Array1::zeros(ng);
        let mut cp = Array1::zeros(ng);
        let mut mu = Array1::zeros(ng);
        let mut s = Array1::zeros(ng);
        for k in 0..ng {
            let sp = case.thermo.get(product.gas[k]);
            let h0 = sp.enthalpy0(t);
            let s0 = sp.entropy0(t);
            h[k] = h0;
            cp[k] = sp.cp0(t);
            mu[k] = h0 - s0 + product.ln_n_gas[k] - ln_n + ln_p;
            s[k] = s0 - product.ln_n_gas[k] + ln_n - ln_p;
        }

        let nc = product.n_condensed_active;
        let mut h_condensed = Array1::zeros(nc);
        let mut cp_condensed = Array1::zeros(nc);
        let mut g_condensed = Array1::zeros(nc);
        let mut s_condensed = Array1::zeros(nc);
        for c in 0..nc {
            let sp = case.thermo.get(product.condensed[c]);
            h_condensed[c] = sp.enthalpy0(t);
            cp_condensed[c] = sp.cp0(t);
            s_condensed[c] = sp.entropy0(t);
            g_condensed[c] = h_condensed[c] - s_condensed[c];
        }

        Self {
            h,
            cp,
            mu,
            s,
            h_condensed,
            cp_condensed,
            g_condensed,
            s_condensed,
        }
    }
}

/// The reduced iteration matrix with its common block filled in.
pub(crate) struct GibbsMatrix {
    /// Number of elements.
    pub e: usize,
    /// Number of active condensed species.
    pub nc: usize,
    /// Index of the delta ln n unknown.
    pub iq: usize,
    pub size: usize,
    common: Array2<f64>,
}

impl GibbsMatrix {
    pub fn new(case: &Case, with_temperature: bool) -> Self {
        let product = &case.product;
        let e = product.elements.len();
        let nc = product.n_condensed_active;
        let iq = e + nc;
        let size = iq + 1 + usize::from(with_temperature);

        let n_gas = &product.n_gas;
        let a = &product.a;
        let mut m = Array2::zeros((size, size));
        for i in 0..e {
            for i2 in i..e {
                let sum = (0..n_gas.len())
                    .map(|k| a[[i, k]] * a[[i2, k]] * n_gas[k])
                    .sum();
                m[[i, i2]] = sum;
                m[[i2, i]] = sum;
            }
            for c in 0..nc {
                let coef = product.a_condensed(&case.thermo, product.elements[i], c);
                m[[i, e + c]] = coef;
                m[[e + c, i]] = coef;
            }
            let sum = (0..n_gas.len()).map(|k| a[[i, k]] * n_gas[k]).sum();
            m[[i, iq]] = sum;
            m[[iq, i]] = sum;
        }
        m[[iq, iq]] = n_gas.sum() - case.iteration.n;

        Self {
            e,
            nc,
            iq,
            size,
            common: m,
        }
    }

    /// The equilibrium system for the given problem: the residuals of the
    /// element balances, the condensed-phase equilibria, the total-moles
    /// identity and, for assigned enthalpy or entropy, the energy
    /// constraint.
    pub fn equilibrium(
        &self,
        case: &Case,
        tables: &SpeciesTables,
        problem: Problem,
        b0: &Array1<f64>,
        h0: f64,
        s0: f64,
    ) -> (Array2<f64>, Array1<f64>) {
        let product = &case.product;
        let n_gas = &product.n_gas;
        let a = &product.a;
        let (e, nc, iq) = (self.e, self.nc, self.iq);

        let mut m = self.common.clone();
        let mut rhs = Array1::zeros(self.size);

        for i in 0..e {
            let b_current: f64 = (0..n_gas.len()).map(|k| a[[i, k]] * n_gas[k]).sum::<f64>()
                + (0..nc)
                    .map(|c| {
                        product.a_condensed(&case.thermo, product.elements[i], c)
                            * product.n_condensed[c]
                    })
                    .sum::<f64>();
            let mu_sum: f64 = (0..n_gas.len())
                .map(|k| a[[i, k]] * n_gas[k] * tables.mu[k])
                .sum();
            rhs[i] = b0[i] - b_current + mu_sum;
        }
        for c in 0..nc {
            rhs[e + c] = tables.g_condensed[c];
        }
        rhs[iq] = case.iteration.n - n_gas.sum() + n_gas.dot(&tables.mu);

        if problem != Problem::TemperaturePressure {
            let it = iq + 1;
            // the delta ln T column is shared by both energy constraints
            for i in 0..e {
                let sum = (0..n_gas.len())
                    .map(|k| a[[i, k]] * n_gas[k] * tables.h[k])
                    .sum();
                m[[i, it]] = sum;
            }
            for c in 0..nc {
                m[[e + c, it]] = tables.h_condensed[c];
            }
            m[[iq, it]] = n_gas.dot(&tables.h);

            let cp_sum = n_gas.dot(&tables.cp)
                + (0..nc)
                    .map(|c| product.n_condensed[c] * tables.cp_condensed[c])
                    .sum::<f64>();
            let h_sum = n_gas.dot(&tables.h)
                + (0..nc)
                    .map(|c| product.n_condensed[c] * tables.h_condensed[c])
                    .sum::<f64>();

            match problem {
                Problem::EnthalpyPressure => {
                    for i in 0..e {
                        m[[it, i]] = m[[i, it]];
                    }
                    for c in 0..nc {
                        m[[it, e + c]] = tables.h_condensed[c];
                    }
                    m[[it, iq]] = m[[iq, it]];
                    m[[it, it]] = cp_sum
                        + n_gas
                            .iter()
                            .zip(tables.h.iter())
                            .map(|(&n, &h)| n * h * h)
                            .sum::<f64>();
                    let h0_rt = h0 / (RGAS * case.temperature);
                    rhs[it] = h0_rt - h_sum
                        + n_gas
                            .iter()
                            .zip(tables.h.iter())
                            .zip(tables.mu.iter())
                            .map(|((&n, &h), &mu)| n * h * mu)
                            .sum::<f64>();
                }
                Problem::EntropyPressure => {
                    // w_k weights the entropy constraint by the partial
                    // molar entropies, shifted by the d(ln nj) term
                    let w: Array1<f64> = n_gas
                        .iter()
                        .zip(tables.s.iter())
                        .map(|(&n, &s)| n * (s - 1.0))
                        .collect();
                    for i in 0..e {
                        m[[it, i]] = (0..n_gas.len()).map(|k| a[[i, k]] * w[k]).sum();
                    }
                    for c in 0..nc {
                        m[[it, e + c]] = tables.s_condensed[c];
                    }
                    m[[it, iq]] = w.sum() + n_gas.sum();
                    m[[it, it]] = w.dot(&tables.h) + cp_sum;
                    let s_current = n_gas.dot(&tables.s)
                        + (0..nc)
                            .map(|c| product.n_condensed[c] * tables.s_condensed[c])
                            .sum::<f64>();
                    rhs[it] = s0 - s_current + w.dot(&tables.mu);
                }
                Problem::TemperaturePressure => unreachable!(),
            }
        }
        (m, rhs)
    }

    /// The temperature-derivative system: same common block, right-hand
    /// side built from species enthalpies.
    pub fn temperature_derivative(
        &self,
        case: &Case,
        tables: &SpeciesTables,
    ) -> (Array2<f64>, Array1<f64>) {
        let product = &case.product;
        let n_gas = &product.n_gas;
        let a = &product.a;
        let mut rhs = Array1::zeros(self.size);
        for i in 0..self.e {
            rhs[i] = -(0..n_gas.len())
                .map(|k| a[[i, k]] * n_gas[k] * tables.h[k])
                .sum::<f64>();
        }
        for c in 0..self.nc {
            rhs[self.e + c] = -tables.h_condensed[c];
        }
        rhs[self.iq] = -n_gas.dot(&tables.h);
        (self.common.clone(), rhs)
    }

    /// The pressure-derivative system: same common block, right-hand side
    /// built from stoichiometric sums.
    pub fn pressure_derivative(
        &self,
        case: &Case,
        _tables: &SpeciesTables,
    ) -> (Array2<f64>, Array1<f64>) {
        let product = &case.product;
        let n_gas = &product.n_gas;
        let a = &product.a;
        let mut rhs = Array1::zeros(self.size);
        for i in 0..self.e {
            rhs[i] = (0..n_gas.len())
                .map(|k| a[[i, k]] * n_gas[k])
                .sum::<f64>();
        }
        rhs[self.iq] = n_gas.sum();
        (self.common.clone(), rhs)
    }
}
