//! Synthetic constant-cp databases with closed-form reference solutions.

use ceq::propellant::{PropellantDB, Reactant};
use ceq::thermo::{formula, Phase, Species, TemperatureInterval, ThermoDB};
use ceq::{Case, RGAS};
use ndarray::Array1;
use std::sync::Arc;

/// A species with constant heat capacity: Cp°/R = cp_r over the whole
/// interval, so H°/RT = cp_r + b1/T and S°/R = cp_r ln T + b2. The
/// integration constants are fixed by the heat of formation (J/mol) and
/// the standard entropy S°(298.15)/R.
pub fn species(name: &str, phase: Phase, molweight: f64, cp_r: f64, hf: f64, s298_r: f64) -> Species {
    let b1 = hf / RGAS - cp_r * 298.15;
    let b2 = s298_r - cp_r * 298.15_f64.ln();
    Species {
        name: name.into(),
        id: String::new(),
        comments: String::new(),
        phase,
        formula: formula::parse(name).unwrap(),
        molweight,
        heat_of_formation: hf,
        intervals: vec![TemperatureInterval {
            range: [200.0, 10000.0],
            coefficients: [0.0, 0.0, cp_r, 0.0, 0.0, 0.0, 0.0],
            constants: [b1, b2],
        }],
        reference_temperature: None,
    }
}

pub fn reactant(name: &str, formula: Vec<(u8, f64)>, heat: f64) -> Reactant {
    Reactant {
        name: name.into(),
        formula,
        heat_of_formation: heat,
        density: 1.0,
    }
}

/// Monatomic argon, molecular nitrogen and its atom, and carbon in the
/// gas phase plus graphite.
pub fn thermo_db() -> Arc<ThermoDB> {
    Arc::new(ThermoDB::new(vec![
        species("AR", Phase::Gas, 39.948, 2.5, 0.0, 18.623),
        species("N2", Phase::Gas, 28.01348, 3.5, 0.0, 23.046),
        species("N", Phase::Gas, 14.00674, 2.5, 472_680.0, 18.44),
        species("C", Phase::Gas, 12.011, 2.5, 716_680.0, 19.016),
        species("C(gr)", Phase::Condensed, 12.011, 1.0, 0.0, 0.6904),
    ]))
}

pub fn argon_case(heat: f64, pressure: f64) -> Case {
    let thermo = thermo_db();
    let propellants = Arc::new(PropellantDB::new(vec![reactant(
        "ARGON",
        vec![(18, 1.0)],
        heat,
    )]));
    let composition = ceq::propellant::Composition::new(vec![(0, 1.0)]).unwrap();
    Case::new(&thermo, &propellants, composition).pressure(pressure)
}

pub fn nitrogen_case(heat: f64, pressure: f64) -> Case {
    let thermo = thermo_db();
    let propellants = Arc::new(PropellantDB::new(vec![reactant(
        "NITROGEN",
        vec![(7, 2.0)],
        heat,
    )]));
    let composition = ceq::propellant::Composition::new(vec![(0, 1.0)]).unwrap();
    Case::new(&thermo, &propellants, composition).pressure(pressure)
}

/// Converged-state invariants: element balance, total-moles identity and
/// the consistency of the retained logarithms.
pub fn assert_invariants(case: &Case) {
    let product = &case.product;
    let b0: Array1<f64> = case
        .composition
        .element_balance(&case.propellants, &product.elements);
    let b_max = b0.iter().cloned().fold(0.0_f64, f64::max);
    for (j, &b) in b0.iter().enumerate() {
        let mut current = 0.0;
        for k in 0..product.gas.len() {
            current += product.a[[j, k]] * product.n_gas[k];
        }
        for c in 0..product.n_condensed_active {
            current += product.a_condensed(&case.thermo, product.elements[j], c)
                * product.n_condensed[c];
        }
        assert!(
            (current - b).abs() <= 1e-6 * b_max,
            "element balance violated: {} vs {}",
            current,
            b
        );
    }

    let gas_sum = product.n_gas.sum();
    assert!(
        (case.iteration.n - gas_sum).abs() <= 1e-6 * gas_sum,
        "total moles {} vs gas sum {}",
        case.iteration.n,
        gas_sum
    );

    for k in 0..product.gas.len() {
        if product.n_gas[k] > 0.0 {
            assert!((product.ln_n_gas[k] - product.n_gas[k].ln()).abs() <= 1e-12);
        }
    }
}

/// Index of a species in the gaseous product list.
pub fn gas_index(case: &Case, name: &str) -> usize {
    case.product
        .gas
        .iter()
        .position(|&i| case.thermo.get(i).name == name)
        .unwrap()
}
