//! Element and product-species indexing.

use crate::errors::{CeqError, CeqResult};
use crate::state::{Case, MAX_ELEMENTS, MAX_PRODUCTS};
use crate::thermo::Phase;
use indexmap::IndexSet;
use ndarray::{Array1, Array2};

/// Scan the propellant components and collect the distinct elements, in
/// order of first appearance.
pub(crate) fn list_elements(case: &mut Case) -> CeqResult<()> {
    let mut elements = IndexSet::new();
    for &(r, _) in case.composition.components() {
        for &(z, coef) in &case.propellants.get(r).formula {
            if coef != 0.0 {
                elements.insert(z);
            }
        }
    }
    if elements.len() > MAX_ELEMENTS {
        return Err(CeqError::CapacityExceeded("elements", MAX_ELEMENTS));
    }
    case.product.elements = elements.into_iter().collect();
    case.product.elements_listed = true;
    Ok(())
}

/// Scan the thermo database for candidate product species: every element
/// of the species formula must appear in the propellant. Partition by
/// phase and initialize the mole-number estimates.
pub(crate) fn list_products(case: &mut Case) -> CeqResult<()> {
    let thermo = case.thermo.clone();
    let product = &mut case.product;
    product.gas.clear();
    product.condensed.clear();
    for (i, sp) in thermo.species().iter().enumerate() {
        if sp.formula.is_empty() || sp.intervals.is_empty() {
            continue;
        }
        if !sp
            .formula
            .iter()
            .all(|(z, _)| product.elements.contains(z))
        {
            continue;
        }
        match sp.phase {
            Phase::Gas => product.gas.push(i),
            Phase::Condensed => product.condensed.push(i),
        }
    }
    if product.gas.len() > MAX_PRODUCTS {
        return Err(CeqError::CapacityExceeded("gaseous products", MAX_PRODUCTS));
    }
    if product.condensed.len() > MAX_PRODUCTS {
        return Err(CeqError::CapacityExceeded(
            "condensed products",
            MAX_PRODUCTS,
        ));
    }

    let ng = product.gas.len();
    product.n_gas = Array1::from_elem(ng, 0.1 / ng as f64);
    product.ln_n_gas = product.n_gas.mapv(f64::ln);
    product.n_condensed = Array1::zeros(product.condensed.len());
    product.n_condensed_active = 0;
    product.species_listed = true;

    case.iteration.n = 0.1;
    case.iteration.ln_n = 0.1f64.ln();
    case.iteration.sumn = 0.1;
    case.iteration.delta_ln_nj = Array1::zeros(ng);
    case.iteration.delta_n_condensed = Array1::zeros(product.condensed.len());
    Ok(())
}

/// Fill the gaseous stoichiometric matrix a[element][species].
pub(crate) fn assemble_stoichiometry(case: &mut Case) {
    let thermo = case.thermo.clone();
    let product = &mut case.product;
    product.a = Array2::from_shape_fn((product.elements.len(), product.gas.len()), |(j, k)| {
        thermo
            .get(product.gas[k])
            .formula
            .iter()
            .filter(|&&(z, _)| z == product.elements[j])
            .map(|&(_, coef)| coef)
            .sum()
    });
}
