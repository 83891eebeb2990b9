//! The mutable state of an equilibrium calculation.

use crate::performance::Performance;
use crate::propellant::{Composition, PropellantDB};
use crate::thermo::ThermoDB;
use ndarray::{Array1, Array2};
use std::sync::Arc;

mod properties;
pub use properties::EquilibriumProperties;

/// Largest number of distinct elements in a propellant.
pub const MAX_ELEMENTS: usize = 15;
/// Largest number of product species per phase.
pub const MAX_PRODUCTS: usize = 400;

/// The constrained pair of state variables of an equilibrium problem.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Problem {
    /// Assigned temperature and pressure.
    TemperaturePressure,
    /// Assigned enthalpy (from the propellant) and pressure.
    EnthalpyPressure,
    /// Assigned entropy and pressure.
    EntropyPressure,
}

/// Candidate product species, their stoichiometry and mole numbers.
///
/// The condensed list is ordered with the active species first; inactive
/// candidates stay in the tail so inclusion and removal are swaps.
#[derive(Clone, Debug, Default)]
pub struct Product {
    /// Atomic numbers of the elements present in the propellant.
    pub elements: Vec<u8>,
    /// Gaseous product candidates, as indexes into the thermo database.
    pub gas: Vec<usize>,
    /// Condensed product candidates, active prefix of length
    /// `n_condensed_active`.
    pub condensed: Vec<usize>,
    pub n_condensed_active: usize,
    /// Stoichiometric coefficients `a[element][gas species]`.
    pub a: Array2<f64>,
    /// Moles of each gaseous species per gram of propellant.
    pub n_gas: Array1<f64>,
    /// ln nj, kept also for species currently at zero concentration.
    pub ln_n_gas: Array1<f64>,
    /// Moles of each condensed candidate per gram of propellant.
    pub n_condensed: Array1<f64>,
    pub elements_listed: bool,
    pub species_listed: bool,
    pub is_equilibrium: bool,
}

impl Product {
    /// Stoichiometric coefficient of `element` in a condensed candidate.
    pub fn a_condensed(&self, thermo: &ThermoDB, element: u8, candidate: usize) -> f64 {
        thermo
            .get(self.condensed[candidate])
            .formula
            .iter()
            .filter(|&&(z, _)| z == element)
            .map(|&(_, coef)| coef)
            .sum()
    }
}

/// Iteration bookkeeping of the equilibrium solver.
#[derive(Clone, Debug, Default)]
pub struct IterationInfo {
    /// Moles of gas per gram of propellant.
    pub n: f64,
    pub ln_n: f64,
    /// Total moles per gram including condensed species.
    pub sumn: f64,
    pub delta_ln_n: f64,
    pub delta_ln_t: f64,
    pub delta_ln_nj: Array1<f64>,
    pub delta_n_condensed: Array1<f64>,
}

/// One equilibrium case: a propellant formulation, the problem state
/// variables and the owned solution state.
///
/// The thermodynamic and propellant databases are shared and immutable;
/// everything else is owned exclusively by the case.
#[derive(Clone)]
pub struct Case {
    pub thermo: Arc<ThermoDB>,
    pub propellants: Arc<PropellantDB>,
    pub composition: Composition,
    /// Assigned pressure in atm.
    pub pressure: f64,
    /// Current temperature iterate in K; the assigned temperature for
    /// fixed-temperature problems.
    pub temperature: f64,
    /// Assigned entropy in kJ/(kg K) for entropy/pressure problems.
    pub entropy_target: f64,
    pub product: Product,
    pub iteration: IterationInfo,
    pub properties: EquilibriumProperties,
    pub performance: Option<Performance>,
}

impl Case {
    pub fn new(
        thermo: &Arc<ThermoDB>,
        propellants: &Arc<PropellantDB>,
        composition: Composition,
    ) -> Self {
        Self {
            thermo: thermo.clone(),
            propellants: propellants.clone(),
            composition,
            pressure: 1.0,
            temperature: 0.0,
            entropy_target: 0.0,
            product: Product::default(),
            iteration: IterationInfo::default(),
            properties: EquilibriumProperties::default(),
            performance: None,
        }
    }

    pub fn pressure(mut self, pressure: f64) -> Self {
        self.pressure = pressure;
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn entropy_target(mut self, entropy: f64) -> Self {
        self.entropy_target = entropy;
        self
    }
}
