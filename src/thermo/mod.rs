//! Thermodynamic species database.
//!
//! Species properties are represented by NASA 9-coefficient polynomials in
//! one or more temperature intervals. All evaluated quantities are
//! dimensionless: H°/RT, S°/R, Cp°/R and G°/RT.

use serde::{Deserialize, Serialize};

pub mod formula;
mod parser;

/// Phase of a species record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Gas,
    Condensed,
}

/// One temperature interval of a NASA polynomial: validity range, seven
/// polynomial coefficients and two integration constants.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemperatureInterval {
    pub range: [f64; 2],
    pub coefficients: [f64; 7],
    pub constants: [f64; 2],
}

/// A species record of the thermodynamic database.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Species {
    pub name: String,
    pub id: String,
    pub comments: String,
    pub phase: Phase,
    /// (atomic number, stoichiometric coefficient) pairs recovered from
    /// the name by the formula lexer; empty if the name is not a formula.
    pub formula: Vec<(u8, f64)>,
    /// Molecular weight in g/mol.
    pub molweight: f64,
    /// Heat of formation at 298.15 K in J/mol. For single-temperature
    /// condensed records this is the assigned enthalpy.
    pub heat_of_formation: f64,
    pub intervals: Vec<TemperatureInterval>,
    /// Reference temperature of single-temperature condensed records.
    pub reference_temperature: Option<f64>,
}

impl Species {
    /// The interval containing `t`. Temperatures outside the tabulated
    /// range are clamped to the nearest end interval.
    ///
    /// Only species with at least one interval can be evaluated; the
    /// product indexer guarantees this for all product species.
    fn interval(&self, t: f64) -> &TemperatureInterval {
        let last = self.intervals.len() - 1;
        if t < self.intervals[0].range[0] {
            return &self.intervals[0];
        }
        self.intervals[..last]
            .iter()
            .find(|iv| t >= iv.range[0] && t < iv.range[1])
            .unwrap_or(&self.intervals[last])
    }

    /// Dimensionless enthalpy H°/RT.
    pub fn enthalpy0(&self, t: f64) -> f64 {
        let iv = self.interval(t);
        let a = &iv.coefficients;
        -a[0] / (t * t) + a[1] * t.ln() / t + a[2] + a[3] * t / 2.0 + a[4] * t * t / 3.0
            + a[5] * t.powi(3) / 4.0
            + a[6] * t.powi(4) / 5.0
            + iv.constants[0] / t
    }

    /// Dimensionless entropy S°/R.
    pub fn entropy0(&self, t: f64) -> f64 {
        let iv = self.interval(t);
        let a = &iv.coefficients;
        -a[0] / (2.0 * t * t) - a[1] / t + a[2] * t.ln() + a[3] * t + a[4] * t * t / 2.0
            + a[5] * t.powi(3) / 3.0
            + a[6] * t.powi(4) / 4.0
            + iv.constants[1]
    }

    /// Dimensionless heat capacity Cp°/R.
    pub fn cp0(&self, t: f64) -> f64 {
        let iv = self.interval(t);
        let a = &iv.coefficients;
        a[0] / (t * t) + a[1] / t + a[2] + a[3] * t + a[4] * t * t + a[5] * t.powi(3)
            + a[6] * t.powi(4)
    }

    /// Dimensionless Gibbs energy G°/RT = H°/RT - S°/R.
    pub fn gibbs0(&self, t: f64) -> f64 {
        self.enthalpy0(t) - self.entropy0(t)
    }

    /// True iff `t` lies inside the union of the tabulated intervals.
    /// Single-temperature records always fail.
    pub fn temperature_check(&self, t: f64) -> bool {
        self.intervals
            .iter()
            .any(|iv| t >= iv.range[0] && t <= iv.range[1])
    }

    /// The tabulated boundary temperature nearest to `t`: the lower bound
    /// of the first interval or the upper bound of the last.
    pub fn transition_temperature(&self, t: f64) -> f64 {
        let lo = self.intervals[0].range[0];
        let hi = self.intervals[self.intervals.len() - 1].range[1];
        if (t - lo).abs() < (t - hi).abs() {
            lo
        } else {
            hi
        }
    }
}

/// Read-only collection of species records, shared between cases.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ThermoDB {
    species: Vec<Species>,
}

impl ThermoDB {
    pub fn new(species: Vec<Species>) -> Self {
        Self { species }
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn get(&self, i: usize) -> &Species {
        &self.species[i]
    }

    /// Index of the species with the exact given name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.species.iter().position(|sp| sp.name == name)
    }

    /// All species whose name contains `pattern`, case-insensitive.
    pub fn search(&self, pattern: &str) -> Vec<&Species> {
        let pattern = pattern.to_ascii_uppercase();
        self.species
            .iter()
            .filter(|sp| sp.name.to_ascii_uppercase().contains(&pattern))
            .collect()
    }

    /// Indexes of all species whose composition matches `formula`,
    /// typically the alternate phases of a condensed species. All
    /// formula slots take part in the comparison.
    pub fn search_by_formula(&self, formula: &[(u8, f64)]) -> Vec<usize> {
        self.species
            .iter()
            .enumerate()
            .filter(|(_, sp)| formula::same_formula(&sp.formula, formula))
            .map(|(i, _)| i)
            .collect()
    }
}
