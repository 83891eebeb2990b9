//! Propellant (reactant) database and propellant compositions.

use crate::elements::atomic_weight;
use crate::errors::{CeqError, CeqResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

mod parser;

/// Largest number of components in a single propellant composition.
pub const MAX_COMPONENTS: usize = 20;

/// A reactant record: composition, heat of formation and density.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reactant {
    pub name: String,
    /// (atomic number, stoichiometric coefficient) pairs, up to 6.
    pub formula: Vec<(u8, f64)>,
    /// Heat of formation in J/g.
    pub heat_of_formation: f64,
    /// Density in g/cm^3.
    pub density: f64,
}

impl Reactant {
    /// Molecular weight in g/mol, from the atomic-weight table.
    pub fn molweight(&self) -> f64 {
        self.formula
            .iter()
            .map(|&(z, coef)| coef * atomic_weight(z))
            .sum()
    }
}

/// Read-only collection of reactant records, shared between cases.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PropellantDB {
    reactants: Vec<Reactant>,
}

impl PropellantDB {
    pub fn new(reactants: Vec<Reactant>) -> Self {
        Self { reactants }
    }

    pub fn len(&self) -> usize {
        self.reactants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactants.is_empty()
    }

    pub fn reactants(&self) -> &[Reactant] {
        &self.reactants
    }

    pub fn get(&self, i: usize) -> &Reactant {
        &self.reactants[i]
    }

    /// Index of the reactant with the exact given name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.reactants.iter().position(|r| r.name == name)
    }

    /// All reactants whose name contains `pattern`, case-insensitive.
    pub fn search(&self, pattern: &str) -> Vec<&Reactant> {
        let pattern = pattern.to_ascii_uppercase();
        self.reactants
            .iter()
            .filter(|r| r.name.to_ascii_uppercase().contains(&pattern))
            .collect()
    }

    /// Index of the first reactant whose composition matches `formula`.
    /// All six formula slots take part in the comparison.
    pub fn search_by_formula(&self, formula: &[(u8, f64)]) -> Option<usize> {
        self.reactants
            .iter()
            .position(|r| crate::thermo::formula::same_formula(&r.formula, formula))
    }
}

/// A propellant formulation: mole quantities of reactants.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Composition {
    /// (reactant index, mole quantity) pairs.
    components: Vec<(usize, f64)>,
}

impl Composition {
    pub fn new(components: Vec<(usize, f64)>) -> CeqResult<Self> {
        if components.len() > MAX_COMPONENTS {
            return Err(CeqError::CapacityExceeded("components", MAX_COMPONENTS));
        }
        Ok(Self { components })
    }

    /// A fuel/oxidizer pair formulated by the oxidizer-to-fuel mass ratio.
    pub fn with_of_ratio(
        db: &PropellantDB,
        fuel: usize,
        oxidizer: usize,
        of_ratio: f64,
    ) -> CeqResult<Self> {
        let moles_ox = of_ratio * db.get(fuel).molweight() / db.get(oxidizer).molweight();
        Self::new(vec![(fuel, 1.0), (oxidizer, moles_ox)])
    }

    pub fn components(&self) -> &[(usize, f64)] {
        &self.components
    }

    /// Total mass in grams.
    pub fn mass(&self, db: &PropellantDB) -> f64 {
        self.components
            .iter()
            .map(|&(r, moles)| moles * db.get(r).molweight())
            .sum()
    }

    /// Heat of formation per gram of propellant in J/g.
    pub fn enthalpy(&self, db: &PropellantDB) -> f64 {
        let energy: f64 = self
            .components
            .iter()
            .map(|&(r, moles)| moles * db.get(r).molweight() * db.get(r).heat_of_formation)
            .sum();
        energy / self.mass(db)
    }

    /// Moles of each of `elements` per gram of propellant.
    pub fn element_balance(&self, db: &PropellantDB, elements: &[u8]) -> Array1<f64> {
        let mass = self.mass(db);
        Array1::from_shape_fn(elements.len(), |j| {
            self.components
                .iter()
                .map(|&(r, moles)| {
                    db.get(r)
                        .formula
                        .iter()
                        .filter(|&&(z, _)| z == elements[j])
                        .map(|&(_, coef)| moles * coef)
                        .sum::<f64>()
                })
                .sum::<f64>()
                / mass
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn db() -> PropellantDB {
        PropellantDB::new(vec![
            Reactant {
                name: "HYDROGEN (CRYOGENIC)".into(),
                formula: vec![(1, 2.0)],
                heat_of_formation: -3954.3,
                density: 0.071,
            },
            Reactant {
                name: "OXYGEN (LIQUID)".into(),
                formula: vec![(8, 2.0)],
                heat_of_formation: -398.3,
                density: 1.142,
            },
        ])
    }

    #[test]
    fn molweight_from_table() {
        let db = db();
        assert_relative_eq!(db.get(0).molweight(), 2.01588, max_relative = 1e-6);
        assert_relative_eq!(db.get(1).molweight(), 31.9988, max_relative = 1e-6);
    }

    #[test]
    fn lookups() {
        let db = db();
        assert_eq!(db.find("OXYGEN (LIQUID)"), Some(1));
        assert_eq!(db.search("liquid").len(), 1);
        assert_eq!(db.search_by_formula(&[(8, 2.0)]), Some(1));
        assert_eq!(db.search_by_formula(&[(8, 1.0)]), None);
    }

    #[test]
    fn of_ratio_composition() -> CeqResult<()> {
        let db = db();
        let comp = Composition::with_of_ratio(&db, 0, 1, 4.02)?;
        let mass_fuel = db.get(0).molweight();
        let mass_ox = comp.components()[1].1 * db.get(1).molweight();
        assert_relative_eq!(mass_ox / mass_fuel, 4.02, max_relative = 1e-12);
        Ok(())
    }

    #[test]
    fn element_balance_per_gram() -> CeqResult<()> {
        let db = db();
        let comp = Composition::new(vec![(0, 2.0), (1, 1.0)])?;
        let mass = comp.mass(&db);
        assert_relative_eq!(mass, 2.0 * 2.01588 + 31.9988, max_relative = 1e-6);
        let b0 = comp.element_balance(&db, &[1, 8]);
        assert_relative_eq!(b0[0], 4.0 / mass, max_relative = 1e-12);
        assert_relative_eq!(b0[1], 2.0 / mass, max_relative = 1e-12);
        Ok(())
    }

    #[test]
    fn component_capacity() {
        let components = (0..MAX_COMPONENTS + 1).map(|i| (i, 1.0)).collect();
        assert!(matches!(
            Composition::new(components),
            Err(CeqError::CapacityExceeded("components", MAX_COMPONENTS))
        ));
    }
}
