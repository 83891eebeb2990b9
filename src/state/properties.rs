use std::fmt;

/// Thermodynamic properties of a converged equilibrium state.
///
/// Mass-specific quantities are per kilogram of propellant; the molar
/// mass refers to one mole of gaseous products.
#[derive(Clone, Debug, Default)]
pub struct EquilibriumProperties {
    /// Pressure in atm.
    pub pressure: f64,
    /// Temperature in K.
    pub temperature: f64,
    /// Enthalpy in kJ/kg.
    pub enthalpy: f64,
    /// Internal energy in kJ/kg.
    pub internal_energy: f64,
    /// Gibbs energy in kJ/kg.
    pub gibbs_energy: f64,
    /// Entropy in kJ/(kg K).
    pub entropy: f64,
    /// Molar mass of the gaseous products in g/mol.
    pub molar_mass: f64,
    /// (dln V / dln P) at constant T; -1 for an ideal frozen mixture.
    pub dv_p: f64,
    /// (dln V / dln T) at constant P; +1 for an ideal frozen mixture.
    pub dv_t: f64,
    /// Isobaric heat capacity in kJ/(kg K).
    pub cp: f64,
    /// Isochoric heat capacity in kJ/(kg K).
    pub cv: f64,
    /// Isentropic exponent gamma_s.
    pub isentropic_exponent: f64,
    /// Speed of sound in m/s.
    pub sound_speed: f64,
}

impl fmt::Display for EquilibriumProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pressure:       {:11.4} atm", self.pressure)?;
        writeln!(f, "temperature:    {:11.2} K", self.temperature)?;
        writeln!(f, "enthalpy:       {:11.3} kJ/kg", self.enthalpy)?;
        writeln!(f, "entropy:        {:11.4} kJ/(kg K)", self.entropy)?;
        writeln!(f, "molar mass:     {:11.4} g/mol", self.molar_mass)?;
        writeln!(f, "Cp:             {:11.4} kJ/(kg K)", self.cp)?;
        writeln!(f, "gamma_s:        {:11.4}", self.isentropic_exponent)?;
        write!(f, "sound speed:    {:11.2} m/s", self.sound_speed)
    }
}
