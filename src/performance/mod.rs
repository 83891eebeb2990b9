//! Frozen and shifting nozzle performance.
//!
//! The chamber state is an enthalpy/pressure equilibrium. Throat and exit
//! states are found by isentropic expansion: the throat by matching the
//! flow speed to the local sound speed, the exit by an assigned pressure
//! or by inverting the area ratio. Frozen expansion keeps the chamber
//! composition and only re-solves the temperature; shifting expansion
//! re-solves a full entropy/pressure equilibrium at every trial pressure.

use crate::equilibrium::{
    compute_equilibrium, frozen_cp, mixture_enthalpy, mixture_entropy, SpeciesTables,
};
use crate::errors::{CeqError, CeqResult};
use crate::state::{Case, Problem};
use crate::{SolverOptions, RGAS};

const PC_PT_ITERATION_MAX: usize = 5;
const PC_PE_ITERATION_MAX: usize = 6;
const TEMP_ITERATION_MAX: usize = 8;
/// Relative tolerance on u^2 - a^2 at the throat and on the logarithmic
/// area-ratio mismatch at the exit.
const FLOW_TOL: f64 = 4e-5;
const TEMP_TOL: f64 = 1e-4;

/// The condition defining the nozzle exit state.
#[derive(Copy, Clone, Debug)]
pub enum ExitCondition {
    /// Assigned exit pressure in atm.
    Pressure(f64),
    /// Assigned area ratio Ae/At, supersonic solution.
    SupersonicAreaRatio(f64),
    /// Assigned area ratio Ae/At, subsonic solution.
    SubsonicAreaRatio(f64),
}

/// Nozzle performance at one station.
#[derive(Clone, Debug, Default)]
pub struct Performance {
    /// Chamber-to-local pressure ratio.
    pub pc_p: f64,
    /// Area ratio Ae/At.
    pub ae_at: f64,
    /// Flow area per unit mass flow rate, for pressures in atm.
    pub a_dot_m: f64,
    /// Characteristic velocity in m/s.
    pub cstar: f64,
    /// Thrust coefficient.
    pub cf: f64,
    /// Specific impulse in m/s.
    pub isp: f64,
    /// Vacuum specific impulse in m/s.
    pub ivac: f64,
    /// Flow Mach number u/a.
    pub mach: f64,
}

/// Diagnostics of a performance calculation. Non-convergence of the
/// nested loops keeps the last iterate instead of aborting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PerformanceWarning {
    ThroatNotConverged,
    ExitNotConverged,
    TemperatureNotConverged,
    AreaRatioOutOfRange,
}

#[derive(Clone, Debug, Default)]
pub struct PerformanceSummary {
    pub warnings: Vec<PerformanceWarning>,
}

impl PerformanceSummary {
    fn warn(&mut self, warning: PerformanceWarning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Expansion {
    Frozen,
    Shifting,
}

/// Nozzle performance with the composition frozen at the chamber
/// equilibrium. `cases` are the chamber, throat and exit stations; the
/// chamber defines the propellant and pressure.
pub fn compute_frozen(
    cases: &mut [Case; 3],
    exit: ExitCondition,
    options: SolverOptions,
) -> CeqResult<PerformanceSummary> {
    nozzle(cases, exit, options, Expansion::Frozen)
}

/// Nozzle performance with the equilibrium re-established at every
/// station ("shifting" expansion).
pub fn compute_shifting(
    cases: &mut [Case; 3],
    exit: ExitCondition,
    options: SolverOptions,
) -> CeqResult<PerformanceSummary> {
    nozzle(cases, exit, options, Expansion::Shifting)
}

fn nozzle(
    cases: &mut [Case; 3],
    exit: ExitCondition,
    options: SolverOptions,
    expansion: Expansion,
) -> CeqResult<PerformanceSummary> {
    let verbosity = options.verbosity;
    let mut summary = PerformanceSummary::default();
    let [chamber, throat, exit_case] = cases;

    compute_equilibrium(chamber, Problem::EnthalpyPressure, options)
        .map_err(|_| CeqError::NoEquilibrium)?;
    if expansion == Expansion::Frozen {
        frozen_state_update(chamber);
    }
    chamber.performance = None;

    let pc = chamber.pressure;
    let hc = chamber.properties.enthalpy;
    let sc = chamber.properties.entropy;
    let gamma_c = chamber.properties.isentropic_exponent;

    // throat: drive u towards the local sound speed
    *throat = chamber.clone();
    let mut pc_pt = ((gamma_c + 1.0) / 2.0).powf(gamma_c / (gamma_c - 1.0));
    let (mut u2, mut a2) = (0.0, 0.0);
    let mut converged = false;
    log_iter!(
        verbosity,
        " throat |    pc/pt    |  temperature  |     u      |     a      "
    );
    log_iter!(verbosity, "{:-<62}", "");
    for i in 0..PC_PT_ITERATION_MAX {
        if i > 0 {
            let gamma = throat.properties.isentropic_exponent;
            let nrt = throat.iteration.n * RGAS * throat.temperature;
            pc_pt /= 1.0 + (u2 - a2) / (1000.0 * (gamma + 1.0) * nrt);
        }
        throat.pressure = pc / pc_pt;
        expand(throat, sc, expansion, options, &mut summary);
        u2 = 2000.0 * (hc - throat.properties.enthalpy);
        a2 = throat.properties.sound_speed.powi(2);
        log_iter!(
            verbosity,
            "   {:4} | {:11.6} | {:13.6} | {:10.4} | {:10.4}",
            i + 1,
            pc_pt,
            throat.temperature,
            u2.max(0.0).sqrt(),
            a2.sqrt(),
        );
        if (u2 - a2).abs() <= FLOW_TOL * u2 {
            converged = true;
            break;
        }
    }
    if !converged {
        summary.warn(PerformanceWarning::ThroatNotConverged);
        log_result!(verbosity, "throat iteration not converged");
    }
    let throat_performance = station_performance(throat, pc, hc, None);
    throat.performance = Some(throat_performance.clone());

    // exit
    *exit_case = throat.clone();
    exit_case.performance = None;
    let ln_pc_pt = pc_pt.ln();

    let target = match exit {
        ExitCondition::Pressure(pe) => {
            if pe <= 0.0 || pe >= pc {
                return Err(CeqError::Error(
                    "exit pressure must lie below the chamber pressure".into(),
                ));
            }
            exit_case.pressure = pe;
            expand(exit_case, sc, expansion, options, &mut summary);
            exit_case.performance = Some(station_performance(
                exit_case,
                pc,
                hc,
                Some(&throat_performance),
            ));
            return Ok(summary);
        }
        ExitCondition::SupersonicAreaRatio(ar) | ExitCondition::SubsonicAreaRatio(ar) => ar,
    };
    if target <= 1.0 {
        summary.warn(PerformanceWarning::AreaRatioOutOfRange);
        log_result!(verbosity, "area ratio {} out of range", target);
        return Ok(summary);
    }

    // empirical initial estimate of the pressure ratio
    let eln = target.ln();
    let mut ln_pc_pe = match exit {
        ExitCondition::SupersonicAreaRatio(_) if target < 2.0 => {
            ln_pc_pt + (3.294 * eln * eln + 1.535 * eln).sqrt()
        }
        ExitCondition::SupersonicAreaRatio(_) => gamma_c + 1.4 * eln,
        _ => ln_pc_pt / (target * target),
    };

    let mut ar_current: f64 = 1.0;
    converged = false;
    log_iter!(
        verbosity,
        "   exit |    pc/pe    |  temperature  |  area ratio"
    );
    log_iter!(verbosity, "{:-<54}", "");
    for i in 0..PC_PE_ITERATION_MAX {
        if i > 0 {
            let gamma = exit_case.properties.isentropic_exponent;
            ln_pc_pe += gamma * u2 / (u2 - a2) * (eln - ar_current.ln());
        }
        exit_case.pressure = pc / ln_pc_pe.exp();
        expand(exit_case, sc, expansion, options, &mut summary);
        u2 = 2000.0 * (hc - exit_case.properties.enthalpy);
        a2 = exit_case.properties.sound_speed.powi(2);
        let u = u2.max(0.0).sqrt();
        let a_dot_m =
            1000.0 * exit_case.iteration.n * RGAS * exit_case.temperature
                / (exit_case.pressure * u);
        ar_current = a_dot_m / throat_performance.a_dot_m;
        log_iter!(
            verbosity,
            "   {:4} | {:11.6} | {:13.6} | {:11.6}",
            i + 1,
            ln_pc_pe.exp(),
            exit_case.temperature,
            ar_current,
        );
        if (eln - ar_current.ln()).abs() <= FLOW_TOL {
            converged = true;
            break;
        }
    }
    if !converged {
        summary.warn(PerformanceWarning::ExitNotConverged);
        log_result!(verbosity, "exit iteration not converged");
    }
    exit_case.performance = Some(station_performance(
        exit_case,
        pc,
        hc,
        Some(&throat_performance),
    ));
    Ok(summary)
}

/// Re-establish the station state at the current trial pressure,
/// conserving the chamber entropy.
fn expand(
    case: &mut Case,
    entropy: f64,
    expansion: Expansion,
    options: SolverOptions,
    summary: &mut PerformanceSummary,
) {
    match expansion {
        Expansion::Frozen => {
            if !frozen_temperature(case, entropy) {
                summary.warn(PerformanceWarning::TemperatureNotConverged);
            }
            frozen_state_update(case);
        }
        Expansion::Shifting => {
            case.entropy_target = entropy;
            if compute_equilibrium(case, Problem::EntropyPressure, options).is_err() {
                // keep the last iterate and approximate its properties
                // with the frozen evaluation for diagnostics
                frozen_state_update(case);
                summary.warn(PerformanceWarning::TemperatureNotConverged);
            }
        }
    }
}

/// Newton iteration on ln T for the temperature at which the frozen
/// mixture reaches the target entropy at the case pressure.
fn frozen_temperature(case: &mut Case, entropy: f64) -> bool {
    for _ in 0..TEMP_ITERATION_MAX {
        let tables = SpeciesTables::new(case);
        let delta = (entropy - mixture_entropy(case, &tables)) / frozen_cp(case, &tables);
        case.temperature *= delta.exp();
        if delta.abs() <= TEMP_TOL {
            return true;
        }
    }
    false
}

/// Properties of a frozen-composition state: ideal-mixture derivatives
/// and the frozen heat capacities.
fn frozen_state_update(case: &mut Case) {
    let tables = SpeciesTables::new(case);
    let t = case.temperature;
    let n = case.iteration.n;
    let enthalpy = mixture_enthalpy(case, &tables);
    let entropy = mixture_entropy(case, &tables);
    let cp = frozen_cp(case, &tables);
    let cv = cp - n * RGAS;
    let gamma = cp / cv;

    let properties = &mut case.properties;
    properties.pressure = case.pressure;
    properties.temperature = t;
    properties.enthalpy = enthalpy;
    properties.entropy = entropy;
    properties.internal_energy = enthalpy - n * RGAS * t;
    properties.gibbs_energy = enthalpy - t * entropy;
    properties.molar_mass = 1.0 / n;
    properties.dv_t = 1.0;
    properties.dv_p = -1.0;
    properties.cp = cp;
    properties.cv = cv;
    properties.isentropic_exponent = gamma;
    properties.sound_speed = (1000.0 * n * RGAS * t * gamma).sqrt();
}

/// Performance numbers of one station. The throat (no reference) defines
/// the characteristic velocity and unit area ratio.
fn station_performance(
    case: &Case,
    pc: f64,
    hc: f64,
    throat: Option<&Performance>,
) -> Performance {
    let u = (2000.0 * (hc - case.properties.enthalpy)).max(0.0).sqrt();
    let a_dot_m = 1000.0 * case.iteration.n * RGAS * case.temperature / (case.pressure * u);
    let cstar = match throat {
        Some(t) => t.cstar,
        None => pc * a_dot_m,
    };
    Performance {
        pc_p: pc / case.pressure,
        ae_at: match throat {
            Some(t) => a_dot_m / t.a_dot_m,
            None => 1.0,
        },
        a_dot_m,
        cstar,
        cf: u / cstar,
        isp: u,
        ivac: u + case.pressure * a_dot_m,
        mach: u / case.properties.sound_speed,
    }
}
