//! Frozen and shifting nozzle performance against closed-form isentropic
//! relations.

mod common;

use approx::assert_relative_eq;
use ceq::{
    compute_frozen, compute_shifting, Case, CeqResult, ExitCondition, PerformanceWarning,
    SolverOptions, RGAS,
};
use common::*;

const GAMMA: f64 = 5.0 / 3.0;

/// Area ratio of a perfect gas as a function of the Mach number.
fn area_ratio(gamma: f64, mach: f64) -> f64 {
    let t = 2.0 / (gamma + 1.0) * (1.0 + (gamma - 1.0) / 2.0 * mach * mach);
    t.powf((gamma + 1.0) / (2.0 * (gamma - 1.0))) / mach
}

/// Invert the area-Mach relation by bisection on the given branch.
fn mach_from_area_ratio(gamma: f64, target: f64, supersonic: bool) -> f64 {
    let (mut lo, mut hi) = if supersonic { (1.0, 50.0) } else { (1e-4, 1.0) };
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        let above = area_ratio(gamma, mid) > target;
        if above == supersonic {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    0.5 * (lo + hi)
}

fn argon_cases(heat: f64, pressure: f64) -> [Case; 3] {
    let chamber = argon_case(heat, pressure);
    [chamber.clone(), chamber.clone(), chamber]
}

#[test]
fn frozen_throat_matches_perfect_gas() -> CeqResult<()> {
    let mut cases = argon_cases(1200.0, 50.0);
    let summary = compute_frozen(
        &mut cases,
        ExitCondition::SupersonicAreaRatio(5.0),
        SolverOptions::new(),
    )?;
    assert!(summary.warnings.is_empty());

    let tc = cases[0].properties.temperature;
    let throat = &cases[1];
    let performance = throat.performance.as_ref().unwrap();

    // pc/pt = ((gamma+1)/2)^(gamma/(gamma-1)), Tt = 2/(gamma+1) Tc
    let pc_pt = ((GAMMA + 1.0) / 2.0).powf(GAMMA / (GAMMA - 1.0));
    assert_relative_eq!(performance.pc_p, pc_pt, max_relative = 1e-3);
    assert_relative_eq!(
        throat.properties.temperature,
        2.0 / (GAMMA + 1.0) * tc,
        max_relative = 1e-3
    );
    assert_relative_eq!(performance.ae_at, 1.0);
    assert!((performance.mach - 1.0).abs() <= 5e-3);

    // u = a at the throat
    let n = 1.0 / 39.948;
    let a_throat = (1000.0 * n * RGAS * throat.properties.temperature * GAMMA).sqrt();
    assert_relative_eq!(performance.isp, a_throat, max_relative = 1e-3);

    // characteristic velocity from the analytic throat state
    let cstar = 1000.0 * n * RGAS * throat.properties.temperature / performance.isp * pc_pt;
    assert_relative_eq!(performance.cstar, cstar, max_relative = 1e-3);
    assert_relative_eq!(
        performance.cf * performance.cstar,
        performance.isp,
        max_relative = 1e-12
    );
    Ok(())
}

#[test]
fn frozen_supersonic_exit_matches_area_mach_relation() -> CeqResult<()> {
    let target = 5.0;
    let mut cases = argon_cases(1200.0, 50.0);
    let summary = compute_frozen(
        &mut cases,
        ExitCondition::SupersonicAreaRatio(target),
        SolverOptions::new(),
    )?;
    assert!(summary.warnings.is_empty());

    let tc = cases[0].properties.temperature;
    let exit = &cases[2];
    let performance = exit.performance.as_ref().unwrap();

    let mach = mach_from_area_ratio(GAMMA, target, true);
    let te = tc / (1.0 + (GAMMA - 1.0) / 2.0 * mach * mach);
    let n = 1.0 / 39.948;
    let ue = mach * (1000.0 * n * RGAS * te * GAMMA).sqrt();

    assert_relative_eq!(performance.ae_at, target, max_relative = 1e-3);
    assert_relative_eq!(exit.properties.temperature, te, max_relative = 1e-3);
    assert_relative_eq!(performance.isp, ue, max_relative = 1e-3);
    assert_relative_eq!(performance.mach, mach, max_relative = 1e-3);
    assert!(performance.ivac > performance.isp);
    Ok(())
}

#[test]
fn frozen_pressure_exit() -> CeqResult<()> {
    let mut cases = argon_cases(1200.0, 50.0);
    let summary = compute_frozen(
        &mut cases,
        ExitCondition::Pressure(5.0),
        SolverOptions::new(),
    )?;
    assert!(summary.warnings.is_empty());

    let tc = cases[0].properties.temperature;
    let exit = &cases[2];
    // Te/Tc = (pe/pc)^((gamma-1)/gamma) for the frozen perfect gas
    let te = tc * 0.1_f64.powf((GAMMA - 1.0) / GAMMA);
    assert_relative_eq!(exit.properties.temperature, te, max_relative = 1e-3);

    let n = 1.0 / 39.948;
    let ue = (2000.0 * 2.5 * n * RGAS * (tc - te)).sqrt();
    assert_relative_eq!(exit.performance.as_ref().unwrap().isp, ue, max_relative = 1e-3);
    Ok(())
}

#[test]
fn frozen_subsonic_exit() -> CeqResult<()> {
    let target = 3.0;
    let mut cases = argon_cases(1200.0, 50.0);
    compute_frozen(
        &mut cases,
        ExitCondition::SubsonicAreaRatio(target),
        SolverOptions::new(),
    )?;

    let exit = &cases[2];
    let performance = exit.performance.as_ref().unwrap();
    assert!(performance.mach < 1.0);
    assert_relative_eq!(performance.ae_at, target, max_relative = 5e-3);

    let mach = mach_from_area_ratio(GAMMA, target, false);
    let pc_pe = (1.0 + (GAMMA - 1.0) / 2.0 * mach * mach).powf(GAMMA / (GAMMA - 1.0));
    assert_relative_eq!(performance.pc_p, pc_pe, max_relative = 1e-2);
    Ok(())
}

#[test]
fn area_ratio_out_of_range() -> CeqResult<()> {
    let mut cases = argon_cases(1200.0, 50.0);
    let summary = compute_frozen(
        &mut cases,
        ExitCondition::SupersonicAreaRatio(0.8),
        SolverOptions::new(),
    )?;
    assert!(summary
        .warnings
        .contains(&PerformanceWarning::AreaRatioOutOfRange));
    assert!(cases[2].performance.is_none());
    // the throat state is still produced
    assert!(cases[1].performance.is_some());
    Ok(())
}

fn nitrogen_cases(heat: f64, pressure: f64) -> [Case; 3] {
    let chamber = nitrogen_case(heat, pressure);
    [chamber.clone(), chamber.clone(), chamber]
}

/// A dissociating chamber: recombination along the nozzle makes the
/// shifting specific impulse exceed the frozen one, and the shifting
/// expansion conserves the chamber entropy.
#[test]
fn shifting_exceeds_frozen() -> CeqResult<()> {
    let exit = ExitCondition::SupersonicAreaRatio(5.0);

    let mut frozen = nitrogen_cases(6000.0, 50.0);
    compute_frozen(&mut frozen, exit, SolverOptions::new())?;
    let isp_frozen = frozen[2].performance.as_ref().unwrap().isp;

    let mut shifting = nitrogen_cases(6000.0, 50.0);
    compute_shifting(&mut shifting, exit, SolverOptions::new())?;
    let isp_shifting = shifting[2].performance.as_ref().unwrap().isp;

    // both runs share the same chamber equilibrium
    assert_relative_eq!(
        frozen[0].properties.temperature,
        shifting[0].properties.temperature,
        max_relative = 1e-6
    );
    assert!(frozen[0].properties.temperature > 5000.0);

    assert!(
        isp_shifting >= isp_frozen * (1.0 - 1e-3),
        "shifting {} < frozen {}",
        isp_shifting,
        isp_frozen
    );

    // entropy is preserved across chamber, throat and exit
    let sc = shifting[0].properties.entropy;
    assert_relative_eq!(shifting[1].properties.entropy, sc, max_relative = 1e-3);
    assert_relative_eq!(shifting[2].properties.entropy, sc, max_relative = 1e-3);

    // sonic throat in both expansions
    assert!((frozen[1].performance.as_ref().unwrap().mach - 1.0).abs() <= 5e-3);
    assert!((shifting[1].performance.as_ref().unwrap().mach - 1.0).abs() <= 5e-3);

    assert_invariants(&shifting[1]);
    assert_invariants(&shifting[2]);
    Ok(())
}
