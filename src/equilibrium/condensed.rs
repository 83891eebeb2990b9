//! Management of the active condensed-species set.
//!
//! Active condensed species occupy the prefix of the candidate list;
//! inclusion and removal swap candidates across the active boundary so no
//! bookkeeping beyond the active count is needed.

use crate::state::Case;
use crate::Verbosity;
use ndarray::Array1;
use std::collections::HashMap;

/// Temperature margin around a phase transition inside which both phases
/// are kept in the iteration.
const TRANSITION_MARGIN: f64 = 50.0;

/// Evict active condensed species with non-positive mole numbers and
/// substitute species that have left their temperature range with an
/// alternate phase of the same formula. Returns true if the active set
/// changed.
pub(crate) fn remove_condensed(
    case: &mut Case,
    evicted: &mut HashMap<usize, u32>,
    verbosity: Verbosity,
) -> bool {
    let mut changed = false;
    let mut c = 0;
    while c < case.product.n_condensed_active {
        let species = case.product.condensed[c];
        if case.product.n_condensed[c] <= 0.0 {
            log_iter!(
                verbosity,
                "removing condensed species {}",
                case.thermo.get(species).name
            );
            *evicted.entry(species).or_insert(0) += 1;
            evict(case, c);
            changed = true;
            // the swapped-in species is examined next
            continue;
        }

        let sp = case.thermo.get(species);
        if !sp.temperature_check(case.temperature) {
            if let Some(alternate) = find_alternate(case, c) {
                let transition = sp.transition_temperature(case.temperature);
                let past_transition =
                    (case.temperature - transition).abs() > TRANSITION_MARGIN;
                if alternate < case.product.n_condensed_active {
                    // the admissible phase is already active; both phases
                    // coexist while the temperature stays near the
                    // transition
                    if past_transition {
                        *evicted.entry(species).or_insert(0) += 1;
                        evict(case, c);
                        changed = true;
                        continue;
                    }
                } else if past_transition {
                    // well past the transition: replace the phase, keep
                    // its mole number
                    log_iter!(
                        verbosity,
                        "substituting {} for {}",
                        case.thermo.get(case.product.condensed[alternate]).name,
                        case.thermo.get(species).name
                    );
                    case.product.condensed.swap(c, alternate);
                    changed = true;
                } else {
                    // near the transition: iterate on both phases
                    log_iter!(
                        verbosity,
                        "adding phase {}",
                        case.thermo.get(case.product.condensed[alternate]).name
                    );
                    let active = case.product.n_condensed_active;
                    case.product.condensed.swap(active, alternate);
                    case.product.n_condensed.swap(active, alternate);
                    case.product.n_condensed[active] = 0.0;
                    case.product.n_condensed_active += 1;
                    changed = true;
                }
            }
        }
        c += 1;
    }
    changed
}

/// Include the inactive condensed candidate with the most negative
/// inclusion test G°/RT - sum(pi_j a_j), if any. Returns true if one was
/// added.
pub(crate) fn include_condensed(
    case: &mut Case,
    pi: &Array1<f64>,
    evicted: &HashMap<usize, u32>,
    verbosity: Verbosity,
) -> bool {
    let t = case.temperature;
    let mut best: Option<(usize, f64)> = None;
    for pos in case.product.n_condensed_active..case.product.condensed.len() {
        let species = case.product.condensed[pos];
        let sp = case.thermo.get(species);
        if !sp.temperature_check(t) {
            continue;
        }
        // do not cycle a species that repeatedly converges to zero
        if evicted.get(&species).copied().unwrap_or(0) >= 2 {
            continue;
        }
        let test = sp.gibbs0(t)
            - case
                .product
                .elements
                .iter()
                .enumerate()
                .map(|(j, &z)| pi[j] * case.product.a_condensed(&case.thermo, z, pos))
                .sum::<f64>();
        if test < 0.0 && best.map_or(true, |(_, b)| test < b) {
            best = Some((pos, test));
        }
    }

    if let Some((pos, _)) = best {
        log_iter!(
            verbosity,
            "including condensed species {}",
            case.thermo.get(case.product.condensed[pos]).name
        );
        let active = case.product.n_condensed_active;
        case.product.condensed.swap(active, pos);
        case.product.n_condensed.swap(active, pos);
        case.product.n_condensed[active] = 0.0;
        case.product.n_condensed_active += 1;
        true
    } else {
        false
    }
}

/// Evict active condensed species whose mole numbers have gone negative
/// and are still being driven further down. The linearized system has no
/// solution with such a species present, so waiting for convergence
/// would exhaust the iteration budget.
pub(crate) fn remove_diverging(
    case: &mut Case,
    evicted: &mut HashMap<usize, u32>,
    verbosity: Verbosity,
) -> bool {
    let mut changed = false;
    let mut c = 0;
    while c < case.product.n_condensed_active {
        if case.product.n_condensed[c] < 0.0 && case.iteration.delta_n_condensed[c] < 0.0 {
            log_iter!(
                verbosity,
                "removing condensed species {}",
                case.thermo.get(case.product.condensed[c]).name
            );
            *evicted.entry(case.product.condensed[c]).or_insert(0) += 1;
            evict(case, c);
            changed = true;
            continue;
        }
        c += 1;
    }
    changed
}

/// Swap the active condensed species at `c` out of the active prefix.
fn evict(case: &mut Case, c: usize) {
    let last = case.product.n_condensed_active - 1;
    case.product.condensed.swap(c, last);
    case.product.n_condensed.swap(c, last);
    case.product.n_condensed[last] = 0.0;
    case.iteration.delta_n_condensed.swap(c, last);
    case.product.n_condensed_active = last;
}

/// A candidate with the same formula whose temperature range admits the
/// current temperature.
fn find_alternate(case: &Case, c: usize) -> Option<usize> {
    let formula = &case.thermo.get(case.product.condensed[c]).formula;
    let phases = case.thermo.search_by_formula(formula);
    (0..case.product.condensed.len()).find(|&pos| {
        pos != c
            && phases.contains(&case.product.condensed[pos])
            && case
                .thermo
                .get(case.product.condensed[pos])
                .temperature_check(case.temperature)
    })
}
