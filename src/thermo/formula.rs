//! Lexer for chemical formulas encoded in species names.
//!
//! The thermodynamic database identifies species by CEA-style upper-case
//! names ("AL2O3(a)", "H2O(L)", "AL(OH)3"); the record format carries no
//! separate formula field, so the composition is recovered from the name.

use crate::elements::atomic_number;
use indexmap::IndexMap;

/// Letter pairs that read as a two-letter element symbol but almost always
/// denote a compound of two one-letter elements in combustion products
/// (CO is carbon monoxide, not cobalt). For these the one-letter parse is
/// preferred; backtracking still reaches the two-letter element if the
/// one-letter parse fails.
const SPLIT_PAIRS: [&str; 4] = ["CO", "NO", "HO", "CS"];

/// Parse a species name into (atomic number, stoichiometric coefficient)
/// pairs, in order of first appearance.
///
/// Returns [None] for names that are not chemical formulas (reactant
/// aliases, ions, electrons). Lexing stops at ',', '+', '-', '*',
/// whitespace and phase annotations such as "(a)" or "(L)"; a
/// parenthesised group followed by a digit is chemical ("AL(OH)3").
pub fn parse(name: &str) -> Option<Vec<(u8, f64)>> {
    let chars: Vec<char> = name.chars().collect();
    let mut formula = IndexMap::new();
    parse_sequence(&chars, 0, &mut formula)?;
    if formula.is_empty() {
        None
    } else {
        Some(formula.into_iter().collect())
    }
}

/// True if two formulas describe the same composition.
pub fn same_formula(a: &[(u8, f64)], b: &[(u8, f64)]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a: Vec<_> = a.to_vec();
    let mut b: Vec<_> = b.to_vec();
    a.sort_by_key(|&(z, _)| z);
    b.sort_by_key(|&(z, _)| z);
    a.iter()
        .zip(b.iter())
        .all(|(&(za, ca), &(zb, cb))| za == zb && (ca - cb).abs() < 1e-9)
}

fn parse_sequence(chars: &[char], start: usize, formula: &mut IndexMap<u8, f64>) -> Option<()> {
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        match c {
            'A'..='Z' => {
                i = parse_symbol(chars, i, formula)?;
            }
            '(' => {
                let close = chars[i..].iter().position(|&c| c == ')').map(|p| i + p)?;
                if matches!(chars.get(close + 1), Some(c) if c.is_ascii_digit()) {
                    // parenthesised chemical group with a multiplier
                    let mut group = IndexMap::new();
                    let inner: Vec<char> = chars[i + 1..close].to_vec();
                    parse_sequence(&inner, 0, &mut group)?;
                    let (count, next) = parse_count(chars, close + 1);
                    for (z, coef) in group {
                        *formula.entry(z).or_insert(0.0) += coef * count;
                    }
                    i = next;
                } else {
                    // trailing phase annotation, e.g. "(a)", "(L)", "(cr)"
                    break;
                }
            }
            ',' | '+' | '-' | '*' | ' ' => break,
            _ => return None,
        }
    }
    Some(())
}

/// Parse one element symbol plus its count starting at `i` and return the
/// index after it. Prefers the two-letter symbol, except for the
/// [SPLIT_PAIRS]; the alternative is tried if the rest of the name does
/// not lex under the first choice.
fn parse_symbol(chars: &[char], i: usize, formula: &mut IndexMap<u8, f64>) -> Option<usize> {
    let mut candidates = Vec::new();
    let single: String = chars[i].to_string();
    let pair: Option<String> = match chars.get(i + 1) {
        Some(c) if c.is_ascii_uppercase() => Some([chars[i], *c].iter().collect()),
        _ => None,
    };
    if let Some(pair) = pair.filter(|p| atomic_number(p).is_some()) {
        if SPLIT_PAIRS.contains(&pair.as_str()) {
            candidates.push((single.clone(), 1));
            candidates.push((pair, 2));
        } else {
            candidates.push((pair, 2));
            candidates.push((single.clone(), 1));
        }
    } else {
        candidates.push((single, 1));
    }

    for (symbol, len) in candidates {
        let Some(z) = atomic_number(&symbol) else {
            continue;
        };
        let (count, next) = parse_count(chars, i + len);
        let mut trial = formula.clone();
        *trial.entry(z).or_insert(0.0) += count;
        if parse_sequence(chars, next, &mut trial).is_some() {
            *formula = trial;
            return Some(chars.len());
        }
    }
    None
}

fn parse_count(chars: &[char], i: usize) -> (f64, usize) {
    let digits: String = chars[i..]
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        (1.0, i)
    } else {
        (digits.parse().unwrap_or(1.0), i + digits.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(formula: Vec<(u8, f64)>) -> Vec<(u8, f64)> {
        let mut f = formula;
        f.sort_by_key(|&(z, _)| z);
        f
    }

    #[test]
    fn simple_formulas() {
        assert_eq!(sorted(parse("H2O").unwrap()), vec![(1, 2.0), (8, 1.0)]);
        assert_eq!(sorted(parse("CH4").unwrap()), vec![(1, 4.0), (6, 1.0)]);
        assert_eq!(sorted(parse("O2").unwrap()), vec![(8, 2.0)]);
        assert_eq!(sorted(parse("AR").unwrap()), vec![(18, 1.0)]);
    }

    #[test]
    fn split_pairs() {
        assert_eq!(sorted(parse("CO2").unwrap()), vec![(6, 1.0), (8, 2.0)]);
        assert_eq!(sorted(parse("CO").unwrap()), vec![(6, 1.0), (8, 1.0)]);
        assert_eq!(sorted(parse("NO").unwrap()), vec![(7, 1.0), (8, 1.0)]);
        assert_eq!(sorted(parse("HO2").unwrap()), vec![(1, 1.0), (8, 2.0)]);
        assert_eq!(sorted(parse("CS2").unwrap()), vec![(6, 1.0), (16, 2.0)]);
    }

    #[test]
    fn backtracking() {
        // greedy "SC" (scandium) fails on the rest of the name
        assert_eq!(sorted(parse("SCL2").unwrap()), vec![(16, 1.0), (17, 2.0)]);
        assert_eq!(sorted(parse("CL2").unwrap()), vec![(17, 2.0)]);
        assert_eq!(sorted(parse("NA2O").unwrap()), vec![(8, 1.0), (11, 2.0)]);
        assert_eq!(sorted(parse("SIO2").unwrap()), vec![(8, 2.0), (14, 1.0)]);
    }

    #[test]
    fn phase_annotations_and_groups() {
        assert_eq!(
            sorted(parse("AL2O3(a)").unwrap()),
            vec![(8, 3.0), (13, 2.0)]
        );
        assert_eq!(sorted(parse("H2O(L)").unwrap()), vec![(1, 2.0), (8, 1.0)]);
        assert_eq!(
            sorted(parse("AL(OH)3").unwrap()),
            vec![(1, 3.0), (8, 3.0), (13, 1.0)]
        );
        assert_eq!(
            sorted(parse("C6H5OH,phenol").unwrap()),
            vec![(1, 6.0), (6, 6.0), (8, 1.0)]
        );
    }

    #[test]
    fn non_formulas() {
        assert_eq!(parse("e-"), None);
        assert_eq!(parse("Jet-A(g)"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn formula_equality() {
        let a = parse("AL2O3(a)").unwrap();
        let b = parse("AL2O3(L)").unwrap();
        let c = parse("ALO").unwrap();
        assert!(same_formula(&a, &b));
        assert!(!same_formula(&a, &c));
    }
}
