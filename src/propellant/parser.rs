//! Fixed-column reader for the propellant database.
//!
//! One record per line: name, up to six (coefficient, element symbol)
//! groups, heat of formation in cal/g and density in lb/in^3 (converted to
//! J/g and g/cm^3 on load). Lines starting with '*' are comments and a
//! leading '+' continues the previous record's name.

use super::{PropellantDB, Reactant};
use crate::elements::atomic_number;
use crate::errors::{CeqError, CeqResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const CAL_TO_JOULE: f64 = 4.1868;
const LB_IN3_TO_G_CM3: f64 = 27.679905;

impl PropellantDB {
    /// Read a propellant database from a fixed-column file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CeqResult<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Read a propellant database from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> CeqResult<Self> {
        let mut reactants: Vec<Reactant> = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('*') {
                continue;
            }
            if let Some(continuation) = line.strip_prefix('+') {
                let name = field(continuation, 8, 38).trim().to_string();
                if let Some(last) = reactants.last_mut() {
                    last.name.push(' ');
                    last.name.push_str(&name);
                }
                continue;
            }
            reactants.push(parse_reactant(&line)?);
        }
        Ok(Self::new(reactants))
    }
}

fn parse_reactant(line: &str) -> CeqResult<Reactant> {
    let name = field(line, 9, 39).trim().to_string();

    let mut formula = Vec::new();
    for g in 0..6 {
        let start = 39 + 5 * g;
        let coef = field(line, start, start + 3).trim();
        let symbol = field(line, start + 3, start + 5).trim();
        if coef.is_empty() && symbol.is_empty() {
            continue;
        }
        let coef: f64 = coef
            .parse()
            .map_err(|_| CeqError::InvalidRecord(name.clone(), "malformed coefficient".into()))?;
        if coef == 0.0 {
            continue;
        }
        let z = atomic_number(symbol).ok_or_else(|| CeqError::UnknownElement(symbol.into()))?;
        formula.push((z, coef));
    }

    let heat: f64 = parse_float(field(line, 69, 74), &name)?;
    let density: f64 = parse_float(field(line, 75, 80), &name)?;

    Ok(Reactant {
        name,
        formula,
        heat_of_formation: heat * CAL_TO_JOULE,
        density: density * LB_IN3_TO_G_CM3,
    })
}

fn field(line: &str, start: usize, end: usize) -> &str {
    let len = line.len();
    &line[start.min(len)..end.min(len)]
}

fn parse_float(text: &str, name: &str) -> CeqResult<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0.0);
    }
    text.parse()
        .map_err(|_| CeqError::InvalidRecord(name.to_string(), "malformed number".into()))
}
