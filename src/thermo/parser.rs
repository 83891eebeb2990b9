//! Fixed-column reader for the thermodynamic database.
//!
//! Records are sequences of 80-column lines: a two-line header (name,
//! comments, interval count and id; then state, molecular weight and heat
//! of formation), followed by either a reference-temperature line
//! (single-temperature condensed records) or three lines per temperature
//! interval. Lines starting with ' ', '!' or '-' between records are
//! comments.

use super::{formula, Phase, Species, TemperatureInterval, ThermoDB};
use crate::errors::{CeqError, CeqResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

impl ThermoDB {
    /// Read a thermodynamic database from a fixed-column file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CeqResult<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Read a thermodynamic database from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> CeqResult<Self> {
        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
        let mut species = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            let line = &lines[i];
            if is_comment(line) {
                i += 1;
                continue;
            }
            let record = parse_record(&lines, &mut i, species.last())?;
            species.push(record);
        }
        Ok(Self::new(species))
    }
}

fn is_comment(line: &str) -> bool {
    line.trim().is_empty() || line.starts_with([' ', '!', '-'])
}

fn parse_record(lines: &[String], i: &mut usize, previous: Option<&Species>) -> CeqResult<Species> {
    let header = &lines[*i];
    let name = field(header, 0, 18).trim().to_string();
    let comments = field(header, 18, 73).trim().to_string();
    let nint: usize = field(header, 73, 75)
        .trim()
        .parse()
        .map_err(|_| invalid(&name, "interval count is not an integer"))?;
    let id = field(header, 75, 81).trim().to_string();

    let state = next_line(lines, i, &name)?;
    let phase = match state.chars().next() {
        Some('0') => Phase::Gas,
        _ => Phase::Condensed,
    };
    let molweight = parse_float(field(state, 1, 14), &name)?;
    let mut heat_of_formation = parse_float(field(state, 14, 27), &name)?;

    let mut intervals = Vec::with_capacity(nint);
    let mut reference_temperature = None;
    if nint == 0 {
        let line = next_line(lines, i, &name)?;
        reference_temperature = Some(parse_float(field(line, 1, 11), &name)?);
    } else {
        for _ in 0..nint {
            intervals.push(parse_interval(lines, i, &name)?);
        }
        intervals.sort_by(|a, b| a.range[0].total_cmp(&b.range[0]));
    }
    *i += 1;

    let formula = formula::parse(&name).unwrap_or_default();

    // a zero heat of formation is inherited from the previous record when
    // the two records describe the same substance (alternate phases)
    if heat_of_formation == 0.0 {
        if let Some(prev) = previous {
            if formula::same_formula(&formula, &prev.formula) {
                heat_of_formation = prev.heat_of_formation;
            }
        }
    }

    Ok(Species {
        name,
        id,
        comments,
        phase,
        formula,
        molweight,
        heat_of_formation,
        intervals,
        reference_temperature,
    })
}

fn parse_interval(lines: &[String], i: &mut usize, name: &str) -> CeqResult<TemperatureInterval> {
    let head = next_line(lines, i, name)?;
    let lo = parse_float(field(head, 1, 11), name)?;
    let hi = parse_float(field(head, 11, 21), name)?;

    let mut coefficients = [0.0; 7];
    let first = next_line(lines, i, name)?;
    for (k, c) in coefficients.iter_mut().take(5).enumerate() {
        *c = parse_float(field(first, 16 * k, 16 * (k + 1)), name)?;
    }
    let second = next_line(lines, i, name)?;
    coefficients[5] = parse_float(field(second, 0, 16), name)?;
    coefficients[6] = parse_float(field(second, 16, 32), name)?;
    let constants = [
        parse_float(field(second, 48, 64), name)?,
        parse_float(field(second, 64, 80), name)?,
    ];

    Ok(TemperatureInterval {
        range: [lo, hi],
        coefficients,
        constants,
    })
}

fn next_line<'a>(lines: &'a [String], i: &mut usize, name: &str) -> CeqResult<&'a str> {
    *i += 1;
    lines
        .get(*i)
        .map(|l| l.as_str())
        .ok_or_else(|| invalid(name, "unexpected end of file"))
}

/// Column range of a line, tolerating short lines.
fn field(line: &str, start: usize, end: usize) -> &str {
    let len = line.len();
    &line[start.min(len)..end.min(len)]
}

/// Parse a fixed-column float; blank fields are zero and Fortran 'D'
/// exponents are accepted.
fn parse_float(text: &str, name: &str) -> CeqResult<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0.0);
    }
    text.replace(['D', 'd'], "E")
        .parse()
        .map_err(|_| invalid(name, "malformed number"))
}

fn invalid(name: &str, reason: &str) -> CeqError {
    CeqError::InvalidRecord(name.to_string(), reason.to_string())
}
