//! Input file and argument parsing for the CLI.
//!
//! Sequence files hold one sequence per line, whitespace-separated item
//! tokens. Attribute files have the same shape with integer values.
//! Constraint specs on the command line look like `price:2..10`,
//! `price:..10` or `price:2..`.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Read a sequence file into rows of item tokens. Blank lines are
/// skipped.
pub fn read_sequences(path: &Path) -> Result<Vec<Vec<String>>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading sequences from {}", path.display()))?;
    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split_whitespace().map(str::to_string).collect())
        .collect())
}

/// Read an attribute file into rows of integers.
pub fn read_attribute(path: &Path) -> Result<Vec<Vec<i64>>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading attribute values from {}", path.display()))?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split_whitespace()
                .map(|token| {
                    token
                        .parse::<i64>()
                        .with_context(|| format!("invalid attribute value {token:?}"))
                })
                .collect()
        })
        .collect()
}

/// Split a `NAME=FILE` attribute argument.
pub fn parse_attr_arg(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((name, file)) if !name.is_empty() && !file.is_empty() => Ok((name, file)),
        _ => bail!("expected NAME=FILE, got {arg:?}"),
    }
}

/// Parse a `NAME:LO..HI` constraint spec; either bound may be omitted.
pub fn parse_bounds(spec: &str) -> Result<(&str, Option<i64>, Option<i64>)> {
    let Some((name, range)) = spec.split_once(':') else {
        bail!("expected NAME:LO..HI, got {spec:?}");
    };
    let Some((lo, hi)) = range.split_once("..") else {
        bail!("expected a LO..HI range in {spec:?}");
    };
    let parse = |token: &str| -> Result<Option<i64>> {
        if token.is_empty() {
            Ok(None)
        } else {
            token
                .parse::<i64>()
                .map(Some)
                .with_context(|| format!("invalid bound {token:?} in {spec:?}"))
        }
    };
    let lower = parse(lo)?;
    let upper = parse(hi)?;
    if lower.is_none() && upper.is_none() {
        bail!("constraint {spec:?} has no bound");
    }
    Ok((name, lower, upper))
}

/// Parse the threshold: a bare integer is a row count, anything with a
/// decimal point is a fraction of the database.
pub fn parse_min_frequency(value: &str) -> Result<seqmine_core::api::MinFrequency> {
    use seqmine_core::api::MinFrequency;
    if value.contains('.') {
        let fraction: f64 = value
            .parse()
            .with_context(|| format!("invalid frequency fraction {value:?}"))?;
        Ok(MinFrequency::Fraction(fraction))
    } else {
        let count: usize = value
            .parse()
            .with_context(|| format!("invalid frequency count {value:?}"))?;
        Ok(MinFrequency::Count(count))
    }
}
