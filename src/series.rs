//! Numeric series extracted from query results
//!
//! A query result column is an ordered sequence of nullable scalars.
//! [`NumericSeries`] is its dense floating-point form: absent values
//! become NaN, order and length are preserved. The series writes as
//! ASCII numeric text, one value per line.

use std::io::Write;

use serde_json::Value;

use crate::{Error, Result};

/// Derive the output file name for a column.
///
/// Column naming in the source system permits `[` and `]` (e.g.
/// `episode_reward[env=xor]`), which are unsafe in file paths. Both are
/// replaced with `_` before the fixed `.txt` extension is appended.
#[must_use]
pub fn output_file_name(column: &str) -> String {
    let sanitized = column.replace(['[', ']'], "_");
    format!("{sanitized}.txt")
}

/// Dense floating-point view of one query result column.
///
/// Invariants: same length as the source column, source order preserved,
/// absent values represented as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSeries {
    values: Vec<f64>,
}

impl NumericSeries {
    /// Convert a column of nullable JSON scalars into a numeric series.
    ///
    /// `null` maps to NaN; integers and floats pass through. `column` is
    /// only used to label errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonNumeric`] for any value that is not a number
    /// or `null` (strings, booleans, nested structures).
    pub fn from_values(column: &str, raw: &[Value]) -> Result<Self> {
        let mut values = Vec::with_capacity(raw.len());
        for (index, value) in raw.iter().enumerate() {
            match value {
                Value::Null => values.push(f64::NAN),
                Value::Number(n) => match n.as_f64() {
                    Some(v) => values.push(v),
                    None => {
                        return Err(Error::NonNumeric {
                            column: column.to_string(),
                            index,
                            value: value.to_string(),
                        })
                    }
                },
                other => {
                    return Err(Error::NonNumeric {
                        column: column.to_string(),
                        index,
                        value: other.to_string(),
                    })
                }
            }
        }
        Ok(Self { values })
    }

    /// Number of values in the series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series contains no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values in source order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Write the series as text, one value per line, in source order.
    ///
    /// NaN is written as `NaN`, which `str::parse::<f64>` reads back.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer, including the final
    /// flush.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for value in &self.values {
            writeln!(writer, "{value}")?;
        }
        writer.flush()
    }
}
