use std::fmt;

use super::FieldMismatch;
use crate::common::{Error, Result};

/// An aggregated set of mismatches, rendered one per line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MismatchReport {
    mismatches: Vec<FieldMismatch>,
}

impl MismatchReport {
    pub fn new(mismatches: Vec<FieldMismatch>) -> Self {
        Self { mismatches }
    }

    pub fn is_empty(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mismatches.len()
    }

    pub fn mismatches(&self) -> &[FieldMismatch] {
        &self.mismatches
    }

    /// Paths of every mismatched field, in report order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.mismatches.iter().map(|m| m.path.as_str())
    }

    /// `Ok(())` when empty, otherwise [`Error::Mismatch`] listing every line
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Mismatch {
                count: self.len(),
                report: self.to_string(),
            })
        }
    }
}

impl From<Vec<FieldMismatch>> for MismatchReport {
    fn from(mismatches: Vec<FieldMismatch>) -> Self {
        Self::new(mismatches)
    }
}

impl fmt::Display for MismatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mismatch) in self.mismatches.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {}", mismatch)?;
        }
        Ok(())
    }
}
