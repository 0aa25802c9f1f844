//! Packages

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors related to package construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackageError {
    /// A package was declared with zero units.
    #[error("package {identifier} has a quantity of zero")]
    ZeroQuantity {
        /// Identifier of the offending package
        identifier: String,
    },

    /// A package was declared without an identifier.
    #[error("package identifier is empty")]
    EmptyIdentifier,
}

/// A single purchasable unit as offered by a manufacturer (e.g. "90 tablets per bottle").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageOption {
    identifier: String,
    quantity: u32,
    unit: String,
    active: bool,
    labeler: Option<String>,
    brand: Option<String>,
}

impl PackageOption {
    /// Create a new active package.
    ///
    /// The unit of measure is normalised to upper case so that `"ml"` and `"ML"`
    /// are treated as the same unit.
    ///
    /// # Errors
    ///
    /// - [`PackageError::EmptyIdentifier`]: the identifier is blank.
    /// - [`PackageError::ZeroQuantity`]: the package holds no units.
    pub fn new(
        identifier: impl Into<String>,
        quantity: u32,
        unit: impl AsRef<str>,
    ) -> Result<Self, PackageError> {
        let identifier = identifier.into();

        if identifier.trim().is_empty() {
            return Err(PackageError::EmptyIdentifier);
        }

        if quantity == 0 {
            return Err(PackageError::ZeroQuantity { identifier });
        }

        Ok(Self {
            identifier,
            quantity,
            unit: normalise_unit(unit.as_ref()),
            active: true,
            labeler: None,
            brand: None,
        })
    }

    /// Set the active flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set the labeler (manufacturer) name.
    #[must_use]
    pub fn with_labeler(mut self, labeler: impl Into<String>) -> Self {
        self.labeler = Some(labeler.into());
        self
    }

    /// Set the brand name.
    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Opaque package identifier (usually an NDC)
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Units contained in one package
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit of measure, upper case
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Whether the package is still marketed
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Labeler name, if known
    pub fn labeler(&self) -> Option<&str> {
        self.labeler.as_deref()
    }

    /// Brand name, if known
    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    /// Human readable description used on recommendation line items.
    ///
    /// Falls back to the quantity and unit when no brand or labeler is known.
    pub fn description(&self) -> String {
        match (self.brand(), self.labeler()) {
            (Some(brand), Some(labeler)) => format!("{brand} ({labeler})"),
            (Some(brand), None) => brand.to_string(),
            (None, Some(labeler)) => labeler.to_string(),
            (None, None) => format!("{} {}", self.quantity, self.unit),
        }
    }
}

impl fmt::Display for PackageOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} {}", self.identifier, self.quantity, self.unit)
    }
}

fn normalise_unit(unit: &str) -> String {
    unit.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn new_normalises_unit() -> TestResult {
        let package = PackageOption::new("00093-0058-01", 30, " tablet ")?;

        assert_eq!(package.unit(), "TABLET");
        assert!(package.is_active());

        Ok(())
    }

    #[test]
    fn new_rejects_zero_quantity() {
        let result = PackageOption::new("00093-0058-01", 0, "TABLET");

        assert_eq!(
            result,
            Err(PackageError::ZeroQuantity {
                identifier: "00093-0058-01".to_string()
            })
        );
    }

    #[test]
    fn new_rejects_blank_identifier() {
        let result = PackageOption::new("  ", 30, "TABLET");

        assert_eq!(result, Err(PackageError::EmptyIdentifier));
    }

    #[test]
    fn description_prefers_brand_and_labeler() -> TestResult {
        let package = PackageOption::new("0071-0155-23", 90, "TABLET")?
            .with_brand("Lipitor")
            .with_labeler("Pfizer");

        assert_eq!(package.description(), "Lipitor (Pfizer)");

        Ok(())
    }

    #[test]
    fn description_falls_back_to_quantity_and_unit() -> TestResult {
        let package = PackageOption::new("0071-0155-23", 90, "TABLET")?;

        assert_eq!(package.description(), "90 TABLET");

        Ok(())
    }
}
