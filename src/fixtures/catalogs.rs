//! Catalog Fixtures

use serde::Deserialize;

use crate::{fixtures::FixtureError, packages::PackageOption};

/// Wrapper for catalog packages in YAML
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Drug or product name
    #[serde(default)]
    pub name: Option<String>,

    /// Packages in catalog order
    pub packages: Vec<PackageFixture>,
}

/// Package fixture from YAML
#[derive(Debug, Deserialize)]
pub struct PackageFixture {
    /// Package identifier (e.g. an NDC)
    pub identifier: String,

    /// Units per package
    pub quantity: u32,

    /// Unit of measure
    pub unit: String,

    /// Whether the package is currently marketed
    #[serde(default = "default_active")]
    pub active: bool,

    /// Manufacturer
    #[serde(default)]
    pub labeler: Option<String>,

    /// Brand name
    #[serde(default)]
    pub brand: Option<String>,
}

fn default_active() -> bool {
    true
}

impl TryFrom<PackageFixture> for PackageOption {
    type Error = FixtureError;

    fn try_from(fixture: PackageFixture) -> Result<Self, Self::Error> {
        let mut package =
            PackageOption::new(fixture.identifier, fixture.quantity, &fixture.unit)?
                .with_active(fixture.active);

        if let Some(labeler) = fixture.labeler {
            package = package.with_labeler(labeler);
        }

        if let Some(brand) = fixture.brand {
            package = package.with_brand(brand);
        }

        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::packages::PackageError;

    #[test]
    fn optional_fields_default() -> TestResult {
        let fixture: CatalogFixture = serde_norway::from_str(
            "packages:\n  - identifier: \"0001\"\n    quantity: 5\n    unit: ml\n",
        )?;

        let Some(package) = fixture.packages.into_iter().next() else {
            panic!("expected one package");
        };

        let package = PackageOption::try_from(package)?;

        assert_eq!(package.unit(), "ML");
        assert!(package.is_active());
        assert_eq!(package.brand(), None);

        Ok(())
    }

    #[test]
    fn blank_identifier_is_rejected() {
        let fixture = PackageFixture {
            identifier: "  ".to_string(),
            quantity: 5,
            unit: "ML".to_string(),
            active: true,
            labeler: None,
            brand: None,
        };

        let result = PackageOption::try_from(fixture);

        assert!(matches!(
            result,
            Err(FixtureError::Package(PackageError::EmptyIdentifier))
        ));
    }
}
