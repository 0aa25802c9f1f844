//! Fixtures
//!
//! YAML catalog and request sets used by the demo and the integration tests. A set
//! named `atorvastatin` is read from `fixtures/catalogs/atorvastatin.yml` and
//! `fixtures/requests/atorvastatin.yml`.

use std::{fs, path::PathBuf};

use thiserror::Error;

use crate::{
    fixtures::{catalogs::CatalogFixture, requests::RequestsFixture},
    packages::{PackageError, PackageOption},
    search::SearchOptions,
};

pub mod catalogs;
pub mod requests;

pub use requests::parse_percentage;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Invalid package data
    #[error("Invalid package: {0}")]
    Package(#[from] PackageError),

    /// No request loaded
    #[error("No request loaded; prescribed quantity unknown")]
    NoRequest,
}

/// A prescription request loaded from a fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Prescribed quantity, passed to the optimizer unvalidated
    pub quantity: i64,

    /// Search options for this request
    pub options: SearchOptions,
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Catalog packages in file order
    packages: Vec<PackageOption>,

    /// Drug or product name from the catalog file, if any
    name: Option<String>,

    /// Request for the set, if loaded
    request: Option<Request>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            packages: Vec::new(),
            name: None,
            request: None,
        }
    }

    /// Load catalog packages from a YAML fixture file
    ///
    /// Packages are appended to any already loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a package is invalid.
    pub fn load_catalog(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("catalogs").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: CatalogFixture = serde_norway::from_str(&contents)?;

        if fixture.name.is_some() {
            self.name = fixture.name;
        }

        for package_fixture in fixture.packages {
            self.packages.push(package_fixture.try_into()?);
        }

        Ok(self)
    }

    /// Load the request from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a percentage is invalid.
    pub fn load_request(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("requests").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: RequestsFixture = serde_norway::from_str(&contents)?;

        self.request = Some(Request::try_from(fixture.request)?);

        Ok(self)
    }

    /// Load a complete fixture set (catalog and request with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_catalog(name)?.load_request(name)?;

        Ok(fixture)
    }

    /// Get the loaded catalog packages
    pub fn packages(&self) -> &[PackageOption] {
        &self.packages
    }

    /// Get the product name declared by the catalog file
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the loaded request
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::NoRequest`] if no request file has been loaded.
    pub fn request(&self) -> Result<&Request, FixtureError> {
        self.request.as_ref().ok_or(FixtureError::NoRequest)
    }

    /// Get the prescribed quantity of the loaded request
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::NoRequest`] if no request file has been loaded.
    pub fn quantity(&self) -> Result<i64, FixtureError> {
        Ok(self.request()?.quantity)
    }

    /// Get the search options of the loaded request, or defaults when none is loaded
    pub fn options(&self) -> SearchOptions {
        self.request
            .as_ref()
            .map(|request| request.options.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{create_dir_all, write};

    use rust_decimal::Decimal;
    use tempfile::TempDir;
    use testresult::TestResult;

    use super::*;

    fn write_set(dir: &TempDir, name: &str, catalog: &str, request: &str) -> TestResult {
        let catalogs = dir.path().join("catalogs");
        let requests = dir.path().join("requests");

        create_dir_all(&catalogs)?;
        create_dir_all(&requests)?;

        write(catalogs.join(format!("{name}.yml")), catalog)?;
        write(requests.join(format!("{name}.yml")), request)?;

        Ok(())
    }

    #[test]
    fn load_set_from_custom_base_path() -> TestResult {
        let dir = TempDir::new()?;

        write_set(
            &dir,
            "metformin",
            r#"
name: Metformin 500mg
packages:
  - identifier: "00093-1048-01"
    quantity: 100
    unit: tablet
    labeler: Teva
  - identifier: "00093-1048-05"
    quantity: 500
    unit: TABLET
    active: false
"#,
            r#"
request:
  quantity: 120
  max_packages: 2
  max_overfill: "50%"
  prefer_fewer_packages: true
"#,
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture.load_catalog("metformin")?.load_request("metformin")?;

        let [hundred, five_hundred] = fixture.packages() else {
            panic!("expected two packages");
        };

        assert_eq!(fixture.name(), Some("Metformin 500mg"));
        assert_eq!(hundred.labeler(), Some("Teva"));
        assert_eq!(hundred.unit(), "TABLET");
        assert!(!five_hundred.is_active());
        assert_eq!(fixture.quantity()?, 120);

        let options = fixture.options();

        assert_eq!(options.max_packages, 2);
        assert_eq!(options.max_overfill_percentage, Some(Decimal::from(50)));
        assert!(options.prefer_fewer_packages);

        Ok(())
    }

    #[test]
    fn missing_request_is_reported() -> TestResult {
        let dir = TempDir::new()?;

        write_set(
            &dir,
            "single",
            "packages:\n  - identifier: a\n    quantity: 30\n    unit: TABLET\n",
            "request:\n  quantity: 30\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture.load_catalog("single")?;

        assert!(matches!(fixture.quantity(), Err(FixtureError::NoRequest)));
        assert_eq!(fixture.options(), SearchOptions::default());

        Ok(())
    }

    #[test]
    fn zero_quantity_package_is_rejected() -> TestResult {
        let dir = TempDir::new()?;

        write_set(
            &dir,
            "broken",
            "packages:\n  - identifier: a\n    quantity: 0\n    unit: TABLET\n",
            "request:\n  quantity: 30\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());
        let result = fixture.load_catalog("broken");

        assert!(matches!(
            result,
            Err(FixtureError::Package(PackageError::ZeroQuantity { .. }))
        ));

        Ok(())
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut fixture = Fixture::with_base_path("./does-not-exist");

        let result = fixture.load_catalog("nothing");

        assert!(matches!(result, Err(FixtureError::Io(_))));
    }
}
