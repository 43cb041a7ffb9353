//! Manifest and lockfile parsers, one scanner per ecosystem

pub mod go;
pub mod php;
pub mod python;
pub mod traits;

pub use go::GoModScanner;
pub use php::ComposerScanner;
pub use python::PythonScanner;
pub use traits::{EcosystemScanner, ScannerRegistry};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::dependency::UNKNOWN_VERSION;

static CONSTRAINT_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\^~><=!\s*]+").unwrap());
static VERSION_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)*)").unwrap());

/// Extract a concrete version number from a declared constraint string.
///
/// Strips leading constraint operators (`^ ~ > < = ! *` and whitespace) and
/// takes the first number-dot-number token; yields [`UNKNOWN_VERSION`] when
/// no such token exists (e.g. `"*"`, `"dev-main"`, empty).
pub(crate) fn extract_version_from_constraint(constraint: &str) -> String {
    if constraint.is_empty() {
        return UNKNOWN_VERSION.to_string();
    }

    let cleaned = CONSTRAINT_PREFIX.replace(constraint, "");
    match VERSION_TOKEN.find(&cleaned) {
        Some(m) => m.as_str().to_string(),
        None => UNKNOWN_VERSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_version_from_constraint() {
        assert_eq!(extract_version_from_constraint("^7.0"), "7.0");
        assert_eq!(extract_version_from_constraint("~2.31.0"), "2.31.0");
        assert_eq!(extract_version_from_constraint(">=2.0,<3.0"), "2.0");
        assert_eq!(extract_version_from_constraint("==2.31.0"), "2.31.0");
        assert_eq!(extract_version_from_constraint("1.2.3"), "1.2.3");
        assert_eq!(extract_version_from_constraint("*"), UNKNOWN_VERSION);
        assert_eq!(extract_version_from_constraint(""), UNKNOWN_VERSION);
        assert_eq!(extract_version_from_constraint("dev-main"), UNKNOWN_VERSION);
    }
}
