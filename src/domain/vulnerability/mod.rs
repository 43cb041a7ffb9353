//! Vulnerability domain: severity taxonomy and normalized advisories

pub mod entities;
pub mod value_objects;

pub use entities::{Advisory, VulnerabilityFinding};
pub use value_objects::{CvssType, Severity};
