//! License resolution across registries, composer data, and caching

pub mod resolver;

pub use resolver::LicenseResolver;
