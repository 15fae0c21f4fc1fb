//! Reference-element geometry: quadrature schemes and isoparametric
//! interpolation.

pub mod interpolation;
pub mod quadrature;

pub use interpolation::Interpolation;
pub use quadrature::IntegrationDomain;
