//! Core data model — spheres and their provenance history

mod provenance;
mod sphere;

pub use provenance::ProvenanceNode;
pub use sphere::Sphere;
