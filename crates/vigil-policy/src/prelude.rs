//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_policy::prelude::*;` to import all essential types.

pub use crate::{PolicyError, PolicyResult};

pub use crate::{PolicyProvisioner, PolicyValidator, ProvisionedPolicies};

pub use crate::{ValidatorClient, ValidatorConfig};
