//! Vigil Policy - Client side of the external policy validator.
//!
//! This crate defines the two collaborator seams the approval core talks to:
//!
//! - [`PolicyValidator`]: one allow/deny verdict per proposed action
//! - [`PolicyProvisioner`]: create and release the demo policy set
//!
//! [`ValidatorClient`] implements both over HTTP. The [`demo`] module holds
//! the fixed policy set provisioned for demo sessions.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod client;
pub mod demo;
pub mod error;
pub mod provider;

pub use client::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT, ValidatorClient, ValidatorConfig};
pub use demo::{ArgumentConstraint, LlmPolicyConfig, PolicyDefinition, demo_policies};
pub use error::{PolicyError, PolicyResult};
pub use provider::{PolicyProvisioner, PolicyValidator, ProvisionedPolicies};
