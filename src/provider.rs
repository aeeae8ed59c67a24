//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering HTTPS-only
//! endpoints, client authentication preferences, the requested scope, and provider quirks
//! (scope delimiter, identity token placement). `strategy` defines [`ProviderStrategy`], an
//! HTTP-client-agnostic hook used by flows to decorate outgoing requests and map provider
//! failures into the bridge error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
