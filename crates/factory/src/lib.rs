//! # factory
//!
//! Remote adapters for the deployment configuration service.
//!
//! The service speaks Connect over HTTP with JSON bodies. This crate
//! provides a blocking [`FactoryClient`] and one
//! [`RemoteAdapter`](reconcile::RemoteAdapter) per resource kind, bundled
//! in [`Adapters`].
//!
//! ## Example
//!
//! ```no_run
//! use factory::{Adapters, ClientConfig, FactoryClient};
//! use reconcile::{Request, ResourceKind, apply};
//!
//! let config = ClientConfig::new("licence-key", "acme-prod");
//! let adapters = Adapters::new(FactoryClient::new(config).unwrap());
//!
//! let kind = ResourceKind::Deployment;
//! let state = apply(kind, adapters.adapter(kind), Request::Read {
//!     prior: Default::default(),
//! })
//! .unwrap();
//! println!("{:?}", state.record());
//! ```

pub mod adapters;
pub mod client;

pub use adapters::Adapters;
pub use client::{
    ClientConfig, ConfigError, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, DEPLOYMENT_SERVICE,
    FactoryClient, TOKEN_SERVICE,
};
