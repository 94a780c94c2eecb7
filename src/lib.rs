//! # Model deploy action library
//!
//! This library provides the core functionality for the model deploy action:
//! it reads declarative configuration from the CI environment, authenticates
//! against the ML control plane, deploys a registered model as a web service
//! (or packages it as a deployable image) and reports outputs back to the CI
//! host. The `model-deploy-action` binary consumes this library.

pub mod action;
pub mod cli;
pub mod config;
pub mod github;
pub mod platform;
pub mod testscript;
pub mod utils;
