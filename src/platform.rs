//! Seam to the cloud ML control plane.
//!
//! The orchestrator talks to the platform exclusively through the
//! [client::MlPlatform] trait; [http::RestPlatform] is the blocking REST
//! implementation used in production.

pub mod auth;
pub mod client;
pub mod deployment;
pub mod http;
pub mod packaging;
pub mod types;
