//! Core of the provisioner: descriptors, persistence, provisioning and the
//! host lifecycle, plus the config/logging plumbing the CLI needs.

pub mod broker;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod output;
pub mod provision;
pub mod schema;
pub mod schemas;
pub mod store;
pub mod time;
