//! HTTP surface, startup configuration, and process supervision.

pub mod config;
pub mod routes;
pub mod state;
pub mod supervisor;
