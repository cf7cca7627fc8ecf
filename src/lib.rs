//! Telemetry backend for a GPS-equipped obstacle-detection cane.
//!
//! The sensor node posts distance/alert/GPS samples and camera captures; a
//! dashboard polls the read-only query endpoints.
pub mod api;
pub mod auth;
pub mod blob_store;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod query;
