//! Document Conversion Gateway
//!
//! HTTP service that outlines PDF text with Ghostscript and converts CorelDRAW
//! files to PDF through the Zamzar job API, staging every upload and artifact
//! on local disk only for the lifetime of its request.

pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
