//! Core models for mixing pat files.
//!
//! This crate holds the pieces shared between the mixer and the command line:
//!
//! - [`models`] - genomic scopes: whole genome, site ranges, regions resolved through a site index, and blocks files
//! - [`beta`] - coverage readers for the `.beta` / `.lbeta` per-site statistics caches
//! - [`utils`] - gzip-aware readers and pat file name helpers
pub mod beta;
pub mod consts;
pub mod errors;
pub mod models;
pub mod utils;
