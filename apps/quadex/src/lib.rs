//! # quadex
//!
//! Command-line front end for `quadex-core`.

pub mod cli;
