//! # ldpstore
//!
//! Library half of the ldpstore binary: command-line definitions, command
//! implementations and configuration loading over `ldpstore-core`.

pub mod cli;
pub mod config;
