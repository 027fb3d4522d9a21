//! Log-linear modelling of mutation motif counts and relative entropy statistics in Rust

pub mod config;
pub mod counts;
pub mod entropy;
pub mod error;
pub mod fasta;
pub mod formula;
pub mod glm;
pub mod io;
pub mod loglin;
pub mod results;
pub mod stats;
pub mod table;
pub mod types;
