pub mod annotate;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fasta;
pub mod fs_util;
pub mod lookup;
pub mod output;
pub mod species_map;
pub mod store;
