// src/extractors/mod.rs
pub mod archive;
pub mod csv;
