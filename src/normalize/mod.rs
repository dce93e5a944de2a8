// src/normalize/mod.rs
pub mod context;
pub mod fact;
pub mod processor;
pub mod types;
