// src/lib.rs
pub mod batch;
pub mod edinet;
pub mod extractors;
pub mod normalize;
pub mod storage;
pub mod utils;
