pub mod detail;
pub mod models;
pub mod normalized;
pub mod normalizer;
