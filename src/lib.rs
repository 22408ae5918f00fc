pub mod aggregate;
pub mod api;
pub mod geo;
pub mod matching;
pub mod models;
pub mod normalization;
pub mod sheets;
pub mod store;
pub mod sync;
pub mod utils;
