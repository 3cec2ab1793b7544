pub mod config;
pub mod error;
pub mod model;
pub mod patch;
pub mod seed;
pub mod storage;
pub mod store;
