// Field geometry storage: records, area math, file-backed store and export

pub mod error;
pub mod export;
pub mod geometry;
pub mod store;
pub mod types;
