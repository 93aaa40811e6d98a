//! Terminal presentation of the merged dataset

pub mod dashboard;
pub mod export;
pub mod setup;
pub mod summary;
pub mod table;
pub mod ui;
