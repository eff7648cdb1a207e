pub mod catalog_repo;
pub mod models;
pub mod order_repo;
pub mod tone_output;
