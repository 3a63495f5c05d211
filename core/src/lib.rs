pub mod catalog;
pub mod catalog_import;
pub mod classifier;
pub mod db;
pub mod error;
pub mod features;
pub mod models;
pub mod ranking;
pub mod selection;
pub mod service;
pub mod store;
#[cfg(test)]
mod test_support;
pub mod week;
