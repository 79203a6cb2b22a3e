pub mod config;
pub mod importers;
pub mod services;
pub mod store;
