// Metadata Mapper - Library Entry Point

pub mod constants;
pub mod error;
pub mod config;
pub mod report;
pub mod parser;
pub mod mapping;
pub mod catalog;
pub mod db;
pub mod reconcile;
pub mod commands;

pub use error::{MapperError, Result};
