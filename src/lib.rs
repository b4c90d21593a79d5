pub mod converter;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod rewrite;
pub mod runner;
pub mod settings;
