pub mod aggregate;
pub mod algorithm;
pub mod config;
pub mod envcheck;
pub mod errors;
pub mod footer;
pub mod harness;
pub mod runner;
pub mod select;
pub mod tools;
pub mod types;
