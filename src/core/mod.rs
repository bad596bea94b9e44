pub mod adapter;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod events;
pub mod model;
pub mod paths;
pub mod runner;
