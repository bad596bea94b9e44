pub mod cli;
pub mod driver;
pub mod progress;
