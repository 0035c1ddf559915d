pub mod cli;
pub mod env;
pub mod settings;
