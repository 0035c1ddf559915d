pub mod client;
pub mod pool;
