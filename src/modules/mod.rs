pub mod job;
pub mod movie;
