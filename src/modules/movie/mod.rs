pub mod error;
pub mod model;
pub mod page;
pub mod service;

pub use service::MovieService;
