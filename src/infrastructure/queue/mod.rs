pub mod broker;
pub mod subscription;
