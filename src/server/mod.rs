pub mod app;
pub mod entrypoint;
pub mod health_check;
