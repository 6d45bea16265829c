pub mod api;
pub mod config;
pub mod display;
pub mod error;
pub mod model;
pub mod notify;
pub mod route;
pub mod screens;
pub mod session;
