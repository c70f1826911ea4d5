#![doc = "The `coursehub` library crate."]
#![doc = ""]
#![doc = "Domain models, storage, authentication, the enrollment, payment and progress"]
#![doc = "services, routing configuration and error handling for the CourseHub backend."]
#![doc = "The binary (`main.rs`) wires these together and runs the HTTP server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;
