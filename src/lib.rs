pub mod configuration;
pub mod control;
pub mod controller;
pub mod data_capture;
pub mod error_handling;
pub mod retention;
pub mod scheduler;
pub mod storage;
pub mod web_interface;

pub use controller::Controller;
