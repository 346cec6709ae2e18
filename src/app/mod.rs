//! Domain core: command vocabulary, port traits, and the control service.

pub mod command;
pub mod ports;
pub mod service;
