//! Customer portal services built on the billing core

pub mod service;

pub use service::*;
