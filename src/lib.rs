//! Terminal loan calculator.
//!
//! Collects loan application inputs, asks a remote calculation service for the
//! loan amount, and explains the formula behind the answer.

pub mod app;
pub mod client;
pub mod config;
pub mod explain;
pub mod form;
pub mod logging;
pub mod ui;
