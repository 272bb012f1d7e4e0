//! Constraint-aware team timeline: teams own tasks, tasks own attempts, and
//! attempts sit in day slots linked by ordering dependencies.
//!
//! `model` is the pure scheduling core, `io` talks to the backend and files,
//! `ui` and `app` are the egui front end.

pub mod app;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod ui;

pub use error::{Result, SchedulerError};
