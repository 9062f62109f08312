//! # triage-rs
//!
//! Issue-tracker automation driven by change notifications.
//!
//! A [`engine::Dispatcher`] parses each notification and runs the eligible
//! rules in a fixed order: workload balancing, completion propagation and
//! reporting, keyword escalation, subtask rollup, bug triage and duplicate
//! cleanup. Rules talk to the tracker only through [`store::IssueStore`].

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod model;
pub mod notify;
pub mod report;
pub mod rules;
pub mod server;
pub mod store;
pub mod telemetry;
