//! Dispatch engine: turns one change notification into rule runs.

pub mod dispatch;

pub use dispatch::{Ack, DispatchReport, Dispatcher, RuleRun};
