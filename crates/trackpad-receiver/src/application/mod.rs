//! Application layer: the dispatcher boundary.

pub mod dispatch_events;

pub use dispatch_events::{Dispatcher, TracingDispatcher};
