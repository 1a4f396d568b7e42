//! Application layer: wires the touch surface to the connection session.

pub mod pump_input;

pub use pump_input::{input_channel, InputPump, InputQueue};
