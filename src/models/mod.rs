pub mod channel;
pub mod light_state;
