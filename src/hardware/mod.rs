pub mod firmware;
pub mod output;
