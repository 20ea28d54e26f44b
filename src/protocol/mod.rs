pub mod codec;
pub mod topics;
