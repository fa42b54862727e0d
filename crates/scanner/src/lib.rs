pub mod classify;
pub mod source;
