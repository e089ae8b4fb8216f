//! Built-in shell profiles.

pub mod cmd;
pub mod posix;
