// A set of helper structs for common operations
//
// Austin Shafer - 2023
pub mod timing;
#[macro_use]
pub mod logging;
pub mod fdwatch;
pub mod log;

extern crate anyhow;
pub use anyhow::{anyhow, Context, Error, Result};
