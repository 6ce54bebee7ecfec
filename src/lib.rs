#![allow(clippy::needless_return)]

pub mod config;
pub mod logging;
