#![allow(dead_code)]

pub mod recording_executor;

pub use recording_executor::*;
