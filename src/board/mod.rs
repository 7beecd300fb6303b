#![forbid(unsafe_code)]

pub mod color;
pub mod engine;
pub mod handoff;
pub mod model;
pub mod schedule;
