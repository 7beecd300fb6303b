#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc)]

pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod tui;
