//! Terminal surface: rendering, export and the interactive prompt.

pub mod charts;
pub mod export;
pub mod interactive;
pub mod setup;
pub mod show;
pub mod ui;
