pub mod app;
pub mod cli;
pub mod render;
pub mod state;

pub use app::{AppConfig, Controller, LogSink};
pub use cli::{run, Cli};
