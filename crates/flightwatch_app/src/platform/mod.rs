mod app;
mod cli;
mod config;
mod render;

pub(crate) use app::run;
pub(crate) use cli::CliArgs;
