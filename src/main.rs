mod analyzer;
mod ast;
mod cli;
mod driver;
mod errors;
mod graphs;
mod lexer;
mod listing;
mod parser;
mod scope;
mod types;
mod utils;

use crate::cli::Cli;
use crate::driver::process_file;
use crate::errors::IplResult;
use crate::utils::Config;
use clap::Parser;
use console::style;
use directories::ProjectDirs;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::fmt::time;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

fn init_tracing() {
    let fmt_layer = fmt::layer()
        .pretty()
        .with_timer(time::UtcTime::rfc_3339());

    Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt_layer)
        .init();
}

fn load_config() -> IplResult<Config> {
    let proj_dirs = ProjectDirs::from("dev", "ipl-analyzer", "ipl")
        .ok_or("Unable to determine project directories")?;

    let config_dir = proj_dirs.config_dir();
    fs::create_dir_all(config_dir)?;

    Config::load(config_dir)
}

fn main() -> ExitCode {
    init_tracing();

    tracing::debug!("CLI starting up");
    let cli = Cli::parse();

    if cli.files.is_empty() {
        eprintln!("usage: ipl FILE...");
        return ExitCode::from(1);
    }

    let mut config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}: {err}", style("error").red().bold());
            return ExitCode::from(1);
        }
    };
    if let Some(dir) = cli.out_dir {
        config.output.out_dir = dir;
    }
    if cli.no_render {
        config.graphviz.render_png = false;
    }

    // Files are processed to completion one after another; the process exit
    // code is the worst per-file status.
    let mut status = 0u8;
    for file in &cli.files {
        match process_file(Path::new(file), &config) {
            Ok(file_status) => status = status.max(file_status.code()),
            Err(err) => {
                eprintln!("{}: {file}: {err}", style("error").red().bold());
                status = status.max(1);
            }
        }
    }
    ExitCode::from(status)
}
