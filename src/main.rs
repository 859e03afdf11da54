mod cli;
mod commands;
mod config;
mod drag;
mod logging;
mod model;
mod period;
mod storage;
mod todo_list;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let _log_guard = logging::init_file_logging();
    let config = config::Config::load()?;
    let command = args.command.unwrap_or(cli::Command::Tui {
        period: cli::PeriodArgs::default(),
    });
    match command {
        cli::Command::Init => commands::init(),
        cli::Command::Show { period } => commands::show(&config, period),
        cli::Command::Add {
            day,
            text,
            emoji,
            period,
        } => commands::add(&config, day, text, emoji, period),
        cli::Command::Edit {
            day,
            index,
            text,
            period,
        } => commands::edit(&config, day, index, text, period),
        cli::Command::Status {
            day,
            index,
            emoji,
            period,
        } => commands::status(&config, day, index, emoji, period),
        cli::Command::Delete { day, index, period } => {
            commands::delete(&config, day, index, period)
        }
        cli::Command::Move {
            day,
            index,
            to_day,
            before,
            period,
        } => commands::move_todo(&config, day, index, to_day, before, period),
        cli::Command::Tui { period } => commands::tui(&config, period),
    }
}
