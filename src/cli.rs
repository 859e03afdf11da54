use crate::model::Status;
use crate::period::PeriodMode;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "dayplan", version, about = "Weekly and monthly todo planner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Which period to act on.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PeriodArgs {
    /// Week or month view (defaults to the configured mode)
    #[arg(long, value_enum)]
    pub mode: Option<PeriodMode>,
    /// Periods away from the current one (negative for the past)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub offset: i64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project-local store in the current directory
    Init,
    /// Print the todos of a period
    Show {
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Add a todo to a day
    Add {
        /// Day index within the period (0 = first day)
        day: usize,
        /// Todo text
        text: String,
        /// Status emoji or name (defaults to the configured one)
        #[arg(long)]
        emoji: Option<Status>,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Replace a todo's text; empty text deletes it
    Edit {
        day: usize,
        index: usize,
        text: String,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Set a todo's status (🎯/completed, 🔥/in-progress, 💀/procrastinating)
    Status {
        day: usize,
        index: usize,
        emoji: Status,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Delete a todo
    Delete {
        day: usize,
        index: usize,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Move a todo to another position or day
    Move {
        /// Day holding the todo
        day: usize,
        /// Position of the todo in that day
        index: usize,
        /// Destination day
        to_day: usize,
        /// Insert before this position of the destination day (appends if omitted)
        #[arg(long)]
        before: Option<usize>,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Launch the interactive TUI
    Tui {
        #[command(flatten)]
        period: PeriodArgs,
    },
}
