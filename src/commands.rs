use crate::cli::PeriodArgs;
use crate::config::Config;
use crate::drag::{DragCoordinator, DropTarget, MoveOutcome};
use crate::model::{Status, Todo};
use crate::period::Period;
use crate::storage::{
    init_project_store, locate_store, FileStore, KeyValueStore, StoreLocation,
};
use crate::todo_list::{Edit, TodoList};
use crate::ui;
use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use std::env;

pub fn init() -> Result<()> {
    let cwd = env::current_dir()?;
    let location = init_project_store(&cwd)?;
    println!("Initialized planner at {}", location.dir.display());
    Ok(())
}

pub fn show(config: &Config, args: PeriodArgs) -> Result<()> {
    let (list, location) = load_current_list(config, args)?;
    let period = list.period();
    println!(
        "{} ({}, {})",
        period.title(),
        period.key(),
        location.scope.label()
    );
    for day in 0..period.day_count() {
        println!("{} [{}]", period.day_label(day), day);
        let todos = list.planner().todos(day);
        if todos.is_empty() {
            println!("  (empty)");
        }
        for (idx, todo) in todos.into_iter().enumerate() {
            print_todo(idx, todo);
        }
    }
    Ok(())
}

pub fn add(
    config: &Config,
    day: usize,
    text: String,
    status: Option<Status>,
    args: PeriodArgs,
) -> Result<()> {
    let (mut list, _) = load_current_list(config, args)?;
    let status = status.unwrap_or(config.default_status);
    match list.add(day, &text, status)? {
        Some(_) => println!(
            "Added to {}: {} {}",
            list.period().day_label(day),
            status,
            text.trim()
        ),
        None => println!("Nothing added (empty text or day {} not in period)", day),
    }
    Ok(())
}

pub fn edit(config: &Config, day: usize, index: usize, text: String, args: PeriodArgs) -> Result<()> {
    let (mut list, _) = load_current_list(config, args)?;
    match list.update_text(day, index, &text)? {
        Edit::Updated => println!("Updated {}/{}", day, index),
        Edit::Deleted => println!("Deleted {}/{}", day, index),
        Edit::Unchanged => println!("No todo at {}/{}", day, index),
    }
    Ok(())
}

pub fn status(
    config: &Config,
    day: usize,
    index: usize,
    status: Status,
    args: PeriodArgs,
) -> Result<()> {
    let (mut list, _) = load_current_list(config, args)?;
    if list.update_emoji(day, index, status)? {
        println!("Marked {}/{} {} ({})", day, index, status, status.label());
    } else {
        println!("No todo at {}/{}", day, index);
    }
    Ok(())
}

pub fn delete(config: &Config, day: usize, index: usize, args: PeriodArgs) -> Result<()> {
    let (mut list, _) = load_current_list(config, args)?;
    match list.delete(day, index)? {
        Some(todo) => println!("Deleted \"{}\"", todo.text),
        None => println!("No todo at {}/{}", day, index),
    }
    Ok(())
}

pub fn move_todo(
    config: &Config,
    day: usize,
    index: usize,
    to_day: usize,
    before: Option<usize>,
    args: PeriodArgs,
) -> Result<()> {
    let (mut list, _) = load_current_list(config, args)?;
    match move_within(&mut list, day, index, to_day, before)? {
        Some(outcome) => println!(
            "Moved to {} at position {}",
            list.period().day_label(outcome.to_day),
            outcome.position
        ),
        None => println!("Nothing moved"),
    }
    Ok(())
}

/// Runs a drag of `day/index` and drops it in front of `to_day/before`, or at
/// the end of `to_day` when `before` is `None`.
fn move_within<S: KeyValueStore>(
    list: &mut TodoList<S>,
    day: usize,
    index: usize,
    to_day: usize,
    before: Option<usize>,
) -> Result<Option<MoveOutcome>> {
    let target = match before {
        Some(pos) => {
            let anchor = list
                .planner()
                .id_at(to_day, pos)
                .cloned()
                .ok_or_else(|| anyhow!("no todo at {}/{} to move before", to_day, pos))?;
            DropTarget::Todo(anchor)
        }
        None => DropTarget::Day(to_day),
    };
    let mut drag = DragCoordinator::new();
    if !drag.drag_start(list, day, index) {
        bail!("no todo at {}/{}", day, index);
    }
    drag.drop(list, target)
        .with_context(|| format!("moving {}/{} to day {}", day, index, to_day))
}

pub fn tui(config: &Config, args: PeriodArgs) -> Result<()> {
    let (list, location) = load_current_list(config, args)?;
    ui::run(list, location, config, args.offset)
}

fn load_current_list(config: &Config, args: PeriodArgs) -> Result<(TodoList<FileStore>, StoreLocation)> {
    let cwd = env::current_dir()?;
    let location = locate_store(&cwd, config.data_dir.as_deref())?;
    let mode = args.mode.unwrap_or(config.mode);
    let period = Period::resolve(mode, Local::now().date_naive(), args.offset)?;
    let list = TodoList::open(location.open(), period);
    Ok((list, location))
}

fn print_todo(idx: usize, todo: &Todo) {
    let marker = if todo.emoji.is_empty() { " " } else { todo.emoji.as_str() };
    println!("  {}. {} {}", idx, marker, todo.text);
}
