use std::path::PathBuf;

use anyhow::{Context, anyhow};
use datepick_shared::{DateConfirmedDto, GridCellDto};
use tracing::{debug, info, instrument};

use crate::cli::Invocation;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::controller::{DatePicker, PickerOptions, PostCommitAction};
use crate::date::CalendarDate;
use crate::navigator::{self, GridContext, ViewCursor, ViewKind};
use crate::render::Renderer;
use crate::replay::{self, ReplayScript};
use crate::validate::validate;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "type", "validate", "grid", "replay", "show", "commands", "help", "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(cfg, renderer, inv))]
pub fn dispatch(
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
    json: bool,
) -> anyhow::Result<()> {
    let clock = SystemClock;
    let command = inv.command.as_str();

    debug!(command, args = ?inv.command_args, json, "dispatching command");

    match command {
        "type" => cmd_type(cfg, renderer, &inv.command_args, json, clock),
        "validate" => cmd_validate(cfg, renderer, &inv.command_args, clock),
        "grid" => cmd_grid(cfg, renderer, &inv.command_args, json, clock),
        "replay" => cmd_replay(cfg, renderer, &inv.command_args, json, clock),
        "show" => cmd_show(cfg),
        "commands" => cmd_commands(),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(cfg, renderer, args, clock))]
fn cmd_type<C: Clock>(
    cfg: &Config,
    renderer: &mut Renderer,
    args: &[String],
    json: bool,
    clock: C,
) -> anyhow::Result<()> {
    info!("command type");

    let keys = args.join("");
    if keys.is_empty() {
        return Err(anyhow!("type requires the text to enter"));
    }

    let options = cfg.picker_options(clock.today())?;
    let (mut picker, events) = DatePicker::with_clock(options, clock);

    let last = replay::feed_keystrokes(&mut picker, &keys);
    if !last.contains(&PostCommitAction::ValidateComplete) {
        picker.on_enter_pressed();
    }

    let snapshot = picker.snapshot();
    let confirmed: Vec<DateConfirmedDto> = events.try_iter().map(DateConfirmedDto::from).collect();

    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
        for event in &confirmed {
            println!("{}", serde_json::to_string(event)?);
        }
        return Ok(());
    }

    renderer.print_snapshot(&snapshot)?;
    for event in &confirmed {
        renderer.print_confirmation(event)?;
    }
    Ok(())
}

#[instrument(skip(cfg, renderer, args, clock))]
fn cmd_validate<C: Clock>(
    cfg: &Config,
    renderer: &mut Renderer,
    args: &[String],
    clock: C,
) -> anyhow::Result<()> {
    info!("command validate");

    let text = args.join(" ");
    let options = cfg.picker_options(clock.today())?;
    let result = validate(&text, &options.bounds);
    renderer.print_validation(&text, &result)?;

    result
        .map(|_| ())
        .with_context(|| format!("rejected date text: {text}"))
}

#[instrument(skip(cfg, renderer, args, clock))]
fn cmd_grid<C: Clock>(
    cfg: &Config,
    renderer: &mut Renderer,
    args: &[String],
    json: bool,
    clock: C,
) -> anyhow::Result<()> {
    info!("command grid");

    let today = clock.today();
    let options = cfg.picker_options(today)?;
    let cursor = grid_cursor(args, &options, today)?;
    let ctx = GridContext {
        selected: options.initial_value,
        bounds: options.bounds,
        today,
    };
    let cells = navigator::grid_cells(cursor.view, cursor, &ctx);

    if json {
        let dto: Vec<GridCellDto> = cells.iter().map(GridCellDto::from).collect();
        println!("{}", serde_json::to_string(&dto)?);
        return Ok(());
    }

    renderer.print_grid(cursor, &cells)
}

/// `[year|month|day] [YYYY] [MM]`, focused on the configured value or today.
fn grid_cursor(
    args: &[String],
    options: &PickerOptions,
    today: CalendarDate,
) -> anyhow::Result<ViewCursor> {
    let mut cursor = ViewCursor::new(options.initial_value.unwrap_or(today));
    cursor.view = ViewKind::Day;

    let mut rest = args.iter().peekable();
    if let Some(token) = rest.peek()
        && let Some(kind) = ViewKind::from_key(token)
    {
        cursor.view = kind;
        rest.next();
    }

    if let Some(year) = rest.next() {
        cursor.focus_year = year
            .parse()
            .with_context(|| format!("invalid grid year: {year}"))?;
    }

    if let Some(month) = rest.next() {
        let month: u32 = month
            .parse()
            .with_context(|| format!("invalid grid month: {month}"))?;
        if !(1..=12).contains(&month) {
            return Err(anyhow!("grid month must be 1-12, got {month}"));
        }
        cursor.focus_month = month - 1;
    }

    if let Some(extra) = rest.next() {
        return Err(anyhow!("unexpected grid argument: {extra}"));
    }

    Ok(cursor)
}

#[instrument(skip(cfg, renderer, args, clock))]
fn cmd_replay<C: Clock>(
    cfg: &Config,
    renderer: &mut Renderer,
    args: &[String],
    json: bool,
    clock: C,
) -> anyhow::Result<()> {
    info!("command replay");

    let [path] = args else {
        return Err(anyhow!("replay requires exactly one script path"));
    };
    let script = ReplayScript::load(&PathBuf::from(path))?;

    let options = cfg.picker_options(clock.today())?;
    let (mut picker, events) = DatePicker::with_clock(options, clock);
    let records = replay::run_script(&mut picker, &events, &script);

    for record in &records {
        if json {
            println!("{}", serde_json::to_string(record)?);
        } else {
            renderer.print_replay_record(record)?;
        }
    }

    Ok(())
}

fn cmd_commands() -> anyhow::Result<()> {
    for command in known_command_names() {
        println!("{command}");
    }
    Ok(())
}

fn cmd_show(cfg: &Config) -> anyhow::Result<()> {
    let mut entries: Vec<_> = cfg.iter().collect();
    entries.sort();
    for (k, v) in entries {
        println!("{k}={v}");
    }
    for path in &cfg.loaded_files {
        println!("# loaded {}", path.display());
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "Commands: type <text>, validate <text>, grid [year|month|day] [YYYY] [MM], replay <script.toml>, show, commands, help, version"
    );
    Ok(())
}
