pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod controller;
pub mod date;
pub mod date_expr;
pub mod mask;
pub mod navigator;
pub mod render;
pub mod replay;
pub mod validate;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use clock::{
  Clock,
  SystemClock
};
pub use controller::{
  DateConfirmed,
  DatePicker,
  PickerOptions,
  PostCommitAction,
  QuickAction
};
pub use date::{
  CalendarDate,
  DateBounds
};
pub use navigator::{
  GridCell,
  GridCellKind,
  NavDirection,
  ViewCursor,
  ViewKind
};
pub use validate::{
  ValidationError,
  validate
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting datepick CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.rcfile.as_deref()
  )
  .context(
    "failed to load datepick \
     configuration"
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let mut renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &cfg,
    &mut renderer,
    inv,
    cli.json
  )?;

  info!("done");
  Ok(())
}
