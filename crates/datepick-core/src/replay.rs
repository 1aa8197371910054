//! Gesture scripts: a TOML list of steps driven through one [`DatePicker`].
//!
//! ```toml
//! [[steps]]
//! action = "type"
//! text = "15081990"
//!
//! [[steps]]
//! action = "click"
//! cell = { kind = "year", value = 2030 }
//! ```

use std::fs;
use std::path::Path;
use std::sync::mpsc::Receiver;

use anyhow::Context;
use datepick_shared::{DateConfirmedDto, PickerSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::clock::Clock;
use crate::controller::{DateConfirmed, DatePicker, PostCommitAction, QuickAction};
use crate::navigator::{GridCellKind, NavDirection, ViewKind};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReplayStep {
    /// Keystrokes appended one at a time, each followed by a flush.
    Type { text: String },
    /// A raw field edit, as when pasting or deleting.
    Text {
        raw: String,
        #[serde(default)]
        cursor: Option<usize>,
    },
    Enter,
    Blur,
    Click { cell: GridCellKind },
    Navigate { direction: NavDirection },
    View { view: ViewKind },
    Quick { quick: QuickAction },
    Open,
    Close,
    Toggle,
    SetValue { value: String },
    Clear,
    Enable,
    Disable,
}

impl ReplayStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Type { .. } => "type",
            Self::Text { .. } => "text",
            Self::Enter => "enter",
            Self::Blur => "blur",
            Self::Click { .. } => "click",
            Self::Navigate { .. } => "navigate",
            Self::View { .. } => "view",
            Self::Quick { .. } => "quick",
            Self::Open => "open",
            Self::Close => "close",
            Self::Toggle => "toggle",
            Self::SetValue { .. } => "set_value",
            Self::Clear => "clear",
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub steps: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("failed to parse replay script")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}

/// State after one step, plus whatever confirmations it produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayRecord {
    pub step: usize,
    pub action: &'static str,
    pub snapshot: PickerSnapshot,
    pub confirmed: Vec<DateConfirmedDto>,
}

/// Appends each character to the field text as a keystroke and flushes the
/// deferred work after every one. Returns the last flush.
pub fn feed_keystrokes<C: Clock>(picker: &mut DatePicker<C>, keys: &str) -> Vec<PostCommitAction> {
    let mut last = Vec::new();
    for key in keys.chars() {
        let mut raw = picker.current_formatted_text();
        raw.push(key);
        let caret = raw.chars().count();
        picker.on_text_changed(&raw, caret);
        last = picker.flush_post_commit();
    }
    last
}

pub fn apply_step<C: Clock>(picker: &mut DatePicker<C>, step: &ReplayStep) {
    match step {
        ReplayStep::Type { text } => {
            feed_keystrokes(picker, text);
        }
        ReplayStep::Text { raw, cursor } => {
            let caret = cursor.unwrap_or_else(|| raw.chars().count());
            picker.on_text_changed(raw, caret);
            picker.flush_post_commit();
        }
        ReplayStep::Enter => picker.on_enter_pressed(),
        ReplayStep::Blur => picker.on_blur(),
        ReplayStep::Click { cell } => picker.on_grid_cell_clicked(*cell),
        ReplayStep::Navigate { direction } => picker.on_navigate(*direction),
        ReplayStep::View { view } => picker.on_view_switch(*view),
        ReplayStep::Quick { quick } => picker.on_quick_action(*quick),
        ReplayStep::Open => picker.open_popup(),
        ReplayStep::Close => picker.close_popup(),
        ReplayStep::Toggle => picker.toggle_popup(),
        ReplayStep::SetValue { value } => picker.set_value_str(value),
        ReplayStep::Clear => picker.clear(),
        ReplayStep::Enable => picker.enable(),
        ReplayStep::Disable => picker.disable(),
    }
}

#[instrument(skip_all, fields(steps = script.steps.len()))]
pub fn run_script<C: Clock>(
    picker: &mut DatePicker<C>,
    events: &Receiver<DateConfirmed>,
    script: &ReplayScript,
) -> Vec<ReplayRecord> {
    info!(instance = %picker.instance_id(), "replaying gesture script");
    let mut records = Vec::with_capacity(script.steps.len());

    for (idx, step) in script.steps.iter().enumerate() {
        apply_step(picker, step);
        let confirmed: Vec<DateConfirmedDto> =
            events.try_iter().map(DateConfirmedDto::from).collect();
        debug!(step = idx + 1, action = step.name(), confirmed = confirmed.len(), "replayed step");
        records.push(ReplayRecord {
            step: idx + 1,
            action: step.name(),
            snapshot: picker.snapshot(),
            confirmed,
        });
    }

    records
}
