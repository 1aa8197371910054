use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use datepick_shared::{DateConfirmedDto, GridCellDto, PickerSnapshot, ViewStateDto};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::date::{CalendarDate, DateBounds};
use crate::date_expr::parse_date_expr;
use crate::mask::MaskState;
use crate::navigator::{
    self, GridCell, GridCellKind, GridContext, NavDirection, ViewCursor, ViewKind,
};
use crate::validate::{MAX_YEAR, MIN_YEAR, ValidationError, validate};

pub const ERROR_NOTICE_TTL: Duration = Duration::from_secs(3);
pub const DEFAULT_PLACEHOLDER: &str = "DD/MM/YYYY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOptions {
    pub initial_value: Option<CalendarDate>,
    pub bounds: DateBounds,
    pub disabled: bool,
    pub placeholder: String,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            initial_value: None,
            bounds: DateBounds::default(),
            disabled: false,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

/// Sent once for every accepted date and every clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateConfirmed {
    pub instance: Uuid,
    pub date: Option<CalendarDate>,
}

impl From<DateConfirmed> for DateConfirmedDto {
    fn from(event: DateConfirmed) -> Self {
        Self {
            instance: event.instance,
            date: event.date.map(CalendarDate::iso),
        }
    }
}

/// Work the presentation layer performs after committing a gesture's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCommitAction {
    PlaceCursor(usize),
    ValidateComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickAction {
    Today,
    Clear,
}

#[derive(Debug, Clone)]
struct ErrorNotice {
    error: ValidationError,
    expires_at: Instant,
}

/// One date-input widget: masked text, popup navigation and the selection.
pub struct DatePicker<C: Clock = SystemClock> {
    id: Uuid,
    bounds: DateBounds,
    placeholder: String,
    disabled: bool,
    mask: MaskState,
    view: ViewCursor,
    selected: Option<CalendarDate>,
    open: bool,
    notice: Option<ErrorNotice>,
    pending: Vec<PostCommitAction>,
    events: Sender<DateConfirmed>,
    clock: C,
}

impl DatePicker<SystemClock> {
    pub fn new(options: PickerOptions) -> (Self, Receiver<DateConfirmed>) {
        Self::with_clock(options, SystemClock)
    }
}

impl<C: Clock> DatePicker<C> {
    pub fn with_clock(options: PickerOptions, clock: C) -> (Self, Receiver<DateConfirmed>) {
        let (tx, rx) = mpsc::channel();
        let id = Uuid::new_v4();
        let initial_value = options.initial_value.filter(|date| {
            let representable = is_representable(*date);
            if !representable {
                debug!(instance = %id, %date, "initial value outside the editable years; ignoring");
            }
            representable
        });
        let mask = initial_value
            .map(|date| MaskState::from_text(&date.display_text()))
            .unwrap_or_default();
        let view = ViewCursor::new(clock.today());

        info!(
            instance = %id,
            initial = ?initial_value,
            min = ?options.bounds.min,
            max = ?options.bounds.max,
            disabled = options.disabled,
            "created date picker"
        );

        let picker = Self {
            id,
            bounds: options.bounds,
            placeholder: options.placeholder,
            disabled: options.disabled,
            mask,
            view,
            selected: initial_value,
            open: false,
            notice: None,
            pending: Vec::new(),
            events: tx,
            clock,
        };
        (picker, rx)
    }

    pub fn instance_id(&self) -> Uuid {
        self.id
    }

    #[instrument(skip(self), fields(instance = %self.id))]
    pub fn on_text_changed(&mut self, raw: &str, cursor: usize) {
        if self.disabled {
            debug!("picker disabled; ignoring text change");
            return;
        }

        // A newer edit supersedes whatever the previous gesture queued.
        self.pending.clear();
        let caret = self.mask.apply(raw, cursor);
        self.pending.push(PostCommitAction::PlaceCursor(caret));
        if self.mask.is_complete() {
            self.pending.push(PostCommitAction::ValidateComplete);
        }
        debug!(text = %self.mask.formatted(), caret, "masked text updated");
    }

    /// Runs the deferred work queued by the last gesture.
    ///
    /// Call once the presentation has committed the new text. Returns the
    /// actions in queue order so the caller can place the caret.
    pub fn flush_post_commit(&mut self) -> Vec<PostCommitAction> {
        let actions = std::mem::take(&mut self.pending);
        for action in &actions {
            if *action == PostCommitAction::ValidateComplete {
                debug!(instance = %self.id, "all digits typed; validating");
                self.commit_text();
            }
        }
        actions
    }

    pub fn on_enter_pressed(&mut self) {
        if self.disabled {
            return;
        }
        self.commit_text();
    }

    pub fn on_blur(&mut self) {
        if self.disabled {
            return;
        }
        self.commit_text();
    }

    #[instrument(skip(self), fields(instance = %self.id))]
    pub fn on_grid_cell_clicked(&mut self, kind: GridCellKind) {
        if self.disabled {
            return;
        }

        match kind {
            GridCellKind::Blank => {}
            GridCellKind::Year(year) => {
                if self.bounds.year_disabled(year) {
                    debug!(year, "year outside bounds; ignoring click");
                    return;
                }
                self.view = navigator::select_year(self.view, year);
            }
            GridCellKind::Month(month0) => {
                if self.bounds.month_disabled(self.view.focus_year, month0) {
                    debug!(month0, "month outside bounds; ignoring click");
                    return;
                }
                match navigator::select_month(self.view, month0) {
                    Some(view) => self.view = view,
                    None => warn!(month0, "month index out of range"),
                }
            }
            GridCellKind::Day(day) => match navigator::select_day(self.view, day) {
                Some(date) if self.bounds.contains(date) => self.select_date(date),
                Some(date) => debug!(%date, "day outside bounds; ignoring click"),
                None => warn!(day, "day does not exist in focused month"),
            },
        }
    }

    pub fn on_navigate(&mut self, direction: NavDirection) {
        if self.disabled {
            return;
        }
        self.view = navigator::navigate(self.view, direction);
        debug!(instance = %self.id, ?direction, view = ?self.view, "navigated");
    }

    pub fn on_view_switch(&mut self, kind: ViewKind) {
        if self.disabled {
            return;
        }
        self.view = navigator::switch_view(self.view, kind);
    }

    #[instrument(skip(self), fields(instance = %self.id))]
    pub fn on_quick_action(&mut self, action: QuickAction) {
        if self.disabled {
            return;
        }

        match action {
            QuickAction::Today => {
                let today = self.clock.today();
                if !self.bounds.contains(today) {
                    debug!(%today, "today lies outside the bounds; selecting it anyway");
                }
                self.select_date(today);
            }
            QuickAction::Clear => {
                self.reset_selection();
                self.open = false;
            }
        }
    }

    pub fn current_formatted_text(&self) -> String {
        self.mask.formatted()
    }

    pub fn current_cursor(&self) -> usize {
        self.mask.cursor()
    }

    /// The active error notice, if it has not yet expired.
    pub fn current_error(&self) -> Option<&ValidationError> {
        let now = self.clock.now();
        self.notice
            .as_ref()
            .filter(|notice| notice.expires_at > now)
            .map(|notice| &notice.error)
    }

    /// Drops an expired notice; returns true when one was removed.
    pub fn dismiss_expired_error(&mut self) -> bool {
        let now = self.clock.now();
        if self
            .notice
            .as_ref()
            .is_some_and(|notice| notice.expires_at <= now)
        {
            self.notice = None;
            return true;
        }
        false
    }

    pub fn current_view_state(&self) -> ViewCursor {
        self.view
    }

    pub fn grid_cells(&self, kind: ViewKind) -> Vec<GridCell> {
        navigator::grid_cells(kind, self.view, &self.grid_context())
    }

    pub fn header_label(&self) -> String {
        navigator::header_label(self.view)
    }

    pub fn selected_date(&self) -> Option<CalendarDate> {
        self.selected
    }

    pub fn bounds(&self) -> DateBounds {
        self.bounds
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Replaces the selection without emitting. Dates whose year the text
    /// field cannot hold are ignored.
    pub fn set_value(&mut self, date: CalendarDate) {
        if !is_representable(date) {
            debug!(instance = %self.id, %date, "value outside the editable years; ignoring");
            return;
        }
        self.selected = Some(date);
        self.mask = MaskState::from_text(&date.display_text());
        debug!(instance = %self.id, %date, "value set externally");
    }

    /// Like [`Self::set_value`] for untyped input; anything that is not a date
    /// is ignored.
    pub fn set_value_str(&mut self, raw: &str) {
        match parse_date_expr(raw, self.clock.today()) {
            Ok(date) => self.set_value(date),
            Err(err) => debug!(instance = %self.id, raw, error = %err, "ignoring non-date value"),
        }
    }

    pub fn clear(&mut self) {
        self.reset_selection();
    }

    pub fn enable(&mut self) {
        self.disabled = false;
    }

    pub fn disable(&mut self) {
        self.disabled = true;
        self.open = false;
        self.pending.clear();
    }

    /// Opens the popup on the year grid.
    pub fn open_popup(&mut self) {
        if self.disabled {
            return;
        }
        self.open = true;
        self.view = navigator::switch_view(self.view, ViewKind::Year);
    }

    pub fn close_popup(&mut self) {
        self.open = false;
    }

    pub fn toggle_popup(&mut self) {
        if self.open {
            self.close_popup();
        } else {
            self.open_popup();
        }
    }

    pub fn snapshot(&self) -> PickerSnapshot {
        PickerSnapshot {
            instance: self.id,
            text: self.current_formatted_text(),
            cursor: self.current_cursor(),
            placeholder: self.placeholder.clone(),
            error: self.current_error().map(ToString::to_string),
            selected: self.selected.map(CalendarDate::iso),
            open: self.open,
            disabled: self.disabled,
            view: ViewStateDto {
                view: self.view.view.as_key().to_string(),
                focus_year: self.view.focus_year,
                focus_month: self.view.focus_month,
                header: self.header_label(),
            },
            cells: self
                .grid_cells(self.view.view)
                .iter()
                .map(GridCellDto::from)
                .collect(),
        }
    }

    fn grid_context(&self) -> GridContext {
        GridContext {
            selected: self.selected,
            bounds: self.bounds,
            today: self.clock.today(),
        }
    }

    #[instrument(skip(self), fields(instance = %self.id))]
    fn commit_text(&mut self) {
        // Committing now covers any validation the last keystroke deferred.
        self.pending
            .retain(|action| *action != PostCommitAction::ValidateComplete);

        let text = self.mask.formatted();
        match validate(&text, &self.bounds) {
            Ok(Some(date)) => self.select_date(date),
            Ok(None) => {
                self.selected = None;
                self.notice = None;
                self.emit(None);
            }
            Err(error) => self.show_error(error),
        }
    }

    fn select_date(&mut self, date: CalendarDate) {
        self.selected = Some(date);
        self.mask = MaskState::from_text(&date.display_text());
        self.notice = None;
        self.open = false;
        self.emit(Some(date));
    }

    fn reset_selection(&mut self) {
        self.selected = None;
        self.mask = MaskState::default();
        self.notice = None;
        self.pending.clear();
        self.emit(None);
    }

    fn show_error(&mut self, error: ValidationError) {
        warn!(instance = %self.id, %error, "rejected date input");
        self.notice = Some(ErrorNotice {
            error,
            expires_at: self.clock.now() + ERROR_NOTICE_TTL,
        });
    }

    fn emit(&self, date: Option<CalendarDate>) {
        info!(instance = %self.id, date = ?date, "date confirmed");
        if self
            .events
            .send(DateConfirmed {
                instance: self.id,
                date,
            })
            .is_err()
        {
            debug!(instance = %self.id, "confirmation receiver dropped");
        }
    }
}

fn is_representable(date: CalendarDate) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

impl From<&GridCell> for GridCellDto {
    fn from(cell: &GridCell) -> Self {
        let (kind, value) = match cell.kind {
            GridCellKind::Blank => ("blank", None),
            GridCellKind::Year(year) => ("year", Some(year)),
            GridCellKind::Month(month0) => ("month", i32::try_from(month0).ok()),
            GridCellKind::Day(day) => ("day", i32::try_from(day).ok()),
        };
        Self {
            kind: kind.to_string(),
            value,
            label: cell.label.clone(),
            selected: cell.selected,
            disabled: cell.disabled,
            current: cell.current,
        }
    }
}
