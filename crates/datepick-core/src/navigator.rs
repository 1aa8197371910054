use serde::{
  Deserialize,
  Serialize
};

use crate::date::{
  CalendarDate,
  DateBounds,
  days_in_month,
  first_weekday,
  month_name,
  month_short_name
};

pub const YEAR_PAGE: i32 = 12;
const YEARS_BEFORE_FOCUS: i32 = 6;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
  Year,
  Month,
  Day
}

impl ViewKind {
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Year => "year",
      | Self::Month => "month",
      | Self::Day => "day"
    }
  }

  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "year" | "years" => {
        Some(Self::Year)
      }
      | "month" | "months" => {
        Some(Self::Month)
      }
      | "day" | "days" => Some(Self::Day),
      | _ => None
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NavDirection {
  Prev,
  Next
}

impl NavDirection {
  fn sign(self) -> i32 {
    match self {
      | Self::Prev => -1,
      | Self::Next => 1
    }
  }
}

/// Which grid the popup shows and the year/month it is focused on.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct ViewCursor {
  pub view:        ViewKind,
  pub focus_year:  i32,
  pub focus_month: u32
}

impl ViewCursor {
  pub fn new(
    focus: CalendarDate
  ) -> Self {
    Self {
      view:        ViewKind::Year,
      focus_year:  focus.year(),
      focus_month: focus.month0()
    }
  }

  pub fn first_listed_year(
    self
  ) -> i32 {
    self
      .focus_year
      .saturating_sub(YEARS_BEFORE_FOCUS)
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(
  tag = "kind",
  content = "value",
  rename_all = "lowercase"
)]
pub enum GridCellKind {
  Blank,
  Year(i32),
  Month(u32),
  Day(u32)
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct GridCell {
  pub kind:     GridCellKind,
  pub label:    String,
  pub selected: bool,
  pub disabled: bool,
  /// Current year, current month or today, depending on the grid.
  pub current:  bool
}

impl GridCell {
  fn blank() -> Self {
    Self {
      kind:     GridCellKind::Blank,
      label:    String::new(),
      selected: false,
      disabled: true,
      current:  false
    }
  }
}

/// Inputs shared by every grid.
#[derive(Debug, Clone, Copy)]
pub struct GridContext {
  pub selected: Option<CalendarDate>,
  pub bounds:   DateBounds,
  pub today:    CalendarDate
}

pub fn select_year(
  cursor: ViewCursor,
  year: i32
) -> ViewCursor {
  ViewCursor {
    view: ViewKind::Month,
    focus_year: year,
    ..cursor
  }
}

pub fn select_month(
  cursor: ViewCursor,
  month0: u32
) -> Option<ViewCursor> {
  if month0 > 11 {
    return None;
  }
  Some(ViewCursor {
    view: ViewKind::Day,
    focus_month: month0,
    ..cursor
  })
}

pub fn select_day(
  cursor: ViewCursor,
  day: u32
) -> Option<CalendarDate> {
  CalendarDate::from_ymd(
    cursor.focus_year,
    cursor.focus_month,
    day
  )
}

pub fn switch_view(
  cursor: ViewCursor,
  view: ViewKind
) -> ViewCursor {
  ViewCursor { view, ..cursor }
}

pub fn navigate(
  cursor: ViewCursor,
  direction: NavDirection
) -> ViewCursor {
  let sign = direction.sign();
  match cursor.view {
    | ViewKind::Year => {
      ViewCursor {
        focus_year: cursor
          .focus_year
          .saturating_add(
            sign * YEAR_PAGE
          ),
        ..cursor
      }
    }
    | ViewKind::Month => {
      ViewCursor {
        focus_year: cursor
          .focus_year
          .saturating_add(sign),
        ..cursor
      }
    }
    | ViewKind::Day => {
      let (focus_year, focus_month) =
        shift_month(
          cursor.focus_year,
          cursor.focus_month,
          sign
        );
      ViewCursor {
        focus_year,
        focus_month,
        ..cursor
      }
    }
  }
}

fn shift_month(
  year: i32,
  month0: u32,
  step: i32
) -> (i32, u32) {
  let mut year = year;
  let mut month = month0 as i32 + step;

  while month < 0 {
    month += 12;
    year = year.saturating_sub(1);
  }
  while month > 11 {
    month -= 12;
    year = year.saturating_add(1);
  }

  (year, month as u32)
}

pub fn grid_cells(
  kind: ViewKind,
  cursor: ViewCursor,
  ctx: &GridContext
) -> Vec<GridCell> {
  match kind {
    | ViewKind::Year => {
      year_grid(cursor, ctx)
    }
    | ViewKind::Month => {
      month_grid(cursor, ctx)
    }
    | ViewKind::Day => {
      day_grid(cursor, ctx)
    }
  }
}

pub fn year_grid(
  cursor: ViewCursor,
  ctx: &GridContext
) -> Vec<GridCell> {
  let start = cursor.first_listed_year();
  (0..YEAR_PAGE)
    .map(|offset| {
      let year =
        start.saturating_add(offset);
      GridCell {
        kind:     GridCellKind::Year(
          year
        ),
        label:    year.to_string(),
        selected: ctx.selected.is_some_and(
          |date| date.year() == year
        ),
        disabled: ctx
          .bounds
          .year_disabled(year),
        current:  ctx.today.year()
          == year
      }
    })
    .collect()
}

pub fn month_grid(
  cursor: ViewCursor,
  ctx: &GridContext
) -> Vec<GridCell> {
  let year = cursor.focus_year;
  (0..12_u32)
    .map(|month0| {
      GridCell {
        kind:     GridCellKind::Month(
          month0
        ),
        label:    month_short_name(
          month0
        )
        .to_string(),
        selected: ctx.selected.is_some_and(
          |date| {
            date.year() == year
              && date.month0() == month0
          }
        ),
        disabled: ctx
          .bounds
          .month_disabled(year, month0),
        current:  ctx.today.year() == year
          && ctx.today.month0() == month0
      }
    })
    .collect()
}

pub fn day_grid(
  cursor: ViewCursor,
  ctx: &GridContext
) -> Vec<GridCell> {
  let year = cursor.focus_year;
  let month0 = cursor.focus_month;
  let Some(leading) =
    first_weekday(year, month0)
  else {
    tracing::warn!(
      year,
      month0,
      "focus month is not representable; empty day grid"
    );
    return Vec::new();
  };
  let total = days_in_month(year, month0);

  let mut cells = Vec::with_capacity(
    (leading + total) as usize
  );
  cells.extend(
    (0..leading).map(|_| GridCell::blank())
  );

  for day in 1..=total {
    let date = CalendarDate::from_ymd(
      year, month0, day
    );
    cells.push(GridCell {
      kind:     GridCellKind::Day(day),
      label:    day.to_string(),
      selected: date.is_some()
        && ctx.selected == date,
      disabled: date.is_none_or(|date| {
        !ctx.bounds.contains(date)
      }),
      current:  date == Some(ctx.today)
    });
  }

  cells
}

/// Popup header text for the active view.
pub fn header_label(
  cursor: ViewCursor
) -> String {
  match cursor.view {
    | ViewKind::Year => {
      let start =
        cursor.first_listed_year();
      format!(
        "{start} - {}",
        start.saturating_add(
          YEAR_PAGE - 1
        )
      )
    }
    | ViewKind::Month => {
      cursor.focus_year.to_string()
    }
    | ViewKind::Day => {
      format!(
        "{} {}",
        month_name(cursor.focus_month),
        cursor.focus_year
      )
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(
    year: i32,
    month0: u32,
    day: u32
  ) -> CalendarDate {
    CalendarDate::from_ymd(
      year, month0, day
    )
    .expect("valid date")
  }

  fn ctx(
    selected: Option<CalendarDate>,
    bounds: DateBounds
  ) -> GridContext {
    GridContext {
      selected,
      bounds,
      today: date(2026, 9, 16)
    }
  }

  #[test]
  fn year_grid_spans_twelve_years_around_focus() {
    let cursor =
      ViewCursor::new(date(2026, 9, 16));
    let cells = year_grid(
      cursor,
      &ctx(
        Some(date(2024, 0, 1)),
        DateBounds::new(
          None,
          Some(date(2025, 5, 1))
        )
      )
    );

    assert_eq!(cells.len(), 12);
    assert_eq!(
      cells[0].kind,
      GridCellKind::Year(2020)
    );
    assert_eq!(
      cells[11].kind,
      GridCellKind::Year(2031)
    );
    assert!(cells[4].selected);
    assert!(cells[6].current);
    assert!(!cells[5].disabled);
    assert!(cells[6].disabled);
  }

  #[test]
  fn month_grid_flags_bounds_by_whole_month() {
    let cursor = select_year(
      ViewCursor::new(date(2026, 9, 16)),
      2026
    );
    let cells = month_grid(
      cursor,
      &ctx(
        Some(date(2026, 3, 9)),
        DateBounds::new(
          Some(date(2026, 2, 31)),
          None
        )
      )
    );

    assert_eq!(cells.len(), 12);
    assert_eq!(cells[0].label, "Jan");
    assert!(cells[1].disabled);
    assert!(!cells[2].disabled);
    assert!(cells[3].selected);
    assert!(cells[9].current);
  }

  #[test]
  fn day_grid_pads_to_first_weekday() {
    // February 2024 starts on a Thursday and has 29 days.
    let cursor = ViewCursor {
      view:        ViewKind::Day,
      focus_year:  2024,
      focus_month: 1
    };
    let cells = day_grid(
      cursor,
      &ctx(
        Some(date(2024, 1, 29)),
        DateBounds::new(
          Some(date(2024, 1, 10)),
          None
        )
      )
    );

    assert_eq!(cells.len(), 4 + 29);
    assert!(
      cells[..4]
        .iter()
        .all(|cell| cell.kind
          == GridCellKind::Blank)
    );
    assert_eq!(
      cells[4].kind,
      GridCellKind::Day(1)
    );
    assert!(cells[4].disabled);
    assert!(!cells[13].disabled);
    assert!(cells[32].selected);
    assert!(!cells.iter().any(|c| c.current));
  }

  #[test]
  fn day_grid_marks_today() {
    let cursor = ViewCursor {
      view:        ViewKind::Day,
      focus_year:  2026,
      focus_month: 9
    };
    let cells = day_grid(
      cursor,
      &ctx(None, DateBounds::default())
    );
    let today = cells
      .iter()
      .find(|cell| cell.current)
      .expect("today present");
    assert_eq!(
      today.kind,
      GridCellKind::Day(16)
    );
  }

  #[test]
  fn navigation_steps_depend_on_view() {
    let cursor =
      ViewCursor::new(date(2026, 0, 5));
    assert_eq!(
      navigate(cursor, NavDirection::Next)
        .focus_year,
      2038
    );

    let months =
      switch_view(cursor, ViewKind::Month);
    assert_eq!(
      navigate(months, NavDirection::Prev)
        .focus_year,
      2025
    );

    let days =
      switch_view(cursor, ViewKind::Day);
    let back =
      navigate(days, NavDirection::Prev);
    assert_eq!(
      (back.focus_year, back.focus_month),
      (2025, 11)
    );
    let forward = navigate(
      ViewCursor {
        focus_month: 11,
        ..days
      },
      NavDirection::Next
    );
    assert_eq!(
      (
        forward.focus_year,
        forward.focus_month
      ),
      (2027, 0)
    );
  }

  #[test]
  fn selecting_cells_walks_down_the_views() {
    let cursor =
      ViewCursor::new(date(2026, 9, 16));
    let months = select_year(cursor, 2030);
    assert_eq!(months.view, ViewKind::Month);
    assert_eq!(months.focus_year, 2030);
    assert_eq!(months.focus_month, 9);

    let days = select_month(months, 1)
      .expect("valid month");
    assert_eq!(days.view, ViewKind::Day);
    assert_eq!(
      select_day(days, 28),
      Some(date(2030, 1, 28))
    );
    assert_eq!(select_day(days, 29), None);
    assert_eq!(select_month(days, 12), None);
  }

  #[test]
  fn view_switch_keeps_focus() {
    let cursor = ViewCursor {
      view:        ViewKind::Day,
      focus_year:  1999,
      focus_month: 4
    };
    let years =
      switch_view(cursor, ViewKind::Year);
    assert_eq!(years.view, ViewKind::Year);
    assert_eq!(years.focus_month, 4);
    assert_eq!(years.focus_year, 1999);
  }

  #[test]
  fn headers_follow_view() {
    let cursor =
      ViewCursor::new(date(2026, 9, 16));
    assert_eq!(
      header_label(cursor),
      "2020 - 2031"
    );
    assert_eq!(
      header_label(switch_view(
        cursor,
        ViewKind::Month
      )),
      "2026"
    );
    assert_eq!(
      header_label(switch_view(
        cursor,
        ViewKind::Day
      )),
      "October 2026"
    );
  }
}
