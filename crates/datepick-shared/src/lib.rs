use serde::{
  Deserialize,
  Serialize
};
use uuid::Uuid;

/// One grid cell as a presentation layer draws it.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct GridCellDto {
  /// `blank`, `year`, `month` or `day`.
  pub kind:     String,
  /// Year, zero-based month or day of month; absent for blanks.
  pub value:    Option<i32>,
  pub label:    String,
  pub selected: bool,
  pub disabled: bool,
  pub current:  bool
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct ViewStateDto {
  pub view:        String,
  pub focus_year:  i32,
  pub focus_month: u32,
  pub header:      String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct PickerSnapshot {
  pub instance:    Uuid,
  pub text:        String,
  pub cursor:      usize,
  pub placeholder: String,
  #[serde(default)]
  pub error:       Option<String>,
  /// Selected date as `YYYY-MM-DD`.
  #[serde(default)]
  pub selected:    Option<String>,
  pub open:        bool,
  pub disabled:    bool,
  pub view:        ViewStateDto,
  #[serde(default)]
  pub cells:       Vec<GridCellDto>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
  PartialEq, Eq,
)]
pub struct DateConfirmedDto {
  pub instance: Uuid,
  /// `YYYY-MM-DD`, absent when the widget was cleared.
  pub date:     Option<String>
}
