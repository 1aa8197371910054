use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::controller::{
  DEFAULT_PLACEHOLDER,
  PickerOptions
};
use crate::date::{
  CalendarDate,
  DateBounds
};
use crate::date_expr::parse_date_expr;
use crate::validate::{
  MAX_YEAR,
  MIN_YEAR
};

const RC_ENV_VAR: &str = "DATEPICKRC";
const RC_FILE_NAME: &str =
  ".datepickrc";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Config {
  /// Built-in defaults only; no rc file is read.
  pub fn defaults() -> Self {
    let mut cfg = Config {
      map:          HashMap::new(),
      loaded_files: vec![]
    };

    cfg.map.insert(
      "default.command".to_string(),
      "grid".to_string()
    );
    cfg.map.insert(
      "color".to_string(),
      "on".to_string()
    );
    cfg.map.insert(
      "placeholder".to_string(),
      DEFAULT_PLACEHOLDER.to_string()
    );
    cfg
  }

  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::defaults();

    let rc = resolve_rc_path(
      rc_override
    )?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading datepickrc");
      cfg.load_file(
        &path,
        &mut Vec::new()
      )?;
    } else {
      debug!(
        "no datepickrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  /// Widget options from the `value`, `min_date`, `max_date`, `disabled`
  /// and `placeholder` keys.
  #[tracing::instrument(skip(self))]
  pub fn picker_options(
    &self,
    today: CalendarDate
  ) -> anyhow::Result<PickerOptions> {
    let initial_value = self
      .get_date("value", today)?;
    let min = self
      .get_date("min_date", today)?;
    let max = self
      .get_date("max_date", today)?;

    if let (Some(min), Some(max)) =
      (min, max)
      && min > max
    {
      return Err(anyhow!(
        "min_date {min} is after \
         max_date {max}"
      ));
    }

    let placeholder = self
      .get("placeholder")
      .filter(|p| !p.trim().is_empty())
      .unwrap_or_else(|| {
        DEFAULT_PLACEHOLDER.to_string()
      });

    Ok(PickerOptions {
      initial_value,
      bounds: DateBounds::new(min, max),
      disabled: self
        .get_bool("disabled")
        .unwrap_or(false),
      placeholder
    })
  }

  fn get_date(
    &self,
    key: &str,
    today: CalendarDate
  ) -> anyhow::Result<Option<CalendarDate>>
  {
    let Some(raw) = self.map.get(key)
    else {
      return Ok(None);
    };
    if raw.trim().is_empty() {
      return Ok(None);
    }
    let date = parse_date_expr(
      raw, today
    )
    .with_context(|| {
      format!(
        "invalid {key} setting: {raw}"
      )
    })?;
    if !(MIN_YEAR..=MAX_YEAR)
      .contains(&date.year())
    {
      return Err(anyhow!(
        "{key} setting {raw} resolves \
         to {date}, outside years \
         {MIN_YEAR}-{MAX_YEAR}"
      ));
    }
    Ok(Some(date))
  }

  /// `chain` holds the canonical paths of the files currently being read,
  /// outermost first.
  #[tracing::instrument(skip(
    self, chain
  ))]
  fn load_file(
    &mut self,
    path: &Path,
    chain: &mut Vec<PathBuf>
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    let canonical =
      fs::canonicalize(&path)
        .unwrap_or_else(|_| {
          path.clone()
        });
    if chain.contains(&canonical) {
      return Err(anyhow!(
        "include cycle at {}",
        path.display()
      ));
    }
    chain.push(canonical);

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self.load_file(
            &include_path,
            chain
          )?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    chain.pop();
    Ok(())
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping datepickrc"
    );
    return Ok(None);
  };
  let candidate =
    home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::tempdir;

  use super::Config;
  use crate::date::CalendarDate;

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

  #[test]
  fn loads_rc_file_with_include() {
    let temp = tempdir().expect("tempdir");
    let extra = temp.path().join("bounds.rc");
    fs::write(
      &extra,
      "min_date = 1900-01-01\nmax_date = today # inclusive\n"
    )
    .expect("write include");
    let rc = temp.path().join("datepickrc");
    fs::write(
      &rc,
      "# widget defaults\ninclude bounds.rc\nvalue=15/08/1990\ndisabled = yes\n"
    )
    .expect("write rc");

    let cfg = Config::load(Some(&rc))
      .expect("load config");
    assert_eq!(cfg.loaded_files.len(), 2);

    let today = date(2026, 9, 16);
    let options = cfg
      .picker_options(today)
      .expect("options");
    assert_eq!(
      options.initial_value,
      Some(date(1990, 7, 15))
    );
    assert_eq!(
      options.bounds.min,
      Some(date(1900, 0, 1))
    );
    assert_eq!(
      options.bounds.max,
      Some(today)
    );
    assert!(options.disabled);
    assert_eq!(
      options.placeholder,
      "DD/MM/YYYY"
    );
  }

  #[test]
  fn overrides_strip_rc_prefix() {
    let mut cfg = Config::defaults();
    cfg.apply_overrides([(
      "rc.min_date".to_string(),
      "+1d".to_string()
    )]);
    let options = cfg
      .picker_options(date(2026, 9, 16))
      .expect("options");
    assert_eq!(
      options.bounds.min,
      Some(date(2026, 9, 17))
    );
    assert_eq!(
      cfg.get("default.command")
        .as_deref(),
      Some("grid")
    );
  }

  #[test]
  fn rejects_inverted_bounds() {
    let mut cfg = Config::defaults();
    cfg.apply_overrides([
      (
        "min_date".to_string(),
        "2025-01-01".to_string()
      ),
      (
        "max_date".to_string(),
        "2024-01-01".to_string()
      )
    ]);
    assert!(
      cfg
        .picker_options(date(2026, 9, 16))
        .is_err()
    );
  }

  #[test]
  fn rejects_dates_beyond_editable_years() {
    let today = date(2026, 9, 16);
    for (key, value) in [
      ("value", "+8000y"),
      ("min_date", "1899-12-31"),
      ("max_date", "2101-01-01")
    ] {
      let mut cfg = Config::defaults();
      cfg.apply_overrides([(
        key.to_string(),
        value.to_string()
      )]);
      assert!(
        cfg.picker_options(today).is_err(),
        "{key}={value} accepted"
      );
    }

    let mut cfg = Config::defaults();
    cfg.apply_overrides([(
      "max_date".to_string(),
      "2100-12-31".to_string()
    )]);
    assert!(
      cfg.picker_options(today).is_ok()
    );
  }

  #[test]
  fn include_cycles_are_errors() {
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("rc");
    fs::write(&rc, "include rc
")
      .expect("write rc");
    let err = Config::load(Some(&rc))
      .expect_err("self include");
    assert!(
      format!("{err:#}")
        .contains("include cycle")
    );

    let first = temp.path().join("first");
    let second =
      temp.path().join("second");
    fs::write(
      &first,
      "color = off
include second
"
    )
    .expect("write first");
    fs::write(&second, "include first
")
      .expect("write second");
    assert!(
      Config::load(Some(&first)).is_err()
    );
  }

  #[test]
  fn repeated_includes_are_not_cycles() {
    let temp = tempdir().expect("tempdir");
    let shared =
      temp.path().join("shared.rc");
    fs::write(&shared, "color = off
")
      .expect("write shared");
    let rc = temp.path().join("rc");
    fs::write(
      &rc,
      "include shared.rc
include shared.rc
"
    )
    .expect("write rc");
    let cfg = Config::load(Some(&rc))
      .expect("load config");
    assert_eq!(cfg.loaded_files.len(), 3);
    assert_eq!(
      cfg.get("color").as_deref(),
      Some("off")
    );
  }

  #[test]
  fn rejects_lines_without_equals() {
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("broken");
    fs::write(&rc, "min_date 2024-01-01\n")
      .expect("write rc");
    assert!(Config::load(Some(&rc)).is_err());
  }
}
