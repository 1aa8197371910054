use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Duration,
  Months,
  NaiveDate
};
use regex::Regex;

use crate::date::CalendarDate;

/// Resolves a configuration date expression against `today`.
///
/// Accepts `today`, `tomorrow`, `yesterday`, a bare 4-digit year, relative
/// offsets such as `+3d`, `-2w`, `+1m` or `-100y`, `YYYY-MM-DD` and
/// `DD/MM/YYYY`.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  today: CalendarDate
) -> anyhow::Result<CalendarDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();
  let base = today.naive();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "tomorrow" => {
      return shift_days(base, 1);
    }
    | "yesterday" => {
      return shift_days(base, -1);
    }
    | _ => {}
  }

  if token.len() == 4
    && token
      .chars()
      .all(|c| c.is_ascii_digit())
  {
    let year: i32 =
      token.parse().context(
        "invalid 4-digit year"
      )?;
    return CalendarDate::from_ymd(
      year, 0, 1
    )
    .ok_or_else(|| {
      anyhow!(
        "invalid year value: {year}"
      )
    });
  }

  let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwmy])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let negative = caps
      .name("sign")
      .map(|m| m.as_str() == "-")
      .ok_or_else(|| {
        anyhow!("missing relative sign")
      })?;
    let num: u32 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;

    let signed = if negative {
      -i64::from(num)
    } else {
      i64::from(num)
    };

    return match unit {
      | "d" => shift_days(base, signed),
      | "w" => {
        shift_days(base, signed * 7)
      }
      | "m" => {
        shift_months(base, num, negative)
      }
      | "y" => {
        let months = num
          .checked_mul(12)
          .ok_or_else(|| {
            anyhow!(
              "relative year offset \
               too large: {num}"
            )
          })?;
        shift_months(
          base, months, negative
        )
      }
      | _ => {
        Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ))
      }
    };
  }

  for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
    if let Ok(date) =
      NaiveDate::parse_from_str(
        token, fmt
      )
    {
      return Ok(CalendarDate::from(
        date
      ));
    }
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: \
     today/tomorrow/yesterday, \
     4-digit year, +Nd/+Nw/+Nm/+Ny, \
     YYYY-MM-DD, DD/MM/YYYY"
  })
}

fn shift_days(
  base: NaiveDate,
  days: i64
) -> anyhow::Result<CalendarDate> {
  base
    .checked_add_signed(Duration::days(
      days
    ))
    .map(CalendarDate::from)
    .ok_or_else(|| {
      anyhow!(
        "date offset out of range: \
         {days} days"
      )
    })
}

/// Month arithmetic clamps to the last day, so 31 March - 1m is 29 February
/// in a leap year.
fn shift_months(
  base: NaiveDate,
  months: u32,
  negative: bool
) -> anyhow::Result<CalendarDate> {
  let shifted = if negative {
    base.checked_sub_months(Months::new(
      months
    ))
  } else {
    base.checked_add_months(Months::new(
      months
    ))
  };
  shifted
    .map(CalendarDate::from)
    .ok_or_else(|| {
      anyhow!(
        "date offset out of range: \
         {months} months"
      )
    })
}
