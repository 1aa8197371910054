use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use datepick_shared::{DateConfirmedDto, PickerSnapshot};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::date::{CalendarDate, WEEKDAY_LABELS};
use crate::navigator::{self, GridCell, GridCellKind, ViewCursor, ViewKind};
use crate::replay::ReplayRecord;
use crate::validate::ValidationError;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, cells))]
    pub fn print_grid(&mut self, cursor: ViewCursor, cells: &[GridCell]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", navigator::header_label(cursor))?;

        let (headers, columns): (Vec<String>, usize) = match cursor.view {
            ViewKind::Day => (WEEKDAY_LABELS.iter().map(ToString::to_string).collect(), 7),
            ViewKind::Month => (Vec::new(), 3),
            ViewKind::Year => (Vec::new(), 4),
        };

        let painted: Vec<String> = cells.iter().map(|cell| self.paint_cell(cell)).collect();
        let rows = painted.chunks(columns).map(<[String]>::to_vec).collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, snapshot))]
    pub fn print_snapshot(&mut self, snapshot: &PickerSnapshot) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let text = if snapshot.text.is_empty() {
            self.paint(&snapshot.placeholder, "2")
        } else {
            snapshot.text.clone()
        };
        writeln!(out, "text      {text}")?;
        writeln!(out, "cursor    {}", snapshot.cursor)?;
        writeln!(
            out,
            "selected  {}",
            snapshot.selected.clone().unwrap_or_else(|| "-".to_string())
        )?;
        writeln!(
            out,
            "popup     {} ({})",
            if snapshot.open { "open" } else { "closed" },
            snapshot.view.header
        )?;
        writeln!(out, "view      {}", snapshot.view.view)?;
        if snapshot.disabled {
            writeln!(out, "state     {}", self.paint("disabled", "2"))?;
        }
        if let Some(error) = &snapshot.error {
            writeln!(out, "error     {}", self.paint(error, "31"))?;
        }

        Ok(())
    }

    pub fn print_replay_record(&mut self, record: &ReplayRecord) -> anyhow::Result<()> {
        {
            let mut out = io::stdout().lock();
            writeln!(out, "{}", self.paint(&format!("#{} {}", record.step, record.action), "33"))?;
        }
        self.print_snapshot(&record.snapshot)?;
        for event in &record.confirmed {
            self.print_confirmation(event)?;
        }
        Ok(())
    }

    pub fn print_confirmation(&mut self, event: &DateConfirmedDto) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        match &event.date {
            Some(date) => writeln!(out, "confirmed {}", self.paint(date, "32"))?,
            None => writeln!(out, "confirmed {}", self.paint("(cleared)", "32"))?,
        }
        Ok(())
    }

    pub fn print_validation(
        &mut self,
        text: &str,
        result: &Result<Option<CalendarDate>, ValidationError>,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        match result {
            Ok(Some(date)) => writeln!(out, "{text}: {}", self.paint(&date.iso(), "32"))?,
            Ok(None) => writeln!(out, "{}", self.paint("(empty)", "2"))?,
            Err(error) => writeln!(out, "{text}: {}", self.paint(&error.to_string(), "31"))?,
        }
        Ok(())
    }

    fn paint_cell(&self, cell: &GridCell) -> String {
        if cell.kind == GridCellKind::Blank {
            return String::new();
        }
        if cell.selected {
            self.paint(&cell.label, "7")
        } else if cell.disabled {
            self.paint(&cell.label, "2")
        } else if cell.current {
            self.paint(&cell.label, "4")
        } else {
            cell.label.clone()
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// Aligned columns; the header and rule lines are skipped when `headers` is
/// empty.
fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    if !headers.is_empty() {
        for (idx, header) in headers.iter().enumerate() {
            write!(writer, "{:>width$} ", header, width = widths[idx])?;
        }
        writeln!(writer)?;

        for width in &widths {
            write!(writer, "{:-<width$} ", "", width = *width)?;
        }
        writeln!(writer)?;
    }

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", " ".repeat(padding), cell)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{strip_ansi, write_table};

    #[test]
    fn table_right_aligns_painted_cells() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec!["Su".to_string(), "Mo".to_string()],
            vec![
                vec![String::new(), "\x1b[7m1\x1b[0m".to_string()],
                vec!["2".to_string(), "10".to_string()],
            ],
        )
        .expect("write table");

        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().map(|line| line.trim_end()).collect();
        assert_eq!(lines[0], "Su Mo");
        assert_eq!(lines[1], "-- --");
        assert_eq!(strip_ansi(lines[2]), "    1");
        assert_eq!(lines[3], " 2 10");
    }

    #[test]
    fn headerless_tables_have_no_rule() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec![],
            vec![vec!["Jan".to_string(), "Feb".to_string(), "Mar".to_string()]],
        )
        .expect("write table");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "Jan Feb Mar \n");
    }
}
