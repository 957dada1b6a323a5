// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-width text tables.
//!
//! Column widths are measured on the raw cell text; colors are applied
//! afterwards so escape codes never skew alignment.

use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Paint {
    Plain,
    Muted,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Column {
    header: &'static str,
    align: Align,
    paint: Paint,
    max: Option<usize>,
}

impl Column {
    pub fn left(header: &'static str) -> Self {
        Self { header, align: Align::Left, paint: Paint::Plain, max: None }
    }

    pub fn right(header: &'static str) -> Self {
        Self { align: Align::Right, ..Self::left(header) }
    }

    /// Left-aligned, rendered in the muted color
    pub fn muted(header: &'static str) -> Self {
        Self { paint: Paint::Muted, ..Self::left(header) }
    }

    /// Left-aligned, colored by [`crate::color::status`]
    pub fn status(header: &'static str) -> Self {
        Self { paint: Paint::Status, ..Self::left(header) }
    }

    /// Truncate cells longer than `max` characters with an ellipsis.
    pub fn with_max(mut self, max: usize) -> Self {
        self.max = Some(max.max(1));
        self
    }

    fn fit(&self, cell: &str) -> String {
        match self.max {
            Some(max) if cell.chars().count() > max => {
                let kept: String = cell.chars().take(max - 1).collect();
                format!("{kept}…")
            }
            _ => cell.to_string(),
        }
    }
}

pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Add a row. Missing cells render empty; extra cells are ignored.
    pub fn row(&mut self, cells: Vec<String>) {
        let fitted = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| col.fit(cells.get(i).map(String::as_str).unwrap_or("")))
            .collect();
        self.rows.push(fitted);
    }

    pub fn render(&self, out: &mut dyn Write) {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                self.rows
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(col.header.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let headers: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, &w)| crate::color::header(&pad(col.header, w, col.align)))
            .collect();
        let _ = writeln!(out, "{}", headers.join("  ").trim_end());

        for row in &self.rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .zip(row)
                .map(|((col, &w), cell)| {
                    let padding = " ".repeat(w.saturating_sub(cell.chars().count()));
                    let painted = match col.paint {
                        Paint::Plain => cell.clone(),
                        Paint::Muted => crate::color::muted(cell),
                        Paint::Status => crate::color::status(cell),
                    };
                    match col.align {
                        Align::Left => format!("{painted}{padding}"),
                        Align::Right => format!("{padding}{painted}"),
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join("  ").trim_end());
        }
    }
}

fn pad(text: &str, width: usize, align: Align) -> String {
    match align {
        Align::Left => format!("{text:<width$}"),
        Align::Right => format!("{text:>width$}"),
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
