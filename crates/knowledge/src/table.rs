//! Flat-text rendering of the knowledge table.
//!
//! Columns are right-justified to the widest cell (measured in characters)
//! and separated by a single space, header line first. Control characters
//! inside cells are escaped so every row stays on one line.

use crate::loader::{KnowledgeRow, QUERY_COLUMN, RESPONSE_COLUMN};

/// Render rows as a column-aligned table. Deterministic for a given input.
pub fn render(rows: &[KnowledgeRow]) -> String {
    let cells: Vec<[String; 2]> = rows
        .iter()
        .map(|row| [escape(&row.user_query), escape(&row.chatbot_response)])
        .collect();

    let width = |col: usize, header: &str| {
        cells
            .iter()
            .map(|c| c[col].chars().count())
            .chain(std::iter::once(header.chars().count()))
            .max()
            .unwrap_or(0)
    };
    let widths = [width(0, QUERY_COLUMN), width(1, RESPONSE_COLUMN)];

    if cells.is_empty() {
        return format!("{QUERY_COLUMN} {RESPONSE_COLUMN}");
    }

    let mut lines = Vec::with_capacity(cells.len() + 1);
    lines.push(line(&[QUERY_COLUMN, RESPONSE_COLUMN], &widths));
    for row in &cells {
        lines.push(line(&[row[0].as_str(), row[1].as_str()], &widths));
    }
    lines.join("\n")
}

fn line(cells: &[&str; 2], widths: &[usize; 2]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| pad_left(cell, *width))
        .collect::<Vec<_>>()
        .join(" ")
}

fn pad_left(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    let mut out = String::with_capacity(cell.len() + width.saturating_sub(len));
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(len)));
    out.push_str(cell);
    out
}

fn escape(cell: &str) -> String {
    cell.replace('\r', "\\r")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}
