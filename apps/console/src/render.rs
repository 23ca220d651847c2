//! Plain-text rendering of table views and validation failures.

use client_core::{
    form::FieldError,
    table::{SortDirection, TableView},
};

const EMPTY_PLACEHOLDER: &str = "No results.";

pub fn render_table(view: &TableView) -> String {
    let headers: Vec<String> = view
        .headers
        .iter()
        .map(|header| match header.sorted {
            Some(SortDirection::Ascending) => format!("{} ^", header.label),
            Some(SortDirection::Descending) => format!("{} v", header.label),
            None => header.label.to_string(),
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &view.rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, "   ", &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_line(&mut out, "   ", &rule, &widths);

    if view.rows.is_empty() {
        out.push_str(EMPTY_PLACEHOLDER);
        out.push('\n');
    }
    for row in &view.rows {
        let marker = if row.selected { "[x]" } else { "[ ]" };
        push_line(&mut out, marker, &row.cells, &widths);
    }

    out.push_str(&format!(
        "{}  Page {} of {}\n",
        view.summary,
        view.page_index + 1,
        view.page_count
    ));
    out
}

fn push_line(out: &mut String, marker: &str, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    let line = format!("{marker} {}", padded.join(" | "));
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn describe_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|err| format!("  - {err}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
