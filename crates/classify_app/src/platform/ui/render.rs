use classify_core::{AppViewModel, Phase, TableView};

const MAX_CELL_WIDTH: usize = 48;

/// Text frame for the interactive session.
pub fn render(view: &AppViewModel) -> String {
    let mut lines = vec!["== Log Classification ==".to_string()];

    let file = view.file_name.as_deref().unwrap_or("(none)");
    lines.push(format!(
        "File: {file}   {} {}",
        control("select", view.file_selector_enabled),
        control("classify", view.classify_enabled)
    ));
    lines.push(format!("Status: {}", status_text(view)));
    if let Some(next) = &view.deferred_file_name {
        lines.push(format!("Next file: {next} (applies when the current run finishes)"));
    }

    if let Some(error) = &view.error_banner {
        lines.push(format!("! {error}"));
    }

    if let Some(table) = &view.table {
        lines.push(String::new());
        lines.push(format!("Classification Result ({} rows)", table.rows.len()));
        lines.push(render_table(table));
    }

    if view.actions_visible {
        let download = match (view.download_name, view.download_len) {
            (Some(name), Some(len)) => {
                format!("[download {name} ({} bytes)]", format_with_commas(len as u64))
            }
            _ => "[download]".to_string(),
        };
        lines.push(String::new());
        lines.push(format!("Are you satisfied with the result?  {download} [regenerate]"));
    }

    lines.join("\n")
}

fn control(label: &str, enabled: bool) -> String {
    if enabled {
        format!("[{label}]")
    } else {
        format!("({label})")
    }
}

fn status_text(view: &AppViewModel) -> String {
    match view.phase {
        Phase::Idle => "Select a CSV file to begin".to_string(),
        Phase::Ready => "Ready".to_string(),
        Phase::Busy => match view.received_bytes {
            Some(bytes) if bytes > 0 => {
                format!("Classifying... ({} bytes received)", format_with_commas(bytes))
            }
            _ => "Classifying...".to_string(),
        },
        Phase::Succeeded => "Done".to_string(),
        Phase::Failed => "Failed".to_string(),
    }
}

/// Render headers and rows as aligned columns. Ragged rows are drawn as they are.
pub fn render_table(table: &TableView) -> String {
    let headers: Vec<String> = table.headers.iter().map(|cell| display_cell(cell)).collect();
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| display_cell(cell)).collect())
        .collect();

    let column_count = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0usize; column_count];
    for row in std::iter::once(&headers).chain(rows.iter()) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(format_row(&headers, &widths));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &rows {
        out.push(format_row(row, &widths));
    }
    out.join("\n")
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

fn display_cell(cell: &str) -> String {
    let flat: String = cell
        .chars()
        .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
        .collect();
    if flat.chars().count() > MAX_CELL_WIDTH {
        let mut cut: String = flat.chars().take(MAX_CELL_WIDTH - 1).collect();
        cut.push('…');
        cut
    } else {
        flat
    }
}

fn format_with_commas(value: u64) -> String {
    let mut out = String::new();
    for (i, ch) in value.to_string().chars().rev().enumerate() {
        if i != 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}
