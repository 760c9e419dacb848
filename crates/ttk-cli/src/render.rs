//! Fixed-width table rendering for reports.

/// Renders a padded text table with a header row, data rows, and a footer.
///
/// Column widths are computed from the widest cell in each column. Cells are
/// left-aligned with a two-space gutter; trailing whitespace is trimmed from
/// every line.
pub fn render_table(headers: &[&str], rows: &[Vec<String>], footer: &[String]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    for (i, cell) in footer.iter().enumerate() {
        widths[i] = widths[i].max(cell.chars().count());
    }

    let mut out = String::new();
    push_row(&mut out, &widths, headers);
    for row in rows {
        push_row(&mut out, &widths, row);
    }
    push_row(&mut out, &widths, footer);
    out
}

fn push_row<S: AsRef<str>>(out: &mut String, widths: &[usize], cells: &[S]) {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        let cell = cell.as_ref();
        line.push_str(cell);
        let padding = widths[i].saturating_sub(cell.chars().count());
        line.push_str(&" ".repeat(padding));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}
