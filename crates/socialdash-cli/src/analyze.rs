//! `analyze` command: summary cards, cluster view and top explorer rows.

use std::fmt::Write as _;
use std::path::Path;

use socialdash_analytics::{run_dashboard, DashboardContext, DashboardOutcome, TableView};

use crate::load_dashboard;

/// Print the dashboard for `file`, or the upload prompt when no file is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or analyzed.
pub(crate) fn run_analyze(file: Option<&Path>, cluster: u8, top: usize) -> anyhow::Result<()> {
    let Some(path) = file else {
        if let DashboardOutcome::AwaitingUpload { message } =
            run_dashboard(&DashboardContext::default())?
        {
            println!("{message}");
        }
        return Ok(());
    };

    let dashboard = load_dashboard(path, cluster)?;

    for card in &dashboard.cards {
        println!("{:<22}{}", card.label, card.value);
    }
    println!();

    let cluster_rows = dashboard.cluster.table.rows.len();
    println!(
        "Cluster {} ({cluster_rows} post{})",
        dashboard.cluster.selected,
        if cluster_rows == 1 { "" } else { "s" }
    );
    print!("{}", render_table(&dashboard.cluster.table, None));
    println!();

    println!(
        "Top {} of {} posts by engagement rate",
        top.min(dashboard.explorer.rows.len()),
        dashboard.explorer.rows.len()
    );
    print!("{}", render_table(&dashboard.explorer, Some(top)));

    Ok(())
}

/// Left-aligned text table, each column as wide as its widest cell.
pub(crate) fn render_table(view: &TableView, limit: Option<usize>) -> String {
    let rows = &view.rows[..limit.map_or(view.rows.len(), |n| n.min(view.rows.len()))];

    let mut widths: Vec<usize> = view.columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_line = |cells: &[String]| {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        // Infallible for String.
        let _ = writeln!(out, "{}", line.trim_end());
    };

    push_line(&view.columns);
    for row in rows {
        push_line(row);
    }
    out
}
