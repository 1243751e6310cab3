//! `export` and `charts` commands: write pipeline output to disk.

use std::path::Path;

use anyhow::Context;

use crate::load_dashboard;

/// Write the analyzed table, sorted like the explorer, as CSV to `out`.
///
/// # Errors
///
/// Returns an error if the input cannot be analyzed or `out` cannot be written.
pub(crate) fn run_export(file: &Path, out: &Path) -> anyhow::Result<()> {
    let dashboard = load_dashboard(file, 0)?;
    std::fs::write(out, &dashboard.export)
        .with_context(|| format!("failed to write {}", out.display()))?;

    tracing::info!(rows = dashboard.explorer.rows.len(), path = %out.display(), "wrote export");
    println!(
        "wrote {} rows to {}",
        dashboard.explorer.rows.len(),
        out.display()
    );
    Ok(())
}

/// Write `platform_comparison.svg`, `engagement_trends.svg` and
/// `content_length.svg` into `out_dir`, creating it if needed.
///
/// # Errors
///
/// Returns an error if the input cannot be analyzed or a file cannot be written.
pub(crate) fn run_charts(file: &Path, out_dir: &Path) -> anyhow::Result<()> {
    let dashboard = load_dashboard(file, 0)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    for (stem, svg) in dashboard.charts.named() {
        let path = out_dir.join(format!("{stem}.svg"));
        std::fs::write(&path, svg)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}
