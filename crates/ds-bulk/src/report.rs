use ds_core::services::bulk::SyncSummary;

/// Render a pass summary as the plain-text report printed by `--once`.
pub fn render_summary(summary: &SyncSummary) -> String {
    let elapsed = (summary.finished_at - summary.started_at)
        .num_milliseconds()
        .max(0);
    let mut out = format!(
        "sync pass at {} ({}.{:03}s)\n",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        elapsed / 1000,
        elapsed % 1000
    );

    let counts = [
        ("created", summary.created),
        ("updated", summary.updated),
        ("deleted", summary.deleted),
        ("failed", summary.failures.len()),
    ];
    for (label, count) in counts {
        out.push_str(&format!("  {label:<8}{count:>4}\n"));
    }

    for failure in &summary.failures {
        out.push_str(&format!("    {}: {}\n", failure.process_guid, failure.error));
    }
    out
}

/// Render a pass summary as pretty JSON.
pub fn render_json(summary: &SyncSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}
