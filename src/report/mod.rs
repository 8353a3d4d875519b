use crate::results::EventResults;
use crate::voting::{percentage, PollResult};
use std::fmt::Write;

const BAR_WIDTH: u64 = 20;

pub fn render_event(event_results: &EventResults) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Event Results: {} (ID: {})\n",
        event_results.event.title, event_results.event.id
    );

    if event_results.results.is_empty() {
        out.push_str("No polls found for this event.\n");
        return out;
    }

    for result in &event_results.results {
        out.push_str(&render_result(result));
        out.push('\n');
    }
    out
}

pub fn render_result(result: &PollResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", result.question);
    let _ = writeln!(
        out,
        "{} - {}",
        result.kind.as_str().to_uppercase(),
        result.summary
    );

    for row in &result.rows {
        let pct = percentage(row.value, row.total);
        let _ = writeln!(out, "  {}  {} {} ({}%)", row.label, row.value, result.unit, pct);
        let _ = writeln!(out, "  [{}]", bar(pct));
    }
    out
}

fn bar(pct: u64) -> String {
    let filled = (pct.min(100) * BAR_WIDTH / 100) as usize;
    format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH as usize - filled)
    )
}
