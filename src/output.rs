//! CLI output formatting for batch results.
//!
//! # Key-First Display
//!
//! Every listed key gets a header line (positional index + key) followed by
//! indented context lines describing what happened to it. The final line is
//! a one-line tally.
//!
//! ```text
//! Batch images/image/ (3 keys)
//! 001 image/a.jpg
//!     → image/a.jpg_processed.jpg (100x50)
//! 002 image/a.jpg_processed.jpg
//!     Skipped: already processed
//! 003 image/b.jpg
//!     Failed at decode: malformed image: missing BM signature
//!
//! Processed 1, failed 1, skipped 1
//! ```
//!
//! `format_*` functions return `Vec<String>` and do no I/O; `print_*`
//! wrappers write to stdout.

use crate::batch::{BatchResult, ItemOutcome, ItemStatus, SkipReason};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn skip_reason_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::AlreadyProcessed => "already processed",
        SkipReason::CompanionExists => "processed copy exists",
    }
}

/// Context lines for one item, without its header.
fn item_lines(item: &ItemOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    match &item.status {
        ItemStatus::Succeeded {
            processed_key,
            width,
            height,
            notified,
        } => {
            lines.push(format!(
                "{}\u{2192} {} ({}x{})",
                indent(1),
                processed_key,
                width,
                height
            ));
            if !notified {
                lines.push(format!("{}Notification: failed", indent(1)));
            }
        }
        ItemStatus::Failed {
            stage,
            message,
            duplicate,
            ..
        } => {
            lines.push(format!("{}Failed at {}: {}", indent(1), stage, message));
            if let Some(record) = duplicate {
                lines.push(format!(
                    "{}Duplicate: {} and {} both remain",
                    indent(1),
                    record.original_key,
                    record.processed_key
                ));
            }
        }
        ItemStatus::Skipped { reason } => {
            lines.push(format!("{}Skipped: {}", indent(1), skip_reason_label(*reason)));
        }
    }
    lines
}

/// Format a finished batch as display lines.
pub fn format_batch_result(result: &BatchResult) -> Vec<String> {
    let summary = &result.summary;
    let mut lines = vec![format!(
        "Batch {}/{} ({} keys)",
        summary.container,
        summary.prefix,
        summary.items.len()
    )];

    for (i, item) in summary.items.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), item.key));
        lines.extend(item_lines(item));
    }

    lines.push(String::new());
    lines.push(format!(
        "Processed {}, failed {}, skipped {}",
        summary.succeeded, summary.failed, summary.skipped
    ));
    lines
}

/// Print batch output to stdout.
pub fn print_batch_result(result: &BatchResult) {
    for line in format_batch_result(result) {
        println!("{}", line);
    }
}
