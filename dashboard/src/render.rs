use speedcore::bulk::BulkDeleteReport;
use speedcore::detection::{DetectionRecord, Direction, ObjectTypeOptions};
use speedcore::DetectionBoard;
use std::fmt::Write;

/// One-line caption for a detection, as shown over its image.
pub fn image_title(record: &DetectionRecord) -> String {
    format!(
        "{} - {:.1} km/h - {} - {}",
        or_default(&record.object_type, "Vehicle"),
        record.speed_kmh,
        or_default(&record.object_color, "Unknown"),
        record.direction
    )
}

/// Plain-text table of the displayed detections.
pub fn detection_table(records: &[DetectionRecord]) -> String {
    if records.is_empty() {
        return "No detections found\n".into();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<19}  {:>7}  {:>5}  {:<4}  {:<12}  {:<3}  {:<8}  {:>6}  {}",
        "TIME", "KM/H", "LIMIT", "", "TYPE", "DIR", "COLOR", "CONF", "IMAGE"
    );
    for record in records {
        let flag = if record.is_violation { "!!" } else { "ok" };
        let arrow = match record.direction {
            Direction::L2R => "->",
            Direction::R2L => "<-",
            Direction::Unknown => "?",
        };
        let _ = writeln!(
            out,
            "{:<19}  {:>7.1}  {:>5}  {:<4}  {:<12}  {:<3}  {:<8}  {:>6}  {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.speed_kmh,
            record.speed_limit,
            flag,
            or_default(&record.object_type, "Vehicle"),
            arrow,
            or_default(&record.object_color, "Unknown"),
            confidence(record.confidence),
            record.selection_key().unwrap_or("-")
        );
    }
    out
}

/// Footer line: how many rows are shown and how many are selected.
pub fn board_summary(board: &DetectionBoard) -> String {
    let summary = board.summary();
    format!(
        "{} of {} detections shown | {}{}",
        board.displayed().len(),
        board.records().len(),
        summary.label,
        if summary.bulk_enabled {
            " | delete enabled"
        } else {
            ""
        }
    )
}

/// Dry-run listing: each pending id with the caption of the row it came from.
pub fn pending_deletes(board: &DetectionBoard, ids: &[String]) -> Vec<String> {
    ids.iter()
        .map(|id| {
            let caption = board
                .displayed()
                .iter()
                .find(|record| record.selection_key() == Some(id.as_str()))
                .map(image_title);
            match caption {
                Some(caption) => format!("  {id}  ({caption})"),
                None => format!("  {id}"),
            }
        })
        .collect()
}

/// Notification lines for a finished bulk delete.
pub fn delete_report(report: &BulkDeleteReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.success_count > 0 {
        lines.push(format!(
            "Successfully deleted {} detection{}",
            report.success_count,
            plural(report.success_count)
        ));
    }
    if report.error_count > 0 {
        lines.push(format!(
            "Failed to delete {} detection{}",
            report.error_count,
            plural(report.error_count)
        ));
        for failure in report.failures() {
            lines.push(format!(
                "  {}: {}",
                failure.image_file,
                failure.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }
    lines
}

pub fn object_type_options(options: &ObjectTypeOptions) -> String {
    let mut out = String::from("All Types\n");
    for object_type in &options.types {
        let _ = writeln!(out, "{} ({})", ObjectTypeOptions::label(object_type), object_type);
    }
    out
}

fn confidence(value: f64) -> String {
    if value > 0.0 {
        format!("{:.1}%", value * 100.0)
    } else {
        "N/A".into()
    }
}

fn plural(count: usize) -> &'static str {
    if count > 1 {
        "s"
    } else {
        ""
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
