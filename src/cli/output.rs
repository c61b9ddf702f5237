use std::fmt::Write as FmtWrite;

use crate::models::{IndexStats, IngestReport, OutputFormat, QueryMatch};
use crate::services::Provisioned;

pub trait Formatter {
    fn format_ingest_report(&self, report: &IngestReport) -> String;
    fn format_stats(&self, index: &str, stats: &IndexStats) -> String;
    fn format_matches(&self, query: &str, matches: &[QueryMatch]) -> String;
    fn format_provisioned(&self, index: &str, provisioned: Provisioned) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

fn provisioned_message(index: &str, provisioned: Provisioned) -> String {
    match provisioned {
        Provisioned::Created => format!("Created index {index}"),
        Provisioned::AlreadyExists => format!("Index {index} already exists"),
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let preview: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        format!("{}...", preview)
    } else {
        preview
    }
}

pub struct TextFormatter;

impl TextFormatter {
    fn write_stats(output: &mut String, stats: &IndexStats) {
        writeln!(output, "Dimension:     {}", stats.dimension).unwrap();
        writeln!(output, "Fullness:      {:.4}", stats.index_fullness).unwrap();
        writeln!(output, "Total vectors: {}", stats.total_vector_count).unwrap();
        if !stats.namespaces.is_empty() {
            writeln!(output, "Namespaces:").unwrap();
            for (name, ns) in &stats.namespaces {
                writeln!(output, "  {} ({})", name, ns.vector_count).unwrap();
            }
        }
    }
}

impl Formatter for TextFormatter {
    fn format_ingest_report(&self, report: &IngestReport) -> String {
        let mut output = String::new();
        writeln!(output, "Ingestion Complete").unwrap();
        writeln!(output, "------------------").unwrap();
        writeln!(output, "Index:            {}", report.index).unwrap();
        writeln!(output, "Namespace:        {}", report.namespace).unwrap();
        writeln!(output, "Reviews read:     {}", report.reviews_read).unwrap();
        writeln!(output, "Records upserted: {}", report.records_upserted).unwrap();
        writeln!(output, "Dimension:        {}", report.dimension).unwrap();
        writeln!(output, "Duration:         {}ms", report.duration_ms).unwrap();
        if let Some(ref stats) = report.stats {
            writeln!(output).unwrap();
            Self::write_stats(&mut output, stats);
        }
        output
    }

    fn format_stats(&self, index: &str, stats: &IndexStats) -> String {
        let mut output = String::new();
        writeln!(output, "Index Stats: {}", index).unwrap();
        writeln!(output, "-------------{}", "-".repeat(index.len())).unwrap();
        Self::write_stats(&mut output, stats);
        output
    }

    fn format_matches(&self, query: &str, matches: &[QueryMatch]) -> String {
        if matches.is_empty() {
            return format!("No results found for: {}\n", query);
        }

        let mut output = String::new();
        writeln!(output, "Results for: \"{}\"\n", query).unwrap();

        for (i, m) in matches.iter().enumerate() {
            writeln!(output, "{}. {} [Score: {:.3}]", i + 1, m.id, m.score).unwrap();
            if let Some(ref meta) = m.metadata {
                writeln!(output, "   Subject: {}", meta.subject).unwrap();
                writeln!(output, "   Stars:   {}", meta.stars).unwrap();
                writeln!(output, "   ---").unwrap();
                for line in preview(&meta.review, 200).lines() {
                    writeln!(output, "   {}", line).unwrap();
                }
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_provisioned(&self, index: &str, provisioned: Provisioned) -> String {
        format!("{}\n", provisioned_message(index, provisioned))
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, value: &serde_json::Value) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        let mut rendered = rendered.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e));
        rendered.push('\n');
        rendered
    }
}

impl Formatter for JsonFormatter {
    fn format_ingest_report(&self, report: &IngestReport) -> String {
        self.render(&serde_json::to_value(report).unwrap_or_default())
    }

    fn format_stats(&self, index: &str, stats: &IndexStats) -> String {
        self.render(&serde_json::json!({
            "index": index,
            "stats": stats,
        }))
    }

    fn format_matches(&self, query: &str, matches: &[QueryMatch]) -> String {
        self.render(&serde_json::json!({
            "query": query,
            "total": matches.len(),
            "matches": matches,
        }))
    }

    fn format_provisioned(&self, index: &str, provisioned: Provisioned) -> String {
        self.render(&serde_json::json!({
            "index": index,
            "created": provisioned == Provisioned::Created,
        }))
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", serde_json::json!({"message": message}))
    }

    fn format_error(&self, error: &str) -> String {
        format!("{}\n", serde_json::json!({"error": error}))
    }
}

pub struct MarkdownFormatter;

impl MarkdownFormatter {
    fn write_stats(output: &mut String, stats: &IndexStats) {
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Dimension | {} |", stats.dimension).unwrap();
        writeln!(output, "| Fullness | {:.4} |", stats.index_fullness).unwrap();
        writeln!(output, "| Total vectors | {} |", stats.total_vector_count).unwrap();
        for (name, ns) in &stats.namespaces {
            writeln!(output, "| Namespace `{}` | {} |", name, ns.vector_count).unwrap();
        }
    }
}

impl Formatter for MarkdownFormatter {
    fn format_ingest_report(&self, report: &IngestReport) -> String {
        let mut output = String::new();
        writeln!(output, "## Ingestion Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Index | `{}` |", report.index).unwrap();
        writeln!(output, "| Namespace | `{}` |", report.namespace).unwrap();
        writeln!(output, "| Reviews read | {} |", report.reviews_read).unwrap();
        writeln!(output, "| Records upserted | {} |", report.records_upserted).unwrap();
        writeln!(output, "| Dimension | {} |", report.dimension).unwrap();
        writeln!(output, "| Duration | {}ms |", report.duration_ms).unwrap();
        if let Some(ref stats) = report.stats {
            writeln!(output, "\n### Index Stats\n").unwrap();
            Self::write_stats(&mut output, stats);
        }
        output
    }

    fn format_stats(&self, index: &str, stats: &IndexStats) -> String {
        let mut output = String::new();
        writeln!(output, "## Index Stats: `{}`\n", index).unwrap();
        Self::write_stats(&mut output, stats);
        output
    }

    fn format_matches(&self, query: &str, matches: &[QueryMatch]) -> String {
        if matches.is_empty() {
            return format!("## No results found\n\nQuery: `{}`\n", query);
        }

        let mut output = String::new();
        writeln!(output, "## Results\n").unwrap();
        writeln!(output, "**Query:** `{}`\n", query).unwrap();

        for (i, m) in matches.iter().enumerate() {
            writeln!(output, "### {}. {} (score {:.3})\n", i + 1, m.id, m.score).unwrap();
            if let Some(ref meta) = m.metadata {
                writeln!(output, "- **Subject:** {}", meta.subject).unwrap();
                writeln!(output, "- **Stars:** {}\n", meta.stars).unwrap();
                writeln!(output, "> {}\n", meta.review).unwrap();
            }
        }

        output
    }

    fn format_provisioned(&self, index: &str, provisioned: Provisioned) -> String {
        format!("> {}\n", provisioned_message(index, provisioned))
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
