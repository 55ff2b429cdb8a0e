//! Table and JSON rendering for command results.

use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;

use logbench_core::{BenchmarkRun, InitializeResponse, LogListResponse};

/// Longest content preview shown in a table cell.
const CONTENT_PREVIEW_CHARS: usize = 80;

/// Output format shared by the listing and bench commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    /// Human-readable table.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
}

/// Prints any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    let header: Vec<Cell> = header.iter().map(|c| Cell::new(c).fg(Color::Cyan)).collect();
    table.set_header(header);
    table
}

/// Print a page of records.
pub fn print_logs(response: &LogListResponse, format: Format) -> anyhow::Result<()> {
    if format == Format::Json {
        return print_json(response);
    }
    if response.data.is_empty() {
        println!("{}", "No results.".dimmed());
    } else {
        println!("{}", logs_table(response));
    }
    println!(
        "{} {} of {} ({} total, {})",
        "Page".bold(),
        response.page,
        response.total_pages,
        response.total,
        response.query_duration
    );
    Ok(())
}

fn logs_table(response: &LogListResponse) -> Table {
    let mut table = new_table(&["id", "created_at", "domain", "action", "user_id", "content"]);
    for record in &response.data {
        table.add_row(vec![
            Cell::new(record.id),
            Cell::new(record.created_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&record.domain),
            Cell::new(&record.action),
            Cell::new(record.user_id),
            Cell::new(preview(&record.content.to_text())),
        ]);
    }
    table
}

fn preview(text: &str) -> String {
    if text.chars().count() <= CONTENT_PREVIEW_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(CONTENT_PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

/// Print the outcome of a bulk load.
pub fn print_initialize(response: &InitializeResponse, format: Format) -> anyhow::Result<()> {
    if format == Format::Json {
        return print_json(response);
    }
    println!("\n{}", response.message.green().bold());
    println!("   Inserted:   {}", response.inserted_count);
    println!("   Content:    {}", response.content_size);
    println!("   Duration:   {}", response.duration);
    println!("   Throughput: {} records/sec", response.records_per_second);
    Ok(())
}

/// Print one or more benchmark runs.
pub fn print_bench(runs: &[BenchmarkRun], format: Format) -> anyhow::Result<()> {
    if format == Format::Json {
        return print_json(runs);
    }
    for run in runs {
        let content = run
            .content_size
            .map_or_else(|| "existing".to_string(), |s| s.to_string());
        println!(
            "\n{} {} records ({}), common '{}', rare '{}'",
            "Dataset".bold(),
            run.dataset_size,
            content,
            run.terms.common,
            run.terms.rare
        );
        if let Some(seed) = &run.seed {
            println!(
                "   Seeded {} records in {:.2}s ({:.0} records/sec)",
                seed.inserted,
                seed.elapsed.as_secs_f64(),
                seed.throughput()
            );
        }
        println!("{}", bench_table(run));
        for skipped in &run.skipped {
            println!("   {} {}: {}", "skipped".yellow(), skipped.name, skipped.error);
        }
    }
    Ok(())
}

fn bench_table(run: &BenchmarkRun) -> Table {
    let mut table = new_table(&["Type", "Case", "Limit", "Duration", "Rows", "Description"]);
    for result in &run.results {
        table.add_row(vec![
            Cell::new(result.case.mode.label()),
            Cell::new(&result.case.name),
            Cell::new(result.case.limit_label()).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2?}", result.duration)).set_alignment(CellAlignment::Right),
            Cell::new(result.rows).set_alignment(CellAlignment::Right),
            Cell::new(&result.case.description),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use logbench_core::bench::{case_matrix, CaseResult, Terms};
    use std::time::Duration;

    fn run() -> BenchmarkRun {
        let terms = Terms::default();
        let results = case_matrix(&terms, "nf", 500, 100)
            .into_iter()
            .map(|case| CaseResult {
                case,
                duration: Duration::from_millis(3),
                rows: 7,
            })
            .collect();
        BenchmarkRun {
            dataset_size: 500,
            content_size: None,
            terms,
            results,
            skipped: Vec::new(),
            seed: None,
        }
    }

    #[test]
    fn test_bench_table_has_one_row_per_case() {
        let rendered = bench_table(&run()).to_string();

        assert!(rendered.contains("Description"));
        assert!(rendered.contains("FTS Not Found"));
        assert!(rendered.contains("Partial Short Input"));
        assert!(rendered.contains("ALL"));
    }

    #[test]
    fn test_bench_json_has_duration_ms() {
        let value = serde_json::to_value(run()).unwrap();
        let first = &value["results"][0];

        assert_eq!(first["name"], "FTS Not Found");
        assert_eq!(first["mode"], "full_text");
        assert!(first["duration_ms"].as_f64().unwrap() >= 3.0);
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "あ".repeat(200);
        let cut = preview(&long);

        assert_eq!(cut.chars().count(), CONTENT_PREVIEW_CHARS + 1);
        assert!(cut.ends_with('…'));
        assert_eq!(preview("short"), "short");
    }
}
