//! Output rendering and formatting

use crate::outcome::{
    AggregateSummary, CommandOutcome, FactSummary, FailedUnit, PublishSummary, ReconcileSummary,
    ScanSummary, WatchSummary,
};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use mhub_repository::WriteOutcome;
use mhub_state::{Reason, WatchStatus};
use mhub_types::{AggregateStatus, ColorChoice};
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render a command result
    ///
    /// The reconciler's selection always goes to stdout as a bare JSON array
    /// unless it was written to the CI output file; its decision table goes
    /// to stderr.
    pub fn render_result(&self, result: &CommandOutcome) -> io::Result<()> {
        if let CommandOutcome::Reconcile(summary) = result {
            return self.render_reconcile(summary);
        }
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &CommandOutcome) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        println!("{json}");
        Ok(())
    }

    /// Render as formatted table
    fn render_table(&self, result: &CommandOutcome) -> io::Result<()> {
        match result {
            CommandOutcome::Fact(summary) => self.render_fact(summary),
            CommandOutcome::Aggregate(summary) => self.render_aggregate(summary),
            CommandOutcome::Publish(summary) => self.render_publish(summary),
            CommandOutcome::Reconcile(summary) => self.render_reconcile(summary),
            CommandOutcome::Scan(summary) => self.render_scan(summary),
            CommandOutcome::Watch(summary) => self.render_watch(summary),
        }
    }

    fn render_fact(&self, summary: &FactSummary) -> io::Result<()> {
        let target = summary.target.as_deref().unwrap_or("-");
        println!(
            "{} {} {} {target} [{}]",
            self.style_ok("[OK]"),
            self.style_name(&summary.exporter),
            summary.artifact_type,
            summary.status
        );
        println!("  Written:  {}", summary.path.display());
        if summary.metadata_embedded {
            println!("  Metadata: embedded from package header");
        }
        Ok(())
    }

    fn render_aggregate(&self, summary: &AggregateSummary) -> io::Result<()> {
        println!(
            "{} {}",
            self.style_name(&summary.exporter),
            summary.version
        );
        println!();

        let mut table = self.table(&["Artifact", "Status"]);
        for (label, status) in [
            ("rpm", summary.rpm),
            ("deb", summary.deb),
            ("docker", summary.docker),
        ] {
            table.add_row(vec![Cell::new(label), status_cell(status)]);
        }
        println!("{table}");

        println!(
            "Facts: {} read, {} skipped",
            summary.facts, summary.skipped
        );
        println!("Rollup: {}", summary.path.display());
        Ok(())
    }

    fn render_publish(&self, summary: &PublishSummary) -> io::Result<()> {
        let mut table = self.table(&["Result", "Count"]);
        table.add_row(vec![
            Cell::new("Published"),
            Cell::new(summary.published.len()).fg(Color::Green),
        ]);
        table.add_row(vec![Cell::new("  from facts"), Cell::new(summary.aggregated)]);
        table.add_row(vec![
            Cell::new("  manifest only"),
            Cell::new(summary.manifest_only),
        ]);
        table.add_row(vec![Cell::new("Failed"), count_cell(summary.failed.len())]);
        println!("{table}");

        self.render_failures(&summary.failed);
        println!("Index:  {}", summary.index_path.display());
        println!("Legacy: {}", summary.legacy_path.display());
        Ok(())
    }

    fn render_reconcile(&self, summary: &ReconcileSummary) -> io::Result<()> {
        if summary.github_output.is_none() {
            let json = serde_json::to_string(&summary.selected).map_err(io::Error::other)?;
            println!("{json}");
        }
        if self.json_output {
            return Ok(());
        }

        let err = Term::stderr();
        let mut table = self.table(&["Exporter", "Local", "Published", "Decision"]);
        for decision in &summary.decisions {
            let reason = Cell::new(decision.reason.to_string());
            let reason = match decision.reason {
                Reason::UpToDate => reason,
                Reason::New => reason.fg(Color::Green),
                Reason::VersionChanged { .. } => reason.fg(Color::Yellow),
                Reason::Forced => reason.fg(Color::Magenta),
            };
            table.add_row(vec![
                Cell::new(&decision.name),
                Cell::new(&decision.local_version),
                Cell::new(decision.published_version.as_deref().unwrap_or("-")),
                reason,
            ]);
        }
        err.write_line(&table.to_string())?;
        err.write_line(&format!(
            "{} selected, {} up to date, {} invalid manifests, {} published",
            summary.selected.len(),
            summary.decisions.len() - summary.selected.len(),
            summary.invalid,
            summary.published
        ))?;
        if let Some(path) = &summary.github_output {
            err.write_line(&format!("CI output appended to {}", path.display()))?;
        }
        Ok(())
    }

    fn render_scan(&self, summary: &ScanSummary) -> io::Result<()> {
        println!(
            "{} {}/{}",
            self.style_name(summary.kind.as_str()),
            summary.dist,
            summary.arch
        );
        if summary.history_unavailable {
            println!("  release history unavailable, new builds only");
        }
        println!(
            "  {} from history, {} new, {} failed",
            summary.from_history,
            summary.from_new_builds,
            summary.failed.len()
        );
        println!();

        if !summary.packages.is_empty() {
            let mut table = self.table(&["Package", "Version", "Arch"]);
            for package in &summary.packages {
                table.add_row(vec![
                    Cell::new(&package.name),
                    Cell::new(&package.version),
                    Cell::new(&package.arch),
                ]);
            }
            println!("{table}");
        }

        self.render_failures(&summary.failed);
        match &summary.written {
            WriteOutcome::Written { files, packages } => {
                println!(
                    "{} metadata for {packages} packages",
                    self.style_ok("[OK]")
                );
                for file in files {
                    println!("  {}", file.display());
                }
            }
            WriteOutcome::Skipped => println!("No packages found; metadata skipped."),
        }
        Ok(())
    }

    fn render_watch(&self, summary: &WatchSummary) -> io::Result<()> {
        let mut table = self.table(&["Exporter", "Repository", "Current", "Latest", "Status"]);
        for check in &summary.checks {
            let status = Cell::new(check.status.as_str());
            let status = match check.status {
                WatchStatus::UpToDate => status,
                WatchStatus::UpdateAvailable => status.fg(Color::Yellow),
                WatchStatus::Updated => status.fg(Color::Green),
                WatchStatus::Unreachable | WatchStatus::Incomparable => status.fg(Color::Red),
            };
            table.add_row(vec![
                Cell::new(&check.name),
                Cell::new(&check.repo),
                Cell::new(&check.current),
                Cell::new(check.latest.as_deref().unwrap_or("-")),
                status,
            ]);
        }
        println!("{table}");

        println!(
            "{} updated, {} available, {} skipped, {} invalid manifests",
            summary.updated.len(),
            summary.available.len(),
            summary.skipped.len(),
            summary.invalid
        );
        if let Some(path) = &summary.github_output {
            println!("CI output appended to {}", path.display());
        }
        Ok(())
    }

    fn render_failures(&self, failed: &[FailedUnit]) {
        if failed.is_empty() {
            return;
        }
        println!("Failures:");
        for failure in failed {
            println!("  • {}: {}", self.style_name(&failure.unit), failure.reason);
        }
    }

    fn table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if !self.supports_color() {
            table.force_no_tty();
        }
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
        table
    }

    fn style_name(&self, name: &str) -> String {
        if self.supports_color() {
            Style::new().bold().apply_to(name).to_string()
        } else {
            name.to_string()
        }
    }

    fn style_ok(&self, text: &str) -> String {
        if self.supports_color() {
            Style::new().green().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

fn status_cell(status: AggregateStatus) -> Cell {
    let cell = Cell::new(status.as_str());
    match status {
        AggregateStatus::Success => cell.fg(Color::Green),
        AggregateStatus::Failed => cell.fg(Color::Red),
        AggregateStatus::Pending => cell.fg(Color::Yellow),
        AggregateStatus::Na => cell,
    }
}

fn count_cell(count: usize) -> Cell {
    if count == 0 {
        Cell::new(count)
    } else {
        Cell::new(count).fg(Color::Red)
    }
}
