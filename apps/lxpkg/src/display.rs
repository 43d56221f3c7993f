//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::Term;
use lxpkg_ops::{JobSnapshot, OperationResult, PackageInfo, SearchResult};
use lxpkg_types::{ColorChoice, JobState, Stage};
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

    /// Whether colored output should be produced
    pub fn colors_enabled(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    /// Render as formatted table
    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::SearchResults(results) => self.render_search_results(results),
            OperationResult::PackageInfo(info) => self.render_package_info(info),
            OperationResult::Install(job) => self.render_job(job),
            OperationResult::Removal(report) => {
                for path in &report.removed {
                    self.term.write_line(&format!("removed  {}", path.display()))?;
                }
                for path in &report.missing {
                    self.term.write_line(&format!("missing  {}", path.display()))?;
                }
                self.term.write_line(&format!(
                    "{}: {} removed, {} not present",
                    report.package,
                    report.removed.len(),
                    report.missing.len()
                ))
            }
        }
    }

    fn new_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if !self.colors_enabled() {
            table.force_no_tty();
        }
        table
    }

    /// Render search results
    fn render_search_results(&self, results: &[SearchResult]) -> io::Result<()> {
        if results.is_empty() {
            return self.term.write_line("No matching descriptors.");
        }

        let mut table = self.new_table();
        table.set_header(vec![
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Descriptor").add_attribute(Attribute::Bold),
        ]);
        for result in results {
            table.add_row(vec![
                Cell::new(&result.name),
                Cell::new(result.path.display().to_string()),
            ]);
        }

        self.term.write_line(&table.to_string())
    }

    /// Render package information
    fn render_package_info(&self, info: &PackageInfo) -> io::Result<()> {
        let descriptor = &info.descriptor;
        let mut table = self.new_table();

        table.add_row(vec![
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new(&descriptor.name),
        ]);
        table.add_row(vec![
            Cell::new("Descriptor").add_attribute(Attribute::Bold),
            Cell::new(info.path.display().to_string()),
        ]);
        table.add_row(vec![
            Cell::new("Sources").add_attribute(Attribute::Bold),
            Cell::new(descriptor.sources.join("\n")),
        ]);
        for stage in Stage::ALL {
            let commands = descriptor
                .commands(stage)
                .map_or_else(|| "-".to_string(), |c| c.join("\n"));
            table.add_row(vec![
                Cell::new(stage.label()).add_attribute(Attribute::Bold),
                Cell::new(commands),
            ]);
        }
        let files = if descriptor.manifest.is_empty() {
            "-".to_string()
        } else {
            descriptor.manifest.join("\n")
        };
        table.add_row(vec![
            Cell::new("Files").add_attribute(Attribute::Bold),
            Cell::new(files),
        ]);

        self.term.write_line(&table.to_string())
    }

    /// Render the final state of an installation job
    fn render_job(&self, job: &JobSnapshot) -> io::Result<()> {
        let mut table = self.new_table();
        table.set_header(vec![
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("State").add_attribute(Attribute::Bold),
            Cell::new("Progress").add_attribute(Attribute::Bold),
        ]);

        let state = Cell::new(job.state.to_string());
        let state = if self.colors_enabled() {
            match job.state {
                JobState::Succeeded => state.fg(Color::Green),
                JobState::Failed => state.fg(Color::Red),
                _ => state,
            }
        } else {
            state
        };
        table.add_row(vec![
            Cell::new(&job.package),
            state,
            Cell::new(format!("{}%", job.progress)),
        ]);

        self.term.write_line(&table.to_string())
    }
}
