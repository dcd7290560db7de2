//! Human-readable reporting of a batch

use std::time::Duration;

use crate::cli::VerbosityLevel;
use crate::processor::{DocumentReport, DocumentStatus, ProcessingResults};

/// Formats reports for the terminal
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_results(&self, results: &ProcessingResults) -> String {
        let mut output = String::new();

        for report in &results.reports {
            if self.verbosity == VerbosityLevel::Quiet && report.status.is_accepted() {
                continue;
            }
            output.push_str(&self.format_report(report));
            output.push('\n');
        }

        match self.verbosity {
            VerbosityLevel::Quiet => {
                if results.has_errors() {
                    output.push_str(&format!(
                        "Invalid: {} Errors: {}\n",
                        results.invalid_files, results.error_files
                    ));
                }
            }
            VerbosityLevel::Normal | VerbosityLevel::Verbose => {
                output.push_str(&self.format_summary(results));
            }
        }

        output
    }

    pub fn format_report(&self, report: &DocumentReport) -> String {
        let path_display = report.path.display();
        let component = report.component.as_deref().unwrap_or("");
        let version = report
            .version
            .as_deref()
            .map(|token| format!(" DDMS {}", token))
            .unwrap_or_default();

        let mut output = match &report.status {
            DocumentStatus::Valid => format!(
                "{}  {} ({}{})",
                self.colorize("✓ VALID", "32"),
                path_display,
                component,
                version
            ),
            DocumentStatus::Warned { warning_count } => format!(
                "{}  {} ({}{}) - {} warning{}",
                self.colorize("! WARNED", "33"),
                path_display,
                component,
                version,
                warning_count,
                if *warning_count == 1 { "" } else { "s" }
            ),
            DocumentStatus::Invalid { failure } => format!(
                "{}  {} - {}",
                self.colorize("✗ INVALID", "31"),
                path_display,
                failure
            ),
            DocumentStatus::Error { message } => format!(
                "{}  {} - {}",
                self.colorize("⚠ ERROR", "35"),
                path_display,
                message
            ),
        };

        if self.verbosity >= VerbosityLevel::Verbose {
            for warning in &report.warnings {
                output.push_str(&format!("\n    {}", warning));
            }
            output.push_str(&format!("\n    took {}", format_duration(report.duration)));
        }
        if self.verbosity >= VerbosityLevel::Normal
            && let Some(rendered) = &report.rendered
        {
            output.push('\n');
            output.push_str(rendered.trim_end());
        }

        output
    }

    fn format_summary(&self, results: &ProcessingResults) -> String {
        let mut output = String::new();
        output.push_str("Summary:\n");
        output.push_str(&format!("  Total files: {}\n", results.total_files));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Valid:", "32"),
            results.valid_files
        ));

        if results.warned_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("With warnings:", "33"),
                results.warned_files
            ));
        }
        if results.invalid_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Invalid:", "31"),
                results.invalid_files
            ));
        }
        if results.error_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Errors:", "35"),
                results.error_files
            ));
        }

        output.push_str(&format!("  Success rate: {:.1}%\n", results.success_rate()));
        output.push_str(&format!(
            "  Duration: {}\n",
            format_duration(results.total_duration)
        ));
        if self.verbosity >= VerbosityLevel::Verbose {
            output.push_str(&format!(
                "  Started: {}\n",
                results.started_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }

        output
    }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
