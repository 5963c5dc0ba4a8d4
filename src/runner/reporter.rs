use crate::discovery::TestCase;
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Skipped,
    Other,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub name: String,
    pub method: String,
    pub status: Status,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    #[serde(rename = "tests")]
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    #[serde(default)]
    pub pending: usize,
    #[serde(default)]
    pub skipped: usize,
    #[serde(default)]
    pub other: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub discovery_errors: usize,
    #[serde(skip)]
    pub duration_ms: u64,
    #[serde(rename = "start")]
    pub start_time: u64,
    #[serde(rename = "stop")]
    pub stop_time: u64,
}

fn is_zero(val: &usize) -> bool {
    *val == 0
}

impl Summary {
    pub fn from_results(
        results: &[TestResult],
        discovery_errors: usize,
        duration_ms: u64,
        start_time: u64,
        stop_time: u64,
    ) -> Self {
        let count = |status: Status| results.iter().filter(|r| r.status == status).count();
        Self {
            total_tests: results.len(),
            passed: count(Status::Passed),
            failed: count(Status::Failed),
            pending: 0,
            skipped: count(Status::Skipped),
            other: count(Status::Other),
            discovery_errors,
            duration_ms,
            start_time,
            stop_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestRunOutput {
    pub session_id: String,
    pub tests: Vec<TestResult>,
    pub errors: Vec<String>,
    pub summary: Summary,
}

impl TestRunOutput {
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0 || self.summary.discovery_errors > 0
    }
}

/// The result of a discovery-only session.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryOutput {
    pub session_id: String,
    pub tests: Vec<TestCase>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_format: &'static str,
    pub spec_version: &'static str,
    pub results: Results,
}

#[derive(Debug, Clone, Serialize)]
pub struct Results {
    pub tool: Tool,
    pub summary: Summary,
    pub tests: Vec<Test>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    pub name: String,
    pub status: Status,
    pub duration: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

pub trait OutputFormatter<T> {
    fn format(&self, output: &T) -> String;
}

fn strip_ansi(text: &str) -> String {
    String::from_utf8_lossy(&strip_ansi_escapes::strip(text)).into_owned()
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        let escaped = serde_json::to_string(&e.to_string())
            .unwrap_or_else(|_| "\"serialization error\"".to_string());
        format!("{{\"error\": {}}}", escaped)
    })
}

/// CTRF report for runs, plain JSON listing for discovery.
pub struct JsonFormatter;

impl OutputFormatter<TestRunOutput> for JsonFormatter {
    fn format(&self, output: &TestRunOutput) -> String {
        let tests = output
            .tests
            .iter()
            .map(|test| Test {
                name: test.name.clone(),
                status: test.status,
                duration: test.duration_ms,
                suite: Some(test.method.clone()),
                message: test.message.as_deref().map(strip_ansi),
                trace: test.trace.as_deref().map(strip_ansi),
            })
            .collect();

        let report = Report {
            report_format: "CTRF",
            spec_version: "0.0.0",
            results: Results {
                tool: Tool {
                    name: "attest",
                    version: Some(env!("CARGO_PKG_VERSION")),
                },
                summary: output.summary.clone(),
                tests,
            },
        };

        to_json(&report)
    }
}

impl OutputFormatter<DiscoveryOutput> for JsonFormatter {
    fn format(&self, output: &DiscoveryOutput) -> String {
        to_json(output)
    }
}

pub struct TextFormatter {
    pub verbose: bool,
}

impl TextFormatter {
    pub fn format_result(result: &TestResult) -> String {
        let status = match result.status {
            Status::Passed => "PASS".green().to_string(),
            Status::Failed => "FAIL".red().to_string(),
            Status::Skipped => "SKIP".yellow().to_string(),
            Status::Other => "INCONCLUSIVE".yellow().to_string(),
        };
        let duration_secs = result.duration_ms as f64 / 1000.0;
        let mut line = format!("{}  {}   {:.2}s", status, result.name, duration_secs);
        if let Some(message) = &result.message {
            line.push_str(&format!("\n      {}", message.dimmed()));
        }
        line
    }
}

impl OutputFormatter<TestRunOutput> for TextFormatter {
    fn format(&self, output: &TestRunOutput) -> String {
        let mut result = String::new();

        for test in &output.tests {
            if self.verbose || test.status != Status::Passed {
                result.push_str(&Self::format_result(test));
                result.push('\n');
            }
        }

        for error in &output.errors {
            result.push_str(&format!("{} {}\n", "Discovery Error:".red(), error));
        }

        let summary = &output.summary;
        let duration_secs = summary.duration_ms as f64 / 1000.0;
        let tests_text = if summary.total_tests == 1 { "test" } else { "tests" };

        let failed_text = format!(
            "Failed {}/{} {} in {:.2}s",
            summary.failed, summary.total_tests, tests_text, duration_secs
        );

        if summary.discovery_errors > 0 {
            let methods_text = if summary.discovery_errors == 1 {
                "method"
            } else {
                "methods"
            };
            result.push_str(&format!(
                "{} {} {} could not be discovered",
                "✗".red(),
                summary.discovery_errors,
                methods_text
            ));
            if summary.failed > 0 {
                result.push_str(&format!("; {}", failed_text));
            }
        } else if summary.failed == 0 {
            result.push_str(&format!(
                "{} Passed {}/{} {} ({} skipped, {} inconclusive) in {:.2}s",
                "✓".green(),
                summary.passed,
                summary.total_tests,
                tests_text,
                summary.skipped,
                summary.other,
                duration_secs
            ));
        } else {
            result.push_str(&format!("{} {}", "✗".red(), failed_text));
        }

        result
    }
}

impl OutputFormatter<DiscoveryOutput> for TextFormatter {
    fn format(&self, output: &DiscoveryOutput) -> String {
        let mut result = String::new();
        for case in &output.tests {
            if self.verbose {
                result.push_str(&format!("{}  {}\n", case.display_name, case.method.to_string().dimmed()));
            } else {
                result.push_str(&format!("{}\n", case.display_name));
            }
        }
        for error in &output.errors {
            result.push_str(&format!("{} {}\n", "Discovery Error:".red(), error));
        }
        let tests_text = if output.tests.len() == 1 { "test" } else { "tests" };
        result.push_str(&format!("Discovered {} {}", output.tests.len(), tests_text));
        result
    }
}

/// Streams progress while a session runs.
pub trait Reporter {
    fn on_discovery_error(&self, message: &str);
    fn on_warning(&self, message: &str);
    fn on_result(&self, result: &TestResult);
}

pub struct DefaultReporter {
    verbose: bool,
    output_format: OutputFormat,
}

impl DefaultReporter {
    pub fn new(verbose: bool, output_format: OutputFormat) -> Self {
        Self {
            verbose,
            output_format,
        }
    }

    fn is_json(&self) -> bool {
        self.output_format == OutputFormat::Json
    }
}

impl Reporter for DefaultReporter {
    fn on_discovery_error(&self, message: &str) {
        if self.is_json() {
            return;
        }
        eprintln!("{} {}", "Discovery Error:".red(), message);
    }

    fn on_warning(&self, message: &str) {
        if self.is_json() {
            return;
        }
        eprintln!("{} {}", "Warning:".yellow(), message);
    }

    fn on_result(&self, result: &TestResult) {
        if self.is_json() || !self.verbose {
            return;
        }
        println!("{}", TextFormatter::format_result(result));
    }
}
