//! Output formatting and management

use crate::scanner::{ScanReport, ScanStats};
use colored::Colorize;
use serde::Serialize;
use std::fmt::{self, Display};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Greppable,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "greppable" | "grep" => Ok(OutputFormat::Greppable),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub file: Option<PathBuf>,
    pub colored: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            file: None,
            colored: true,
        }
    }
}

/// Main output manager
pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Write a scan report to the configured destination
    pub fn write_report<A>(&self, report: &ScanReport<A>) -> io::Result<()>
    where
        A: Display + Serialize + Ord + Clone,
    {
        let output = self.format_report(report)?;

        match &self.config.file {
            Some(path) => {
                let mut file = File::create(path)?;
                file.write_all(output.as_bytes())?;
            }
            None => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle.write_all(output.as_bytes())?;
                handle.flush()?;
            }
        }

        Ok(())
    }

    /// Render a scan report in the configured format
    pub fn format_report<A>(&self, report: &ScanReport<A>) -> io::Result<String>
    where
        A: Display + Serialize + Ord + Clone,
    {
        // Probe completion order is arbitrary; print hosts in address order
        let mut hosts = report.supported.clone();
        hosts.sort();

        let output = match self.config.format {
            OutputFormat::Text => self.format_text(&hosts, &report.stats),
            OutputFormat::Greppable => format_greppable(&hosts),
            OutputFormat::Json => format_json(&hosts, &report.stats)?,
        };
        Ok(output)
    }

    fn format_text<A: Display>(&self, hosts: &[A], stats: &ScanStats) -> String {
        let mut output = String::new();

        if hosts.is_empty() {
            output.push_str(&self.paint("No ADB devices found\n", Paint::Dim));
        } else {
            output.push_str(&self.paint(&format!("ADB DEVICES ({}):\n", hosts.len()), Paint::Header));
            for host in hosts {
                output.push_str(&self.paint(&format!("  {}\n", host), Paint::Found));
            }
        }

        output.push('\n');
        output.push_str(&self.paint(&format!("{}\n", SummaryLine(stats)), Paint::Dim));
        output
    }

    fn paint(&self, text: &str, paint: Paint) -> String {
        if !self.config.colored {
            return text.to_string();
        }

        match paint {
            Paint::Header => text.bold().to_string(),
            Paint::Found => text.bright_green().to_string(),
            Paint::Dim => text.dimmed().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Paint {
    Header,
    Found,
    Dim,
}

struct SummaryLine<'a>(&'a ScanStats);

impl fmt::Display for SummaryLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.0;
        write!(
            f,
            "{} probed in {:.2}s ({:.0}/s): {} supported, {} unsupported, {} unreachable, {} errored",
            stats.probed,
            stats.duration.as_secs_f64(),
            stats.probe_rate(),
            stats.supported,
            stats.unsupported,
            stats.unreachable,
            stats.errored
        )
    }
}

/// One `address` per line, nothing else
fn format_greppable<A: Display>(hosts: &[A]) -> String {
    let mut output = String::new();
    for host in hosts {
        output.push_str(&format!("{}\n", host));
    }
    output
}

fn format_json<A: Serialize>(hosts: &[A], stats: &ScanStats) -> io::Result<String> {
    let json_report = JsonScanReport {
        devices: hosts,
        probed: stats.probed,
        supported: stats.supported,
        unsupported: stats.unsupported,
        unreachable: stats.unreachable,
        errored: stats.errored,
        duration_ms: stats.duration.as_millis() as u64,
    };
    let mut json = serde_json::to_string_pretty(&json_report)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    json.push('\n');
    Ok(json)
}

/// JSON-serializable scan report
#[derive(Debug, Serialize)]
struct JsonScanReport<'a, A> {
    devices: &'a [A],
    probed: usize,
    supported: usize,
    unsupported: usize,
    unreachable: usize,
    errored: usize,
    duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeOutcome;
    use std::net::SocketAddr;
    use std::time::Duration;

    fn sample_report() -> ScanReport<SocketAddr> {
        let mut report = ScanReport::new();
        report.record("10.0.0.9:5555".parse().unwrap(), ProbeOutcome::Supported);
        report.record("10.0.0.3:5555".parse().unwrap(), ProbeOutcome::Supported);
        report.record("10.0.0.4:5555".parse().unwrap(), ProbeOutcome::Unreachable);
        report.set_duration(Duration::from_millis(1500));
        report
    }

    fn manager(format: OutputFormat) -> OutputManager {
        OutputManager::new(OutputConfig {
            format,
            file: None,
            colored: false,
        })
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("grep".parse::<OutputFormat>().unwrap(), OutputFormat::Greppable);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_greppable_is_sorted_addresses() {
        let output = manager(OutputFormat::Greppable).format_report(&sample_report()).unwrap();
        assert_eq!(output, "10.0.0.3:5555\n10.0.0.9:5555\n");
    }

    #[test]
    fn test_text_lists_devices_and_summary() {
        let output = manager(OutputFormat::Text).format_report(&sample_report()).unwrap();

        assert!(output.contains("ADB DEVICES (2):"));
        assert!(output.contains("  10.0.0.3:5555\n"));
        assert!(output.contains("3 probed in 1.50s"));
        assert!(output.contains("1 unreachable"));
    }

    #[test]
    fn test_json_report() {
        let output = manager(OutputFormat::Json).format_report(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["devices"][0], "10.0.0.3:5555");
        assert_eq!(value["probed"], 3);
        assert_eq!(value["duration_ms"], 1500);
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.txt");
        let manager = OutputManager::new(OutputConfig {
            format: OutputFormat::Greppable,
            file: Some(path.clone()),
            colored: false,
        });

        manager.write_report(&sample_report()).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "10.0.0.3:5555\n10.0.0.9:5555\n");
    }
}
