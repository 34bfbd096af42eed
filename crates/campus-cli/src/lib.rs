//! Operator tooling for the inline media lifecycle.

use campus_core::models::InlineMediaStatusCounts;
use campus_services::PurgeReport;
use serde::Serialize;

/// Output format shared by the CLI binaries.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Result of one operator-triggered purge sweep.
#[derive(Debug, Serialize)]
pub struct PurgeOutput {
    pub limit: i64,
    pub report: PurgeReport,
    pub remaining: InlineMediaStatusCounts,
}

impl PurgeOutput {
    pub fn render(&self, format: OutputFormat) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(self),
            OutputFormat::Table => Ok(self.to_table()),
        }
    }

    fn to_table(&self) -> String {
        let rows = [
            ("Batch limit", self.limit),
            ("Examined", self.report.examined as i64),
            ("Purged", self.report.purged as i64),
            ("Failed", self.report.failed as i64),
            ("TEMP remaining", self.remaining.temp),
            ("LINKED", self.remaining.linked),
        ];

        let mut out = String::from("Inline media purge\n");
        out.push_str(&"=".repeat(30));
        out.push('\n');
        for (label, value) in rows {
            out.push_str(&format!("{:<18}{:>12}\n", label, value));
        }
        out
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output() -> PurgeOutput {
        PurgeOutput {
            limit: 100,
            report: PurgeReport {
                examined: 4,
                purged: 3,
                failed: 1,
            },
            remaining: InlineMediaStatusCounts {
                temp: 7,
                linked: 42,
            },
        }
    }

    #[test]
    fn table_lists_counts() {
        let table = output().render(OutputFormat::Table).unwrap();
        assert!(table.starts_with("Inline media purge\n"));
        assert!(table.contains("Purged"));
        assert!(table
            .lines()
            .any(|line| line.starts_with("Failed") && line.trim_end().ends_with('1')));
        assert!(table
            .lines()
            .any(|line| line.starts_with("LINKED") && line.trim_end().ends_with("42")));
    }

    #[test]
    fn json_nests_report() {
        let json = output().render(OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["limit"], 100);
        assert_eq!(value["report"]["purged"], 3);
        assert_eq!(value["remaining"]["temp"], 7);
    }
}
