//! Output formatting for CLI commands.
//!
//! This module renders plans and apply reports either as colored text for a
//! terminal or as JSON for scripting.

use colored::Colorize;
use serde_json::Value;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::planner::{
    ApplyReport, ChangeKind, FieldChange, ItemOutcome, Plan, PlanAction, PlanItem,
};

use super::commands::OutputFormat;

/// Longest rendered value in a change line before it is shortened.
const MAX_VALUE_WIDTH: usize = 60;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan item row for table display.
#[derive(Tabled)]
struct PlanItemRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Changes")]
    changes: usize,
}

/// Apply result row for table display.
#[derive(Tabled)]
struct ApplyResultRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &Plan) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(plan).unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_text(plan),
        }
    }

    /// Formats an apply report for display.
    #[must_use]
    pub fn format_apply_report(&self, report: &ApplyReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_apply_text(report),
        }
    }

    fn format_plan_text(plan: &Plan) -> String {
        let mut output = String::new();
        let summary = plan.summary();

        if !plan.has_drift() && !plan.has_failures() {
            let _ = writeln!(
                output,
                "{} No changes. {} resource(s) on cluster {} match the local files.",
                "✓".green(),
                summary.no_change,
                plan.cluster()
            );
            return output;
        }

        let _ = writeln!(output, "\nPlan for cluster {}", plan.cluster().bold());
        let _ = writeln!(
            output,
            "   Fingerprint: {}\n",
            plan.fingerprint().get(..12).unwrap_or_default()
        );

        let rows: Vec<PlanItemRow> = plan
            .items()
            .iter()
            .filter(|item| item.action != PlanAction::NoChange)
            .map(|item| PlanItemRow {
                action: Self::format_action(item.action),
                kind: item.kind.to_string(),
                name: item.name.clone(),
                changes: item.changes.len(),
            })
            .collect();

        if !rows.is_empty() {
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        for item in plan.items() {
            if item.action != PlanAction::NoChange {
                Self::write_item_details(&mut output, item);
            }
        }

        if plan.has_failures() {
            let _ = writeln!(output, "\n{}", "Could not fetch current state:".red().bold());
            for failure in plan.failures() {
                let _ = writeln!(
                    output,
                    "   {} {}/{}: {}",
                    "✗".red(),
                    failure.kind,
                    failure.name,
                    failure.error
                );
            }
        }

        let _ = writeln!(
            output,
            "\nPlan: {} to create, {} to update, {} unchanged, {} blocked",
            summary.create.to_string().green(),
            summary.update.to_string().yellow(),
            summary.no_change,
            summary.blocked.to_string().red()
        );

        output
    }

    fn write_item_details(output: &mut String, item: &PlanItem) {
        let marker = match item.action {
            PlanAction::Create => "+".green(),
            PlanAction::Update => "~".yellow(),
            PlanAction::Blocked => "!".red(),
            PlanAction::NoChange => " ".normal(),
        };
        let _ = writeln!(output, "\n{marker} {}", item.label().bold());

        if let Some(note) = &item.note {
            let _ = writeln!(output, "    {}", note.dimmed());
        }

        for change in &item.changes {
            let _ = writeln!(output, "    {}", Self::format_change(change));
        }
    }

    fn format_change(change: &FieldChange) -> String {
        let path = change.path.to_string();
        match change.kind() {
            ChangeKind::Added => format!(
                "{} {path}: {}",
                "+".green(),
                Self::render_value(change.after.as_ref())
            ),
            ChangeKind::Removed => format!(
                "{} {path}: {}",
                "-".red(),
                Self::render_value(change.before.as_ref())
            ),
            ChangeKind::Modified => format!(
                "{} {path}: {} -> {}",
                "~".yellow(),
                Self::render_value(change.before.as_ref()),
                Self::render_value(change.after.as_ref())
            ),
        }
    }

    fn format_apply_text(report: &ApplyReport) -> String {
        let mut output = String::new();

        let rows: Vec<ApplyResultRow> = report
            .results
            .iter()
            .filter(|result| result.action != PlanAction::NoChange)
            .map(|result| ApplyResultRow {
                resource: result.label(),
                action: result.action.to_string(),
                outcome: Self::format_outcome(result.outcome),
                detail: Self::truncate(
                    result
                        .error
                        .as_deref()
                        .or(result.note.as_deref())
                        .unwrap_or_default(),
                    MAX_VALUE_WIDTH,
                ),
            })
            .collect();

        if !rows.is_empty() {
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        let status = if report.success && !report.interrupted {
            "✓".green()
        } else {
            "✗".red()
        };
        let _ = writeln!(
            output,
            "\n{status} Apply complete: {} applied, {} failed, {} skipped",
            report.applied.to_string().green(),
            report.failed.to_string().red(),
            report.skipped
        );
        if report.interrupted {
            let _ = writeln!(
                output,
                "{}",
                "Interrupted: remaining changes were not written.".yellow()
            );
        }

        output
    }

    /// Formats a plan action with color.
    fn format_action(action: PlanAction) -> String {
        match action {
            PlanAction::Create => "+create".green().to_string(),
            PlanAction::Update => "~update".yellow().to_string(),
            PlanAction::Blocked => "!blocked".red().to_string(),
            PlanAction::NoChange => "no_change".dimmed().to_string(),
        }
    }

    /// Formats an item outcome with color.
    fn format_outcome(outcome: ItemOutcome) -> String {
        match outcome {
            ItemOutcome::Applied => "applied".green().to_string(),
            ItemOutcome::Skipped => "skipped".dimmed().to_string(),
            ItemOutcome::Failed => "failed".red().to_string(),
        }
    }

    fn render_value(value: Option<&Value>) -> String {
        let rendered = value.map_or_else(|| String::from("null"), Value::to_string);
        Self::truncate(&rendered, MAX_VALUE_WIDTH)
    }

    /// Truncates a string to at most `max_chars` characters.
    fn truncate(s: &str, max_chars: usize) -> String {
        if s.chars().count() <= max_chars {
            return s.to_string();
        }
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{FetchFailure, FieldPath, ItemResult};
    use crate::resource::ResourceKind;
    use serde_json::json;

    fn item(kind: ResourceKind, name: &str, action: PlanAction, changes: Vec<FieldChange>) -> PlanItem {
        PlanItem {
            kind,
            name: name.to_string(),
            action,
            changes,
            note: None,
            desired: json!({}),
        }
    }

    fn sample_plan() -> Plan {
        let replicas = FieldChange {
            path: FieldPath::root().key("settings").key("number_of_replicas"),
            before: Some(json!("1")),
            after: Some(json!("2")),
        };
        let processor = FieldChange {
            path: FieldPath::root().key("processors").index(1),
            before: None,
            after: Some(json!({"set": {"field": "env", "value": "prod"}})),
        };
        Plan::new(
            "staging",
            vec![
                item(ResourceKind::IngestPipeline, "enrich", PlanAction::Update, vec![processor]),
                item(ResourceKind::IndexTemplate, "logs", PlanAction::Create, Vec::new()),
                item(ResourceKind::Index, "audit", PlanAction::Blocked, vec![replicas]),
                item(ResourceKind::LifecyclePolicy, "hot-warm", PlanAction::NoChange, Vec::new()),
            ],
            vec![FetchFailure {
                kind: ResourceKind::ComponentTemplate,
                name: String::from("base"),
                error: String::from("Network error communicating with cluster: refused"),
            }],
        )
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(OutputFormatter::truncate("short", 10), "short");
        assert_eq!(OutputFormatter::truncate("abcdefghij", 8), "abcde...");
        assert_eq!(OutputFormatter::truncate("ééééééé", 6), "ééé...");
    }

    #[test]
    fn test_plan_text_lists_changes() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let text = formatter.format_plan(&sample_plan());

        assert!(text.contains("staging"));
        assert!(text.contains("index_template/logs"));
        assert!(text.contains("settings.number_of_replicas"));
        assert!(text.contains("processors[1]"));
        assert!(text.contains("component_template/base"));
        assert!(!text.contains("lifecycle_policy/hot-warm"));
    }

    #[test]
    fn test_plan_text_without_drift() {
        let plan = Plan::new(
            "local",
            vec![item(ResourceKind::IndexTemplate, "logs", PlanAction::NoChange, Vec::new())],
            Vec::new(),
        );
        let text = OutputFormatter::new(OutputFormat::Text).format_plan(&plan);
        assert!(text.contains("No changes"));
        assert!(text.contains("local"));
    }

    #[test]
    fn test_plan_json_is_machine_readable() {
        let json = OutputFormatter::new(OutputFormat::Json).format_plan(&sample_plan());
        let parsed: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["cluster"], "staging");
        assert_eq!(parsed["summary"]["blocked"], 1);
        assert_eq!(parsed["items"].as_array().unwrap().len(), 4);
        assert_eq!(parsed["failures"][0]["name"], "base");
    }

    #[test]
    fn test_apply_report_text() {
        let report = ApplyReport {
            results: vec![
                ItemResult {
                    kind: ResourceKind::IndexTemplate,
                    name: String::from("logs"),
                    action: PlanAction::Create,
                    outcome: ItemOutcome::Applied,
                    error: None,
                    note: None,
                },
                ItemResult {
                    kind: ResourceKind::IngestPipeline,
                    name: String::from("enrich"),
                    action: PlanAction::Update,
                    outcome: ItemOutcome::Failed,
                    error: Some(String::from("Cluster request failed: 400 - bad processor")),
                    note: None,
                },
            ],
            applied: 1,
            skipped: 0,
            failed: 1,
            success: false,
            interrupted: false,
        };

        let text = OutputFormatter::new(OutputFormat::Text).format_apply_report(&report);
        assert!(text.contains("ingest_pipeline/enrich"));
        assert!(text.contains("bad processor"));
        assert!(text.contains("Apply complete"));

        let json = OutputFormatter::new(OutputFormat::Json).format_apply_report(&report);
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["failed"], 1);
        assert_eq!(parsed["results"][1]["outcome"], "failed");
    }
}
