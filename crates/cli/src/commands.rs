use std::io::{self, Write};

use guidesync_client::{HttpRecordsClient, RecordPages, RemoteRecord};
use guidesync_content::{load_all, LocalDocument};
use guidesync_recon::{validate_unique, Failure, Plan, ReconError, Reconciler, RunReport, Step};
use serde::Serialize;

use crate::exit_codes::EXIT_INCOMPLETE;
use crate::{CliError, ConfigArgs};

// ============================================================================
// sync
// ============================================================================

#[derive(Serialize)]
struct SyncOutput<'a> {
    report: &'a RunReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    steps: Option<&'a [Step]>,
    failures: &'a [Failure],
}

pub fn cmd_sync(args: &ConfigArgs, dry_run: bool, json: bool) -> Result<(), CliError> {
    let config = args.inputs()?.resolve().map_err(CliError::config)?;
    tracing::debug!(?config, "resolved configuration");

    let documents = load_all(&config.content_dir, &config.load_options()).map_err(CliError::content)?;
    let client = HttpRecordsClient::new(config.client_options()).map_err(CliError::client)?;
    let reconciler = Reconciler::new(client, config.recon_options());

    if dry_run {
        let plan = reconciler.preview(&documents).map_err(CliError::recon)?;
        return print_plan(&plan, json);
    }

    match reconciler.run(&documents) {
        Ok(report) => print_report(&report, &[], json),
        Err(ReconError::Incomplete { failures, report }) => {
            print_report(&report, &failures, json)?;
            Err(CliError::new(
                EXIT_INCOMPLETE,
                format!("{} operation(s) failed", failures.len()),
            )
            .with_hint("fix the failing documents and run again; reruns only update"))
        }
        Err(err) => Err(CliError::recon(err)),
    }
}

fn print_plan(plan: &Plan, json: bool) -> Result<(), CliError> {
    let report = plan.preview();
    if json {
        return emit_json(&SyncOutput {
            report: &report,
            steps: Some(plan.steps.as_slice()),
            failures: &[],
        });
    }

    let mut lines = Vec::with_capacity(plan.steps.len() + 1);
    for step in &plan.steps {
        lines.push(match step {
            Step::Create { path, .. } => format!("create  {path}"),
            Step::Update { path, record_id, .. } => format!("update  {path} ({record_id})"),
            Step::Delete { record_id, title, .. } => format!("delete  {record_id} {title}"),
        });
    }
    lines.push(summary_line(&report));
    emit_lines(&lines)
}

fn print_report(report: &RunReport, failures: &[Failure], json: bool) -> Result<(), CliError> {
    if json {
        return emit_json(&SyncOutput {
            report,
            steps: None,
            failures,
        });
    }

    let mut lines: Vec<String> = failures
        .iter()
        .map(|f| format!("failed  {} {}: {}", f.operation, f.target, f.message))
        .collect();
    lines.push(summary_line(report));
    emit_lines(&lines)
}

fn summary_line(report: &RunReport) -> String {
    format!(
        "documents: {}  remote: {}  created: {}  updated: {}  deleted: {}{}",
        report.documents,
        report.remote_records,
        report.created,
        report.updated,
        report.deleted,
        if report.dry_run { "  (dry run)" } else { "" }
    )
}

// ============================================================================
// scan
// ============================================================================

#[derive(Serialize)]
struct ScanEntry<'a> {
    identity_key: &'a str,
    path: &'a str,
    url: &'a str,
    title: &'a str,
}

impl<'a> From<&'a LocalDocument> for ScanEntry<'a> {
    fn from(doc: &'a LocalDocument) -> Self {
        Self {
            identity_key: &doc.identity_key,
            path: &doc.path,
            url: &doc.url,
            title: &doc.title,
        }
    }
}

pub fn cmd_scan(args: &ConfigArgs, json: bool) -> Result<(), CliError> {
    let settings = args.inputs()?.resolve_content().map_err(CliError::config)?;
    let documents = load_all(&settings.content_dir, &settings.load).map_err(CliError::content)?;
    validate_unique(&documents).map_err(CliError::recon)?;

    if json {
        let entries: Vec<ScanEntry> = documents.iter().map(ScanEntry::from).collect();
        return emit_json(&entries);
    }

    let lines: Vec<String> = documents
        .iter()
        .map(|d| format!("{}  {}  {}", d.identity_key, d.path, d.url))
        .collect();
    emit_lines(&lines)
}

// ============================================================================
// list
// ============================================================================

pub fn cmd_list(args: &ConfigArgs, json: bool) -> Result<(), CliError> {
    let settings = args.inputs()?.resolve_remote().map_err(CliError::config)?;
    let client = HttpRecordsClient::new(settings.client).map_err(CliError::client)?;

    let mut pages = RecordPages::new(&client, settings.type_id.as_str());
    let records: Vec<RemoteRecord> = pages
        .by_ref()
        .collect::<Result<_, _>>()
        .map_err(CliError::client)?;
    tracing::info!(
        pages = pages.pages_fetched(),
        skipped = pages.skipped(),
        "Found {} remote records",
        records.len()
    );

    if json {
        return emit_json(&records);
    }

    let lines: Vec<String> = records
        .iter()
        .map(|r| format!("{}  {}  {}", r.id, r.external_id, r.title))
        .collect();
    emit_lines(&lines)
}

// ============================================================================
// Output helpers
// ============================================================================

fn emit_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    emit_lines(&[text])
}

fn emit_lines(lines: &[String]) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for line in lines {
        writeln!(handle, "{}", line).map_err(|e| CliError::io(e.to_string()))?;
    }
    Ok(())
}
