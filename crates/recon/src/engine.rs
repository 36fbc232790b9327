use std::collections::{BTreeMap, HashMap};

use guidesync_client::{RecordPages, RecordPayload, RecordsApi, RemoteRecord};
use guidesync_content::LocalDocument;

use crate::config::{FailurePolicy, DEFAULT_LOCALE, DEFAULT_MAX_BODY_LEN};
use crate::error::{DuplicateGroup, ReconError};
use crate::model::{Failure, Plan, RunReport, Step};

/// Per-run settings the reconciler needs.
#[derive(Debug, Clone)]
pub struct ReconOptions {
    pub type_id: String,
    pub source_id: String,
    pub locale: String,
    /// Bodies are cut to this many characters before upload.
    pub max_body_len: usize,
    pub on_error: FailurePolicy,
}

impl ReconOptions {
    pub fn new(type_id: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            source_id: source_id.into(),
            locale: DEFAULT_LOCALE.to_string(),
            max_body_len: DEFAULT_MAX_BODY_LEN,
            on_error: FailurePolicy::Abort,
        }
    }

    pub fn with_on_error(mut self, on_error: FailurePolicy) -> Self {
        self.on_error = on_error;
        self
    }

    pub fn with_max_body_len(mut self, max_body_len: usize) -> Self {
        self.max_body_len = max_body_len;
        self
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Fail if any identity key is shared by more than one document.
///
/// Groups are reported in key order, paths in document order.
pub fn validate_unique(documents: &[LocalDocument]) -> Result<(), ReconError> {
    let mut by_key: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for doc in documents {
        by_key
            .entry(doc.identity_key.as_str())
            .or_default()
            .push(doc.path.as_str());
    }

    let groups: Vec<DuplicateGroup> = by_key
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(key, paths)| DuplicateGroup {
            identity_key: key.to_string(),
            paths: paths.into_iter().map(String::from).collect(),
        })
        .collect();

    if groups.is_empty() {
        return Ok(());
    }
    for group in &groups {
        tracing::error!(
            identity_key = %group.identity_key,
            paths = ?group.paths,
            "duplicate identity key"
        );
    }
    Err(ReconError::DuplicateIdentity { groups })
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Request body for creating or overwriting the record of `doc`.
pub fn build_payload(doc: &LocalDocument, options: &ReconOptions) -> RecordPayload {
    RecordPayload {
        external_id: doc.identity_key.clone(),
        url: doc.url.clone(),
        title: doc.title.clone(),
        body: truncate_chars(&doc.body, options.max_body_len).to_string(),
        type_id: options.type_id.clone(),
        source_id: options.source_id.clone(),
        locale: options.locale.clone(),
        user_segment_id: None,
    }
}

/// Diff the local set against the remote set.
///
/// Each document claims the remote record carrying its identity key. When
/// several remote records share one external id only the first is claimable;
/// the others end up in the delete set with every unclaimed record.
pub fn plan(documents: &[LocalDocument], remote: &[RemoteRecord]) -> Plan {
    let mut unclaimed: HashMap<&str, usize> = HashMap::with_capacity(remote.len());
    for (idx, record) in remote.iter().enumerate() {
        if unclaimed.contains_key(record.external_id.as_str()) {
            tracing::warn!(
                external_id = %record.external_id,
                record_id = %record.id,
                "duplicate remote external_id; extra record will be deleted"
            );
            continue;
        }
        unclaimed.insert(record.external_id.as_str(), idx);
    }

    let mut claimed = vec![false; remote.len()];
    let mut steps = Vec::with_capacity(documents.len());

    for (doc_idx, doc) in documents.iter().enumerate() {
        match unclaimed.remove(doc.identity_key.as_str()) {
            Some(idx) => {
                claimed[idx] = true;
                steps.push(Step::Update {
                    doc: doc_idx,
                    path: doc.path.clone(),
                    external_id: doc.identity_key.clone(),
                    record_id: remote[idx].id.clone(),
                });
            }
            None => steps.push(Step::Create {
                doc: doc_idx,
                path: doc.path.clone(),
                external_id: doc.identity_key.clone(),
            }),
        }
    }

    for (record, _) in remote.iter().zip(&claimed).filter(|(_, c)| !**c) {
        steps.push(Step::Delete {
            record_id: record.id.clone(),
            external_id: record.external_id.clone(),
            title: record.title.clone(),
        });
    }

    Plan {
        documents: documents.len(),
        remote_records: remote.len(),
        steps,
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Drives one reconciliation pass against a record store.
pub struct Reconciler<A: RecordsApi> {
    api: A,
    options: ReconOptions,
}

impl<A: RecordsApi> Reconciler<A> {
    pub fn new(api: A, options: ReconOptions) -> Self {
        Self { api, options }
    }

    pub fn options(&self) -> &ReconOptions {
        &self.options
    }

    /// Every remote record of the managed type, across all pages.
    pub fn fetch_remote(&self) -> Result<Vec<RemoteRecord>, ReconError> {
        let records = RecordPages::new(&self.api, self.options.type_id.as_str())
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!("Found {} remote records", records.len());
        Ok(records)
    }

    /// Validate and diff without mutating anything.
    pub fn preview(&self, documents: &[LocalDocument]) -> Result<Plan, ReconError> {
        validate_unique(documents)?;
        let remote = self.fetch_remote()?;
        Ok(plan(documents, &remote))
    }

    /// Validate, diff, then upsert every document and delete every unclaimed
    /// record.
    pub fn run(&self, documents: &[LocalDocument]) -> Result<RunReport, ReconError> {
        let plan = self.preview(documents)?;
        self.execute(documents, &plan)
    }

    /// Apply a plan that `preview` computed from the same `documents`.
    fn execute(&self, documents: &[LocalDocument], plan: &Plan) -> Result<RunReport, ReconError> {
        let mut report = RunReport {
            documents: plan.documents,
            remote_records: plan.remote_records,
            ..Default::default()
        };
        let mut failures = Vec::new();

        let deletes = plan.deletes().count();
        let mut announced_deletes = false;

        for step in &plan.steps {
            if matches!(step, Step::Delete { .. }) && !announced_deletes {
                tracing::info!("{deletes} records need to be deleted");
                announced_deletes = true;
            }

            let outcome = self.apply(documents, step);
            match outcome {
                Ok(()) => match step {
                    Step::Create { .. } => report.created += 1,
                    Step::Update { .. } => report.updated += 1,
                    Step::Delete { .. } => report.deleted += 1,
                },
                Err(err) => match self.options.on_error {
                    FailurePolicy::Abort => {
                        tracing::error!(
                            created = report.created,
                            updated = report.updated,
                            deleted = report.deleted,
                            "run aborted at {} of {}",
                            step.operation(),
                            step.target()
                        );
                        return Err(err.into());
                    }
                    FailurePolicy::Continue => {
                        tracing::warn!("continuing after failed {} of {}", step.operation(), step.target());
                        failures.push(Failure::new(step, &err));
                    }
                },
            }
        }

        if !failures.is_empty() {
            return Err(ReconError::Incomplete { failures, report });
        }

        tracing::info!(
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            "Sync complete"
        );
        Ok(report)
    }

    fn apply(&self, documents: &[LocalDocument], step: &Step) -> Result<(), guidesync_client::ClientError> {
        match step {
            Step::Create { doc, path, .. } => {
                tracing::info!("Creating record for {path}");
                self.api.create_record(&build_payload(&documents[*doc], &self.options))
            }
            Step::Update { doc, path, record_id, .. } => {
                tracing::info!("Updating record {record_id} for {path}");
                self.api
                    .update_record(record_id, &build_payload(&documents[*doc], &self.options))
            }
            Step::Delete { record_id, title, .. } => {
                tracing::warn!("Deleting record {record_id}: {title}");
                self.api.delete_record(record_id)
            }
        }
    }
}
