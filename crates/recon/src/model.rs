use guidesync_client::{ClientError, Operation};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// One remote mutation the reconciler intends to make.
///
/// `doc` indexes into the document slice the plan was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Create {
        #[serde(skip)]
        doc: usize,
        path: String,
        external_id: String,
    },
    Update {
        #[serde(skip)]
        doc: usize,
        path: String,
        external_id: String,
        record_id: String,
    },
    Delete {
        record_id: String,
        external_id: String,
        title: String,
    },
}

impl Step {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Create { .. } => Operation::Create,
            Self::Update { .. } => Operation::Update,
            Self::Delete { .. } => Operation::Delete,
        }
    }

    /// Local path for upserts, remote id for deletes.
    pub fn target(&self) -> &str {
        match self {
            Self::Create { path, .. } | Self::Update { path, .. } => path,
            Self::Delete { record_id, .. } => record_id,
        }
    }
}

/// The full diff between the local set and the remote set.
///
/// Upserts come first in document order, deletes last in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub documents: usize,
    pub remote_records: usize,
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn creates(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| matches!(s, Step::Create { .. }))
    }

    pub fn updates(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| matches!(s, Step::Update { .. }))
    }

    pub fn deletes(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| matches!(s, Step::Delete { .. }))
    }

    /// Report of what executing the plan would do.
    pub fn preview(&self) -> RunReport {
        RunReport {
            documents: self.documents,
            remote_records: self.remote_records,
            created: self.creates().count(),
            updated: self.updates().count(),
            deleted: self.deletes().count(),
            dry_run: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub documents: usize,
    pub remote_records: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub dry_run: bool,
}

/// A mutation that failed under the continue policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub operation: String,
    pub target: String,
    pub status: Option<u16>,
    pub message: String,
}

impl Failure {
    pub fn new(step: &Step, err: &ClientError) -> Self {
        Self {
            operation: step.operation().to_string(),
            target: step.target().to_string(),
            status: err.status(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_preview_counts_steps() {
        let plan = Plan {
            documents: 2,
            remote_records: 2,
            steps: vec![
                Step::Create { doc: 0, path: "a.html".into(), external_id: "ka".into() },
                Step::Update {
                    doc: 1,
                    path: "b.html".into(),
                    external_id: "kb".into(),
                    record_id: "R2".into(),
                },
                Step::Delete { record_id: "R9".into(), external_id: "kz".into(), title: "Z".into() },
            ],
        };

        let report = plan.preview();
        assert_eq!((report.created, report.updated, report.deleted), (1, 1, 1));
        assert!(report.dry_run);
    }

    #[test]
    fn steps_serialize_without_document_index() {
        let step = Step::Create { doc: 7, path: "a.html".into(), external_id: "ka".into() };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json, serde_json::json!({"action": "create", "path": "a.html", "external_id": "ka"}));
    }
}
