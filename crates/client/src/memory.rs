//! In-memory record store for tests and offline runs.

use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::Mutex;

use crate::api::RecordsApi;
use crate::error::{ClientError, ErrorBody, Operation};
use crate::model::{PageMeta, RawRecord, RecordPage, RecordPayload, RemoteRecord, TypeRef};

/// One call made against a [`MemoryRecords`] store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create { external_id: String },
    Update { id: String, external_id: String },
    Delete { id: String },
    List { cursor: Option<String> },
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Call::List { .. })
    }
}

#[derive(Debug, Clone)]
struct Stored {
    external_id: Option<String>,
    title: String,
    body: String,
    url: String,
    type_id: String,
}

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<String, Stored>,
    next_id: u64,
    calls: Vec<Call>,
    failing_external_ids: HashSet<String>,
    failing_deletes: HashSet<String>,
}

impl State {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("rec-{:05}", self.next_id)
    }
}

/// Record store held in memory, paginated like the real API.
///
/// Ids are allocated in increasing order, so listing order is creation
/// order. Every call is logged and can be inspected with [`calls`](Self::calls).
#[derive(Debug)]
pub struct MemoryRecords {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for MemoryRecords {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: page_size.max(1),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a record directly (no call is logged). Returns its id.
    pub fn seed(&self, external_id: &str, type_id: &str) -> String {
        let mut state = self.lock();
        let id = state.allocate_id();
        state.records.insert(
            id.clone(),
            Stored {
                external_id: Some(external_id.to_string()),
                title: format!("Seeded {external_id}"),
                body: String::new(),
                url: String::new(),
                type_id: type_id.to_string(),
            },
        );
        id
    }

    /// Insert a record of an unrelated type that has no external id.
    pub fn seed_foreign(&self, type_id: &str) -> String {
        let mut state = self.lock();
        let id = state.allocate_id();
        state.records.insert(
            id.clone(),
            Stored {
                external_id: None,
                title: "Foreign".into(),
                body: String::new(),
                url: String::new(),
                type_id: type_id.to_string(),
            },
        );
        id
    }

    /// Make every create/update carrying `external_id` fail with HTTP 422.
    pub fn fail_writes_for(&self, external_id: &str) {
        self.lock().failing_external_ids.insert(external_id.to_string());
    }

    /// Make deleting record `id` fail with HTTP 500.
    pub fn fail_delete_of(&self, id: &str) {
        self.lock().failing_deletes.insert(id.to_string());
    }

    /// All records of `type_id`, in id order.
    pub fn records_of_type(&self, type_id: &str) -> Vec<RemoteRecord> {
        self.lock()
            .records
            .iter()
            .filter(|(_, r)| r.type_id == type_id)
            .filter_map(|(id, r)| {
                Some(RemoteRecord {
                    id: id.clone(),
                    external_id: r.external_id.clone()?,
                    title: r.title.clone(),
                    body: r.body.clone(),
                    url: r.url.clone(),
                    type_id: r.type_id.clone(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Calls other than `List`.
    pub fn mutations(&self) -> Vec<Call> {
        self.lock().calls.iter().filter(|c| c.is_mutation()).cloned().collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

fn rejected(operation: Operation, status: u16, code: &str, detail: String) -> ClientError {
    ClientError::Status {
        operation,
        status,
        expected: operation.expected_status(),
        body: ErrorBody::Json(serde_json::json!({
            "errors": [{ "code": code, "title": detail }]
        })),
    }
}

impl RecordsApi for MemoryRecords {
    fn create_record(&self, payload: &RecordPayload) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.calls.push(Call::Create {
            external_id: payload.external_id.clone(),
        });

        if state.failing_external_ids.contains(&payload.external_id) {
            return Err(rejected(
                Operation::Create,
                422,
                "InvalidValue",
                format!("record {} rejected", payload.external_id),
            ));
        }
        let taken = state
            .records
            .values()
            .any(|r| r.external_id.as_deref() == Some(payload.external_id.as_str()));
        if taken {
            return Err(rejected(
                Operation::Create,
                422,
                "DuplicateExternalId",
                format!("external_id {} already exists", payload.external_id),
            ));
        }

        let id = state.allocate_id();
        state.records.insert(
            id,
            Stored {
                external_id: Some(payload.external_id.clone()),
                title: payload.title.clone(),
                body: payload.body.clone(),
                url: payload.url.clone(),
                type_id: payload.type_id.clone(),
            },
        );
        Ok(())
    }

    fn update_record(&self, id: &str, payload: &RecordPayload) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.calls.push(Call::Update {
            id: id.to_string(),
            external_id: payload.external_id.clone(),
        });

        if state.failing_external_ids.contains(&payload.external_id) {
            return Err(rejected(
                Operation::Update,
                422,
                "InvalidValue",
                format!("record {} rejected", payload.external_id),
            ));
        }

        let Some(stored) = state.records.get_mut(id) else {
            return Err(rejected(Operation::Update, 404, "RecordNotFound", format!("no record {id}")));
        };
        stored.external_id = Some(payload.external_id.clone());
        stored.title = payload.title.clone();
        stored.body = payload.body.clone();
        stored.url = payload.url.clone();
        stored.type_id = payload.type_id.clone();
        Ok(())
    }

    fn delete_record(&self, id: &str) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.calls.push(Call::Delete { id: id.to_string() });

        if state.failing_deletes.contains(id) {
            return Err(rejected(Operation::Delete, 500, "InternalError", format!("cannot delete {id}")));
        }
        match state.records.remove(id) {
            Some(_) => Ok(()),
            None => Err(rejected(Operation::Delete, 404, "RecordNotFound", format!("no record {id}"))),
        }
    }

    fn list_records(&self, cursor: Option<&str>) -> Result<RecordPage, ClientError> {
        let mut state = self.lock();
        state.calls.push(Call::List {
            cursor: cursor.map(String::from),
        });

        let lower = match cursor {
            Some(c) => Bound::Excluded(c.to_string()),
            None => Bound::Unbounded,
        };
        let mut remaining = state.records.range((lower, Bound::Unbounded));

        let records: Vec<RawRecord> = remaining
            .by_ref()
            .take(self.page_size)
            .map(|(id, r)| RawRecord {
                id: id.clone(),
                external_id: r.external_id.clone(),
                title: Some(r.title.clone()),
                body: Some(r.body.clone()),
                url: Some(r.url.clone()),
                locale: None,
                record_type: TypeRef {
                    id: r.type_id.clone(),
                    name: None,
                },
            })
            .collect();
        let has_more = remaining.next().is_some();

        Ok(RecordPage {
            meta: PageMeta {
                has_more,
                after_cursor: if has_more { records.last().map(|r| r.id.clone()) } else { None },
                before_cursor: None,
            },
            records,
        })
    }
}
