use crate::error::ClientError;
use crate::model::{RecordPage, RecordPayload};

/// The remote record store.
///
/// Every call is blocking and either succeeds with the expected status or
/// returns the error; implementations never retry and never swallow failures.
pub trait RecordsApi {
    /// Create a new record. Not idempotent.
    fn create_record(&self, payload: &RecordPayload) -> Result<(), ClientError>;

    /// Overwrite record `id` with `payload`. Idempotent.
    fn update_record(&self, id: &str, payload: &RecordPayload) -> Result<(), ClientError>;

    /// Delete record `id`. Idempotent.
    fn delete_record(&self, id: &str) -> Result<(), ClientError>;

    /// Fetch one page. `None` starts from the beginning of the collection.
    fn list_records(&self, cursor: Option<&str>) -> Result<RecordPage, ClientError>;
}

impl<T: RecordsApi + ?Sized> RecordsApi for &T {
    fn create_record(&self, payload: &RecordPayload) -> Result<(), ClientError> {
        (**self).create_record(payload)
    }

    fn update_record(&self, id: &str, payload: &RecordPayload) -> Result<(), ClientError> {
        (**self).update_record(id, payload)
    }

    fn delete_record(&self, id: &str) -> Result<(), ClientError> {
        (**self).delete_record(id)
    }

    fn list_records(&self, cursor: Option<&str>) -> Result<RecordPage, ClientError> {
        (**self).list_records(cursor)
    }
}
