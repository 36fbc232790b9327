//! Lazy enumeration of every remote record of one type.

use std::collections::VecDeque;

use crate::api::RecordsApi;
use crate::client::logged;
use crate::error::ClientError;
use crate::model::{RecordPage, RemoteRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PagerState {
    /// Another page must be fetched once the buffer drains.
    MorePages,
    /// The last page is buffered.
    LastPage,
    /// Exhausted, or stopped after yielding an error.
    Done,
}

/// Iterator over all records of the managed type, across every page.
///
/// Pages are fetched on demand and strictly in cursor order; each cursor is
/// only valid relative to the page that returned it. Entries of other record
/// types are skipped. After yielding an error the iterator is finished.
///
/// Build a new `RecordPages` for every run; it is not rewindable.
pub struct RecordPages<'a, A: RecordsApi + ?Sized> {
    api: &'a A,
    type_id: String,
    cursor: Option<String>,
    buffer: VecDeque<RemoteRecord>,
    state: PagerState,
    pages_fetched: usize,
    skipped: usize,
}

impl<'a, A: RecordsApi + ?Sized> RecordPages<'a, A> {
    pub fn new(api: &'a A, type_id: impl Into<String>) -> Self {
        Self {
            api,
            type_id: type_id.into(),
            cursor: None,
            buffer: VecDeque::new(),
            state: PagerState::MorePages,
            pages_fetched: 0,
            skipped: 0,
        }
    }

    /// Pages requested so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Entries skipped so far because they belong to another record type.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn fail(&mut self, err: ClientError) -> Option<Result<RemoteRecord, ClientError>> {
        self.state = PagerState::Done;
        self.buffer.clear();
        Some(Err(err))
    }

    fn fetch_next_page(&mut self) -> Result<(), ClientError> {
        tracing::debug!(cursor = ?self.cursor, "Fetching records page");
        let page = self.api.list_records(self.cursor.as_deref())?;
        self.pages_fetched += 1;
        self.accept_page(page).map_err(logged)
    }

    /// Buffer the records of `page` and advance the cursor.
    fn accept_page(&mut self, page: RecordPage) -> Result<(), ClientError> {
        for raw in page.records {
            if raw.record_type.id != self.type_id {
                self.skipped += 1;
                continue;
            }
            self.buffer.push_back(RemoteRecord::try_from(raw)?);
        }

        if !page.meta.has_more {
            tracing::debug!(pages = self.pages_fetched, "No more records available");
            self.state = PagerState::LastPage;
            return Ok(());
        }

        let next = match page.meta.after_cursor {
            Some(cursor) if !cursor.is_empty() => cursor,
            _ => {
                return Err(ClientError::Pagination(
                    "has_more=true but no after_cursor was returned".into(),
                ))
            }
        };
        if self.cursor.as_deref() == Some(next.as_str()) {
            return Err(ClientError::Pagination(format!(
                "cursor {next} repeated; the server is not advancing"
            )));
        }

        tracing::debug!(cursor = %next, "More records available");
        self.cursor = Some(next);
        Ok(())
    }
}

impl<A: RecordsApi + ?Sized> Iterator for RecordPages<'_, A> {
    type Item = Result<RemoteRecord, ClientError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }
            match self.state {
                PagerState::Done => return None,
                PagerState::LastPage => {
                    self.state = PagerState::Done;
                    return None;
                }
                PagerState::MorePages => {
                    if let Err(err) = self.fetch_next_page() {
                        return self.fail(err);
                    }
                }
            }
        }
    }
}

impl<A: RecordsApi + ?Sized> std::iter::FusedIterator for RecordPages<'_, A> {}
