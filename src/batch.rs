// Lazy batch reading.
// Offset-based pagination over a row source, plus an ordered filtering consumer.

use async_trait::async_trait;
use futures::Stream;
use serde_json::{Map, Value};

use crate::error::{LazyOrgError, Result};

/// One record: column name to value.
pub type Row = Map<String, Value>;

/// An ordered slice of rows, at most one page size long.
pub type Page = Vec<Row>;

/// Minimum age (exclusive) used by [`batch_processing`].
pub const DEFAULT_MIN_AGE: f64 = 25.0;

/// A store that can serve a bounded slice of rows.
#[async_trait]
pub trait RowSource: Send {
    /// Fetch at most `limit` rows starting at `offset`.
    async fn fetch_page(&mut self, limit: u64, offset: u64) -> Result<Page>;
}

#[async_trait]
impl<S: RowSource + ?Sized> RowSource for Box<S> {
    async fn fetch_page(&mut self, limit: u64, offset: u64) -> Result<Page> {
        (**self).fetch_page(limit, offset).await
    }
}

/// Lazy sequence of pages read from a [`RowSource`].
///
/// Each call to [`Paginator::next_page`] issues one query. The sequence ends at the
/// first empty page or the first error; at that point the source is dropped.
/// Dropping the paginator early drops the source too. It cannot be rewound;
/// build a new one to read from the start again.
pub struct Paginator<S> {
    source: Option<S>,
    page_size: u64,
    offset: u64,
}

impl<S: RowSource> Paginator<S> {
    pub fn new(source: S, page_size: u64) -> Result<Self> {
        if page_size == 0 {
            return Err(LazyOrgError::Precondition(
                "page size must be positive".into(),
            ));
        }
        Ok(Self {
            source: Some(source),
            page_size,
            offset: 0,
        })
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Offset the next query will start from.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether the source has been released.
    pub fn is_exhausted(&self) -> bool {
        self.source.is_none()
    }

    /// Fetch the next non-empty page, or `None` once the source runs dry.
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };

        let page = match source.fetch_page(self.page_size, self.offset).await {
            Ok(page) => page,
            Err(e) => {
                log::debug!("page fetch at offset {} failed: {e}", self.offset);
                self.release();
                return Err(e);
            }
        };

        if page.is_empty() {
            log::debug!("no rows at offset {}, sequence finished", self.offset);
            self.release();
            return Ok(None);
        }

        log::trace!("page of {} rows at offset {}", page.len(), self.offset);
        self.offset += self.page_size;
        Ok(Some(page))
    }

    /// Expose the remaining pages as a stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<Page>> {
        futures::stream::try_unfold(self, |mut pages| async move {
            let page = pages.next_page().await?;
            Ok::<_, LazyOrgError>(page.map(|page| (page, pages)))
        })
    }

    fn release(&mut self) {
        self.source = None;
    }
}

/// Pages of `batch_size` rows read from `source`.
pub fn stream_batches<S: RowSource>(source: S, batch_size: u64) -> Result<Paginator<S>> {
    Paginator::new(source, batch_size)
}

/// Pages of `page_size` rows served by the store's pagination query.
pub fn lazy_paginate<S: RowSource>(source: S, page_size: u64) -> Result<Paginator<S>> {
    Paginator::new(source, page_size)
}

/// Walk every row of every page in order and pass matches to `emit`.
///
/// Returns how many rows were emitted. If a page fetch fails, rows from earlier
/// pages have already been emitted and the error is returned.
pub async fn filter_batches<S, P, E>(
    pages: &mut Paginator<S>,
    predicate: P,
    mut emit: E,
) -> Result<usize>
where
    S: RowSource,
    P: Fn(&Row) -> bool,
    E: FnMut(Row),
{
    let mut emitted = 0;
    while let Some(page) = pages.next_page().await? {
        for row in page {
            if predicate(&row) {
                emit(row);
                emitted += 1;
            }
        }
    }
    Ok(emitted)
}

/// Predicate matching rows whose numeric `age` is strictly above `min_age`.
pub fn older_than(min_age: f64) -> impl Fn(&Row) -> bool {
    move |row| {
        row.get("age")
            .and_then(Value::as_f64)
            .is_some_and(|age| age > min_age)
    }
}

/// Stream `source` in batches and emit every row with `age > 25`.
pub async fn batch_processing<S, E>(source: S, batch_size: u64, emit: E) -> Result<usize>
where
    S: RowSource,
    E: FnMut(Row),
{
    let mut pages = stream_batches(source, batch_size)?;
    filter_batches(&mut pages, older_than(DEFAULT_MIN_AGE), emit).await
}
