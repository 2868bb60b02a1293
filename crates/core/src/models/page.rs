use serde_json::Value;

use crate::errors::{DeskError, DeskResult};

/// Zero-based page request.
///
/// The backend numbers pages from one; [`PageQuery::to_params`] is the only
/// place where that translation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageQuery {
    pub page: usize,
    pub limit: usize,
}

impl PageQuery {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page,
            limit: limit.max(1),
        }
    }

    pub fn first(limit: usize) -> Self {
        Self::new(0, limit)
    }

    pub fn offset(&self) -> usize {
        self.page * self.limit
    }

    /// `page`/`limit` query parameters as the backend expects them.
    pub fn to_params(&self) -> [(&'static str, usize); 2] {
        [("page", self.page + 1), ("limit", self.limit)]
    }
}

/// Index of the last reachable page; 0 when there are no rows.
pub fn last_page_index(total: u64, page_size: usize) -> usize {
    let page_size = page_size.max(1) as u64;
    if total == 0 {
        0
    } else {
        (total.div_ceil(page_size) - 1) as usize
    }
}

/// One fetched page of rows plus the pagination metadata it was fetched with.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewPage<T> {
    pub rows: Vec<T>,
    pub total: u64,
    pub page: usize,
    pub page_size: usize,
}

impl<T> ViewPage<T> {
    /// Pages a complete collection client-side.
    pub fn slice(all: Vec<T>, query: PageQuery) -> Self {
        let total = all.len() as u64;
        let rows = all
            .into_iter()
            .skip(query.offset())
            .take(query.limit)
            .collect();
        Self {
            rows,
            total,
            page: query.page,
            page_size: query.limit,
        }
    }

    pub fn last_page(&self) -> usize {
        last_page_index(self.total, self.page_size)
    }

    /// False when the page starts past the end of a non-empty collection.
    pub fn is_in_range(&self) -> bool {
        self.total == 0 || ((self.page * self.page_size) as u64) < self.total
    }

    pub fn try_map<U, F>(self, f: F) -> DeskResult<ViewPage<U>>
    where
        F: FnMut(T) -> DeskResult<U>,
    {
        Ok(ViewPage {
            rows: self.rows.into_iter().map(f).collect::<DeskResult<Vec<U>>>()?,
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        })
    }
}

impl ViewPage<Value> {
    /// Canonicalizes the collection shapes the backend produces.
    ///
    /// `{data: [...], meta: {total}}` is taken as one server page. A bare
    /// array means the endpoint ignored pagination, so it is treated as the
    /// whole collection and sliced here.
    pub fn normalize(body: Value, query: PageQuery) -> DeskResult<Self> {
        match body {
            Value::Array(all) => Ok(ViewPage::slice(all, query)),
            Value::Object(mut map) => {
                let rows = match map.remove("data") {
                    Some(Value::Array(rows)) => rows,
                    Some(Value::Null) | None => Vec::new(),
                    Some(other) => {
                        return Err(DeskError::Decode(format!(
                            "expected `data` to be an array, got {}",
                            kind(&other)
                        )));
                    }
                };
                let reported = map
                    .get("meta")
                    .and_then(|meta| meta.get("total"))
                    .or_else(|| map.get("total"))
                    .and_then(Value::as_u64);
                let mut rows = rows;
                if rows.len() > query.limit {
                    tracing::warn!(
                        "server returned {} rows for a page of {}; truncating",
                        rows.len(),
                        query.limit
                    );
                    rows.truncate(query.limit);
                }
                let total = reported.unwrap_or((query.offset() + rows.len()) as u64);
                Ok(ViewPage {
                    rows,
                    total,
                    page: query.page,
                    page_size: query.limit,
                })
            }
            other => Err(DeskError::Decode(format!(
                "expected a collection, got {}",
                kind(&other)
            ))),
        }
    }
}

/// Rows of an unpaginated collection response, in either shape.
pub fn normalize_rows(body: Value) -> DeskResult<Vec<Value>> {
    match body {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(rows)) => Ok(rows),
            _ => Err(DeskError::Decode("expected `data` to be an array".into())),
        },
        other => Err(DeskError::Decode(format!(
            "expected a collection, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
