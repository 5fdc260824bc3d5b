use crate::error::{PipelineError, Result};
use crate::services::subgraph::{PageVariables, SubgraphClient};
use futures::stream::{self, BoxStream, StreamExt};
use log::info;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(100);

/// A query whose records live in the array `field` of the response data.
#[derive(Debug, Clone, Copy)]
pub struct PagedQuery<'a> {
    pub endpoint: &'a str,
    pub query: &'a str,
    pub field: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct PageSettings {
    pub page_size: usize,
    /// Fixed pause between consecutive requests.
    pub page_delay: Duration,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

enum Cursor {
    Next { skip: usize, page: usize },
    Done,
}

/// Streams the pages of `query` from offset zero until the source returns a
/// short or empty page. A source error is yielded once and ends the stream.
pub fn fetch_pages<'a>(
    client: &'a dyn SubgraphClient,
    query: PagedQuery<'a>,
    settings: PageSettings,
) -> BoxStream<'a, Result<Vec<Value>>> {
    let page_size = settings.page_size.max(1);

    stream::try_unfold(Cursor::Next { skip: 0, page: 1 }, move |cursor| {
        fetch_page(client, query, page_size, settings.page_delay, cursor)
    })
    .boxed()
}

async fn fetch_page(
    client: &dyn SubgraphClient,
    query: PagedQuery<'_>,
    page_size: usize,
    page_delay: Duration,
    cursor: Cursor,
) -> Result<Option<(Vec<Value>, Cursor)>> {
    let (skip, page) = match cursor {
        Cursor::Next { skip, page } => (skip, page),
        Cursor::Done => return Ok(None),
    };
    if skip > 0 && !page_delay.is_zero() {
        sleep(page_delay).await;
    }

    let data = client
        .execute(
            query.endpoint,
            query.query,
            PageVariables {
                first: page_size,
                skip,
            },
        )
        .await?;
    let records = extract_records(data, query.field)?;
    info!(
        "Fetched {} {} on page {} (skip: {})",
        records.len(),
        query.field,
        page,
        skip
    );

    if records.is_empty() {
        return Ok(None);
    }
    let next = if records.len() < page_size {
        Cursor::Done
    } else {
        Cursor::Next {
            skip: skip + page_size,
            page: page + 1,
        }
    };
    Ok(Some((records, next)))
}

fn extract_records(mut data: Value, field: &str) -> Result<Vec<Value>> {
    match data.get_mut(field).map(Value::take) {
        Some(Value::Array(records)) => Ok(records),
        Some(Value::Null) | None => Err(PipelineError::Schema(format!(
            "response data has no `{}` field",
            field
        ))),
        Some(other) => Err(PipelineError::Schema(format!(
            "`{}` is not a list: {}",
            field, other
        ))),
    }
}
