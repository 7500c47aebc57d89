// src/wikidot/pager.rs

//! Walks multi-page module results.
//!
//! The first answer of a paginated module embeds a `page 1 of N` marker. The
//! walker returns that answer, then requests pages 2..=N one after another
//! with the page parameter rewritten for each index. No marker means there
//! was a single page.

use crate::error::Result;

use super::{ModuleConnector, ModuleResponse, Params, parse};

/// Page parameter value for a 1-based index, for modules numbering pages.
pub fn page_number(index: usize) -> String {
    index.to_string()
}

/// Call `module` until every page has been fetched, in page order.
pub async fn walk<C, F>(
    connector: &C,
    module: &str,
    mut params: Params,
    page_key: &str,
    page_value: F,
) -> Result<Vec<ModuleResponse>>
where
    C: ModuleConnector + ?Sized,
    F: Fn(usize) -> String,
{
    let first = connector.call(module, &params).await?;
    let total = parse::page_count(&first.body)?;
    let mut pages = vec![first];

    let Some(total) = total else {
        return Ok(pages);
    };

    for index in 2..=total {
        log::debug!("Paging through {module} ({index}/{total})");
        params.set(page_key, page_value(index));
        pages.push(connector.call(module, &params).await?);
    }
    Ok(pages)
}
