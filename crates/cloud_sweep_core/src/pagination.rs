use std::collections::HashSet;

use crate::descriptor::Page;
use crate::error::SweepError;
use crate::predicate::Predicate;

/// Fetches every page of a remote inventory and keeps the items matching
/// `predicate`.
///
/// `fetch_page` receives `None` for the first page and the previous page's
/// continuation token afterwards. A failed page aborts the whole drain so a
/// partial inventory is never mistaken for the full one. A token that was
/// already followed once is a pagination cycle and aborts the drain too.
pub fn drain<T, F, P>(mut fetch_page: F, predicate: &P) -> Result<Vec<T>, SweepError>
where
    F: FnMut(Option<&str>) -> Result<Page<T>, String>,
    P: Predicate<T> + ?Sized,
{
    let mut selected = Vec::new();
    let mut token: Option<String> = None;
    let mut seen_tokens: HashSet<String> = HashSet::new();
    let mut page = 0usize;

    loop {
        page += 1;
        let fetched = fetch_page(token.as_deref())
            .map_err(|message| SweepError::PageFetch { page, message })?;
        let next = fetched.continuation().map(str::to_string);

        selected.extend(
            fetched
                .items
                .into_iter()
                .filter(|item| predicate.matches(item)),
        );

        match next {
            Some(next) if !seen_tokens.insert(next.clone()) => {
                return Err(SweepError::PaginationLoop { page, token: next });
            }
            Some(next) => token = Some(next),
            None => return Ok(selected),
        }
    }
}
