use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Page size applied when the client does not send `page_size`.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on the client-requested page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// PageParams
///
/// The `page` / `page_size` query parameters shared by every paginated admin
/// listing. Both are optional; out-of-range values are clamped rather than
/// rejected.
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
pub struct PageParams {
    /// 1-based page number. Defaults to 1.
    pub page: Option<u32>,
    /// Items per page. Defaults to 10, capped at 100.
    pub page_size: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// SQL OFFSET for the requested page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.page_size())
    }

    /// SQL LIMIT for the requested page.
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size())
    }
}

/// Page
///
/// The response envelope for paginated listings: the total record count for the
/// filtered set, absolute-path links to the adjacent pages, and the current
/// page's items. A page past the end of the set yields empty `results`, not an
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Everything in the request's query string except the page parameters, with a
/// trailing `&` when non-empty, ready to prefix rewritten page links. Filters,
/// search, and ordering must survive into next/previous so that following a
/// link stays on the same filtered set.
fn carried_query(query: Option<&str>) -> String {
    let kept: Vec<&str> = query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(key, _)| key);
            key != "page" && key != "page_size"
        })
        .collect();

    if kept.is_empty() {
        String::new()
    } else {
        format!("{}&", kept.join("&"))
    }
}

impl<T> Page<T> {
    /// Builds the envelope for one page of `results`, deriving the next/previous
    /// links from the request path and query. Non-page query parameters are
    /// carried through unchanged; only `page`/`page_size` are rewritten.
    pub fn new(
        path: &str,
        query: Option<&str>,
        params: &PageParams,
        count: i64,
        results: Vec<T>,
    ) -> Self {
        let page = params.page();
        let page_size = params.page_size();
        let carried = carried_query(query);

        let link = |page: u32| format!("{path}?{carried}page={page}&page_size={page_size}");

        let has_next = i64::from(page) * i64::from(page_size) < count;
        let next = has_next.then(|| link(page + 1));
        let previous = (page > 1).then(|| link(page - 1));

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}
