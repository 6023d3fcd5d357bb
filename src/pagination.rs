use serde::{Deserialize, Serialize};

pub const ROWS_PER_PAGE: [u32; 4] = [10, 20, 50, 100];
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = ROWS_PER_PAGE[ROWS_PER_PAGE.len() - 1];

// Query string of a paged view, `?limit=..&offset=..`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl PageQuery {
    // Page sizes outside ROWS_PER_PAGE snap up to the next offered size, and
    // like any size change they start over from the first row
    pub fn normalized(self) -> Self {
        if ROWS_PER_PAGE.contains(&self.limit) {
            return self;
        }
        let limit = ROWS_PER_PAGE
            .iter()
            .copied()
            .find(|&size| size >= self.limit)
            .unwrap_or(MAX_LIMIT);
        Self { limit, offset: 0 }
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Where a page sits and where its controls lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u32,
    pub count: u32,
    pub has_more: bool,
}

impl PageWindow {
    pub fn new(query: PageQuery, count: usize, has_more: bool) -> Self {
        Self {
            limit: query.limit.max(1),
            offset: query.offset,
            count: count as u32,
            has_more,
        }
    }

    pub fn previous(&self) -> Option<PageQuery> {
        (self.offset > 0).then(|| PageQuery {
            limit: self.limit,
            offset: self.offset.saturating_sub(self.limit),
        })
    }

    pub fn next(&self) -> Option<PageQuery> {
        self.has_more.then(|| PageQuery {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        })
    }

    pub fn range_label(&self) -> String {
        let first = u64::from(self.offset) + 1;
        format!("{} - {}", first, u64::from(self.offset) + u64::from(self.count))
    }
}

/// One page of rows, fetched one row long to learn whether more exist.
///
/// Serialises with the page controls already worked out: the queries behind
/// the previous/next buttons, the "1 - 10" range label and the page sizes on
/// offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub window: PageWindow,
    pub previous: Option<PageQuery>,
    pub next: Option<PageQuery>,
    pub range: String,
    pub rows_per_page: [u32; 4],
}

impl<T> Page<T> {
    // `rows` came from a request for `query.limit + 1` rows
    pub fn from_overfetch(query: PageQuery, mut rows: Vec<T>) -> Self {
        let limit = query.limit.max(1) as usize;
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let window = PageWindow::new(query, rows.len(), has_more);
        Self {
            items: rows,
            previous: window.previous(),
            next: window.next(),
            range: window.range_label(),
            rows_per_page: ROWS_PER_PAGE,
            window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overfetch_detects_more() {
        let page = Page::from_overfetch(PageQuery { limit: 3, offset: 0 }, vec![1, 2, 3, 4]);
        assert_eq!(page.items, vec![1, 2, 3]);
        assert!(page.window.has_more);

        let last = Page::from_overfetch(PageQuery { limit: 3, offset: 3 }, vec![4, 5]);
        assert!(!last.window.has_more);
        assert_eq!(last.window.range_label(), "4 - 5");
    }

    #[test]
    fn navigation_offsets() {
        let window = PageWindow::new(PageQuery { limit: 10, offset: 5 }, 10, true);
        assert_eq!(window.previous(), Some(PageQuery { limit: 10, offset: 0 }));
        assert_eq!(window.next(), Some(PageQuery { limit: 10, offset: 15 }));

        let first = PageWindow::new(PageQuery::default(), 2, false);
        assert_eq!(first.previous(), None);
        assert_eq!(first.next(), None);
    }

    #[test]
    fn unsupported_sizes_snap_to_an_offered_one() {
        let offered = PageQuery { limit: 50, offset: 100 };
        assert_eq!(offered.normalized(), offered);

        let odd = PageQuery { limit: 15, offset: 30 };
        assert_eq!(odd.normalized(), PageQuery { limit: 20, offset: 0 });
        let zero = PageQuery { limit: 0, offset: 0 };
        assert_eq!(zero.normalized().limit, DEFAULT_LIMIT);

        let huge = PageQuery { limit: u32::MAX, offset: 7 };
        assert_eq!(huge.normalized(), PageQuery { limit: MAX_LIMIT, offset: 0 });
    }

    #[test]
    fn serializes_flat() {
        let page = Page::from_overfetch(PageQuery::default(), vec!["a"]);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["items"][0], "a");
        assert_eq!(json["hasMore"], false);
        assert_eq!(json["limit"], 10);
        assert_eq!(json["range"], "1 - 1");
        assert_eq!(json["next"], serde_json::Value::Null);
        assert_eq!(json["rowsPerPage"], serde_json::json!([10, 20, 50, 100]));
    }
}
