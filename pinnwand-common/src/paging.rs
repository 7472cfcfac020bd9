use serde::{Deserialize, Serialize};

/// Default page size of the explore and following feeds.
pub const SHORT_FEED_LIMIT: u32 = 10;
/// Default page size of the personal, liked and per-user feeds.
pub const LONG_FEED_LIMIT: u32 = 100;
/// Larger requested page sizes are clamped to this.
pub const MAX_FEED_LIMIT: u32 = 1000;

/// Raw, client supplied paging parameters.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A normalised, 1-based page.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
pub struct Page {
    pub page: u64,
    pub limit: u32,
}

impl Page {
    /// Missing or non-positive values fall back to page 1 and `default_limit`.
    /// Pages past the end stay past the end.
    #[must_use]
    pub fn new(query: PageQuery, default_limit: u32) -> Self {
        let positive = |value: Option<i64>| {
            value
                .filter(|value| value.is_positive())
                .map(i64::cast_unsigned)
        };

        Self {
            page: positive(query.page).unwrap_or(1),
            limit: positive(query.limit).map_or(default_limit, |limit| {
                u32::try_from(limit).map_or(MAX_FEED_LIMIT, |limit| limit.min(MAX_FEED_LIMIT))
            }),
        }
    }

    /// Saturates, so a far-off page reads as empty rather than wrapping.
    #[must_use]
    pub fn offset(self) -> i64 {
        i64::try_from(self.page.saturating_sub(1))
            .unwrap_or(i64::MAX)
            .saturating_mul(i64::from(self.limit))
    }

    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.limit)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub page: u64,
    pub limit: u32,
    pub items: Vec<T>,
}

impl<T> Paginated<T> {
    #[must_use]
    pub fn new(page: Page, items: Vec<T>) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::paging::{MAX_FEED_LIMIT, Page, PageQuery, SHORT_FEED_LIMIT};

    fn page(page: Option<i64>, limit: Option<i64>) -> Page {
        Page::new(PageQuery { page, limit }, SHORT_FEED_LIMIT)
    }

    #[test]
    fn defaults_apply_to_missing_and_non_positive_values() {
        let first = Page { page: 1, limit: 10 };

        assert_eq!(page(None, None), first);
        assert_eq!(page(Some(0), Some(0)), first);
        assert_eq!(page(Some(-3), Some(-1)), first);
    }

    #[test]
    fn huge_pages_stay_out_of_range() {
        let far = page(Some(i64::from(u32::MAX) + 1), None);
        assert_eq!(far.page, u64::from(u32::MAX) + 1);
        assert!(far.offset() > 0);

        let huge = page(Some(i64::from(u32::MAX)), Some(i64::from(u32::MAX)));
        assert_eq!(huge.limit, MAX_FEED_LIMIT);
        assert_eq!(
            huge.offset(),
            (i64::from(u32::MAX) - 1) * i64::from(MAX_FEED_LIMIT)
        );

        let last = page(Some(i64::MAX), Some(i64::MAX));
        assert_eq!(last.limit, MAX_FEED_LIMIT);
        assert_eq!(last.offset(), i64::MAX);
    }

    #[test]
    fn offsets() {
        assert_eq!(page(Some(1), Some(10)).offset(), 0);
        assert_eq!(page(Some(2), Some(10)).offset(), 10);
        assert_eq!(page(Some(3), Some(25)).offset(), 50);

        let raw = |page| Page { page, limit: 10 };
        assert_eq!(raw(0).offset(), 0);
        assert_eq!(raw(u64::MAX).offset(), i64::MAX);
    }
}
