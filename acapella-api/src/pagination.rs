//! Cursor pagination for merged activity feeds
//!
//! A cursor remembers the sort key of the last returned item: its timestamp
//! in epoch milliseconds plus the item id as a tiebreak. Every feed source
//! query is re-issued "strictly older than the cursor", the results merged,
//! re-sorted, and sliced to the page size.
//!
//! `has_more` is computed by fetching one row past the page size from each
//! source and checking whether anything survived beyond the slice boundary,
//! so a page shortened by merging never misreports the end of the feed.

use acapella_common::db::models::ActivityItem;
use acapella_common::{Error, Result};
use serde::Serialize;

/// Default feed page size.
pub const DEFAULT_PAGE_SIZE: i64 = 15;

/// Upper bound on caller-requested page size.
pub const MAX_PAGE_SIZE: i64 = 50;

/// Sort key of the last item on the previous page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: i64,
}

impl Cursor {
    /// Parse the `cursor` query parameter (epoch milliseconds).
    pub fn parse(raw: &str) -> Result<Cursor> {
        let created_at = raw
            .parse::<i64>()
            .map_err(|_| Error::InvalidInput(format!("Invalid cursor: {}", raw)))?;
        Ok(Cursor { created_at })
    }

    pub fn encode(&self) -> String {
        self.created_at.to_string()
    }
}

/// Clamp a caller-requested page size into [1, MAX_PAGE_SIZE].
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// One page of a merged feed.
#[derive(Debug, Serialize)]
pub struct FeedPage {
    pub items: Vec<ActivityItem>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Merge per-source result sets (each fetched with `limit + 1` rows) into one
/// page: sort newest first with id as tiebreak, slice to `limit`, and report
/// whether anything remains past the boundary.
pub fn merge_into_page(sources: Vec<Vec<ActivityItem>>, limit: i64) -> FeedPage {
    let mut merged: Vec<ActivityItem> = sources.into_iter().flatten().collect();
    merged.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });

    let has_more = merged.len() as i64 > limit;
    merged.truncate(limit as usize);

    let next_cursor = if has_more {
        merged.last().map(|item| {
            Cursor {
                created_at: item.created_at,
            }
            .encode()
        })
    } else {
        None
    };

    FeedPage {
        items: merged,
        next_cursor,
        has_more,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acapella_common::db::models::{ActivityItem, ActivityType};

    fn item(id: &str, created_at: i64) -> ActivityItem {
        ActivityItem {
            activity_type: ActivityType::Review,
            id: id.to_string(),
            user_id: "u1".to_string(),
            user_display_name: None,
            user_photo_url: None,
            entity_type: "song".to_string(),
            entity_id: "s1".to_string(),
            entity_title: None,
            entity_cover_art_url: None,
            entity_username: None,
            rating: Some(4),
            review_text: None,
            created_at,
        }
    }

    #[test]
    fn test_cursor_round_trip() {
        let c = Cursor { created_at: 1700000000123 };
        assert_eq!(Cursor::parse(&c.encode()).unwrap(), c);
        assert!(Cursor::parse("not-a-number").is_err());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(9999)), MAX_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(7)), 7);
    }

    #[test]
    fn test_merge_sorts_newest_first() {
        let page = merge_into_page(
            vec![
                vec![item("a", 100), item("b", 300)],
                vec![item("c", 200)],
            ],
            10,
        );
        let ids: Vec<_> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_merge_reports_has_more_past_slice() {
        // Two sources of 3 each, page size 4: two items survive the slice,
        // so has_more must be true even though each source returned fewer
        // than limit + 1 on its own.
        let page = merge_into_page(
            vec![
                vec![item("a", 600), item("b", 500), item("c", 400)],
                vec![item("d", 350), item("e", 300), item("f", 250)],
            ],
            4,
        );
        assert_eq!(page.items.len(), 4);
        assert!(page.has_more);
        assert_eq!(page.next_cursor.as_deref(), Some("350"));
    }

    #[test]
    fn test_merge_exact_page_is_final() {
        let page = merge_into_page(vec![vec![item("a", 2), item("b", 1)]], 2);
        assert_eq!(page.items.len(), 2);
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_merge_empty_sources() {
        let page = merge_into_page(vec![vec![], vec![], vec![]], 15);
        assert!(page.items.is_empty());
        assert!(!page.has_more);
    }
}
