//! Fixed-size pagination over sea-orm selects.

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, Select};
use serde::{Deserialize, Serialize};

/// Posts shown per listing page.
pub const PAGE_SIZE: u64 = 10;

/// `?page=` query parameter. Kept raw so that garbage falls back to page 1
/// instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u64>,
    pub previous_page_number: Option<u64>,
}

impl<T> Page<T> {
    fn new(object_list: Vec<T>, number: u64, num_pages: u64, count: u64) -> Self {
        let has_next = number < num_pages;
        let has_previous = number > 1;
        Page {
            object_list,
            number,
            num_pages,
            count,
            has_next,
            has_previous,
            next_page_number: has_next.then_some(number + 1),
            previous_page_number: has_previous.then(|| number - 1),
        }
    }

    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }

    /// Replaces the page items while keeping the page metadata.
    pub fn with_items<U>(self, object_list: Vec<U>) -> Page<U> {
        Page {
            object_list,
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.has_next,
            has_previous: self.has_previous,
            next_page_number: self.next_page_number,
            previous_page_number: self.previous_page_number,
        }
    }
}

/// Number of pages for `count` items; an empty listing still has one page.
pub fn num_pages(count: u64, page_size: u64) -> u64 {
    count.div_ceil(page_size).max(1)
}

/// Resolves a raw `page` parameter to a 1-based page number.
///
/// Missing or non-numeric input gives the first page; anything outside
/// `1..=num_pages` gives the last page.
pub fn resolve_page(raw: Option<&str>, num_pages: u64) -> u64 {
    let Some(parsed) = raw.and_then(|p| p.trim().parse::<i64>().ok()) else {
        return 1;
    };
    if parsed < 1 || parsed as u64 > num_pages {
        num_pages
    } else {
        parsed as u64
    }
}

/// Fetches one page of `query`. Ordering is the caller's responsibility.
pub async fn paginate<'db, C, E>(
    query: Select<E>,
    db: &'db C,
    raw_page: Option<&str>,
) -> Result<Page<E::Model>, DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync + 'db,
{
    let paginator = query.paginate(db, PAGE_SIZE);
    let count = paginator.num_items().await?;
    let pages = num_pages(count, PAGE_SIZE);
    let number = resolve_page(raw_page, pages);
    let items = paginator.fetch_page(number - 1).await?;

    Ok(Page::new(items, number, pages, count))
}
