//! Derived views over a collection: filtering, sorting, pagination, stats
//!
//! Nothing here is cached. Every call recomputes from the collection it is
//! given, so a view can never drift from the data behind it.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::collection::Collection;
use crate::models::{Category, Entry, SortOption, StreamStatus};

pub const PAGE_SIZE: usize = 100;

/// Sentinel shown first in the group filter
pub const ALL: &str = "All";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GroupFilter {
    #[default]
    All,
    Named(String),
}

impl GroupFilter {
    /// Build from a combo-box value, where "All" is the sentinel
    pub fn from_option(value: &str) -> Self {
        if value == ALL {
            GroupFilter::All
        } else {
            GroupFilter::Named(value.to_string())
        }
    }

    pub fn matches(&self, group: &str) -> bool {
        match self {
            GroupFilter::All => true,
            GroupFilter::Named(g) => g == group,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            GroupFilter::All => ALL,
            GroupFilter::Named(g) => g,
        }
    }
}

/// Everything that determines the page shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewCriteria {
    pub search: String,
    pub category: CategoryFilter,
    pub group: GroupFilter,
    pub sort: SortOption,
    /// 1-based
    pub page: usize,
}

impl Default for ViewCriteria {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: CategoryFilter::All,
            group: GroupFilter::All,
            sort: SortOption::NameAsc,
            page: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaylistStats {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub groups: usize,
    pub duplicates: usize,
    pub tv_count: usize,
    pub movie_count: usize,
    pub series_count: usize,
    pub other_count: usize,
}

impl PlaylistStats {
    pub fn unknown(&self) -> usize {
        self.total.saturating_sub(self.online + self.offline)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView<'a> {
    pub page: Vec<&'a Entry>,
    pub total_matched: usize,
    pub total_pages: usize,
    pub stats: PlaylistStats,
}

/// Filter, sort and slice the collection for display
pub fn derive<'a>(collection: &'a Collection, criteria: &ViewCriteria) -> DerivedView<'a> {
    let matched = filter_and_sort(collection.entries(), criteria);
    let total_matched = matched.len();
    let page = paginate(&matched, criteria.page).to_vec();

    DerivedView {
        page,
        total_matched,
        total_pages: total_pages(total_matched),
        stats: stats(collection),
    }
}

/// All matching entries in display order, before pagination
pub fn filter_and_sort<'a>(entries: &'a [Entry], criteria: &ViewCriteria) -> Vec<&'a Entry> {
    let needle = criteria.search.to_lowercase();
    let mut matched: Vec<&Entry> = entries
        .iter()
        .filter(|e| matches_search(e, &needle))
        .filter(|e| criteria.category.matches(e.category))
        .filter(|e| criteria.group.matches(e.group()))
        .collect();

    // sort_by is stable, so equal keys keep collection order
    match criteria.sort {
        SortOption::NameAsc => matched.sort_by(|a, b| locale_cmp(&a.name, &b.name)),
        SortOption::NameDesc => matched.sort_by(|a, b| locale_cmp(&b.name, &a.name)),
        SortOption::GroupAsc => matched.sort_by(|a, b| locale_cmp(a.group(), b.group())),
        SortOption::UrlAsc => matched.sort_by(|a, b| locale_cmp(&a.url, &b.url)),
    }

    matched
}

fn matches_search(entry: &Entry, needle: &str) -> bool {
    needle.is_empty()
        || entry.name.to_lowercase().contains(needle)
        || entry.url.to_lowercase().contains(needle)
}

/// Case-insensitive primary ordering; on a tie lowercase sorts first
/// ("apple" < "Apple" < "banana")
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    primary.then_with(|| b.cmp(a))
}

/// Slice `[(page-1)*size, page*size)`, empty past the end. Page 0 reads as page 1.
pub fn paginate<T>(items: &[T], page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    if start >= items.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}

pub fn total_pages(matched: usize) -> usize {
    matched.div_ceil(PAGE_SIZE)
}

/// Bring a requested page back into `1..=total_pages` (1 when there are none)
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Groups offered in the filter combo for the active category tab,
/// preceded by the "All" sentinel
pub fn group_filter_options(collection: &Collection, category: CategoryFilter) -> Vec<String> {
    let mut groups: Vec<String> = match category {
        CategoryFilter::All => collection.all_groups(),
        CategoryFilter::Only(c) => {
            let set: HashSet<&str> = collection
                .entries()
                .iter()
                .filter(|e| e.category == c)
                .map(|e| e.group())
                .collect();
            set.into_iter().map(str::to_string).collect()
        }
    };
    groups.sort_by(|a, b| locale_cmp(a, b));

    let mut options = Vec::with_capacity(groups.len() + 1);
    options.push(ALL.to_string());
    options.extend(groups.into_iter().filter(|g| g != ALL));
    options
}

/// Group names containing `search` (case-insensitive), for the group manager
pub fn filter_groups(collection: &Collection, search: &str) -> Vec<String> {
    let needle = search.to_lowercase();
    collection
        .all_groups()
        .into_iter()
        .filter(|g| g.to_lowercase().contains(&needle))
        .collect()
}

/// Statistics over the whole collection, independent of any filter
pub fn stats(collection: &Collection) -> PlaylistStats {
    let entries = collection.entries();
    let mut stats = PlaylistStats {
        total: entries.len(),
        groups: collection.all_groups().len(),
        ..Default::default()
    };

    let mut urls = HashSet::with_capacity(entries.len());
    for entry in entries {
        match entry.status {
            StreamStatus::Online => stats.online += 1,
            StreamStatus::Offline => stats.offline += 1,
            StreamStatus::Unknown | StreamStatus::Checking => {}
        }
        match entry.category {
            Category::Tv => stats.tv_count += 1,
            Category::Movie => stats.movie_count += 1,
            Category::Series => stats.series_count += 1,
            Category::Other => stats.other_count += 1,
        }
        urls.insert(entry.url.as_str());
    }
    stats.duplicates = entries.len() - urls.len();

    stats
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
