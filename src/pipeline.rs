//! Sort, paginate and expand over the results held in the [`SearchStore`].
//!
//! The pipeline owns only view state (sort key, page, expanded row). The
//! rows themselves are always re-derived from the store, so a fresh search
//! shows up without any copying.

use crate::models::Itinerary;
use crate::store::SearchStore;
use std::cmp::Ordering;

pub const PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    None,
    Price,
    Duration,
    Stops,
}

impl SortKey {
    /// Cycle order used by the sort key binding.
    pub fn next(self) -> Self {
        match self {
            SortKey::None => SortKey::Price,
            SortKey::Price => SortKey::Duration,
            SortKey::Duration => SortKey::Stops,
            SortKey::Stops => SortKey::None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::None => "Best",
            SortKey::Price => "Price",
            SortKey::Duration => "Duration",
            SortKey::Stops => "Stops",
        }
    }
}

/// Stable sort by `key`. Itineraries missing the sorted-on data go last.
pub fn sort_itineraries(items: &[Itinerary], key: SortKey) -> Vec<&Itinerary> {
    sorted_positions(items, key)
        .into_iter()
        .map(|i| &items[i])
        .collect()
}

/// Same order as [`sort_itineraries`], as positions into `items`.
fn sorted_positions(items: &[Itinerary], key: SortKey) -> Vec<usize> {
    let price = |i: usize| items[i].price.raw;
    let elapsed = |i: usize| items[i].first_leg().and_then(|l| l.elapsed());
    let stops = |i: usize| items[i].first_leg().map(|l| l.stop_count);

    let mut order: Vec<usize> = (0..items.len()).collect();
    match key {
        SortKey::None => {}
        SortKey::Price => {
            order.sort_by(|&a, &b| missing_last(price(a), price(b), f64::total_cmp))
        }
        SortKey::Duration => {
            order.sort_by(|&a, &b| missing_last(elapsed(a), elapsed(b), |x, y| x.cmp(y)))
        }
        SortKey::Stops => {
            order.sort_by(|&a, &b| missing_last(stops(a), stops(b), |x, y| x.cmp(y)))
        }
    }
    order
}

fn missing_last<T>(a: Option<T>, b: Option<T>, cmp: impl FnOnce(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn total_pages(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE)
}

/// Everything the results area needs for one frame.
#[derive(Debug)]
pub struct PageView<'a> {
    pub items: Vec<&'a Itinerary>,
    pub total_pages: usize,
    pub current_page: usize,
    /// Position within `items` of the expanded row, if it is on this page.
    pub expanded_index: Option<usize>,
    pub sort_key: SortKey,
    pub total_results: usize,
    pub loading: bool,
    pub error: Option<&'a str>,
}

#[derive(Debug)]
pub struct ResultPipeline {
    sort_key: SortKey,
    current_page: usize,
    /// Position in the store's result list, so identical itineraries stay
    /// distinct. Only meaningful for `seen_generation`.
    expanded: Option<usize>,
    seen_generation: Option<u64>,
}

impl Default for ResultPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultPipeline {
    pub fn new() -> Self {
        Self {
            sort_key: SortKey::None,
            current_page: 1,
            expanded: None,
            seen_generation: None,
        }
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Resets paging and expansion when the store holds a new result set.
    pub fn sync(&mut self, store: &SearchStore) {
        if self.seen_generation != Some(store.generation()) {
            self.seen_generation = Some(store.generation());
            self.current_page = 1;
            self.expanded = None;
        }
    }

    pub fn change_sort(&mut self, key: SortKey) {
        self.sort_key = key;
    }

    /// Moves to page `page`, clamped to the pages that exist.
    pub fn change_page(&mut self, store: &SearchStore, page: usize) {
        self.sync(store);
        let last = total_pages(store.results().len()).max(1);
        self.current_page = page.clamp(1, last);
    }

    /// Toggles the detail row for the item at `row` on the current page.
    /// Only one row is expanded at a time.
    pub fn toggle_expand(&mut self, store: &SearchStore, row: usize) {
        self.sync(store);
        let Some(&position) = self.page_positions(store).get(row) else {
            return;
        };
        self.expanded = if self.expanded == Some(position) {
            None
        } else {
            Some(position)
        };
    }

    fn clamped_page(&self, count: usize) -> usize {
        self.current_page.clamp(1, total_pages(count).max(1))
    }

    /// Store positions of the rows on the current page, in display order.
    fn page_positions(&self, store: &SearchStore) -> Vec<usize> {
        let results = store.results();
        let current_page = self.clamped_page(results.len());
        sorted_positions(results, self.sort_key)
            .into_iter()
            .skip((current_page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect()
    }

    pub fn view<'a>(&self, store: &'a SearchStore) -> PageView<'a> {
        let results = store.results();
        let page = self.page_positions(store);
        let expanded_index = self
            .expanded
            .and_then(|position| page.iter().position(|&i| i == position));

        PageView {
            items: page.iter().map(|&i| &results[i]).collect(),
            total_pages: total_pages(results.len()),
            current_page: self.clamped_page(results.len()),
            expanded_index,
            sort_key: self.sort_key,
            total_results: results.len(),
            loading: store.loading(),
            error: store.error(),
        }
    }
}
