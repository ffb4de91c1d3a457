use crate::app::paging::Page;
use crate::app::pokeapi::EntitySummary;

/// How far from the end of the loaded collection the cursor may get before
/// the next page is requested.
pub const PREFETCH_DISTANCE: usize = 10;

/// Why a page was requested; decides how its result is folded back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadKind {
    /// Normal forward pagination, appended at the tail.
    Append,
    /// Refresh-at-anchor: the page is already loaded and gets patched in
    /// place, earlier pages untouched.
    Patch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    key: u32,
    kind: LoadKind,
}

/// A retryable page-load failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub key: u32,
    pub message: String,
}

/// Owns the running collection of catalog entries and the pagination state
/// machine around it: which key to load next, the single in-flight load, and
/// the last failure.
///
/// The collection is append-only in key order; a full refresh is the only
/// thing that may rewrite existing entries, and then only the anchored page.
#[derive(Debug)]
pub struct CatalogBrowser {
    entries: Vec<EntitySummary>,
    page_size: u32,
    next_key: Option<u32>,
    in_flight: Option<InFlight>,
    failure: Option<PageFailure>,
    pages_loaded: u32,
}

impl CatalogBrowser {
    pub fn new(page_size: u32) -> Self {
        Self {
            entries: Vec::new(),
            page_size: page_size.max(1),
            next_key: Some(0),
            in_flight: None,
            failure: None,
            pages_loaded: 0,
        }
    }

    pub fn entries(&self) -> &[EntitySummary] {
        &self.entries
    }

    pub fn failure(&self) -> Option<&PageFailure> {
        self.failure.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True until the first page has arrived; drives the full-pane loading
    /// indicator.
    pub fn is_initial_load(&self) -> bool {
        self.pages_loaded == 0 && self.failure.is_none()
    }

    pub fn end_reached(&self) -> bool {
        self.next_key.is_none()
    }

    /// Whether the viewer is close enough to the tail that the next page
    /// should be requested.
    pub fn near_end(&self, cursor: usize) -> bool {
        cursor + PREFETCH_DISTANCE >= self.entries.len()
    }

    /// Claims the next page load. Returns the key to load, or `None` when a
    /// load is already in flight, the catalog is exhausted, or a failure is
    /// waiting for an explicit retry.
    pub fn begin_load(&mut self) -> Option<u32> {
        if self.in_flight.is_some() || self.failure.is_some() {
            return None;
        }
        let key = self.next_key?;
        self.in_flight = Some(InFlight {
            key,
            kind: LoadKind::Append,
        });
        Some(key)
    }

    /// Claims a refresh of the page containing `anchor_row`. The prior pages
    /// stay as they are; only the anchored page will be rewritten when the
    /// result arrives.
    pub fn begin_refresh(&mut self, anchor_row: usize) -> Option<u32> {
        if self.in_flight.is_some() || self.pages_loaded == 0 {
            return None;
        }
        let key = (anchor_row as u32 / self.page_size).min(self.pages_loaded - 1);
        self.failure = None;
        self.in_flight = Some(InFlight {
            key,
            kind: LoadKind::Patch,
        });
        Some(key)
    }

    /// Clears a recorded failure so `begin_load` will hand out the same key
    /// again.
    pub fn retry(&mut self) -> bool {
        self.failure.take().is_some()
    }

    /// Folds a completed page back in. Pages that no load is waiting for
    /// (stale responses, duplicate deliveries) are discarded.
    pub fn apply_page(&mut self, page: Page) {
        let Some(in_flight) = self.in_flight else {
            return;
        };
        if in_flight.key != page.page_index {
            return;
        }
        self.in_flight = None;

        match in_flight.kind {
            LoadKind::Append => {
                self.entries.extend(page.items);
                self.next_key = page.next_key;
                self.pages_loaded = page.page_index + 1;
            }
            LoadKind::Patch => {
                let start = (page.page_index * self.page_size) as usize;
                let end = (start + self.page_size as usize).min(self.entries.len());
                if start <= self.entries.len() {
                    self.entries.splice(start..end, page.items);
                }
                // A shrunken tail page can move the end of the catalog.
                if page.page_index + 1 == self.pages_loaded {
                    self.next_key = page.next_key;
                }
            }
        }
    }

    pub fn load_failed(&mut self, key: u32, message: String) {
        let expected = self.in_flight.map(|load| load.key);
        if expected != Some(key) {
            return;
        }
        self.in_flight = None;
        self.failure = Some(PageFailure { key, message });
    }

    /// Indices of entries whose name contains `query`, case-insensitively.
    /// An empty query is the identity view. Never triggers a load.
    pub fn visible(&self, query: &str) -> Vec<usize> {
        if query.is_empty() {
            return (0..self.entries.len()).collect();
        }
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.name.to_lowercase().contains(&needle))
            .map(|(index, _)| index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str) -> EntitySummary {
        EntitySummary {
            name: name.into(),
            url: format!("https://pokeapi.co/api/v2/pokemon/{}/", name.len()),
        }
    }

    fn page_of(names: &[&str], index: u32, next: Option<u32>) -> Page {
        Page {
            items: names.iter().map(|n| summary(n)).collect(),
            page_index: index,
            previous_key: index.checked_sub(1),
            next_key: next,
        }
    }

    fn loaded_browser() -> CatalogBrowser {
        let mut browser = CatalogBrowser::new(3);
        assert_eq!(browser.begin_load(), Some(0));
        browser.apply_page(page_of(&["bulbasaur", "ivysaur", "venusaur"], 0, Some(1)));
        assert_eq!(browser.begin_load(), Some(1));
        browser.apply_page(page_of(&["charmander", "charmeleon"], 1, None));
        browser
    }

    #[test]
    fn appends_pages_in_key_order() {
        let mut browser = loaded_browser();
        let names: Vec<_> = browser.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            ["bulbasaur", "ivysaur", "venusaur", "charmander", "charmeleon"]
        );
        assert!(browser.end_reached());
        assert_eq!(browser.begin_load(), None);
    }

    #[test]
    fn only_one_load_in_flight() {
        let mut browser = CatalogBrowser::new(3);
        assert_eq!(browser.begin_load(), Some(0));
        assert_eq!(browser.begin_load(), None);
        browser.apply_page(page_of(&["a", "b", "c"], 0, Some(1)));
        assert_eq!(browser.begin_load(), Some(1));
    }

    #[test]
    fn stale_pages_are_discarded() {
        let mut browser = CatalogBrowser::new(3);
        assert_eq!(browser.begin_load(), Some(0));
        // A response for a key nothing is waiting on.
        browser.apply_page(page_of(&["zapdos"], 5, None));
        assert!(browser.entries().is_empty());
        assert!(browser.is_loading());
    }

    #[test]
    fn failure_is_keyed_and_retryable() {
        let mut browser = CatalogBrowser::new(3);
        assert_eq!(browser.begin_load(), Some(0));
        browser.load_failed(0, "network request failed".into());

        let failure = browser.failure().unwrap();
        assert_eq!(failure.key, 0);
        // No silent re-issue while the failure is showing.
        assert_eq!(browser.begin_load(), None);

        assert!(browser.retry());
        assert_eq!(browser.begin_load(), Some(0));
    }

    #[test]
    fn failure_for_an_unexpected_key_is_ignored() {
        let mut browser = CatalogBrowser::new(3);
        assert_eq!(browser.begin_load(), Some(0));
        browser.load_failed(9, "bogus".into());
        assert!(browser.failure().is_none());
        assert!(browser.is_loading());
    }

    #[test]
    fn initial_load_state_clears_after_first_page() {
        let mut browser = CatalogBrowser::new(3);
        assert!(browser.is_initial_load());
        browser.begin_load();
        browser.apply_page(page_of(&["a", "b", "c"], 0, Some(1)));
        assert!(!browser.is_initial_load());
    }

    #[test]
    fn near_end_uses_prefetch_distance() {
        let browser = loaded_browser();
        assert!(browser.near_end(0));

        let mut big = CatalogBrowser::new(3);
        big.begin_load();
        let names: Vec<String> = (0..30).map(|i| format!("e{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        big.apply_page(page_of(&refs, 0, Some(1)));
        assert!(!big.near_end(0));
        assert!(big.near_end(25));
    }

    #[test]
    fn refresh_patches_the_anchored_page_in_place() {
        let mut browser = loaded_browser();
        // Anchor on row 3, which lives in page 1.
        assert_eq!(browser.begin_refresh(3), Some(1));
        browser.apply_page(page_of(&["charmander", "charizard"], 1, None));

        let names: Vec<_> = browser.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            ["bulbasaur", "ivysaur", "venusaur", "charmander", "charizard"]
        );
    }

    #[test]
    fn refresh_of_an_early_page_keeps_later_entries() {
        let mut browser = loaded_browser();
        assert_eq!(browser.begin_refresh(1), Some(0));
        browser.apply_page(page_of(&["b1", "b2", "b3"], 0, Some(1)));

        let names: Vec<_> = browser.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b1", "b2", "b3", "charmander", "charmeleon"]);
        // Forward pagination state is untouched by a mid-stream patch.
        assert!(browser.end_reached());
    }

    #[test]
    fn refresh_before_any_page_is_a_noop() {
        let mut browser = CatalogBrowser::new(3);
        assert_eq!(browser.begin_refresh(0), None);
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let mut browser = CatalogBrowser::new(3);
        browser.begin_load();
        browser.apply_page(page_of(&["Bulbasaur", "Charmander", "Squirtle"], 0, None));

        let visible = browser.visible("CHAR");
        let names: Vec<_> = visible
            .iter()
            .map(|&i| browser.entries()[i].name.as_str())
            .collect();
        assert_eq!(names, ["Charmander"]);
    }

    #[test]
    fn clearing_the_filter_restores_the_full_collection() {
        let browser = loaded_browser();
        let before: Vec<_> = browser.visible("");
        let _ = browser.visible("saur");
        let after: Vec<_> = browser.visible("");
        assert_eq!(before, (0..5).collect::<Vec<_>>());
        assert_eq!(before, after);
    }

    #[test]
    fn filter_can_match_nothing() {
        let browser = loaded_browser();
        assert!(browser.visible("mewtwo").is_empty());
    }
}
