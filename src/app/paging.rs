use crate::app::pokeapi::{CatalogClient, CatalogError, EntitySummary};
use std::fmt;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// One batch of catalog entries plus the keys to its neighbours.
///
/// `previous_key` is `None` exactly on page 0; `next_key` is `None` exactly
/// when the remote returned fewer items than requested, which is how end of
/// catalog is detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<EntitySummary>,
    pub page_index: u32,
    pub previous_key: Option<u32>,
    pub next_key: Option<u32>,
}

/// A page load failure, tagged with the key it was loading so the caller can
/// retry exactly that key.
#[derive(Debug)]
pub struct LoadError {
    pub key: u32,
    pub source: CatalogError,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load page {}: {}", self.key, self.source)
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Pull-based incremental loader over the catalog list endpoint. Keys are
/// page indices; any key may be (re)requested at any time, which is what
/// makes refresh-at-anchor possible.
///
/// The source itself holds no mutable state and does no locking; the caller
/// guarantees at most one in-flight `load` per key.
pub struct PageSource<C> {
    client: C,
    page_size: u32,
}

impl<C: CatalogClient> PageSource<C> {
    pub fn new(client: C, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub async fn load(&self, key: Option<u32>) -> Result<Page, LoadError> {
        let page = key.unwrap_or(0);
        let offset = self.page_size * page;

        let items = self
            .client
            .list_entities(self.page_size, offset)
            .await
            .map_err(|source| LoadError { key: page, source })?;

        let next_key = if (items.len() as u32) < self.page_size {
            None
        } else {
            Some(page + 1)
        };

        Ok(Page {
            items,
            page_index: page,
            previous_key: page.checked_sub(1),
            next_key,
        })
    }

    /// Refresh reloads the page the viewer is anchored on, not page 0. The
    /// anchor passes through unchanged, `None` included.
    pub fn refresh_key(&self, anchor: Option<u32>) -> Option<u32> {
        anchor
    }
}
