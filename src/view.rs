use std::fmt;
use std::str::FromStr;

use tracing::warn;

pub const PAGE_SIZES: [usize; 4] = [10, 30, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Item,
    Qty,
    Price,
    Total,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Id,
        SortKey::Item,
        SortKey::Qty,
        SortKey::Price,
        SortKey::Total,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Item => "item",
            SortKey::Qty => "qty",
            SortKey::Price => "price",
            SortKey::Total => "total",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown sort key \"{s}\""))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn flipped(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

/// Filter, sort and pagination settings. Knows nothing about selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub page: usize,
    pub page_size: usize,
    pub sort_key: SortKey,
    pub sort_dir: SortDir,
    pub query: String,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_key: SortKey::Id,
            sort_dir: SortDir::Asc,
            query: String::new(),
        }
    }
}

impl ViewState {
    /// Activating the current sort column reverses it, a new column starts ascending.
    pub fn sort_by(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.sort_dir = self.sort_dir.flipped();
        } else {
            self.sort_key = key;
            self.sort_dir = SortDir::Asc;
        }
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_string();
    }

    /// Returns false and leaves the state untouched for sizes outside `PAGE_SIZES`.
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        if !PAGE_SIZES.contains(&page_size) {
            warn!("Ignoring page size {page_size}, allowed: {PAGE_SIZES:?}");
            return false;
        }
        self.page_size = page_size;
        true
    }

    pub fn next_page_size(&self) -> usize {
        let pos = PAGE_SIZES.iter().position(|&s| s == self.page_size);
        match pos {
            Some(p) => PAGE_SIZES[(p + 1) % PAGE_SIZES.len()],
            None => DEFAULT_PAGE_SIZE,
        }
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// May step past the last page, the projection clamps it back.
    pub fn next_page(&mut self) {
        self.page += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_by_toggles_same_key_and_resets_new_key() {
        let mut view = ViewState::default();
        view.sort_by(SortKey::Id);
        assert_eq!(view.sort_dir, SortDir::Desc);
        view.sort_by(SortKey::Price);
        assert_eq!((view.sort_key, view.sort_dir), (SortKey::Price, SortDir::Asc));
        view.sort_by(SortKey::Price);
        assert_eq!(view.sort_dir, SortDir::Desc);
    }

    #[test]
    fn page_size_must_be_allowed() {
        let mut view = ViewState::default();
        assert!(!view.set_page_size(7));
        assert_eq!(view.page_size, DEFAULT_PAGE_SIZE);
        assert!(view.set_page_size(10));
        assert_eq!(view.page_size, 10);
        assert_eq!(view.next_page_size(), 30);
        view.set_page_size(100);
        assert_eq!(view.next_page_size(), 10);
    }

    #[test]
    fn prev_page_never_goes_below_one() {
        let mut view = ViewState::default();
        view.prev_page();
        assert_eq!(view.page, 1);
        view.next_page();
        view.next_page();
        view.prev_page();
        assert_eq!(view.page, 2);
    }

    #[test]
    fn query_is_trimmed_and_keys_parse() {
        let mut view = ViewState::default();
        view.set_query("  abc ");
        assert_eq!(view.query, "abc");
        assert_eq!("Total".parse::<SortKey>(), Ok(SortKey::Total));
        assert!("name".parse::<SortKey>().is_err());
    }
}
