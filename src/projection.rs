use std::cmp::Ordering;

use tracing::trace;

use crate::dataset::{Dataset, Row};
use crate::view::{SortDir, SortKey, ViewState};

/// The visible window of a dataset for one view state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    pub rows: Vec<usize>, // Dataset positions of the visible rows, in display order
    pub page: usize,      // Clamped page the rows belong to
    pub page_count: usize,
    pub filtered_count: usize,
}

impl Projection {
    /// Positions are only valid for the dataset this projection was built from.
    pub(crate) fn rows<'a>(&self, dataset: &'a Dataset) -> Vec<&'a Row> {
        self.rows.iter().map(|&idx| &dataset.rows()[idx]).collect()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }
}

pub fn page_count(filtered_count: usize, page_size: usize) -> usize {
    std::cmp::max(1, filtered_count.div_ceil(page_size.max(1)))
}

fn compare(a: &Row, b: &Row, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::Item => a.item.cmp(&b.item),
        SortKey::Qty => a.qty.cmp(&b.qty),
        SortKey::Price => a.price.cmp(&b.price),
        SortKey::Total => a.total.cmp(&b.total),
    }
}

/// Dataset positions of every row passing the filter, in sorted order.
pub fn filter_sort(dataset: &Dataset, view: &ViewState) -> Vec<usize> {
    let needle = view.query.to_lowercase();
    let rows = dataset.rows();
    let mut indexed_rows: Vec<usize> = (0..rows.len())
        .filter(|&idx| rows[idx].matches(&needle))
        .collect();

    // sort_by is stable, equal keys keep dataset order in both directions
    indexed_rows.sort_by(|&a, &b| {
        let ord = compare(&rows[a], &rows[b], view.sort_key);
        match view.sort_dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });
    indexed_rows
}

pub fn project(dataset: &Dataset, view: &ViewState) -> Projection {
    let sorted = filter_sort(dataset, view);
    let filtered_count = sorted.len();
    let page_count = page_count(filtered_count, view.page_size);
    let page = view.page.clamp(1, page_count);

    let rbegin = std::cmp::min((page - 1) * view.page_size, filtered_count);
    let rend = std::cmp::min(rbegin + view.page_size, filtered_count);

    trace!(
        "Projection: q \"{}\", sort {}:{:?}, page {}/{} (requested {}), rows {}..{} of {}",
        view.query,
        view.sort_key,
        view.sort_dir,
        page,
        page_count,
        view.page,
        rbegin,
        rend,
        filtered_count
    );

    Projection {
        rows: sorted[rbegin..rend].to_vec(),
        page,
        page_count,
        filtered_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Money;

    fn ids(dataset: &Dataset, projection: &Projection) -> Vec<u64> {
        projection.rows(dataset).iter().map(|r| r.id).collect()
    }

    fn view(query: &str, key: SortKey, dir: SortDir, page: usize, page_size: usize) -> ViewState {
        ViewState {
            page,
            page_size,
            sort_key: key,
            sort_dir: dir,
            query: query.to_string(),
        }
    }

    fn ties() -> Dataset {
        Dataset::from_tuples(vec![
            (1, "b", 2, Money::from_cents(100)),
            (2, "a", 1, Money::from_cents(100)),
            (3, "b", 2, Money::from_cents(50)),
            (4, "a", 1, Money::from_cents(100)),
            (5, "c", 2, Money::from_cents(100)),
        ])
        .unwrap()
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let data = ties();
        let asc = project(&data, &view("", SortKey::Price, SortDir::Asc, 1, 10));
        assert_eq!(ids(&data, &asc), vec![3, 1, 2, 4, 5]);
        let desc = project(&data, &view("", SortKey::Price, SortDir::Desc, 1, 10));
        assert_eq!(ids(&data, &desc), vec![1, 2, 4, 5, 3]);
        let items = project(&data, &view("", SortKey::Item, SortDir::Desc, 1, 10));
        assert_eq!(ids(&data, &items), vec![5, 1, 3, 2, 4]);
        let again = project(&data, &view("", SortKey::Item, SortDir::Desc, 1, 10));
        assert_eq!(items, again);
    }

    #[test]
    fn pages_cover_filtered_result_exactly_once() {
        let data = Dataset::sample();
        for page_size in crate::view::PAGE_SIZES {
            for query in ["", "5", "item b", "1.4", "nothing"] {
                let mut v = view(query, SortKey::Total, SortDir::Desc, 1, page_size);
                let full = filter_sort(&data, &v);
                let count = project(&data, &v).page_count;
                let mut seen = Vec::new();
                for page in 1..=count {
                    v.page = page;
                    seen.extend(project(&data, &v).rows);
                }
                assert_eq!(seen, full, "q={query} size={page_size}");
            }
        }
    }

    #[test]
    fn empty_result_has_one_empty_page() {
        let data = Dataset::sample();
        let p = project(&data, &view("no such row", SortKey::Id, SortDir::Asc, 3, 10));
        assert_eq!((p.page, p.page_count, p.filtered_count), (1, 1, 0));
        assert!(p.rows.is_empty());
        assert!(!p.has_prev() && !p.has_next());
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        let data = Dataset::sample();
        let p = project(&data, &view("", SortKey::Id, SortDir::Asc, 9, 10));
        assert_eq!(p.page, 5);
        assert_eq!(ids(&data, &p), (1041..=1050).collect::<Vec<_>>());

        let narrowed = project(&data, &view("item a", SortKey::Id, SortDir::Asc, 5, 10));
        assert_eq!(narrowed.page, 1);
        assert_eq!(narrowed.rows.len(), narrowed.filtered_count);
        assert!(!narrowed.rows.is_empty());

        let zero = project(&data, &view("", SortKey::Id, SortDir::Asc, 0, 10));
        assert_eq!(zero.page, 1);
    }

    #[test]
    fn filter_five_sorted_by_price_desc() {
        let data = Dataset::sample();
        let p = project(&data, &view("5", SortKey::Price, SortDir::Desc, 1, 10));

        // 27 sample rows contain "5" in id, item, qty, price or total text,
        // e.g. 1034 only through its total 162.54
        assert_eq!(p.filtered_count, 27);
        assert_eq!(p.page_count, 3);
        assert_eq!(
            ids(&data, &p),
            vec![1050, 1047, 1046, 1045, 1042, 1040, 1037, 1036, 1035, 1034]
        );
        let prices: Vec<Money> = p.rows(&data).iter().map(|r| r.price).collect();
        assert!(prices.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(45, 30), 2);
        assert_eq!(page_count(45, 10), 5);
    }
}
