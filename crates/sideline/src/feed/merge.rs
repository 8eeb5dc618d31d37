use indexmap::IndexMap;

use crate::fetch::FeedItem;

/// Merge a freshly loaded page into the current items.
///
/// Items are keyed by id. In append mode the map is seeded with `existing`
/// and the page is overlaid on top: a repeated id keeps its original position
/// and takes the page's value. In replace mode only the page is used. Either
/// way the result holds each id once, so merging the same page twice is the
/// same as merging it once.
pub fn merge_items<T: FeedItem>(existing: &[T], incoming: Vec<T>, append: bool) -> Vec<T> {
    let seed = if append { existing.len() } else { 0 };
    let mut by_id: IndexMap<String, T> = IndexMap::with_capacity(seed + incoming.len());

    if append {
        for item in existing {
            by_id.insert(item.id().to_owned(), item.clone());
        }
    }

    for item in incoming {
        by_id.insert(item.id().to_owned(), item);
    }

    by_id.into_values().collect()
}
