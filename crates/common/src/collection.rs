//! Walking paginated `OrderedCollection`s.
//!
//! A collection root points at its first page either inline or by URL, and
//! each page points at the next. Pages are fetched strictly in order until
//! the collection is exhausted, the caller's item cap is reached, or a page
//! comes back empty. A failure after the first page ends the walk early but
//! still returns what was gathered.

use error_stack::{Report, ResultExt};
use serde::de::DeserializeOwned;

use crate::constants::{DECODE_SNIPPET_LEN, FOLLOWING_ITEM_CAP, NOTES_ITEM_CAP};
use crate::error::LitePubError;
use crate::fetch::ObjectFetcher;
use crate::http_client::HttpClient;
use crate::models::{Create, Note, OrderedCollection, OrderedCollectionPage};

/// The `first` member of a collection root, resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum FirstPage<T> {
    Inline(OrderedCollectionPage<T>),
    Link(String),
}

impl<T: DeserializeOwned> FirstPage<T> {
    /// Interpret a raw `first` value.
    ///
    /// Both shapes are legal and cannot be told apart up front, so the value
    /// is first read as a page; a page without an `id` means it was not one,
    /// and the same value is read again as a URL.
    ///
    /// # Errors
    ///
    /// Returns [`LitePubError::Decode`] if the value is neither.
    pub fn from_value(raw: &serde_json::Value) -> Result<Self, Report<LitePubError>> {
        if let Ok(page) = serde_json::from_value::<OrderedCollectionPage<T>>(raw.clone()) {
            if !page.base.id.is_empty() {
                return Ok(Self::Inline(page));
            }
        }

        match serde_json::from_value::<String>(raw.clone()) {
            Ok(url) if !url.is_empty() => Ok(Self::Link(url)),
            _ => Err(Report::new(LitePubError::Decode {
                type_name: "first page".into(),
                snippet: raw.to_string().chars().take(DECODE_SNIPPET_LEN).collect(),
            })),
        }
    }

    /// Return the inline page, or fetch the linked one.
    ///
    /// # Errors
    ///
    /// Propagates fetch and decode errors for a linked page.
    pub fn into_page<C: HttpClient>(
        self,
        fetcher: &ObjectFetcher<C>,
    ) -> Result<OrderedCollectionPage<T>, Report<LitePubError>> {
        match self {
            Self::Inline(page) => Ok(page),
            Self::Link(url) => fetcher
                .get(&url)
                .attach(format!("while fetching first page '{}'", url)),
        }
    }
}

/// Gather up to `item_cap` items from the collection at `url`.
///
/// Each raw item of type `T` is passed through `unwrap`; items for which it
/// returns `None` are dropped from the result. The walk itself is bounded by
/// raw items seen, so `totalItems` and `item_cap` end it even when every
/// item on a page is dropped.
///
/// # Errors
///
/// Returns an error only if the root or the first page cannot be fetched or
/// decoded. Failures on later pages end the walk and return the items
/// gathered so far.
pub fn fetch_collection<C, T, R, F>(
    fetcher: &ObjectFetcher<C>,
    url: &str,
    item_cap: usize,
    mut unwrap: F,
) -> Result<Vec<R>, Report<LitePubError>>
where
    C: HttpClient,
    T: DeserializeOwned,
    F: FnMut(T) -> Option<R>,
{
    let root: OrderedCollection = fetcher.get(url)?;
    let mut page = FirstPage::<T>::from_value(&root.first)
        .attach(format!("in collection '{}'", url))?
        .into_page(fetcher)?;

    let mut items: Vec<R> = Vec::new();
    let mut page_len = page.ordered_items.len();
    let mut seen = page_len;
    items.extend(take_items(&mut page).filter_map(&mut unwrap));

    while root.total_items > seen && seen < item_cap && page_len > 0 {
        let Some(next) = page.next_page().map(str::to_string) else {
            break;
        };

        page = match fetcher.get::<OrderedCollectionPage<T>>(&next) {
            Ok(next_page) => next_page,
            Err(e) => {
                log::warn!(
                    "stopping walk of '{}' after {} items: {:?}",
                    url,
                    seen,
                    e
                );
                break;
            }
        };

        page_len = page.ordered_items.len();
        seen += page_len;
        items.extend(take_items(&mut page).filter_map(&mut unwrap));
    }

    items.truncate(item_cap);
    log::debug!("collected {} items from '{}'", items.len(), url);

    Ok(items)
}

fn take_items<T>(page: &mut OrderedCollectionPage<T>) -> std::vec::IntoIter<T> {
    std::mem::take(&mut page.ordered_items).into_iter()
}

/// Collect the actor ids in a following/followers collection.
///
/// # Errors
///
/// See [`fetch_collection`].
pub fn fetch_following<C: HttpClient>(
    fetcher: &ObjectFetcher<C>,
    url: &str,
) -> Result<Vec<String>, Report<LitePubError>> {
    fetch_collection(fetcher, url, FOLLOWING_ITEM_CAP, Some)
}

/// Collect the notes in an outbox, unwrapping their `Create` activities.
///
/// Activities other than `Create` are skipped.
///
/// # Errors
///
/// See [`fetch_collection`].
pub fn fetch_notes<C: HttpClient>(
    fetcher: &ObjectFetcher<C>,
    url: &str,
) -> Result<Vec<Note>, Report<LitePubError>> {
    fetch_collection(fetcher, url, NOTES_ITEM_CAP, |create: Create<Note>| {
        create.is_create().then(|| create.into_object())
    })
}
