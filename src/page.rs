//! Page assembly: one listing page in, flat metadata-merged records out.
//!
//! All photoset resolutions of one page run concurrently; the output
//! keeps the original page order of posts, with each set's internal
//! order intact within its slot.

use tokio::task::JoinSet;

use crate::error::ScrapeError;
use crate::extract::extract_posts;
use crate::fetch::Session;
use crate::photoset::resolve_photoset;
use crate::post::{PhotoRecord, PostKind};
use crate::tool::unwrap_joined;

/// The platform's listing host for `blog`.
pub fn blog_base_url(blog: &str) -> String {
    format!("https://{blog}.tumblr.com")
}

/// The listing URL of `page_number` under `base_url`.
pub fn page_url(base_url: &str, page_number: u64) -> String {
    format!("{}/page/{}", base_url.trim_end_matches('/'), page_number)
}

/// One slot per listing entry, so photoset results land back in page
/// order no matter which sub-fetch finishes first.
enum Slot {
    Ready(Vec<PhotoRecord>),
    Pending { tags: Vec<String>, author: String },
}

/// Fetch one listing page of `blog` and flatten it into photo records.
///
/// A page with zero posts yields `Ok(vec![])` — the end-of-blog signal.
/// The output is a pure function of the remote documents: fetching an
/// unchanged page twice yields identical records.
///
/// # Errors
///
/// The first transport or extraction error of the page fails the whole
/// page, including any of the concurrent photoset resolutions. There is
/// no partial success; outstanding sub-fetches are aborted.
pub async fn get_page(
    session: &Session,
    base_url: &str,
    blog: &str,
    page_number: u64,
) -> Result<Vec<PhotoRecord>, ScrapeError> {
    let url = page_url(base_url, page_number);
    tracing::debug!(%url, "fetching listing page");
    let body = session.text(&url).await?;
    let descriptors = extract_posts(&body, blog)?;

    let mut slots = Vec::with_capacity(descriptors.len());
    let mut resolutions = JoinSet::new();
    for (index, descriptor) in descriptors.into_iter().enumerate() {
        match descriptor.kind {
            PostKind::Single {
                photo_id,
                photo_url,
            } => {
                let record = PhotoRecord::new(photo_id, photo_url)
                    .with_post_metadata(descriptor.tags, descriptor.author);
                slots.push(Slot::Ready(Vec::from([record])));
            }
            PostKind::Photoset { url } => {
                slots.push(Slot::Pending {
                    tags: descriptor.tags,
                    author: descriptor.author,
                });
                let session = session.clone();
                resolutions.spawn(async move { (index, resolve_photoset(&session, &url).await) });
            }
        }
    }

    while let Some(joined) = resolutions.join_next().await {
        let (index, resolved) = unwrap_joined(joined);
        // all-or-nothing: dropping the set aborts the other resolutions
        let records = resolved?;
        let Slot::Pending { tags, author } =
            std::mem::replace(&mut slots[index], Slot::Ready(Vec::new()))
        else {
            unreachable!("photoset slot {index} resolved twice");
        };
        let merged = records
            .into_iter()
            .map(|record| record.with_post_metadata(tags.clone(), author.clone()))
            .collect();
        slots[index] = Slot::Ready(merged);
    }

    Ok(slots
        .into_iter()
        .flat_map(|slot| match slot {
            Slot::Ready(records) => records,
            Slot::Pending { .. } => unreachable!("photoset slot left unresolved"),
        })
        .collect())
}
