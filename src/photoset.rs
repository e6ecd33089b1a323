//! Photoset resolution: fetches the set's sub-document and flattens it
//! into one record per photo.
//!
//! The sub-document's own order is preserved; it nests inside the
//! page-level order the assembler maintains. Tags and author are left
//! empty here — the caller merges the parent post's metadata in.

use scraper::Html;

use crate::error::ScrapeError;
use crate::extract::parse_selector;
use crate::fetch::Session;
use crate::post::PhotoRecord;

/// One photo slot of the sub-document.
const PHOTOSET_ANCHOR_SELECTOR: &str = "a.photoset_photo";
const PHOTOSET_IMG_SELECTOR: &str = "img";
/// Photoset anchors carry ids like `photoset_link_123456789`.
const PHOTOSET_LINK_PREFIX: &str = "photoset_link_";

/// Flatten a photoset sub-document into bare records, in sub-document
/// order.
///
/// # Errors
///
/// [`ScrapeError::Extraction`] on any structural mismatch — a
/// mis-shaped anchor fails the whole set rather than silently dropping
/// or reordering its siblings.
pub(crate) fn parse_photoset(html: &str) -> Result<Vec<PhotoRecord>, ScrapeError> {
    let document = Html::parse_document(html);
    let anchor_sel = parse_selector(PHOTOSET_ANCHOR_SELECTOR)?;
    let img_sel = parse_selector(PHOTOSET_IMG_SELECTOR)?;

    let mut records = Vec::new();
    for anchor in document.select(&anchor_sel) {
        let id = anchor
            .value()
            .attr("id")
            .ok_or_else(|| ScrapeError::extraction("photoset anchor without an id attribute"))?;
        let photo_id = id
            .strip_prefix(PHOTOSET_LINK_PREFIX)
            .ok_or_else(|| ScrapeError::extraction(format!("unexpected photoset anchor id {id:?}")))?;
        let img = anchor.select(&img_sel).next().ok_or_else(|| {
            ScrapeError::extraction(format!("photoset photo {photo_id} without an image"))
        })?;
        let photo_url = img.value().attr("src").ok_or_else(|| {
            ScrapeError::extraction(format!("photoset photo {photo_id} without an image source"))
        })?;
        records.push(PhotoRecord::new(photo_id, photo_url));
    }
    Ok(records)
}

/// Fetch a photoset's sub-document and flatten it.
///
/// # Errors
///
/// [`ScrapeError::Transport`] for the sub-fetch,
/// [`ScrapeError::Extraction`] for the sub-document.
pub(crate) async fn resolve_photoset(
    session: &Session,
    url: &str,
) -> Result<Vec<PhotoRecord>, ScrapeError> {
    let body = session.text(url).await?;
    parse_photoset(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_parse_photoset_preserves_order() -> Result<(), ScrapeError> {
        let html = r##"<html><body>
<a class="photoset_photo" id="photoset_link_201" href="#"><img src="https://m.example.com/201.jpg"/></a>
<a class="photoset_photo" id="photoset_link_202" href="#"><img src="https://m.example.com/202.jpg"/></a>
<a class="photoset_photo" id="photoset_link_203" href="#"><img src="https://m.example.com/203.jpg"/></a>
</body></html>"##;
        let records = parse_photoset(html)?;
        let ids: Vec<_> = records.iter().map(|record| record.photo_id.as_str()).collect();
        assert_eq!(ids, ["201", "202", "203"]);
        assert_eq!(records[0].photo_url, "https://m.example.com/201.jpg");
        // metadata is the caller's to merge
        assert!(records[0].tags.is_empty());
        assert!(records[0].author.is_empty());
        Ok(())
    }

    #[test]
    fn inline_empty_photoset_yields_nothing() -> Result<(), ScrapeError> {
        let records = parse_photoset("<html><body></body></html>")?;
        assert!(records.is_empty());
        Ok(())
    }

    #[test]
    fn inline_misshaped_anchor_fails_the_whole_set() {
        // the second anchor lacks the expected id pattern; its valid
        // sibling must not survive on its own
        let html = r##"
<a class="photoset_photo" id="photoset_link_301" href="#"><img src="https://m.example.com/301.jpg"/></a>
<a class="photoset_photo" id="link_302" href="#"><img src="https://m.example.com/302.jpg"/></a>
"##;
        let result = parse_photoset(html);
        assert!(matches!(result, Err(ScrapeError::Extraction { .. })));
    }

    #[test]
    fn inline_anchor_without_image_errors() {
        let html = r##"<a class="photoset_photo" id="photoset_link_401" href="#"></a>"##;
        let result = parse_photoset(html);
        assert!(matches!(result, Err(ScrapeError::Extraction { .. })));
    }
}
