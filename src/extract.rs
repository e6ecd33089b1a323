//! Listing-page extraction: one page of blog markup in, raw
//! [`PostDescriptor`]s out.
//!
//! Only photo and photoset entries are selected; text, quote and other
//! entry kinds are skipped. Document order is preserved throughout — it
//! is the display order, and the crawl traverses in display order.

use scraper::{ElementRef, Html, Selector};

use crate::error::ScrapeError;
use crate::post::{PostDescriptor, PostKind};

/// One listing entry.
const POST_SELECTOR: &str = "article.post";
/// The photo of a single-photo entry.
const PHOTO_SELECTOR: &str = "img.photo";
/// The sub-document frame of a photoset entry.
const PHOTOSET_SELECTOR: &str = "iframe.photoset";
const TAG_SELECTOR: &str = "a.tag";
/// Original attribution, present on reblogged entries.
const REBLOG_SOURCE_SELECTOR: &str = "a.reblog-source";
/// Listing entry ids look like `post_123456789`.
const POST_ID_PREFIX: &str = "post_";

/// Parse a CSS selector or return an extraction error (avoids panics
/// from `Selector::parse`).
pub(crate) fn parse_selector(sel: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(sel)
        .map_err(|err| ScrapeError::extraction(format!("invalid selector {sel:?}: {err}")))
}

/// Extract the photo and photoset entries of one listing page.
///
/// An empty page yields `Ok(vec![])`: that is the end-of-blog signal,
/// not an error.
///
/// # Errors
///
/// [`ScrapeError::Extraction`] when a photo or photoset entry is
/// structurally off (missing id, missing image source, ...).
pub(crate) fn extract_posts(html: &str, blog: &str) -> Result<Vec<PostDescriptor>, ScrapeError> {
    let document = Html::parse_document(html);
    let post_sel = parse_selector(POST_SELECTOR)?;
    let photo_sel = parse_selector(PHOTO_SELECTOR)?;
    let photoset_sel = parse_selector(PHOTOSET_SELECTOR)?;
    let tag_sel = parse_selector(TAG_SELECTOR)?;
    let source_sel = parse_selector(REBLOG_SOURCE_SELECTOR)?;

    let mut posts = Vec::new();
    for entry in document.select(&post_sel) {
        let kind = if let Some(frame) = entry.select(&photoset_sel).next() {
            let url = frame.value().attr("src").ok_or_else(|| {
                ScrapeError::extraction("photoset entry without a frame source")
            })?;
            PostKind::Photoset {
                url: url.to_string(),
            }
        } else if let Some(img) = entry.select(&photo_sel).next() {
            let photo_url = img
                .value()
                .attr("src")
                .ok_or_else(|| ScrapeError::extraction("photo entry without an image source"))?;
            PostKind::Single {
                photo_id: entry_photo_id(entry)?,
                photo_url: photo_url.to_string(),
            }
        } else {
            // not a photo entry
            continue;
        };

        posts.push(PostDescriptor {
            tags: entry_tags(entry, &tag_sel),
            author: entry_author(entry, &source_sel, blog),
            kind,
        });
    }
    Ok(posts)
}

fn entry_photo_id(entry: ElementRef<'_>) -> Result<String, ScrapeError> {
    let id = entry
        .value()
        .attr("id")
        .ok_or_else(|| ScrapeError::extraction("photo entry without an id attribute"))?;
    id.strip_prefix(POST_ID_PREFIX)
        .map(str::to_string)
        .ok_or_else(|| ScrapeError::extraction(format!("unexpected entry id {id:?}")))
}

fn entry_tags(entry: ElementRef<'_>, tag_sel: &Selector) -> Vec<String> {
    entry
        .select(tag_sel)
        .map(|tag| tag.text().collect::<String>().trim().to_string())
        .collect()
}

/// Attribution order: the reblog source when the entry is reblogged,
/// else the entry's own declared author, else the blog itself.
fn entry_author(entry: ElementRef<'_>, source_sel: &Selector, blog: &str) -> String {
    if let Some(source) = entry.select(source_sel).next() {
        let author = source.text().collect::<String>().trim().to_string();
        if !author.is_empty() {
            return author;
        }
    }
    if let Some(author) = entry.value().attr("data-author") {
        if !author.is_empty() {
            return author.to_string();
        }
    }
    blog.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_extract_single_photo() -> Result<(), ScrapeError> {
        let html = r#"<html><body>
<article class="post" id="post_100" data-author="alice">
  <img class="photo" src="https://media.example.com/100.jpg"/>
  <a class="tag">cats</a>
  <a class="tag">black and white</a>
</article>
</body></html>"#;
        let posts = extract_posts(html, "someblog")?;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].tags, ["cats", "black and white"]);
        assert_eq!(posts[0].author, "alice");
        match &posts[0].kind {
            PostKind::Single {
                photo_id,
                photo_url,
            } => {
                assert_eq!(photo_id, "100");
                assert_eq!(photo_url, "https://media.example.com/100.jpg");
            }
            other => panic!("expected a single-photo entry, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn inline_extract_photoset() -> Result<(), ScrapeError> {
        let html = r#"<article class="post" id="post_200">
  <iframe class="photoset" src="https://someblog.tumblr.com/post/200/photoset_iframe"></iframe>
  <a class="tag">dogs</a>
</article>"#;
        let posts = extract_posts(html, "someblog")?;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].tags, ["dogs"]);
        match &posts[0].kind {
            PostKind::Photoset { url } => {
                assert_eq!(url, "https://someblog.tumblr.com/post/200/photoset_iframe");
            }
            other => panic!("expected a photoset entry, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn inline_reblog_attribution_wins() -> Result<(), ScrapeError> {
        let html = r#"<article class="post" id="post_300" data-author="reblogger">
  <img class="photo" src="https://media.example.com/300.png"/>
  <a class="reblog-source">original-author</a>
</article>"#;
        let posts = extract_posts(html, "someblog")?;
        assert_eq!(posts[0].author, "original-author");
        Ok(())
    }

    #[test]
    fn inline_author_falls_back_to_blog() -> Result<(), ScrapeError> {
        let html = r#"<article class="post" id="post_400">
  <img class="photo" src="https://media.example.com/400.jpg"/>
</article>"#;
        let posts = extract_posts(html, "someblog")?;
        assert_eq!(posts[0].author, "someblog");
        assert!(posts[0].tags.is_empty());
        Ok(())
    }

    #[test]
    fn inline_skips_non_photo_entries_in_order() -> Result<(), ScrapeError> {
        let html = r#"<body>
<article class="post" id="post_1"><img class="photo" src="https://m.example.com/1.jpg"/></article>
<article class="post" id="post_2"><p>just text</p></article>
<article class="post" id="post_3"><img class="photo" src="https://m.example.com/3.jpg"/></article>
</body>"#;
        let posts = extract_posts(html, "someblog")?;
        let ids: Vec<_> = posts
            .iter()
            .map(|post| match &post.kind {
                PostKind::Single { photo_id, .. } => photo_id.clone(),
                other => panic!("expected a single-photo entry, got {other:?}"),
            })
            .collect();
        assert_eq!(ids, ["1", "3"]);
        Ok(())
    }

    #[test]
    fn inline_empty_page_is_not_an_error() -> Result<(), ScrapeError> {
        let posts = extract_posts("<html><body><p>nothing here</p></body></html>", "someblog")?;
        assert!(posts.is_empty());
        Ok(())
    }

    #[test]
    fn inline_photo_entry_without_id_errors() {
        let html = r#"<article class="post">
  <img class="photo" src="https://m.example.com/5.jpg"/>
</article>"#;
        let result = extract_posts(html, "someblog");
        assert!(matches!(result, Err(ScrapeError::Extraction { .. })));
    }

    #[test]
    fn inline_unexpected_entry_id_errors() {
        let html = r#"<article class="post" id="entry-6">
  <img class="photo" src="https://m.example.com/6.jpg"/>
</article>"#;
        let result = extract_posts(html, "someblog");
        assert!(matches!(result, Err(ScrapeError::Extraction { .. })));
    }
}
