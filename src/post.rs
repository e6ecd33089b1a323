//! The data model for extracted posts.

use bytes::Bytes;
use serde::Serialize;

/// One photo discovered on a blog.
///
/// Records are immutable after extraction, except for
/// [`photo_bytes`](Self::photo_bytes), which the crawl driver attaches
/// late when binary download was requested.
///
/// Identity is [`photo_id`](Self::photo_id) within the scope of one
/// blog. The same photo may show up again on a later page (reposts);
/// the crawler never deduplicates.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoRecord {
    /// The identifier of the photo.
    pub photo_id: String,
    /// The image URL, used for binary download.
    pub photo_url: String,
    /// The parent post's tags, in page order. Empty if the post has none.
    pub tags: Vec<String>,
    /// The attributed author: the original author for reblogged entries,
    /// falling back to the blog's own identifier.
    pub author: String,
    /// The raw image payload. `None` until the crawl driver downloads it.
    #[serde(skip_serializing)]
    pub photo_bytes: Option<Bytes>,
}

impl PhotoRecord {
    /// A bare record, with no metadata and no payload attached yet.
    pub(crate) fn new(photo_id: impl Into<String>, photo_url: impl Into<String>) -> Self {
        Self {
            photo_id: photo_id.into(),
            photo_url: photo_url.into(),
            tags: Vec::new(),
            author: String::new(),
            photo_bytes: None,
        }
    }

    /// Merge the parent post's metadata in. The post's metadata always
    /// wins; a photoset sub-document never supplies its own.
    pub(crate) fn with_post_metadata(mut self, tags: Vec<String>, author: String) -> Self {
        self.tags = tags;
        self.author = author;
        self
    }
}

/// One raw listing entry, before photosets are resolved.
///
/// Never leaves the page assembler.
#[derive(Debug, Clone)]
pub(crate) struct PostDescriptor {
    pub(crate) tags: Vec<String>,
    pub(crate) author: String,
    pub(crate) kind: PostKind,
}

/// The two listing entry shapes the extractor recognizes.
#[derive(Debug, Clone)]
pub(crate) enum PostKind {
    /// The entry embeds its one photo directly.
    Single {
        photo_id: String,
        photo_url: String,
    },
    /// The entry embeds a photoset sub-document, resolved separately.
    Photoset { url: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_metadata_wins() {
        let record = PhotoRecord::new("12345", "https://example.com/12345.jpg")
            .with_post_metadata(Vec::from([String::from("cat")]), String::from("someblog"));
        assert_eq!(record.tags, ["cat"]);
        assert_eq!(record.author, "someblog");
        assert_eq!(record.photo_bytes, None);
    }

    #[test]
    fn test_serialize_skips_payload() {
        let mut record = PhotoRecord::new("12345", "https://example.com/12345.jpg");
        record.photo_bytes = Some(Bytes::from_static(b"\xff\xd8"));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["photo_id"], "12345");
        assert!(json.get("photo_bytes").is_none());
    }
}
