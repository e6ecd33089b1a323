//! The crawl driver: the stateful page loop and its notification stream.
//!
//! One [`Crawler`] walks one blog, strictly one page-step at a time.
//! Within a step, photoset resolutions and binary downloads fan out
//! concurrently and join with an all-or-nothing barrier. Consumers
//! follow the crawl through [`CrawlEvent`]s, through the accumulated
//! return value of [`Crawler::run`], or both.
//!
//! Independent crawlers (other blogs, other sessions) may run fully in
//! parallel; nothing is shared between them.

use bytes::Bytes;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

use crate::error::ScrapeError;
use crate::fetch::Session;
use crate::page::{blog_base_url, get_page};
use crate::post::PhotoRecord;
use crate::tool::unwrap_joined;

/// A typed notification from a running crawl.
///
/// Per continuing step the order is: every [`Record`](Self::Record) of
/// the page, in flattened page order, then one
/// [`PageAdvance`](Self::PageAdvance). The terminal step emits its
/// records followed by exactly one [`Ended`](Self::Ended) — or, on any
/// failure, at most one [`Failed`](Self::Failed) and no records for the
/// failed page. `Ended` and `Failed` are mutually exclusive.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    /// One photo was discovered. The payload is attached when binary
    /// download was requested.
    Record(PhotoRecord),
    /// The crawl moved on to the next page.
    PageAdvance {
        /// The blog being crawled.
        blog: String,
        /// The page about to be fetched.
        page_number: u64,
        /// The step about to run.
        step_index: u64,
    },
    /// The crawl finished: a zero-post page or a configured ceiling.
    Ended,
    /// The crawl aborted. The same error is returned from
    /// [`Crawler::run`].
    Failed {
        /// Rendered form of the error.
        error: String,
    },
}

/// Options for one crawl.
///
/// # Example
///
/// ```
/// use tumblr_dl::crawler::CrawlOptions;
///
/// let options = CrawlOptions::new("staff")
///     .download_binaries(true)
///     .page_ceiling(3);
/// ```
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub(crate) blog: String,
    pub(crate) base_url: Option<String>,
    pub(crate) start_page: u64,
    pub(crate) start_step: u64,
    pub(crate) download_binaries: bool,
    pub(crate) accumulate: bool,
    pub(crate) step_ceiling: Option<u64>,
    pub(crate) page_ceiling: Option<u64>,
}

impl CrawlOptions {
    /// Options for `blog` with the defaults: start at page 1, step 0,
    /// no binary download, no accumulation, and no ceiling — the crawl
    /// runs until a zero-post page.
    pub fn new(blog: impl Into<String>) -> Self {
        Self {
            blog: blog.into(),
            base_url: None,
            start_page: 1,
            start_step: 0,
            download_binaries: false,
            accumulate: false,
            step_ceiling: None,
            page_ceiling: None,
        }
    }

    /// Override the listing host (defaults to the platform host of the
    /// blog, see [`blog_base_url`]). Mostly useful for mirrors and for
    /// tests.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// First listing page to fetch. Page numbers start at 1.
    pub fn start_page(mut self, page_number: u64) -> Self {
        self.start_page = page_number;
        self
    }

    /// Step index of the first iteration.
    pub fn start_step(mut self, step_index: u64) -> Self {
        self.start_step = step_index;
        self
    }

    /// Also download every record's image bytes, attached as
    /// [`PhotoRecord::photo_bytes`].
    pub fn download_binaries(mut self, enabled: bool) -> Self {
        self.download_binaries = enabled;
        self
    }

    /// Collect every record; [`Crawler::run`] returns the collection.
    pub fn accumulate(mut self, enabled: bool) -> Self {
        self.accumulate = enabled;
        self
    }

    /// Stop once the step index reaches `ceiling`.
    pub fn step_ceiling(mut self, ceiling: u64) -> Self {
        self.step_ceiling = Some(ceiling);
        self
    }

    /// Stop once the page number reaches `ceiling`.
    pub fn page_ceiling(mut self, ceiling: u64) -> Self {
        self.page_ceiling = Some(ceiling);
        self
    }
}

/// The per-step loop state.
///
/// A fresh value is derived each iteration; nothing is mutated in place
/// across steps. Both counters advance by exactly 1 per continuing
/// step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CrawlState {
    page_number: u64,
    step_index: u64,
}

impl CrawlState {
    fn advanced(self) -> Self {
        Self {
            page_number: self.page_number + 1,
            step_index: self.step_index + 1,
        }
    }
}

/** Walks one blog page by page, emitting records as they are found.

# Example

```no_run
use tumblr_dl::crawler::{CrawlOptions, Crawler};
use tumblr_dl::error::ScrapeError;
use tumblr_dl::fetch::Session;

#[tokio::main]
async fn main() -> Result<(), ScrapeError> {
    let session = Session::build(30).expect("failed to build the client");
    let options = CrawlOptions::new("staff").page_ceiling(2).accumulate(true);

    let mut crawler = Crawler::build(session, options)?;
    let mut events = crawler.subscribe();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{event:?}");
        }
    });

    let records = crawler.run().await?;
    println!("found {} photos", records.len());
    Ok(())
}
```
*/
pub struct Crawler {
    session: Session,
    options: CrawlOptions,
    base_url: String,
    subscribers: Vec<UnboundedSender<CrawlEvent>>,
}

impl Crawler {
    /// Validate `options` and build a crawler.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::Configuration`] when the blog id is empty or
    /// `start_page` is 0 — checked here, before any network activity.
    pub fn build(session: Session, options: CrawlOptions) -> Result<Self, ScrapeError> {
        if options.blog.is_empty() {
            return Err(ScrapeError::configuration("blog must not be empty"));
        }
        if options.start_page == 0 {
            return Err(ScrapeError::configuration("page numbers start at 1"));
        }
        let base_url = options
            .base_url
            .clone()
            .unwrap_or_else(|| blog_base_url(&options.blog));
        Ok(Self {
            session,
            options,
            base_url,
            subscribers: Vec::new(),
        })
    }

    /// Register a consumer of the notification stream.
    ///
    /// Zero or more consumers may subscribe; every one sees the same
    /// events in the same order. A consumer that drops its receiver is
    /// skipped from then on.
    pub fn subscribe(&mut self) -> UnboundedReceiver<CrawlEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.push(sender);
        receiver
    }

    fn emit(&self, event: CrawlEvent) {
        for subscriber in &self.subscribers {
            // a closed channel only means that consumer went away
            let _ = subscriber.send(event.clone());
        }
    }

    fn ceiling_reached(&self, state: CrawlState) -> bool {
        self.options
            .step_ceiling
            .is_some_and(|ceiling| state.step_index >= ceiling)
            || self
                .options
                .page_ceiling
                .is_some_and(|ceiling| state.page_number >= ceiling)
    }

    /// Run the crawl to completion.
    ///
    /// Pages are processed strictly one at a time; no two pages of one
    /// crawl are ever in flight together. Returns the accumulated
    /// records — empty unless [`CrawlOptions::accumulate`] was enabled.
    /// Events already emitted for earlier pages stay valid even when a
    /// later page fails.
    ///
    /// # Errors
    ///
    /// The first transport or extraction error of any page-step aborts
    /// the crawl. The same error is published as
    /// [`CrawlEvent::Failed`]; on a clean end [`CrawlEvent::Ended`] is
    /// published instead.
    pub async fn run(self) -> Result<Vec<PhotoRecord>, ScrapeError> {
        let mut accumulated = Vec::new();
        let mut state = CrawlState {
            page_number: self.options.start_page,
            step_index: self.options.start_step,
        };

        loop {
            let records = match self.step(state).await {
                Ok(records) => records,
                Err(error) => {
                    self.emit(CrawlEvent::Failed {
                        error: error.to_string(),
                    });
                    return Err(error);
                }
            };

            let Some(records) = records else {
                // a zero-post page: the blog has no more pages
                self.emit(CrawlEvent::Ended);
                return Ok(accumulated);
            };

            for record in &records {
                self.emit(CrawlEvent::Record(record.clone()));
            }
            if self.options.accumulate {
                accumulated.extend(records);
            }

            if self.ceiling_reached(state) {
                // no page advance on the terminal step
                self.emit(CrawlEvent::Ended);
                return Ok(accumulated);
            }

            state = state.advanced();
            self.emit(CrawlEvent::PageAdvance {
                blog: self.options.blog.clone(),
                page_number: state.page_number,
                step_index: state.step_index,
            });
        }
    }

    /// One page-step: assemble the page and, when requested, attach the
    /// binary payloads. `Ok(None)` is the zero-post page.
    async fn step(&self, state: CrawlState) -> Result<Option<Vec<PhotoRecord>>, ScrapeError> {
        tracing::debug!(
            blog = %self.options.blog,
            page_number = state.page_number,
            step_index = state.step_index,
            "page step"
        );
        let records = get_page(
            &self.session,
            &self.base_url,
            &self.options.blog,
            state.page_number,
        )
        .await?;
        if records.is_empty() {
            return Ok(None);
        }
        let records = if self.options.download_binaries {
            self.download_all(records).await?
        } else {
            records
        };
        Ok(Some(records))
    }

    /// Download every record's payload concurrently and attach it.
    ///
    /// All-or-nothing: one failed download fails the whole step, and
    /// the outstanding downloads are aborted with it.
    async fn download_all(
        &self,
        mut records: Vec<PhotoRecord>,
    ) -> Result<Vec<PhotoRecord>, ScrapeError> {
        let mut downloads = JoinSet::new();
        for (index, record) in records.iter().enumerate() {
            let session = self.session.clone();
            let url = record.photo_url.clone();
            downloads.spawn(async move { (index, session.bytes(&url).await) });
        }

        let mut payloads: Vec<Option<Bytes>> = vec![None; records.len()];
        while let Some(joined) = downloads.join_next().await {
            let (index, downloaded) = unwrap_joined(joined);
            payloads[index] = Some(downloaded?);
        }
        for (record, payload) in records.iter_mut().zip(payloads) {
            record.photo_bytes = payload;
        }
        Ok(records)
    }
}
