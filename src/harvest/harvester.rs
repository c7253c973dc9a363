//! The crawl state machine.
//!
//! ```text
//! Start -> FetchingFeed -> ExtractingFeed
//!       -> (FetchingElement -> ExtractingElement -> MappingElement)*
//!       -> AdvancingPage -> FetchingFeed | Done | Aborted
//! ```
//!
//! One run is strictly sequential: at most one request is in flight and
//! every request waits for the politeness delay.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::HarvestError;
use super::config::RunConfig;
use super::layout::RunLayout;
use super::progress::HarvestProgress;
use super::report::{HarvestReport, RunTally};
use crate::authority::AuthorityClassifier;
use crate::compile::{CompileSummary, compile_target};
use crate::extract::{FormatExtractor, extractor};
use crate::fetch::{RateLimiter, Resource, SourceFetcher, resolve_politeness_delay};
use crate::mapper::{MapperOptions, OutputMapper, OutputTarget, mapper};
use crate::model::{Canonical, ElementRecord, FeedRecord, Label, Uri, UriLabel, UriList};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    Start,
    FetchingFeed,
    ExtractingFeed,
    FetchingElement,
    ExtractingElement,
    MappingElement,
    AdvancingPage,
    Done,
    Aborted,
}

impl CrawlState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::FetchingFeed => "fetching_feed",
            Self::ExtractingFeed => "extracting_feed",
            Self::FetchingElement => "fetching_element",
            Self::ExtractingElement => "extracting_element",
            Self::MappingElement => "mapping_element",
            Self::AdvancingPage => "advancing_page",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }

    /// Whether the run has ended.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One element of a page, either fetched or described inline.
enum PageElement {
    Inline(ElementRecord),
    /// The listed URI and the rewritten location to fetch.
    Listed { uri: Uri, location: String },
}

/// Runs one harvest.
pub struct Harvester {
    config: RunConfig,
    layout: RunLayout,
    fetcher: SourceFetcher,
    feed_extractor: Box<dyn FormatExtractor>,
    element_extractor: Box<dyn FormatExtractor>,
    mappers: Vec<(OutputTarget, Box<dyn OutputMapper>)>,
    options: MapperOptions,
    progress: HarvestProgress,
    state: CrawlState,
}

impl fmt::Debug for Harvester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harvester")
            .field("start_location", &self.config.start_location)
            .field("run_dir", &self.layout.run_dir())
            .field("outputs", &self.config.outputs)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Harvester {
    /// Prepares a run. The layout's run directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::HttpClient`] when the HTTP client cannot be
    /// built.
    pub fn new(
        config: RunConfig,
        layout: RunLayout,
        classifier: Option<Arc<AuthorityClassifier>>,
    ) -> Result<Self, HarvestError> {
        let fetcher = SourceFetcher::new(config.credentials())
            .map_err(|source| HarvestError::HttpClient { source })?;
        let mappers = config
            .outputs
            .iter()
            .filter_map(|target| mapper(*target).map(|m| (*target, m)))
            .collect();
        let options = MapperOptions {
            graph_format: config.graph_format,
            timestamp: Utc::now(),
            classifier,
        };
        Ok(Self {
            feed_extractor: extractor(config.feed_dialect),
            element_extractor: extractor(config.element_dialect),
            progress: HarvestProgress::new(config.quiet),
            fetcher,
            mappers,
            options,
            config,
            layout,
            state: CrawlState::Start,
        })
    }

    /// Crawls the feed, then compiles every requested output.
    ///
    /// Feed failures end the crawl and are reported through
    /// [`HarvestReport::success`]. Outputs are compiled on every path.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] when an output cannot be mapped, written or
    /// compiled. A crawl error takes precedence over a compile error.
    #[instrument(skip(self), fields(start = %self.config.start_location, run_dir = %self.layout.run_dir().display()))]
    pub async fn run(mut self) -> Result<HarvestReport, HarvestError> {
        self.layout.create_target_dirs(&self.config.outputs).await?;

        let delay = match self.config.delay_override {
            Some(delay) => delay,
            None => {
                resolve_politeness_delay(self.fetcher.client(), &self.config.start_location).await
            }
        };
        info!(delay_ms = delay.as_millis(), "starting harvest");
        let mut limiter = RateLimiter::new(delay);
        let mut tally = RunTally::default();

        let crawled = self.crawl(&mut limiter, &mut tally).await;
        if crawled.is_err() {
            self.transition(CrawlState::Aborted);
        }
        let compiled = self.compile_outputs();
        self.progress.finish();

        crawled?;
        let compiled = compiled?;
        let report = tally.into_report(self.state, compiled);
        info!(
            success = report.success,
            pages = report.pages,
            elements = report.elements_written,
            missing = report.missing.len(),
            incompatible = report.incompatible.len(),
            waited_ms = limiter.cumulative_delay().as_millis(),
            "harvest finished"
        );
        Ok(report)
    }

    fn transition(&mut self, next: CrawlState) {
        debug!(from = %self.state, to = %next, "crawl state");
        self.state = next;
    }

    async fn crawl(
        &mut self,
        limiter: &mut RateLimiter,
        tally: &mut RunTally,
    ) -> Result<(), HarvestError> {
        let mut feed_location = self.config.start_location.clone();
        let mut page = 0;

        while page < self.config.max_pagination {
            page += 1;
            self.transition(CrawlState::FetchingFeed);
            self.progress.page(page, &feed_location);
            limiter.acquire().await;
            let wanted = self.wanted_content_type(self.config.feed_dialect.preferred_content_type());
            let resource = self.fetcher.fetch(&feed_location, Some(&wanted)).await;
            if !resource.success {
                warn!(page, location = %feed_location, reason = %resource.failure_reason(), "feed page failed");
                tally.feed_failure = Some(format!(
                    "Feed page {page} ({feed_location}) could not be retrieved: {}.",
                    resource.failure_reason()
                ));
                self.transition(CrawlState::Aborted);
                return Ok(());
            }

            self.transition(CrawlState::ExtractingFeed);
            let mut feed = match self.feed_extractor.extract_feed(&resource) {
                Ok(feed) => feed,
                Err(error) => {
                    warn!(page, location = %feed_location, %error, "feed page not readable");
                    tally.feed_failure = Some(format!(
                        "Feed page {page} ({feed_location}) could not be read: {error}."
                    ));
                    self.transition(CrawlState::Aborted);
                    return Ok(());
                }
            };
            self.apply_overrides(&mut feed);
            tally.pages = page;
            info!(
                page,
                listed = feed.elements.len(),
                inline = feed.inline_elements.len(),
                "feed page read"
            );

            if page == 1 {
                self.write_headers(&feed).await?;
            }

            let elements = self.page_elements(&mut feed);
            let total = elements.len();
            for (offset, element) in elements.into_iter().enumerate() {
                let index = offset + 1;
                match element {
                    PageElement::Inline(mut record) => {
                        record.fill_missing(&feed.feed_uri, &feed.catalog, &feed.publisher);
                        self.map_element(&record, page, index).await?;
                        tally.elements_written += 1;
                    }
                    PageElement::Listed { uri, location } => {
                        self.progress.element(page, index, total, &location);
                        if self
                            .harvest_element(limiter, &feed, &uri, &location, page, index, tally)
                            .await?
                        {
                            tally.elements_written += 1;
                        }
                    }
                }
            }

            self.transition(CrawlState::AdvancingPage);
            let Some(next) = feed.next_page.as_str().map(str::to_string) else {
                debug!(page, "no next page");
                break;
            };
            if next == feed_location {
                warn!(page, location = %next, "next page points at the current page, stopping");
                break;
            }
            if page >= self.config.max_pagination {
                warn!(
                    max_pagination = self.config.max_pagination,
                    next = %next,
                    "pagination limit reached"
                );
                tally.pagination_limit = Some(self.config.max_pagination);
                break;
            }
            feed_location = next;
        }

        self.transition(CrawlState::Done);
        Ok(())
    }

    /// Fetches, reads and maps one listed element. Returns whether its
    /// outputs were written.
    #[allow(clippy::too_many_arguments)]
    async fn harvest_element(
        &mut self,
        limiter: &mut RateLimiter,
        feed: &FeedRecord,
        uri: &Uri,
        location: &str,
        page: usize,
        index: usize,
        tally: &mut RunTally,
    ) -> Result<bool, HarvestError> {
        self.transition(CrawlState::FetchingElement);
        limiter.acquire().await;
        let wanted =
            self.wanted_content_type(self.config.element_dialect.preferred_content_type());
        let resource = self.fetcher.fetch(location, Some(&wanted)).await;
        if !resource.success {
            warn!(page, index, location, reason = %resource.failure_reason(), "element missing");
            tally.missing.push(location.to_string());
            return Ok(false);
        }

        self.transition(CrawlState::ExtractingElement);
        let mut record = match self.element_extractor.extract_element(&resource) {
            Ok(record) => record,
            Err(error) => {
                warn!(page, index, location, %error, "element incompatible");
                tally.incompatible.push(location.to_string());
                return Ok(false);
            }
        };
        if !record.uri.has_content() {
            record.uri = uri.clone();
        }
        if record.source.is_empty() {
            record.source = location.to_string();
        }
        record.fill_missing(&feed.feed_uri, &feed.catalog, &feed.publisher);

        self.write_raw(&resource, page, index).await?;
        self.map_element(&record, page, index).await?;
        Ok(true)
    }

    /// Runs every mapper on one record and writes its files.
    async fn map_element(
        &mut self,
        record: &ElementRecord,
        page: usize,
        index: usize,
    ) -> Result<(), HarvestError> {
        self.transition(CrawlState::MappingElement);
        for (target, mapper) in &self.mappers {
            let bytes = mapper.generate(record, &self.options)?;
            let path = self
                .layout
                .element_path(*target, page, index, mapper.extension(&self.options));
            self.layout.write(&path, &bytes).await?;
        }
        debug!(page, index, uri = %record.uri, "element mapped");
        Ok(())
    }

    /// Stores the fetched bytes when the `files` output is requested.
    async fn write_raw(
        &self,
        resource: &Resource,
        page: usize,
        index: usize,
    ) -> Result<(), HarvestError> {
        if !self.config.outputs.contains(&OutputTarget::Files) {
            return Ok(());
        }
        let path = self.layout.element_path(
            OutputTarget::Files,
            page,
            index,
            resource.file_type.extension(),
        );
        self.layout.write(&path, &resource.raw).await
    }

    /// Emits feed-level output once, as `0-0`, so it sorts first.
    async fn write_headers(&self, feed: &FeedRecord) -> Result<(), HarvestError> {
        for (target, mapper) in &self.mappers {
            if let Some(bytes) = mapper.header(feed, &self.options)? {
                let path = self
                    .layout
                    .element_path(*target, 0, 0, mapper.extension(&self.options));
                self.layout.write(&path, &bytes).await?;
                debug!(%target, "feed header written");
            }
        }
        Ok(())
    }

    /// Inline records first, then listed URIs not already described inline,
    /// rewritten into fetch locations.
    fn page_elements(&self, feed: &mut FeedRecord) -> Vec<PageElement> {
        let inline = std::mem::take(&mut feed.inline_elements);
        let inline_uris: UriList = inline.iter().map(|record| record.uri.clone()).collect();

        let mut elements: Vec<PageElement> = inline.into_iter().map(PageElement::Inline).collect();
        for uri in &feed.elements {
            if inline_uris.contains(uri) {
                continue;
            }
            let Some(raw) = uri.as_str() else { continue };
            match self.config.rewrite.apply(raw) {
                Some(location) => elements.push(PageElement::Listed {
                    uri: uri.clone(),
                    location,
                }),
                None => debug!(uri = raw, "element filtered out"),
            }
        }
        elements
    }

    /// Configured feed, catalog and publisher replace what the page says.
    fn apply_overrides(&self, feed: &mut FeedRecord) {
        if let Some(feed_uri) = &self.config.feed_override {
            feed.feed_uri = Uri::new(feed_uri);
        }
        if let Some(catalog) = &self.config.catalog_override {
            feed.catalog = Uri::new(catalog);
        }
        if let Some(publisher) = &self.config.publisher_override {
            let uri = Uri::new(publisher);
            feed.publisher = if uri.has_content() {
                UriLabel::from_uri(uri)
            } else {
                UriLabel::from_label(Label::new(publisher))
            };
        }
    }

    fn wanted_content_type(&self, preferred: &str) -> String {
        self.config
            .content_type
            .clone()
            .unwrap_or_else(|| preferred.to_string())
    }

    /// Compiles every target, even after a failure. The first error wins.
    fn compile_outputs(&self) -> Result<Vec<CompileSummary>, HarvestError> {
        let mut compiled = Vec::new();
        let mut first_error = None;
        for target in &self.config.outputs {
            self.progress.compiling(target.as_str());
            match compile_target(
                self.layout.run_dir(),
                *target,
                self.config.graph_format,
                self.config.streaming_threshold,
            ) {
                Ok(Some(summary)) => compiled.push(summary),
                Ok(None) => {}
                Err(error) => {
                    warn!(%target, %error, "compile failed");
                    first_error.get_or_insert(error);
                }
            }
        }
        match first_error {
            Some(error) => Err(error.into()),
            None => Ok(compiled),
        }
    }
}
