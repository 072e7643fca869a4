//! Crawler coordinator - request dispatch and response handling
//!
//! This module contains the reactive crawl loop, including:
//! - Issuing the two discovery requests (input list and sitemap)
//! - Seeding per-branch frontiers from candidate URLs
//! - Routing each response through the retry policy to its handler
//! - Driving quantity probes against the cart endpoint
//! - Draining frontier batches to keep the crawl alive
//!
//! Handlers are synchronous and return the requests to submit next; the run
//! loop owns all concurrency.

use crate::config::Config;
use crate::crawler::fetcher::Transport;
use crate::crawler::frontier::{Frontier, SeenUrls};
use crate::crawler::request::{
    Dispatch, Fetched, RequestDescriptor, RequestKind, ResponseDescriptor,
};
use crate::crawler::retry::{Guarded, RetryPolicy};
use crate::crawler::seeds::normalize_candidate;
use crate::extract::{extract_product_page, select_links, sitemap_urls};
use crate::output::{print_statistics, CrawlStatistics, RecordSink};
use crate::state::{cart_accepted, PendingProbe, ProbeStep, ProductRecord};
use crate::SounderError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

type Completion = (RequestDescriptor, Result<Fetched, SounderError>);

/// Date stamp used on records, e.g. `16Oct2026`
pub fn today_date() -> String {
    chrono::Local::now().format("%d%b%Y").to_string()
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
    sink: Box<dyn RecordSink>,
    policy: RetryPolicy,
    seen: SeenUrls,
    dispatched: HashSet<String>,
    input_urls: Vec<String>,
    stats: CrawlStatistics,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `transport` - Performs the actual HTTP exchanges
    /// * `sink` - Receives finished records
    pub fn new(config: Config, transport: Arc<dyn Transport>, sink: Box<dyn RecordSink>) -> Self {
        let policy = RetryPolicy::from_config(&config.crawler);

        Self {
            config: Arc::new(config),
            transport,
            sink,
            policy,
            seen: SeenUrls::new(),
            dispatched: HashSet::new(),
            input_urls: Vec::new(),
            stats: CrawlStatistics::new(),
        }
    }

    /// Product URLs seeded when the input-list request completes
    pub fn with_input_urls(mut self, urls: Vec<String>) -> Self {
        self.input_urls = urls;
        self
    }

    pub fn stats(&self) -> &CrawlStatistics {
        &self.stats
    }

    pub fn seen_urls(&self) -> &SeenUrls {
        &self.seen
    }

    /// The two independent discovery requests, each on its own branch
    pub fn start_requests(&self) -> Vec<Dispatch> {
        vec![
            Dispatch::now(RequestDescriptor::get(
                RequestKind::InputList,
                self.config.site.base_url.clone(),
            )),
            Dispatch::now(RequestDescriptor::get(
                RequestKind::Sitemap,
                self.config.site.sitemap_url.clone(),
            )),
        ]
    }

    /// Runs the crawl until no request is in flight
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStatistics)` - Counters for the finished run
    /// * `Err(SounderError)` - The sink could not be flushed
    pub async fn run(&mut self) -> Result<CrawlStatistics, SounderError> {
        let start_time = Instant::now();
        let permits = Arc::new(Semaphore::new(
            self.config.crawler.max_concurrent_requests as usize,
        ));
        let mut tasks: JoinSet<Completion> = JoinSet::new();

        tracing::info!(
            "Starting crawl of {} ({} input URLs)",
            self.config.site.base_url,
            self.input_urls.len()
        );

        let start = self.start_requests();
        self.spawn_all(start, &mut tasks, &permits);

        let mut completions: u64 = 0;
        while let Some(joined) = tasks.join_next().await {
            completions += 1;
            let (request, outcome) = match joined {
                Ok(completion) => completion,
                Err(e) => {
                    tracing::error!("Fetch task failed: {}", e);
                    continue;
                }
            };

            let next = self.on_response(request, outcome);
            self.spawn_all(next, &mut tasks, &permits);

            if completions % 50 == 0 {
                tracing::info!(
                    "Progress: {} completed, {} handled, {} records, {} in flight",
                    completions,
                    self.stats.responses_handled,
                    self.stats.records_emitted,
                    tasks.len()
                );
            }
        }

        self.sink.flush()?;
        print_statistics(&self.stats, start_time.elapsed());

        Ok(self.stats.clone())
    }

    fn spawn_all(
        &mut self,
        batch: Vec<Dispatch>,
        tasks: &mut JoinSet<Completion>,
        permits: &Arc<Semaphore>,
    ) {
        for dispatch in batch {
            if !self.admit(&dispatch.request) {
                continue;
            }

            let transport = Arc::clone(&self.transport);
            let permits = Arc::clone(permits);

            tasks.spawn(async move {
                if !dispatch.delay.is_zero() {
                    tokio::time::sleep(dispatch.delay).await;
                }
                let _permit = permits.acquire_owned().await.ok();
                let outcome = transport.submit(&dispatch.request).await;
                (dispatch.request, outcome)
            });
        }
    }

    /// Dispatch dedup filter
    ///
    /// Returns false for a request whose fingerprint was already dispatched,
    /// unless it bypasses the filter.
    pub fn admit(&mut self, request: &RequestDescriptor) -> bool {
        if request.bypass_dedup {
            return true;
        }

        if self.dispatched.insert(request.fingerprint()) {
            true
        } else {
            tracing::trace!("Filtered duplicate request: {}", request.url);
            self.stats.filtered_duplicates += 1;
            false
        }
    }

    /// Handles one completed request and returns what to submit next
    pub fn on_response(
        &mut self,
        request: RequestDescriptor,
        outcome: Result<Fetched, SounderError>,
    ) -> Vec<Dispatch> {
        let policy = self.policy;

        match policy.guard(request, outcome, |response| self.route(response)) {
            Guarded::Handled(next) => next,
            Guarded::NotFound(request) => {
                self.stats.not_found += 1;
                self.on_not_found(request)
            }
            Guarded::Retry(dispatch) => {
                self.stats.retries += 1;
                vec![dispatch]
            }
            Guarded::Dropped(request) => {
                self.stats.dropped += 1;
                self.next_batch(&request.context.frontier)
            }
        }
    }

    fn route(&mut self, response: ResponseDescriptor) -> Vec<Dispatch> {
        self.stats.responses_handled += 1;
        tracing::debug!("Handling {:?} response from {}", response.request.kind, response.url);

        match response.request.kind {
            RequestKind::InputList => self.parse_input_list(response),
            RequestKind::Sitemap => self.parse_sitemap(response),
            RequestKind::CategoryIndex => self.parse_category_index(response),
            RequestKind::CategoryListing => self.parse_category_listing(response),
            RequestKind::ProductPage => self.parse_details(response),
            RequestKind::CartProbe => self.parse_quantity(response),
        }
    }

    /// A 404 from the sitemap switches discovery to category crawling;
    /// anywhere else it ends the item and the branch keeps draining
    fn on_not_found(&mut self, request: RequestDescriptor) -> Vec<Dispatch> {
        if request.kind == RequestKind::Sitemap {
            tracing::info!("Sitemap unavailable, discovering products through categories");
            let index = RequestDescriptor::get(
                RequestKind::CategoryIndex,
                self.config.site.base_url.clone(),
            )
            .bypassing_dedup();
            return vec![Dispatch::now(index)];
        }

        self.next_batch(&request.context.frontier)
    }

    fn parse_input_list(&mut self, response: ResponseDescriptor) -> Vec<Dispatch> {
        let frontier = response.context().frontier.clone();
        let urls = self.input_urls.clone();
        let seeded = self.seed(urls, &frontier);
        tracing::info!("Seeded {} product pages from the input list", seeded);

        self.next_batch(&frontier)
    }

    fn parse_sitemap(&mut self, response: ResponseDescriptor) -> Vec<Dispatch> {
        let frontier = response.context().frontier.clone();
        let urls = sitemap_urls(&response.body, &self.config.site.page_suffix);
        let listed = urls.len();
        let seeded = self.seed(urls, &frontier);
        tracing::info!("Sitemap listed {} product URLs, {} new", listed, seeded);

        self.next_batch(&frontier)
    }

    fn parse_category_index(&mut self, response: ResponseDescriptor) -> Vec<Dispatch> {
        let Some(base) = self.base_for(&response) else {
            return Vec::new();
        };

        let categories = select_links(
            &response.body,
            &base,
            &self.config.site.category_link_selector,
        );
        tracing::info!("Found {} category pages", categories.len());

        categories
            .into_iter()
            .map(|url| Dispatch::now(RequestDescriptor::get(RequestKind::CategoryListing, url)))
            .collect()
    }

    /// Seeds a listing's products into its branch and follows its next page
    fn parse_category_listing(&mut self, response: ResponseDescriptor) -> Vec<Dispatch> {
        let frontier = response.context().frontier.clone();
        let Some(base) = self.base_for(&response) else {
            return self.next_batch(&frontier);
        };

        let site = &self.config.site;
        let products = select_links(&response.body, &base, &site.listing_product_selector);
        let next_page = select_links(&response.body, &base, &site.listing_next_selector)
            .into_iter()
            .next();

        let seeded = self.seed(products, &frontier);
        tracing::debug!("Listing {} added {} product pages", response.url, seeded);

        let mut batch = self.next_batch(&frontier);
        if let Some(url) = next_page {
            let mut next = RequestDescriptor::get(RequestKind::CategoryListing, url);
            next.context.frontier = frontier;
            batch.push(Dispatch::now(next));
        }
        batch
    }

    /// Extracts a product page's records
    ///
    /// Out-of-stock records are emitted straight away; in-stock ones get a
    /// cart probe placed at the front of the branch.
    fn parse_details(&mut self, response: ResponseDescriptor) -> Vec<Dispatch> {
        let frontier = response.context().frontier.clone();

        match extract_product_page(&response.body, &response.url, &today_date()) {
            Ok(page) => {
                self.stats.pages_parsed += 1;
                self.stats.skipped_variants += page.skipped_variants as u64;

                for record in page.records {
                    if !record.in_stock {
                        self.emit(record);
                    } else if record.product_cart_id.is_empty() {
                        tracing::debug!(
                            "No cart id for {} on {}, reporting quantity 0",
                            record.product_id,
                            record.product_url
                        );
                        self.emit(record);
                    } else {
                        let pending = PendingProbe::new(record, self.config.crawler.max_quantity);
                        frontier.push_front(self.cart_request(pending));
                    }
                }
            }
            Err(e) => {
                self.stats.extraction_errors += 1;
                tracing::debug!("Got error while parsing product {}: {}", response.url, e);
            }
        }

        self.next_batch(&frontier)
    }

    /// Folds a cart response into its probe
    fn parse_quantity(&mut self, response: ResponseDescriptor) -> Vec<Dispatch> {
        let mut request = response.request;
        let frontier = request.context.frontier.clone();

        let Some(mut pending) = request.context.item.take() else {
            tracing::warn!("Cart response without a pending probe: {}", response.url);
            return self.next_batch(&frontier);
        };

        self.stats.probes_answered += 1;
        let accepted = cart_accepted(&response.body, &self.config.site.cart_success_marker);

        match pending.probe.record(accepted) {
            ProbeStep::Continue(quantity) => {
                tracing::trace!(
                    "Probe {} next asks for {} (bounds {}..{})",
                    pending.record.product_id,
                    quantity,
                    pending.probe.lower_limit,
                    pending.probe.upper_limit
                );
                let mut next = self.cart_request(pending);
                next.context.frontier = frontier;
                vec![Dispatch::now(next)]
            }
            ProbeStep::Converged(quantity) => {
                tracing::debug!(
                    "Probe for {} converged at {}",
                    pending.record.product_id,
                    quantity
                );
                self.emit(pending.finish());
                self.next_batch(&frontier)
            }
        }
    }

    /// Enqueues a fetch for every acceptable, unseen candidate
    ///
    /// # Returns
    ///
    /// The number of requests enqueued
    fn seed(&mut self, candidates: Vec<String>, frontier: &Frontier) -> usize {
        let mut seeded = 0;

        for candidate in candidates {
            let Some(url) = normalize_candidate(&candidate, &self.config.site.page_suffix) else {
                continue;
            };
            if !self.seen.insert(&url) {
                continue;
            }

            frontier.push_back(RequestDescriptor::get(RequestKind::ProductPage, url));
            seeded += 1;
        }

        seeded
    }

    /// Pops the next batch off a branch
    fn next_batch(&self, frontier: &Frontier) -> Vec<Dispatch> {
        let batch = frontier.pop_batch(self.config.crawler.batch_size);
        tracing::trace!("Popped {} requests, {} left on branch", batch.len(), frontier.len());
        batch.into_iter().map(Dispatch::now).collect()
    }

    fn cart_request(&self, pending: PendingProbe) -> RequestDescriptor {
        RequestDescriptor::cart_probe(
            &self.config.site.add_to_cart_url,
            &self.config.site.form_key,
            pending,
        )
    }

    fn emit(&mut self, record: ProductRecord) {
        self.stats.records_emitted += 1;
        if record.in_stock {
            self.stats.records_in_stock += 1;
        } else {
            self.stats.records_out_of_stock += 1;
        }

        if let Err(e) = self.sink.write_record(&record) {
            self.stats.sink_errors += 1;
            tracing::error!("Failed to write record {}: {}", record.product_id, e);
        }
    }

    fn base_for(&self, response: &ResponseDescriptor) -> Option<Url> {
        Url::parse(&response.url)
            .or_else(|_| Url::parse(&self.config.site.base_url))
            .map_err(|e| tracing::warn!("Cannot resolve links on {}: {}", response.url, e))
            .ok()
    }
}
