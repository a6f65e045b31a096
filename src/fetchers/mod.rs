//! The generic venue fetcher.
//!
//! Every venue in the catalog is a [`Simple`] value: URL templates, a
//! handful of selectors, queriers for each field and a [`TimeHandler`].
//! One orchestrator interprets those configs: it picks a pagination
//! strategy, expands detail pages through a bounded worker pool and
//! resolves loose date fragments into absolute timestamps.
//!
//! `scraper::Html` is not `Send`, so each page is parsed and reduced inside
//! a synchronous section; only raw bodies and extracted data cross awaits,
//! which keeps `fetch` futures spawnable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate};
use scraper::ElementRef;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::dom::{self, DocumentLoader};
use crate::error::{Result, ScraperError};
use crate::querier::Querier;
use crate::textutil;
use crate::timeutil;
use crate::types::{Live, Venue};

pub mod harness;

pub use harness::ExpectedFirstLive;

/// Cap on concurrent detail-page fetches per venue.
const MAX_DETAIL_WORKERS: usize = 10;

/// Shown when a venue exposes no price information at all.
const NO_PRICE_FALLBACK: &str =
    "このライブハウスのイベントの値段にアクセスできません。ライブのリンクをチェックしてください。";

/// Where and how to find the date and time fields for a venue.
#[derive(Default)]
pub struct TimeHandler {
    /// Year of the live. When absent the year is inferred from the month:
    /// months before the current calendar month belong to next year.
    pub year: Option<Querier>,
    pub month: Option<Querier>,
    pub day: Option<Querier>,
    /// Open time in loose `hh:mm` form. Hours of 24 and above are handled by
    /// the core, as is stray text around the clock.
    pub open_time: Option<Querier>,
    pub start_time: Option<Querier>,
    /// Whether each live block carries its own year element, as opposed to a
    /// single shared element for the whole page.
    pub is_year_in_live: bool,
    /// Same as `is_year_in_live`, for the month.
    pub is_month_in_live: bool,
}

/// Declarative per-venue fetch configuration.
///
/// Exactly one pagination strategy applies, selected by which fields are
/// set: `initial_url` + `next_selector` follows next-page links,
/// `month_iterable_url` iterates months from the current one, a bare
/// `initial_url` is fetched once.
#[derive(Default)]
pub struct Simple {
    /// Base URL of the venue site, used to resolve relative hrefs.
    pub base_url: String,
    pub initial_url: String,
    /// URL template with `{yyyy}`, `{yy}`, `{m}`, `{mm}` tokens for
    /// month-by-month schedule pages.
    pub month_iterable_url: String,
    /// Selector for the link to the next schedule page.
    pub next_selector: String,
    /// Selector matching one live on the schedule page.
    pub live_selector: String,
    /// Some sites wrap all lives of one day in a single element and only
    /// write the date on the wrapper. `live_selector` then matches the
    /// wrapper and this selector the individual lives inside it.
    pub multi_live_day_selector: String,
    /// Selector for an anchor leading to a live's own detail page. When set,
    /// all live-scoped queriers run against the detail document instead.
    pub expanded_live_selector: String,
    /// For the rare detail page that holds several lives: selector returning
    /// each of them.
    pub expanded_live_group_selector: String,
    /// Selector within a live for a link to use as the live's URL.
    pub details_link_selector: String,

    pub title_querier: Option<Querier>,
    pub artists_querier: Option<Querier>,
    pub price_querier: Option<Querier>,
    /// Fallback querier returning an unstructured blob of text, mined with
    /// heuristics for whichever of artists/price/open/start has no dedicated
    /// querier. Noticeably less accurate; avoid where possible.
    pub detail_querier: Option<Querier>,

    pub time_handler: TimeHandler,

    /// Prefecture and area names are standardized across connectors,
    /// case sensitive.
    pub prefecture_name: String,
    pub area_name: String,
    /// Globally unique venue id. Never change an existing id without a very
    /// strong reason; a venue renaming alone is not one.
    pub venue_id: String,
    pub latitude: f64,
    pub longitude: f64,

    /// Expected values for the per-venue conformance tests.
    pub expected: ExpectedFirstLive,
}

/// Events accumulated by a fetch run, plus the error (if any) that stopped
/// a pagination chain early. A failed initial load yields zero events and
/// the error.
pub struct FetchResult {
    pub lives: Vec<Live>,
    pub error: Option<ScraperError>,
}

/// Where a field's value comes from, resolved once per run.
enum FieldSource<'a> {
    Structured(&'a Querier),
    Blob(&'a Querier),
    Missing,
}

struct Sources<'a> {
    title: &'a Querier,
    artists: FieldSource<'a>,
    price: FieldSource<'a>,
    open_time: FieldSource<'a>,
    start_time: FieldSource<'a>,
}

fn pick<'a>(structured: &'a Option<Querier>, blob: &'a Option<Querier>) -> FieldSource<'a> {
    match (structured, blob) {
        (Some(q), _) => FieldSource::Structured(q),
        (None, Some(b)) => FieldSource::Blob(b),
        (None, None) => FieldSource::Missing,
    }
}

/// Dates carried from one live to the next: some layouts omit a repeated
/// month or day, in which case the previous live's value applies.
#[derive(Default)]
struct DateState {
    month: String,
    day: String,
}

enum PagePlan {
    /// Events extracted directly from the schedule page.
    Direct(Vec<Live>),
    /// Detail hrefs to expand; shared date parts came from the overview.
    Expand {
        hrefs: Vec<String>,
        shared_year: Option<String>,
        shared_month: Option<String>,
    },
}

struct PageScan {
    plan: PagePlan,
    next_href: Option<String>,
}

struct DetailJob {
    href: String,
    url: Option<Url>,
    body: Option<String>,
}

impl Simple {
    pub fn venue(&self) -> Venue {
        Venue {
            id: self.venue_id.clone(),
            prefecture: self.prefecture_name.clone(),
            area: self.area_name.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Runs pagination and extraction for this venue.
    pub async fn fetch(&self, loader: Arc<dyn DocumentLoader>) -> FetchResult {
        self.fetch_mode(loader, false).await
    }

    /// Like [`Simple::fetch`], but with the past-event cutoff and the
    /// stale-page guard disabled so saved fixture pages stay usable as time
    /// passes.
    pub async fn fetch_for_tests(&self, loader: Arc<dyn DocumentLoader>) -> FetchResult {
        self.fetch_mode(loader, true).await
    }

    pub(crate) async fn fetch_mode(
        &self,
        loader: Arc<dyn DocumentLoader>,
        testing: bool,
    ) -> FetchResult {
        let sources = match self.sources() {
            Ok(s) => s,
            Err(e) => {
                return FetchResult {
                    lives: Vec::new(),
                    error: Some(e),
                }
            }
        };
        if !self.initial_url.is_empty() && !self.next_selector.is_empty() {
            self.iterate_next_link(&sources, &loader, testing).await
        } else if !self.month_iterable_url.is_empty() {
            self.iterate_months(&sources, &loader, testing).await
        } else if !self.initial_url.is_empty() {
            self.fetch_single(&sources, &loader, testing).await
        } else {
            FetchResult {
                lives: Vec::new(),
                error: Some(ScraperError::Config(format!(
                    "{}: no fetch strategy configured",
                    self.venue_id
                ))),
            }
        }
    }

    fn sources(&self) -> Result<Sources<'_>> {
        let title = self.title_querier.as_ref().ok_or_else(|| {
            ScraperError::Config(format!("{}: title querier is required", self.venue_id))
        })?;
        Ok(Sources {
            title,
            artists: pick(&self.artists_querier, &self.detail_querier),
            price: pick(&self.price_querier, &self.detail_querier),
            open_time: pick(&self.time_handler.open_time, &self.detail_querier),
            start_time: pick(&self.time_handler.start_time, &self.detail_querier),
        })
    }

    async fn fetch_single(
        &self,
        sources: &Sources<'_>,
        loader: &Arc<dyn DocumentLoader>,
        testing: bool,
    ) -> FetchResult {
        let mut state = DateState::default();
        let url = match Url::parse(&self.initial_url) {
            Ok(u) => u,
            Err(e) => {
                return FetchResult {
                    lives: Vec::new(),
                    error: Some(e.into()),
                }
            }
        };
        match self.load_page(sources, loader, &url, &mut state, testing).await {
            Ok((lives, _)) => FetchResult { lives, error: None },
            Err(e) => FetchResult {
                lives: Vec::new(),
                error: Some(e),
            },
        }
    }

    async fn iterate_next_link(
        &self,
        sources: &Sources<'_>,
        loader: &Arc<dyn DocumentLoader>,
        testing: bool,
    ) -> FetchResult {
        let mut lives = Vec::new();
        let (base, initial) = match (Url::parse(&self.base_url), Url::parse(&self.initial_url)) {
            (Ok(b), Ok(i)) => (b, i),
            (Err(e), _) | (_, Err(e)) => {
                return FetchResult {
                    lives,
                    error: Some(e.into()),
                }
            }
        };

        let mut prev = initial.clone();
        let mut next_href = match self
            .load_page(sources, loader, &initial, &mut DateState::default(), testing)
            .await
        {
            Ok((page, next)) => {
                lives = page;
                next
            }
            Err(e) => {
                return FetchResult {
                    lives,
                    error: Some(e),
                }
            }
        };

        let current_year = timeutil::now_jst().year();
        while let Some(href) = next_href {
            let next_url = match base.join(&href) {
                Ok(u) => u,
                Err(e) => return FetchResult { lives, error: Some(e.into()) },
            };
            // A next link pointing back into the current URL (or the other
            // way around) means the site is cycling on its last page.
            if prev.as_str().starts_with(next_url.as_str())
                || next_url.as_str().starts_with(prev.as_str())
            {
                break;
            }
            prev = next_url.clone();

            let mut state = DateState::default();
            let (page, next) = match self
                .load_page(sources, loader, &next_url, &mut state, testing)
                .await
            {
                Ok(r) => r,
                Err(e) => return FetchResult { lives, error: Some(e) },
            };
            if page.is_empty() {
                break;
            }
            // Some sites keep serving ancient archive pages forever; stop
            // once a page has nothing from the current year onward.
            if !testing && !page.iter().any(|l| l.start_time.year() >= current_year) {
                break;
            }
            lives.extend(page);
            next_href = next;
        }
        FetchResult { lives, error: None }
    }

    async fn iterate_months(
        &self,
        sources: &Sources<'_>,
        loader: &Arc<dyn DocumentLoader>,
        testing: bool,
    ) -> FetchResult {
        let now = timeutil::now_jst();
        let mut year = now.year();
        let mut month = now.month();
        let mut lives = Vec::new();
        loop {
            let url = match Url::parse(&self.month_url(year, month)) {
                Ok(u) => u,
                Err(e) => return FetchResult { lives, error: Some(e.into()) },
            };
            let mut state = DateState::default();
            let (page, _) = match self
                .load_page(sources, loader, &url, &mut state, testing)
                .await
            {
                Ok(r) => r,
                Err(e) => return FetchResult { lives, error: Some(e) },
            };
            if page.is_empty() {
                break;
            }
            lives.extend(page);
            month += 1;
            if month > 12 {
                month = 1;
                year += 1;
            }
        }
        FetchResult { lives, error: None }
    }

    /// Fills the month-iterable URL template for a given year and month.
    pub fn month_url(&self, year: i32, month: u32) -> String {
        self.month_iterable_url
            .replace("{yyyy}", &year.to_string())
            .replace("{yy}", &format!("{:02}", year.rem_euclid(100)))
            .replace("{mm}", &format!("{month:02}"))
            .replace("{m}", &month.to_string())
    }

    async fn load_page(
        &self,
        sources: &Sources<'_>,
        loader: &Arc<dyn DocumentLoader>,
        url: &Url,
        state: &mut DateState,
        testing: bool,
    ) -> Result<(Vec<Live>, Option<String>)> {
        let body = loader.load_url(url.as_str()).await?;
        self.extract_body(sources, loader, &body, url, state, testing)
            .await
    }

    /// Extracts all lives from one already-loaded page body, following
    /// detail links through the worker pool when configured. Returns the
    /// lives plus the raw href of the next page, if any.
    async fn extract_body(
        &self,
        sources: &Sources<'_>,
        loader: &Arc<dyn DocumentLoader>,
        body: &str,
        url: &Url,
        state: &mut DateState,
        testing: bool,
    ) -> Result<(Vec<Live>, Option<String>)> {
        let scan = self.scan_page(sources, body, url, state, testing)?;
        match scan.plan {
            PagePlan::Direct(lives) => Ok((lives, scan.next_href)),
            PagePlan::Expand {
                hrefs,
                shared_year,
                shared_month,
            } => {
                let jobs = fetch_detail_pages(loader.clone(), url, hrefs).await;
                let mut lives = Vec::new();
                for job in jobs {
                    let (detail_url, body) = match (job.url, job.body) {
                        (Some(u), Some(b)) => (u, b),
                        _ => continue,
                    };
                    let page = self.extract_detail_page(
                        sources,
                        &body,
                        &detail_url,
                        shared_year.as_deref(),
                        shared_month.as_deref(),
                        state,
                        testing,
                    )?;
                    lives.extend(page);
                }
                Ok((lives, scan.next_href))
            }
        }
    }

    fn scan_page(
        &self,
        sources: &Sources<'_>,
        body: &str,
        url: &Url,
        state: &mut DateState,
        testing: bool,
    ) -> Result<PageScan> {
        let doc = dom::parse_document(body);
        let root = doc.root_element();

        let next_href = if self.next_selector.is_empty() {
            None
        } else {
            let next_sel = dom::parse_selector(&self.next_selector)?;
            dom::query_first(root, &next_sel)
                .and_then(|n| dom::attr(n, "href"))
                .filter(|href| !href.is_empty())
                .map(str::to_string)
        };

        let live_sel = dom::parse_selector(&self.live_selector)?;
        let blocks = dom::query_all(root, &live_sel);
        if blocks.is_empty() {
            return Ok(PageScan {
                plan: PagePlan::Direct(Vec::new()),
                next_href,
            });
        }

        let shared_year = if self.time_handler.is_year_in_live {
            None
        } else {
            Some(self.resolve_year(root)?)
        };
        let shared_month = if self.time_handler.is_month_in_live {
            None
        } else {
            Some(self.resolve_month(root)?)
        };

        if !self.expanded_live_selector.is_empty() {
            let anchor_sel = dom::parse_selector(&self.expanded_live_selector)?;
            let mut hrefs = Vec::new();
            for block in blocks {
                match dom::query_first(block, &anchor_sel).and_then(|a| dom::attr(a, "href")) {
                    Some(href) => hrefs.push(href.to_string()),
                    None => warn!(venue = %self.venue_id, url = %url, "live block without detail link"),
                }
            }
            return Ok(PageScan {
                plan: PagePlan::Expand {
                    hrefs,
                    shared_year,
                    shared_month,
                },
                next_href,
            });
        }

        let lives = self.extract_blocks(
            sources,
            &blocks,
            url,
            shared_year.as_deref(),
            shared_month.as_deref(),
            state,
            testing,
        )?;
        Ok(PageScan {
            plan: PagePlan::Direct(lives),
            next_href,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn extract_detail_page(
        &self,
        sources: &Sources<'_>,
        body: &str,
        url: &Url,
        shared_year: Option<&str>,
        shared_month: Option<&str>,
        state: &mut DateState,
        testing: bool,
    ) -> Result<Vec<Live>> {
        let doc = dom::parse_document(body);
        let root = doc.root_element();
        if self.expanded_live_group_selector.is_empty() {
            self.extract_blocks(sources, &[root], url, shared_year, shared_month, state, testing)
        } else {
            let group_sel = dom::parse_selector(&self.expanded_live_group_selector)?;
            let nodes = dom::query_all(root, &group_sel);
            self.extract_blocks(sources, &nodes, url, shared_year, shared_month, state, testing)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn extract_blocks(
        &self,
        sources: &Sources<'_>,
        blocks: &[ElementRef<'_>],
        url: &Url,
        shared_year: Option<&str>,
        shared_month: Option<&str>,
        state: &mut DateState,
        testing: bool,
    ) -> Result<Vec<Live>> {
        let cutoff = timeutil::now_jst()
            .checked_sub_months(Months::new(1))
            .unwrap_or_else(timeutil::now_jst);
        let mut lives = Vec::new();

        let inner_sel = if self.multi_live_day_selector.is_empty() {
            None
        } else {
            Some(dom::parse_selector(&self.multi_live_day_selector)?)
        };

        for block in blocks {
            let date = match self.resolve_date(*block, shared_year, shared_month, state) {
                Ok(d) => d,
                Err(e) => {
                    warn!(venue = %self.venue_id, error = %e, "skipping live: unresolvable date");
                    continue;
                }
            };

            let nodes: Vec<ElementRef<'_>> = match &inner_sel {
                Some(sel) => dom::query_all(*block, sel),
                None => vec![*block],
            };
            for node in nodes {
                match self.extract_live(sources, node, url, date) {
                    Ok(live) => {
                        if !testing && live.start_time < cutoff {
                            debug!(venue = %self.venue_id, start = %live.start_time, "dropping past live");
                            continue;
                        }
                        lives.push(live);
                    }
                    Err(e) => {
                        warn!(venue = %self.venue_id, error = %e, "skipping live");
                    }
                }
            }
        }
        Ok(lives)
    }

    fn resolve_date(
        &self,
        node: ElementRef<'_>,
        shared_year: Option<&str>,
        shared_month: Option<&str>,
        state: &mut DateState,
    ) -> Result<NaiveDate> {
        let year = match shared_year {
            Some(y) => y.to_string(),
            None => self.resolve_year(node)?,
        };

        let month = match shared_month {
            Some(m) => m.to_string(),
            None => match self.resolve_month(node) {
                Ok(m) if !m.is_empty() => m,
                // Layouts often only mark the month on its first live.
                _ => state.month.clone(),
            },
        };
        state.month = month.clone();

        let day = match self.resolve_day(node) {
            Ok(d) if !d.is_empty() => d,
            _ => state.day.clone(),
        };
        state.day = day.clone();

        let (y, m, d) = (
            year.parse::<i32>(),
            month.parse::<u32>(),
            day.parse::<u32>(),
        );
        match (y, m, d) {
            (Ok(y), Ok(m), Ok(d)) => {
                NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| ScraperError::Scrape {
                    message: format!("invalid date {y}-{m:02}-{d:02}"),
                })
            }
            _ => Err(ScraperError::Scrape {
                message: format!("unparsable date parts {year:?}-{month:?}-{day:?}"),
            }),
        }
    }

    fn resolve_year(&self, node: ElementRef<'_>) -> Result<String> {
        match &self.time_handler.year {
            Some(q) => {
                let res = q.execute(node);
                let year = timeutil::first_number(&res[0]).ok_or_else(|| {
                    ScraperError::MissingField(format!("{}: year", self.venue_id))
                })?;
                if year.len() == 2 {
                    Ok(format!("20{year}"))
                } else {
                    Ok(year.to_string())
                }
            }
            None => {
                let month: u32 =
                    self.resolve_month(node)?
                        .parse()
                        .map_err(|_| ScraperError::MissingField(format!(
                            "{}: month (needed to infer year)",
                            self.venue_id
                        )))?;
                Ok(timeutil::relevant_year(month).to_string())
            }
        }
    }

    fn resolve_month(&self, node: ElementRef<'_>) -> Result<String> {
        let q = self
            .time_handler
            .month
            .as_ref()
            .ok_or_else(|| ScraperError::MissingField(format!("{}: month querier", self.venue_id)))?;
        let res = q.execute(node);
        Ok(timeutil::first_number(&res[0])
            .map(timeutil::pad2)
            .unwrap_or_default())
    }

    fn resolve_day(&self, node: ElementRef<'_>) -> Result<String> {
        let q = self
            .time_handler
            .day
            .as_ref()
            .ok_or_else(|| ScraperError::MissingField(format!("{}: day querier", self.venue_id)))?;
        let res = q.execute(node);
        Ok(timeutil::first_number(&res[0])
            .map(timeutil::pad2)
            .unwrap_or_default())
    }

    fn extract_live(
        &self,
        sources: &Sources<'_>,
        node: ElementRef<'_>,
        url: &Url,
        date: NaiveDate,
    ) -> Result<Live> {
        let mut open = resolve_clock(&sources.open_time, node, date, "open")?;
        let mut start = resolve_clock(&sources.start_time, node, date, "start")?;
        // When only one of the two resolved, mirror it into the other.
        if timeutil::is_unknown_time(&open) && !timeutil::is_unknown_time(&start) {
            open = start;
        }
        if timeutil::is_unknown_time(&start) && !timeutil::is_unknown_time(&open) {
            start = open;
        }

        let title = sources.title.execute(node)[0].clone();

        let artists = match &sources.artists {
            FieldSource::Structured(q) => textutil::process_artists(q.execute(node)),
            FieldSource::Blob(q) => {
                let blob = q.execute(node);
                textutil::process_artists(blob[0].split('\n').map(str::to_string))
            }
            FieldSource::Missing => Vec::new(),
        };

        let price = match &sources.price {
            FieldSource::Structured(q) => q.execute(node)[0].clone(),
            FieldSource::Blob(q) => textutil::find_price(&q.execute(node)),
            FieldSource::Missing => NO_PRICE_FALLBACK.to_string(),
        };

        let mut details_url = url.clone();
        if !self.details_link_selector.is_empty() {
            if let Ok(sel) = dom::parse_selector(&self.details_link_selector) {
                if let Some(href) = dom::query_first(node, &sel).and_then(|a| dom::attr(a, "href"))
                {
                    if let Ok(resolved) = url.join(href) {
                        details_url = resolved;
                    }
                }
            }
        }

        Ok(Live {
            id: None,
            title,
            artists,
            open_time: open,
            start_time: start,
            price: price.trim().to_string(),
            price_english: textutil::english_price(&price).trim().to_string(),
            venue: self.venue(),
            url: details_url.to_string(),
        })
    }
}

fn resolve_clock(
    source: &FieldSource<'_>,
    node: ElementRef<'_>,
    date: NaiveDate,
    marker: &str,
) -> Result<chrono::DateTime<chrono::FixedOffset>> {
    match source {
        FieldSource::Structured(q) => timeutil::parse_time(date, &q.execute(node)[0]),
        FieldSource::Blob(q) => {
            let blob = q.execute(node).join("");
            timeutil::parse_time(date, &timeutil::find_time(&blob, marker))
        }
        FieldSource::Missing => timeutil::parse_time(date, ""),
    }
}

/// Fetches detail pages through a fixed pool of `min(10, n)` workers.
///
/// Workers pull indices from a shared cursor out of a pre-filled job list
/// and write into their own slot; each slot is touched by exactly one
/// worker, and slot order (not arrival order) carries result position.
async fn fetch_detail_pages(
    loader: Arc<dyn DocumentLoader>,
    page_url: &Url,
    hrefs: Vec<String>,
) -> Vec<DetailJob> {
    if hrefs.is_empty() {
        return Vec::new();
    }
    let jobs: Arc<Vec<Mutex<DetailJob>>> = Arc::new(
        hrefs
            .into_iter()
            .map(|href| {
                Mutex::new(DetailJob {
                    href,
                    url: None,
                    body: None,
                })
            })
            .collect(),
    );
    let cursor = Arc::new(AtomicUsize::new(0));
    let workers = jobs.len().min(MAX_DETAIL_WORKERS);

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let jobs = Arc::clone(&jobs);
        let cursor = Arc::clone(&cursor);
        let loader = Arc::clone(&loader);
        let base = page_url.clone();
        handles.push(tokio::spawn(async move {
            loop {
                let i = cursor.fetch_add(1, Ordering::Relaxed);
                if i >= jobs.len() {
                    break;
                }
                let mut job = jobs[i].lock().await;
                let url = match base.join(&job.href) {
                    Ok(u) => u,
                    Err(e) => {
                        warn!(href = %job.href, error = %e, "unresolvable detail href");
                        continue;
                    }
                };
                job.url = Some(url.clone());
                match loader.load_url(url.as_str()).await {
                    Ok(body) => job.body = Some(body),
                    Err(e) => warn!(url = %url, error = %e, "detail page fetch failed"),
                }
            }
        }));
    }
    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "detail page worker aborted");
        }
    }

    match Arc::try_unwrap(jobs) {
        Ok(jobs) => jobs.into_iter().map(|m| m.into_inner()).collect(),
        // All workers have been joined, so the Arc is unique; this branch is
        // unreachable but cheaper than a panic.
        Err(_) => Vec::new(),
    }
}
