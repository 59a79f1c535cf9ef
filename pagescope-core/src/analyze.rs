use crate::config::AnalyzerConfig;
use crate::doctype::detect_doctype;
use crate::login::{InputShape, looks_like_login};
use crate::model::{AnalysisResult, HeadingCount, Links};
use indicatif::{ProgressBar, ProgressStyle};
use pagescope_scanner::{
    LinkSet, PageDocument, ProbeCallback, ProbeOutcome, Prober, ScanError, build_client,
    classify_links, fetch_page,
};
use reqwest::Client;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("URL is not reachable: {0}")]
    Unreachable(#[source] ScanError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Everything read from the document itself, before any probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSurvey {
    pub url: String,
    pub html_version: String,
    pub page_title: String,
    pub heading_count: HeadingCount,
    pub links: LinkSet,
    pub page_contains_login_form: bool,
}

/// Runs every check against one page and assembles the result.
///
/// `survey` is synchronous and reads the document; `verify` probes the
/// external links. `analyze_url` does both without holding the document
/// across an await, so its future is `Send`.
pub struct PageAnalyzer {
    config: Arc<AnalyzerConfig>,
    client: Client,
    prober: Prober,
}

impl PageAnalyzer {
    pub fn new(config: Arc<AnalyzerConfig>) -> Result<Self, AnalysisError> {
        let client = build_client(&config.probe.user_agent, config.probe.timeout())?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: Arc<AnalyzerConfig>, client: Client) -> Self {
        let prober = Prober::new(client.clone())
            .with_accepted_statuses(config.probe.accepted_statuses.clone())
            .with_concurrency(config.probe.concurrency)
            .with_deadline(config.probe.deadline());

        Self {
            config,
            client,
            prober,
        }
    }

    pub fn with_probe_callback(mut self, callback: ProbeCallback) -> Self {
        self.prober = self.prober.with_probe_callback(callback);
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn survey(
        &self,
        page_url: &str,
        document: &PageDocument,
    ) -> Result<PageSurvey, AnalysisError> {
        let markup = document.raw_markup()?;
        // Declaration as the tree renders it first, so `<!doctype html>` still matches.
        let declared = match document.doctype_declaration() {
            Some(declaration) => format!("{}\n{}", declaration, markup),
            None => markup.to_string(),
        };
        let html_version = detect_doctype(&declared, &self.config.doctypes).to_string();
        let page_title = document.first_text("title").unwrap_or_default();

        let heading_count = HeadingCount::from_levels(
            self.config
                .heading_tags()
                .map(|tag| document.count_elements(tag)),
        );

        let links = classify_links(document, &self.config.link_exceptions);

        let shape = InputShape::from_document(document);
        let page_contains_login_form = looks_like_login(page_url, shape, &self.config.login_slugs);

        debug!(
            "Surveyed {}: {} ({} headings, {:?})",
            page_url,
            html_version,
            heading_count.total(),
            shape
        );

        Ok(PageSurvey {
            url: page_url.to_string(),
            html_version,
            page_title,
            heading_count,
            links,
            page_contains_login_form,
        })
    }

    pub async fn verify(&self, survey: PageSurvey) -> AnalysisResult {
        let report = self.prober.probe(&survey.links.external).await;

        AnalysisResult {
            url: survey.url,
            html_version: survey.html_version,
            page_title: survey.page_title,
            heading_count: survey.heading_count,
            links: Links {
                internal: survey.links.internal.into(),
                external: survey.links.external.into(),
                failed: report.failed.into(),
            },
            page_contains_login_form: survey.page_contains_login_form,
            dropped_links: survey.links.dropped,
        }
    }

    /// Analyze an already parsed document.
    ///
    /// The returned future borrows the document and is not `Send`.
    pub async fn analyze(
        &self,
        page_url: &str,
        document: &PageDocument,
    ) -> Result<AnalysisResult, AnalysisError> {
        let survey = self.survey(page_url, document)?;
        Ok(self.verify(survey).await)
    }

    /// Fetch, parse and analyze a page.
    pub async fn analyze_url(&self, page_url: &str) -> Result<AnalysisResult, AnalysisError> {
        info!("Analyzing {}", page_url);

        let page = fetch_page(&self.client, page_url)
            .await
            .map_err(AnalysisError::Unreachable)?;

        let survey = {
            let document = PageDocument::from_fetched(page);
            self.survey(page_url, &document)?
        };

        let result = self.verify(survey).await;

        info!(
            "Analysis of {} complete: {} internal, {} external, {} failed",
            page_url,
            result.links.internal.count,
            result.links.external.count,
            result.links.failed.count
        );

        Ok(result)
    }
}

/// Options for a single analysis run
pub struct AnalyzeOptions {
    pub url: String,
    pub config: AnalyzerConfig,
    pub show_progress_bars: bool,
}

/// Callback for reporting analysis progress
pub type AnalysisProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Execute an analysis with the given options
pub async fn execute_analysis(
    options: AnalyzeOptions,
    progress_callback: Option<AnalysisProgressCallback>,
) -> Result<AnalysisResult, AnalysisError> {
    let AnalyzeOptions {
        url,
        config,
        show_progress_bars,
    } = options;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Fetching {}...", url));
        Some(Arc::new(pb))
    } else {
        None
    };

    let probed_count = Arc::new(AtomicUsize::new(0));
    let failed_count = Arc::new(AtomicUsize::new(0));

    let probe_callback: ProbeCallback = {
        let pb_clone = progress_bar.clone();
        let probed_clone = probed_count.clone();
        let failed_clone = failed_count.clone();
        let progress_clone = progress_callback.clone();
        Arc::new(move |probed_url: String, outcome: ProbeOutcome| {
            let probed = probed_clone.fetch_add(1, Ordering::Relaxed) + 1;
            if !outcome.is_reachable() {
                failed_clone.fetch_add(1, Ordering::Relaxed);
                if let Some(ref callback) = progress_clone {
                    callback(format!("[!] {} failed: {:?}", probed_url, outcome));
                }
            }
            if let Some(ref pb) = pb_clone {
                pb.set_message(format!("Probing external links... {} checked", probed));
                pb.tick();
            }
        })
    };

    let analyzer = PageAnalyzer::new(Arc::new(config))?.with_probe_callback(probe_callback);

    if let Some(ref callback) = progress_callback {
        callback(format!("Analyzing {}", url));
    }

    let result = analyzer.analyze_url(&url).await;

    if let Some(ref pb) = progress_bar {
        match &result {
            Ok(_) => pb.finish_with_message(format!(
                "Analysis complete! {} links probed, {} failed",
                probed_count.load(Ordering::Relaxed),
                failed_count.load(Ordering::Relaxed)
            )),
            Err(_) => pb.finish_and_clear(),
        }
    }

    result
}
