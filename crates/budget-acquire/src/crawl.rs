use crate::error::{AcquireError, Result};
use crate::net::Fetch;
use crate::{extract, options, output, repair};
use budget_model::{BudgetRecord, DataType, Municipality, RecordKey, Region};
use std::path::PathBuf;
use std::time::Duration;

/// Everything the crawl needs to know about the source site and where to
/// put results.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Budget page URL with a `{type}` placeholder for the data type slug.
    pub budget_url: String,
    /// Municipality listing URL with an `{region}` placeholder.
    pub municipality_url: String,
    pub user_agent: String,
    pub accept_language: String,
    /// Value of the `ok` form field; the site only answers when it is set.
    pub auth_trigger: String,
    pub output_dir: PathBuf,
    /// Stop after this many region × municipality pairs.
    pub max_pairs: usize,
    pub timeout: Duration,
    /// Also keep the repaired HTML of every budget page.
    pub cache_html: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            budget_url:
                "http://www.finances.gov.tn/applications/budget_collectivites/afficher_{type}.php"
                    .to_string(),
            municipality_url:
                "http://www.finances.gov.tn/applications/budget_collectivites/municipalite.php?idr={region}"
                    .to_string(),
            user_agent: "OpenGovTn (http://opengovtn.org/)".to_string(),
            accept_language: "en".to_string(),
            auth_trigger: "المصادقة".to_string(),
            output_dir: PathBuf::from("json"),
            max_pairs: 1,
            timeout: Duration::from_secs(30),
            cache_html: false,
        }
    }
}

impl CrawlConfig {
    pub fn budget_url(&self, data_type: DataType) -> String {
        self.budget_url.replace("{type}", data_type.slug())
    }

    /// The region list is the `<select>` on the revenue page.
    pub fn regions_url(&self) -> String {
        self.budget_url(DataType::Revenue)
    }

    pub fn municipality_url(&self, region_id: u32) -> String {
        self.municipality_url.replace("{region}", &region_id.to_string())
    }
}

/// Outcome of a crawl run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pairs: usize,
    pub records: usize,
    /// True when the run stopped because `max_pairs` was reached.
    pub halted_by_limit: bool,
}

/// Walks regions → municipalities → data types, one request at a time.
pub struct Crawler<F> {
    fetcher: F,
    config: CrawlConfig,
}

impl<F: Fetch> Crawler<F> {
    pub fn new(fetcher: F, config: CrawlConfig) -> Result<Self> {
        if config.max_pairs == 0 {
            return Err(AcquireError::Config("max_pairs must be at least 1".into()));
        }
        Ok(Self { fetcher, config })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Run the crawl until every pair is done or `max_pairs` is reached.
    ///
    /// The first error aborts the run. Records written before the error
    /// stay on disk.
    pub async fn run(&self) -> Result<CrawlSummary> {
        tracing::info!("Getting regions");
        let regions = self.regions().await?;
        tracing::info!(count = regions.len(), "Got regions");

        let mut summary = CrawlSummary::default();

        for region in &regions {
            tracing::info!(region = region.id, label = %region.label, "Getting municipalities");
            let municipalities = self.municipalities(region).await?;
            tracing::info!(region = region.id, count = municipalities.len(), "Got municipalities");

            for municipality in &municipalities {
                tracing::info!(
                    region = region.id,
                    municipality = municipality.id,
                    label = %municipality.label,
                    "Getting budget data"
                );
                for data_type in DataType::ALL {
                    let record = self.budget(region, municipality, data_type).await?;
                    output::write_record(&record, &self.config.output_dir)?;
                    summary.records += 1;
                }
                summary.pairs += 1;

                // No further request of any kind once the limit is met.
                if summary.pairs >= self.config.max_pairs {
                    tracing::warn!(
                        max_pairs = self.config.max_pairs,
                        "Pair limit reached, stopping so the source site is not overloaded"
                    );
                    summary.halted_by_limit = true;
                    return Ok(summary);
                }
            }
        }

        tracing::info!(pairs = summary.pairs, records = summary.records, "Crawl finished");
        Ok(summary)
    }

    /// Discover all regions, in the order the site lists them.
    pub async fn regions(&self) -> Result<Vec<Region>> {
        let url = self.config.regions_url();
        let listed = self.discover(&url).await?;
        if listed.is_empty() {
            return Err(AcquireError::DiscoveryEmpty(format!("no regions at {url}")));
        }
        Ok(listed
            .into_iter()
            .map(|(id, label)| Region { id, label })
            .collect())
    }

    /// Discover the municipalities of one region, in listing order.
    pub async fn municipalities(&self, region: &Region) -> Result<Vec<Municipality>> {
        let url = self.config.municipality_url(region.id);
        let listed = self.discover(&url).await?;
        if listed.is_empty() {
            return Err(AcquireError::DiscoveryEmpty(format!(
                "no municipalities for region {} ({})",
                region.id, region.label
            )));
        }
        Ok(listed
            .into_iter()
            .map(|(id, label)| Municipality { id, label })
            .collect())
    }

    /// Fetch, repair, and extract one budget page.
    ///
    /// With `cache_html` set, the repaired page is kept before extraction so
    /// pages that fail to extract can still be inspected.
    pub async fn budget(
        &self,
        region: &Region,
        municipality: &Municipality,
        data_type: DataType,
    ) -> Result<BudgetRecord> {
        let url = self.config.budget_url(data_type);
        let fields = [
            ("region", region.id.to_string()),
            ("municipalite", municipality.id.to_string()),
            ("ok", self.config.auth_trigger.clone()),
        ];

        let raw = self.fetcher.post_form(&url, &fields).await?;
        let html = repair::repair(&raw)?;

        if self.config.cache_html {
            let key = RecordKey {
                region_id: region.id,
                municipality_id: municipality.id,
                data_type,
            };
            output::cache_html(&self.config.output_dir, &key, &html)?;
        }

        extract::extract(&html, region, municipality, data_type)
    }

    async fn discover(&self, url: &str) -> Result<Vec<(u32, String)>> {
        let raw = self.fetcher.get(url).await?;
        let html = repair::repair(&raw)?;
        Ok(options::parse_options(&html))
    }
}
