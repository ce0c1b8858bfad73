//! Migration Orchestrator
//!
//! Drives one migration through the state machine
//! (see [`crate::models::MigrationState`]):
//!
//! 1. FETCHING: scraping service call (fatal on failure)
//! 2. ADAPTING: source adapter, Generic on parse failure (fatal only when blocked)
//! 3. MAPPING: field mapping and normalization (never fails)
//! 4. SCORING: fallback resolution and completeness score
//! 5. IMAGE_PIPELINE: image re-hosting (failures counted, never fatal)
//!
//! One wall-clock deadline covers the whole run. Expiry during FETCHING fails
//! the run; expiry later cancels outstanding image work and returns the
//! partial record with `timedOut` set.
//!
//! The orchestrator holds only read-only shared components, so concurrent
//! migrations share no mutable state.

use harbor_common::yacht::{CanonicalField, CanonicalValue};
use harbor_common::{Error, FieldProvenance, MigrationMetadata, MigrationResult, Provenance};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::adapters::AdapterRegistry;
use crate::classifier::{parse_listing_url, SourceClassifier};
use crate::config::MigratorConfig;
use crate::fallback::FallbackResolver;
use crate::images::{ImagePipeline, ImagePipelineReport, ImageStorage};
use crate::knowledge_base::{ModelKnowledgeBase, StaticKnowledgeBase};
use crate::mapping::FieldMapper;
use crate::models::{MigrationRun, MigrationState};
use crate::record::DraftRecord;
use crate::scoring;
use crate::services::image_storage::HttpImageStorage;
use crate::services::scraper_client::{HttpScrapingService, ScrapingService};
use crate::types::{FetchError, MigrationError};

pub struct MigrationOrchestrator {
    classifier: SourceClassifier,
    adapters: AdapterRegistry,
    mapper: FieldMapper,
    resolver: FallbackResolver,
    scraper: Arc<dyn ScrapingService>,
    images: ImagePipeline,
    deadline: Duration,
}

impl MigrationOrchestrator {
    /// Assemble an orchestrator from its collaborators
    pub fn new(
        scraper: Arc<dyn ScrapingService>,
        storage: Arc<dyn ImageStorage>,
        knowledge_base: Arc<dyn ModelKnowledgeBase>,
        image_client: Client,
        config: &MigratorConfig,
    ) -> Self {
        Self {
            classifier: SourceClassifier::default(),
            adapters: AdapterRegistry::default(),
            mapper: FieldMapper::default(),
            resolver: FallbackResolver::new(knowledge_base),
            scraper,
            images: ImagePipeline::new(image_client, storage, config.images.clone()),
            deadline: config.deadline(),
        }
    }

    /// Orchestrator talking to the configured HTTP collaborators
    ///
    /// # Errors
    /// `Config` when the knowledge base file is malformed, `Internal` when an
    /// HTTP client cannot be built.
    pub fn from_config(config: &MigratorConfig) -> harbor_common::Result<Self> {
        let knowledge_base = StaticKnowledgeBase::load(config.knowledge_base_path.as_deref())?;
        info!("Model knowledge base: {} records", knowledge_base.len());

        let scraper = HttpScrapingService::new(&config.scraper_url, config.deadline())
            .map_err(|e| Error::Internal(e.to_string()))?;

        let image_client = Client::builder()
            .user_agent(concat!("harbor-migrate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Internal(format!("HTTP client: {}", e)))?;
        let storage = HttpImageStorage::new(image_client.clone(), &config.storage_url);

        Ok(Self::new(
            Arc::new(scraper),
            Arc::new(storage),
            Arc::new(knowledge_base),
            image_client,
            config,
        ))
    }

    /// Replace the run deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Migrate one listing URL
    ///
    /// # Errors
    /// * `MigrationError::Input` - URL blank or invalid (no stage runs)
    /// * `MigrationError::Fetch` - source unreachable, blocked or timed out
    /// * `MigrationError::Internal` - pipeline invariant broken
    pub async fn migrate(&self, raw_url: &str) -> Result<MigrationResult, MigrationError> {
        let url = parse_listing_url(raw_url)?;
        self.migrate_listing(&url).await
    }

    /// Migrate an already validated listing URL
    ///
    /// # Errors
    /// * `MigrationError::Fetch` - source unreachable, blocked or timed out
    /// * `MigrationError::Internal` - pipeline invariant broken
    pub async fn migrate_listing(&self, url: &Url) -> Result<MigrationResult, MigrationError> {
        let url = url.as_str();

        let deadline = Instant::now() + self.deadline;
        let mut run = MigrationRun::new(url);
        let mut metadata = MigrationMetadata::started(run.migration_id, url);
        let migration_id = run.migration_id;

        let source = self.classifier.classify(url);
        metadata.source = source.as_str().to_string();
        info!(migration_id = %migration_id, url = %url, source = %source, "Migration started");

        // FETCHING
        run.transition_to(MigrationState::Fetching);
        let fetched = match tokio::time::timeout_at(deadline, self.scraper.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.deadline.as_secs())),
        };
        let content = match fetched {
            Ok(content) => content,
            Err(e) => return Err(self.fail(&mut run, e.into())),
        };
        debug!(migration_id = %migration_id, kind = content.kind(), "Source content fetched");

        // ADAPTING
        run.transition_to(MigrationState::Adapting);
        let outcome = match self.adapters.extract(source, url, &content) {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(&mut run, e.into())),
        };
        metadata.adapter = outcome.adapter.as_str().to_string();
        metadata.warnings.extend(outcome.warnings);
        info!(
            migration_id = %migration_id,
            adapter = %outcome.adapter,
            raw_fields = outcome.record.raw_fields.len(),
            "Raw fields extracted"
        );

        // MAPPING
        run.transition_to(MigrationState::Mapping);
        let report = self.mapper.map(&outcome.record);
        let mut draft = report.draft;
        metadata.warnings.extend(report.warnings);
        debug!(
            migration_id = %migration_id,
            missing_required = report.missing_required.len(),
            "Fields mapped"
        );

        // SCORING
        run.transition_to(MigrationState::Scoring);
        let fallback = self.resolver.resolve(&mut draft);
        metadata.warnings.extend(fallback.warnings);
        let completeness = scoring::completeness(&draft);
        info!(
            migration_id = %migration_id,
            completeness,
            from_model_db = fallback.from_model_db.len(),
            defaulted = fallback.defaulted.len(),
            "Record scored"
        );

        // IMAGE_PIPELINE
        let references: Vec<String> = draft
            .value(CanonicalField::Images)
            .and_then(CanonicalValue::as_list)
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        if references.is_empty() {
            debug!(migration_id = %migration_id, "Listing has no images");
        } else if Instant::now() >= deadline {
            warn!(migration_id = %migration_id, "Deadline reached before image migration");
            metadata.timed_out = true;
            metadata.images_found = references.len();
            metadata.images_skipped = references.len();
            draft.set(
                CanonicalField::Images,
                CanonicalValue::List(Vec::new()),
                draft_provenance(&draft),
            );
        } else {
            run.transition_to(MigrationState::ImagePipeline);
            let (images, timed_out) = self.run_images(&references, url, deadline).await;
            if timed_out {
                warn!(migration_id = %migration_id, "Deadline reached during image migration");
            }
            metadata.timed_out = timed_out;
            metadata.images_found = images.found;
            metadata.images_migrated = images.migrated;
            metadata.images_failed = images.failed;
            metadata.images_skipped = images.skipped;
            metadata.warnings.extend(images.failures);
            draft.set(
                CanonicalField::Images,
                CanonicalValue::List(images.images),
                draft_provenance(&draft),
            );
        }

        // DONE
        let yacht = match draft.assemble(completeness) {
            Ok(yacht) => yacht,
            Err(field) => {
                let e = MigrationError::Internal(format!(
                    "required field '{}' has no value after fallback",
                    field
                ));
                return Err(self.fail(&mut run, e));
            }
        };

        run.transition_to(MigrationState::Done);
        metadata.listing_type = Some(yacht.listing_type.clone());
        metadata.data_completeness_percent = completeness;
        metadata.provenance = draft.provenance();
        metadata.states = run.history_names();
        metadata.finished_at = chrono::Utc::now();

        info!(
            migration_id = %migration_id,
            completeness,
            images_migrated = metadata.images_migrated,
            images_failed = metadata.images_failed,
            timed_out = metadata.timed_out,
            "Migration complete"
        );

        Ok(MigrationResult::completed(yacht, metadata))
    }

    /// Run the image pipeline, cancelling it at the deadline
    ///
    /// Returns the report and whether the deadline cut it short.
    async fn run_images(
        &self,
        references: &[String],
        listing_url: &str,
        deadline: Instant,
    ) -> (ImagePipelineReport, bool) {
        let cancel = CancellationToken::new();
        let pipeline = self.images.run(references, listing_url, &cancel);
        tokio::pin!(pipeline);

        tokio::select! {
            report = &mut pipeline => (report, false),
            _ = tokio::time::sleep_until(deadline) => {
                cancel.cancel();
                // Cancelled work finishes promptly; collect what completed
                (pipeline.await, true)
            }
        }
    }

    fn fail(&self, run: &mut MigrationRun, e: MigrationError) -> MigrationError {
        error!(
            migration_id = %run.migration_id,
            state = %run.state,
            error = %e,
            "Migration failed"
        );
        run.transition_to(MigrationState::Failed);
        e
    }
}

/// Provenance of the images field as mapped (kept when URLs are replaced)
fn draft_provenance(draft: &DraftRecord) -> FieldProvenance {
    draft
        .get(CanonicalField::Images)
        .map(|s| s.provenance)
        .unwrap_or_else(|| FieldProvenance::new(Provenance::Scraped, 0.0))
}
