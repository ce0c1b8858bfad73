//! Migration endpoint
//!
//! POST /migrate with a form-encoded `url`. The URL is validated here, so
//! blank or malformed input never reaches the orchestrator.

use axum::{extract::State, routing::post, Form, Json, Router};
use chrono::{DateTime, Utc};
use harbor_common::{FieldProvenance, MigrationResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::form_fields::FormFields;
use crate::classifier::parse_listing_url;
use crate::error::{ApiError, ApiResult};
use crate::types::MigrationError;
use crate::AppState;

/// POST /migrate form body
#[derive(Debug, Default, Deserialize)]
pub struct MigrateForm {
    #[serde(default)]
    pub url: Option<String>,
}

/// POST /migrate response
#[derive(Debug, Serialize)]
pub struct MigrateResponse {
    /// Canonical record, field names as the listing form expects them
    pub data: FormFields,
    pub metadata: MigrateMetadata,
}

#[derive(Debug, Serialize)]
pub struct MigrateMetadata {
    pub source: String,
    pub listing_type: Option<String>,
    pub data_completeness: u8,
    pub images_found: usize,
    pub images_migrated: usize,
    pub images_failed: usize,
    pub images_skipped: usize,
    pub timed_out: bool,
    pub migration_id: Uuid,
    pub source_url: String,
    pub adapter: String,
    pub warnings: Vec<String>,
    pub provenance: BTreeMap<String, FieldProvenance>,
    pub states: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl MigrateResponse {
    fn from_result(result: MigrationResult) -> ApiResult<Self> {
        let data = result
            .canonical_record
            .ok_or_else(|| ApiError::Internal("migration produced no record".to_string()))?;
        let m = result.metadata;
        Ok(Self {
            data: FormFields::from(data),
            metadata: MigrateMetadata {
                source: m.source,
                listing_type: m.listing_type,
                data_completeness: m.data_completeness_percent,
                images_found: m.images_found,
                images_migrated: m.images_migrated,
                images_failed: m.images_failed,
                images_skipped: m.images_skipped,
                timed_out: m.timed_out,
                migration_id: m.migration_id,
                source_url: m.source_url,
                adapter: m.adapter,
                warnings: m.warnings,
                provenance: m.provenance,
                states: m.states,
                started_at: m.started_at,
                finished_at: m.finished_at,
            },
        })
    }
}

/// POST /migrate
///
/// 200 with the canonical record, 400 for a missing or invalid URL, 500 when
/// the source cannot be fetched or the pipeline breaks.
pub async fn migrate(
    State(state): State<AppState>,
    form: Option<Form<MigrateForm>>,
) -> ApiResult<Json<MigrateResponse>> {
    let raw = form.and_then(|Form(f)| f.url).unwrap_or_default();
    let url = parse_listing_url(&raw).map_err(MigrationError::from)?;

    match state.orchestrator.migrate_listing(&url).await {
        Ok(result) => Ok(Json(MigrateResponse::from_result(result)?)),
        Err(e) => {
            *state.last_error.write().await = Some(e.to_string());
            Err(e.into())
        }
    }
}

pub fn migrate_routes() -> Router<AppState> {
    Router::new().route("/migrate", post(migrate))
}
