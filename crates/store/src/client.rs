//! REST client for the record store, and the [`RecordStore`] trait the
//! pipeline consumes.
//!
//! Wire shape is the Airtable convention: `GET /{base}/{table}` with
//! `view` / `filterByFormula` / `maxRecords` query parameters returning
//! `{ "records": [...], "offset"? }` pages, `POST` with `{ "fields": … }`,
//! and `PATCH /{record_id}` for sparse updates. Every request passes
//! through the adapter's [`RequestPacer`] first.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use atelier_core::idea::{IdeaPatch, NewIdea, PromptIdea};
use atelier_core::reward::RewardWeights;
use atelier_core::settings::{BatchSettings, SettingsPatch};
use atelier_core::structure::{NewStructure, PromptStructure};

use crate::error::StoreError;
use crate::mapping;
use crate::pacer::RequestPacer;
use crate::schema::StoreSchema;

/// HTTP timeout for a single store request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One raw record as returned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(rename = "createdTime")]
    pub created_time: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// One page of a list response.
#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    records: Vec<Record>,
    offset: Option<String>,
}

/// Query parameters for a list request.
#[derive(Debug, Default)]
struct ListQuery {
    view: Option<String>,
    filter: Option<String>,
    max_records: Option<u32>,
}

/// The named store-side views over the Structures table. View semantics
/// (usage thresholds and the like) are defined store-side and opaque
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureView {
    All,
    TopPerformers,
    Underexplored,
}

// ---------------------------------------------------------------------------
// RecordStore trait
// ---------------------------------------------------------------------------

/// Typed read/write contract over the three collections.
///
/// The pipeline depends on this trait rather than the concrete client so
/// orchestration and lifecycle logic can be tested against in-memory
/// fakes.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List ideas from a store-side view.
    async fn list_ideas(&self, view: &str) -> Result<Vec<PromptIdea>, StoreError>;

    /// Fetch a single idea by storage record id.
    async fn fetch_idea(&self, record_id: &str) -> Result<PromptIdea, StoreError>;

    /// Create a new idea record with status Proposed.
    async fn create_idea(&self, new: &NewIdea) -> Result<PromptIdea, StoreError>;

    /// Apply a sparse update to an idea record.
    async fn update_idea(&self, record_id: &str, patch: &IdeaPatch)
        -> Result<PromptIdea, StoreError>;

    /// List structures from a named view, each decorated with its
    /// computed reward score.
    async fn list_structures(&self, view: StructureView)
        -> Result<Vec<PromptStructure>, StoreError>;

    /// Create a new structure record.
    async fn create_structure(&self, new: &NewStructure)
        -> Result<PromptStructure, StoreError>;

    /// Resolve a human-facing structure sequence id to its storage
    /// record id.
    async fn structure_record_id(&self, structure_id: i64) -> Result<String, StoreError>;

    /// Fetch the singleton settings record.
    async fn fetch_settings(&self) -> Result<BatchSettings, StoreError>;

    /// Apply a sparse update to the settings record.
    async fn update_settings(
        &self,
        record_id: &str,
        patch: &SettingsPatch,
    ) -> Result<BatchSettings, StoreError>;
}

// ---------------------------------------------------------------------------
// RecordStoreClient
// ---------------------------------------------------------------------------

/// reqwest-backed implementation of [`RecordStore`].
pub struct RecordStoreClient {
    http: reqwest::Client,
    schema: Arc<StoreSchema>,
    pacer: Arc<RequestPacer>,
    weights: RewardWeights,
}

impl RecordStoreClient {
    /// Create a client with the default request pacing.
    pub fn new(schema: StoreSchema, weights: RewardWeights) -> Self {
        Self::with_pacer(schema, weights, Arc::new(RequestPacer::default()))
    }

    /// Create a client sharing an explicit pacer. Multiple clients
    /// holding the same pacer share one request budget.
    pub fn with_pacer(
        schema: StoreSchema,
        weights: RewardWeights,
        pacer: Arc<RequestPacer>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            http,
            schema: Arc::new(schema),
            pacer,
            weights,
        }
    }

    /// The configured schema (used by the API layer for view names).
    pub fn schema(&self) -> &StoreSchema {
        &self.schema
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.schema.api_base, self.schema.base_id, table)
    }

    /// List records, following `offset` pagination to exhaustion.
    async fn list(&self, table: &str, query: ListQuery) -> Result<Vec<Record>, StoreError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            self.pacer.acquire().await;

            let mut params: Vec<(&str, String)> = Vec::new();
            if let Some(view) = &query.view {
                params.push(("view", view.clone()));
            }
            if let Some(filter) = &query.filter {
                params.push(("filterByFormula", filter.clone()));
            }
            if let Some(max) = query.max_records {
                params.push(("maxRecords", max.to_string()));
            }
            if let Some(cursor) = &offset {
                params.push(("offset", cursor.clone()));
            }

            let response = self
                .http
                .get(self.table_url(table))
                .bearer_auth(&self.schema.api_key)
                .query(&params)
                .send()
                .await?;

            let page: RecordPage = Self::decode(response).await?;
            records.extend(page.records);

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(records)
    }

    async fn create(&self, table: &str, fields: Map<String, Value>) -> Result<Record, StoreError> {
        self.pacer.acquire().await;
        let response = self
            .http
            .post(self.table_url(table))
            .bearer_auth(&self.schema.api_key)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn patch_record(
        &self,
        table: &str,
        entity: &'static str,
        record_id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        self.pacer.acquire().await;
        let response = self
            .http
            .patch(format!("{}/{record_id}", self.table_url(table)))
            .bearer_auth(&self.schema.api_key)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        // The record can vanish between a read and this write.
        if response.status().as_u16() == 404 {
            return Err(StoreError::NotFound {
                entity,
                id: record_id.to_string(),
            });
        }
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Response {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for RecordStoreClient {
    async fn list_ideas(&self, view: &str) -> Result<Vec<PromptIdea>, StoreError> {
        let records = self
            .list(
                &self.schema.ideas_table,
                ListQuery {
                    view: Some(view.to_string()),
                    ..ListQuery::default()
                },
            )
            .await?;
        Ok(records
            .iter()
            .map(|r| mapping::decode_idea(r, &self.schema))
            .collect())
    }

    async fn fetch_idea(&self, record_id: &str) -> Result<PromptIdea, StoreError> {
        self.pacer.acquire().await;
        let response = self
            .http
            .get(format!("{}/{record_id}", self.table_url(&self.schema.ideas_table)))
            .bearer_auth(&self.schema.api_key)
            .send()
            .await?;
        if response.status().as_u16() == 404 {
            return Err(StoreError::NotFound {
                entity: "Idea",
                id: record_id.to_string(),
            });
        }
        let record: Record = Self::decode(response).await?;
        Ok(mapping::decode_idea(&record, &self.schema))
    }

    async fn create_idea(&self, new: &NewIdea) -> Result<PromptIdea, StoreError> {
        let fields = mapping::encode_new_idea(new, &self.schema);
        let record = self.create(&self.schema.ideas_table, fields).await?;
        Ok(mapping::decode_idea(&record, &self.schema))
    }

    async fn update_idea(
        &self,
        record_id: &str,
        patch: &IdeaPatch,
    ) -> Result<PromptIdea, StoreError> {
        // A structure link in the patch arrives as a sequence id; resolve
        // it to a storage record id before encoding.
        let structure_record_id = match patch.structure_id {
            Some(seq) => Some(self.structure_record_id(seq).await?),
            None => None,
        };
        let fields =
            mapping::encode_idea_patch(patch, &self.schema, structure_record_id.as_deref());
        let record = self
            .patch_record(&self.schema.ideas_table, "Idea", record_id, fields)
            .await?;
        Ok(mapping::decode_idea(&record, &self.schema))
    }

    async fn list_structures(
        &self,
        view: StructureView,
    ) -> Result<Vec<PromptStructure>, StoreError> {
        let view_name = match view {
            StructureView::All => &self.schema.view_structures_all,
            StructureView::TopPerformers => &self.schema.view_top_performers,
            StructureView::Underexplored => &self.schema.view_underexplored,
        };
        let records = self
            .list(
                &self.schema.structures_table,
                ListQuery {
                    view: Some(view_name.clone()),
                    ..ListQuery::default()
                },
            )
            .await?;
        Ok(records
            .iter()
            .map(|r| mapping::decode_structure(r, &self.schema, &self.weights))
            .collect())
    }

    async fn create_structure(&self, new: &NewStructure) -> Result<PromptStructure, StoreError> {
        let fields = mapping::encode_new_structure(new, &self.schema);
        let record = self
            .create(&self.schema.structures_table, fields)
            .await?;
        Ok(mapping::decode_structure(&record, &self.schema, &self.weights))
    }

    async fn structure_record_id(&self, structure_id: i64) -> Result<String, StoreError> {
        let filter = format!("{{{}}} = {structure_id}", self.schema.structure.structure_id);
        let records = self
            .list(
                &self.schema.structures_table,
                ListQuery {
                    filter: Some(filter),
                    max_records: Some(1),
                    ..ListQuery::default()
                },
            )
            .await?;
        records
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or(StoreError::NotFound {
                entity: "Structure",
                id: structure_id.to_string(),
            })
    }

    async fn fetch_settings(&self) -> Result<BatchSettings, StoreError> {
        let records = self
            .list(
                &self.schema.settings_table,
                ListQuery {
                    view: Some(self.schema.view_settings_main.clone()),
                    max_records: Some(1),
                    ..ListQuery::default()
                },
            )
            .await?;
        records
            .first()
            .map(|r| mapping::decode_settings(r, &self.schema))
            .ok_or(StoreError::MissingSettings)
    }

    async fn update_settings(
        &self,
        record_id: &str,
        patch: &SettingsPatch,
    ) -> Result<BatchSettings, StoreError> {
        let fields = mapping::encode_settings_patch(patch, &self.schema);
        let record = self
            .patch_record(&self.schema.settings_table, "Settings", record_id, fields)
            .await?;
        Ok(mapping::decode_settings(&record, &self.schema))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::test_support::schema;
    use assert_matches::assert_matches;
    use mockito::Matcher;

    fn client(server: &mockito::ServerGuard) -> RecordStoreClient {
        RecordStoreClient::with_pacer(
            schema(&server.url()),
            RewardWeights::default(),
            Arc::new(RequestPacer::new(Duration::ZERO)),
        )
    }

    #[tokio::test]
    async fn list_structures_decodes_and_decorates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/appTest/Structures")
            .match_query(Matcher::UrlEncoded("view".into(), "viwTop".into()))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "records": [{
                        "id": "recS1",
                        "createdTime": "2025-01-01T00:00:00.000Z",
                        "fields": {
                            "Structure ID": 1,
                            "Skeleton": "[Brand]::5",
                            "Renderer": "Recraft",
                            "Status": "Active",
                            "AI Score": 8,
                            "Outlier Count": 2,
                            "Age Weeks": 1
                        }
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let structures = client(&server)
            .list_structures(StructureView::TopPerformers)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(structures.len(), 1);
        let expected = 0.6 * 8.0 + 0.3 * 2.0 + -0.1 * 1.0;
        assert!((structures[0].reward_score.unwrap() - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn list_follows_offset_pagination() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/appTest/Ideas")
            .match_query(Matcher::UrlEncoded("view".into(), "viwAll".into()))
            .with_body(
                serde_json::json!({
                    "records": [{ "id": "rec1", "fields": {} }],
                    "offset": "cursor1"
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/appTest/Ideas")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("view".into(), "viwAll".into()),
                Matcher::UrlEncoded("offset".into(), "cursor1".into()),
            ]))
            .with_body(
                serde_json::json!({ "records": [{ "id": "rec2", "fields": {} }] }).to_string(),
            )
            .create_async()
            .await;

        let ideas = client(&server).list_ideas("viwAll").await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].record_id, "rec1");
        assert_eq!(ideas[1].record_id, "rec2");
    }

    #[tokio::test]
    async fn structure_record_id_resolves_via_filter() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/appTest/Structures")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("filterByFormula".into(), "{Structure ID} = 7".into()),
                Matcher::UrlEncoded("maxRecords".into(), "1".into()),
            ]))
            .with_body(
                serde_json::json!({ "records": [{ "id": "recS7", "fields": {} }] }).to_string(),
            )
            .create_async()
            .await;

        let id = client(&server).structure_record_id(7).await.unwrap();
        assert_eq!(id, "recS7");
    }

    #[tokio::test]
    async fn missing_structure_sequence_id_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/appTest/Structures")
            .match_query(Matcher::Any)
            .with_body(serde_json::json!({ "records": [] }).to_string())
            .create_async()
            .await;

        let err = client(&server).structure_record_id(99).await.unwrap_err();
        assert_matches!(err, StoreError::NotFound { entity: "Structure", id } => {
            assert_eq!(id, "99");
        });
    }

    #[tokio::test]
    async fn empty_settings_view_is_missing_settings() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/appTest/Settings")
            .match_query(Matcher::Any)
            .with_body(serde_json::json!({ "records": [] }).to_string())
            .create_async()
            .await;

        let err = client(&server).fetch_settings().await.unwrap_err();
        assert_matches!(err, StoreError::MissingSettings);
    }

    #[tokio::test]
    async fn non_success_status_is_a_response_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/appTest/Settings")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let err = client(&server).fetch_settings().await.unwrap_err();
        assert_matches!(err, StoreError::Response { status: 503, message } => {
            assert!(message.contains("unavailable"));
        });
    }

    #[tokio::test]
    async fn update_idea_resolves_structure_link_before_patching() {
        let mut server = mockito::Server::new_async().await;
        let lookup = server
            .mock("GET", "/appTest/Structures")
            .match_query(Matcher::Any)
            .with_body(
                serde_json::json!({ "records": [{ "id": "recS7", "fields": {} }] }).to_string(),
            )
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", "/appTest/Ideas/recIdea1")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "fields": { "Status": "Approved", "Structure": ["recS7"] }
            })))
            .with_body(
                serde_json::json!({
                    "id": "recIdea1",
                    "fields": { "Status": "Approved", "Structure": ["recS7"] }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let updated = client(&server)
            .update_idea(
                "recIdea1",
                &IdeaPatch {
                    status: Some(atelier_core::status::IdeaStatus::Approved),
                    structure_id: Some(7),
                    ..IdeaPatch::default()
                },
            )
            .await
            .unwrap();

        lookup.assert_async().await;
        patch.assert_async().await;
        assert_eq!(updated.structure_record_id.as_deref(), Some("recS7"));
    }

    #[tokio::test]
    async fn fetch_idea_maps_404_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/appTest/Ideas/recGone")
            .with_status(404)
            .with_body(serde_json::json!({ "error": "NOT_FOUND" }).to_string())
            .create_async()
            .await;

        let err = client(&server).fetch_idea("recGone").await.unwrap_err();
        assert_matches!(err, StoreError::NotFound { entity: "Idea", id } => {
            assert_eq!(id, "recGone");
        });
    }

    #[tokio::test]
    async fn update_idea_maps_404_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PATCH", "/appTest/Ideas/recGone")
            .with_status(404)
            .with_body(serde_json::json!({ "error": "NOT_FOUND" }).to_string())
            .create_async()
            .await;

        let err = client(&server)
            .update_idea(
                "recGone",
                &IdeaPatch {
                    rating: Some(4),
                    ..IdeaPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::NotFound { entity: "Idea", id } => {
            assert_eq!(id, "recGone");
        });
    }

    #[tokio::test]
    async fn create_idea_posts_fields_and_decodes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/appTest/Ideas")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "fields": { "Skeleton": "[X]::5", "Status": "Proposed" }
            })))
            .with_body(
                serde_json::json!({
                    "id": "recNew",
                    "createdTime": "2025-06-01T00:00:00.000Z",
                    "fields": { "Idea ID": 12, "Skeleton": "[X]::5", "Status": "Proposed" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let idea = client(&server)
            .create_idea(&NewIdea {
                skeleton: "[X]::5".into(),
                renderer: "Recraft".into(),
                proposed_by: "AI System".into(),
                parent_record_id: None,
                reward_estimate: None,
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(idea.record_id, "recNew");
        assert_eq!(idea.idea_id, 12);
    }
}
