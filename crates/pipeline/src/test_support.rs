//! In-memory fakes shared by the pipeline unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use atelier_core::idea::{IdeaPatch, NewIdea, PromptIdea};
use atelier_core::reward::RewardWeights;
use atelier_core::settings::{BatchSettings, SettingsPatch, DEFAULT_BATCH_SIZE};
use atelier_core::status::{IdeaStatus, StructureStatus};
use atelier_core::structure::{NewStructure, PromptStructure};
use atelier_llm::{ChatClient, ChatRequest, LlmError};
use atelier_store::{RecordStore, StoreError, StructureView};

/// Build an Active structure with the given metrics, decorated with the
/// default-weight reward score the way the real client decorates reads.
pub fn structure(id: i64, ai_score: f64, outlier_count: f64, age_weeks: f64) -> PromptStructure {
    let mut s = PromptStructure {
        record_id: format!("recStruct{id}"),
        structure_id: id,
        skeleton: format!("[Structure {id}]::5"),
        renderer: "Recraft".into(),
        status: StructureStatus::Active,
        outlier_count,
        usage_count: 0.0,
        age_weeks,
        z_score: 0.0,
        ai_score,
        ai_critique: None,
        trend: None,
        model_used: None,
        system_prompt: None,
        date_created: Utc::now(),
        reward_score: None,
    };
    s.reward_score = Some(RewardWeights::default().score(&s));
    s
}

/// Build a stored idea in the given status.
pub fn idea(record_id: &str, status: IdeaStatus) -> PromptIdea {
    PromptIdea {
        record_id: record_id.into(),
        idea_id: 1,
        renderer: "Recraft".into(),
        skeleton: "[X]::5".into(),
        status,
        reward_estimate: Some(4.2),
        rating: None,
        proposed_by: "Admin".into(),
        notes: None,
        feedback: None,
        test_image_url: None,
        created_at: Utc::now(),
        approved_at: None,
        declined_at: None,
        parent_record_id: None,
        structure_id: None,
        structure_record_id: None,
    }
}

/// Default settings record with the batch enabled.
pub fn settings_enabled() -> BatchSettings {
    BatchSettings {
        record_id: "recSettings1".into(),
        batch_enabled: true,
        batch_size: DEFAULT_BATCH_SIZE,
        next_batch_time: None,
        email_notifications: false,
        notification_emails: Vec::new(),
        batch_complete: Some(false),
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// Scriptable in-memory [`RecordStore`] that records every write.
#[derive(Default)]
pub struct MockStore {
    pub top: Vec<PromptStructure>,
    pub underexplored: Vec<PromptStructure>,
    pub settings: Option<BatchSettings>,
    pub ideas: Vec<PromptIdea>,
    /// Sequence-id to record-id resolutions; lookups outside the map
    /// return `StoreError::NotFound`.
    pub record_ids: HashMap<i64, String>,
    /// Fail the Nth `create_idea` call (1-based).
    pub fail_create_at: Option<usize>,
    /// Fail every `update_idea` call.
    pub fail_update_idea: bool,
    /// Fail every `update_settings` call.
    pub fail_update_settings: bool,

    next_idea_id: AtomicUsize,
    pub created_ideas: Mutex<Vec<NewIdea>>,
    pub created_structures: Mutex<Vec<NewStructure>>,
    pub idea_patches: Mutex<Vec<(String, IdeaPatch)>>,
    pub settings_patches: Mutex<Vec<SettingsPatch>>,
}

impl MockStore {
    pub fn with_structures(top: Vec<PromptStructure>, underexplored: Vec<PromptStructure>) -> Self {
        Self {
            top,
            underexplored,
            ..Self::default()
        }
    }

    pub fn created_idea_count(&self) -> usize {
        self.created_ideas.lock().unwrap().len()
    }

    pub fn settings_patch_count(&self) -> usize {
        self.settings_patches.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MockStore {
    async fn list_ideas(&self, _view: &str) -> Result<Vec<PromptIdea>, StoreError> {
        Ok(self.ideas.clone())
    }

    async fn fetch_idea(&self, record_id: &str) -> Result<PromptIdea, StoreError> {
        self.ideas
            .iter()
            .find(|i| i.record_id == record_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "Idea",
                id: record_id.to_string(),
            })
    }

    async fn create_idea(&self, new: &NewIdea) -> Result<PromptIdea, StoreError> {
        let seq = self.next_idea_id.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_create_at == Some(seq) {
            return Err(StoreError::Request("simulated create failure".into()));
        }
        self.created_ideas.lock().unwrap().push(new.clone());
        let mut created = idea(&format!("recIdea{seq}"), IdeaStatus::Proposed);
        created.idea_id = seq as i64;
        created.skeleton = new.skeleton.clone();
        created.renderer = new.renderer.clone();
        created.proposed_by = new.proposed_by.clone();
        created.parent_record_id = new.parent_record_id.clone();
        created.reward_estimate = new.reward_estimate;
        created.notes = new.notes.clone();
        Ok(created)
    }

    async fn update_idea(
        &self,
        record_id: &str,
        patch: &IdeaPatch,
    ) -> Result<PromptIdea, StoreError> {
        if self.fail_update_idea {
            return Err(StoreError::Request("simulated update failure".into()));
        }
        self.idea_patches
            .lock()
            .unwrap()
            .push((record_id.to_string(), patch.clone()));
        let mut updated = self
            .ideas
            .iter()
            .find(|i| i.record_id == record_id)
            .cloned()
            .unwrap_or_else(|| idea(record_id, IdeaStatus::Proposed));
        if let Some(status) = patch.status {
            updated.status = status;
        }
        if let Some(rating) = patch.rating {
            updated.rating = Some(rating);
        }
        if let Some(feedback) = &patch.feedback {
            updated.feedback = Some(feedback.clone());
        }
        if let Some(at) = patch.approved_at {
            updated.approved_at = Some(at);
        }
        if let Some(at) = patch.declined_at {
            updated.declined_at = Some(at);
        }
        if let Some(url) = &patch.test_image_url {
            updated.test_image_url = Some(url.clone());
        }
        if let Some(id) = patch.structure_id {
            updated.structure_id = Some(id);
            updated.structure_record_id = self.record_ids.get(&id).cloned();
        }
        Ok(updated)
    }

    async fn list_structures(
        &self,
        view: StructureView,
    ) -> Result<Vec<PromptStructure>, StoreError> {
        Ok(match view {
            StructureView::TopPerformers => self.top.clone(),
            StructureView::Underexplored => self.underexplored.clone(),
            StructureView::All => {
                let mut all = self.top.clone();
                all.extend(self.underexplored.clone());
                all
            }
        })
    }

    async fn create_structure(&self, new: &NewStructure) -> Result<PromptStructure, StoreError> {
        self.created_structures.lock().unwrap().push(new.clone());
        let seq = self.created_structures.lock().unwrap().len() as i64 + 100;
        let mut created = structure(seq, new.ai_score.unwrap_or(0.0), 0.0, 0.0);
        created.skeleton = new.skeleton.clone();
        created.renderer = new.renderer.clone();
        created.model_used = new.model_used.clone();
        created.system_prompt = new.system_prompt.clone();
        Ok(created)
    }

    async fn structure_record_id(&self, structure_id: i64) -> Result<String, StoreError> {
        self.record_ids
            .get(&structure_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "Structure",
                id: structure_id.to_string(),
            })
    }

    async fn fetch_settings(&self) -> Result<BatchSettings, StoreError> {
        self.settings.clone().ok_or(StoreError::MissingSettings)
    }

    async fn update_settings(
        &self,
        _record_id: &str,
        patch: &SettingsPatch,
    ) -> Result<BatchSettings, StoreError> {
        if self.fail_update_settings {
            return Err(StoreError::Request("simulated settings failure".into()));
        }
        self.settings_patches.lock().unwrap().push(patch.clone());
        let mut settings = self.settings.clone().ok_or(StoreError::MissingSettings)?;
        if let Some(complete) = patch.batch_complete {
            settings.batch_complete = Some(complete);
        }
        Ok(settings)
    }
}

// ---------------------------------------------------------------------------
// MockChat
// ---------------------------------------------------------------------------

/// [`ChatClient`] fake returning a canned response and counting calls.
pub struct MockChat {
    response: String,
    pub calls: AtomicUsize,
}

impl MockChat {
    pub fn returning(response: String) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatClient for MockChat {
    async fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
