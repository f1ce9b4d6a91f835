//! Wire mapping between store records and domain types.
//!
//! All schema-name indirection, status normalization, linked-record and
//! attachment handling, and date formatting live here. Patches are
//! sparse: only explicitly-provided fields appear in the encoded map, so
//! omission is never interpreted as "clear this field".

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Map, Value};

use atelier_core::idea::{IdeaPatch, NewIdea, PromptIdea};
use atelier_core::reward::RewardWeights;
use atelier_core::settings::{BatchSettings, SettingsPatch, DEFAULT_BATCH_SIZE};
use atelier_core::status::{IdeaStatus, StructureStatus};
use atelier_core::structure::{NewStructure, PromptStructure};

use crate::client::Record;
use crate::schema::StoreSchema;

// ---------------------------------------------------------------------------
// Ideas
// ---------------------------------------------------------------------------

/// Decode an idea record into the domain type.
pub fn decode_idea(record: &Record, schema: &StoreSchema) -> PromptIdea {
    let cols = &schema.idea;
    let fields = &record.fields;

    // The promoted-structure column is a linked-record array in most
    // bases but a plain sequence number in some; accept both.
    let structure_value = fields.get(&cols.structure_link);
    let structure_record_id = structure_value.and_then(first_linked_id);
    let structure_id = structure_value.and_then(Value::as_i64);

    let created_at = str_field(fields, &cols.created_at)
        .and_then(|s| parse_datetime(&s))
        .or_else(|| {
            record
                .created_time
                .as_deref()
                .and_then(parse_datetime)
        })
        .unwrap_or_else(Utc::now);

    PromptIdea {
        record_id: record.id.clone(),
        idea_id: f64_field(fields, &cols.idea_id).unwrap_or(0.0) as i64,
        renderer: str_field(fields, &cols.renderer).unwrap_or_default(),
        skeleton: str_field(fields, &cols.skeleton).unwrap_or_default(),
        status: str_field(fields, &cols.status)
            .and_then(|s| IdeaStatus::parse(&s))
            .unwrap_or(IdeaStatus::Proposed),
        reward_estimate: f64_field(fields, &cols.reward),
        rating: f64_field(fields, &cols.rating).map(|r| r as u8),
        proposed_by: str_field(fields, &cols.proposed_by).unwrap_or_else(|| "Admin".into()),
        notes: str_field(fields, &cols.notes),
        feedback: str_field(fields, &cols.feedback),
        test_image_url: fields.get(&cols.test_image).and_then(attachment_url),
        created_at,
        approved_at: str_field(fields, &cols.approved_at).and_then(|s| parse_datetime(&s)),
        declined_at: str_field(fields, &cols.declined_at).and_then(|s| parse_datetime(&s)),
        parent_record_id: fields.get(&cols.parent).and_then(first_linked_id),
        structure_id,
        structure_record_id,
    }
}

/// Encode the fields map for a new idea. Status is always the store's
/// "Proposed" option.
pub fn encode_new_idea(new: &NewIdea, schema: &StoreSchema) -> Map<String, Value> {
    let cols = &schema.idea;
    let mut fields = Map::new();
    fields.insert(cols.skeleton.clone(), json!(new.skeleton));
    fields.insert(cols.renderer.clone(), json!(new.renderer));
    fields.insert(cols.status.clone(), json!(schema.status_proposed));
    fields.insert(cols.proposed_by.clone(), json!(new.proposed_by));
    if let Some(reward) = new.reward_estimate {
        fields.insert(cols.reward.clone(), json!(reward));
    }
    if let Some(notes) = &new.notes {
        fields.insert(cols.notes.clone(), json!(notes));
    }
    if let Some(parent) = &new.parent_record_id {
        fields.insert(cols.parent.clone(), json!([parent]));
    }
    fields
}

/// Encode a sparse idea patch.
///
/// `structure_record_id` is the pre-resolved storage id for the
/// `structure_id` in the patch, when present. Dates are written in the
/// store's `YYYY-MM-DD` column format.
pub fn encode_idea_patch(
    patch: &IdeaPatch,
    schema: &StoreSchema,
    structure_record_id: Option<&str>,
) -> Map<String, Value> {
    let cols = &schema.idea;
    let mut fields = Map::new();
    if let Some(status) = patch.status {
        fields.insert(cols.status.clone(), json!(status.label()));
    }
    if let Some(rating) = patch.rating {
        fields.insert(cols.rating.clone(), json!(rating));
    }
    if let Some(feedback) = &patch.feedback {
        fields.insert(cols.feedback.clone(), json!(feedback));
    }
    if let Some(notes) = &patch.notes {
        fields.insert(cols.notes.clone(), json!(notes));
    }
    if let Some(approved_at) = patch.approved_at {
        fields.insert(cols.approved_at.clone(), json!(format_date(approved_at)));
    }
    if let Some(declined_at) = patch.declined_at {
        fields.insert(cols.declined_at.clone(), json!(format_date(declined_at)));
    }
    if let Some(url) = &patch.test_image_url {
        // Attachment columns take an array of attachment objects.
        fields.insert(cols.test_image.clone(), json!([{ "url": url }]));
    }
    if let Some(record_id) = structure_record_id {
        fields.insert(cols.structure_link.clone(), json!([record_id]));
    }
    fields
}

// ---------------------------------------------------------------------------
// Structures
// ---------------------------------------------------------------------------

/// Decode a structure record, decorating it with the computed reward
/// score. The score is derived on every read and never persisted.
pub fn decode_structure(
    record: &Record,
    schema: &StoreSchema,
    weights: &RewardWeights,
) -> PromptStructure {
    let cols = &schema.structure;
    let fields = &record.fields;

    let mut structure = PromptStructure {
        record_id: record.id.clone(),
        structure_id: f64_field(fields, &cols.structure_id).unwrap_or(0.0) as i64,
        skeleton: str_field(fields, &cols.skeleton).unwrap_or_default(),
        renderer: str_field(fields, &cols.renderer).unwrap_or_default(),
        status: str_field(fields, &cols.status)
            .and_then(|s| StructureStatus::parse(&s))
            .unwrap_or(StructureStatus::Active),
        outlier_count: f64_field(fields, &cols.outlier_count).unwrap_or(0.0),
        usage_count: f64_field(fields, &cols.usage_count).unwrap_or(0.0),
        age_weeks: f64_field(fields, &cols.age_weeks).unwrap_or(0.0),
        z_score: f64_field(fields, &cols.z_score).unwrap_or(0.0),
        ai_score: f64_field(fields, &cols.ai_score).unwrap_or(0.0),
        ai_critique: str_field(fields, &cols.ai_critique),
        trend: str_field(fields, &cols.trend),
        model_used: str_field(fields, &cols.model_used),
        system_prompt: str_field(fields, &cols.system_prompt),
        date_created: str_field(fields, &cols.date_created)
            .and_then(|s| parse_datetime(&s))
            .or_else(|| record.created_time.as_deref().and_then(parse_datetime))
            .unwrap_or_else(Utc::now),
        reward_score: None,
    };
    structure.reward_score = Some(weights.score(&structure));
    structure
}

/// Encode the fields map for a new structure.
///
/// The performance metric columns are never written; store-side
/// automation owns them.
pub fn encode_new_structure(new: &NewStructure, schema: &StoreSchema) -> Map<String, Value> {
    let cols = &schema.structure;
    let mut fields = Map::new();
    fields.insert(cols.skeleton.clone(), json!(new.skeleton));
    fields.insert(cols.renderer.clone(), json!(new.renderer));
    fields.insert(cols.status.clone(), json!(schema.status_active));
    if let Some(ai_score) = new.ai_score {
        fields.insert(cols.ai_score.clone(), json!(ai_score));
    }
    if let Some(model) = &new.model_used {
        fields.insert(cols.model_used.clone(), json!(model));
    }
    if let Some(prompt) = &new.system_prompt {
        fields.insert(cols.system_prompt.clone(), json!(prompt));
    }
    if let Some(idea) = &new.source_idea_record_id {
        fields.insert(cols.idea_link.clone(), json!([idea]));
    }
    fields
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Decode the singleton settings record.
pub fn decode_settings(record: &Record, schema: &StoreSchema) -> BatchSettings {
    let cols = &schema.settings;
    let fields = &record.fields;

    // The recipient column holds either a single address or an array.
    let notification_emails = match fields.get(&cols.notification_email) {
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    };

    BatchSettings {
        record_id: record.id.clone(),
        batch_enabled: bool_field(fields, &cols.batch_enabled),
        batch_size: f64_field(fields, &cols.batch_size)
            .map(|n| n as u32)
            .unwrap_or(DEFAULT_BATCH_SIZE),
        next_batch_time: str_field(fields, &cols.next_batch_time),
        email_notifications: bool_field(fields, &cols.email_notifications),
        notification_emails,
        batch_complete: fields.get(&cols.batch_complete).and_then(Value::as_bool),
    }
}

/// Encode a sparse settings patch.
pub fn encode_settings_patch(patch: &SettingsPatch, schema: &StoreSchema) -> Map<String, Value> {
    let cols = &schema.settings;
    let mut fields = Map::new();
    if let Some(enabled) = patch.batch_enabled {
        fields.insert(cols.batch_enabled.clone(), json!(enabled));
    }
    if let Some(size) = patch.batch_size {
        fields.insert(cols.batch_size.clone(), json!(size));
    }
    if let Some(next) = &patch.next_batch_time {
        fields.insert(cols.next_batch_time.clone(), json!(next));
    }
    if let Some(notify) = patch.email_notifications {
        fields.insert(cols.email_notifications.clone(), json!(notify));
    }
    if let Some(emails) = &patch.notification_emails {
        fields.insert(cols.notification_email.clone(), json!(emails));
    }
    if let Some(complete) = patch.batch_complete {
        fields.insert(cols.batch_complete.clone(), json!(complete));
    }
    fields
}

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

fn str_field(fields: &Map<String, Value>, column: &str) -> Option<String> {
    fields
        .get(column)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn f64_field(fields: &Map<String, Value>, column: &str) -> Option<f64> {
    fields.get(column).and_then(Value::as_f64)
}

fn bool_field(fields: &Map<String, Value>, column: &str) -> bool {
    fields
        .get(column)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// First element of a linked-record array, when the value is one.
fn first_linked_id(value: &Value) -> Option<String> {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(Value::as_str)
        .map(String::from)
}

/// URL of the first attachment object, when the value is an attachment
/// array.
fn attachment_url(value: &Value) -> Option<String> {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(|item| item.get("url"))
        .and_then(Value::as_str)
        .map(String::from)
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date column value.
fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Format a timestamp for the store's Date columns.
fn format_date(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::test_support::schema;
    use chrono::TimeZone;

    fn record(fields: Value) -> Record {
        Record {
            id: "recTest".into(),
            created_time: Some("2025-06-01T12:00:00.000Z".into()),
            fields: fields.as_object().unwrap().clone(),
        }
    }

    #[test]
    fn decode_idea_maps_all_columns() {
        let schema = schema("http://store");
        let rec = record(json!({
            "Idea ID": 42,
            "Skeleton": "[X]::5",
            "Renderer": "Recraft",
            "Status": "pending",
            "Reward": 4.2,
            "Rating": 4,
            "Proposed By": "AI System",
            "Feedback": "solid",
            "Parent": ["recParent"],
            "Structure": ["recStruct"],
            "Test Image": [{ "url": "https://img/test.png" }],
            "Approved At": "2025-06-02",
        }));

        let idea = decode_idea(&rec, &schema);
        assert_eq!(idea.idea_id, 42);
        assert_eq!(idea.status, IdeaStatus::Pending);
        assert_eq!(idea.reward_estimate, Some(4.2));
        assert_eq!(idea.rating, Some(4));
        assert_eq!(idea.parent_record_id.as_deref(), Some("recParent"));
        assert_eq!(idea.structure_record_id.as_deref(), Some("recStruct"));
        assert_eq!(idea.test_image_url.as_deref(), Some("https://img/test.png"));
        assert_eq!(
            idea.approved_at,
            Some(Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap())
        );
        // No created-at column: falls back to the record's createdTime.
        assert_eq!(
            idea.created_at,
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn decode_idea_defaults_unknown_status_to_proposed() {
        let schema = schema("http://store");
        let idea = decode_idea(&record(json!({ "Status": "weird" })), &schema);
        assert_eq!(idea.status, IdeaStatus::Proposed);
    }

    #[test]
    fn new_idea_is_written_with_proposed_status() {
        let schema = schema("http://store");
        let fields = encode_new_idea(
            &NewIdea {
                skeleton: "[X]::5".into(),
                renderer: "Recraft".into(),
                proposed_by: "AI System".into(),
                parent_record_id: Some("recParent".into()),
                reward_estimate: Some(4.0),
                notes: None,
            },
            &schema,
        );
        assert_eq!(fields["Status"], json!("Proposed"));
        assert_eq!(fields["Parent"], json!(["recParent"]));
        assert_eq!(fields["Reward"], json!(4.0));
        // Omitted optional fields must not appear at all.
        assert!(!fields.contains_key("Notes"));
    }

    #[test]
    fn idea_patch_is_sparse() {
        let schema = schema("http://store");
        let patch = IdeaPatch {
            status: Some(IdeaStatus::Declined),
            declined_at: Some(Utc.with_ymd_and_hms(2025, 6, 3, 15, 30, 0).unwrap()),
            ..IdeaPatch::default()
        };
        let fields = encode_idea_patch(&patch, &schema, None);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["Status"], json!("Declined"));
        assert_eq!(fields["Declined At"], json!("2025-06-03"));
    }

    #[test]
    fn idea_patch_links_resolved_structure_record() {
        let schema = schema("http://store");
        let patch = IdeaPatch {
            status: Some(IdeaStatus::Approved),
            structure_id: Some(7),
            ..IdeaPatch::default()
        };
        let fields = encode_idea_patch(&patch, &schema, Some("recStruct7"));
        assert_eq!(fields["Structure"], json!(["recStruct7"]));
    }

    #[test]
    fn decode_structure_decorates_reward_score() {
        let schema = schema("http://store");
        let rec = record(json!({
            "Structure ID": 7,
            "Skeleton": "[Brand]::5",
            "Renderer": "ImageFX",
            "Status": "Active",
            "AI Score": 8.0,
            "Outlier Count": 3,
            "Age Weeks": 2,
        }));
        let s = decode_structure(&rec, &schema, &RewardWeights::default());
        let expected = 0.6 * 8.0 + 0.3 * 3.0 + -0.1 * 2.0;
        assert!((s.reward_score.unwrap() - expected).abs() < 1e-9);
        assert_eq!(s.structure_id, 7);
    }

    #[test]
    fn new_structure_never_writes_metric_columns() {
        let schema = schema("http://store");
        let fields = encode_new_structure(
            &NewStructure {
                skeleton: "[X]::5".into(),
                renderer: "Recraft".into(),
                ai_score: Some(4.5),
                model_used: Some("gpt-4o".into()),
                system_prompt: Some("system".into()),
                source_idea_record_id: Some("recIdea".into()),
            },
            &schema,
        );
        assert_eq!(fields["Status"], json!("Active"));
        assert_eq!(fields["Idea"], json!(["recIdea"]));
        for metric in ["Outlier Count", "Usage Count", "Age Weeks", "Z Score"] {
            assert!(!fields.contains_key(metric));
        }
    }

    #[test]
    fn decode_settings_handles_scalar_and_array_recipients() {
        let schema = schema("http://store");
        let scalar = decode_settings(
            &record(json!({ "Notification Email": "a@b.c", "Batch Enabled": true })),
            &schema,
        );
        assert_eq!(scalar.notification_emails, vec!["a@b.c"]);
        assert!(scalar.batch_enabled);
        assert_eq!(scalar.batch_size, DEFAULT_BATCH_SIZE);

        let array = decode_settings(
            &record(json!({ "Notification Email": ["a@b.c", "d@e.f"] })),
            &schema,
        );
        assert_eq!(array.notification_emails.len(), 2);
    }

    #[test]
    fn settings_patch_is_sparse() {
        let schema = schema("http://store");
        let fields = encode_settings_patch(&SettingsPatch::complete(), &schema);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["Batch Complete"], json!(true));
    }
}
