//! Schema-mapping configuration for the record store.
//!
//! Every table, view, and column the adapter touches is addressed by an
//! externally-configured identifier. [`StoreSchema::from_env`] validates
//! the whole mapping eagerly: a missing variable fails construction (and
//! thus startup) naming every absent identifier, instead of failing
//! lazily on the first call that happens to need it.

use crate::error::StoreError;

/// Default API base for an Airtable-style store.
pub const DEFAULT_API_BASE: &str = "https://api.airtable.com/v0";

/// Column identifiers for the Ideas table.
#[derive(Debug, Clone)]
pub struct IdeaColumns {
    pub idea_id: String,
    pub skeleton: String,
    pub renderer: String,
    pub status: String,
    pub reward: String,
    pub rating: String,
    pub proposed_by: String,
    pub notes: String,
    pub feedback: String,
    pub test_image: String,
    pub created_at: String,
    pub approved_at: String,
    pub declined_at: String,
    /// Linked-record column pointing at the inspiring structure.
    pub parent: String,
    /// Linked-record column pointing at the promoted structure.
    pub structure_link: String,
}

/// Column identifiers for the Structures table.
#[derive(Debug, Clone)]
pub struct StructureColumns {
    pub structure_id: String,
    pub skeleton: String,
    pub renderer: String,
    pub status: String,
    pub outlier_count: String,
    pub usage_count: String,
    pub age_weeks: String,
    pub z_score: String,
    pub ai_score: String,
    pub ai_critique: String,
    pub trend: String,
    pub model_used: String,
    pub system_prompt: String,
    pub date_created: String,
    /// Linked-record column pointing back at the originating idea.
    pub idea_link: String,
}

/// Column identifiers for the Settings table.
#[derive(Debug, Clone)]
pub struct SettingsColumns {
    pub batch_size: String,
    pub batch_enabled: String,
    pub next_batch_time: String,
    pub email_notifications: String,
    pub notification_email: String,
    pub batch_complete: String,
}

/// Complete store schema: endpoint, credentials, table and view names,
/// and per-collection column mappings.
#[derive(Debug, Clone)]
pub struct StoreSchema {
    pub api_base: String,
    pub api_key: String,
    pub base_id: String,

    pub ideas_table: String,
    pub structures_table: String,
    pub settings_table: String,

    /// View over structures used by the structure-history surface.
    pub view_structures_all: String,
    /// Store-side view selecting top-performing structures.
    pub view_top_performers: String,
    /// Store-side view selecting promising low-usage structures.
    pub view_underexplored: String,
    /// View expected to contain the single settings record.
    pub view_settings_main: String,

    /// Status option written when creating ideas.
    pub status_proposed: String,
    /// Status option written when creating structures.
    pub status_active: String,

    pub idea: IdeaColumns,
    pub structure: StructureColumns,
    pub settings: SettingsColumns,
}

impl StoreSchema {
    /// Load the schema from environment variables.
    ///
    /// Optional (with default): `STORE_API_BASE`, `STORE_STATUS_PROPOSED`
    /// (`Proposed`), `STORE_STATUS_ACTIVE` (`Active`). Everything else is
    /// required; all missing names are collected into a single
    /// [`StoreError::Config`].
    pub fn from_env() -> Result<Self, StoreError> {
        let mut env = EnvReader::default();

        let schema = Self {
            api_base: env.or_default("STORE_API_BASE", DEFAULT_API_BASE),
            api_key: env.required("STORE_API_KEY"),
            base_id: env.required("STORE_BASE_ID"),

            ideas_table: env.required("STORE_IDEAS_TABLE"),
            structures_table: env.required("STORE_STRUCTURES_TABLE"),
            settings_table: env.required("STORE_SETTINGS_TABLE"),

            view_structures_all: env.required("STORE_VIEW_STRUCTURES_ALL"),
            view_top_performers: env.required("STORE_VIEW_TOP_PERFORMERS"),
            view_underexplored: env.required("STORE_VIEW_UNDEREXPLORED"),
            view_settings_main: env.required("STORE_VIEW_SETTINGS_MAIN"),

            status_proposed: env.or_default("STORE_STATUS_PROPOSED", "Proposed"),
            status_active: env.or_default("STORE_STATUS_ACTIVE", "Active"),

            idea: IdeaColumns {
                idea_id: env.required("STORE_COL_IDEA_ID"),
                skeleton: env.required("STORE_COL_SKELETON"),
                renderer: env.required("STORE_COL_RENDERER"),
                status: env.required("STORE_COL_STATUS"),
                reward: env.required("STORE_COL_REWARD"),
                rating: env.required("STORE_COL_RATING"),
                proposed_by: env.required("STORE_COL_PROPOSED_BY"),
                notes: env.required("STORE_COL_NOTES"),
                feedback: env.required("STORE_COL_FEEDBACK"),
                test_image: env.required("STORE_COL_TEST_IMAGE"),
                created_at: env.required("STORE_COL_CREATED_AT"),
                approved_at: env.required("STORE_COL_APPROVED_AT"),
                declined_at: env.required("STORE_COL_DECLINED_AT"),
                parent: env.required("STORE_COL_PARENT"),
                structure_link: env.required("STORE_COL_STRUCTURE_LINK"),
            },
            structure: StructureColumns {
                structure_id: env.required("STORE_COL_STRUCT_ID"),
                skeleton: env.required("STORE_COL_STRUCT_SKELETON"),
                renderer: env.required("STORE_COL_STRUCT_RENDERER"),
                status: env.required("STORE_COL_STRUCT_STATUS"),
                outlier_count: env.required("STORE_COL_OUTLIER_COUNT"),
                usage_count: env.required("STORE_COL_USAGE_COUNT"),
                age_weeks: env.required("STORE_COL_AGE_WEEKS"),
                z_score: env.required("STORE_COL_Z_SCORE"),
                ai_score: env.required("STORE_COL_AI_SCORE"),
                ai_critique: env.required("STORE_COL_AI_CRITIQUE"),
                trend: env.required("STORE_COL_TREND"),
                model_used: env.required("STORE_COL_MODEL_USED"),
                system_prompt: env.required("STORE_COL_SYSTEM_PROMPT"),
                date_created: env.required("STORE_COL_DATE_CREATED"),
                idea_link: env.or_default("STORE_COL_STRUCT_IDEA", "Idea"),
            },
            settings: SettingsColumns {
                batch_size: env.required("STORE_COL_BATCH_SIZE"),
                batch_enabled: env.required("STORE_COL_BATCH_ENABLED"),
                next_batch_time: env.required("STORE_COL_NEXT_BATCH_TIME"),
                email_notifications: env.required("STORE_COL_EMAIL_NOTIFICATIONS"),
                notification_email: env.required("STORE_COL_NOTIFICATION_EMAIL"),
                batch_complete: env.required("STORE_COL_BATCH_COMPLETE"),
            },
        };

        env.finish()?;
        Ok(schema)
    }
}

/// Collects missing environment variables so that configuration errors
/// can report every absent identifier at once.
#[derive(Default)]
struct EnvReader {
    missing: Vec<String>,
}

impl EnvReader {
    fn required(&mut self, name: &str) -> String {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => {
                self.missing.push(name.to_string());
                String::new()
            }
        }
    }

    fn or_default(&mut self, name: &str, default: &str) -> String {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => default.to_string(),
        }
    }

    fn finish(self) -> Result<(), StoreError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Config(self.missing))
        }
    }
}
