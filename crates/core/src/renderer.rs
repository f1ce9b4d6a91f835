//! Resolution of free-text renderer names to known image backends.
//!
//! Renderer selection is a case-insensitive substring match over a small
//! fixed set of backend names. An unrecognized name is a client-facing
//! validation error, not a retryable fault.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The image-generation backends a prompt can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RendererKind {
    /// ImageFX (Google Imagen).
    ImageFx,
    /// Recraft V3.
    Recraft,
}

impl RendererKind {
    /// Display label matching the store's renderer options.
    pub fn label(self) -> &'static str {
        match self {
            Self::ImageFx => "ImageFX",
            Self::Recraft => "Recraft",
        }
    }

    /// Resolve a renderer name via case-insensitive substring match.
    ///
    /// `"ImageFX"`, `"imagen-4"` and `"Google ImageFX"` all resolve to
    /// [`RendererKind::ImageFx`]; anything containing `"recraft"`
    /// resolves to [`RendererKind::Recraft`].
    pub fn resolve(name: &str) -> Result<Self, CoreError> {
        let normalized = name.to_lowercase();
        if normalized.contains("imagefx") || normalized.contains("imagen") {
            Ok(Self::ImageFx)
        } else if normalized.contains("recraft") {
            Ok(Self::Recraft)
        } else {
            Err(CoreError::Validation(format!(
                "Unsupported renderer: {name}. Only ImageFX and Recraft are supported."
            )))
        }
    }
}

impl std::fmt::Display for RendererKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
