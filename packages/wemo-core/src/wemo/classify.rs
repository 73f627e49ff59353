//! Model-name classification.
//!
//! Maps the `modelName` of a device descriptor to the [`DeviceRole`] that
//! decides which control behaviour applies. The built-in table is exact
//! match; anything it does not know is offered to extension classifiers in
//! registration order.

use std::sync::Arc;

use crate::wemo::types::DeviceRole;

/// Built-in exact-match model table.
const MODEL_TABLE: &[(&str, DeviceRole)] = &[
    ("Bridge", DeviceRole::Bridge),
    ("LightSwitch", DeviceRole::LightSwitch),
    ("Socket", DeviceRole::Switch),
    ("Insight", DeviceRole::InsightSwitch),
    ("Emulated Socket", DeviceRole::Switch),
];

/// Classifies a model name using only the built-in table.
pub fn classify_model(model_name: &str) -> DeviceRole {
    MODEL_TABLE
        .iter()
        .find(|(model, _)| *model == model_name)
        .map(|(_, role)| *role)
        .unwrap_or(DeviceRole::Unknown)
}

/// Extension point for models the built-in table does not recognise.
pub trait ModelClassifier: Send + Sync {
    /// Returns a role for `model_name`, or None to pass.
    fn classify(&self, model_name: &str) -> Option<DeviceRole>;
}

impl<F> ModelClassifier for F
where
    F: Fn(&str) -> Option<DeviceRole> + Send + Sync,
{
    fn classify(&self, model_name: &str) -> Option<DeviceRole> {
        self(model_name)
    }
}

/// Built-in table plus registered extensions.
#[derive(Clone, Default)]
pub struct Classifier {
    extensions: Vec<Arc<dyn ModelClassifier>>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an extension classifier, consulted after earlier ones.
    #[must_use]
    pub fn with_extension(mut self, extension: Arc<dyn ModelClassifier>) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Resolves the role for `model_name`.
    ///
    /// Extensions never override the built-in table, and a role of
    /// [`DeviceRole::Unknown`] returned by an extension counts as a pass.
    pub fn classify(&self, model_name: &str) -> DeviceRole {
        let role = classify_model(model_name);
        if role.is_known() {
            return role;
        }

        self.extensions
            .iter()
            .filter_map(|ext| ext.classify(model_name))
            .find(DeviceRole::is_known)
            .unwrap_or_else(|| {
                log::debug!("[Discovery] Unrecognised model '{}'", model_name);
                DeviceRole::Unknown
            })
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
