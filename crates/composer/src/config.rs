use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime knobs for [`SceneComposer`](crate::SceneComposer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// glTF file with the `handle_base` and `handle_grip` meshes.
    /// Without one the handles stay hidden.
    pub handle_model: Option<PathBuf>,
    pub load_timeout: Duration,
    /// Quiet period before a wall recut runs.
    pub debounce: Duration,
    /// Keep released mesh handles queued until
    /// [`drain_released_meshes`](crate::SceneComposer::drain_released_meshes).
    /// Set this when a renderer holds GPU copies; otherwise `tick` discards them.
    #[serde(default)]
    pub keep_released: bool,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            handle_model: None,
            load_timeout: Duration::from_secs(5),
            debounce: Duration::from_millis(120),
            keep_released: false,
        }
    }
}

impl ComposerConfig {
    pub fn with_handle_model(mut self, path: impl Into<PathBuf>) -> Self {
        self.handle_model = Some(path.into());
        self
    }
}
