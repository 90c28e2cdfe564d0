//! Engine configuration.

use crate::guides::GUIDE_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Tunables for interactive editing.
///
/// Deserializes from a partial JSON object; absent keys keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Snap distance in pixels, applied on drag end. Default: **5**.
    pub snap_threshold: f64,

    /// Guide distance in pixels, applied on drag move. Default: **4**.
    pub guide_threshold: f64,

    /// Offer the stage centre lines as a final snap candidate. Default: **true**.
    pub snap_to_stage_center: bool,

    /// Maximum number of undo steps kept. Default: **200**.
    pub undo_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap_threshold: 5.0,
            guide_threshold: GUIDE_THRESHOLD,
            snap_to_stage_center: true,
            undo_depth: 200,
        }
    }
}
