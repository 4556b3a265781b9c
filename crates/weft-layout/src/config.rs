//! Engine configuration.
//!
//! Every field has a default, so a configuration file only needs to name
//! what it changes:
//!
//! ```json
//! { "indent_width": 32.0, "parser_limits": { "max_steps": 5000 } }
//! ```

use serde::{Deserialize, Serialize};
use weft_css::{MatchLimits, ParserLimits};

/// Tunables for parsing, matching and layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// CSS parser caps.
    pub parser_limits: ParserLimits,
    /// Selector matching caps.
    pub match_limits: MatchLimits,
    /// Horizontal offset of one list indent level, in pixels.
    pub indent_width: f32,
    /// Size of the base font entry, in pixels.
    pub default_font_size: f32,
    /// Face of the base font entry.
    pub default_font_face: String,
    /// Face used when the font type is fixed.
    pub fixed_font_face: String,
    /// Line and child visits allowed in one layout pass before it is truncated.
    pub layout_step_cap: usize,
    /// Width given to replaced content whose size is not known yet.
    pub placeholder_width: f32,
    /// Height given to replaced content whose size is not known yet.
    pub placeholder_height: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parser_limits: ParserLimits::default(),
            match_limits: MatchLimits::default(),
            indent_width: 40.0,
            default_font_size: weft_css::DEFAULT_FONT_SIZE_PX,
            default_font_face: "serif".to_string(),
            fixed_font_face: "monospace".to_string(),
            layout_step_cap: 100_000,
            placeholder_width: 20.0,
            placeholder_height: 20.0,
        }
    }
}
