//! Live preview styles.
//!
//! The preview never re-renders pixels: the browser applies a CSS `filter`
//! to the on-screen image and draws the vignette as a gradient overlay
//! element on top of it. Both strings come from the same [`FilterStack`] and
//! [`Vignette`] the export uses, computed at displayed size.

use crate::adjustments::AdjustmentSet;
use crate::filter::FilterStack;
use crate::handle::DisplaySize;
use crate::vignette::Vignette;
use serde::{Deserialize, Serialize};

/// CSS for the on-screen image and its vignette overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewStyle {
    /// Value for the image's `filter` property
    pub filter: String,
    /// Value for the overlay's `background-image`, absent when there is no vignette
    pub vignette: Option<String>,
}

impl PreviewStyle {
    pub fn compute(adjustments: &AdjustmentSet, displayed: &DisplaySize) -> Self {
        let filter = FilterStack::compile(adjustments).to_css();
        let vignette = Vignette::synthesize(adjustments.vignette, displayed.width, displayed.height)
            .map(|v| v.to_css());
        Self { filter, vignette }
    }
}
