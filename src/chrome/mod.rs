//! Page chrome state served to the front-end: header visibility on scroll
//! and the footer's site links.

use serde::Serialize;

/// Scroll offset (px) below which the header is always shown.
pub const HEADER_HIDE_THRESHOLD: f64 = 100.0;

/// Tracks whether the fixed header should be visible.
///
/// Scrolling down past [`HEADER_HIDE_THRESHOLD`] hides it; any other move
/// shows it again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderVisibility {
    visible: bool,
    last_scroll_y: f64,
}

impl Default for HeaderVisibility {
    fn default() -> Self {
        Self {
            visible: true,
            last_scroll_y: 0.0,
        }
    }
}

impl HeaderVisibility {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Feed a new scroll position; returns the resulting visibility.
    pub fn on_scroll(&mut self, scroll_y: f64) -> bool {
        self.visible = !(scroll_y > self.last_scroll_y && scroll_y > HEADER_HIDE_THRESHOLD);
        self.last_scroll_y = scroll_y;
        self.visible
    }
}

/// Footer links and the rulebook version label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiktok: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
