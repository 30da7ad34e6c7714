use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidebarPosition {
    #[default]
    Left,
    Right,
}

/// Thread history sidebar settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub default_collapsed: bool,
    pub position: SidebarPosition,
    pub collapsed_width: String,
    pub expanded_width: String,
    /// Buffered events per subscriber before slow readers start lagging
    pub event_capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_collapsed: false,
            position: SidebarPosition::Left,
            collapsed_width: "4rem".to_string(),
            expanded_width: "18rem".to_string(),
            event_capacity: 64,
        }
    }
}

impl HistoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.default_collapsed = collapsed;
        self
    }

    pub fn with_position(mut self, position: SidebarPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_widths(mut self, collapsed: impl Into<String>, expanded: impl Into<String>) -> Self {
        self.collapsed_width = collapsed.into();
        self.expanded_width = expanded.into();
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Mac,
    #[default]
    Other,
}

impl Platform {
    /// Classify a `navigator.platform`-style string
    pub fn detect(platform: &str) -> Self {
        if platform.starts_with("Mac") {
            Self::Mac
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutModifier {
    /// Either Ctrl or ⌘ satisfies the chord
    #[default]
    CtrlOrMeta,
    Ctrl,
    Meta,
    Alt,
    None,
}

/// Key chord that toggles the chat surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutConfig {
    pub key: String,
    pub modifier: ShortcutModifier,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            key: "k".to_string(),
            modifier: ShortcutModifier::CtrlOrMeta,
        }
    }
}

impl ShortcutConfig {
    pub fn new(key: impl Into<String>, modifier: ShortcutModifier) -> Self {
        Self {
            key: key.into(),
            modifier,
        }
    }
}

/// Collapsible chat surface settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    pub default_open: bool,
    /// Widths strictly below this many logical pixels render as mobile
    pub mobile_breakpoint: u32,
    pub shortcut: ShortcutConfig,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            default_open: false,
            mobile_breakpoint: 768,
            shortcut: ShortcutConfig::default(),
        }
    }
}

impl VisibilityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open(mut self, open: bool) -> Self {
        self.default_open = open;
        self
    }

    pub fn with_breakpoint(mut self, px: u32) -> Self {
        self.mobile_breakpoint = px;
        self
    }

    pub fn with_shortcut(mut self, shortcut: ShortcutConfig) -> Self {
        self.shortcut = shortcut;
        self
    }
}
