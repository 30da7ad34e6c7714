use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use invoice_types::{Platform, ThreadId, VisibilityConfig};

use crate::controller::ThreadActivationObserver;
use crate::shortcut::{KeyChord, KeyEvent, KeyListener, KeyboardHub, ListenerGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatVisibility {
    Open,
    #[default]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewport {
    Mobile,
    #[default]
    Desktop,
}

impl Viewport {
    /// Widths strictly below the breakpoint are mobile
    pub fn classify(width: u32, breakpoint: u32) -> Self {
        if width < breakpoint {
            Viewport::Mobile
        } else {
            Viewport::Desktop
        }
    }
}

/// How the chat surface renders for the current state and viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Closed: only the floating trigger button
    Trigger,
    FloatingCard,
    FullBleedPanel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityState {
    pub visibility: ChatVisibility,
    pub viewport: Viewport,
}

impl VisibilityState {
    pub fn is_open(&self) -> bool {
        self.visibility == ChatVisibility::Open
    }

    pub fn presentation(&self) -> Presentation {
        match (self.visibility, self.viewport) {
            (ChatVisibility::Closed, _) => Presentation::Trigger,
            (ChatVisibility::Open, Viewport::Desktop) => Presentation::FloatingCard,
            (ChatVisibility::Open, Viewport::Mobile) => Presentation::FullBleedPanel,
        }
    }
}

/// Open/closed state of the chat surface
///
/// Clones share state. Every transition is infallible and local.
#[derive(Clone)]
pub struct VisibilityController {
    state: Arc<watch::Sender<VisibilityState>>,
    config: Arc<VisibilityConfig>,
    chord: KeyChord,
    mounted: Arc<AtomicBool>,
}

impl VisibilityController {
    pub fn new(config: VisibilityConfig) -> Self {
        let visibility = if config.default_open {
            ChatVisibility::Open
        } else {
            ChatVisibility::Closed
        };
        let (state, _) = watch::channel(VisibilityState {
            visibility,
            viewport: Viewport::Desktop,
        });

        Self {
            state: Arc::new(state),
            chord: KeyChord::from_config(&config.shortcut),
            config: Arc::new(config),
            mounted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &VisibilityConfig {
        &self.config
    }

    pub fn chord(&self) -> &KeyChord {
        &self.chord
    }

    pub fn subscribe(&self) -> watch::Receiver<VisibilityState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> VisibilityState {
        *self.state.borrow()
    }

    fn set_visibility(&self, visibility: ChatVisibility) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if state.visibility == visibility {
                return false;
            }
            state.visibility = visibility;
            true
        });
        if changed {
            debug!(?visibility, "chat visibility changed");
        }
        changed
    }

    pub fn open(&self) -> bool {
        self.set_visibility(ChatVisibility::Open)
    }

    pub fn close(&self) -> bool {
        self.set_visibility(ChatVisibility::Closed)
    }

    pub fn toggle(&self) -> ChatVisibility {
        let mut next = ChatVisibility::Closed;
        self.state.send_modify(|state| {
            state.visibility = match state.visibility {
                ChatVisibility::Open => ChatVisibility::Closed,
                ChatVisibility::Closed => ChatVisibility::Open,
            };
            next = state.visibility;
        });
        debug!(visibility = ?next, "chat visibility toggled");
        next
    }

    pub fn is_open(&self) -> bool {
        self.snapshot().is_open()
    }

    pub fn visibility(&self) -> ChatVisibility {
        self.snapshot().visibility
    }

    /// Reclassify the viewport; only the rendering of Open depends on it
    pub fn on_resize(&self, width: u32) -> Viewport {
        let viewport = Viewport::classify(width, self.config.mobile_breakpoint);
        self.state.send_if_modified(|state| {
            if state.viewport == viewport {
                return false;
            }
            state.viewport = viewport;
            true
        });
        viewport
    }

    pub fn viewport(&self) -> Viewport {
        self.snapshot().viewport
    }

    pub fn presentation(&self) -> Presentation {
        self.snapshot().presentation()
    }

    pub fn shortcut_label(&self, platform: Platform) -> String {
        self.chord.label(platform)
    }

    /// The trigger button shows the shortcut hint on desktop only
    pub fn trigger_shows_shortcut(&self) -> bool {
        self.viewport() == Viewport::Desktop
    }

    /// Toggle when the event is the configured chord
    pub fn handle_key(&self, event: &KeyEvent) -> bool {
        if !self.chord.should_fire(event) {
            return false;
        }
        self.toggle();
        true
    }

    /// Attach the global shortcut listener
    ///
    /// Returns `None` while a previous mount is still alive, so the chord
    /// toggles exactly once per key press however often the view remounts.
    pub fn mount(&self, hub: &KeyboardHub) -> Option<MountGuard> {
        if self.mounted.swap(true, Ordering::AcqRel) {
            debug!("shortcut listener already mounted");
            return None;
        }
        let listener = hub.attach(Arc::new(self.clone()));
        Some(MountGuard {
            _listener: listener,
            mounted: Arc::clone(&self.mounted),
        })
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }
}

impl Default for VisibilityController {
    fn default() -> Self {
        Self::new(VisibilityConfig::default())
    }
}

impl KeyListener for VisibilityController {
    fn handle_key(&self, event: &KeyEvent) -> bool {
        VisibilityController::handle_key(self, event)
    }
}

impl ThreadActivationObserver for VisibilityController {
    fn thread_activated(&self, thread_id: &ThreadId) {
        if self.open() {
            debug!(%thread_id, "opened chat for activated thread");
        }
    }
}

/// Teardown handle for [`VisibilityController::mount`]
#[must_use = "dropping the guard unmounts the shortcut listener"]
pub struct MountGuard {
    _listener: ListenerGuard,
    mounted: Arc<AtomicBool>,
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        self.mounted.store(false, Ordering::Release);
    }
}
