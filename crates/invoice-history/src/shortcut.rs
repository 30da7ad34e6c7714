//! Global keyboard shortcut plumbing
//!
//! A [`KeyboardHub`] stands in for the window-level key event source. Views
//! attach listeners to it and get back a [`ListenerGuard`]; dropping the
//! guard detaches the listener, which is how teardown is expressed.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

use invoice_types::{Platform, ShortcutConfig, ShortcutModifier};

/// Where keyboard focus was when the key went down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    #[default]
    Page,
    /// A text-entry field: input, textarea or contenteditable
    TextInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
    pub target: FocusTarget,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.target = FocusTarget::TextInput;
        self
    }
}

/// A key plus the modifier it requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    key: String,
    modifier: ShortcutModifier,
}

impl KeyChord {
    pub fn new(key: impl Into<String>, modifier: ShortcutModifier) -> Self {
        Self {
            key: key.into().to_lowercase(),
            modifier,
        }
    }

    pub fn from_config(config: &ShortcutConfig) -> Self {
        Self::new(config.key.clone(), config.modifier)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn modifier(&self) -> ShortcutModifier {
        self.modifier
    }

    /// Key and modifiers match; shift is ignored
    pub fn matches(&self, event: &KeyEvent) -> bool {
        if !event.key.eq_ignore_ascii_case(&self.key) {
            return false;
        }
        match self.modifier {
            ShortcutModifier::CtrlOrMeta => (event.ctrl || event.meta) && !event.alt,
            ShortcutModifier::Ctrl => event.ctrl && !event.meta && !event.alt,
            ShortcutModifier::Meta => event.meta && !event.ctrl && !event.alt,
            ShortcutModifier::Alt => event.alt && !event.ctrl && !event.meta,
            ShortcutModifier::None => !event.ctrl && !event.meta && !event.alt,
        }
    }

    /// Ctrl and ⌘ chords produce no text, so they stay live inside inputs
    pub fn fires_in_text_input(&self) -> bool {
        matches!(
            self.modifier,
            ShortcutModifier::CtrlOrMeta | ShortcutModifier::Ctrl | ShortcutModifier::Meta
        )
    }

    pub fn should_fire(&self, event: &KeyEvent) -> bool {
        self.matches(event)
            && (event.target == FocusTarget::Page || self.fires_in_text_input())
    }

    pub fn label(&self, platform: Platform) -> String {
        let key = self.key.to_uppercase();
        let mac = platform == Platform::Mac;
        match self.modifier {
            ShortcutModifier::CtrlOrMeta if mac => format!("⌘{key}"),
            ShortcutModifier::CtrlOrMeta | ShortcutModifier::Ctrl => format!("Ctrl+{key}"),
            ShortcutModifier::Meta if mac => format!("⌘{key}"),
            ShortcutModifier::Meta => format!("Meta+{key}"),
            ShortcutModifier::Alt if mac => format!("⌥{key}"),
            ShortcutModifier::Alt => format!("Alt+{key}"),
            ShortcutModifier::None => key,
        }
    }
}

impl Default for KeyChord {
    fn default() -> Self {
        Self::from_config(&ShortcutConfig::default())
    }
}

pub trait KeyListener: Send + Sync {
    /// Returns true when the event was consumed
    fn handle_key(&self, event: &KeyEvent) -> bool;
}

type Listeners = Mutex<Vec<(u64, Arc<dyn KeyListener>)>>;

/// Window-level key event source
#[derive(Clone, Default)]
pub struct KeyboardHub {
    listeners: Arc<Listeners>,
    next_id: Arc<AtomicU64>,
}

impl KeyboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, listener: Arc<dyn KeyListener>) -> ListenerGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, listener));
        trace!(listener_id = id, "key listener attached");
        ListenerGuard {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver an event to every attached listener; returns how many consumed it
    pub fn dispatch(&self, event: &KeyEvent) -> usize {
        // Snapshot so listeners may attach or detach while handling
        let listeners: Vec<_> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        listeners
            .iter()
            .filter(|listener| listener.handle_key(event))
            .count()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

/// Detaches its listener when dropped
#[must_use = "dropping the guard detaches the listener immediately"]
pub struct ListenerGuard {
    id: u64,
    listeners: Weak<Listeners>,
}

impl ListenerGuard {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().retain(|(id, _)| *id != self.id);
            trace!(listener_id = self.id, "key listener detached");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Counter(AtomicUsize);

    impl KeyListener for Counter {
        fn handle_key(&self, _event: &KeyEvent) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[test]
    fn test_ctrl_or_meta_chord() {
        let chord = KeyChord::default();

        assert!(chord.matches(&KeyEvent::new("k").with_ctrl()));
        assert!(chord.matches(&KeyEvent::new("K").with_meta().with_shift()));
        assert!(!chord.matches(&KeyEvent::new("k")));
        assert!(!chord.matches(&KeyEvent::new("j").with_ctrl()));
        assert!(!chord.matches(&KeyEvent::new("k").with_ctrl().with_alt()));
    }

    #[test]
    fn test_text_input_policy() {
        let modded = KeyChord::default();
        let bare = KeyChord::new("/", ShortcutModifier::None);

        assert!(modded.should_fire(&KeyEvent::new("k").with_meta().in_text_input()));
        assert!(bare.should_fire(&KeyEvent::new("/")));
        assert!(!bare.should_fire(&KeyEvent::new("/").in_text_input()));
    }

    #[test]
    fn test_labels() {
        let chord = KeyChord::default();
        assert_eq!(chord.label(Platform::Mac), "⌘K");
        assert_eq!(chord.label(Platform::Other), "Ctrl+K");
        assert_eq!(
            KeyChord::new("j", ShortcutModifier::Alt).label(Platform::Other),
            "Alt+J"
        );
    }

    #[test]
    fn test_guard_detaches_listener() {
        let hub = KeyboardHub::new();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));

        let guard = hub.attach(counter.clone());
        assert_eq!(hub.dispatch(&KeyEvent::new("k")), 1);
        assert_eq!(hub.listener_count(), 1);

        drop(guard);
        assert_eq!(hub.dispatch(&KeyEvent::new("k")), 0);
        assert_eq!(hub.listener_count(), 0);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_outliving_hub_is_harmless() {
        let hub = KeyboardHub::new();
        let guard = hub.attach(Arc::new(Counter(AtomicUsize::new(0))));
        drop(hub);
        drop(guard);
    }
}
