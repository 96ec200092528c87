//! Editor Session Controller
//!
//! One "customize layout" session: it feeds pointer batches to the gesture
//! engine, folds the resulting element changes into live settings, publishes
//! them to the host for re-rendering, and persists them when the user is
//! done. Screen rotation is locked while a session is open and the prior
//! mode is restored when it ends, including when the session is dropped.

use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::bounds::BoundsRegistry;
use crate::config::store::SettingsStore;
use crate::geometry::Rect;
use crate::gesture::{EditorFrame, GestureConfig, GestureEngine, GesturePhase, PointerBatch};
use crate::types::{ElementChange, ElementId, LayoutKey, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationMode {
    /// Follows the device (or window) freely
    Unlocked,
    Locked,
}

/// Exclusive screen state a session suspends while it is open
pub trait RotationControl {
    fn rotation_mode(&self) -> RotationMode;
    fn set_rotation_mode(&mut self, mode: RotationMode);
}

/// What the host renders: the folded settings plus the highlighted element
#[derive(Debug, Clone, PartialEq)]
pub struct LiveLayout {
    pub settings: Settings,
    pub active_element: Option<ElementId>,
}

/// Emitted by the done/reset controls outside the gesture engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// Persist the live settings, then close
    Save,
    /// Close without persisting; the initial settings are restored
    Close,
    /// Revert everything to defaults and keep editing
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Editing,
    Closed { saved: bool },
}

pub struct EditorSession {
    key: LayoutKey,
    engine: GestureEngine,
    initial: Settings,
    live: Settings,
    publisher: watch::Sender<LiveLayout>,
    store: Arc<dyn SettingsStore>,
    rotation: Box<dyn RotationControl>,
    /// Mode to restore on close; `None` once the session has ended
    prior_rotation: Option<RotationMode>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("key", &self.key)
            .field("phase", &self.engine.phase())
            .field("open", &self.is_open())
            .finish()
    }
}

impl EditorSession {
    /// Open a session over already-loaded settings.
    pub fn begin(
        key: LayoutKey,
        settings: Settings,
        store: Arc<dyn SettingsStore>,
        mut rotation: Box<dyn RotationControl>,
        gesture: GestureConfig,
    ) -> Self {
        let prior = rotation.rotation_mode();
        rotation.set_rotation_mode(RotationMode::Locked);

        let (publisher, _) = watch::channel(LiveLayout {
            settings: settings.clone(),
            active_element: None,
        });

        info!(layout = %key, elements = settings.elements.len(), ?prior, "Layout editing session started");
        Self {
            key,
            engine: GestureEngine::new(gesture),
            initial: settings.clone(),
            live: settings,
            publisher,
            store,
            rotation,
            prior_rotation: Some(prior),
        }
    }

    /// Load the stored settings for `key`, then open a session over them.
    pub fn load(
        key: LayoutKey,
        element_ids: &[ElementId],
        store: Arc<dyn SettingsStore>,
        rotation: Box<dyn RotationControl>,
        gesture: GestureConfig,
    ) -> Result<Self> {
        let settings = store
            .retrieve(&key, element_ids)
            .with_context(|| format!("Failed to load settings for {key}"))?;
        Ok(Self::begin(key, settings, store, rotation, gesture))
    }

    pub fn key(&self) -> &LayoutKey {
        &self.key
    }

    pub fn settings(&self) -> &Settings {
        &self.live
    }

    pub fn is_open(&self) -> bool {
        self.prior_rotation.is_some()
    }

    pub fn phase(&self) -> GesturePhase {
        self.engine.phase()
    }

    pub fn active_element(&self) -> Option<&ElementId> {
        self.engine.active_element()
    }

    /// Live layout updates; the receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<LiveLayout> {
        self.publisher.subscribe()
    }

    /// Give the engine first refusal on a pointer batch.
    ///
    /// Changes consumed here must not be delivered to the application.
    pub fn handle_pointer(
        &mut self,
        batch: &mut PointerBatch,
        bounds: &BoundsRegistry,
        surface: Rect,
        pass_through: &[Rect],
    ) -> Option<ElementChange> {
        if !self.is_open() {
            return None;
        }

        let before = self.engine.active_element().cloned();
        let frame = EditorFrame {
            settings: &self.live,
            bounds,
            surface,
            pass_through,
        };
        let change = self.engine.on_pointer_event(batch, &frame);

        match &change {
            Some(change) => self.apply(change),
            None if self.engine.active_element() != before.as_ref() => self.publish(),
            None => {}
        }
        change
    }

    /// Fold one element change into the live settings and publish it.
    pub fn apply(&mut self, change: &ElementChange) {
        self.live.apply(change);
        self.publish();
    }

    pub fn signal(&mut self, signal: SessionSignal) -> Result<SessionStatus> {
        if !self.is_open() {
            bail!("Editing session for {} is already closed", self.key);
        }

        match signal {
            SessionSignal::Reset => {
                // A finger still down keeps being consumed until it lifts.
                self.engine.block_until_release();
                self.live = self.live.reset();
                self.publish();
                info!(layout = %self.key, "Layout reset to defaults");
                Ok(SessionStatus::Editing)
            }
            SessionSignal::Close => {
                self.live = self.initial.clone();
                self.end();
                self.publish();
                info!(layout = %self.key, "Layout editing closed without saving");
                Ok(SessionStatus::Closed { saved: false })
            }
            SessionSignal::Save => {
                // On failure the session stays open with its edits intact.
                self.store
                    .store(&self.key, &self.live)
                    .with_context(|| format!("Failed to save layout for {}", self.key))?;
                self.initial = self.live.clone();
                self.end();
                self.publish();
                info!(layout = %self.key, "Layout saved");
                Ok(SessionStatus::Closed { saved: true })
            }
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(LiveLayout {
            settings: self.live.clone(),
            active_element: self.engine.active_element().cloned(),
        });
    }

    fn end(&mut self) {
        self.engine.reset();
        if let Some(prior) = self.prior_rotation.take() {
            self.rotation.set_rotation_mode(prior);
            debug!(layout = %self.key, ?prior, "Restored rotation mode");
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        if self.is_open() {
            warn!(layout = %self.key, "Editing session dropped while open, discarding edits");
            self.end();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemoryPreferences, PreferenceBackend, PreferencesStore};
    use crate::geometry::{Insets, Point, Size, Vector};
    use crate::gesture::{PointerChange, PointerId};
    use crate::layout::LayoutResolver;
    use crate::layout::controller::{ClusterSpec, ControllerLayout, SecondarySpec, Side};
    use crate::types::{ControllerId, ElementSettings, Orientation};
    use approx::assert_abs_diff_eq;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SURFACE: Rect = Rect::new(0.0, 0.0, 1000.0, 500.0);

    #[derive(Clone)]
    struct SharedRotation(Arc<Mutex<Vec<RotationMode>>>);

    impl SharedRotation {
        fn new(initial: RotationMode) -> Self {
            Self(Arc::new(Mutex::new(vec![initial])))
        }

        fn history(&self) -> Vec<RotationMode> {
            self.0.lock().unwrap().clone()
        }
    }

    impl RotationControl for SharedRotation {
        fn rotation_mode(&self) -> RotationMode {
            *self.0.lock().unwrap().last().unwrap()
        }

        fn set_rotation_mode(&mut self, mode: RotationMode) {
            self.0.lock().unwrap().push(mode);
        }
    }

    /// Fails the first `failures` writes, then delegates
    struct FlakyStore {
        inner: PreferencesStore<MemoryPreferences>,
        failures: AtomicUsize,
    }

    impl SettingsStore for FlakyStore {
        fn retrieve(&self, key: &LayoutKey, element_ids: &[ElementId]) -> Result<Settings> {
            self.inner.retrieve(key, element_ids)
        }

        fn store(&self, key: &LayoutKey, settings: &Settings) -> Result<()> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                bail!("storage unavailable");
            }
            self.inner.store(key, settings)
        }
    }

    fn key() -> LayoutKey {
        LayoutKey::new(ControllerId::new("demo"), Orientation::Landscape)
    }

    fn memory_store() -> Arc<PreferencesStore<MemoryPreferences>> {
        Arc::new(PreferencesStore::new(MemoryPreferences::default()))
    }

    fn stored_settings() -> Settings {
        let mut settings = Settings::default();
        settings
            .elements
            .insert("left_primary".into(), ElementSettings::new(0.5, 0.5, 1.0));
        settings
            .elements
            .insert("right_primary".into(), ElementSettings::default());
        settings
    }

    fn bounds() -> BoundsRegistry {
        let mut registry = BoundsRegistry::new();
        registry.report("left_primary", Rect::from_center_size(Point::new(500.0, 250.0), Size::new(80.0, 80.0)));
        registry
    }

    fn drag_left_primary(session: &mut EditorSession, registry: &BoundsRegistry) {
        let start = Point::new(500.0, 250.0);
        let end = Point::new(600.0, 250.0);
        let mut down = PointerBatch::new(vec![PointerChange::down(PointerId(1), start)]);
        session.handle_pointer(&mut down, registry, SURFACE, &[]);
        let mut moved = PointerBatch::new(vec![PointerChange::moved(PointerId(1), start, end)]);
        session.handle_pointer(&mut moved, registry, SURFACE, &[]);
        let mut up = PointerBatch::new(vec![PointerChange::up(PointerId(1), end)]);
        session.handle_pointer(&mut up, registry, SURFACE, &[]);
    }

    #[test]
    fn test_begin_locks_and_close_restores_rotation() {
        let rotation = SharedRotation::new(RotationMode::Unlocked);
        let mut session = EditorSession::begin(
            key(),
            stored_settings(),
            memory_store(),
            Box::new(rotation.clone()),
            GestureConfig::default(),
        );
        assert_eq!(rotation.rotation_mode(), RotationMode::Locked);

        let status = session.signal(SessionSignal::Close).unwrap();
        assert_eq!(status, SessionStatus::Closed { saved: false });
        assert_eq!(
            rotation.history(),
            [RotationMode::Unlocked, RotationMode::Locked, RotationMode::Unlocked]
        );
        assert!(session.signal(SessionSignal::Save).is_err());
    }

    #[test]
    fn test_drop_while_open_restores_rotation() {
        let rotation = SharedRotation::new(RotationMode::Unlocked);
        {
            let _session = EditorSession::begin(
                key(),
                Settings::default(),
                memory_store(),
                Box::new(rotation.clone()),
                GestureConfig::default(),
            );
        }
        assert_eq!(rotation.rotation_mode(), RotationMode::Unlocked);
    }

    #[test]
    fn test_drag_publishes_live_settings() {
        let mut session = EditorSession::begin(
            key(),
            stored_settings(),
            memory_store(),
            Box::new(SharedRotation::new(RotationMode::Unlocked)),
            GestureConfig::default(),
        );
        let mut live = session.subscribe();
        let registry = bounds();

        let mut down = PointerBatch::new(vec![PointerChange::down(PointerId(1), Point::new(500.0, 250.0))]);
        session.handle_pointer(&mut down, &registry, SURFACE, &[]);
        assert!(live.has_changed().unwrap());
        assert_eq!(
            live.borrow_and_update().active_element,
            Some(ElementId::from("left_primary"))
        );

        let mut moved = PointerBatch::new(vec![PointerChange::moved(
            PointerId(1),
            Point::new(500.0, 250.0),
            Point::new(600.0, 250.0),
        )]);
        let change = session.handle_pointer(&mut moved, &registry, SURFACE, &[]);
        assert_eq!(change.map(|c| c.id), Some(ElementId::from("left_primary")));
        assert!(moved.unconsumed().next().is_none());
        assert_abs_diff_eq!(live.borrow_and_update().settings.element("left_primary").x, 0.6);

        let mut up = PointerBatch::new(vec![PointerChange::up(PointerId(1), Point::new(600.0, 250.0))]);
        session.handle_pointer(&mut up, &registry, SURFACE, &[]);
        assert_eq!(live.borrow().active_element, None);
    }

    #[test]
    fn test_reset_reverts_everything_before_persisting() {
        let store = memory_store();
        let mut initial = stored_settings();
        initial.opacity = 0.4;
        initial.margin_x = 0.7;
        let mut session = EditorSession::begin(
            key(),
            initial,
            store.clone(),
            Box::new(SharedRotation::new(RotationMode::Unlocked)),
            GestureConfig::default(),
        );
        let live = session.subscribe();

        drag_left_primary(&mut session, &bounds());
        let status = session.signal(SessionSignal::Reset).unwrap();

        assert_eq!(status, SessionStatus::Editing);
        let published = live.borrow().settings.clone();
        assert_eq!(published.opacity, 1.0);
        assert_eq!(published.scale, 0.5);
        assert_eq!(published.margin_x, 0.0);
        assert_eq!(published.elements.len(), 2);
        assert!(published.elements.values().all(|e| *e == ElementSettings::default()));
        // nothing written yet
        assert!(store.backend().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_reset_mid_drag_keeps_consuming_held_contact() {
        let mut session = EditorSession::begin(
            key(),
            stored_settings(),
            memory_store(),
            Box::new(SharedRotation::new(RotationMode::Unlocked)),
            GestureConfig::default(),
        );
        let registry = bounds();
        let start = Point::new(500.0, 250.0);
        let mid = Point::new(550.0, 250.0);

        let mut down = PointerBatch::new(vec![PointerChange::down(PointerId(1), start)]);
        session.handle_pointer(&mut down, &registry, SURFACE, &[]);
        let mut moved = PointerBatch::new(vec![PointerChange::moved(PointerId(1), start, mid)]);
        session.handle_pointer(&mut moved, &registry, SURFACE, &[]);

        session.signal(SessionSignal::Reset).unwrap();
        assert_eq!(session.phase(), GesturePhase::BlockingPassthrough);
        assert_eq!(session.active_element(), None);

        let mut held = PointerBatch::new(vec![PointerChange::moved(
            PointerId(1),
            mid,
            Point::new(600.0, 250.0),
        )]);
        assert_eq!(session.handle_pointer(&mut held, &registry, SURFACE, &[]), None);
        assert_eq!(held.unconsumed().count(), 0);
        assert!(session.settings().element("left_primary").is_unset());

        let mut up = PointerBatch::new(vec![PointerChange::up(PointerId(1), Point::new(600.0, 250.0))]);
        session.handle_pointer(&mut up, &registry, SURFACE, &[]);
        assert_eq!(up.unconsumed().count(), 0);
        assert_eq!(session.phase(), GesturePhase::Idle);

        // the next fresh press is arbitrated normally
        let mut again = PointerBatch::new(vec![PointerChange::down(PointerId(2), start)]);
        session.handle_pointer(&mut again, &registry, SURFACE, &[]);
        assert_eq!(session.active_element(), Some(&ElementId::from("left_primary")));
    }

    #[test]
    fn test_close_republishes_initial_settings() {
        let store = memory_store();
        let mut session = EditorSession::begin(
            key(),
            stored_settings(),
            store.clone(),
            Box::new(SharedRotation::new(RotationMode::Unlocked)),
            GestureConfig::default(),
        );
        let live = session.subscribe();

        drag_left_primary(&mut session, &bounds());
        session.signal(SessionSignal::Close).unwrap();

        assert_eq!(live.borrow().settings, stored_settings());
        assert!(store.backend().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_failed_save_keeps_session_open_for_retry() {
        let store = Arc::new(FlakyStore {
            inner: PreferencesStore::new(MemoryPreferences::default()),
            failures: AtomicUsize::new(1),
        });
        let rotation = SharedRotation::new(RotationMode::Unlocked);
        let mut session = EditorSession::begin(
            key(),
            stored_settings(),
            store.clone(),
            Box::new(rotation.clone()),
            GestureConfig::default(),
        );
        drag_left_primary(&mut session, &bounds());

        let err = session.signal(SessionSignal::Save).unwrap_err();
        assert!(format!("{err:#}").contains("storage unavailable"));
        assert!(session.is_open());
        assert_eq!(rotation.rotation_mode(), RotationMode::Locked);
        assert_abs_diff_eq!(session.settings().element("left_primary").x, 0.6);

        let status = session.signal(SessionSignal::Save).unwrap();
        assert_eq!(status, SessionStatus::Closed { saved: true });
        assert_eq!(rotation.rotation_mode(), RotationMode::Unlocked);

        let reloaded = store
            .retrieve(&key(), &[ElementId::from("left_primary")])
            .unwrap();
        assert_abs_diff_eq!(reloaded.element("left_primary").x, 0.6);
    }

    #[test]
    fn test_load_reads_store_first() {
        let store = memory_store();
        store.store(&key(), &stored_settings()).unwrap();

        let session = EditorSession::load(
            key(),
            &[ElementId::from("left_primary")],
            store,
            Box::new(SharedRotation::new(RotationMode::Unlocked)),
            GestureConfig::default(),
        )
        .unwrap();
        assert_eq!(session.settings().element("left_primary"), ElementSettings::new(0.5, 0.5, 1.0));
    }

    #[test]
    fn test_pass_through_press_reaches_host() {
        let mut session = EditorSession::begin(
            key(),
            stored_settings(),
            memory_store(),
            Box::new(SharedRotation::new(RotationMode::Unlocked)),
            GestureConfig::default(),
        );
        let done_button = Rect::new(480.0, 230.0, 40.0, 40.0);
        let mut down = PointerBatch::new(vec![PointerChange::down(PointerId(1), Point::new(500.0, 250.0))]);

        let change = session.handle_pointer(&mut down, &bounds(), SURFACE, &[done_button]);
        assert_eq!(change, None);
        assert_eq!(down.unconsumed().count(), 1);
        assert_eq!(session.phase(), GesturePhase::Idle);
    }

    #[test]
    fn test_first_grab_does_not_move_default_element() {
        let controller = ControllerLayout {
            id: ControllerId::new("demo"),
            clusters: vec![ClusterSpec {
                side: Side::Left,
                primary_size: 160.0,
                base_rotation: 0.0,
                secondaries: vec![SecondarySpec { degrees: 30.0, size: 60.0 }],
            }],
            floating: Vec::new(),
        };
        let resolver = LayoutResolver::default();
        let mut session = EditorSession::begin(
            key(),
            Settings::default(),
            memory_store(),
            Box::new(SharedRotation::new(RotationMode::Unlocked)),
            GestureConfig::default(),
        );

        let before = resolver.resolve(&controller, session.settings(), Orientation::Landscape, SURFACE, Insets::default());
        let mut registry = BoundsRegistry::new();
        for placement in &before {
            registry.report(placement.id.clone(), placement.rect);
        }

        // grab the orbiting secondary and hold still
        let grab = before[1].center;
        let mut down = PointerBatch::new(vec![PointerChange::down(PointerId(1), grab)]);
        session.handle_pointer(&mut down, &registry, SURFACE, &[]);
        let mut hold = PointerBatch::new(vec![PointerChange::moved(PointerId(1), grab, grab + Vector::ZERO)]);
        let change = session.handle_pointer(&mut hold, &registry, SURFACE, &[]);
        assert_eq!(change.map(|c| c.id), Some(ElementId::from("left_secondary_0")));

        let after = resolver.resolve(&controller, session.settings(), Orientation::Landscape, SURFACE, Insets::default());
        assert!(after[1].customized);
        assert_abs_diff_eq!(after[1].center.x, before[1].center.x, epsilon = 1e-3);
        assert_abs_diff_eq!(after[1].center.y, before[1].center.y, epsilon = 1e-3);
    }
}
