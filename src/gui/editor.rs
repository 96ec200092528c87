//! Desktop layout editor implemented with egui/eframe
//!
//! Renders a built-in controller over a stand-in game area. "Customize" opens an
//! editing session: the engine gets first refusal on every pointer batch,
//! and only presses it leaves unconsumed reach the game area, which counts
//! them so any leak is visible. Window resizing stands in for screen
//! rotation and is locked while a session is open.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use eframe::{CreationContext, NativeOptions, egui};
use tokio::sync::watch;
use tracing::{error, info, warn};

use touch_layout::bounds::BoundsRegistry;
use touch_layout::config::{EditorConfig, SettingsStore};
use touch_layout::geometry::{Insets, Rect};
use touch_layout::layout::controller::ControllerLayout;
use touch_layout::layout::{GlobalTransform, LayoutResolver, Placement};
use touch_layout::persistence::BackgroundStore;
use touch_layout::session::{
    EditorSession, LiveLayout, RotationControl, RotationMode, SessionSignal, SessionStatus,
};
use touch_layout::types::{ControllerId, ElementId, LayoutKey, Orientation, Settings};

use super::constants::*;
use super::input::PointerTracker;

/// Window resizability as the desktop analog of screen rotation
struct WindowLock {
    ctx: egui::Context,
    mode: RotationMode,
}

impl RotationControl for WindowLock {
    fn rotation_mode(&self) -> RotationMode {
        self.mode
    }

    fn set_rotation_mode(&mut self, mode: RotationMode) {
        self.mode = mode;
        self.ctx
            .send_viewport_cmd(egui::ViewportCommand::Resizable(mode == RotationMode::Unlocked));
    }
}

struct StatusMessage {
    text: String,
    color: egui::Color32,
}

struct EditorApp {
    config: EditorConfig,
    resolver: LayoutResolver,
    controller: ControllerLayout,
    store: Arc<BackgroundStore>,
    key: LayoutKey,
    /// Settings shown while no session is open
    settings: Settings,
    bounds: BoundsRegistry,
    tracker: PointerTracker,
    session: Option<EditorSession>,
    live: Option<watch::Receiver<LiveLayout>>,
    /// Done/Reset/Cancel controls from the previous frame
    pass_through: Vec<Rect>,
    game_presses: usize,
    status_message: Option<StatusMessage>,
}

impl EditorApp {
    fn new(
        _cc: &CreationContext<'_>,
        config: EditorConfig,
        store: Arc<BackgroundStore>,
        controller_id: ControllerId,
    ) -> Self {
        info!(controller = %controller_id, "Initializing layout editor");
        let controller = ControllerLayout::builtin(controller_id.clone());
        let mut app = Self {
            resolver: LayoutResolver::new(config.layout.clone()),
            config,
            controller,
            store,
            key: LayoutKey::new(controller_id, Orientation::Landscape),
            settings: Settings::default(),
            bounds: BoundsRegistry::new(),
            tracker: PointerTracker::default(),
            session: None,
            live: None,
            pass_through: Vec::new(),
            game_presses: 0,
            status_message: None,
        };
        app.load_settings(Orientation::Landscape);
        app
    }

    fn load_settings(&mut self, orientation: Orientation) {
        self.key = LayoutKey::new(self.controller.id.clone(), orientation);
        match self.store.retrieve(&self.key, &self.controller.element_ids()) {
            Ok(settings) => {
                info!(layout = %self.key, "Loaded layout");
                self.settings = settings;
            }
            Err(err) => {
                error!(layout = %self.key, error = ?err, "Failed to load layout");
                self.settings = Settings::default();
                self.status_message = Some(StatusMessage {
                    text: format!("Failed to load layout: {err:#}"),
                    color: STATUS_ERROR,
                });
            }
        }
    }

    fn start_session(&mut self, ctx: &egui::Context) {
        if self.session.is_some() {
            return;
        }
        let store: Arc<dyn SettingsStore> = self.store.clone();
        let lock = WindowLock {
            ctx: ctx.clone(),
            mode: RotationMode::Unlocked,
        };
        let session = EditorSession::begin(
            self.key.clone(),
            self.settings.clone(),
            store,
            Box::new(lock),
            self.config.gesture.clone(),
        );
        self.live = Some(session.subscribe());
        self.session = Some(session);
        self.status_message = Some(StatusMessage {
            text: "Drag to move, pinch or scroll to resize".to_string(),
            color: STATUS_EDITING,
        });
    }

    fn send_signal(&mut self, signal: SessionSignal) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.signal(signal) {
            Ok(SessionStatus::Editing) => {}
            Ok(SessionStatus::Closed { saved }) => {
                self.settings = session.settings().clone();
                self.session = None;
                self.live = None;
                self.status_message = Some(StatusMessage {
                    text: if saved { "Layout saved" } else { "Changes discarded" }.to_string(),
                    color: STATUS_OK,
                });
            }
            Err(err) => {
                error!(error = ?err, "Session signal failed");
                self.status_message = Some(StatusMessage {
                    text: format!("{err:#}"),
                    color: STATUS_ERROR,
                });
            }
        }
    }

    fn poll_store_failures(&mut self) {
        for failure in self.store.take_failures() {
            warn!(layout = %failure.key, error = %failure.error, "Layout was not saved");
            self.status_message = Some(StatusMessage {
                text: format!("Saving {} failed: {}", failure.key, failure.error),
                color: STATUS_ERROR,
            });
        }
    }

    fn current_layout(&self) -> (Settings, Option<ElementId>) {
        match &self.live {
            Some(live) => {
                let live = live.borrow();
                (live.settings.clone(), live.active_element.clone())
            }
            None => (self.settings.clone(), None),
        }
    }

    fn report_bounds(&mut self, placements: &[Placement]) {
        let rendered: HashSet<ElementId> = placements.iter().map(|p| p.id.clone()).collect();
        self.bounds.retain_rendered(&rendered);
        for placement in placements {
            self.bounds.report(placement.id.clone(), placement.rect);
        }
    }

    fn handle_input(&mut self, ctx: &egui::Context, surface: Rect) {
        let (events, zoom_delta) = ctx.input(|i| (i.events.clone(), i.zoom_delta()));
        let Some(mut batch) = self.tracker.translate(&events, zoom_delta) else {
            return;
        };

        if let Some(session) = self.session.as_mut() {
            session.handle_pointer(&mut batch, &self.bounds, surface, &self.pass_through);
        }

        let leaked = batch
            .unconsumed()
            .filter(|change| change.changed_to_down())
            .filter(|change| !self.pass_through.iter().any(|r| r.contains(change.position)))
            .count();
        self.game_presses += leaked;
    }

    fn draw_elements(
        &self,
        painter: &egui::Painter,
        placements: &[Placement],
        transform: &GlobalTransform,
        active: Option<&ElementId>,
    ) {
        for placement in placements {
            let center = egui::pos2(placement.center.x, placement.center.y);
            let radius = placement.rect.width / 2.0;
            let fill = if placement.customized {
                ELEMENT_CUSTOMIZED
            } else {
                ELEMENT_FILL
            };
            painter.circle_filled(center, radius, fill.gamma_multiply(transform.opacity));
            if active == Some(&placement.id) {
                painter.circle_stroke(center, radius, egui::Stroke::new(HIGHLIGHT_STROKE, ELEMENT_ACTIVE));
            }
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                placement.id.as_str(),
                egui::FontId::proportional(LABEL_FONT_SIZE),
                ELEMENT_LABEL,
            );
        }
    }

    fn controls(&mut self, ctx: &egui::Context) {
        let editing = self.session.is_some();
        let mut signal = None;
        let mut start = false;

        let response = egui::Area::new(egui::Id::new("editor_controls"))
            .anchor(egui::Align2::CENTER_TOP, [0.0, PADDING])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.spacing_mut().item_spacing.x = ITEM_SPACING;
                    if editing {
                        if ui.button("Done").clicked() {
                            signal = Some(SessionSignal::Save);
                        }
                        if ui.button("Reset").clicked() {
                            signal = Some(SessionSignal::Reset);
                        }
                        if ui.button("Cancel").clicked() {
                            signal = Some(SessionSignal::Close);
                        }
                    } else if ui.button("Customize layout").clicked() {
                        start = true;
                    }
                });
                if let Some(message) = &self.status_message {
                    ui.colored_label(message.color, &message.text);
                }
            });

        let rect = response.response.rect;
        self.pass_through = vec![Rect::new(rect.min.x, rect.min.y, rect.width(), rect.height())];

        if start {
            self.start_session(ctx);
        }
        if let Some(signal) = signal {
            self.send_signal(signal);
        }
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_store_failures();

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(GAME_BACKGROUND))
            .show(ctx, |ui| {
                let area = ui.max_rect();
                let surface = LayoutResolver::safe_area(
                    Rect::new(area.min.x, area.min.y, area.width(), area.height()),
                    Insets::default(),
                );

                let orientation = Orientation::from_dimensions(surface.width, surface.height);
                if self.session.is_none() && orientation != self.key.orientation {
                    info!(from = %self.key.orientation, to = %orientation, "Orientation changed");
                    self.load_settings(orientation);
                }

                self.handle_input(ctx, surface);

                let (settings, active) = self.current_layout();
                let placements = self.resolver.resolve(
                    &self.controller,
                    &settings,
                    self.key.orientation,
                    surface,
                    Insets::default(),
                );
                self.report_bounds(&placements);

                let painter = ui.painter();
                painter.text(
                    area.center_bottom() - egui::vec2(0.0, PADDING),
                    egui::Align2::CENTER_BOTTOM,
                    format!("{} presses reached the game", self.game_presses),
                    egui::FontId::proportional(LABEL_FONT_SIZE),
                    GAME_TEXT,
                );
                let transform = GlobalTransform::from_settings(&settings);
                self.draw_elements(painter, &placements, &transform, active.as_ref());
            });

        self.controls(ctx);

        if self.session.is_some() {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.session.take().is_some() {
            warn!("Editor closed with an open session, discarding edits");
        }
        self.store.flush();
        info!("Editor exiting");
    }
}

pub fn run_editor(
    config: EditorConfig,
    store: Arc<BackgroundStore>,
    controller: ControllerId,
) -> Result<()> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title("Touch Layout Editor"),
        ..Default::default()
    };

    eframe::run_native(
        "Touch Layout Editor",
        options,
        Box::new(|cc| Ok(Box::new(EditorApp::new(cc, config, store, controller)))),
    )
    .map_err(|err| anyhow!("Failed to launch layout editor: {err}"))
}
