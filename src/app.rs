//! Main application state and egui integration.

use std::time::{Duration, Instant};

use eframe::egui;

use timewalk::assets::{AssetLoader, AssetPaths};
use timewalk::audio::AudioEngine;
use timewalk::game::{CompletionSet, RewardPools, TimelineConfig};
use timewalk::geo::GeoPosition;
use timewalk::input::{ControlMode, ControlState, GeoWatcher, ReplayProvider};
use timewalk::map::{MapOptions, MapTransform, StyleVariant, TileFetcher};
use timewalk::storage::{self, KvStore, Settings};
use timewalk::ui::screens::{
    InfoScreen, MapAction, MapViewScreen, ModelSelectAction, ModelSelectScreen, Overlay,
    SettingsAction, SettingsScreen, TimelineAction, TimelineScreen,
};
use timewalk::ui::theme;
use timewalk::world::avatar::{builtin_models, PlayerModel};
use timewalk::world::markers::builtin_markers;
use timewalk::world::World;

/// Where the player first spawns when no position was ever persisted.
fn default_start() -> GeoPosition {
    GeoPosition::new(9.142202119898826, 49.97692244755174)
}

/// How often the celestial light is refreshed.
const SUN_UPDATE_INTERVAL: Duration = Duration::from_secs(10);

/// Main application state.
pub struct TimewalkApp {
    settings: Settings,
    store: KvStore,
    progress: CompletionSet,
    control: ControlState,
    transform: MapTransform,
    world: World,
    overlay: Overlay,
    map_screen: MapViewScreen,
    settings_screen: Option<SettingsScreen>,
    model_screen: ModelSelectScreen,
    timeline_screen: TimelineScreen,
    timeline_config: TimelineConfig,
    pools: RewardPools,
    audio: Option<AudioEngine>,
    loader: AssetLoader,
    fetcher: TileFetcher,
    geo: GeoWatcher,
    paths: AssetPaths,
    avatar_preview: Option<egui::TextureHandle>,
    gps_notice_open: bool,
    restart_required: bool,
    last_frame: Instant,
    last_command: Instant,
    last_sun_update: Option<Instant>,
    // The runtime must outlive every spawned load and fetch
    _runtime: tokio::runtime::Runtime,
}

impl TimewalkApp {
    /// Create a new application instance.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(theme::visuals());

        let settings = storage::load_settings().unwrap_or_else(|e| {
            tracing::warn!("settings unreadable, using defaults: {}", e);
            Settings::default()
        });

        let store = KvStore::open(storage::config::get_data_dir().join("state"))
            .unwrap_or_else(|e| {
                tracing::warn!("state dir unavailable ({}), using working directory", e);
                KvStore::open("state").expect("cannot create any state directory")
            });

        // Malformed persisted state falls back to defaults, never crashes.
        let target = store.get_or("position", default_start());
        let mut progress = store.get_or("completed", CompletionSet::default());

        let markers = builtin_markers();
        let known: Vec<&str> = markers.iter().map(|m| m.name.as_str()).collect();
        progress.retain_known(&known);

        let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
        let paths = AssetPaths::new("assets");
        let loader = AssetLoader::new(runtime.handle().clone(), paths.clone());
        let fetcher = TileFetcher::new(runtime.handle().clone(), settings.api_key.clone());

        let style = StyleVariant::from_enable_3d(settings.enable_3d);
        tracing::info!("map style: {}", style.style_url(&settings.api_key));

        let audio = match AudioEngine::new(settings.audio.clone()) {
            Ok(engine) => Some(engine),
            Err(e) => {
                tracing::warn!("audio disabled: {}", e);
                None
            }
        };

        // Desktop builds have no live positioning source; the replay
        // provider errors immediately and the touch fallback takes over.
        let mut provider = ReplayProvider::unavailable();
        let geo = GeoWatcher::new(&mut provider);

        let control = ControlState::new(settings.force_touch_control);

        // Resume the persisted avatar; first launch forces the selection
        // grid open instead.
        let persisted_model = settings
            .model
            .as_deref()
            .and_then(|name| builtin_models().into_iter().find(|m| m.name == name));
        let overlay = if persisted_model.is_some() {
            Overlay::None
        } else {
            Overlay::ModelSelect { can_close: false }
        };

        let model = persisted_model
            .clone()
            .unwrap_or_else(|| builtin_models().remove(0));

        let mut loader = loader;
        if let Some(model) = persisted_model {
            loader.request_model(model);
        }

        let transform = MapTransform::new(target, &MapOptions::default(), 1280.0, 800.0);
        let world = World::new(markers, model, target);
        // The GPU overlay attaches via World::init_renderer once the
        // embedding layer hands over a compatible device and queue; until
        // then the map view paints the 2D stand-ins.

        Self {
            settings,
            store,
            progress,
            control,
            transform,
            world,
            overlay,
            map_screen: MapViewScreen::new(),
            settings_screen: None,
            model_screen: ModelSelectScreen::new(),
            timeline_screen: TimelineScreen::new(),
            timeline_config: TimelineConfig::default(),
            pools: RewardPools::default(),
            audio,
            loader,
            fetcher,
            geo,
            paths,
            avatar_preview: None,
            gps_notice_open: false,
            restart_required: false,
            last_frame: Instant::now(),
            last_command: Instant::now(),
            last_sun_update: None,
            _runtime: runtime,
        }
    }

    /// Persist a key, warning instead of failing: persistence is
    /// fire-and-forget, last write wins.
    fn persist<T: serde::Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.store.put(key, value) {
            tracing::warn!("persist failed: {}", e);
        }
    }

    fn save_settings(&self) {
        if let Err(e) = storage::save_settings(&self.settings) {
            tracing::warn!("saving settings failed: {}", e);
        }
    }

    /// Route a navigation command through the world and persist the target.
    fn navigate_to(&mut self, target: GeoPosition) {
        let gap = self.last_command.elapsed().as_secs_f64();
        self.last_command = Instant::now();
        self.world.set_target(&self.transform, target, gap);
        self.persist("position", &target);
    }

    /// Pump geolocation; an error flips control to touch for the session.
    fn process_geolocation(&mut self) {
        let latest = self.geo.poll_latest();

        if self.geo.error().is_some() && !self.control.gps_failed() {
            self.control.mark_gps_failed();
            if !self.settings.gps_notice_dismissed {
                self.gps_notice_open = true;
            }
        }

        if let Some(position) = latest {
            if self.control.mode() == ControlMode::Gps {
                self.navigate_to(position);
            }
        }
    }

    /// Splice a finished avatar load into the scene.
    fn process_model_loads(&mut self, ctx: &egui::Context) {
        let Some(result) = self.loader.poll() else {
            return;
        };
        self.model_screen.load_finished();

        match result {
            Ok(loaded) => {
                tracing::info!("avatar model '{}' ready", loaded.model.name);

                self.settings.model = Some(loaded.model.name.clone());
                self.save_settings();

                self.avatar_preview = {
                    let path = self.paths.model_preview(&loaded.model.asset_path);
                    timewalk::assets::load_image(&path).ok().map(|image| {
                        let size = [image.width() as usize, image.height() as usize];
                        let color =
                            egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                        ctx.load_texture("avatar-preview", color, egui::TextureOptions::LINEAR)
                    })
                };

                self.world.set_avatar_mesh(loaded.meshes);
                self.world.avatar = timewalk::world::avatar::Avatar::new(loaded.model);

                if matches!(self.overlay, Overlay::ModelSelect { .. }) {
                    self.overlay = Overlay::None;
                }
            }
            Err(e) => {
                tracing::error!("avatar model failed to load: {}", e);
            }
        }
    }

    /// Low-frequency sun tracking.
    fn update_sun(&mut self) {
        let due = self
            .last_sun_update
            .map_or(true, |t| t.elapsed() >= SUN_UPDATE_INTERVAL);
        if due {
            self.last_sun_update = Some(Instant::now());
            self.world
                .sun
                .update_position(chrono::Utc::now(), &self.transform.center());
        }
    }

    fn show_gps_notice(&mut self, ctx: &egui::Context) {
        if !self.gps_notice_open {
            return;
        }

        let mut dismissed = false;
        egui::Window::new("No location source")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_TOP, [0.0, 40.0])
            .show(ctx, |ui| {
                ui.label(
                    "Your position is unavailable, so touch control is now \
                     active: tap the map to walk there.",
                );
                if ui.button("Got it").clicked() {
                    dismissed = true;
                }
            });

        if dismissed {
            self.gps_notice_open = false;
            self.settings.gps_notice_dismissed = true;
            self.save_settings();
        }
    }

    fn show_restart_note(&self, ctx: &egui::Context) {
        if !self.restart_required {
            return;
        }
        egui::Window::new("Restart required")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -20.0])
            .show(ctx, |ui| {
                ui.label("The map style changes after restarting the game.");
            });
    }
}

impl eframe::App for TimewalkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // The render loop runs continuously; the world is frame-driven.
        ctx.request_repaint();

        let dt = self.last_frame.elapsed().as_secs_f64().min(0.25);
        self.last_frame = Instant::now();

        self.process_geolocation();
        self.process_model_loads(ctx);
        self.update_sun();

        let frame_state = self.world.update(&mut self.transform, dt);

        let viewport = self.transform.viewport();
        self.world
            .render(&frame_state, viewport.x as u32, viewport.y as u32);

        let mut action = MapAction::None;
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                action = self.map_screen.show(
                    ui,
                    &mut self.transform,
                    &self.world,
                    &frame_state,
                    &mut self.fetcher,
                    self.avatar_preview.as_ref(),
                    self.control.mode() == ControlMode::Touch,
                );
            });

        // Map actions only apply with no modal overlay in the way.
        if self.overlay == Overlay::None {
            match action {
                MapAction::None => {}
                MapAction::OpenSettings => {
                    self.settings_screen = Some(SettingsScreen::new(
                        &self.settings,
                        self.control.gps_failed(),
                    ));
                    self.overlay = Overlay::Settings;
                }
                MapAction::OpenInfo => self.overlay = Overlay::Info,
                MapAction::OpenModelSelect => {
                    self.overlay = Overlay::ModelSelect { can_close: true };
                }
                MapAction::OpenTimeline => {
                    self.timeline_screen.open_browse();
                    self.overlay = Overlay::Timeline;
                }
                MapAction::TriggerMarker(index) => {
                    if let Some((marker, _)) = self.world.markers.get(index) {
                        tracing::info!("marker '{}' triggered", marker.name);
                        self.timeline_screen.begin_round(
                            marker,
                            &self.progress,
                            self.audio.as_ref(),
                            &self.paths,
                        );
                        self.overlay = Overlay::Timeline;
                    }
                }
                MapAction::Navigate(target) => self.navigate_to(target),
            }
        }

        match self.overlay {
            Overlay::None => {}
            Overlay::Settings => {
                if let Some(screen) = &mut self.settings_screen {
                    match screen.show(ctx, &self.settings, self.control.gps_failed()) {
                        SettingsAction::None => {}
                        SettingsAction::Close => {
                            self.settings_screen = None;
                            self.overlay = Overlay::None;
                        }
                        SettingsAction::SaveAndClose => {
                            let gps_failed = self.control.gps_failed();
                            if let Some(screen) = self.settings_screen.take() {
                                screen.apply(&mut self.settings, gps_failed);
                            }
                            self.control.force_touch = self.settings.force_touch_control;
                            self.save_settings();
                            self.overlay = Overlay::None;
                        }
                        SettingsAction::SaveAndRestart => {
                            let gps_failed = self.control.gps_failed();
                            if let Some(screen) = self.settings_screen.take() {
                                screen.apply(&mut self.settings, gps_failed);
                            }
                            self.control.force_touch = self.settings.force_touch_control;
                            self.save_settings();
                            self.restart_required = true;
                            self.overlay = Overlay::None;
                        }
                        SettingsAction::ResetProgress => {
                            tracing::info!("resetting all placement progress");
                            self.progress.reset();
                            let progress = self.progress.clone();
                            self.persist("completed", &progress);
                        }
                    }
                }
            }
            Overlay::Info => {
                if InfoScreen::show(ctx, &builtin_models()) {
                    self.overlay = Overlay::None;
                }
            }
            Overlay::ModelSelect { can_close } => {
                match self
                    .model_screen
                    .show(ctx, &builtin_models(), &self.paths, can_close)
                {
                    ModelSelectAction::None => {}
                    ModelSelectAction::Selected(model) => {
                        self.request_model(model);
                    }
                    ModelSelectAction::Close => self.overlay = Overlay::None,
                }
            }
            Overlay::Timeline => {
                let markers: Vec<_> = self.world.markers.markers().to_vec();
                match self.timeline_screen.show(
                    ctx,
                    &markers,
                    &self.timeline_config,
                    &mut self.progress,
                    self.audio.as_ref(),
                    &self.paths,
                    &self.pools,
                ) {
                    TimelineAction::None => {}
                    TimelineAction::Close => self.overlay = Overlay::None,
                    TimelineAction::ProgressChanged => {
                        let progress = self.progress.clone();
                        self.persist("completed", &progress);
                    }
                }
            }
        }

        self.show_gps_notice(ctx);
        self.show_restart_note(ctx);
    }
}

impl TimewalkApp {
    fn request_model(&mut self, model: PlayerModel) {
        tracing::info!("loading avatar model '{}'", model.name);
        self.loader.request_model(model);
    }
}
