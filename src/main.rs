//! RPS Arena entry point
//!
//! wasm32: canvas-2D frontend driven by requestAnimationFrame.
//! native: headless runner that plays rounds and logs the results.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_app {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement, KeyboardEvent};

    use rps_arena::audio::AudioManager;
    use rps_arena::sim::{Arena, Glow, ItemView, RoundPhase, Simulation, TypeSet, dispatch};
    use rps_arena::{Settings, VariationCatalog};

    /// Everything the page needs between frames
    struct App {
        sim: Simulation,
        settings: Settings,
        audio: AudioManager,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        hud: Option<Element>,
    }

    fn js_err(err: impl std::fmt::Display) -> JsValue {
        JsValue::from_str(&err.to_string())
    }

    fn now_secs() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now() / 1000.0)
            .unwrap_or(0.0)
    }

    impl App {
        /// Size the canvas backing store to its CSS box and return the arena in CSS pixels
        fn fit_canvas(
            canvas: &HtmlCanvasElement,
            ctx: &CanvasRenderingContext2d,
        ) -> Result<Arena, JsValue> {
            let window = web_sys::window().ok_or("no window")?;
            let dpr = window.device_pixel_ratio();
            let css_w = canvas.client_width().max(1) as f64;
            let css_h = canvas.client_height().max(1) as f64;
            canvas.set_width((css_w * dpr) as u32);
            canvas.set_height((css_h * dpr) as u32);
            ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
            Arena::new(css_w as f32, css_h as f32).map_err(js_err)
        }

        fn frame(&mut self, now: f64) {
            let events = self.sim.tick(now);

            self.audio.begin_frame();
            dispatch(&events, &mut self.audio);

            if let Err(err) = self.render() {
                log::warn!("Render failed: {:?}", err);
            }
            self.update_hud(now);
        }

        fn render(&self) -> Result<(), JsValue> {
            let arena = self.sim.state().arena;
            let (w, h) = (arena.width as f64, arena.height as f64);
            if self.settings.effective_motion_blur() {
                self.ctx.set_fill_style_str("rgba(0, 0, 0, 0.1)");
                self.ctx.fill_rect(0.0, 0.0, w, h);
            } else {
                self.ctx.clear_rect(0.0, 0.0, w, h);
            }

            let types = &self.sim.ruleset().types;
            for view in self.sim.item_views() {
                self.draw_item(&view, types)?;
            }
            if self.settings.glow_enabled {
                for glow in self.sim.glows() {
                    self.draw_glow(glow, types)?;
                }
            }
            Ok(())
        }

        fn draw_item(&self, view: &ItemView, types: &TypeSet) -> Result<(), JsValue> {
            let Some(def) = types.get(view.kind) else {
                return Ok(());
            };
            let ctx = &self.ctx;
            let (x, y) = (view.pos.x as f64, view.pos.y as f64);
            ctx.save();

            if self.settings.glow_enabled {
                let inner = view.size as f64 * 0.5;
                let outer = view.glow_size as f64;
                let gradient = ctx.create_radial_gradient(x, y, inner, x, y, outer)?;
                gradient.add_color_stop(0.0, &def.rgba(1.0))?;
                gradient.add_color_stop(0.5, &def.rgba(view.glow_intensity))?;
                gradient.add_color_stop(1.0, &def.rgba(0.0))?;
                ctx.set_fill_style_canvas_gradient(&gradient);
                ctx.begin_path();
                ctx.arc(x, y, view.glow_size as f64, 0.0, TAU)?;
                ctx.fill();
            }

            ctx.translate(x, y)?;
            ctx.rotate(view.rotation as f64)?;
            ctx.set_font(&format!("{}px Arial", view.size));
            ctx.set_text_align("center");
            ctx.set_text_baseline("middle");
            ctx.set_fill_style_str("white");
            ctx.fill_text(&def.label, 0.0, 0.0)?;

            ctx.restore();
            Ok(())
        }

        fn draw_glow(&self, glow: &Glow, types: &TypeSet) -> Result<(), JsValue> {
            let (Some(from), Some(to)) = (types.get(glow.from), types.get(glow.to)) else {
                return Ok(());
            };
            let ctx = &self.ctx;
            let (x, y, r) = (glow.pos.x as f64, glow.pos.y as f64, glow.radius as f64);

            let gradient = ctx.create_radial_gradient(x, y, 0.0, x, y, r)?;
            gradient.add_color_stop(0.0, &from.rgba(0.7))?;
            gradient.add_color_stop(0.5, &to.rgba(0.5))?;
            gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)")?;

            ctx.set_global_alpha(glow.alpha.max(0.0) as f64);
            ctx.set_fill_style_canvas_gradient(&gradient);
            ctx.begin_path();
            ctx.arc(x, y, r, 0.0, TAU)?;
            ctx.fill();
            ctx.set_global_alpha(1.0);
            Ok(())
        }

        fn update_hud(&self, now: f64) {
            let Some(hud) = &self.hud else { return };
            let ruleset = self.sim.ruleset();
            let counts: Vec<String> = ruleset
                .types
                .iter()
                .zip(self.sim.counts())
                .map(|((_, def), count)| format!("{}×{}", def.label, count))
                .collect();

            let status = match self.sim.phase() {
                RoundPhase::Concluded { winner, restart_at } => format!(
                    "{} wins! Next round in {:.0}s",
                    ruleset.types.label(winner),
                    (restart_at - now).max(0.0).ceil()
                ),
                _ => format!("{:.1}s", self.sim.state().round.elapsed(now)),
            };

            hud.set_text_content(Some(&format!(
                "Round {} · {} · {} · {}",
                self.sim.round_number(),
                ruleset.name,
                counts.join(" "),
                status
            )));
        }

        /// Push changed simulation knobs into the running simulation
        fn apply_settings(&mut self) {
            let applied = self
                .settings
                .sim_config()
                .and_then(|config| self.sim.set_config(config));
            if let Err(err) = applied {
                log::warn!("Ignoring settings change: {}", err);
            }
            self.sim.set_random_variation(self.settings.random_variation);
            self.sim.set_sample_interval(self.settings.chart_refresh_secs);
            self.audio.set_muted(self.settings.muted);
            self.audio.set_master_volume(self.settings.master_volume);
        }

        fn select_variation(&mut self, key: &str, now: f64) {
            match self.sim.select_variation(key, now) {
                Ok(()) => self.settings.variation = key.to_string(),
                Err(err) => log::warn!("{}", err),
            }
        }

        fn handle_key(&mut self, key: &str) {
            let now = now_secs();
            self.audio.resume();
            match key {
                "r" | "R" => self.sim.restart_round(now),
                "g" | "G" => self.settings.glow_enabled = !self.settings.glow_enabled,
                "b" | "B" => self.settings.motion_blur = !self.settings.motion_blur,
                "m" | "M" => self.settings.muted = !self.settings.muted,
                "v" | "V" => {
                    self.settings.random_variation = !self.settings.random_variation;
                    log::info!("Random variation: {}", self.settings.random_variation);
                }
                "n" | "N" => {
                    let next = self.sim.catalog().and_then(|catalog| {
                        let keys: Vec<&str> = catalog.keys().collect();
                        let pos = keys.iter().position(|k| *k == self.sim.ruleset().key)?;
                        keys.get((pos + 1) % keys.len()).map(|k| k.to_string())
                    });
                    if let Some(key) = next {
                        self.select_variation(&key, now);
                    }
                }
                "ArrowUp" => self.settings.step_speed(0.1),
                "ArrowDown" => self.settings.step_speed(-0.1),
                "+" | "=" => self.settings.step_items(1),
                "-" | "_" => self.settings.step_items(-1),
                "]" => self.settings.step_size(2.0),
                "[" => self.settings.step_size(-2.0),
                "." => self.settings.step_volume(0.1),
                "," => self.settings.step_volume(-0.1),
                digit if digit.len() == 1 && digit.as_bytes()[0].is_ascii_digit() => {
                    let index = (digit.as_bytes()[0] - b'0') as usize;
                    let key = self
                        .sim
                        .catalog()
                        .and_then(|c| c.keys().nth(index.wrapping_sub(1)).map(str::to_string));
                    if let Some(key) = key {
                        self.select_variation(&key, now);
                    }
                }
                _ => return,
            }
            self.apply_settings();
        }

        fn resize(&mut self) {
            let resized = Self::fit_canvas(&self.canvas, &self.ctx)
                .and_then(|arena| self.sim.set_arena(arena).map_err(js_err));
            if let Err(err) = resized {
                log::warn!("Resize failed: {:?}", err);
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).map_err(js_err)?;

        log::info!("RPS Arena starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;
        let arena = App::fit_canvas(&canvas, &ctx)?;

        let settings = Settings::default();
        let config = settings.sim_config().map_err(js_err)?;
        let catalog = VariationCatalog::builtin().map_err(js_err)?;
        let seed = js_sys::Date::now() as u64;
        let sim = Simulation::from_catalog(
            catalog,
            &settings.variation,
            config,
            arena,
            seed,
            now_secs(),
        )
        .map_err(js_err)?;
        log::info!("Simulation initialized with seed: {}", seed);

        let app = Rc::new(RefCell::new(App {
            sim,
            settings,
            audio: AudioManager::new(),
            canvas,
            ctx,
            hud: document.get_element_by_id("hud"),
        }));
        app.borrow_mut().apply_settings();

        setup_handlers(&window, app.clone())?;
        request_animation_frame(app);

        log::info!("RPS Arena running!");
        Ok(())
    }

    fn setup_handlers(window: &web_sys::Window, app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        // Keyboard
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                app.borrow_mut().handle_key(&event.key());
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Resize
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().resize();
            });
            window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        app.borrow_mut().frame(time / 1000.0);
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    web_app::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use clap::Parser;
    use rps_arena::consts::FRAME_DT;
    use rps_arena::sim::{Arena, LogListener, SimEvent, Simulation, dispatch};
    use rps_arena::{ConfigError, Settings, VariationCatalog};

    #[derive(Parser, Debug)]
    #[command(
        author,
        version,
        about = "Play RPS arena rounds headlessly and log the results",
        long_about = None
    )]
    pub struct Args {
        /// Variation key (overrides the settings file)
        #[arg(short, long)]
        variation: Option<String>,
        /// Rounds to play before exiting
        #[arg(short, long, default_value_t = 5)]
        rounds: u32,
        /// RNG seed (defaults to the current time)
        #[arg(long)]
        seed: Option<u64>,
        /// JSON settings file
        #[arg(long)]
        settings: Option<PathBuf>,
        #[arg(long)]
        items: Option<u32>,
        #[arg(long)]
        speed: Option<f32>,
        #[arg(long)]
        size: Option<f32>,
        #[arg(long, default_value_t = 800.0)]
        width: f32,
        #[arg(long, default_value_t = 600.0)]
        height: f32,
        /// Switch to a different variation every round
        #[arg(long)]
        random: bool,
        /// Ticks a round may run before it is abandoned
        #[arg(long, default_value_t = 216_000)]
        max_ticks: u64,
        /// List the built-in variations and exit
        #[arg(long)]
        list: bool,
    }

    #[derive(Debug, thiserror::Error)]
    pub enum RunError {
        #[error(transparent)]
        Config(#[from] ConfigError),
        #[error("failed to read {path}: {source}")]
        Io {
            path: PathBuf,
            source: std::io::Error,
        },
    }

    fn load_settings(args: &Args) -> Result<Settings, RunError> {
        let mut settings = match &args.settings {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|source| RunError::Io {
                    path: path.clone(),
                    source,
                })?;
                Settings::from_json(&json)?
            }
            None => Settings::default(),
        };
        if let Some(variation) = &args.variation {
            settings.variation = variation.clone();
        }
        if let Some(items) = args.items {
            settings.items_per_type = items;
        }
        if let Some(speed) = args.speed {
            settings.speed_multiplier = speed;
        }
        if let Some(size) = args.size {
            settings.item_size = size;
        }
        settings.random_variation |= args.random;
        Ok(settings)
    }

    fn time_seed() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }

    pub fn run(args: Args) -> Result<(), RunError> {
        let catalog = VariationCatalog::builtin()?;
        if args.list {
            for variation in catalog.iter() {
                println!("{:<10} {}", variation.key(), variation.describe());
            }
            return Ok(());
        }

        let settings = load_settings(&args)?;
        let config = settings.sim_config()?;
        let arena = Arena::new(args.width, args.height)?;
        let seed = args.seed.unwrap_or_else(time_seed);

        let mut sim =
            Simulation::from_catalog(catalog, &settings.variation, config, arena, seed, 0.0)?;
        sim.set_random_variation(settings.random_variation);
        sim.set_sample_interval(settings.chart_refresh_secs);
        log::info!("Headless run: {} rounds, seed {}", args.rounds, seed);

        let mut listener = LogListener::default();
        let mut completed = 0;
        let mut abandoned = 0;
        let mut round_ticks = 0u64;
        let mut tick_count = 0u64;

        while completed < args.rounds {
            tick_count += 1;
            round_ticks += 1;
            let now = tick_count as f64 * FRAME_DT;

            let events = sim.tick(now);
            dispatch(&events, &mut listener);
            for event in &events {
                match event {
                    SimEvent::RoundStarted { .. } => round_ticks = 0,
                    SimEvent::RoundEnded(_) => completed += 1,
                    _ => {}
                }
            }

            if round_ticks > args.max_ticks {
                log::warn!(
                    "Round {} ({}) still has {} types after {} ticks, restarting",
                    sim.round_number(),
                    sim.ruleset().key,
                    sim.state().distinct_types(),
                    round_ticks
                );
                abandoned += 1;
                sim.restart_round(now);
                round_ticks = 0;
            }
        }

        println!("Round  Variation   Winner  Duration  Start");
        for record in sim.history().iter_newest_first() {
            println!(
                "{:>5}  {:<10}  {:<6}  {:>7.1}s  {}",
                record.round_number,
                record.variation,
                record.winner_label,
                record.duration_secs,
                record.initial_distribution
            );
        }
        if let Some(avg) = sim.history().average_duration() {
            println!(
                "Average round: {:.1}s over {} rounds ({} abandoned)",
                avg, completed, abandoned
            );
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("RPS Arena (native) starting...");

    match headless::run(headless::Args::parse()) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
