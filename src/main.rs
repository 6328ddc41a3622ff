//! Rock Drift entry point
//!
//! On wasm32 this drives the simulation from `requestAnimationFrame` and
//! draws the default tessellation onto a 2D canvas. Natively it runs a
//! headless autopilot session and logs a summary.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use rock_drift::renderer::{RenderSnapshot, RendererTable, Vertex};
    use rock_drift::scheduler::FrameId;
    use rock_drift::sim::{EventBus, GameEvent, GamePhase, SimulationContext, TickInput, tick};
    use rock_drift::{FixedStepScheduler, FrameHost, Platform, Settings, Tuning};

    /// Held keys, folded into a move direction each frame
    #[derive(Default)]
    struct Keys {
        left: bool,
        right: bool,
        up: bool,
        down: bool,
        fire: bool,
        pointer_fire: bool,
    }

    impl Keys {
        fn move_dir(&self) -> Vec2 {
            let x = self.right as i32 - self.left as i32;
            let y = self.down as i32 - self.up as i32;
            Vec2::new(x as f32, y as f32)
        }
    }

    /// Game instance holding all state
    struct Game {
        ctx: SimulationContext,
        scheduler: FixedStepScheduler,
        renderer: RendererTable,
        bus: EventBus,
        input: TickInput,
        keys: Keys,
        canvas: HtmlCanvasElement,
        draw: CanvasRenderingContext2d,
        vertices: Vec<Vertex>,
        /// Shared rAF callback, created once and reused for every frame
        frame_callback: Option<FrameCallback>,
    }

    type FrameCallback = Rc<Closure<dyn FnMut(f64)>>;

    /// `requestAnimationFrame` as a frame host
    struct RafHost {
        callback: FrameCallback,
    }

    impl RafHost {
        fn for_game(game: &Rc<RefCell<Game>>) -> Option<Self> {
            let callback = game.borrow().frame_callback.clone()?;
            Some(Self { callback })
        }
    }

    impl FrameHost for RafHost {
        fn request_frame(&mut self) -> FrameId {
            let Some(window) = web_sys::window() else {
                return 0;
            };
            let callback: &Closure<dyn FnMut(f64)> = &self.callback;
            match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
                Ok(id) => id,
                Err(e) => {
                    log::error!("requestAnimationFrame failed: {:?}", e);
                    0
                }
            }
        }

        fn cancel_frame(&mut self, id: FrameId) {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
    }

    impl Game {
        /// Deliver queued events, redraw and refresh the HUD
        fn present(&mut self, alpha: f64) {
            let events = self.ctx.drain_events();
            self.bus.dispatch(&events);
            self.render(alpha);
            self.update_hud();
        }

        fn render(&mut self, alpha: f64) {
            let snapshot = RenderSnapshot::capture(&self.ctx, alpha);
            self.renderer.render_into(&snapshot, &mut self.vertices);

            let w = self.canvas.width() as f64;
            let h = self.canvas.height() as f64;
            self.draw.set_fill_style_str("#05050d");
            self.draw.fill_rect(0.0, 0.0, w, h);

            let sx = w / snapshot.width as f64;
            let sy = h / snapshot.height as f64;
            // Batch consecutive triangles of one color into a single path
            let mut current: Option<[f32; 4]> = None;
            for tri in self.vertices.chunks_exact(3) {
                let color = tri[0].color;
                if current != Some(color) {
                    if current.is_some() {
                        self.draw.fill();
                    }
                    self.draw.set_fill_style_str(&css_color(color));
                    self.draw.begin_path();
                    current = Some(color);
                }
                let [a, b, c] = [tri[0].position, tri[1].position, tri[2].position];
                self.draw.move_to(a[0] as f64 * sx, a[1] as f64 * sy);
                self.draw.line_to(b[0] as f64 * sx, b[1] as f64 * sy);
                self.draw.line_to(c[0] as f64 * sx, c[1] as f64 * sy);
                self.draw.close_path();
            }
            if current.is_some() {
                self.draw.fill();
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let set = |id: &str, text: &str| {
                if let Some(el) = document.get_element_by_id(id) {
                    el.set_text_content(Some(text));
                }
            };
            set("hud-score", &self.ctx.score.to_string());
            set("hud-lives", &self.ctx.player.lives.to_string());
            set("hud-level", &self.ctx.level.to_string());

            let show = |id: &str, visible: bool| {
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
                }
            };
            show("start-screen", self.ctx.phase == GamePhase::Start);
            show("pause-menu", self.ctx.phase == GamePhase::Paused);
            show("game-over", self.ctx.phase == GamePhase::GameOver);
        }
    }

    fn css_color(c: [f32; 4]) -> String {
        format!(
            "rgba({},{},{},{})",
            (c[0] * 255.0) as u8,
            (c[1] * 255.0) as u8,
            (c[2] * 255.0) as u8,
            c[3]
        )
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Rock Drift starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| JsValue::from_str("no canvas"))?
            .dyn_into()?;
        let draw: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        canvas.set_width((canvas.client_width() as f64 * dpr) as u32);
        canvas.set_height((canvas.client_height() as f64 * dpr) as u32);

        let platform = window
            .navigator()
            .user_agent()
            .map(|ua| Platform::from_user_agent(&ua))
            .unwrap_or_default();
        let settings = Settings::for_platform(platform);
        let seed = settings.seed.unwrap_or(js_sys::Date::now() as u64);
        log::info!(
            "Platform {} ({:.1} ms step), seed {}",
            platform.as_str(),
            settings.time_step_ms(),
            seed
        );

        let mut bus = EventBus::new();
        bus.subscribe(|event| match event {
            GameEvent::FamilyCleared { bonus, .. } => log::info!("Family cleared: +{}", bonus),
            GameEvent::LevelUp { level } => log::info!("Level {}", level),
            GameEvent::GameOver { score, level } => {
                log::info!("Game over at level {} with {} points", level, score)
            }
            _ => {}
        });

        let game = Rc::new(RefCell::new(Game {
            ctx: SimulationContext::new(seed, Tuning::default()),
            scheduler: FixedStepScheduler::new(&settings),
            renderer: RendererTable::default(),
            bus,
            input: TickInput::default(),
            keys: Keys::default(),
            canvas: canvas.clone(),
            draw,
            vertices: Vec::new(),
            frame_callback: None,
        }));

        let weak = Rc::downgrade(&game);
        let callback = Closure::<dyn FnMut(f64)>::new(move |time: f64| {
            if let Some(game) = weak.upgrade() {
                game_loop(&game, time);
            }
        });
        game.borrow_mut().frame_callback = Some(Rc::new(callback));

        setup_input_handlers(&canvas, game.clone());
        setup_auto_pause(game.clone());

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }
        game.borrow_mut().present(0.0);
        log::info!("Rock Drift ready");
        Ok(())
    }

    fn game_loop(game: &Rc<RefCell<Game>>, time: f64) {
        let Some(mut host) = RafHost::for_game(game) else {
            return;
        };
        let mut guard = game.borrow_mut();
        let g = &mut *guard;

        g.input.move_dir = g.keys.move_dir();
        g.input.fire = g.keys.fire || g.keys.pointer_fire;
        let outcome = g.scheduler.frame(time, &mut host, |dt| {
            tick(&mut g.ctx, &g.input, dt);
            // Pointer targets apply once
            g.input.pointer = None;
        });

        if !g.ctx.is_running() && g.scheduler.is_running() {
            g.scheduler.stop(&mut host);
        }
        g.present(outcome.alpha);
    }

    /// Begin a run from the start or game-over screen
    fn start_run(game: &Rc<RefCell<Game>>) {
        let Some(mut host) = RafHost::for_game(game) else {
            return;
        };
        let mut g = game.borrow_mut();
        if g.ctx.start() {
            g.scheduler.start(&mut host);
            g.present(0.0);
        }
    }

    fn toggle_pause(game: &Rc<RefCell<Game>>) {
        let Some(mut host) = RafHost::for_game(game) else {
            return;
        };
        let mut g = game.borrow_mut();
        if g.ctx.pause() {
            g.scheduler.stop(&mut host);
        } else if g.ctx.resume() {
            g.scheduler.start(&mut host);
        }
        g.present(0.0);
    }

    fn pause_if_running(game: &Rc<RefCell<Game>>, reason: &str) {
        if game.borrow().ctx.is_running() {
            log::info!("Auto-paused ({})", reason);
            toggle_pause(game);
        }
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                match event.key().as_str() {
                    "Escape" | "p" | "P" => toggle_pause(&game),
                    "Enter" => start_run(&game),
                    key => {
                        let mut g = game.borrow_mut();
                        match key {
                            "ArrowLeft" | "a" | "A" => g.keys.left = true,
                            "ArrowRight" | "d" | "D" => g.keys.right = true,
                            "ArrowUp" | "w" | "W" => g.keys.up = true,
                            "ArrowDown" | "s" | "S" => g.keys.down = true,
                            " " => g.keys.fire = true,
                            _ => return,
                        }
                        event.prevent_default();
                    }
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.keys.left = false,
                    "ArrowRight" | "d" | "D" => g.keys.right = false,
                    "ArrowUp" | "w" | "W" => g.keys.up = false,
                    "ArrowDown" | "s" | "S" => g.keys.down = false,
                    " " => g.keys.fire = false,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer move: ship follows the pointer, in simulation coordinates
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let rect = canvas_clone.get_bounding_client_rect();
                if rect.width() <= 0.0 || rect.height() <= 0.0 {
                    return;
                }
                let mut g = game.borrow_mut();
                let x = (event.client_x() as f64 - rect.left()) / rect.width();
                let y = (event.client_y() as f64 - rect.top()) / rect.height();
                let target = Vec2::new(
                    x as f32 * g.ctx.tuning.width,
                    y as f32 * g.ctx.tuning.height,
                );
                g.input.pointer = Some(target);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer down: fire, or start from the title screen
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                let phase = game.borrow().ctx.phase;
                if matches!(phase, GamePhase::Start | GamePhase::GameOver) {
                    start_run(&game);
                } else {
                    game.borrow_mut().keys.pointer_fire = true;
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                game.borrow_mut().keys.pointer_fire = false;
            });
            let _ = window
                .add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    pause_if_running(&game, "tab hidden");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                pause_if_running(&game, "window blur");
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::Cell;
    use std::rc::Rc;

    use glam::Vec2;
    use thiserror::Error;

    use rock_drift::renderer::RenderSnapshot;
    use rock_drift::scheduler::FrameId;
    use rock_drift::sim::{EventBus, GameEvent, SimulationContext, TickInput, tick};
    use rock_drift::{FixedStepScheduler, FrameHost, Platform, Settings, Tuning, TuningError};

    /// Display refresh the virtual host pretends to run at
    const DISPLAY_HZ: f64 = 60.0;

    #[derive(Debug, Error)]
    pub enum HeadlessError {
        #[error("failed to read {path}: {source}")]
        Io {
            path: String,
            source: std::io::Error,
        },
        #[error(transparent)]
        Tuning(#[from] TuningError),
        #[error("bad argument: {0}")]
        Arg(String),
    }

    struct Options {
        seconds: f64,
        seed: u64,
        platform: Platform,
        tuning: Tuning,
    }

    fn parse_args(args: &[String]) -> Result<Options, HeadlessError> {
        let mut opts = Options {
            seconds: 60.0,
            seed: 42,
            platform: Platform::Desktop,
            tuning: Tuning::default(),
        };
        let mut it = args.iter();
        while let Some(arg) = it.next() {
            let mut value = |name: &str| {
                it.next()
                    .cloned()
                    .ok_or_else(|| HeadlessError::Arg(format!("{name} needs a value")))
            };
            match arg.as_str() {
                "--seconds" => {
                    let v = value("--seconds")?;
                    opts.seconds = v
                        .parse()
                        .map_err(|_| HeadlessError::Arg(format!("--seconds {v}")))?;
                }
                "--seed" => {
                    let v = value("--seed")?;
                    opts.seed = v
                        .parse()
                        .map_err(|_| HeadlessError::Arg(format!("--seed {v}")))?;
                }
                "--platform" => {
                    let v = value("--platform")?;
                    opts.platform = Platform::from_str(&v)
                        .ok_or_else(|| HeadlessError::Arg(format!("--platform {v}")))?;
                }
                "--tuning" => {
                    let path = value("--tuning")?;
                    let json = std::fs::read_to_string(&path)
                        .map_err(|source| HeadlessError::Io { path, source })?;
                    opts.tuning = Tuning::from_json(&json)?;
                }
                other => return Err(HeadlessError::Arg(other.to_string())),
            }
        }
        Ok(opts)
    }

    /// Frame host driven by a virtual clock
    #[derive(Default)]
    struct VirtualFrames {
        next: FrameId,
        pending: Option<FrameId>,
    }

    impl FrameHost for VirtualFrames {
        fn request_frame(&mut self) -> FrameId {
            self.next += 1;
            self.pending = Some(self.next);
            self.next
        }

        fn cancel_frame(&mut self, id: FrameId) {
            if self.pending == Some(id) {
                self.pending = None;
            }
        }
    }

    /// Sit under the lowest rock and keep firing
    fn autopilot(ctx: &SimulationContext) -> TickInput {
        let ship = ctx.player.center();
        let target = ctx
            .obstacles
            .live
            .values()
            .filter(|o| o.center().y > 0.0)
            .max_by(|a, b| a.center().y.total_cmp(&b.center().y));
        let move_dir = match target {
            Some(rock) if (rock.center().x - ship.x).abs() > ctx.player.speed => {
                Vec2::new((rock.center().x - ship.x).signum(), 0.0)
            }
            _ => Vec2::ZERO,
        };
        TickInput {
            move_dir,
            fire: true,
            ..Default::default()
        }
    }

    pub fn run(args: &[String]) -> Result<(), HeadlessError> {
        let opts = parse_args(args)?;
        let settings = Settings {
            seed: Some(opts.seed),
            ..Settings::for_platform(opts.platform)
        };
        settings.validate()?;

        let mut ctx = SimulationContext::new(opts.seed, opts.tuning);
        let mut scheduler = FixedStepScheduler::new(&settings);
        let mut host = VirtualFrames::default();

        let destroyed = Rc::new(Cell::new(0u32));
        let families = Rc::new(Cell::new(0u32));
        let hits = Rc::new(Cell::new(0u32));
        let mut bus = EventBus::new();
        {
            let (destroyed, families, hits) = (destroyed.clone(), families.clone(), hits.clone());
            bus.subscribe(move |event| match event {
                GameEvent::ObstacleDestroyed { .. } => destroyed.set(destroyed.get() + 1),
                GameEvent::FamilyCleared { .. } => families.set(families.get() + 1),
                GameEvent::PlayerHit { .. } => hits.set(hits.get() + 1),
                GameEvent::LevelUp { level } => log::info!("Level {}", level),
                _ => {}
            });
        }

        log::info!(
            "Headless run: {:.0} s on {} ({:.2} ms step), seed {}",
            opts.seconds,
            opts.platform.as_str(),
            scheduler.time_step_ms(),
            opts.seed
        );

        ctx.start();
        scheduler.start(&mut host);
        let frame_ms = 1000.0 / DISPLAY_HZ;
        let frames = (opts.seconds * DISPLAY_HZ) as u64;
        let mut now = 0.0;
        let mut updates = 0u64;
        for _ in 0..frames {
            if host.pending.take().is_none() {
                break;
            }
            now += frame_ms;
            let outcome = scheduler.frame(now, &mut host, |dt| {
                let input = autopilot(&ctx);
                tick(&mut ctx, &input, dt);
            });
            updates += outcome.updates as u64;
            bus.dispatch(&ctx.drain_events());
            if !ctx.is_running() {
                scheduler.stop(&mut host);
            }
        }

        let snapshot = RenderSnapshot::capture(&ctx, 0.0);
        log::info!(
            "Finished after {} updates: phase {:?}, level {}, score {}, lives {}",
            updates,
            snapshot.phase,
            snapshot.level,
            snapshot.score,
            snapshot.lives
        );
        log::info!(
            "Rocks shot {}, families cleared {}, hits taken {}, rocks live {}",
            destroyed.get(),
            families.get(),
            hits.get(),
            snapshot.obstacles.len()
        );
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_game::run() {
        log::error!("Startup failed: {:?}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Rock Drift (native, headless) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = headless::run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
