use std::collections::HashSet;
use std::error::Error;
use std::num::NonZeroU32;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use grid_raycaster::{
    AppConfig, RaycasterEngine,
    clock::{FixedStep, FpsCounter, frame_interval},
    minimap::{self, PixelPoint},
    overlay::{Canvas, draw_minimap},
    scaler::{ScaleLut, blit_nearest_stretch, build_scale_lut},
};

const MINIMAP_MARGIN: i32 = 8;
const FOV_STEP: f64 = 5.0;

struct App {
    config: AppConfig,
    engine: RaycasterEngine,

    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,

    // Window-sized mapping of the engine frame
    scale_lut: ScaleLut,
    lut_size: (usize, usize),

    // Input
    keys_down: HashSet<KeyCode>,
    last_pointer_x: Option<f64>,
    show_minimap: bool,

    // Pacing
    physics: FixedStep,
    frame_interval: Duration,
    next_frame: Instant,
    last_tick: Instant,
    fps: FpsCounter,
}

impl App {
    fn new(config: AppConfig, engine: RaycasterEngine) -> Self {
        let now = Instant::now();
        Self {
            physics: FixedStep::new(config.window.physics_hz),
            frame_interval: frame_interval(None, config.window.max_refresh_hz),
            show_minimap: config.window.show_minimap,
            config,
            engine,
            window: None,
            surface: None,
            scale_lut: ScaleLut::empty(),
            lut_size: (0, 0),
            keys_down: HashSet::new(),
            last_pointer_x: None,
            next_frame: now,
            last_tick: now,
            fps: FpsCounter::new(now),
        }
    }

    /// Held-key axes: (forward, strafe, turn), diagonal movement normalised.
    fn key_axes(&self) -> (f64, f64, f64) {
        let held = |code| self.keys_down.contains(&code);
        let axis = |pos: bool, neg: bool| (pos as i32 - neg as i32) as f64;

        let mut fwd = axis(held(KeyCode::KeyW), held(KeyCode::KeyS));
        let mut strafe = axis(held(KeyCode::KeyD), held(KeyCode::KeyA));
        let turn = axis(
            held(KeyCode::KeyQ) || held(KeyCode::ArrowLeft),
            held(KeyCode::KeyE) || held(KeyCode::ArrowRight),
        );

        if fwd != 0.0 && strafe != 0.0 {
            let inv = 1.0 / (fwd * fwd + strafe * strafe).sqrt();
            fwd *= inv;
            strafe *= inv;
        }
        (fwd, strafe, turn)
    }

    fn on_key_pressed(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Tab => self.show_minimap = !self.show_minimap,
            KeyCode::Equal | KeyCode::NumpadAdd => self.adjust_fov(FOV_STEP),
            KeyCode::Minus | KeyCode::NumpadSubtract => self.adjust_fov(-FOV_STEP),
            _ => (),
        }
    }

    fn adjust_fov(&mut self, delta: f64) {
        let fov = (self.engine.config().fov_degrees + delta).clamp(30.0, 150.0);
        if let Err(err) = self.engine.set_fov(fov) {
            tracing::warn!(%err, "fov change rejected");
        }
    }

    /// Runs the simulation steps that are due, then renders one frame.
    fn advance(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick);
        self.last_tick = now;

        let steps = self.physics.advance(dt);
        let step_dt = self.physics.step_seconds();
        for _ in 0..steps {
            let (fwd, strafe, turn) = self.key_axes();
            if fwd != 0.0 || strafe != 0.0 || turn != 0.0 {
                self.engine.apply_motion(fwd, strafe, turn);
            }
            self.engine.step(step_dt);
        }
        self.engine.render();
    }

    fn redraw(&mut self, id: WindowId) {
        self.advance();

        let (window, surface) = match (&self.window, &mut self.surface) {
            (Some(w), Some(s)) if w.id() == id => (w, s),
            _ => return,
        };

        let size = window.inner_size();
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            return; // minimized
        };
        let (dw, dh) = (size.width as usize, size.height as usize);

        if let Err(err) = surface.resize(w, h) {
            tracing::error!(%err, "surface resize failed");
            return;
        }

        let frame = self.engine.frame_buffer();
        if self.lut_size != (dw, dh) {
            self.scale_lut = build_scale_lut(dw, dh, frame.width(), frame.height());
            self.lut_size = (dw, dh);
            tracing::debug!(width = dw, height = dh, "scale table rebuilt");
        }

        let mut buf = match surface.buffer_mut() {
            Ok(buf) => buf,
            Err(err) => {
                tracing::error!(%err, "surface buffer unavailable");
                return;
            }
        };
        blit_nearest_stretch(&mut buf, dw, frame.pixels(), frame.width(), &self.scale_lut, 0);

        if self.show_minimap {
            let proj = minimap::project(
                self.engine.map(),
                &self.engine.player_pose(),
                self.config.window.minimap_scale,
                self.config.window.minimap_view_distance,
            );
            let origin = PixelPoint {
                x: MINIMAP_MARGIN,
                y: dh as i32 - proj.height - MINIMAP_MARGIN,
            };
            draw_minimap(&mut Canvas::new(&mut buf, dw, dh), &proj, origin);
        }

        if let Err(err) = buf.present() {
            tracing::error!(%err, "present failed");
            return;
        }

        if let Some(fps) = self.fps.frame(Instant::now()) {
            tracing::info!(
                fps,
                frame = self.engine.frame_count(),
                steps = self.engine.step_count(),
                "frame rate"
            );
            window.set_title(&format!("{}  -  {fps:.0} fps", self.config.window.title));
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let frame = self.engine.frame_buffer();
        let scale = self.config.window.pixel_scale.max(1) as f64;
        let attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                frame.width() as f64 * scale,
                frame.height() as f64 * scale,
            ));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Rc::new(window),
            Err(err) => {
                tracing::error!(%err, "cannot create window");
                event_loop.exit();
                return;
            }
        };

        let surface = softbuffer::Context::new(window.clone())
            .and_then(|context| softbuffer::Surface::new(&context, window.clone()));
        let surface = match surface {
            Ok(surface) => surface,
            Err(err) => {
                tracing::error!(%err, "cannot create softbuffer surface");
                event_loop.exit();
                return;
            }
        };

        let refresh = window
            .current_monitor()
            .and_then(|monitor| monitor.refresh_rate_millihertz());
        self.frame_interval = frame_interval(refresh, self.config.window.max_refresh_hz);
        tracing::info!(
            refresh_mhz = refresh,
            frame_interval = ?self.frame_interval,
            physics_hz = self.config.window.physics_hz,
            "window ready"
        );

        self.surface = Some(surface);
        self.window = Some(window.clone());
        self.lut_size = (0, 0);

        let now = Instant::now();
        self.last_tick = now;
        self.next_frame = now;
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("close requested; stopping");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    self.keys_down.insert(code);
                    if !repeat {
                        self.on_key_pressed(event_loop, code);
                    }
                }
                ElementState::Released => {
                    self.keys_down.remove(&code);
                }
            },

            WindowEvent::CursorMoved { position, .. } => {
                if let Some(last) = self.last_pointer_x {
                    self.engine.apply_pointer(position.x - last);
                }
                self.last_pointer_x = Some(position.x);
            }

            WindowEvent::CursorLeft { .. } | WindowEvent::Focused(false) => {
                self.last_pointer_x = None;
                self.keys_down.clear();
            }

            WindowEvent::RedrawRequested => self.redraw(id),

            WindowEvent::Resized(new_size) => {
                tracing::debug!(width = new_size.width, height = new_size.height, "resized");
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = &self.window else {
            return;
        };
        let now = Instant::now();
        if now >= self.next_frame {
            window.request_redraw();
            self.next_frame += self.frame_interval;
            if self.next_frame < now {
                // fell behind; don't try to catch up
                self.next_frame = now + self.frame_interval;
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => AppConfig::load(Path::new(&path))?,
        None => AppConfig::default(),
    };
    let engine = config.build_engine()?;
    tracing::info!(
        map_width = engine.map().width(),
        map_height = engine.map().height(),
        "starting raycaster"
    );

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, engine);
    event_loop.run_app(&mut app)?;
    Ok(())
}
