//! Sprite batching demo.
//!
//! Draws a tiled floor, a few hundred spinning sprites and some mirrored ones
//! on a 1280x720 virtual screen letterboxed into the window. Pass a TTF/OTF
//! path as the first argument to also draw text.
//!
//! ```text
//! RUST_LOG=spritebatch=debug cargo run --bin spritebatch-demo -- path/to/font.ttf
//! ```

use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use spritebatch::text::measure;
use spritebatch::{
    BatchConfig, BatchParams, BatchStats, Color, DrawParams, Font, FontAtlas, GpuContext, Mirror,
    Rect, SpriteBatch, Texture, TextureRef, Vec2, WgpuDevice,
};

const VIRTUAL_WIDTH: u32 = 1280;
const VIRTUAL_HEIGHT: u32 = 720;
const FONT_SIZE: f32 = 20.0;
const SPINNERS: usize = 360;

struct Scene {
    batch: SpriteBatch<WgpuDevice>,
    floor: TextureRef,
    disc: TextureRef,
    crate_tex: TextureRef,
    font: Option<FontAtlas>,
    last_stats: BatchStats,
}

impl Scene {
    fn new(window: Arc<Window>, font_path: Option<&str>) -> spritebatch::Result<Self> {
        let mut device = WgpuDevice::new(GpuContext::new(window)?);

        let floor = Texture::noise(device.gpu(), 64, [70, 90, 70], 7);
        let floor = device.add_texture(floor);
        let disc = Texture::disc(device.gpu(), 32, [255, 200, 120]);
        let disc = device.add_texture(disc);
        let crate_tex = Texture::checkerboard(
            device.gpu(),
            48,
            12,
            [180, 120, 60, 255],
            [120, 80, 40, 255],
        );
        let crate_tex = device.add_texture(crate_tex);

        let font = match font_path {
            Some(path) => {
                let mut font = FontAtlas::from_file(path)?;
                font.add_size(&mut device, FONT_SIZE);
                Some(font)
            }
            None => {
                log::info!("no font given; text disabled");
                None
            }
        };

        let batch = SpriteBatch::new(
            device,
            BatchConfig::new()
                .capacity(1024)
                .virtual_size(VIRTUAL_WIDTH, VIRTUAL_HEIGHT),
        )?;

        Ok(Self {
            batch,
            floor,
            disc,
            crate_tex,
            font,
            last_stats: BatchStats::default(),
        })
    }

    fn render(&mut self, time: f32, cursor: Vec2) -> spritebatch::Result<()> {
        self.batch
            .device_mut()
            .begin_frame(Color::rgb(0.02, 0.02, 0.03))?;
        self.batch.begin(BatchParams::new())?;

        // Floor: one texture, one run
        let floor = self.floor;
        let plain = DrawParams::new();
        for y in 0..(VIRTUAL_HEIGHT / floor.height + 1) {
            for x in 0..(VIRTUAL_WIDTH / floor.width + 1) {
                let position = Vec2::new(x as f32, y as f32) * floor.size();
                self.batch.draw_at(floor, position, &plain)?;
            }
        }

        // Spinners: alternating textures every 60 sprites
        let centre = Vec2::new(VIRTUAL_WIDTH as f32, VIRTUAL_HEIGHT as f32) * 0.5;
        for i in 0..SPINNERS {
            let t = i as f32 / SPINNERS as f32;
            let angle = t * TAU + time * 0.3;
            let radius = 120.0 + 180.0 * t;
            let position = centre + Vec2::from_angle(angle) * radius;

            let texture = if (i / 60) % 2 == 0 {
                self.disc
            } else {
                self.crate_tex
            };
            let size = 24.0 + 8.0 * (time * 2.0 + t * TAU).sin();
            let hue = Color::rgba(0.5 + 0.5 * t, 0.8, 1.0 - 0.5 * t, 0.9);

            self.batch.draw(
                texture,
                Rect::from_xywh(position.x, position.y, size, size),
                &DrawParams::new()
                    .color(hue)
                    .rotation(time * 2.0 + t * TAU)
                    .origin(Vec2::splat(size * 0.5)),
            )?;
        }

        // Mirrored crates
        let mirrors = [
            Mirror::NONE,
            Mirror::HORIZONTAL,
            Mirror::VERTICAL,
            Mirror::BOTH,
        ];
        for (i, mirror) in mirrors.into_iter().enumerate() {
            let position = Vec2::new(40.0 + i as f32 * 80.0, 40.0);
            self.batch.draw_at(
                self.crate_tex,
                position,
                &DrawParams::new()
                    .source(Rect::from_xywh(0.0, 0.0, 36.0, 48.0))
                    .mirror(mirror),
            )?;
        }

        let face = self.font.as_ref().and_then(|font| font.face(FONT_SIZE));
        if let (Some(font), Some(face)) = (&self.font, face) {
            let virtual_cursor = self.batch.virtual_position(cursor);
            let stats = self.last_stats;
            let lines = [
                format!("{} sprites, {} draw calls", stats.sprites, stats.draw_calls),
                format!(
                    "cursor: {:.0}, {:.0} (virtual)",
                    virtual_cursor.x, virtual_cursor.y
                ),
            ];
            let bottom = VIRTUAL_HEIGHT as f32 - 16.0 - 2.0 * face.line_height();
            for (i, line) in lines.iter().enumerate() {
                let position = Vec2::new(16.0, bottom + i as f32 * face.line_height());
                self.batch
                    .draw_text(line, font, FONT_SIZE, position, &plain)?;
            }

            // Title spins about its own centre
            let title = "spritebatch";
            let pivot = Vec2::new(measure(title, face), face.line_height()) * 0.5;
            self.batch.draw_text(
                title,
                font,
                FONT_SIZE,
                centre,
                &DrawParams::new()
                    .color(Color::rgb(1.0, 0.9, 0.4))
                    .origin(pivot)
                    .rotation(time * 0.5)
                    .scale(Vec2::splat(2.0)),
            )?;
        }

        self.last_stats = self.batch.end()?;
        self.batch.device_mut().present();
        Ok(())
    }
}

struct Demo {
    window: Option<Arc<Window>>,
    scene: Option<Scene>,
    font_path: Option<String>,
    cursor: Vec2,
    start_time: Instant,
}

impl ApplicationHandler for Demo {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title("spritebatch")
            .with_inner_size(winit::dpi::LogicalSize::new(VIRTUAL_WIDTH, VIRTUAL_HEIGHT));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        match Scene::new(window.clone(), self.font_path.as_deref()) {
            Ok(scene) => self.scene = Some(scene),
            Err(e) => {
                log::error!("failed to set up scene: {e}");
                event_loop.exit();
                return;
            }
        }
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(scene) = &mut self.scene {
                    scene.batch.device_mut().resize(size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
            }
            WindowEvent::RedrawRequested => {
                if let Some(scene) = &mut self.scene {
                    let time = self.start_time.elapsed().as_secs_f32();
                    if let Err(e) = scene.render(time, self.cursor) {
                        log::warn!("frame skipped: {e}");
                    }
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => (),
        }
    }
}

fn main() {
    env_logger::init();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("failed to create event loop: {e}");
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = Demo {
        window: None,
        scene: None,
        font_path: std::env::args().nth(1),
        cursor: Vec2::ZERO,
        start_time: Instant::now(),
    };
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("event loop error: {e}");
    }
}
