//! softraster viewer
//!
//! Renders a scene with the software rasterizer and presents the
//! framebuffer in a macroquad window.
//!
//! Usage: softraster [scene.ron]
//!
//! Controls:
//! - WASD: move, Q/E: down/up
//! - Arrow keys: look around
//! - Tab: wireframe, C: clip mode, G: shading mode, B: back-face culling
//! - Space: pause model rotation

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use macroquad::prelude::*;
use softraster::rasterizer::{self as sr, ClipMode, Framebuffer, ShadingMode, HEIGHT, WIDTH};
use softraster::world::{load_scene, load_scene_from_str, Scene};

/// Prints library log records to stderr
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

const MOVE_SPEED: f32 = 4.0;
const TURN_SPEED: f32 = 1.5;
const SPIN_SPEED: f32 = 0.6;

const DEMO_SCENE: &str = r#"(
    camera: (position: (x: 0.0, y: 1.5, z: -6.0), rotation: (x: -0.2, y: 0.0, z: 0.0)),
    lights: [
        Ambient(intensity: 0.25),
        Directional(direction: (x: 0.4, y: -1.0, z: 0.6), intensity: 0.6),
        Point(position: (x: -3.0, y: 2.0, z: -2.0), intensity: 0.4),
    ],
    meshes: [
        (
            name: "crate",
            source: Cube(size: 2.0),
            texture: Some(Checkerboard(
                size: 32,
                light: (r: 230, g: 200, b: 140, a: 255),
                dark: (r: 120, g: 80, b: 40, a: 255),
            )),
        ),
        (name: "tri", source: Triangle, color: Some((r: 80, g: 200, b: 120, a: 255))),
    ],
    models: [
        (mesh: "crate"),
        (mesh: "crate", scale: (x: 0.5, y: 0.5, z: 0.5), translation: (x: 2.5, y: -0.5, z: 1.0)),
        (mesh: "tri", scale: (x: 2.0, y: 2.0, z: 2.0), translation: (x: -2.5, y: 0.0, z: 0.5)),
    ],
)"#;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("softraster v{}", VERSION),
        window_width: WIDTH as i32 * 3,
        window_height: HEIGHT as i32 * 3,
        window_resizable: true,
        ..Default::default()
    }
}

fn load_startup_scene() -> Scene {
    if let Some(path) = std::env::args().nth(1) {
        match load_scene(&path) {
            Ok(scene) => {
                println!("Loaded scene {} ({} models)", path, scene.models.len());
                return scene;
            }
            Err(e) => eprintln!("Failed to load scene {}: {}, using demo scene", path, e),
        }
    }

    match load_scene_from_str(DEMO_SCENE) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Demo scene is invalid: {}", e);
            Scene {
                settings: Default::default(),
                camera: Default::default(),
                lights: Vec::new(),
                models: Vec::new(),
                clear_color: sr::Color::SKY,
            }
        }
    }
}

fn next_clip_mode(mode: ClipMode) -> ClipMode {
    match mode {
        ClipMode::Reject => ClipMode::Near,
        ClipMode::Near => ClipMode::Frustum,
        ClipMode::Frustum => ClipMode::Reject,
    }
}

fn handle_input(scene: &mut Scene, delta: f32) {
    let cam = &mut scene.camera;

    let step = MOVE_SPEED * delta;
    if is_key_down(KeyCode::W) {
        cam.move_forward(step);
    }
    if is_key_down(KeyCode::S) {
        cam.move_forward(-step);
    }
    if is_key_down(KeyCode::D) {
        cam.move_right(step);
    }
    if is_key_down(KeyCode::A) {
        cam.move_right(-step);
    }
    if is_key_down(KeyCode::E) {
        cam.move_by(sr::Vec3::UP * step);
    }
    if is_key_down(KeyCode::Q) {
        cam.move_by(sr::Vec3::UP * -step);
    }

    let turn = TURN_SPEED * delta;
    let mut rot = sr::Vec3::ZERO;
    if is_key_down(KeyCode::Up) {
        rot.x += turn;
    }
    if is_key_down(KeyCode::Down) {
        rot.x -= turn;
    }
    // positive yaw turns left
    if is_key_down(KeyCode::Left) {
        rot.y += turn;
    }
    if is_key_down(KeyCode::Right) {
        rot.y -= turn;
    }
    cam.rotate(rot);

    let settings = &mut scene.settings;
    if is_key_pressed(KeyCode::Tab) {
        settings.wireframe = !settings.wireframe;
    }
    if is_key_pressed(KeyCode::C) {
        settings.clip = next_clip_mode(settings.clip);
        println!("Clip mode: {:?}", settings.clip);
    }
    if is_key_pressed(KeyCode::G) {
        settings.shading = match settings.shading {
            ShadingMode::Face => ShadingMode::Smooth,
            ShadingMode::Smooth => ShadingMode::Face,
        };
        println!("Shading: {:?}", settings.shading);
    }
    if is_key_pressed(KeyCode::B) {
        settings.backface_cull = !settings.backface_cull;
        println!("Back-face culling: {}", settings.backface_cull);
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }

    let mut fb = Framebuffer::new(WIDTH, HEIGHT);
    let mut scene = load_startup_scene();
    let mut paused = false;

    println!("=== softraster v{} ===", VERSION);
    println!("WASD/QE move, arrows look, Tab wireframe, C clip, G shading, B culling, Space pause");

    loop {
        let delta = get_frame_time();

        handle_input(&mut scene, delta);
        if is_key_pressed(KeyCode::Space) {
            paused = !paused;
        }
        if !paused {
            for model in &mut scene.models {
                model.rotation.y += SPIN_SPEED * delta;
            }
        }
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        let stats = scene.render(&mut fb);

        // Present the framebuffer scaled to the window
        clear_background(BLACK);
        let texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.to_rgba_top_down());
        texture.set_filter(FilterMode::Nearest);

        let scale = (screen_width() / fb.width as f32).min(screen_height() / fb.height as f32);
        let (draw_w, draw_h) = (fb.width as f32 * scale, fb.height as f32 * scale);
        draw_texture_ex(
            &texture,
            (screen_width() - draw_w) * 0.5,
            (screen_height() - draw_h) * 0.5,
            WHITE,
            DrawTextureParams {
                dest_size: Some(Vec2::new(draw_w, draw_h)),
                ..Default::default()
            },
        );

        draw_text(
            &format!("{} fps  {}", get_fps(), stats),
            8.0,
            20.0,
            20.0,
            WHITE,
        );

        next_frame().await;
    }
}
