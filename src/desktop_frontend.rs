use crate::clock::{format_clock, PlaybackClock};
use crate::config::{ConfigRepository, JsonFileRepository, NullRepository};
use crate::palette::Rgb;
use crate::pixel_font;
use crate::raster::PixelCanvas;
use crate::renderer::PianoRoll;
use crate::song::{self, Song};
use crate::viewport::HostLayout;

use softbuffer::{Context, Surface};
use std::error::Error;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;
use winit::{
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Fullscreen, Window, WindowBuilder},
};

const CANVAS_BACKGROUND: Rgb = Rgb::from_u32(0x1E1E1E);
const HUD_BACKGROUND: u32 = 0x00101010;
const HUD_TEXT: u32 = 0x00DDDDDD;
// CSS pixels reserved for the time display in fullscreen.
const CONTROLS_HEIGHT: f64 = 32.0;
const SEEK_STEP: f64 = 5.0;
const WINDOW_STEP: f64 = 0.5;
const OFFSET_STEP: f64 = 0.05;

type WindowSurface = Surface<Rc<Window>, Rc<Window>>;

/// Opens the piano-roll window and plays `song_path` (or the demo song) until closed.
pub fn run(song_path: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let song = match song_path {
        Some(path) => song::load_song(&path)?,
        None => song::demo_song(),
    };
    let total = song.duration();

    let repo: Box<dyn ConfigRepository> = match JsonFileRepository::default_location() {
        Some(repo) => {
            log::info!("Render preferences at {}", repo.path().display());
            Box::new(repo)
        }
        None => {
            log::warn!("No config directory found; preferences will not be saved");
            Box::new(NullRepository)
        }
    };

    let mut roll = PianoRoll::new(repo);
    roll.set_notes(song.notes.clone());
    roll.attach_surface(PixelCanvas::new().with_background(CANVAS_BACKGROUND));

    let event_loop = EventLoop::new()?;
    let window = Rc::new(
        WindowBuilder::new()
            .with_title(window_title(&song))
            .with_inner_size(winit::dpi::LogicalSize::new(1000.0, 700.0))
            .build(&event_loop)?,
    );
    log::info!("Window created");

    let context = Context::new(window.clone())?;
    let mut surface = Surface::new(&context, window.clone())?;
    let mut clock = PlaybackClock::new();

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => elwt.exit(),

                WindowEvent::Resized(size) => {
                    let (Some(w), Some(h)) =
                        (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                    else {
                        return;
                    };
                    if let Err(e) = surface.resize(w, h) {
                        log::warn!("Surface resize failed: {e}");
                        return;
                    }
                    roll.layout(&host_layout(&window));
                    window.request_redraw();
                }

                WindowEvent::ScaleFactorChanged { .. } => {
                    roll.layout(&host_layout(&window));
                    window.request_redraw();
                }

                WindowEvent::KeyboardInput { event, .. } => {
                    if handle_key(&event, &mut roll, &mut clock, &window) {
                        window.request_redraw();
                    }
                }

                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let mut t = clock.current_time_at(now);
                    if clock.is_playing() && t > total {
                        clock.pause(now);
                        clock.seek(total, now);
                        t = total;
                    }

                    roll.update_active_state(t);
                    roll.draw_frame(t);

                    let hud = if clock.is_playing() {
                        format!("{} / {}", format_clock(t), format_clock(total))
                    } else {
                        format!("{} / {}  PAUSE", format_clock(t), format_clock(total))
                    };
                    if let Err(e) = present(&mut surface, &window, &roll, &hud) {
                        log::warn!("Present failed: {e}");
                    }
                }

                _ => {}
            },
            Event::AboutToWait => {
                if clock.is_playing() {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}

fn window_title(song: &Song) -> String {
    if song.name.is_empty() {
        "Piano Roll".to_owned()
    } else {
        format!("Piano Roll: {}", song.name)
    }
}

fn host_layout(window: &Window) -> HostLayout {
    let dpr = window.scale_factor();
    let size = window.inner_size().to_logical::<f64>(dpr);
    HostLayout {
        container_width: size.width,
        container_height: size.height,
        window_height: size.height,
        fullscreen: window.fullscreen().is_some(),
        controls_height: Some(CONTROLS_HEIGHT),
        device_pixel_ratio: dpr,
    }
}

/// Applies a key press. Returns whether the frame needs repainting.
fn handle_key(
    event: &KeyEvent,
    roll: &mut PianoRoll<PixelCanvas>,
    clock: &mut PlaybackClock,
    window: &Window,
) -> bool {
    if event.state != ElementState::Pressed {
        return false;
    }
    let now = Instant::now();
    let config = *roll.config();

    match event.logical_key.as_ref() {
        Key::Named(NamedKey::Space) => clock.toggle(now),
        Key::Named(NamedKey::ArrowLeft) => clock.seek_by(-SEEK_STEP, now),
        Key::Named(NamedKey::ArrowRight) => clock.seek_by(SEEK_STEP, now),
        Key::Named(NamedKey::Home) => clock.seek(0.0, now),
        Key::Character("l") => roll.set_show_labels(!config.show_labels),
        Key::Character("o") => roll.set_show_octave_lines(!config.show_octave_lines),
        Key::Character("+") | Key::Character("=") => {
            roll.set_visible_window_seconds(config.visible_window_seconds + WINDOW_STEP)
        }
        Key::Character("-") => {
            roll.set_visible_window_seconds(config.visible_window_seconds - WINDOW_STEP)
        }
        Key::Character("[") => {
            roll.set_audio_visual_offset(config.audio_visual_offset - OFFSET_STEP)
        }
        Key::Character("]") => {
            roll.set_audio_visual_offset(config.audio_visual_offset + OFFSET_STEP)
        }
        Key::Character("f") => {
            // Resized follows and re-runs the layout.
            if window.fullscreen().is_some() {
                window.set_fullscreen(None);
            } else {
                window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            }
        }
        _ => return false,
    }
    true
}

/// Copies the rendered canvas into the window buffer and draws the time display below it.
fn present(
    surface: &mut WindowSurface,
    window: &Window,
    roll: &PianoRoll<PixelCanvas>,
    hud: &str,
) -> Result<(), softbuffer::SoftBufferError> {
    let size = window.inner_size();
    let (w, h) = (size.width as usize, size.height as usize);
    if w == 0 || h == 0 {
        return Ok(());
    }

    let mut buffer = surface.buffer_mut()?;
    buffer.fill(HUD_BACKGROUND);

    let mut canvas_bottom = 0;
    if let Some(canvas) = roll.surface() {
        let cw = canvas.width().min(w);
        let ch = canvas.height().min(h);
        for (y, row) in canvas.pixels().chunks_exact(canvas.width().max(1)).take(ch).enumerate() {
            buffer[y * w..y * w + cw].copy_from_slice(&row[..cw]);
        }
        canvas_bottom = ch;
    }

    let dpr = window.scale_factor();
    let cell = (2.0 * dpr).round().max(1.0) as i32;
    let margin = (8.0 * dpr).round() as i32;
    let text_y = if canvas_bottom + (pixel_font::text_height(cell) + margin) as usize <= h {
        canvas_bottom as i32 + margin
    } else {
        margin
    };
    pixel_font::draw_text(&mut buffer, w, h, margin, text_y, hud, HUD_TEXT, cell, false);

    buffer.present()
}
