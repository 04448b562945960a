use std::sync::Arc;
use std::time::Instant;

use pixels::{Pixels, SurfaceTexture};
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::frame::{Canvas, Controller, DisplayConfig, FrameError, ImageLoader, Result, ScaleMode};

/// Events injected into the render loop from other threads.
#[derive(Clone, Copy, Debug)]
pub enum FrameEvent {
    Shutdown,
}

pub fn create_event_loop() -> Result<EventLoop<FrameEvent>> {
    Ok(EventLoop::with_user_event().build()?)
}

/// Open the frame window and run the tick loop until it is closed.
pub fn run_display<L: ImageLoader>(
    event_loop: EventLoop<FrameEvent>,
    config: DisplayConfig,
    controller: Controller<L>,
) -> Result<()> {
    let mut app = FrameApp {
        config,
        controller,
        window: None,
        pixels: None,
        size: (1, 1),
        next_tick: Instant::now(),
        error: None,
    };
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct FrameApp<L> {
    config: DisplayConfig,
    controller: Controller<L>,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    size: (u32, u32),
    next_tick: Instant,
    error: Option<FrameError>,
}

impl<L: ImageLoader> FrameApp<L> {
    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut attrs = Window::default_attributes().with_title(self.config.title.clone());
        if self.config.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = Arc::new(event_loop.create_window(attrs)?);
        if self.config.fullscreen {
            window.set_cursor_visible(false);
        }

        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));
        let surface = SurfaceTexture::new(width, height, Arc::clone(&window));
        let pixels = Pixels::new(width, height, surface)?;
        info!(width, height, fullscreen = self.config.fullscreen, "Opened frame window");

        self.size = (width, height);
        self.window = Some(window);
        self.pixels = Some(pixels);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        if let Some(pixels) = &mut self.pixels {
            pixels.resize_surface(width, height)?;
            pixels.resize_buffer(width, height)?;
            self.size = (width, height);
        }
        Ok(())
    }

    fn redraw(&mut self) {
        let Some(pixels) = &mut self.pixels else {
            return;
        };
        let (width, height) = self.size;
        let mut canvas = Canvas::new(pixels.frame_mut(), width, height);
        self.controller.draw(&mut canvas);
        if let Err(e) = pixels.render() {
            error!(error = %e, "Render error");
        }
    }

    fn key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        let mut playlist = self.controller.playlist().lock();
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::ArrowRight => playlist.next_image(),
            KeyCode::ArrowLeft => playlist.previous_image(),
            KeyCode::KeyF => playlist.set_scale_mode(ScaleMode::Fit),
            KeyCode::KeyL => playlist.set_scale_mode(ScaleMode::Fill),
            _ => {}
        }
    }
}

impl<L: ImageLoader> ApplicationHandler<FrameEvent> for FrameApp<L> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.open(event_loop) {
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FrameEvent) {
        match event {
            FrameEvent::Shutdown => {
                info!("Shutdown requested, closing window");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Err(e) = self.resize(size.width, size.height) {
                    error!(error = %e, "Failed to resize surface");
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.key(event_loop, code),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_tick {
            self.controller.update(now);
            if self.controller.needs_redraw(self.size) {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            self.next_tick = now + self.config.tick;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // surface first, it borrows the window
        self.pixels = None;
        self.window = None;
        info!("Frame window closed");
    }
}
