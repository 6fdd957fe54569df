//! energy-ticker: always-on-top energy strip
//!
//! Connects to the energy backend over WebSocket and renders the current
//! energy, a rotating headline and the recent trend with vello. Boost
//! requests go back over the same connection.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use vello::kurbo::Point;
use vello::peniko::FontData;
use vello::util::{RenderContext, RenderSurface};
use vello::{AaConfig, Renderer, RendererOptions, Scene};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowLevel};

use vello::wgpu;

use energy_ticker::config::{TickerConfig, WindowConfig};
use energy_ticker::config_watcher::ThemeWatcher;
use energy_ticker::feed::SnapshotFeed;
use energy_ticker::gateway::ActionGateway;
use energy_ticker::logging;
use energy_ticker::paths::TickerPaths;
use energy_ticker::render;
use energy_ticker::theme::ThemeTokens;
use energy_ticker::ticker::{AdoptionPolicy, TickerWidget};
use energy_ticker::view::{self, TickerLayout};
use energy_ticker::ws_client::{self, OutboundSender, SharedStatus};

/// Energy ticker strip
#[derive(Parser, Debug)]
#[command(name = "energy-ticker", version, about = "Live energy ticker strip")]
struct Args {
    /// Config file (defaults to ~/.config/energy-ticker/ticker.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend WebSocket URL, overrides [feed].url
    #[arg(short, long)]
    url: Option<String>,

    /// News adoption policy, overrides [store].adoption
    #[arg(long, value_enum)]
    adoption: Option<AdoptionPolicy>,

    /// Print the default config as TOML and exit
    #[arg(long)]
    print_default_config: bool,

    /// Do not hot-reload the [theme] section
    #[arg(long)]
    no_watch: bool,
}

#[derive(Debug)]
enum RenderState {
    Active {
        surface: Box<RenderSurface<'static>>,
        valid_surface: bool,
        window: Arc<Window>,
    },
    Suspended(Option<Arc<Window>>),
}

struct App {
    context: RenderContext,
    renderers: Vec<Option<Renderer>>,
    state: RenderState,
    scene: Scene,
    widget: TickerWidget,
    status: SharedStatus,
    gateway: OutboundSender,
    theme: ThemeTokens,
    theme_rx: Option<Receiver<ThemeTokens>>,
    window_config: WindowConfig,
    font_data: Option<FontData>,
    layout: Option<TickerLayout>,
    cursor: Point,
    /// Next scheduled wake. Reaching it draws a frame even without updates.
    wake_at: Option<Instant>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let RenderState::Suspended(cached_window) = &mut self.state else {
            return;
        };

        let window = match cached_window.take() {
            Some(window) => window,
            None => match create_window(event_loop, &self.window_config) {
                Ok(window) => window,
                Err(e) => {
                    error!(target: "app", "Failed to create window: {:#}", e);
                    event_loop.exit();
                    return;
                }
            },
        };

        let size = window.inner_size();
        let surface_future = self.context.create_surface(
            window.clone(),
            size.width,
            size.height,
            wgpu::PresentMode::AutoVsync,
        );
        let surface = match pollster::block_on(surface_future) {
            Ok(surface) => surface,
            Err(e) => {
                error!(target: "app", "Error creating surface: {}", e);
                event_loop.exit();
                return;
            }
        };

        self.renderers
            .resize_with(self.context.devices.len(), || None);
        if self.renderers[surface.dev_id].is_none() {
            match create_renderer(&self.context, &surface) {
                Ok(renderer) => self.renderers[surface.dev_id] = Some(renderer),
                Err(e) => {
                    error!(target: "app", "Couldn't create renderer: {:#}", e);
                    event_loop.exit();
                    return;
                }
            }
        }

        window.request_redraw();
        self.state = RenderState::Active {
            surface: Box::new(surface),
            valid_surface: true,
            window,
        };
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if let RenderState::Active { window, .. } = &self.state {
            self.state = RenderState::Suspended(Some(window.clone()));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (surface, valid_surface, window) = match &mut self.state {
            RenderState::Active {
                surface,
                valid_surface,
                window,
            } if window.id() == window_id => (surface, valid_surface, window.clone()),
            _ => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),

            // B boosts, same as clicking the button
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Character(ref c),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } if c.as_str().eq_ignore_ascii_case("b") => self.gateway.boost(),

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Point::new(position.x, position.y);
            }

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if self.layout.as_ref().is_some_and(|l| l.boost_hit(self.cursor)) {
                    self.gateway.boost();
                }
            }

            WindowEvent::Resized(size) => {
                if size.width != 0 && size.height != 0 {
                    self.context
                        .resize_surface(surface, size.width, size.height);
                    *valid_surface = true;
                    window.request_redraw();
                } else {
                    *valid_surface = false;
                }
            }

            WindowEvent::RedrawRequested => {
                if !*valid_surface {
                    return;
                }

                let connected = ws_client::read_status(&self.status).is_connected();
                let ticker_view = view::compose(&self.widget, connected);

                let width = surface.config.width as f64;
                let height = surface.config.height as f64;
                let layout = TickerLayout::compute(width, height, window.scale_factor(), &self.theme);

                self.scene.reset();
                render::render_ticker(
                    &mut self.scene,
                    &layout,
                    &ticker_view,
                    &self.theme,
                    &self.window_config.boost_label,
                    self.font_data.as_ref(),
                );
                self.layout = Some(layout);

                let device_handle = &self.context.devices[surface.dev_id];
                let Some(renderer) = self.renderers[surface.dev_id].as_mut() else {
                    return;
                };

                if let Err(e) = renderer.render_to_texture(
                    &device_handle.device,
                    &device_handle.queue,
                    &self.scene,
                    &surface.target_view,
                    &vello::RenderParams {
                        base_color: self.theme.background(),
                        width: surface.config.width,
                        height: surface.config.height,
                        antialiasing_method: AaConfig::Msaa16,
                    },
                ) {
                    error!(target: "app", "Failed to render to surface: {}", e);
                    return;
                }

                let surface_texture = match surface.surface.get_current_texture() {
                    Ok(texture) => texture,
                    Err(e) => {
                        warn!(target: "app", "Failed to get surface texture: {}", e);
                        window.request_redraw();
                        return;
                    }
                };

                let mut encoder =
                    device_handle
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Surface Blit"),
                        });
                surface.blitter.copy(
                    &device_handle.device,
                    &mut encoder,
                    &surface.target_view,
                    &surface_texture
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default()),
                );
                device_handle.queue.submit([encoder.finish()]);
                surface_texture.present();
                if let Err(e) = device_handle.device.poll(wgpu::PollType::Poll) {
                    warn!(target: "app", "Device poll failed: {}", e);
                }
            }

            _ => {}
        }
    }

    // The feed drains here, so a hidden or zero-sized window does not let
    // deliveries pile up between frames.
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if let Some(rx) = &self.theme_rx {
            while let Ok(theme) = rx.try_recv() {
                info!(target: "app", "Applying reloaded theme");
                self.theme = theme;
            }
        }
        let report = self.widget.pump(now);

        let woke = self.wake_at.is_none_or(|at| now >= at);
        if woke || report.updates > 0 {
            if let RenderState::Active {
                valid_surface: true,
                window,
                ..
            } = &self.state
            {
                window.request_redraw();
            }
        }

        if woke {
            self.wake_at = self.widget.next_wake(now);
        }
        match self.wake_at {
            Some(at) => event_loop.set_control_flow(ControlFlow::WaitUntil(at)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.widget.unmount() {
            info!(target: "app", "Ticker widget unmounted");
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", TickerConfig::default().to_toml());
        return Ok(());
    }

    let paths = TickerPaths::resolve();
    let _log_guard = logging::init(paths.as_ref().map(|p| p.logs.clone()));
    info!(target: "app", "energy-ticker v{}", env!("CARGO_PKG_VERSION"));

    if let Some(paths) = &paths {
        if let Err(e) = paths.ensure() {
            warn!(target: "paths", "Could not create app directories: {}", e);
        }
    }

    let config_path = args
        .config
        .clone()
        .or_else(|| paths.as_ref().map(TickerPaths::config_file));

    let mut config = match &config_path {
        Some(path) => TickerConfig::load(path)?,
        None => TickerConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(url) = args.url {
        config.feed.url = url;
    }
    if let Some(adoption) = args.adoption {
        config.store.adoption = adoption;
    }
    config.validate().context("Invalid configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let feed = SnapshotFeed::new();
    let widget = TickerWidget::mount(&feed, &config.widget_settings());
    info!(target: "app", url = %config.feed.url, "Connecting to backend");
    let (status, gateway) = ws_client::spawn_client(
        &runtime,
        config.feed.url.clone(),
        feed,
        config.reconnect_delay(),
    );

    let watcher = match (&config_path, args.no_watch) {
        (Some(path), false) => match ThemeWatcher::start(path.clone()) {
            Ok((watcher, rx)) => {
                info!(target: "config", path = %watcher.path().display(), "Watching theme");
                Some((watcher, rx))
            }
            Err(e) => {
                warn!(target: "config", "Theme hot-reload disabled: {:#}", e);
                None
            }
        },
        _ => None,
    };
    let (_watcher, theme_rx) = match watcher {
        Some((w, rx)) => (Some(w), Some(rx)),
        None => (None, None),
    };

    let font_data = render::load_readable_font();
    if font_data.is_none() {
        warn!(target: "render", "No system font found, text will use placeholder blocks");
    }

    let mut app = App {
        context: RenderContext::new(),
        renderers: vec![],
        state: RenderState::Suspended(None),
        scene: Scene::new(),
        widget,
        status,
        gateway,
        theme: config.theme.clone(),
        theme_rx,
        window_config: config.window.clone(),
        font_data,
        layout: None,
        cursor: Point::ZERO,
        wake_at: None,
    };

    let event_loop = EventLoop::new()?;
    event_loop
        .run_app(&mut app)
        .context("Couldn't run event loop")?;

    app.widget.unmount();
    runtime.shutdown_timeout(Duration::from_secs(1));

    Ok(())
}

fn create_window(event_loop: &ActiveEventLoop, config: &WindowConfig) -> Result<Arc<Window>> {
    let mut attr = Window::default_attributes()
        .with_title("energy-ticker")
        .with_decorations(config.decorations)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

    if config.always_on_top {
        attr = attr.with_window_level(WindowLevel::AlwaysOnTop);
    }
    if let (Some(x), Some(y)) = (config.x, config.y) {
        attr = attr.with_position(winit::dpi::LogicalPosition::new(x, y));
    }

    Ok(Arc::new(event_loop.create_window(attr)?))
}

fn create_renderer(render_cx: &RenderContext, surface: &RenderSurface<'_>) -> Result<Renderer> {
    Renderer::new(
        &render_cx.devices[surface.dev_id].device,
        RendererOptions::default(),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
