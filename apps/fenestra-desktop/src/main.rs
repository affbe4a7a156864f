use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use fenestra_common::Color;
use fenestra_composer::{ComposerConfig, SceneComposer};
use fenestra_input::GuiParams;
use fenestra_render_wgpu::{OrbitCamera, WgpuRenderer};
use fenestra_stream::FrameTimer;
use fenestra_tools::SceneInspector;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "fenestra-desktop", about = "Parametric window viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// glTF file with the handle_base and handle_grip meshes
    #[arg(long, default_value = "assets/models/handle.gltf")]
    handle_model: PathBuf,

    /// Give up on the handle model after this many milliseconds
    #[arg(long, default_value = "5000")]
    load_timeout_ms: u64,

    /// Quiet period before the wall is recut after a resize
    #[arg(long, default_value = "120")]
    debounce_ms: u64,
}

/// Application state.
struct AppState {
    composer: SceneComposer,
    camera: OrbitCamera,
    /// Widget values; diffed against the composer's parameters each frame.
    gui: GuiParams,
    timer: FrameTimer,
    show_panel: bool,
    orbiting: bool,
    last_error: Option<String>,
}

impl AppState {
    fn new(composer: SceneComposer) -> Self {
        Self {
            gui: composer.params(),
            composer,
            camera: OrbitCamera::default(),
            timer: FrameTimer::default(),
            show_panel: true,
            orbiting: false,
            last_error: None,
        }
    }

    fn update(&mut self, now: Instant) {
        self.timer.tick(now);
        if let Err(e) = self.composer.tick(now) {
            tracing::error!("frame update failed: {e}");
            self.last_error = Some(e.to_string());
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if !pressed {
            return;
        }
        match key {
            KeyCode::F1 => self.show_panel = !self.show_panel,
            KeyCode::KeyR => self.camera = OrbitCamera {
                aspect: self.camera.aspect,
                ..OrbitCamera::default()
            },
            _ => {}
        }
    }

    fn push_controls(&mut self) {
        let controls = self.gui.controls_since(&self.composer.params());
        if controls.is_empty() {
            return;
        }
        match self.composer.apply_all(controls, Instant::now()) {
            Ok(()) => self.last_error = None,
            Err(e) => {
                tracing::warn!("control rejected: {e}");
                self.last_error = Some(e.to_string());
                self.gui = self.composer.params();
            }
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        // Pointer release ends a slider drag: run the deferred wall cut now.
        if ctx.input(|i| i.pointer.any_released()) {
            if let Err(e) = self.composer.flush() {
                tracing::error!("wall recut failed: {e}");
            }
        }

        if !self.show_panel {
            return;
        }

        egui::SidePanel::left("controls")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Window");
                ui.separator();
                ui.add(
                    egui::Slider::new(&mut self.gui.rotation, GuiParams::ROTATION_RANGE)
                        .text("rotation"),
                );
                ui.add(egui::Slider::new(&mut self.gui.width, GuiParams::WIDTH_RANGE).text("width"));
                ui.add(
                    egui::Slider::new(&mut self.gui.height, GuiParams::HEIGHT_RANGE).text("height"),
                );
                ui.horizontal(|ui| {
                    let mut rgb = self.gui.color.to_rgb8();
                    if ui.color_edit_button_srgb(&mut rgb).changed() {
                        self.gui.color = Color::from_rgb8(rgb);
                    }
                    ui.label(format!("color {}", self.gui.color.to_hex()));
                });
                if let Some(err) = &self.last_error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }

                ui.separator();
                ui.heading("Handles");
                let stage = self.composer.stage();
                let frame = self.composer.frame();
                for (side, leaf) in [("left", frame.left_leaf()), ("right", frame.right_leaf())] {
                    let status = match leaf.handle() {
                        None => "none",
                        Some(h) if h.is_loading() => "loading",
                        Some(_) if leaf.handle_visible(stage) => "attached",
                        Some(_) => "hidden",
                    };
                    ui.label(format!("{side}: {status}"));
                }

                ui.separator();
                ui.heading("Stats");
                ui.label(format!(
                    "{:.0} fps  avg {:.2} ms  min {:.2} ms  max {:.2} ms",
                    self.timer.fps(),
                    ms(self.timer.average()),
                    ms(self.timer.min()),
                    ms(self.timer.max()),
                ));
                let summary = SceneInspector::summary(&stage.scene, &stage.meshes, &stage.materials);
                ui.label(format!("Frame: {}", summary.frame));
                ui.label(format!(
                    "Nodes: {}  Drawn: {}",
                    summary.node_count, summary.drawn_count
                ));
                ui.label(format!(
                    "Meshes: {}  Triangles: {}",
                    summary.mesh_count, summary.triangle_count
                ));
                ui.label(format!(
                    "Wall recuts: {}{}",
                    self.composer.wall_recuts(),
                    if self.composer.is_wall_resize_pending() {
                        " (pending)"
                    } else {
                        ""
                    }
                ));
                let eye = self.camera.eye();
                ui.label(format!("Camera: ({:.2}, {:.2}, {:.2})", eye.x, eye.y, eye.z));

                ui.separator();
                ui.small("F1: Toggle panel | LMB drag: Orbit | Wheel: Zoom | R: Reset view");
            });

        self.push_controls();
    }
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Everything that exists only once a window is up.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Fenestra")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("find adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("fenestra_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("surface has no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn redraw(&mut self, state: &mut AppState, egui_ctx: &EguiContext) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let released = state.composer.drain_released_meshes();
        self.renderer
            .sync_meshes(&self.device, &state.composer.stage().meshes, &released);
        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            &state.camera,
            &state.composer.render_scene(),
        );

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
        self.window.request_redraw();
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(composer: SceneComposer) -> Self {
        Self {
            state: AppState::new(composer),
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx) {
            Ok(gpu) => {
                self.state.camera.aspect = gpu.aspect();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size);
                self.state.camera.aspect = gpu.aspect();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state.orbiting = btn_state == ElementState::Pressed;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                self.state.camera.zoom(lines);
            }
            WindowEvent::RedrawRequested => {
                self.state.update(Instant::now());
                gpu.redraw(&mut self.state, &self.egui_ctx);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.orbiting && !self.egui_ctx.is_using_pointer() {
                self.state.camera.rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("fenestra-desktop starting");

    let config = ComposerConfig {
        handle_model: Some(cli.handle_model),
        load_timeout: Duration::from_millis(cli.load_timeout_ms),
        debounce: Duration::from_millis(cli.debounce_ms),
        keep_released: true,
    };
    let composer = SceneComposer::new(config).context("compose scene")?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(composer);
    event_loop.run_app(&mut app)?;

    Ok(())
}
