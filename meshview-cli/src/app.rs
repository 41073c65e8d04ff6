//! Interactive preview window
//!
//! winit drives everything: frame requests become redraw requests, the model
//! is decoded on a worker thread and handed back as a user event, and mouse
//! input plays the orbit control.

use std::sync::Arc;

use anyhow::Result;
use meshview_core::TopologyAttributes;
use meshview_gpu::{SceneRenderConfig, SceneRenderer};
use meshview_io::{LoadError, ModelSource};
use meshview_viewer::{
    DecodedLoad, FrameScheduler, FrameToken, LoadStatus, Nudge, Toggle, Viewer, ViewerObserver,
    ViewerOptions,
};
use tracing::{error, info, warn};
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoopBuilder},
    keyboard::{Key, NamedKey},
    window::{Window, WindowBuilder},
};

const ORBIT_SPEED: f32 = 0.01;
const ZOOM_STEP: f32 = 0.1;

/// Frame scheduling through window redraw requests
///
/// winit coalesces redraw requests, so at most one token is outstanding.
pub struct WinitScheduler {
    window: Arc<Window>,
    next: u64,
    pending: Option<FrameToken>,
}

impl WinitScheduler {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next: 0,
            pending: None,
        }
    }

    /// Claim the outstanding request when its redraw arrives
    pub fn take_pending(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }
}

impl FrameScheduler for WinitScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next += 1;
        let token = FrameToken(self.next);
        self.pending = Some(token);
        self.window.request_redraw();
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending == Some(token) {
            self.pending = None;
        }
    }
}

/// Reports viewer events to the log
struct LogObserver;

impl ViewerObserver for LogObserver {
    fn on_load(&mut self) {
        info!("model displayed");
    }

    fn on_topology(&mut self, attributes: &TopologyAttributes) {
        info!(
            size_x = attributes.size_x,
            size_y = attributes.size_y,
            size_z = attributes.size_z,
            volume = attributes.volume,
            area = attributes.area,
            triangles = attributes.triangle_count,
            "topology"
        );
    }

    fn on_error(&mut self, error: &LoadError) {
        error!("{}", error);
    }
}

type WindowViewer = Viewer<SceneRenderer<'static>, WinitScheduler>;

#[derive(Default)]
struct Pointer {
    dragging: bool,
    last: Option<PhysicalPosition<f64>>,
}

/// Open a window previewing `source` until it is closed
pub fn run(options: ViewerOptions, source: ModelSource) -> Result<()> {
    let event_loop = EventLoopBuilder::<DecodedLoad>::with_user_event().build()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(format!("meshview - {}", source.display_name()))
            .with_inner_size(LogicalSize::new(options.width, options.height))
            .build(&event_loop)?,
    );

    let size = window.inner_size();
    let [r, g, b] = options.background_rgb();
    let config = SceneRenderConfig {
        background_color: [r as f64, g as f64, b as f64, 1.0],
        ..SceneRenderConfig::default()
    };
    let renderer = pollster::block_on(SceneRenderer::new(
        Arc::clone(&window),
        size.width,
        size.height,
        config,
    ))?;

    let mut viewer: WindowViewer = Viewer::new(
        ViewerOptions {
            width: size.width.max(1),
            height: size.height.max(1),
            ..options
        },
        renderer,
        WinitScheduler::new(Arc::clone(&window)),
    )
    .with_observer(LogObserver);

    let pending = viewer.begin_load(source);
    let loader = Arc::clone(viewer.loader());
    let proxy = event_loop.create_proxy();
    std::thread::spawn(move || {
        let decoded = pending.decode(&loader);
        if proxy.send_event(decoded).is_err() {
            warn!("window closed before the model finished decoding");
        }
    });

    print_controls();
    let mut pointer = Pointer::default();

    event_loop.run(move |event, target| {
        target.set_control_flow(ControlFlow::Wait);

        match event {
            Event::UserEvent(decoded) => match viewer.complete_load(decoded) {
                LoadStatus::Fallback { .. } => {
                    if let Some(message) = viewer.view_state().message() {
                        warn!("{}", message);
                    }
                }
                LoadStatus::Failed(_) | LoadStatus::Ready | LoadStatus::Stale => {}
            },
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    viewer.destroy();
                    target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    viewer.resize(new_size.width, new_size.height);
                }
                WindowEvent::RedrawRequested => {
                    match viewer.scheduler_mut().take_pending() {
                        Some(token) => viewer.tick(token),
                        None => viewer.draw_now(),
                    };
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => {
                    pointer.dragging = state == ElementState::Pressed;
                }
                WindowEvent::CursorMoved { position, .. } => {
                    if let (true, Some(last)) = (pointer.dragging, pointer.last) {
                        let dx = (position.x - last.x) as f32;
                        let dy = (position.y - last.y) as f32;
                        viewer.orbit(-dx * ORBIT_SPEED, -dy * ORBIT_SPEED);
                    }
                    pointer.last = Some(position);
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    let scroll = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                    };
                    viewer.zoom((1.0 + scroll * ZOOM_STEP).max(ZOOM_STEP));
                }
                WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                    handle_key(&mut viewer, &event.logical_key);
                }
                _ => {}
            },
            _ => {}
        }
    })?;

    Ok(())
}

fn handle_key(viewer: &mut WindowViewer, key: &Key) {
    match key {
        Key::Named(NamedKey::ArrowUp) => {
            viewer.nudge(Nudge::Up);
        }
        Key::Named(NamedKey::ArrowDown) => {
            viewer.nudge(Nudge::Down);
        }
        Key::Named(NamedKey::ArrowLeft) => {
            viewer.nudge(Nudge::Left);
        }
        Key::Named(NamedKey::ArrowRight) => {
            viewer.nudge(Nudge::Right);
        }
        Key::Character(c) => {
            let toggle = match c.to_ascii_lowercase().as_str() {
                "s" => Toggle::Shaded,
                "w" => Toggle::Wireframe,
                "m" => Toggle::MeasurementOverlay,
                "i" => Toggle::InfoPanel,
                "g" => Toggle::GroundPlane,
                "r" => {
                    viewer.reset_camera();
                    return;
                }
                _ => return,
            };
            let value = !viewer.toggles().get(toggle);
            if viewer.set_toggle(toggle, value) {
                info!(?toggle, value, "toggled");
            }
            if toggle == Toggle::InfoPanel {
                if let Some(attributes) = viewer.visible_topology() {
                    println!("{}", format_info_panel(attributes));
                }
            }
        }
        _ => {}
    }
}

fn format_info_panel(attributes: &TopologyAttributes) -> String {
    format!(
        "size: {:.2} x {:.2} x {:.2} mm\nvolume: {:.2} mm3\narea: {:.2} mm2\ntriangles: {}",
        attributes.size_x,
        attributes.size_y,
        attributes.size_z,
        attributes.volume,
        attributes.area,
        attributes.triangle_count
    )
}

fn print_controls() {
    println!("Controls:");
    println!("  Left drag     orbit");
    println!("  Mouse wheel   zoom");
    println!("  Arrow keys    pan");
    println!("  S / W / M     shaded, wireframe, measurements");
    println!("  I / G         info panel, ground plane");
    println!("  R             reset camera");
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshview_core::TopologyAttributes;

    #[test]
    fn test_info_panel_text() {
        let attributes = TopologyAttributes {
            size_x: 10.0,
            size_y: 20.0,
            size_z: 30.0,
            volume: 6000.0,
            area: 2200.0,
            triangle_count: 12,
        };
        let text = format_info_panel(&attributes);
        assert!(text.starts_with("size: 10.00 x 20.00 x 30.00 mm"));
        assert!(text.contains("triangles: 12"));
    }
}
