use crate::config::ComposerConfig;
use fenestra_assembly::{
    AssemblyError, DoorMaterials, HandleLoad, Stage, WallMaterials, WindowFrame, WindowWall,
};
use fenestra_assets::{HandleModel, Material, import_handle_model};
use fenestra_common::{Color, MeshHandle, Span};
use fenestra_input::{Control, GuiParams};
use fenestra_render::{Lighting, RenderScene};
use fenestra_stream::{LoadTask, ResizeDebouncer};
use std::time::Instant;

/// Owns the scene and both assemblies, and routes GUI controls into them.
#[derive(Debug)]
pub struct SceneComposer {
    config: ComposerConfig,
    stage: Stage,
    frame: WindowFrame,
    wall: WindowWall,
    params: GuiParams,
    floor_y: f32,
    lighting: Lighting,
    wall_resize: ResizeDebouncer<(Span, Span)>,
    wall_recuts: u64,
}

impl SceneComposer {
    pub fn new(config: ComposerConfig) -> Result<Self, AssemblyError> {
        let _span = tracing::info_span!("compose").entered();
        let params = GuiParams::default();
        let mut stage = Stage::new();

        let metal = stage.materials.register(Material::metal(params.color));
        let glass = stage.materials.register(Material::glass());
        let wall_material = stage.materials.register(Material::wall());
        let cutter = stage.materials.register(Material::cutter());

        let span = Span::new(params.width, params.height);
        let frame = WindowFrame::new(&mut stage, span, DoorMaterials { metal, glass }, true)?;
        let wall = WindowWall::new(
            &mut stage,
            Self::wall_span(span),
            span,
            WallMaterials {
                wall: wall_material,
                cutter,
            },
        )?;

        let mut composer = Self {
            wall_resize: ResizeDebouncer::new(config.debounce),
            config,
            stage,
            frame,
            wall,
            params,
            floor_y: -params.height,
            lighting: Lighting::default(),
            wall_recuts: 0,
        };

        if let Some(path) = composer.config.handle_model.clone() {
            let timeout = composer.config.load_timeout;
            let started = Instant::now();
            composer.load_handles_with(|label| {
                let path = path.clone();
                let task = LoadTask::spawn(label, timeout, started, move |_token| {
                    Ok(import_handle_model(&path)?)
                })?;
                Ok(task)
            })?;
        }
        Ok(composer)
    }

    /// The wall around a window of `frame`: twice as wide and twice as tall.
    pub fn wall_span(frame: Span) -> Span {
        Span::new(frame.width * 2.0, frame.height * 2.0)
    }

    /// Start handle loads on both leaves with tasks built by `spawn`.
    /// Loads already in flight are cancelled.
    pub fn load_handles_with<F>(&mut self, spawn: F) -> Result<(), AssemblyError>
    where
        F: FnMut(&str) -> Result<LoadTask<HandleModel>, AssemblyError>,
    {
        self.frame.start_handle_loads(spawn)
    }

    /// Route one GUI control. Values are clamped to the slider ranges first.
    /// On error nothing changed, parameters included.
    pub fn apply(&mut self, control: Control, now: Instant) -> Result<(), AssemblyError> {
        tracing::debug!(?control, "control");
        let mut next = self.params;
        next.apply(control);
        match control {
            Control::SetRotation(_) => {
                self.frame.set_rotation(&mut self.stage, next.rotation)?;
            }
            Control::SetWidth(_) | Control::SetHeight(_) => {
                self.resize(Span::new(next.width, next.height), now)?;
            }
            Control::SetColor(_) => {
                self.frame.set_material_color(&mut self.stage, next.color)?;
            }
        }
        self.params = next;
        Ok(())
    }

    /// Apply every control in order, stopping at the first failure.
    pub fn apply_all(
        &mut self,
        controls: impl IntoIterator<Item = Control>,
        now: Instant,
    ) -> Result<(), AssemblyError> {
        controls
            .into_iter()
            .try_for_each(|control| self.apply(control, now))
    }

    fn resize(&mut self, span: Span, now: Instant) -> Result<(), AssemblyError> {
        let wall = Self::wall_span(span);
        WindowWall::validate(wall, span)?;
        self.frame.set_size(&mut self.stage, span)?;
        self.wall_resize.request((wall, span), now);
        self.floor_y = -span.height;
        Ok(())
    }

    /// Once-per-frame bookkeeping: poll handle loads, run a settled wall
    /// recut and advance the scene frame.
    pub fn tick(&mut self, now: Instant) -> Result<(), AssemblyError> {
        for (side, result) in ["left", "right"]
            .into_iter()
            .zip(self.frame.poll_handles(&mut self.stage, now))
        {
            match result {
                Ok(HandleLoad::Attached) => tracing::debug!(side, "handle ready"),
                Ok(HandleLoad::Cancelled) => tracing::debug!(side, "handle load cancelled"),
                Ok(HandleLoad::Idle | HandleLoad::Pending) => {}
                Err(err) => tracing::warn!(side, error = %err, "handle load failed"),
            }
        }

        if let Some((wall, hole)) = self.wall_resize.poll(now) {
            self.recut(wall, hole)?;
        }

        if !self.config.keep_released {
            let dropped = self.stage.meshes.drain_released();
            if !dropped.is_empty() {
                tracing::trace!(count = dropped.len(), "released meshes discarded");
            }
        }

        self.stage.scene.advance_frame();
        let events = self.stage.scene.drain_events();
        tracing::trace!(events = events.len(), frame = self.stage.scene.frame(), "tick");
        Ok(())
    }

    /// Run a pending wall recut now, e.g. on pointer release.
    /// Returns whether one was pending.
    pub fn flush(&mut self) -> Result<bool, AssemblyError> {
        match self.wall_resize.flush() {
            Some((wall, hole)) => {
                self.recut(wall, hole)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn recut(&mut self, wall: Span, hole: Span) -> Result<(), AssemblyError> {
        self.wall.set_size(&mut self.stage, wall, hole)?;
        self.wall_recuts += 1;
        tracing::debug!(
            width = wall.width,
            height = wall.height,
            coalesced = self.wall_resize.coalesced(),
            "wall recut"
        );
        Ok(())
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn frame(&self) -> &WindowFrame {
        &self.frame
    }

    pub fn wall(&self) -> &WindowWall {
        &self.wall
    }

    pub fn params(&self) -> GuiParams {
        self.params
    }

    pub fn color(&self) -> Color {
        self.params.color
    }

    pub fn floor_y(&self) -> f32 {
        self.floor_y
    }

    pub fn lighting(&self) -> Lighting {
        self.lighting
    }

    pub fn wall_recuts(&self) -> u64 {
        self.wall_recuts
    }

    pub fn is_wall_resize_pending(&self) -> bool {
        self.wall_resize.is_pending()
    }

    /// Meshes released since the last call, for the renderer to free.
    /// Without [`ComposerConfig::keep_released`] each `tick` empties this queue.
    pub fn drain_released_meshes(&mut self) -> Vec<MeshHandle> {
        self.stage.meshes.drain_released()
    }

    pub fn render_scene(&self) -> RenderScene<'_> {
        RenderScene {
            scene: &self.stage.scene,
            meshes: &self.stage.meshes,
            materials: &self.stage.materials,
            lighting: self.lighting,
            floor_y: self.floor_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fenestra_assets::{HandlePart, Pattern};
    use fenestra_common::Transform;
    use fenestra_mesh::Mesh;
    use fenestra_stream::Completer;
    use glam::Vec3;
    use std::path::PathBuf;
    use std::time::Duration;

    fn composer() -> SceneComposer {
        SceneComposer::new(ComposerConfig::default()).unwrap()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn model() -> HandleModel {
        HandleModel {
            base: HandlePart {
                mesh: Mesh::cuboid(Vec3::new(0.03, 0.1, 0.012)),
                transform: Transform::default(),
            },
            grip: HandlePart {
                mesh: Mesh::cuboid(Vec3::new(0.016, 0.11, 0.016)),
                transform: Transform::from_position(Vec3::new(0.0, 0.0, 0.014)),
            },
        }
    }

    fn manual_loads(c: &mut SceneComposer, timeout: Duration, t0: Instant) -> Vec<Completer<HandleModel>> {
        let mut completers = Vec::new();
        c.load_handles_with(|label| {
            let (task, completer) = LoadTask::pending(label, timeout, t0);
            completers.push(completer);
            Ok(task)
        })
        .unwrap();
        completers
    }

    fn bundled_model() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/models/handle.gltf")
    }

    #[test]
    fn initial_scene() {
        let c = composer();
        assert_eq!(c.frame().span(), Span::new(1.0, 1.0));
        assert_eq!(c.wall().span(), Span::new(2.0, 2.0));
        assert_eq!(c.wall().hole_span(), Span::new(1.0, 1.0));
        assert_eq!(c.floor_y(), -1.0);
        assert_eq!(c.stage().materials.len(), 4);
        assert_eq!(c.lighting(), Lighting::default());
        assert!(!c.frame().left_leaf().handle_visible(c.stage()));
    }

    #[test]
    fn width_resizes_frame_at_once_and_wall_after_quiet_period() {
        let mut c = composer();
        let t0 = Instant::now();
        c.apply(Control::SetWidth(2.0), t0).unwrap();

        assert_eq!(c.frame().span(), Span::new(2.0, 1.0));
        assert!(close(c.frame().left_leaf().width(), 0.95));
        assert_eq!(c.wall().span(), Span::new(2.0, 2.0));
        assert!(c.is_wall_resize_pending());

        c.tick(t0 + Duration::from_millis(10)).unwrap();
        assert_eq!(c.wall_recuts(), 0);

        c.tick(t0 + Duration::from_millis(200)).unwrap();
        assert_eq!(c.wall().span(), Span::new(4.0, 2.0));
        assert_eq!(c.wall().hole_span(), Span::new(2.0, 1.0));
        assert_eq!(c.wall_recuts(), 1);
        assert!(!c.is_wall_resize_pending());
    }

    #[test]
    fn height_moves_the_floor() {
        let mut c = composer();
        let t0 = Instant::now();
        c.apply(Control::SetHeight(1.5), t0).unwrap();
        assert_eq!(c.floor_y(), -1.5);
        assert!(close(c.frame().left_leaf().height(), 1.4));
        assert_eq!(c.params().height, 1.5);
    }

    #[test]
    fn burst_of_resizes_recuts_once() {
        let mut c = composer();
        let t0 = Instant::now();
        for i in 0..10 {
            let now = t0 + Duration::from_millis(i * 16);
            c.apply(Control::SetWidth(1.0 + i as f32 * 0.1), now).unwrap();
            c.tick(now).unwrap();
        }
        assert_eq!(c.wall_recuts(), 0);
        assert!(c.flush().unwrap());
        assert_eq!(c.wall_recuts(), 1);
        assert!(close(c.wall().hole_span().width, 1.9));
        assert!(!c.flush().unwrap());
    }

    #[test]
    fn headless_tick_discards_released_meshes() {
        let mut c = composer();
        let now = Instant::now();
        for i in 0..5 {
            c.apply(Control::SetHeight(1.0 + i as f32 * 0.1), now).unwrap();
            c.flush().unwrap();
            c.tick(now).unwrap();
        }
        assert_eq!(c.wall_recuts(), 5);
        assert!(c.drain_released_meshes().is_empty());
    }

    #[test]
    fn kept_released_meshes_survive_tick() {
        let config = ComposerConfig {
            keep_released: true,
            ..ComposerConfig::default()
        };
        let mut c = SceneComposer::new(config).unwrap();
        let before = c.wall().geometry();
        let now = Instant::now();
        c.apply(Control::SetHeight(2.0), now).unwrap();
        c.flush().unwrap();
        c.tick(now).unwrap();
        assert_eq!(c.drain_released_meshes(), vec![before]);
    }

    #[test]
    fn old_wall_geometry_is_released() {
        let mut c = composer();
        let before = c.wall().geometry();
        c.apply(Control::SetHeight(2.0), Instant::now()).unwrap();
        c.flush().unwrap();
        let released = c.drain_released_meshes();
        assert_eq!(released, vec![before]);
        assert!(c.stage().meshes.get(before).is_none());
        assert!(c.drain_released_meshes().is_empty());
    }

    #[test]
    fn rejected_resize_changes_nothing() {
        let mut c = composer();
        let err = c.apply(Control::SetWidth(f32::NAN), Instant::now()).unwrap_err();
        assert!(matches!(err, AssemblyError::Resize(_)));
        assert_eq!(c.params().width, 1.0);
        assert_eq!(c.frame().span(), Span::new(1.0, 1.0));
        assert!(!c.is_wall_resize_pending());
    }

    #[test]
    fn rejected_rotation_changes_nothing() {
        let mut c = composer();
        let now = Instant::now();
        c.apply(Control::SetRotation(0.5), now).unwrap();
        let root = c.frame().left_leaf().root();
        let before = c.stage().scene.transform(root).unwrap();

        let err = c.apply(Control::SetRotation(f32::NAN), now).unwrap_err();
        assert!(matches!(err, AssemblyError::NonFiniteAngle(_)));
        assert_eq!(c.params().rotation, 0.5);
        assert_eq!(c.frame().left_leaf().rotation(), 0.5);
        assert_eq!(c.stage().scene.transform(root).unwrap(), before);
        assert!(c.params().controls_since(&c.params()).is_empty());
    }

    #[test]
    fn out_of_range_controls_are_clamped() {
        let mut c = composer();
        c.apply(Control::SetWidth(10.0), Instant::now()).unwrap();
        assert_eq!(c.frame().span(), Span::new(3.0, 1.0));
        assert_eq!(c.params().width, 3.0);
        c.apply(Control::SetRotation(-1.0), Instant::now()).unwrap();
        assert_eq!(c.frame().left_leaf().rotation(), 0.0);
    }

    #[test]
    fn rotation_and_color_reach_the_frame() {
        let mut c = composer();
        let now = Instant::now();
        c.apply(Control::SetRotation(0.5), now).unwrap();
        assert_eq!(c.frame().left_leaf().rotation(), 0.5);
        assert_eq!(c.frame().right_leaf().rotation(), 0.5);

        let red = Color::from_hex("#FF0000").unwrap();
        c.apply(Control::SetColor(red), now).unwrap();
        let metal = c.frame().materials().metal;
        assert_eq!(c.stage().materials.get(metal).unwrap().base_color, red);
        assert_eq!(c.color(), red);
    }

    #[test]
    fn gui_diff_drives_the_composer() {
        let mut c = composer();
        let mut params = c.params();
        params.width = 1.5;
        params.rotation = 0.3;
        let controls = params.controls_since(&c.params());
        assert_eq!(controls.len(), 2);
        c.apply_all(controls, Instant::now()).unwrap();
        assert_eq!(c.params(), params);
    }

    #[test]
    fn wall_texture_tracks_wall_size() {
        let mut c = composer();
        c.apply(Control::SetWidth(1.5), Instant::now()).unwrap();
        c.flush().unwrap();
        let wall = c
            .stage()
            .materials
            .iter()
            .find(|(_, m)| m.pattern == Pattern::Brick)
            .map(|(_, m)| m.uv_repeat)
            .unwrap();
        assert_eq!(wall, glam::Vec2::new(3.0, 2.0));
    }

    #[test]
    fn handles_attach_when_loads_complete() {
        let mut c = composer();
        let t0 = Instant::now();
        let completers = manual_loads(&mut c, Duration::from_secs(5), t0);
        for completer in completers {
            assert!(completer.complete(Ok(model())));
        }
        c.tick(t0).unwrap();
        assert!(c.frame().left_leaf().handle_visible(c.stage()));
        assert!(c.frame().right_leaf().handle_visible(c.stage()));
    }

    #[test]
    fn timed_out_handle_load_stays_hidden() {
        let mut c = composer();
        let t0 = Instant::now();
        let completers = manual_loads(&mut c, Duration::from_millis(50), t0);
        c.tick(t0 + Duration::from_millis(100)).unwrap();
        assert!(!c.frame().left_leaf().handle_visible(c.stage()));

        // A late completion is discarded.
        for completer in completers {
            assert!(!completer.complete(Ok(model())));
        }
        c.tick(t0 + Duration::from_millis(200)).unwrap();
        assert!(!c.frame().right_leaf().handle_visible(c.stage()));
    }

    #[test]
    fn missing_model_file_is_logged_not_fatal() {
        let config = ComposerConfig {
            load_timeout: Duration::from_secs(5),
            ..ComposerConfig::default()
        }
        .with_handle_model("does/not/exist.gltf");
        let mut c = SceneComposer::new(config).unwrap();
        let deadline = Instant::now() + Duration::from_secs(10);
        // The worker fails fast; poll until both results are in or the timeout hits.
        while Instant::now() < deadline {
            c.tick(Instant::now()).unwrap();
            std::thread::sleep(Duration::from_millis(5));
            if c.frame().left_leaf().handle().is_some_and(|h| !h.is_loading())
                && c.frame().right_leaf().handle().is_some_and(|h| !h.is_loading())
            {
                break;
            }
        }
        assert!(!c.frame().left_leaf().handle_visible(c.stage()));
        assert!(!c.frame().right_leaf().handle_visible(c.stage()));
    }

    #[test]
    fn bundled_model_loads_on_a_worker() {
        let config = ComposerConfig::default().with_handle_model(bundled_model());
        let mut c = SceneComposer::new(config).unwrap();
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline && !c.frame().right_leaf().handle_visible(c.stage()) {
            c.tick(Instant::now()).unwrap();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(c.frame().left_leaf().handle_visible(c.stage()));
        assert!(c.frame().right_leaf().handle_visible(c.stage()));
    }

    #[test]
    fn tick_advances_frame_and_drains_events() {
        let mut c = composer();
        c.tick(Instant::now()).unwrap();
        c.tick(Instant::now()).unwrap();
        assert_eq!(c.stage().scene.frame(), 2);
        assert!(c.stage().scene.events().is_empty());
    }

    #[test]
    fn render_scene_sees_every_panel() {
        let c = composer();
        let input = c.render_scene();
        // frame: 5 beams; each leaf: 4 beams + pane; wall: 1 (cutter hidden)
        assert_eq!(input.scene.drawables().len(), 5 + 2 * 5 + 1);
        assert_eq!(input.floor_y, -1.0);
    }
}
