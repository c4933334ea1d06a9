//! Frame loop driving the particle simulator
//!
//! The loop is cooperative and single-threaded: each frame evolves and
//! draws to completion before the next is scheduled. The sampled field is
//! read through a [`FieldSlot`]; rebuilding publishes a new `Arc` and never
//! touches the one a running frame holds.

use super::config::StreamlineConfig;
use super::simulator::{FrameStats, ParticleSimulator};
use crate::field::SampledField;
use crate::render::{CanvasSurface, RenderError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Cooperative cancellation flag shared with whoever may stop the loop
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Swappable reference to the current sampled field.
///
/// Every publish bumps a generation counter so readers can tell that the
/// field they hold has been replaced.
#[derive(Debug, Default)]
pub struct FieldSlot {
    current: RwLock<Option<(u64, Arc<SampledField>)>>,
    generation: AtomicU64,
}

impl FieldSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current field, returning its generation
    pub fn publish(&self, field: SampledField) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some((generation, Arc::new(field)));
        generation
    }

    /// Current field and its generation, if any
    #[must_use]
    pub fn snapshot(&self) -> Option<(u64, Arc<SampledField>)> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop the current field
    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Result of one scheduled frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Particles evolved and drawn
    Rendered(FrameStats),
    /// Evolved, but drawing failed; the loop keeps going
    Failed(RenderError),
    /// No field has been published yet
    Idle,
    /// The loop has been cancelled or was never started
    Cancelled,
}

/// Owns the trail canvas and runs frames against the published field
pub struct AnimationController<C> {
    canvas: C,
    config: StreamlineConfig,
    slot: Arc<FieldSlot>,
    /// Simulator and the field generation it was spawned on
    simulator: Option<(u64, ParticleSimulator)>,
    density: f32,
    cancel: CancelToken,
    running: bool,
    frames: u64,
    rng: StdRng,
}

impl<C: CanvasSurface> AnimationController<C> {
    pub fn new(canvas: C, config: StreamlineConfig, slot: Arc<FieldSlot>) -> Self {
        Self::with_rng(canvas, config, slot, StdRng::from_rng(&mut rand::rng()))
    }

    /// Controller with a caller-supplied generator, for reproducible runs
    pub fn with_rng(
        canvas: C,
        config: StreamlineConfig,
        slot: Arc<FieldSlot>,
        rng: StdRng,
    ) -> Self {
        Self {
            canvas,
            config,
            slot,
            simulator: None,
            density: 1.0,
            cancel: CancelToken::new(),
            running: false,
            frames: 0,
            rng,
        }
    }

    /// Begin (or restart) animating with the given particle density.
    ///
    /// The population is respawned on the next frame.
    pub fn start(&mut self, density: f32) {
        self.cancel = CancelToken::new();
        self.density = density;
        self.simulator = None;
        self.running = true;
        info!("Animation started (density {:.2})", density);
    }

    /// Stop the loop; the next frame check sees the cancellation
    pub fn cancel(&mut self) {
        if self.running {
            info!("Animation cancelled after {} frames", self.frames);
        }
        self.cancel.cancel();
        self.running = false;
    }

    /// Token that stops this run when cancelled from elsewhere
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running && !self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.simulator.as_ref().map_or(0, |(_, sim)| sim.len())
    }

    #[must_use]
    pub fn config(&self) -> &StreamlineConfig {
        &self.config
    }

    #[must_use]
    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    /// Run one frame: check cancellation, evolve, draw.
    pub fn frame(&mut self) -> FrameOutcome {
        if !self.running || self.cancel.is_cancelled() {
            self.running = false;
            return FrameOutcome::Cancelled;
        }
        let Some((generation, field)) = self.slot.snapshot() else {
            return FrameOutcome::Idle;
        };

        let stale = self
            .simulator
            .as_ref()
            .is_none_or(|(spawned_on, _)| *spawned_on != generation);
        if stale {
            let count = self
                .config
                .particle_count(field.width(), field.height(), self.density);
            debug!(
                "Spawning {} particles on field generation {}",
                count, generation
            );
            let sim = ParticleSimulator::new(count, &field, &self.config, &mut self.rng);
            self.simulator = Some((generation, sim));
        }
        let Some((_, sim)) = self.simulator.as_mut() else {
            return FrameOutcome::Idle;
        };

        let stats = sim.evolve(&field, &mut self.rng);
        self.frames += 1;
        match sim.draw(&mut self.canvas) {
            Ok(()) => FrameOutcome::Rendered(stats),
            Err(e) => {
                warn!("Frame {} failed to render: {}", self.frames, e);
                FrameOutcome::Failed(e)
            }
        }
    }

    /// Run frames at the configured period until cancelled or until
    /// `max_frames` have been scheduled. Pacing is best effort.
    ///
    /// Returns the number of frames scheduled.
    pub fn run(&mut self, max_frames: Option<u64>) -> u64 {
        let period = self.config.frame_period();
        let mut scheduled = 0;
        loop {
            if max_frames.is_some_and(|max| scheduled >= max) {
                break;
            }
            if self.frame() == FrameOutcome::Cancelled {
                break;
            }
            scheduled += 1;
            if !period.is_zero() {
                std::thread::sleep(period);
            }
        }
        scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::core_types::{GeoBounds, GeoPoint, Vec2, WindVector};
    use crate::grid::ConstantField;
    use crate::projection::LinearProjection;
    use crate::render::{CompositeMode, RasterCanvas};

    fn field() -> SampledField {
        let projection =
            LinearProjection::for_surface(60, 40, GeoPoint::new(4.0, 0.0), GeoPoint::new(0.0, 6.0))
                .unwrap();
        let constant = ConstantField {
            wind: WindVector::new(5.0, 5.0),
            bounds: GeoBounds::from_corners(GeoPoint::new(4.0, 0.0), GeoPoint::new(0.0, 6.0)),
        };
        SampledField::build(
            &constant,
            &projection,
            60,
            40,
            0.2,
            &StreamlineConfig::default().sample_options(),
        )
    }

    fn controller(slot: Arc<FieldSlot>) -> AnimationController<RasterCanvas> {
        let config = StreamlineConfig {
            frame_period_ms: 0,
            ..StreamlineConfig::default()
        };
        AnimationController::with_rng(
            RasterCanvas::new(60, 40),
            config,
            slot,
            StdRng::seed_from_u64(2),
        )
    }

    /// Canvas whose strokes always fail
    struct BrokenCanvas(RasterCanvas);

    impl CanvasSurface for BrokenCanvas {
        fn width(&self) -> u32 {
            self.0.width()
        }
        fn height(&self) -> u32 {
            self.0.height()
        }
        fn set_line_width(&mut self, width: f32) {
            self.0.set_line_width(width);
        }
        fn begin_path(&mut self) {
            self.0.begin_path();
        }
        fn move_to(&mut self, p: Vec2) {
            self.0.move_to(p);
        }
        fn line_to(&mut self, p: Vec2) {
            self.0.line_to(p);
        }
        fn stroke(&mut self, _color: Rgba) -> Result<(), RenderError> {
            Err(RenderError::Backend("context lost".to_string()))
        }
        fn fill_rect(
            &mut self,
            x: f32,
            y: f32,
            width: f32,
            height: f32,
            color: Rgba,
            mode: CompositeMode,
        ) -> Result<(), RenderError> {
            self.0.fill_rect(x, y, width, height, color, mode)
        }
        fn clear(&mut self) {
            self.0.clear();
        }
        fn get_image_data(&self) -> Vec<u8> {
            self.0.get_image_data()
        }
        fn put_image_data(&mut self, data: &[u8]) -> Result<(), RenderError> {
            self.0.put_image_data(data)
        }
    }

    #[test]
    fn test_not_started_is_cancelled() {
        let mut anim = controller(Arc::new(FieldSlot::new()));
        assert_eq!(anim.frame(), FrameOutcome::Cancelled);
    }

    #[test]
    fn test_idle_until_field_published() {
        let slot = Arc::new(FieldSlot::new());
        let mut anim = controller(slot.clone());
        anim.start(1.0);
        assert_eq!(anim.frame(), FrameOutcome::Idle);

        slot.publish(field());
        assert!(matches!(anim.frame(), FrameOutcome::Rendered(_)));
        // 60x40 / 1200 * 7 = 14
        assert_eq!(anim.particle_count(), 14);
        assert!(anim.canvas().painted_pixels() > 0);
    }

    #[test]
    fn test_new_generation_respawns_population() {
        let slot = Arc::new(FieldSlot::new());
        let mut anim = controller(slot.clone());
        anim.start(2.0);
        assert_eq!(slot.publish(field()), 1);
        anim.frame();
        assert_eq!(anim.particle_count(), 28);
        assert_eq!(slot.publish(SampledField::empty(60, 40)), 2);
        match anim.frame() {
            FrameOutcome::Rendered(stats) => assert_eq!(stats.drawn, 0),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_cancel_stops_before_work() {
        let slot = Arc::new(FieldSlot::new());
        slot.publish(field());
        let mut anim = controller(slot);
        anim.start(1.0);
        let token = anim.cancel_token();
        assert_eq!(anim.run(Some(3)), 3);
        token.cancel();
        assert!(!anim.is_running());
        assert_eq!(anim.frame(), FrameOutcome::Cancelled);
        assert_eq!(anim.run(Some(10)), 0);
        assert_eq!(anim.frames_rendered(), 3);

        // Restarting issues a fresh token
        anim.start(1.0);
        assert!(token.is_cancelled());
        assert!(anim.is_running());
    }

    #[test]
    fn test_render_failure_does_not_stop_loop() {
        let slot = Arc::new(FieldSlot::new());
        slot.publish(field());
        let config = StreamlineConfig {
            frame_period_ms: 0,
            ..StreamlineConfig::default()
        };
        let mut anim = AnimationController::with_rng(
            BrokenCanvas(RasterCanvas::new(60, 40)),
            config,
            slot,
            StdRng::seed_from_u64(4),
        );
        anim.start(1.0);
        assert!(matches!(anim.frame(), FrameOutcome::Failed(_)));
        assert!(anim.is_running());
        assert_eq!(anim.run(Some(5)), 5);
        assert_eq!(anim.frames_rendered(), 6);
    }

    #[test]
    fn test_snapshot_survives_publish() {
        let slot = FieldSlot::new();
        slot.publish(field());
        let (generation, held) = slot.snapshot().unwrap();
        slot.publish(SampledField::empty(60, 40));
        // The reader keeps the field it started with
        assert_eq!(generation, 1);
        assert!(held.defined_cells() > 0);
        assert_eq!(slot.snapshot().unwrap().0, 2);
        slot.clear();
        assert!(slot.snapshot().is_none());
    }
}
