//! Map overlay tying data fetches, field rebuilds and the animation together
//!
//! View changes hide the overlay and issue a new fetch. Each fetch carries
//! an epoch; only the newest one may publish a field, so a slow response
//! for an old view can never overwrite a newer one.

use super::source::{FetchPoll, PendingFetch, WindDataSource};
use super::view::{HostMap, ViewEvent, ViewState};
use crate::field::SampledField;
use crate::grid::VectorField;
use crate::projection::Projection;
use crate::render::CanvasSurface;
use crate::simulation::{AnimationController, FieldSlot, FrameOutcome, StreamlineConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, info, warn};

type Callback = Box<dyn FnMut()>;

/// Hooks fired around each field update
#[derive(Default)]
pub struct LayerOptions {
    /// Called when a view change starts a new fetch
    pub on_update_start: Option<Callback>,
    /// Called once the new field is live
    pub on_update_complete: Option<Callback>,
}

/// Result of polling the in-flight update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Nothing in flight
    Idle,
    Pending,
    /// New field published
    Applied,
    /// Provider reported an error; the previous field stays hidden
    Failed,
    /// Request was aborted by the provider
    Aborted,
}

struct PendingUpdate {
    epoch: u64,
    view: ViewState,
    projection: Box<dyn Projection>,
    fetch: Box<dyn PendingFetch>,
}

/// Animated wind overlay for one host map
pub struct StreamlineLayer<C> {
    config: StreamlineConfig,
    source: Option<Box<dyn WindDataSource>>,
    options: LayerOptions,
    slot: Arc<FieldSlot>,
    animation: AnimationController<C>,
    mask_canvas: C,
    pending: Option<PendingUpdate>,
    epoch: u64,
    /// Density requested through `start_animation`, kept across rebuilds
    density: Option<f32>,
    visible: bool,
    canvas_origin: (f64, f64),
}

impl<C: CanvasSurface> StreamlineLayer<C> {
    /// Layer drawing trails on `trail_canvas` and the colour mask on
    /// `mask_canvas`. Both should be sized in device pixels.
    pub fn new(trail_canvas: C, mask_canvas: C, config: StreamlineConfig) -> Self {
        let slot = Arc::new(FieldSlot::new());
        let animation = AnimationController::new(trail_canvas, config.clone(), Arc::clone(&slot));
        Self::assemble(animation, mask_canvas, config, slot)
    }

    /// Same as [`StreamlineLayer::new`] with a fixed particle seed
    pub fn with_seed(trail_canvas: C, mask_canvas: C, config: StreamlineConfig, seed: u64) -> Self {
        let slot = Arc::new(FieldSlot::new());
        let animation = AnimationController::with_rng(
            trail_canvas,
            config.clone(),
            Arc::clone(&slot),
            StdRng::seed_from_u64(seed),
        );
        Self::assemble(animation, mask_canvas, config, slot)
    }

    fn assemble(
        animation: AnimationController<C>,
        mask_canvas: C,
        config: StreamlineConfig,
        slot: Arc<FieldSlot>,
    ) -> Self {
        Self {
            config,
            source: None,
            options: LayerOptions::default(),
            slot,
            animation,
            mask_canvas,
            pending: None,
            epoch: 0,
            density: None,
            visible: false,
            canvas_origin: (0.0, 0.0),
        }
    }

    /// Attach a data source and update hooks without fetching
    pub fn configure(&mut self, source: Box<dyn WindDataSource>, options: LayerOptions) {
        self.source = Some(source);
        self.options = options;
    }

    /// Swap the data source and rebuild for the current view straight away
    pub fn set_wind_data(
        &mut self,
        source: Box<dyn WindDataSource>,
        host: &dyn HostMap,
    ) -> UpdateStatus {
        self.source = Some(source);
        self.request_update(host);
        self.poll()
    }

    /// React to a host map notification.
    ///
    /// Returns the status of the update in flight after the event.
    pub fn handle_view_event(&mut self, event: ViewEvent, host: &dyn HostMap) -> UpdateStatus {
        if event.begins_change() {
            self.visible = false;
        } else if event.settles_view() {
            self.request_update(host);
            return self.poll();
        }
        self.status()
    }

    /// Hide the overlay, abort any older fetch and request data for the
    /// host's current view. Returns the epoch of the new request.
    pub fn request_update(&mut self, host: &dyn HostMap) -> u64 {
        self.epoch += 1;
        self.visible = false;
        if let Some(mut stale) = self.pending.take() {
            debug!("Aborting fetch for epoch {}", stale.epoch);
            stale.fetch.abort();
        }
        if let Some(hook) = self.options.on_update_start.as_mut() {
            hook();
        }

        let view = host.view();
        let projection = match host.device_projection(&view, self.config.retina_scale) {
            Ok(p) => p,
            Err(e) => {
                warn!("Cannot project view for epoch {}: {}", self.epoch, e);
                return self.epoch;
            }
        };
        let Some(source) = self.source.as_mut() else {
            debug!("No wind data source configured; epoch {} idle", self.epoch);
            return self.epoch;
        };
        let fetch = source.get_wind_field(view.bounds, view.zoom);
        self.pending = Some(PendingUpdate {
            epoch: self.epoch,
            view,
            projection,
            fetch,
        });
        self.epoch
    }

    /// Advance the in-flight fetch, applying it if it resolved
    pub fn poll(&mut self) -> UpdateStatus {
        let Some(mut update) = self.pending.take() else {
            return UpdateStatus::Idle;
        };
        match update.fetch.poll() {
            FetchPoll::Pending => {
                self.pending = Some(update);
                UpdateStatus::Pending
            }
            FetchPoll::Aborted => {
                debug!("Fetch for epoch {} aborted", update.epoch);
                UpdateStatus::Aborted
            }
            FetchPoll::Ready(Err(e)) => {
                warn!("Wind data fetch for epoch {} failed: {}", update.epoch, e);
                UpdateStatus::Failed
            }
            FetchPoll::Ready(Ok(grid)) => {
                self.apply(&*grid, &update.view, &*update.projection);
                UpdateStatus::Applied
            }
        }
    }

    fn apply(&mut self, grid: &dyn VectorField, view: &ViewState, projection: &dyn Projection) {
        let canvas = self.animation.canvas();
        let (width, height) = (canvas.width(), canvas.height());
        let scale = self.config.velocity_scale.for_zoom(view.zoom);
        let field = SampledField::build(
            grid,
            projection,
            width,
            height,
            scale,
            &self.config.sample_options(),
        );

        self.mask_canvas.clear();
        if let Some(mask) = field.mask() {
            if let Err(e) = mask.draw(&mut self.mask_canvas) {
                warn!("Colour mask not drawn: {}", e);
            }
        }
        let generation = self.slot.publish(field);
        self.animation.canvas_mut().clear();
        self.canvas_origin = view.pixel_origin;
        self.visible = true;
        if let Some(density) = self.density {
            self.animation.start(density);
        }
        info!(
            "Wind field generation {} live for epoch {} at zoom {} ({}x{})",
            generation, self.epoch, view.zoom, width, height
        );
        if let Some(hook) = self.options.on_update_complete.as_mut() {
            hook();
        }
    }

    /// Start animating; the population follows every future rebuild
    pub fn start_animation(&mut self, density: f32) {
        self.density = Some(density);
        self.animation.start(density);
    }

    pub fn cancel_animation(&mut self) {
        self.density = None;
        self.animation.cancel();
    }

    /// Run one animation frame
    pub fn frame(&mut self) -> FrameOutcome {
        self.animation.frame()
    }

    /// Detach from the host: stop animating, drop pending work and data
    pub fn remove(&mut self) {
        self.cancel_animation();
        if let Some(mut update) = self.pending.take() {
            update.fetch.abort();
        }
        self.epoch += 1;
        self.source = None;
        self.slot.clear();
        self.animation.canvas_mut().clear();
        self.mask_canvas.clear();
        self.visible = false;
        info!("Streamline layer removed");
    }

    fn status(&self) -> UpdateStatus {
        if self.pending.is_some() {
            UpdateStatus::Pending
        } else {
            UpdateStatus::Idle
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// World pixel the canvases' top-left corner is pinned to
    #[must_use]
    pub fn canvas_origin(&self) -> (f64, f64) {
        self.canvas_origin
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn current_field(&self) -> Option<Arc<SampledField>> {
        self.slot.snapshot().map(|(_, field)| field)
    }

    #[must_use]
    pub fn config(&self) -> &StreamlineConfig {
        &self.config
    }

    #[must_use]
    pub fn trail_canvas(&self) -> &C {
        self.animation.canvas()
    }

    #[must_use]
    pub fn mask_canvas(&self) -> &C {
        &self.mask_canvas
    }

    #[must_use]
    pub fn animation(&self) -> &AnimationController<C> {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut AnimationController<C> {
        &mut self.animation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{GeoBounds, GeoPoint};
    use crate::grid::{GridLayout, RowOrder, WindGrid};
    use crate::overlay::source::{FetchError, StaticWindSource};
    use crate::projection::{LinearProjection, ProjectionError};
    use crate::render::RasterCanvas;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct Request {
        result: Option<Result<Arc<WindGrid>, FetchError>>,
        aborted: bool,
    }

    type Requests = Rc<RefCell<Vec<Rc<RefCell<Request>>>>>;

    /// Source whose requests resolve only when the test says so
    struct ManualSource(Requests);

    struct ManualFetch(Rc<RefCell<Request>>);

    impl WindDataSource for ManualSource {
        fn get_wind_field(&mut self, _bounds: GeoBounds, _zoom: u8) -> Box<dyn PendingFetch> {
            let request = Rc::new(RefCell::new(Request::default()));
            self.0.borrow_mut().push(Rc::clone(&request));
            Box::new(ManualFetch(request))
        }
    }

    impl PendingFetch for ManualFetch {
        fn poll(&mut self) -> FetchPoll {
            let request = self.0.borrow();
            if request.aborted {
                return FetchPoll::Aborted;
            }
            match &request.result {
                Some(result) => FetchPoll::Ready(result.clone()),
                None => FetchPoll::Pending,
            }
        }

        fn abort(&mut self) {
            self.0.borrow_mut().aborted = true;
        }
    }

    /// Host drawing with a flat projection instead of web Mercator
    struct FlatHost(ViewState, LinearProjection);

    impl HostMap for FlatHost {
        fn view(&self) -> ViewState {
            self.0
        }

        fn device_projection(
            &self,
            _view: &ViewState,
            _retina_scale: f32,
        ) -> Result<Box<dyn Projection>, ProjectionError> {
            Ok(Box::new(self.1))
        }
    }

    fn grid(u: f32) -> WindGrid {
        let layout = GridLayout {
            nlng: 21,
            nlat: 21,
            origin: GeoPoint::new(10.0, -10.0),
            dlat: 1.0,
            dlng: 1.0,
            row_order: RowOrder::NorthToSouth,
        };
        WindGrid::new(layout, vec![u; 441], vec![1.0; 441]).unwrap()
    }

    fn view() -> ViewState {
        ViewState::centered(GeoPoint::new(0.0, 0.0), 3, (64, 48)).unwrap()
    }

    fn layer() -> StreamlineLayer<RasterCanvas> {
        StreamlineLayer::with_seed(
            RasterCanvas::new(64, 48),
            RasterCanvas::new(64, 48),
            StreamlineConfig::default(),
            11,
        )
    }

    #[test]
    fn test_set_wind_data_applies_immediately() {
        let starts = Rc::new(Cell::new(0));
        let completes = Rc::new(Cell::new(0));
        let mut layer = layer();
        let (s, c) = (Rc::clone(&starts), Rc::clone(&completes));
        layer.configure(
            Box::new(StaticWindSource::new(grid(3.0))),
            LayerOptions {
                on_update_start: Some(Box::new(move || s.set(s.get() + 1))),
                on_update_complete: Some(Box::new(move || c.set(c.get() + 1))),
            },
        );
        assert!(!layer.is_visible());

        let status = layer.set_wind_data(Box::new(StaticWindSource::new(grid(4.0))), &view());
        assert_eq!(status, UpdateStatus::Applied);
        assert!(layer.is_visible());
        assert_eq!((starts.get(), completes.get()), (1, 1));
        assert_eq!(layer.canvas_origin(), view().pixel_origin);

        let field = layer.current_field().unwrap();
        assert_eq!(field.defined_cells(), 32 * 24);
        let sample = field.get(10.0, 10.0).unwrap();
        assert!((sample.magnitude - 17.0_f32.sqrt()).abs() < 1e-4);
        // Mask washes every defined pixel
        assert!(layer.mask_canvas().painted_pixels() > 0);
    }

    #[test]
    fn test_newer_request_supersedes_older() {
        let requests = Requests::default();
        let mut layer = layer();
        layer.configure(Box::new(ManualSource(Rc::clone(&requests))), LayerOptions::default());

        let first = layer.request_update(&view());
        assert_eq!(layer.poll(), UpdateStatus::Pending);
        let second = layer.handle_view_event(ViewEvent::MoveEnd, &view());
        assert_eq!(second, UpdateStatus::Pending);
        assert_eq!(layer.epoch(), first + 1);

        let reqs = requests.borrow().clone();
        assert_eq!(reqs.len(), 2);
        assert!(reqs[0].borrow().aborted);
        assert!(!reqs[1].borrow().aborted);

        // The old response arriving late changes nothing
        reqs[0].borrow_mut().result = Some(Ok(Arc::new(grid(9.0))));
        assert_eq!(layer.poll(), UpdateStatus::Pending);
        assert!(layer.current_field().is_none());

        reqs[1].borrow_mut().result = Some(Ok(Arc::new(grid(2.0))));
        assert_eq!(layer.poll(), UpdateStatus::Applied);
        let sample = layer.current_field().unwrap().get(0.0, 0.0).unwrap();
        assert!((sample.magnitude - 5.0_f32.sqrt()).abs() < 1e-4);
        assert_eq!(layer.poll(), UpdateStatus::Idle);
    }

    #[test]
    fn test_host_projection_drives_field_build() {
        // Canvas spans 40 degrees of longitude; the grid only covers the west half
        let flat = LinearProjection::for_surface(
            64,
            48,
            GeoPoint::new(10.0, -10.0),
            GeoPoint::new(-10.0, 30.0),
        )
        .unwrap();
        let host = FlatHost(view(), flat);
        let mut layer = layer();
        let status = layer.set_wind_data(Box::new(StaticWindSource::new(grid(3.0))), &host);
        assert_eq!(status, UpdateStatus::Applied);

        let field = layer.current_field().unwrap();
        assert!(field.get(4.0, 4.0).is_some());
        assert!(field.get(60.0, 4.0).is_none());
        assert!(field.defined_cells() < 32 * 24);
    }

    #[test]
    fn test_view_change_hides_until_rebuilt() {
        let mut layer = layer();
        layer.set_wind_data(Box::new(StaticWindSource::new(grid(3.0))), &view());
        assert!(layer.is_visible());

        assert_eq!(layer.handle_view_event(ViewEvent::ZoomStart, &view()), UpdateStatus::Idle);
        assert!(!layer.is_visible());
        assert_eq!(layer.handle_view_event(ViewEvent::ZoomEnd, &view()), UpdateStatus::Applied);
        assert!(layer.is_visible());
    }

    #[test]
    fn test_failed_fetch_keeps_layer_hidden() {
        let requests = Requests::default();
        let mut layer = layer();
        layer.configure(Box::new(ManualSource(Rc::clone(&requests))), LayerOptions::default());
        layer.request_update(&view());
        requests.borrow()[0].borrow_mut().result =
            Some(Err(FetchError::Provider("503".to_string())));
        assert_eq!(layer.poll(), UpdateStatus::Failed);
        assert!(!layer.is_visible());
        assert!(layer.current_field().is_none());
    }

    #[test]
    fn test_animation_restarts_after_rebuild() {
        let mut layer = layer();
        layer.start_animation(1.0);
        assert_eq!(layer.frame(), FrameOutcome::Idle);

        layer.set_wind_data(Box::new(StaticWindSource::new(grid(3.0))), &view());
        assert!(matches!(layer.frame(), FrameOutcome::Rendered(_)));
        // 64x48 / 1200 * 7 = 17.92
        assert_eq!(layer.animation().particle_count(), 18);

        layer.cancel_animation();
        assert_eq!(layer.frame(), FrameOutcome::Cancelled);
        layer.handle_view_event(ViewEvent::MoveEnd, &view());
        assert_eq!(layer.frame(), FrameOutcome::Cancelled);
    }

    #[test]
    fn test_remove_releases_everything() {
        let requests = Requests::default();
        let mut layer = layer();
        layer.set_wind_data(Box::new(StaticWindSource::new(grid(3.0))), &view());
        layer.start_animation(1.0);
        layer.frame();
        layer.configure(Box::new(ManualSource(Rc::clone(&requests))), LayerOptions::default());
        layer.request_update(&view());

        layer.remove();
        assert!(requests.borrow()[0].borrow().aborted);
        assert!(layer.current_field().is_none());
        assert!(!layer.is_visible());
        assert_eq!(layer.trail_canvas().painted_pixels(), 0);
        assert_eq!(layer.mask_canvas().painted_pixels(), 0);
        assert_eq!(layer.frame(), FrameOutcome::Cancelled);
        assert_eq!(layer.poll(), UpdateStatus::Idle);
    }
}
