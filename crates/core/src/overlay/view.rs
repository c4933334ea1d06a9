//! What the host map is showing, and the events it emits

use crate::core_types::{GeoBounds, GeoPoint};
use crate::projection::{MercatorProjection, Projection, ProjectionError};

/// Snapshot of the host map's viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    /// Geographic extent of the viewport
    pub bounds: GeoBounds,
    pub zoom: u8,
    /// World pixel (at `zoom`) drawn at the container's top-left
    pub pixel_origin: (f64, f64),
    /// Container size in logical pixels
    pub size: (u32, u32),
}

impl ViewState {
    /// View of `size` logical pixels centred on `center`
    ///
    /// # Errors
    /// Propagates `ProjectionError` for a non-finite centre.
    pub fn centered(center: GeoPoint, zoom: u8, size: (u32, u32)) -> Result<Self, ProjectionError> {
        let world = MercatorProjection::new(f64::from(zoom), (0.0, 0.0), 1.0)?;
        let (cx, cy) = world.world_pixel(center);
        let (w, h) = (f64::from(size.0), f64::from(size.1));
        let pixel_origin = (cx - w / 2.0, cy - h / 2.0);
        let view = MercatorProjection::new(f64::from(zoom), pixel_origin, 1.0)?;
        let north_west = GeoPoint::new(view.unproject_lat(0.0), view.unproject_lng(0.0));
        let south_east = GeoPoint::new(view.unproject_lat(h), view.unproject_lng(w));
        Ok(Self {
            bounds: GeoBounds::from_corners(north_west, south_east),
            zoom,
            pixel_origin,
            size,
        })
    }

    /// Projection from geographic points to device pixels of this view
    ///
    /// # Errors
    /// Returns `ProjectionError` for a bad retina scale or a non-finite
    /// pixel origin.
    pub fn projection(&self, retina_scale: f32) -> Result<MercatorProjection, ProjectionError> {
        MercatorProjection::new(
            f64::from(self.zoom),
            self.pixel_origin,
            f64::from(retina_scale),
        )
    }

    /// Canvas size in device pixels
    #[must_use]
    pub fn device_size(&self, retina_scale: f32) -> (u32, u32) {
        let scale = if retina_scale.is_finite() && retina_scale > 0.0 {
            retina_scale
        } else {
            1.0
        };
        let scaled = |v: u32| (v as f32 * scale).round() as u32;
        (scaled(self.size.0), scaled(self.size.1))
    }
}

/// Viewport lifecycle notifications from the host map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    MoveStart,
    MoveEnd,
    ZoomStart,
    /// Zoom animation in progress
    ZoomAnimate,
    ZoomEnd,
    /// Host reset its view without animating (e.g. container resize)
    ViewReset,
}

impl ViewEvent {
    /// Whether the view is about to change and the overlay should hide
    #[must_use]
    pub fn begins_change(self) -> bool {
        matches!(self, ViewEvent::MoveStart | ViewEvent::ZoomStart | ViewEvent::ZoomAnimate)
    }

    /// Whether the view has settled and the field must be rebuilt
    #[must_use]
    pub fn settles_view(self) -> bool {
        matches!(self, ViewEvent::MoveEnd | ViewEvent::ZoomEnd | ViewEvent::ViewReset)
    }
}

/// Map host the layer is attached to
pub trait HostMap {
    fn view(&self) -> ViewState;

    /// Geographic <-> device pixel transform for `view`.
    ///
    /// Hosts with their own tile scheme override this; the default is web
    /// Mercator anchored at the view's pixel origin.
    ///
    /// # Errors
    /// Returns `ProjectionError` when the view cannot be projected.
    fn device_projection(
        &self,
        view: &ViewState,
        retina_scale: f32,
    ) -> Result<Box<dyn Projection>, ProjectionError> {
        Ok(Box::new(view.projection(retina_scale)?))
    }
}

/// A fixed view acts as its own host
impl HostMap for ViewState {
    fn view(&self) -> ViewState {
        *self
    }
}
