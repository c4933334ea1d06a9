//! Wind data providers and their in-flight requests

use crate::core_types::GeoBounds;
use crate::grid::WindGrid;
use std::sync::Arc;

/// Why a wind data request produced no grid
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Provider has nothing for the requested extent
    NoCoverage(GeoBounds),
    /// Transport or decoding failure reported by the provider
    Provider(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::NoCoverage(b) => write!(
                f,
                "No wind data for bounds S{} W{} N{} E{}",
                b.south, b.west, b.north, b.east
            ),
            FetchError::Provider(msg) => write!(f, "Wind data provider failed: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// State of an in-flight request
#[derive(Debug, Clone)]
pub enum FetchPoll {
    Pending,
    Ready(Result<Arc<WindGrid>, FetchError>),
    /// Request was aborted before it resolved
    Aborted,
}

/// Handle to an asynchronous wind data request
pub trait PendingFetch {
    /// Check for completion without blocking
    fn poll(&mut self) -> FetchPoll;

    /// Give up on the request; later polls report `Aborted`
    fn abort(&mut self);
}

/// Something that can supply wind grids for a map extent
pub trait WindDataSource {
    fn get_wind_field(&mut self, bounds: GeoBounds, zoom: u8) -> Box<dyn PendingFetch>;
}

/// Source that hands out one preloaded grid for every request
#[derive(Debug, Clone)]
pub struct StaticWindSource {
    grid: Arc<WindGrid>,
}

impl StaticWindSource {
    #[must_use]
    pub fn new(grid: WindGrid) -> Self {
        Self {
            grid: Arc::new(grid),
        }
    }

    #[must_use]
    pub fn grid(&self) -> &WindGrid {
        &self.grid
    }
}

impl WindDataSource for StaticWindSource {
    fn get_wind_field(&mut self, _bounds: GeoBounds, _zoom: u8) -> Box<dyn PendingFetch> {
        Box::new(ResolvedFetch::new(Ok(Arc::clone(&self.grid))))
    }
}

/// Request that resolved at creation time
#[derive(Debug, Clone)]
pub struct ResolvedFetch {
    result: Option<Result<Arc<WindGrid>, FetchError>>,
}

impl ResolvedFetch {
    #[must_use]
    pub fn new(result: Result<Arc<WindGrid>, FetchError>) -> Self {
        Self {
            result: Some(result),
        }
    }
}

impl PendingFetch for ResolvedFetch {
    fn poll(&mut self) -> FetchPoll {
        match &self.result {
            Some(result) => FetchPoll::Ready(result.clone()),
            None => FetchPoll::Aborted,
        }
    }

    fn abort(&mut self) {
        self.result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::GeoPoint;
    use crate::grid::{GridLayout, RowOrder};

    fn grid() -> WindGrid {
        let layout = GridLayout {
            nlng: 2,
            nlat: 2,
            origin: GeoPoint::new(10.0, 20.0),
            dlat: 1.0,
            dlng: 1.0,
            row_order: RowOrder::NorthToSouth,
        };
        WindGrid::new(layout, vec![1.0; 4], vec![0.0; 4]).unwrap()
    }

    #[test]
    fn test_static_source_resolves_immediately() {
        let mut source = StaticWindSource::new(grid());
        let bounds = source.grid().layout().bounds();
        let mut fetch = source.get_wind_field(bounds, 5);
        match fetch.poll() {
            FetchPoll::Ready(Ok(g)) => assert_eq!(g.layout().nlng, 2),
            other => panic!("unexpected poll {other:?}"),
        }
        fetch.abort();
        assert!(matches!(fetch.poll(), FetchPoll::Aborted));
    }

    #[test]
    fn test_error_display() {
        let err = FetchError::Provider("timeout".to_string());
        assert_eq!(err.to_string(), "Wind data provider failed: timeout");
    }
}
