//! Map overlay: host view tracking, wind data requests and the layer
//! that rebuilds the field whenever the view settles.

pub mod layer;
pub mod source;
pub mod view;

pub use layer::{LayerOptions, StreamlineLayer, UpdateStatus};
pub use source::{
    FetchError, FetchPoll, PendingFetch, ResolvedFetch, StaticWindSource, WindDataSource,
};
pub use view::{HostMap, ViewEvent, ViewState};
