//! Application state for the web layer.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::ResourceTypes;
use crate::store::Database;
use crate::transit::{TransitConfig, TransitMatcher};

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// The resource database. One writer at a time.
    pub db: Arc<Mutex<Database>>,

    /// Transit matcher over the immutable schedule index
    pub matcher: Arc<TransitMatcher>,

    /// Provider category catalog
    pub resource_types: Arc<ResourceTypes>,

    /// Transit request limits
    pub transit: Arc<TransitConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        db: Database,
        matcher: TransitMatcher,
        resource_types: ResourceTypes,
        transit: TransitConfig,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            matcher: Arc::new(matcher),
            resource_types: Arc::new(resource_types),
            transit: Arc::new(transit),
        }
    }
}
