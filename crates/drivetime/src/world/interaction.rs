use cgmath::{Point2, Point3};
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};
use tracing::{event, Level};

use crate::{
    content::ServiceAreaProvider,
    helpers::{boxed, spawn_detached, Geocoordinate, Geodetic, PlatformFuture},
    render::{render_overlays, Billboard, Entity, EntityRef, HeightReference, VerticalOrigin, Viewer},
};

/// Name of the single facility marker.
pub const MARKER_NAME: &str = "start";

/// How one click (or the startup query) ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Overlays were added; the count of polygon entities.
    Rendered(usize),
    QueryFailed,
    ParseFailed,
    /// A newer click started while this one was in flight.
    Superseded,
}

/// Owns the marker and runs the pick, clear, query, render sequence.
pub struct InteractionController {
    viewer: Arc<Viewer>,
    provider: Arc<dyn ServiceAreaProvider>,
    marker: EntityRef,
    supersede_stale_queries: bool,
    generation: Arc<AtomicU64>,
    pending: Arc<AtomicUsize>,
}

struct PendingGuard(Arc<AtomicUsize>);

impl PendingGuard {
    fn new(pending: &Arc<AtomicUsize>) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(pending))
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn create_marker(viewer: &Viewer, image: &str) -> EntityRef {
    let billboard = Billboard {
        vertical_origin: VerticalOrigin::Bottom,
        height_reference: HeightReference::ClampToGround,
        disable_depth_test_distance: f64::INFINITY,
        scale: 0.5,
        ..Billboard::new(image)
    };
    viewer.add_entity(Entity::new(Some(MARKER_NAME.to_string())).with_billboard(billboard))
}

impl InteractionController {
    pub fn new(
        viewer: Arc<Viewer>,
        provider: Arc<dyn ServiceAreaProvider>,
        marker_image: &str,
        supersede_stale_queries: bool,
    ) -> Self {
        let marker = create_marker(&viewer, marker_image);
        Self {
            viewer,
            provider,
            marker,
            supersede_stale_queries,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn marker(&self) -> &EntityRef {
        &self.marker
    }

    pub fn viewer(&self) -> &Arc<Viewer> {
        &self.viewer
    }

    /// Click cycles created and not yet finished.
    pub fn pending_queries(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Left-click action: runs [`Self::handle_click`] and detaches the query.
    pub fn on_click(&self, screen_px: Point2<f64>) {
        if let Some(cycle) = self.handle_click(screen_px) {
            spawn_detached(async move {
                cycle.await;
            });
        }
    }

    /// Clears the previous result and resolves the click. Returns the query
    /// cycle to drive, or `None` when the click missed the globe.
    pub fn handle_click(
        &self,
        screen_px: Point2<f64>,
    ) -> Option<PlatformFuture<'static, CycleOutcome>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.clear_result();

        let Some(world) = self.viewer.pick_position(screen_px) else {
            event!(Level::DEBUG, x = screen_px.x, y = screen_px.y, "click missed the globe");
            return None;
        };
        let facility = self.place_marker(world)?;

        Some(self.query_cycle(facility, generation))
    }

    /// Removes the overlays and hides the marker and the highlight.
    pub(crate) fn clear_result(&self) {
        self.viewer.remove_all_data_sources();
        self.viewer.set_invert_classification(false);
        self.marker.write().expect("Entity RwLock poisoned").show = false;
    }

    /// Shows the marker at `world` and turns the highlight back on. A position
    /// with no geodetic equivalent is treated like a miss and changes nothing.
    pub(crate) fn place_marker(&self, world: Point3<f64>) -> Option<Geocoordinate> {
        let Some(geodetic) = Geodetic::from_ecef(world) else {
            event!(Level::WARN, ?world, "picked position has no geodetic equivalent");
            return None;
        };

        {
            let mut marker = self.marker.write().expect("Entity RwLock poisoned");
            marker.position = Some(world);
            marker.show = true;
        }
        self.viewer.set_invert_classification(true);

        Some(geodetic.coordinate())
    }

    /// Query for `facility` outside of a click, e.g. the startup query.
    pub fn query_facility(&self, facility: Geocoordinate) -> PlatformFuture<'static, CycleOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.query_cycle(facility, generation)
    }

    fn query_cycle(
        &self,
        facility: Geocoordinate,
        generation: u64,
    ) -> PlatformFuture<'static, CycleOutcome> {
        event!(
            Level::INFO,
            lon = facility.longitude,
            lat = facility.latitude,
            generation,
            "querying service area"
        );

        let guard = PendingGuard::new(&self.pending);
        let query = self.provider.solve(facility);
        let viewer = Arc::clone(&self.viewer);
        let latest = Arc::clone(&self.generation);
        let supersede = self.supersede_stale_queries;

        boxed(async move {
            let _guard = guard;
            let result = query.await;

            let outcome = if supersede && latest.load(Ordering::SeqCst) != generation {
                CycleOutcome::Superseded
            } else {
                match result {
                    Err(_) => CycleOutcome::QueryFailed,
                    Ok(collection) => match render_overlays(&viewer, &collection) {
                        Ok(count) => CycleOutcome::Rendered(count),
                        Err(_) => CycleOutcome::ParseFailed,
                    },
                }
            };

            event!(Level::DEBUG, ?outcome, generation, "click cycle finished");
            outcome
        })
    }
}
