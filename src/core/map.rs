//! The inspection map engine.
//!
//! `InspectionMap` owns the single projection of a view together with the
//! boundary set, the accumulated points and the current scene. Every state
//! transition is a [`ChangeKind`]; each kind declares which artefacts it
//! invalidates, the map recomputes exactly those, assembles a fresh
//! [`Scene`] and swaps it in whole before notifying observers.

use crate::{
    core::{config::EngineConfig, projection::MercatorProjection},
    data::{aggregates::RegionAggregates, boundary::BoundarySet, records::GeographicPoint},
    density::{AggregationInput, AggregationMode, DensityAggregator, DensitySurface, RegionCounts},
    input::{
        events::{InputCapabilities, PointerEvent},
        interaction::{InteractionLayer, InteractionMode},
        tooltip::{marker_content, region_content, Tooltip},
    },
    layers::{
        boundary::BoundaryRenderer,
        density::DensityRenderer,
        points::{PointRenderOptions, PointRenderer},
        scene::{Scene, ShapeId},
    },
    streaming::loader::{
        CancellationFlag, LoadStatus, PageFetcher, SessionId, StreamState, StreamSummary,
        StreamingLoader,
    },
    Error, Result,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error, info};
use std::sync::Arc;

#[cfg(feature = "tokio-runtime")]
use crate::streaming::session::{BackgroundLoad, LoadMessage};

/// Caller-visible state of the map
#[derive(Debug, Clone)]
pub enum MapStatus {
    /// No load session started yet
    Idle,
    Loading,
    Ready,
    /// Loading finished without a single point
    Empty,
    /// Geometry could not be loaded; nothing is drawn
    BoundaryError(Arc<Error>),
    /// A page failed; points loaded before it are still drawn
    LoadFailed(Arc<Error>),
    Cancelled,
}

/// State transitions that trigger a redraw
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    SessionStarted(SessionId),
    NewBatch { session: SessionId, added: usize },
    ModeSwitch(AggregationMode),
    ViewportResize { width: f64, height: f64 },
    BoundariesLoaded { regions: usize },
    BoundariesFailed,
    AggregatesLoaded,
    SessionFinished(SessionId),
}

/// Artefacts a change invalidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Recompute {
    pub markers: bool,
    pub density: bool,
    pub regions: bool,
}

impl Recompute {
    const ALL: Recompute = Recompute {
        markers: true,
        density: true,
        regions: true,
    };

    const AGGREGATES: Recompute = Recompute {
        markers: false,
        density: true,
        regions: true,
    };

    pub fn any(&self) -> bool {
        self.markers || self.density || self.regions
    }
}

impl ChangeKind {
    pub fn recomputes(&self) -> Recompute {
        match self {
            ChangeKind::SessionStarted(_)
            | ChangeKind::NewBatch { .. }
            | ChangeKind::ViewportResize { .. } => Recompute::ALL,
            // Region fills and the density surface follow the aggregation
            ChangeKind::ModeSwitch(_)
            | ChangeKind::BoundariesLoaded { .. }
            | ChangeKind::AggregatesLoaded => Recompute::AGGREGATES,
            ChangeKind::BoundariesFailed | ChangeKind::SessionFinished(_) => Recompute::default(),
        }
    }
}

/// Notification sent to observers after a change has been applied
#[derive(Debug, Clone)]
pub struct MapChange {
    pub kind: ChangeKind,
    pub status: MapStatus,
    pub scene: Arc<Scene>,
}

pub struct InspectionMap {
    config: EngineConfig,
    projection: MercatorProjection,
    boundaries: Option<Arc<BoundarySet>>,
    boundary_error: Option<Arc<Error>>,
    aggregates: Option<RegionAggregates>,
    points: Vec<GeographicPoint>,
    aggregator: DensityAggregator,
    boundary_renderer: BoundaryRenderer,
    point_renderer: PointRenderer,
    density_renderer: DensityRenderer,
    surface: DensitySurface,
    scene: Arc<Scene>,
    interaction: InteractionLayer,
    session: Option<SessionId>,
    cancel: CancellationFlag,
    stream: Option<StreamSummary>,
    observers: Vec<Sender<MapChange>>,
}

impl InspectionMap {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_capabilities(config, InputCapabilities::default())
    }

    /// Creates a map whose interaction mode is fixed from `capabilities`
    pub fn with_capabilities(config: EngineConfig, capabilities: InputCapabilities) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            projection: MercatorProjection::from_config(&config.projection),
            boundaries: None,
            boundary_error: None,
            aggregates: None,
            points: Vec::new(),
            aggregator: DensityAggregator::new(config.density.clone()),
            boundary_renderer: BoundaryRenderer::default(),
            point_renderer: PointRenderer::new(PointRenderOptions::from(&config.markers)),
            density_renderer: DensityRenderer::new(&config.density),
            surface: DensitySurface::Regions(RegionCounts::default()),
            scene: Arc::new(Scene::default()),
            interaction: InteractionLayer::new(&capabilities),
            session: None,
            cancel: CancellationFlag::new(),
            stream: None,
            observers: Vec::new(),
            config,
        })
    }

    /// Receives a [`MapChange`] after every applied change
    pub fn subscribe(&mut self) -> Receiver<MapChange> {
        let (sender, receiver) = unbounded();
        self.observers.push(sender);
        receiver
    }

    pub fn status(&self) -> MapStatus {
        if let Some(err) = &self.boundary_error {
            return MapStatus::BoundaryError(Arc::clone(err));
        }
        match self.stream.as_ref().map(|s| &s.status) {
            None if self.aggregates.is_some() => MapStatus::Ready,
            None => MapStatus::Idle,
            Some(LoadStatus::Loading) => MapStatus::Loading,
            Some(LoadStatus::Complete) if self.points.is_empty() && self.aggregates.is_none() => {
                MapStatus::Empty
            }
            Some(LoadStatus::Complete) => MapStatus::Ready,
            Some(LoadStatus::Failed(e)) => MapStatus::LoadFailed(Arc::clone(e)),
            Some(LoadStatus::Cancelled) => MapStatus::Cancelled,
        }
    }

    // --- boundaries and aggregates ---------------------------------------------------------------

    /// Parses and installs the boundary document. A failure is kept as the
    /// map's status and returned.
    pub fn load_boundaries_str(&mut self, text: &str) -> std::result::Result<usize, Arc<Error>> {
        if let Some(existing) = &self.boundaries {
            debug!("boundaries already loaded, keeping cached set");
            return Ok(existing.len());
        }
        match BoundarySet::from_json_str(text, &self.config.boundary) {
            Ok(set) => Ok(self.set_boundaries(set)),
            Err(e) => {
                error!("boundary load failed: {e}");
                let err = Arc::new(e);
                self.fail_boundaries(Arc::clone(&err));
                Err(err)
            }
        }
    }

    /// Installs a loaded boundary set. Boundaries are loaded once per view;
    /// later calls keep the first set.
    pub fn set_boundaries(&mut self, set: BoundarySet) -> usize {
        if let Some(existing) = &self.boundaries {
            debug!("boundaries already loaded, ignoring new set");
            return existing.len();
        }
        let regions = set.len();
        self.boundaries = Some(Arc::new(set));
        self.boundary_error = None;
        info!("{regions} boundary regions installed");
        self.rebuild(ChangeKind::BoundariesLoaded { regions });
        regions
    }

    pub fn fail_boundaries(&mut self, err: Arc<Error>) {
        self.boundary_error = Some(err);
        self.rebuild(ChangeKind::BoundariesFailed);
    }

    /// Installs backend per-region totals, used for region counts in place
    /// of the raw points
    pub fn set_aggregates(&mut self, aggregates: RegionAggregates) {
        self.aggregates = Some(aggregates);
        self.rebuild(ChangeKind::AggregatesLoaded);
    }

    // --- load sessions ---------------------------------------------------------------------------

    /// Starts a fresh session: the previous one is cancelled, its points are
    /// dropped and any of its later messages will be ignored.
    pub fn begin_session(&mut self) -> (SessionId, CancellationFlag) {
        self.cancel.cancel();
        self.cancel = CancellationFlag::new();

        let session = SessionId::next();
        self.session = Some(session);
        self.points.clear();
        self.stream = Some(StreamState::new(session).summary());
        self.interaction.clear();
        info!("session {} started", session.value());

        self.rebuild(ChangeKind::SessionStarted(session));
        (session, self.cancel.clone())
    }

    pub fn cancel_session(&self) {
        self.cancel.cancel();
    }

    /// Appends one batch and redraws. Batches of any other session are
    /// ignored and `false` is returned.
    pub fn apply_batch(
        &mut self,
        session: SessionId,
        batch: &[GeographicPoint],
        summary: StreamSummary,
    ) -> bool {
        if self.session != Some(session) {
            debug!("ignoring batch from stale session {}", session.value());
            return false;
        }
        self.points.extend_from_slice(batch);
        self.stream = Some(summary);
        self.rebuild(ChangeKind::NewBatch {
            session,
            added: batch.len(),
        });
        true
    }

    pub fn finish_session(&mut self, summary: StreamSummary) -> bool {
        let session = summary.session;
        if self.session != Some(session) {
            debug!("ignoring completion of stale session {}", session.value());
            return false;
        }
        self.stream = Some(summary);
        self.rebuild(ChangeKind::SessionFinished(session));
        true
    }

    /// Runs a whole session in place, redrawing after every batch.
    pub async fn load<F: PageFetcher>(&mut self, fetcher: F) -> StreamState {
        let (session, cancel) = self.begin_session();
        let loader = StreamingLoader::new(fetcher).with_session(session);
        let state = loader
            .load_all(&cancel, |batch, state| {
                self.apply_batch(session, batch, state.summary());
            })
            .await;
        self.finish_session(state.summary());
        state
    }

    /// Starts a session on the tokio runtime; drive it with [`Self::pump`].
    #[cfg(feature = "tokio-runtime")]
    pub fn start_background<F>(&mut self, fetcher: F) -> BackgroundLoad
    where
        F: PageFetcher + 'static,
    {
        let (session, cancel) = self.begin_session();
        BackgroundLoad::spawn(fetcher, session, cancel)
    }

    /// Applies every message the background load has produced so far.
    /// Returns how many batches were applied.
    #[cfg(feature = "tokio-runtime")]
    pub fn pump(&mut self, load: &BackgroundLoad) -> usize {
        let mut applied = 0;
        for message in load.drain() {
            match message {
                LoadMessage::Batch {
                    session,
                    points,
                    summary,
                } => {
                    if self.apply_batch(session, &points, summary) {
                        applied += 1;
                    }
                }
                LoadMessage::Finished(summary) => {
                    self.finish_session(summary);
                }
            }
        }
        applied
    }

    // --- view changes ----------------------------------------------------------------------------

    pub fn set_mode(&mut self, mode: AggregationMode) {
        if self.aggregator.mode() == mode {
            return;
        }
        self.aggregator.set_mode(mode);
        self.config.density.mode = mode;
        self.rebuild(ChangeKind::ModeSwitch(mode));
    }

    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        if !(width > 0.0 && height > 0.0) {
            return Err(Error::Config(format!(
                "viewport must be positive, got {width}x{height}"
            )));
        }
        self.config.density.check_grid(width, height)?;
        self.projection = self.projection.resized(width, height);
        self.config.projection.viewport = (width, height);
        self.rebuild(ChangeKind::ViewportResize { width, height });
        Ok(())
    }

    /// Routes a pointer event to the interaction layer
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<Tooltip> {
        let scene = Arc::clone(&self.scene);
        let surface = &self.surface;
        let property = self.config.boundary.region_property.as_str();
        self.interaction
            .handle(&event, &scene, |shape| {
                tooltip_content(&scene, surface, property, shape)
            })
            .cloned()
    }

    // --- redraw ----------------------------------------------------------------------------------

    fn rebuild(&mut self, kind: ChangeKind) {
        let plan = kind.recomputes();

        if self.boundary_error.is_some() {
            self.scene = Arc::new(Scene::default());
            self.interaction.clear();
        } else if plan.any() {
            if plan.density {
                self.surface = self.aggregator.aggregate(&AggregationInput {
                    points: &self.points,
                    boundaries: self.boundaries.as_deref(),
                    aggregates: self.aggregates.as_ref(),
                    projection: &self.projection,
                });
            }

            let previous = Arc::clone(&self.scene);
            let regions = match (&self.boundaries, plan.regions) {
                (Some(boundaries), true) => {
                    let surface = &self.surface;
                    self.boundary_renderer.render(
                        boundaries.regions(),
                        &self.projection,
                        |id| surface.region_fill(id),
                    )
                }
                (None, true) => Vec::new(),
                (_, false) => previous.regions().to_vec(),
            };
            let markers = if plan.markers {
                self.point_renderer.render(&self.points, &self.projection)
            } else {
                previous.markers().to_vec()
            };
            let density = if plan.density {
                self.surface
                    .grid()
                    .map(|grid| self.density_renderer.render(grid))
            } else {
                previous.density().cloned()
            };

            self.scene = Arc::new(Scene::new(regions, markers, density));

            let scene = Arc::clone(&self.scene);
            let surface = &self.surface;
            let property = self.config.boundary.region_property.as_str();
            self.interaction
                .refresh(&scene, |shape| tooltip_content(&scene, surface, property, shape));
        }

        debug!("applied {kind:?}, recomputed {plan:?}");
        self.notify(kind);
    }

    fn notify(&mut self, kind: ChangeKind) {
        if self.observers.is_empty() {
            return;
        }
        let change = MapChange {
            kind,
            status: self.status(),
            scene: Arc::clone(&self.scene),
        };
        self.observers
            .retain(|observer| observer.send(change.clone()).is_ok());
    }

    // --- accessors -------------------------------------------------------------------------------

    /// Current scene snapshot; stays valid while later redraws replace it
    pub fn scene(&self) -> Arc<Scene> {
        Arc::clone(&self.scene)
    }

    pub fn points(&self) -> &[GeographicPoint] {
        &self.points
    }

    pub fn stream_summary(&self) -> Option<&StreamSummary> {
        self.stream.as_ref()
    }

    pub fn surface(&self) -> &DensitySurface {
        &self.surface
    }

    pub fn region_counts(&self) -> Option<&RegionCounts> {
        self.surface.region_counts()
    }

    pub fn mode(&self) -> AggregationMode {
        self.aggregator.mode()
    }

    pub fn projection(&self) -> &MercatorProjection {
        &self.projection
    }

    pub fn boundaries(&self) -> Option<&BoundarySet> {
        self.boundaries.as_deref()
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.interaction.mode()
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.interaction.tooltip()
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

fn tooltip_content(
    scene: &Scene,
    surface: &DensitySurface,
    property: &str,
    shape: &ShapeId,
) -> String {
    match shape {
        ShapeId::Region(id) => region_content(
            property,
            id,
            surface.region_counts().and_then(|counts| counts.totals(id)),
        ),
        ShapeId::Marker(source_index) => scene
            .marker(*source_index)
            .map(marker_content)
            .unwrap_or_default(),
    }
}
