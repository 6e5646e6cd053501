//! HTTP host for the browser renderer.
//!
//! The renderer owns the scene and pointer handling; everything authoritative
//! (units, history, selection, placement) lives behind this API. One
//! workspace is shared by all requests, guarded by a mutex.

use std::convert::Infallible;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::sync::{Mutex, broadcast};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::config::ApiConfig;
use crate::editor::{EditorError, LayoutManager};
use crate::map::{MapRect, MapView, project};
use crate::model::{Bounds, Item, ItemPatch, Unit, UnitId};
use crate::persistence::{ImportError, LayoutDocument, export_layout, import_layout};
use crate::placement::{
    LiveTransform, PlacementConfig, PlacementError, PlacementSession, TransformHandle,
};
use crate::store::{LayoutStore, StoreError};
use crate::types::Vec3;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Everything the editor needs between requests.
pub struct Workspace {
    pub manager: LayoutManager,
    pub session: PlacementSession,
    pub store: LayoutStore,
    pub transform: LiveTransform,
}

impl Workspace {
    /// Opens the store's current layout in a fresh editor.
    pub fn new(config: PlacementConfig, store: LayoutStore) -> Self {
        let current = store.current();
        let manager = LayoutManager::with_units(current.cubes.clone(), current.bounds, config);
        Self {
            manager,
            session: PlacementSession::from_config(&config),
            store,
            transform: LiveTransform::default(),
        }
    }

    /// Fails while a drag is active, so the layout cannot change under it.
    fn ensure_idle(&self) -> Result<(), ApiError> {
        match self.session.dragging_unit() {
            Some(unit) => Err(ApiError::DragInProgress(unit)),
            None => Ok(()),
        }
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    workspace: Arc<Mutex<Workspace>>,
    events: broadcast::Sender<PlacementEvent>,
}

impl ApiState {
    pub fn new(workspace: Workspace) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            workspace: Arc::new(Mutex::new(workspace)),
            events,
        }
    }
}

/// Emitted after every confirmed placement.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PlacementEvent {
    pub unit: UnitId,
    #[schema(value_type = [f64; 3], example = json!([1.0, 0.5, 1.0]))]
    pub position: [f64; 3],
    pub sku: String,
}

impl From<&Unit> for PlacementEvent {
    fn from(unit: &Unit) -> Self {
        Self {
            unit: unit.id,
            position: unit.position.into(),
            sku: unit.item.sku.clone(),
        }
    }
}

/// Editor state returned by every mutating endpoint.
#[derive(Serialize, ToSchema)]
pub struct EditorStatus {
    pub cubes: Vec<Unit>,
    pub bounds: Bounds,
    #[schema(nullable = true)]
    pub selected: Option<UnitId>,
    #[schema(nullable = true)]
    pub dragging: Option<UnitId>,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl EditorStatus {
    fn of(workspace: &Workspace) -> Self {
        let manager = &workspace.manager;
        Self {
            cubes: manager.units().to_vec(),
            bounds: *manager.bounds(),
            selected: manager.selected(),
            dragging: workspace.session.dragging_unit(),
            can_undo: manager.can_undo(),
            can_redo: manager.can_redo(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[schema(example = json!({ "size": [2.0, 1.0, 2.0] }))]
pub struct SizeRequest {
    #[schema(value_type = [f64; 3])]
    pub size: [f64; 3],
}

#[derive(Deserialize, ToSchema)]
pub struct SelectionRequest {
    /// Unit to select; `null` clears the selection.
    #[serde(default)]
    #[schema(nullable = true)]
    pub id: Option<UnitId>,
}

#[derive(Deserialize, ToSchema)]
pub struct DragBeginRequest {
    pub id: UnitId,
}

/// Sampled pointer position on the floor plane.
#[derive(Deserialize, ToSchema)]
pub struct DragMoveRequest {
    pub x: f64,
    pub z: f64,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct DragEndRequest {
    /// Last pointer position, if it moved since the previous sample.
    #[serde(default)]
    #[schema(nullable = true)]
    pub x: Option<f64>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub z: Option<f64>,
    /// Set when pointer capture was lost instead of released.
    #[serde(default)]
    pub abandoned: bool,
}

#[derive(Serialize, ToSchema)]
pub struct DragPreview {
    pub unit: UnitId,
    #[schema(value_type = [f64; 3])]
    pub position: [f64; 3],
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize, ToSchema)]
pub struct SearchResponse {
    pub matches: Vec<UnitId>,
}

#[derive(Serialize, ToSchema)]
pub struct LayoutSummary {
    pub index: usize,
    pub name: String,
    pub unit_count: usize,
}

#[derive(Serialize, ToSchema)]
pub struct LayoutsResponse {
    pub layouts: Vec<LayoutSummary>,
    pub current: usize,
}

impl LayoutsResponse {
    fn of(store: &LayoutStore) -> Self {
        Self {
            layouts: store
                .layouts()
                .iter()
                .enumerate()
                .map(|(index, layout)| LayoutSummary {
                    index,
                    name: layout.name.clone(),
                    unit_count: layout.cubes.len(),
                })
                .collect(),
            current: store.current_index(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct NewLayoutRequest {
    /// Blank or missing names become `Layout <n>`.
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RenameLayoutRequest {
    /// Blank names reset to `Layout <n>`.
    pub name: String,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

/// Failures surfaced by handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("could not serialize layout: {0}")]
    Export(#[from] serde_json::Error),
    #[error("no drag in progress")]
    NotDragging,
    #[error("unit {0} is being dragged; finish the drag first")]
    DragInProgress(UnitId),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::Json(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Invalid JSON data"),
            ApiError::Editor(EditorError::UnitNotFound(_))
            | ApiError::Placement(PlacementError::UnknownUnit(_)) => {
                (StatusCode::NOT_FOUND, "Unknown unit")
            }
            ApiError::Editor(EditorError::Validation(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Invalid input data")
            }
            ApiError::Editor(_)
            | ApiError::Placement(_)
            | ApiError::NotDragging
            | ApiError::DragInProgress(_) => {
                (StatusCode::CONFLICT, "Operation not possible")
            }
            ApiError::Import(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Invalid layout document"),
            ApiError::Store(StoreError::IndexOutOfRange { .. }) => {
                (StatusCode::NOT_FOUND, "Unknown layout")
            }
            ApiError::Store(StoreError::LastLayout) => {
                (StatusCode::CONFLICT, "Operation not possible")
            }
            ApiError::Store(_) | ApiError::Export(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage failure")
            }
        };
        if status.is_server_error() {
            warn!(error = %self, "request failed");
        }
        error_response(status, error, self.to_string())
    }
}

fn parse<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(value) = payload?;
    Ok(value)
}

type StatusResult = Result<Json<EditorStatus>, ApiError>;

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        get_layout,
        put_layout,
        add_unit,
        remove_unit,
        update_item,
        update_size,
        set_bounds,
        select,
        copy,
        paste,
        drag_begin,
        drag_move,
        drag_end,
        undo,
        redo,
        search,
        map,
        list_layouts,
        create_layout,
        activate_layout,
        rename_layout,
        delete_layout,
        save_layout,
        events
    ),
    components(
        schemas(
            LayoutDocument,
            Unit,
            Item,
            ItemPatch,
            Bounds,
            EditorStatus,
            SizeRequest,
            SelectionRequest,
            DragBeginRequest,
            DragMoveRequest,
            DragEndRequest,
            DragPreview,
            SearchResponse,
            MapView,
            MapRect,
            LayoutsResponse,
            LayoutSummary,
            NewLayoutRequest,
            RenameLayoutRequest,
            PlacementEvent,
            ErrorResponse
        )
    ),
    tags(
        (name = "layout", description = "Units, history and selection of the live layout"),
        (name = "placement", description = "Drag-and-drop placement session"),
        (name = "layouts", description = "Named layouts kept on disk")
    )
)]
struct ApiDoc;

/// Builds the router with all endpoints.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/layout", get(get_layout).put(put_layout))
        .route("/units", post(add_unit))
        .route("/units/{id}", delete(remove_unit))
        .route("/units/{id}/item", patch(update_item))
        .route("/units/{id}/size", put(update_size))
        .route("/bounds", put(set_bounds))
        .route("/selection", post(select))
        .route("/clipboard/copy", post(copy))
        .route("/clipboard/paste", post(paste))
        .route("/drag/begin", post(drag_begin))
        .route("/drag/move", post(drag_move))
        .route("/drag/end", post(drag_end))
        .route("/history/undo", post(undo))
        .route("/history/redo", post(redo))
        .route("/search", get(search))
        .route("/map", get(map))
        .route("/layouts", get(list_layouts).post(create_layout))
        .route("/layouts/save", post(save_layout))
        .route("/layouts/{index}/activate", post(activate_layout))
        .route("/layouts/{index}", put(rename_layout).delete(delete_layout))
        .route("/events", get(events))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .layer(cors)
        .with_state(state)
}

/// Binds the configured address and serves until the server stops.
pub async fn start_api_server(config: ApiConfig, workspace: Workspace) -> std::io::Result<()> {
    let app = router(ApiState::new(workspace));
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        url = %format!("http://{}:{}", config.display_host(), config.port()),
        all_interfaces = config.binds_to_all_interfaces(),
        "layout server running"
    );
    info!("OpenAPI document at /docs/openapi.json, placement events at /events");

    axum::serve(listener, app).await
}

/// Exports the live layout document.
#[utoipa::path(
    get,
    path = "/layout",
    responses((status = 200, description = "Current layout document", body = LayoutDocument)),
    tag = "layout"
)]
async fn get_layout(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let workspace = state.workspace.lock().await;
    let json = export_layout(workspace.manager.units(), workspace.manager.bounds())?;
    Ok(([(header::CONTENT_TYPE, "application/json")], json).into_response())
}

/// Replaces the live layout with an imported document.
///
/// Accepts the current `{cubes, bounds}` shape and the older bare array.
/// A rejected payload leaves the layout untouched.
#[utoipa::path(
    put,
    path = "/layout",
    request_body = LayoutDocument,
    responses(
        (status = 200, description = "Layout imported", body = EditorStatus),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid layout document", body = ErrorResponse),
        (status = CONFLICT, description = "A drag is in progress", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn put_layout(State(state): State<ApiState>, body: String) -> StatusResult {
    let document = import_layout(&body)?;
    let mut workspace = state.workspace.lock().await;
    workspace.ensure_idle()?;
    workspace
        .manager
        .replace_all(document.cubes, document.bounds);
    Ok(Json(EditorStatus::of(&workspace)))
}

#[utoipa::path(
    post,
    path = "/units",
    responses((status = 201, description = "Unit added at the origin", body = EditorStatus)),
    tag = "layout"
)]
async fn add_unit(
    State(state): State<ApiState>,
) -> Result<(StatusCode, Json<EditorStatus>), ApiError> {
    let mut workspace = state.workspace.lock().await;
    workspace.manager.add_unit();
    Ok((StatusCode::CREATED, Json(EditorStatus::of(&workspace))))
}

#[utoipa::path(
    delete,
    path = "/units/{id}",
    params(("id" = u64, Path, description = "Unit id")),
    responses(
        (status = 200, description = "Unit removed", body = EditorStatus),
        (status = NOT_FOUND, description = "Unknown unit", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn remove_unit(State(state): State<ApiState>, Path(id): Path<u64>) -> StatusResult {
    let mut workspace = state.workspace.lock().await;
    workspace.manager.remove_unit(UnitId(id))?;
    Ok(Json(EditorStatus::of(&workspace)))
}

#[utoipa::path(
    patch,
    path = "/units/{id}/item",
    params(("id" = u64, Path, description = "Unit id")),
    request_body = ItemPatch,
    responses(
        (status = 200, description = "Item updated", body = EditorStatus),
        (status = NOT_FOUND, description = "Unknown unit", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn update_item(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    payload: Result<Json<ItemPatch>, JsonRejection>,
) -> StatusResult {
    let patch = parse(payload)?;
    let mut workspace = state.workspace.lock().await;
    workspace.manager.update_item(UnitId(id), &patch)?;
    Ok(Json(EditorStatus::of(&workspace)))
}

#[utoipa::path(
    put,
    path = "/units/{id}/size",
    params(("id" = u64, Path, description = "Unit id")),
    request_body = SizeRequest,
    responses(
        (status = 200, description = "Unit resized", body = EditorStatus),
        (status = NOT_FOUND, description = "Unknown unit", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Non-finite size", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn update_size(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    payload: Result<Json<SizeRequest>, JsonRejection>,
) -> StatusResult {
    let request = parse(payload)?;
    let mut workspace = state.workspace.lock().await;
    workspace
        .manager
        .update_size(UnitId(id), Vec3::from(request.size))?;
    Ok(Json(EditorStatus::of(&workspace)))
}

#[utoipa::path(
    put,
    path = "/bounds",
    request_body = Bounds,
    responses(
        (status = 200, description = "Bounds changed", body = EditorStatus),
        (status = UNPROCESSABLE_ENTITY, description = "Non-positive extent", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn set_bounds(
    State(state): State<ApiState>,
    payload: Result<Json<Bounds>, JsonRejection>,
) -> StatusResult {
    let bounds = parse(payload)?;
    let mut workspace = state.workspace.lock().await;
    workspace.manager.set_bounds(bounds)?;
    Ok(Json(EditorStatus::of(&workspace)))
}

#[utoipa::path(
    post,
    path = "/selection",
    request_body = SelectionRequest,
    responses(
        (status = 200, description = "Selection changed", body = EditorStatus),
        (status = NOT_FOUND, description = "Unknown unit", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn select(
    State(state): State<ApiState>,
    payload: Result<Json<SelectionRequest>, JsonRejection>,
) -> StatusResult {
    let request = parse(payload)?;
    let mut workspace = state.workspace.lock().await;
    workspace.manager.select(request.id)?;
    Ok(Json(EditorStatus::of(&workspace)))
}

#[utoipa::path(
    post,
    path = "/clipboard/copy",
    responses(
        (status = 200, description = "Selected unit copied", body = EditorStatus),
        (status = CONFLICT, description = "Nothing selected", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn copy(State(state): State<ApiState>) -> StatusResult {
    let mut workspace = state.workspace.lock().await;
    workspace.manager.copy_selected()?;
    Ok(Json(EditorStatus::of(&workspace)))
}

#[utoipa::path(
    post,
    path = "/clipboard/paste",
    responses(
        (status = 201, description = "Copy inserted and selected", body = EditorStatus),
        (status = CONFLICT, description = "Clipboard is empty", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn paste(
    State(state): State<ApiState>,
) -> Result<(StatusCode, Json<EditorStatus>), ApiError> {
    let mut workspace = state.workspace.lock().await;
    workspace.manager.paste()?;
    Ok((StatusCode::CREATED, Json(EditorStatus::of(&workspace))))
}

/// Pointer-down on a unit's manipulation handle.
#[utoipa::path(
    post,
    path = "/drag/begin",
    request_body = DragBeginRequest,
    responses(
        (status = 200, description = "Drag started", body = DragPreview),
        (status = NOT_FOUND, description = "Unknown unit", body = ErrorResponse),
        (status = CONFLICT, description = "Another drag is active", body = ErrorResponse)
    ),
    tag = "placement"
)]
async fn drag_begin(
    State(state): State<ApiState>,
    payload: Result<Json<DragBeginRequest>, JsonRejection>,
) -> Result<Json<DragPreview>, ApiError> {
    let request = parse(payload)?;
    let mut guard = state.workspace.lock().await;
    let Workspace {
        manager,
        session,
        transform,
        ..
    } = &mut *guard;
    session.begin(manager, request.id, transform)?;
    Ok(Json(DragPreview {
        unit: request.id,
        position: transform.position().into(),
    }))
}

/// Per-frame sample: previews the resting height at the pointer.
///
/// Only the live transform changes; the layout itself is untouched until
/// the drag ends.
#[utoipa::path(
    post,
    path = "/drag/move",
    request_body = DragMoveRequest,
    responses(
        (status = 200, description = "Previewed position", body = DragPreview),
        (status = CONFLICT, description = "No drag in progress", body = ErrorResponse)
    ),
    tag = "placement"
)]
async fn drag_move(
    State(state): State<ApiState>,
    payload: Result<Json<DragMoveRequest>, JsonRejection>,
) -> Result<Json<DragPreview>, ApiError> {
    let request = parse(payload)?;
    let mut guard = state.workspace.lock().await;
    let Workspace {
        manager,
        session,
        transform,
        ..
    } = &mut *guard;
    let unit = session.dragging_unit().ok_or(ApiError::NotDragging)?;

    let live = transform.position();
    transform.set_position(Vec3::new(request.x, live.y, request.z));
    session.tick(manager, transform).ok_or(ApiError::NotDragging)?;
    Ok(Json(DragPreview {
        unit,
        position: transform.position().into(),
    }))
}

/// Pointer-up (or lost capture): commits the final placement.
///
/// Ending without an active drag is a no-op.
#[utoipa::path(
    post,
    path = "/drag/end",
    request_body = DragEndRequest,
    responses((status = 200, description = "Placement committed", body = EditorStatus)),
    tag = "placement"
)]
async fn drag_end(
    State(state): State<ApiState>,
    payload: Result<Json<DragEndRequest>, JsonRejection>,
) -> StatusResult {
    let request = parse(payload)?;
    let mut guard = state.workspace.lock().await;
    let Workspace {
        manager,
        session,
        transform,
        ..
    } = &mut *guard;

    if let (Some(x), Some(z)) = (request.x, request.z) {
        let live = transform.position();
        transform.set_position(Vec3::new(x, live.y, z));
    }

    let events = state.events.clone();
    let mut notify = |unit: &Unit| {
        // No subscribers is fine.
        let _ = events.send(PlacementEvent::from(unit));
    };
    if request.abandoned {
        session.abandon(manager, transform, &mut notify);
    } else {
        session.commit(manager, transform, &mut notify);
    }
    Ok(Json(EditorStatus::of(&guard)))
}

#[utoipa::path(
    post,
    path = "/history/undo",
    responses(
        (status = 200, description = "Previous state restored, or unchanged at the boundary", body = EditorStatus),
        (status = CONFLICT, description = "A drag is in progress", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn undo(State(state): State<ApiState>) -> StatusResult {
    let mut workspace = state.workspace.lock().await;
    workspace.ensure_idle()?;
    workspace.manager.undo();
    Ok(Json(EditorStatus::of(&workspace)))
}

#[utoipa::path(
    post,
    path = "/history/redo",
    responses(
        (status = 200, description = "Undone state re-applied, or unchanged at the boundary", body = EditorStatus),
        (status = CONFLICT, description = "A drag is in progress", body = ErrorResponse)
    ),
    tag = "layout"
)]
async fn redo(State(state): State<ApiState>) -> StatusResult {
    let mut workspace = state.workspace.lock().await;
    workspace.ensure_idle()?;
    workspace.manager.redo();
    Ok(Json(EditorStatus::of(&workspace)))
}

#[utoipa::path(
    get,
    path = "/search",
    params(("q" = Option<String>, Query, description = "Case-insensitive SKU or category fragment")),
    responses((status = 200, description = "Matching unit ids", body = SearchResponse)),
    tag = "layout"
)]
async fn search(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Json<SearchResponse> {
    let workspace = state.workspace.lock().await;
    Json(SearchResponse {
        matches: workspace.manager.search(&query.q),
    })
}

/// Top-down projection, with search matches highlighted.
#[utoipa::path(
    get,
    path = "/map",
    params(("q" = Option<String>, Query, description = "Search query to highlight")),
    responses((status = 200, description = "Floor plan", body = MapView)),
    tag = "layout"
)]
async fn map(State(state): State<ApiState>, Query(query): Query<SearchQuery>) -> Json<MapView> {
    let workspace = state.workspace.lock().await;
    let manager = &workspace.manager;
    let matches = manager.search(&query.q);
    Json(project(
        manager.units(),
        manager.bounds(),
        manager.selected(),
        &matches,
    ))
}

#[utoipa::path(
    get,
    path = "/layouts",
    responses((status = 200, description = "Stored layouts", body = LayoutsResponse)),
    tag = "layouts"
)]
async fn list_layouts(State(state): State<ApiState>) -> Json<LayoutsResponse> {
    let workspace = state.workspace.lock().await;
    Json(LayoutsResponse::of(&workspace.store))
}

/// Stores the live layout under a new name and makes it current.
#[utoipa::path(
    post,
    path = "/layouts",
    request_body = NewLayoutRequest,
    responses(
        (status = 201, description = "Layout stored", body = LayoutsResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Store could not be written", body = ErrorResponse)
    ),
    tag = "layouts"
)]
async fn create_layout(
    State(state): State<ApiState>,
    payload: Result<Json<NewLayoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LayoutsResponse>), ApiError> {
    let request = parse(payload)?;
    let mut guard = state.workspace.lock().await;
    let Workspace { manager, store, .. } = &mut *guard;
    store.add_layout(&request.name, manager.units().to_vec(), *manager.bounds())?;
    Ok((StatusCode::CREATED, Json(LayoutsResponse::of(store))))
}

/// Overwrites the current stored layout with the live one.
#[utoipa::path(
    post,
    path = "/layouts/save",
    responses(
        (status = 200, description = "Layout saved", body = LayoutsResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Store could not be written", body = ErrorResponse)
    ),
    tag = "layouts"
)]
async fn save_layout(State(state): State<ApiState>) -> Result<Json<LayoutsResponse>, ApiError> {
    let mut guard = state.workspace.lock().await;
    let Workspace { manager, store, .. } = &mut *guard;
    store.save_current(manager.units().to_vec(), *manager.bounds())?;
    info!(index = store.current_index(), "layout saved");
    Ok(Json(LayoutsResponse::of(store)))
}

/// Loads a stored layout into the editor.
#[utoipa::path(
    post,
    path = "/layouts/{index}/activate",
    params(("index" = usize, Path, description = "Position in the layout list")),
    responses(
        (status = 200, description = "Layout loaded", body = EditorStatus),
        (status = NOT_FOUND, description = "Unknown layout", body = ErrorResponse),
        (status = CONFLICT, description = "A drag is in progress", body = ErrorResponse)
    ),
    tag = "layouts"
)]
async fn activate_layout(State(state): State<ApiState>, Path(index): Path<usize>) -> StatusResult {
    let mut guard = state.workspace.lock().await;
    guard.ensure_idle()?;
    let Workspace { manager, store, .. } = &mut *guard;
    let layout = store.switch_to(index)?;
    manager.replace_all(layout.cubes.clone(), layout.bounds);
    Ok(Json(EditorStatus::of(&guard)))
}

#[utoipa::path(
    put,
    path = "/layouts/{index}",
    params(("index" = usize, Path, description = "Position in the layout list")),
    request_body = RenameLayoutRequest,
    responses(
        (status = 200, description = "Layout renamed", body = LayoutsResponse),
        (status = NOT_FOUND, description = "Unknown layout", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid JSON data", body = ErrorResponse)
    ),
    tag = "layouts"
)]
async fn rename_layout(
    State(state): State<ApiState>,
    Path(index): Path<usize>,
    payload: Result<Json<RenameLayoutRequest>, JsonRejection>,
) -> Result<Json<LayoutsResponse>, ApiError> {
    let request = parse(payload)?;
    let mut workspace = state.workspace.lock().await;
    workspace.store.rename(index, &request.name)?;
    Ok(Json(LayoutsResponse::of(&workspace.store)))
}

/// Removes a stored layout. The editor follows the new current layout.
#[utoipa::path(
    delete,
    path = "/layouts/{index}",
    params(("index" = usize, Path, description = "Position in the layout list")),
    responses(
        (status = 200, description = "Layout removed", body = LayoutsResponse),
        (status = NOT_FOUND, description = "Unknown layout", body = ErrorResponse),
        (status = CONFLICT, description = "Last remaining layout or a drag is in progress", body = ErrorResponse)
    ),
    tag = "layouts"
)]
async fn delete_layout(
    State(state): State<ApiState>,
    Path(index): Path<usize>,
) -> Result<Json<LayoutsResponse>, ApiError> {
    let mut guard = state.workspace.lock().await;
    guard.ensure_idle()?;
    let Workspace { manager, store, .. } = &mut *guard;
    let previous = store.current_index();
    store.remove(index)?;
    if index == previous {
        let current = store.current();
        manager.replace_all(current.cubes.clone(), current.bounds);
    }
    Ok(Json(LayoutsResponse::of(store)))
}

/// Server-sent stream of confirmed placements.
#[utoipa::path(
    get,
    path = "/events",
    responses(
        (
            status = 200,
            description = "One `placement` event per committed drag",
            content_type = "text/event-stream",
            body = PlacementEvent
        )
    ),
    tag = "placement"
)]
async fn events(
    State(state): State<ApiState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.events.subscribe())
        // Lagged receivers skip what they missed.
        .filter_map(|message| message.ok())
        .filter_map(|event| {
            Event::default()
                .event("placement")
                .json_data(event)
                .ok()
        })
        .map(Ok);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(10))
            .text("keep-alive"),
    )
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}
