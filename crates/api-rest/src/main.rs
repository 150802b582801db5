//! Standalone REST API server binary.
//!
//! ## Purpose
//! Exposes the identifier authority over HTTP: identifier lookup, set
//! management, and batch minting, with OpenAPI/Swagger documentation.
//!
//! ## Intended use
//! Deployed alongside label-printing and sample-intake tooling that needs
//! to mint or resolve identifiers without shell access to the data
//! directory. The `idmint` CLI covers the same operations for operators.

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use idmint_core::{
    constants::DEFAULT_DATA_DIR, mint::mint, CoreConfig, IdentifierRecord, IdentifierSet,
    IdentifierStore, IdentifierUse, MintBatch, SetName, StoreError,
};

/// Application state for the REST API server
///
/// Holds the shared identifier store; cloning the state clones the `Arc`,
/// so every handler operates on the same store and its one population lock.
#[derive(Clone)]
struct AppState {
    store: Arc<IdentifierStore>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        lookup_identifier,
        list_sets,
        get_set,
        upsert_set,
        mint_identifiers,
    ),
    components(schemas(
        HealthRes,
        IdentifierRes,
        IdentifierSetRes,
        UpsertSetReq,
        MintReq,
        MintRes,
        MintedIdentifier,
        MintStatsRes,
    ))
)]
struct ApiDoc;

#[derive(serde::Serialize, ToSchema)]
struct HealthRes {
    ok: bool,
    message: String,
}

#[derive(serde::Serialize, ToSchema)]
struct IdentifierRes {
    uuid: String,
    barcode: String,
    generated: String,
    set_name: String,
    set_use: String,
}

impl From<IdentifierRecord> for IdentifierRes {
    fn from(record: IdentifierRecord) -> Self {
        IdentifierRes {
            uuid: record.uuid.to_string(),
            barcode: record.barcode.to_string(),
            generated: record.generated.to_rfc3339(),
            set_name: record.set_name.to_string(),
            set_use: record.set_use.to_string(),
        }
    }
}

#[derive(serde::Serialize, ToSchema)]
struct IdentifierSetRes {
    name: String,
    #[serde(rename = "use")]
    use_kind: String,
    description: Option<String>,
}

impl From<IdentifierSet> for IdentifierSetRes {
    fn from(set: IdentifierSet) -> Self {
        IdentifierSetRes {
            name: set.name.to_string(),
            use_kind: set.use_kind.to_string(),
            description: set.description,
        }
    }
}

#[derive(serde::Deserialize, ToSchema)]
struct UpsertSetReq {
    #[serde(rename = "use")]
    use_kind: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(serde::Deserialize, ToSchema)]
struct MintReq {
    count: usize,
}

#[derive(serde::Serialize, ToSchema)]
struct MintedIdentifier {
    uuid: String,
    barcode: String,
}

#[derive(serde::Serialize, ToSchema)]
struct MintStatsRes {
    requested: usize,
    retries: u64,
    elapsed_seconds: f64,
    mean_failures_per_slot: f64,
    median_failures_per_slot: f64,
    max_failures_per_slot: u32,
}

#[derive(serde::Serialize, ToSchema)]
struct MintRes {
    identifiers: Vec<MintedIdentifier>,
    stats: MintStatsRes,
}

impl From<MintBatch> for MintRes {
    fn from(batch: MintBatch) -> Self {
        MintRes {
            identifiers: batch
                .identifiers
                .into_iter()
                .map(|identifier| MintedIdentifier {
                    uuid: identifier.uuid.to_string(),
                    barcode: identifier.barcode.to_string(),
                })
                .collect(),
            stats: MintStatsRes {
                requested: batch.stats.requested,
                retries: batch.stats.retries,
                elapsed_seconds: batch.stats.elapsed_seconds,
                mean_failures_per_slot: batch.stats.mean_failures_per_slot,
                median_failures_per_slot: batch.stats.median_failures_per_slot,
                max_failures_per_slot: batch.stats.max_failures_per_slot,
            },
        }
    }
}

/// Main entry point for the idmint REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
///
/// # Environment Variables
/// - `IDMINT_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `IDMINT_DATA_DIR`: Identifier data directory (default: "idmint_data")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the identifier store cannot be opened, or
/// - the server address cannot be bound or the HTTP server fails while
///   running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("idmint_api_rest=info".parse()?)
                .add_directive("idmint_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("IDMINT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting idmint REST API on {}", addr);

    let data_dir = std::env::var("IDMINT_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let cfg = Arc::new(CoreConfig::with_defaults(PathBuf::from(data_dir))?);
    let store = Arc::new(IdentifierStore::open(cfg)?);

    let state = AppState { store };

    let app = Router::new()
        .route("/health", get(health))
        .route("/identifiers/:id", get(lookup_identifier))
        .route("/identifier-sets", get(list_sets))
        .route("/identifier-sets/:name", get(get_set))
        .route("/identifier-sets/:name", put(upsert_set))
        .route("/identifier-sets/:name/mint", post(mint_identifiers))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Maps a store error onto the HTTP status its class deserves.
///
/// Candidate collisions surface as 409 because the caller can re-request;
/// they only escape the minting loop when the attempt ceiling is hit, in
/// which case `MintExhausted` (500) is returned instead.
fn error_response(error: &StoreError) -> (StatusCode, String) {
    let status = match error {
        StoreError::UnknownSet(_) | StoreError::UnknownIdentifier(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidInput(_) | StoreError::Barcode(_) => StatusCode::BAD_REQUEST,
        StoreError::ExclusionViolation { .. }
        | StoreError::BarcodeTaken(_)
        | StoreError::UuidTaken(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "idmint REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/identifiers/{id}",
    responses(
        (status = 200, description = "Identifier found", body = IdentifierRes),
        (status = 404, description = "No such identifier"),
        (status = 500, description = "Internal server error")
    )
)]
/// Look up one identifier by its full UUID or its barcode
///
/// # Errors
/// Returns `404 Not Found` if the id matches no minted identifier.
#[axum::debug_handler]
async fn lookup_identifier(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<IdentifierRes>, (StatusCode, String)> {
    match state.store.lookup(&id) {
        Ok(record) => Ok(Json(record.into())),
        Err(e) => {
            tracing::debug!("Lookup of {:?} failed: {}", id, e);
            Err(error_response(&e))
        }
    }
}

#[utoipa::path(
    get,
    path = "/identifier-sets",
    responses(
        (status = 200, description = "All identifier sets", body = [IdentifierSetRes]),
        (status = 500, description = "Internal server error")
    )
)]
/// List all identifier sets
#[axum::debug_handler]
async fn list_sets(
    State(state): State<AppState>,
) -> Result<Json<Vec<IdentifierSetRes>>, (StatusCode, String)> {
    match state.store.sets() {
        Ok(sets) => Ok(Json(sets.into_iter().map(IdentifierSetRes::from).collect())),
        Err(e) => {
            tracing::error!("List sets error: {:?}", e);
            Err(error_response(&e))
        }
    }
}

#[utoipa::path(
    get,
    path = "/identifier-sets/{name}",
    responses(
        (status = 200, description = "Identifier set found", body = IdentifierSetRes),
        (status = 400, description = "Bad set name"),
        (status = 404, description = "No such identifier set")
    )
)]
/// Fetch one identifier set by name
#[axum::debug_handler]
async fn get_set(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> Result<Json<IdentifierSetRes>, (StatusCode, String)> {
    let name =
        SetName::new(&name).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    match state.store.set(&name) {
        Ok(set) => Ok(Json(set.into())),
        Err(e) => Err(error_response(&e)),
    }
}

#[utoipa::path(
    put,
    path = "/identifier-sets/{name}",
    request_body = UpsertSetReq,
    responses(
        (status = 201, description = "Identifier set created", body = IdentifierSetRes),
        (status = 200, description = "Identifier set updated", body = IdentifierSetRes),
        (status = 400, description = "Bad set name or use"),
        (status = 500, description = "Internal server error")
    )
)]
/// Create or update an identifier set
///
/// Creating a set that already exists updates its use and description and
/// responds `200` instead of `201`.
#[axum::debug_handler]
async fn upsert_set(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
    Json(req): Json<UpsertSetReq>,
) -> Result<(StatusCode, Json<IdentifierSetRes>), (StatusCode, String)> {
    let name =
        SetName::new(&name).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let use_kind = IdentifierUse::from_str(&req.use_kind)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    match state.store.create_set(&name, use_kind, req.description) {
        Ok((set, created)) => {
            let status = if created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            Ok((status, Json(set.into())))
        }
        Err(e) => {
            tracing::error!("Upsert set error: {:?}", e);
            Err(error_response(&e))
        }
    }
}

#[utoipa::path(
    post,
    path = "/identifier-sets/{name}/mint",
    request_body = MintReq,
    responses(
        (status = 201, description = "Identifiers minted", body = MintRes),
        (status = 400, description = "Bad set name"),
        (status = 404, description = "No such identifier set"),
        (status = 500, description = "Internal server error")
    )
)]
/// Mint a batch of new identifiers in the named set
///
/// Minting takes the store's exclusive write lock for each insert and can
/// retry heavily in a crowded barcode space, so the batch runs on the
/// blocking thread pool rather than stalling the async executor.
///
/// # Errors
/// Returns `404 Not Found` for an unknown set and `500` if the batch
/// exhausts its attempt ceiling or storage fails.
#[axum::debug_handler]
async fn mint_identifiers(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
    Json(req): Json<MintReq>,
) -> Result<(StatusCode, Json<MintRes>), (StatusCode, String)> {
    let set_name =
        SetName::new(&name).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let store = state.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        mint(&store, &set_name, req.count, Uuid::new_v4)
    })
    .await
    .map_err(|e| {
        tracing::error!("Mint task failed to complete: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "mint task failed to complete".to_string(),
        )
    })?;

    match result {
        Ok(batch) => Ok((StatusCode::CREATED, Json(batch.into()))),
        Err(e) => {
            tracing::error!("Mint error: {:?}", e);
            Err(error_response(&e))
        }
    }
}
