use crate::api::model::{DeleteReply, ErrorReply};
use crate::backend::config::SimulatorConfig;
use crate::backend::store::{DetectionQuery, DetectionStore};
use chrono::Local;
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use warp::{
    http::StatusCode,
    reply::{self, Json, WithStatus},
    Filter, Rejection,
};

/// Shared state behind every route.
#[derive(Clone)]
pub struct ApiState {
    store: Arc<RwLock<DetectionStore>>,
    config: Arc<SimulatorConfig>,
}

impl ApiState {
    pub fn new(store: DetectionStore, config: SimulatorConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            config: Arc::new(config),
        }
    }

    #[cfg(test)]
    pub fn live_rows(&self) -> usize {
        self.store.read().map(|store| store.len()).unwrap_or(0)
    }
}

/// All backend routes: detections listing, legacy violations listing,
/// image deletion and the camera config document.
pub fn routes(
    state: ApiState,
) -> impl Filter<Extract = (WithStatus<Json>,), Error = Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    let detections = warp::path!("api" / "detections")
        .and(warp::get())
        .and(warp::query::<DetectionQuery>())
        .and(state_filter.clone())
        .map(|query: DetectionQuery, state: ApiState| list_detections(&state, query));

    let violations = warp::path!("api" / "violations")
        .and(warp::get())
        .and(warp::query::<DetectionQuery>())
        .and(state_filter.clone())
        .map(|mut query: DetectionQuery, state: ApiState| {
            query.violations_only = Some("true".into());
            list_detections(&state, query)
        });

    let delete = warp::path!("api" / "files" / "delete" / String)
        .and(warp::delete())
        .and(state_filter.clone())
        .map(|image_file: String, state: ApiState| delete_image(&state, &image_file));

    let config = warp::path!("api" / "config")
        .and(warp::get())
        .and(state_filter)
        .map(|state: ApiState| {
            reply::with_status(reply::json(&state.config.to_document()), StatusCode::OK)
        });

    detections
        .or(violations)
        .unify()
        .or(delete)
        .unify()
        .or(config)
        .unify()
}

/// Serves the routes until the process is stopped.
pub async fn serve(state: ApiState, addr: SocketAddr) {
    info!("speed-camera backend listening on http://{}", addr);
    warp::serve(routes(state)).run(addr).await;
}

fn list_detections(state: &ApiState, query: DetectionQuery) -> WithStatus<Json> {
    let store = match state.store.read() {
        Ok(store) => store,
        Err(_) => return internal_error("detection store unavailable"),
    };
    let records = store.query(&query, Local::now().naive_local());
    debug!("serving {} detections for {:?}", records.len(), query);
    reply::with_status(reply::json(&records), StatusCode::OK)
}

fn delete_image(state: &ApiState, image_file: &str) -> WithStatus<Json> {
    let mut store = match state.store.write() {
        Ok(store) => store,
        Err(_) => return internal_error("detection store unavailable"),
    };
    if store.remove_image(image_file) {
        info!("deleted {}", image_file);
        reply::with_status(reply::json(&DeleteReply::deleted(image_file)), StatusCode::OK)
    } else {
        warn!("delete requested for missing file {}", image_file);
        reply::with_status(
            reply::json(&ErrorReply::new("File not found")),
            StatusCode::NOT_FOUND,
        )
    }
}

fn internal_error(message: &str) -> WithStatus<Json> {
    reply::with_status(
        reply::json(&ErrorReply::new(message)),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}
