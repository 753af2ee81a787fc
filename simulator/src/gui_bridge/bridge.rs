use crate::gui_bridge::model::VisualizationModel;
use drivecore::prelude::PipelineError;
use drivecore::signal::{GyroSample, SpeedSample};
use drivecore::PipelineHandle;
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

pub fn gui_bind_address(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

#[derive(Debug)]
struct PipelineClosed;

impl warp::reject::Reject for PipelineClosed {}

#[derive(Debug, Deserialize)]
struct Annotation {
    text: String,
}

fn with_handle(
    handle: PipelineHandle,
) -> impl Filter<Extract = (PipelineHandle,), Error = Infallible> + Clone {
    warp::any().map(move || handle.clone())
}

fn status_reply(result: Result<(), PipelineError>) -> Result<WithStatus<Json>, Rejection> {
    match result {
        Ok(()) => Ok(warp::reply::with_status(
            warp::reply::json(&json!({"status": "ok"})),
            StatusCode::OK,
        )),
        Err(PipelineError::Recording(err)) => Ok(warp::reply::with_status(
            warp::reply::json(&json!({"status": "error", "message": err.to_string()})),
            StatusCode::CONFLICT,
        )),
        Err(PipelineError::Closed) => {
            error!("bridge request after pipeline shutdown");
            Err(warp::reject::custom(PipelineClosed))
        }
    }
}

/// HTTP surface of the presentation sink:
///
/// - `GET /snapshot` raw pipeline snapshot
/// - `GET /display` formatted [`VisualizationModel`]
/// - `POST /ingest/location`, `POST /ingest/gyro` external sample sources
/// - `POST /annotate` arms the one-shot annotation
/// - `POST /recording/start`, `POST /recording/stop`
pub fn routes(
    handle: PipelineHandle,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let snapshot = warp::path("snapshot")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_handle(handle.clone()))
        .map(|handle: PipelineHandle| warp::reply::json(&handle.snapshot()));

    let display = warp::path("display")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_handle(handle.clone()))
        .map(|handle: PipelineHandle| {
            warp::reply::json(&VisualizationModel::from(&handle.snapshot()))
        });

    let location = warp::path!("ingest" / "location")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_handle(handle.clone()))
        .and_then(|sample: SpeedSample, handle: PipelineHandle| async move {
            status_reply(handle.location(sample).await)
        });

    let gyro = warp::path!("ingest" / "gyro")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_handle(handle.clone()))
        .and_then(|sample: GyroSample, handle: PipelineHandle| async move {
            status_reply(handle.gyro(sample).await)
        });

    let annotate = warp::path("annotate")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_handle(handle.clone()))
        .and_then(|annotation: Annotation, handle: PipelineHandle| async move {
            status_reply(handle.annotate(annotation.text).await)
        });

    let start = warp::path!("recording" / "start")
        .and(warp::post())
        .and(with_handle(handle.clone()))
        .and_then(|handle: PipelineHandle| async move {
            status_reply(handle.start_recording().await)
        });

    let stop = warp::path!("recording" / "stop")
        .and(warp::post())
        .and(with_handle(handle))
        .and_then(|handle: PipelineHandle| async move {
            status_reply(handle.stop_recording().await)
        });

    snapshot
        .or(display)
        .or(location)
        .or(gyro)
        .or(annotate)
        .or(start)
        .or(stop)
}

/// Serves the bridge until the surrounding task is cancelled.
pub async fn serve(handle: PipelineHandle, address: SocketAddr) {
    info!("presentation bridge listening on http://{}", address);
    warp::serve(routes(handle)).run(address).await;
}
