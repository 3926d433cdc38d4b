use log::{error, warn};
use std::convert::Infallible;
use std::sync::Arc;
use warp::{http::StatusCode, reply, reply::Response, Filter, Rejection, Reply};

use super::types::*;
use crate::controller::Controller;
use crate::error_handling::types::{ControlError, ControllerError, StorageError};
use crate::storage::types::ArtifactId;

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Recall</title></head>
<body>
<h1>Recall</h1>
<p id="status">Loading...</p>
<button onclick="control('start')">Start</button>
<button onclick="control('stop')">Stop</button>
<form onsubmit="search(event)"><input id="q" placeholder="Search descriptions (empty shows nothing)"><button>Search</button></form>
<ul id="items"></ul>
<script>
async function refresh() {
  const s = await (await fetch('/status')).json();
  document.getElementById('status').textContent =
    (s.running ? 'Capturing' : 'Stopped') + ', ' + s.count + ' of ' + s.capacity + ' snapshots kept';
}
function show(items) {
  const ul = document.getElementById('items');
  ul.innerHTML = '';
  if (items.length === 0) { ul.innerHTML = '<li>No snapshots yet</li>'; return; }
  for (const a of items) {
    const li = document.createElement('li');
    li.innerHTML = '<a href="' + a.url + '">' + a.captured_at + '</a>';
    ul.appendChild(li);
  }
}
async function search(e) {
  e.preventDefault();
  const q = document.getElementById('q').value;
  show((await (await fetch('/search?q=' + encodeURIComponent(q))).json()).results);
}
async function control(action) {
  await fetch('/control/' + action, { method: 'POST' });
  refresh();
}
refresh();
fetch('/artifacts').then(r => r.json()).then(show);
</script>
</body></html>"#;

fn with_controller(
    controller: Arc<Controller>,
) -> impl Filter<Extract = (Arc<Controller>,), Error = Infallible> + Clone {
    warp::any().map(move || controller.clone())
}

fn json_error(message: impl Into<String>, status: StatusCode) -> Response {
    reply::with_status(
        reply::json(&ApiError {
            message: message.into(),
        }),
        status,
    )
    .into_response()
}

fn error_response(err: ControllerError) -> Response {
    match err {
        ControllerError::StorageError(StorageError::NotFound(id)) => {
            json_error(format!("Artifact {} not found", id), StatusCode::NOT_FOUND)
        }
        ControllerError::StorageError(StorageError::InvalidIdentifier(id)) => {
            json_error(format!("Invalid artifact id {}", id), StatusCode::BAD_REQUEST)
        }
        ControllerError::ControlError(e @ ControlError::InvalidCapacity { .. }) => {
            json_error(e.to_string(), StatusCode::BAD_REQUEST)
        }
        other => {
            error!("Request failed: {}", other);
            json_error(other.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn parse_id(raw: &str) -> Result<ArtifactId, Response> {
    ArtifactId::parse(raw).map_err(|_| json_error("Invalid artifact id", StatusCode::BAD_REQUEST))
}

fn control_reply(controller: &Controller, changed: Result<bool, ControllerError>) -> Response {
    let changed = match changed {
        Ok(changed) => changed,
        Err(e) => return error_response(e),
    };
    match controller.status() {
        Ok(status) => reply::json(&ControlResponse { changed, status }).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /
pub fn dashboard_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path::end()
        .and(warp::get())
        .map(|| reply::html(DASHBOARD_HTML))
}

/// GET /status
pub fn status_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("status")
        .and(warp::get())
        .and(with_controller(controller))
        .and_then(|controller: Arc<Controller>| async move {
            let res = match controller.status() {
                Ok(status) => reply::json(&status).into_response(),
                Err(e) => error_response(e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// GET /timeline
///
/// Unreadable stores are reported as an empty timeline.
pub fn timeline_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("timeline")
        .and(warp::get())
        .and(with_controller(controller))
        .and_then(|controller: Arc<Controller>| async move {
            let entries = controller.timeline().unwrap_or_else(|e| {
                warn!("Timeline unavailable: {}", e);
                Vec::new()
            });
            Ok::<_, Rejection>(reply::json(&entries))
        })
}

/// GET /artifacts
pub fn list_artifacts_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("artifacts")
        .and(warp::get())
        .and(with_controller(controller))
        .and_then(|controller: Arc<Controller>| async move {
            let ids = controller.list_artifacts().unwrap_or_else(|e| {
                warn!("Artifact listing unavailable: {}", e);
                Vec::new()
            });
            let list: Vec<ArtifactResponse> = ids.into_iter().map(ArtifactResponse::from).collect();
            Ok::<_, Rejection>(reply::json(&list))
        })
}

/// GET /artifacts/:id
pub fn artifact_image_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("artifacts" / String)
        .and(warp::get())
        .and(with_controller(controller))
        .and_then(|raw: String, controller: Arc<Controller>| async move {
            let id = match parse_id(&raw) {
                Ok(id) => id,
                Err(res) => return Ok::<_, Rejection>(res),
            };
            let res = match controller.artifact_image(&id) {
                Ok(image) => {
                    let mime = mime_guess::from_path(&image.path).first_or_octet_stream();
                    reply::with_header(image.bytes, "Content-Type", mime.to_string()).into_response()
                }
                Err(e) => error_response(e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// GET /artifacts/:id/description
pub fn description_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("artifacts" / String / "description")
        .and(warp::get())
        .and(with_controller(controller))
        .and_then(|raw: String, controller: Arc<Controller>| async move {
            let id = match parse_id(&raw) {
                Ok(id) => id,
                Err(res) => return Ok::<_, Rejection>(res),
            };
            let res = match controller.get_description(&id) {
                Ok(Some(description)) => {
                    reply::json(&DescriptionResponse { id, description }).into_response()
                }
                Ok(None) => json_error(
                    format!("No description for {}", id),
                    StatusCode::NOT_FOUND,
                ),
                Err(e) => error_response(e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// DELETE /artifacts/:id
pub fn delete_artifact_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("artifacts" / String)
        .and(warp::delete())
        .and(with_controller(controller))
        .and_then(|raw: String, controller: Arc<Controller>| async move {
            let id = match parse_id(&raw) {
                Ok(id) => id,
                Err(res) => return Ok::<_, Rejection>(res),
            };
            let res = match controller.delete_artifact(&id).await {
                Ok(true) => reply::json(&DeleteResponse { id, deleted: true }).into_response(),
                Ok(false) => json_error(format!("Artifact {} not found", id), StatusCode::NOT_FOUND),
                Err(e) => error_response(e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// GET /search?q=...&case_sensitive=...
///
/// An empty `q` yields no results. Unreadable stores are reported as no results.
pub fn search_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("search")
        .and(warp::get())
        .and(warp::query::<SearchQuery>())
        .and(with_controller(controller))
        .and_then(|query: SearchQuery, controller: Arc<Controller>| async move {
            let ids = controller
                .search(&query.q, !query.case_sensitive)
                .unwrap_or_else(|e| {
                    warn!("Search unavailable: {}", e);
                    Vec::new()
                });
            Ok::<_, Rejection>(reply::json(&SearchResponse {
                query: query.q,
                results: ids.into_iter().map(ArtifactResponse::from).collect(),
            }))
        })
}

/// POST /control/start
pub fn start_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("control" / "start")
        .and(warp::post())
        .and(with_controller(controller))
        .and_then(|controller: Arc<Controller>| async move {
            let started = controller.start();
            Ok::<_, Rejection>(control_reply(&controller, started))
        })
}

/// POST /control/stop
pub fn stop_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("control" / "stop")
        .and(warp::post())
        .and(with_controller(controller))
        .and_then(|controller: Arc<Controller>| async move {
            let stopped = controller.stop();
            Ok::<_, Rejection>(control_reply(&controller, stopped))
        })
}

/// PUT /control/capacity with `{"capacity": n}`
pub fn capacity_route(
    controller: Arc<Controller>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("control" / "capacity")
        .and(warp::put())
        .and(warp::body::content_length_limit(1024))
        .and(warp::body::json::<CapacityRequest>())
        .and(with_controller(controller))
        .and_then(|body: CapacityRequest, controller: Arc<Controller>| async move {
            let previous = controller.status().ok().map(|s| s.capacity);
            let changed = controller
                .set_capacity(body.capacity)
                .map(|state| previous != Some(state.capacity));
            Ok::<_, Rejection>(control_reply(&controller, changed))
        })
}
