use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use log::{error, info};
use warp::{Filter, Rejection, Reply};

use super::routes::*;
use crate::controller::Controller;
use crate::error_handling::types::WebError;

/// Web server for the HTTP API and dashboard
pub struct WebServer {
    controller: Arc<Controller>,
}

impl WebServer {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self { controller }
    }

    /// All routes of the API.
    pub fn routes(&self) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
        let c = &self.controller;
        dashboard_route()
            .or(status_route(c.clone()))
            .or(timeline_route(c.clone()))
            .or(list_artifacts_route(c.clone()))
            .or(description_route(c.clone()))
            .or(artifact_image_route(c.clone()))
            .or(delete_artifact_route(c.clone()))
            .or(search_route(c.clone()))
            .or(start_route(c.clone()))
            .or(stop_route(c.clone()))
            .or(capacity_route(c.clone()))
            .with(warp::log("recall::web"))
    }

    /// Address from the `[web]` section of the configuration.
    pub fn address(&self) -> Result<SocketAddr, WebError> {
        let web = &self.controller.config().web;
        let ip: IpAddr = web.bind_address.parse().map_err(|e| {
            error!("Invalid bind address {}: {}", web.bind_address, e);
            WebError::BindFailed(format!("{}: {}", web.bind_address, e))
        })?;
        Ok(SocketAddr::new(ip, web.port))
    }

    /// Serves until the process ends.
    pub async fn start(&self) -> Result<(), WebError> {
        let addr = self.address()?;
        info!("Web interface listening on http://{}", addr);
        warp::serve(self.routes()).run(addr).await;
        Ok(())
    }
}
