//! # Telemetry module
//!
//! This module expose telemetry measurements through a small http server,
//! its router and handlers

use std::{collections::BTreeMap, convert::Infallible, net::SocketAddr, time::Instant};

use hyper::{
    header::{self, HeaderValue},
    service::{make_service_fn, service_fn},
    Body, Method, Request, Response, Server, StatusCode,
};
#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use prometheus::{opts, register_counter_vec, CounterVec};
use tracing::info;

#[cfg(feature = "metrics")]
pub mod metrics;

// -----------------------------------------------------------------------------
// Telemetry

#[cfg(feature = "metrics")]
static SERVER_REQUEST: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        opts!(
            "kubernetes_operator_server_request",
            "number of request handled by the server",
        ),
        &["method", "path", "status"]
    )
    .expect("metrics 'kubernetes_operator_server_request' to not be already registered")
});

// -----------------------------------------------------------------------------
// Error enum

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[cfg(feature = "metrics")]
    #[error("{0}")]
    Metrics(metrics::Error),
    #[error("failed to serialize payload, {0}")]
    Serialize(serde_json::Error),
    #[error("failed to serve on socket '{0}', {1}")]
    Serve(SocketAddr, hyper::Error),
}

// -----------------------------------------------------------------------------
// Helper methods

/// listens on the given address until the server fails
pub async fn serve(addr: SocketAddr) -> Result<(), Error> {
    let service =
        make_service_fn(|_conn| async { Ok::<_, Infallible>(service_fn(router)) });

    info!(addr = addr.to_string(), "Begin to listen on address");
    Server::try_bind(&addr)
        .map_err(|err| Error::Serve(addr, err))?
        .serve(service)
        .await
        .map_err(|err| Error::Serve(addr, err))
}

pub async fn router(req: Request<Body>) -> Result<Response<Body>, Error> {
    let begin = Instant::now();

    let result = match (req.method(), req.uri().path()) {
        (&Method::GET, "/healthz") => healthz(&req).await,
        #[cfg(feature = "metrics")]
        (&Method::GET, "/metrics") => metrics::handler(&req).await.map_err(Error::Metrics),
        _ => not_found(&req).await,
    };

    let res = match result {
        Ok(res) => res,
        Err(err) => {
            let mut map = BTreeMap::new();
            map.insert("error".to_string(), err.to_string());

            let mut res = Response::default();
            res.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );

            *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            *res.body_mut() =
                Body::from(serde_json::to_string_pretty(&map).map_err(Error::Serialize)?);
            res
        }
    };

    info!(
        method = req.method().as_str(),
        path = req.uri().path(),
        status = res.status().as_u16(),
        duration = format!("{}us", begin.elapsed().as_micros()),
        "Receive request"
    );

    #[cfg(feature = "metrics")]
    SERVER_REQUEST
        .with_label_values(&[
            req.method().as_str(),
            route(req.uri().path()),
            &res.status().as_u16().to_string(),
        ])
        .inc();

    Ok(res)
}

/// returns the label of the requested path, paths not served are grouped
pub fn route(path: &str) -> &'static str {
    match path {
        "/healthz" => "/healthz",
        "/metrics" => "/metrics",
        _ => "unknown",
    }
}

pub async fn healthz(_req: &Request<Body>) -> Result<Response<Body>, Error> {
    let mut res = Response::default();

    *res.status_mut() = StatusCode::NO_CONTENT;

    Ok(res)
}

pub async fn not_found(_req: &Request<Body>) -> Result<Response<Body>, Error> {
    let mut res = Response::default();

    *res.status_mut() = StatusCode::NOT_FOUND;

    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, path: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("request to be built")
    }

    #[tokio::test]
    async fn healthz_answers_no_content() {
        let res = router(request(Method::GET, "/healthz"))
            .await
            .expect("router to answer");

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn unknown_path_answers_not_found() {
        let res = router(request(Method::POST, "/healthz"))
            .await
            .expect("router to answer");

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[cfg(feature = "metrics")]
    #[tokio::test]
    async fn metrics_are_exposed() {
        let res = router(request(Method::GET, "/metrics"))
            .await
            .expect("router to answer");

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(header::CONTENT_TYPE));
    }

    #[test]
    fn unserved_paths_share_a_label() {
        assert_eq!(route("/healthz"), "/healthz");
        assert_eq!(route("/metrics"), "/metrics");
        assert_eq!(route("/wp-admin/install.php"), "unknown");
        assert_eq!(route("/healthz/../etc/passwd"), "unknown");
    }

    #[cfg(feature = "metrics")]
    #[tokio::test]
    async fn unserved_path_does_not_create_a_series() {
        router(request(Method::GET, "/random-0f7c2e"))
            .await
            .expect("router to answer");

        let families = prometheus::gather();
        let paths: Vec<_> = families
            .iter()
            .filter(|family| family.get_name() == "kubernetes_operator_server_request")
            .flat_map(|family| family.get_metric())
            .flat_map(|metric| metric.get_label())
            .filter(|label| label.get_name() == "path")
            .map(|label| label.get_value().to_string())
            .collect();

        assert!(paths.iter().any(|path| path == "unknown"));
        assert!(!paths.iter().any(|path| path == "/random-0f7c2e"));
    }
}
