//! # Metrics module
//!
//! This module expose the prometheus registry of the operator

use hyper::{
    header::{self, HeaderValue, InvalidHeaderValue},
    Body, Request, Response, StatusCode,
};
use prometheus::{gather, Encoder, TextEncoder};

// -----------------------------------------------------------------------------
// Error enum

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to encode metrics, {0}")]
    Encode(prometheus::Error),
    #[error("failed to parse header value given by prometheus, {0}")]
    InvalidHeader(InvalidHeaderValue),
}

// -----------------------------------------------------------------------------
// Helper methods

/// returns the metrics gathered from the default registry encoded using the
/// prometheus text format
pub async fn handler(_req: &Request<Body>) -> Result<Response<Body>, Error> {
    let encoder = TextEncoder::new();
    let mut buf = vec![];

    encoder.encode(&gather(), &mut buf).map_err(Error::Encode)?;

    let mut res = Response::default();
    let headers = res.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(encoder.format_type()).map_err(Error::InvalidHeader)?,
    );

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(buf.len()));

    *res.status_mut() = StatusCode::OK;
    *res.body_mut() = Body::from(buf);

    Ok(res)
}
