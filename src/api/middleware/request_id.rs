use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags every request and its response with an id, keeping a client-supplied one if valid
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let header = HeaderName::from_static(REQUEST_ID_HEADER);
    let request_id = req
        .headers()
        .get(&header)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| {
            // A v4 uuid is always a valid header value
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
        });

    req.headers_mut().insert(header.clone(), request_id.clone());

    let mut response = next.run(req).await;
    response.headers_mut().insert(header, request_id);

    response
}
