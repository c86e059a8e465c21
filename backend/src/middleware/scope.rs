//! Company scope middleware
//!
//! Authentication and session handling live outside this service; the
//! calling layer forwards the resolved company scope in the
//! `x-company-id` header. Every engine operation is scoped to a company,
//! and a document or material outside the caller's scope reads as not
//! found.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{ErrorDetail, ErrorResponse};

const COMPANY_HEADER: &str = "x-company-id";

/// Resolved request scope
#[derive(Clone, Debug)]
pub struct ScopeContext {
    pub company_id: uuid::Uuid,
}

/// Middleware that resolves the company scope from the request headers
pub async fn scope_middleware(mut request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(COMPANY_HEADER)
        .and_then(|h| h.to_str().ok());

    let company_id = match header.and_then(|v| uuid::Uuid::parse_str(v).ok()) {
        Some(id) => id,
        None => return missing_scope_response(),
    };

    request.extensions_mut().insert(ScopeContext { company_id });

    next.run(request).await
}

fn missing_scope_response() -> Response {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: "MISSING_SCOPE".to_string(),
            message_en: "Missing or invalid x-company-id header".to_string(),
            message_id: "Header x-company-id tidak ada atau tidak valid".to_string(),
            field: Some(COMPANY_HEADER.to_string()),
        },
    };

    (StatusCode::BAD_REQUEST, Json(error)).into_response()
}

/// Extractor for the resolved company scope.
/// Use this in handlers running behind `scope_middleware`.
#[derive(Clone, Debug)]
pub struct CompanyScope(pub ScopeContext);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CompanyScope
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ScopeContext>()
            .cloned()
            .map(CompanyScope)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail {
                        code: "MISSING_SCOPE".to_string(),
                        message_en: "Company scope not resolved".to_string(),
                        message_id: "Lingkup perusahaan belum ditentukan".to_string(),
                        field: None,
                    },
                };
                (StatusCode::BAD_REQUEST, Json(error))
            })
    }
}
