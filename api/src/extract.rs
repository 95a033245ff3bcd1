use axum::{
    extract::{
        FromRequestParts,
        rejection::{PathRejection, QueryRejection},
    },
    http::{StatusCode, request::Parts},
};

use crate::error::{ApiRequestError, AppError};

#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct InvalidRequest(String);

impl ApiRequestError for InvalidRequest {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn code(&self) -> &'static str {
        "VALIDATION_ERR"
    }
}

// Same as `axum::extract::Path` but rejects with an `AppError`
pub struct Path<T>(pub T);

impl<S, T> FromRequestParts<S> for Path<T>
where
    axum::extract::Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppError::from_request_error(InvalidRequest(
                rejection.body_text(),
            ))),
        }
    }
}

// Same as `axum::extract::Query` but rejects with an `AppError`
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    axum::extract::Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppError::from_request_error(InvalidRequest(
                rejection.body_text(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize, Debug)]
    struct Paging {
        page: u32,
    }

    fn parts(uri: &str) -> Parts {
        Request::builder()
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn bad_query_is_a_validation_error() {
        let mut parts = parts("/articles?page=first");

        let Err(err) = Query::<Paging>::from_request_parts(&mut parts, &()).await else {
            panic!("invalid query was accepted");
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn good_query_is_extracted() {
        let mut parts = parts("/articles?page=3");

        let Ok(Query(paging)) = Query::<Paging>::from_request_parts(&mut parts, &()).await else {
            panic!("valid query was rejected");
        };
        assert_eq!(paging.page, 3);
    }

    #[tokio::test]
    async fn path_outside_a_router_is_a_validation_error() {
        let mut parts = parts("/articles/1");

        let Err(err) = Path::<i32>::from_request_parts(&mut parts, &()).await else {
            panic!("path params were found without a matched route");
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
