use axum::http::{StatusCode, request::Parts};

use crate::{
    App,
    error::{ApiRequestError, AppError},
};

use self::models::identity::Identity;

pub mod models;

pub const COOKIE_NAME: &str = "auth_token";

#[derive(thiserror::Error, Debug)]
pub enum AuthenticationError {
    #[error("Authentication required, but no cookie `{COOKIE_NAME}` found in headers.")]
    NoCookie,

    #[error(
        "Unauthorized, please check if you're logged in by refreshing the \
         page. This could be due to an expired session or token has became invalid."
    )]
    Unauthorized,
}

impl ApiRequestError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn code(&self) -> &'static str {
        match self {
            AuthenticationError::NoCookie => "NO_SESSION",
            AuthenticationError::Unauthorized => "UNAUTHORIZED",
        }
    }
}

impl From<AuthenticationError> for AppError {
    fn from(e: AuthenticationError) -> Self {
        AppError::from_request_error(e)
    }
}

/// Who is looking at a page. Decides which comments are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    Member,
    Staff,
}

impl Viewer {
    pub fn of(identity: Option<&Identity>) -> Self {
        match identity {
            Some(i) if i.is_staff => Viewer::Staff,
            Some(_) => Viewer::Member,
            None => Viewer::Anonymous,
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Viewer::Staff)
    }
}

pub struct MaybeAuthUser(pub Result<Identity, AuthenticationError>);

impl MaybeAuthUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::of(self.0.as_ref().ok())
    }
}

impl axum::extract::FromRequestParts<App> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
        let jar = axum_extra::extract::cookie::CookieJar::from_headers(&parts.headers);

        let session_token: &str = if let Some(t) = jar.get(COOKIE_NAME) {
            t.value()
        } else {
            return Ok(MaybeAuthUser(Err(AuthenticationError::NoCookie)));
        };

        let identity = state.store.find_identity_by_session(session_token).await?;

        if identity.is_none() {
            tracing::debug!("Session cookie did not match an active session");
        }

        Ok(MaybeAuthUser(
            identity.ok_or(AuthenticationError::Unauthorized),
        ))
    }
}

pub struct AuthUser(pub Identity);

impl axum::extract::FromRequestParts<App> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
        let MaybeAuthUser(auth_user) = MaybeAuthUser::from_request_parts(parts, state).await?;

        Ok(AuthUser(auth_user?))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::FromRequestParts, http::Request};

    use super::*;
    use crate::{
        config::ServerConfig,
        identity::models::identity::Traits,
        store::memory::MemoryStore,
    };

    async fn app_with_session(is_staff: bool) -> (App, String) {
        let store = MemoryStore::new();
        let identity = store
            .add_identity(
                Traits {
                    email: None,
                    name: Some("Reader".into()),
                },
                is_staff,
            )
            .await;
        let session = store.issue_session(identity.id).await;
        let app = App::new(Arc::new(store), ServerConfig::default());
        (app, session.token)
    }

    fn parts_with_cookie(cookie: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/comments/add/1");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn missing_cookie_is_anonymous() {
        let (app, _) = app_with_session(false).await;
        let mut parts = parts_with_cookie(None);

        let user = MaybeAuthUser::from_request_parts(&mut parts, &app)
            .await
            .unwrap();
        assert!(matches!(user.0, Err(AuthenticationError::NoCookie)));
        assert_eq!(user.viewer(), Viewer::Anonymous);

        let Err(err) = AuthUser::from_request_parts(&mut parts, &app).await else {
            panic!("anonymous request was authenticated");
        };
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let (app, _) = app_with_session(false).await;
        let mut parts = parts_with_cookie(Some("auth_token=nws_forged"));

        let Err(err) = AuthUser::from_request_parts(&mut parts, &app).await else {
            panic!("forged token was accepted");
        };
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_session_resolves_the_viewer() {
        let (app, token) = app_with_session(true).await;
        let cookie = format!("theme=dark; {COOKIE_NAME}={token}");
        let mut parts = parts_with_cookie(Some(&cookie));

        let user = MaybeAuthUser::from_request_parts(&mut parts, &app)
            .await
            .unwrap();
        assert_eq!(user.viewer(), Viewer::Staff);

        let AuthUser(identity) = AuthUser::from_request_parts(&mut parts, &app)
            .await
            .unwrap();
        assert_eq!(identity.display_name(), "Reader");
    }
}
