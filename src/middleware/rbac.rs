// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::{ApiError, AppError},
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::UserRole,
};

/// Papel exigido por uma rota.
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> UserRole;
}

/// Guardião: só passa se o usuário autenticado tiver o papel `T`.
/// Depende do `auth_guard` ter rodado antes.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if user.0.role != T::role() {
            tracing::warn!("Acesso negado para {}: exige {:?}", user.0.email, T::role());
            return Err(AppError::Forbidden.to_api_error(&locale));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// PAPÉIS
// ---

pub struct AdminOnly;
impl RoleDef for AdminOnly {
    fn role() -> UserRole { UserRole::Admin }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::auth::User;

    fn parts_with(role: Option<UserRole>) -> Parts {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        if let Some(role) = role {
            parts.extensions.insert(AuthenticatedUser(User {
                id: Uuid::new_v4(),
                email: "staff@example.com".into(),
                name: "Staff".into(),
                password_hash: String::new(),
                role,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }));
        }
        parts
    }

    #[tokio::test]
    async fn admin_passes() {
        let mut parts = parts_with(Some(UserRole::Admin));
        assert!(RequireRole::<AdminOnly>::from_request_parts(&mut parts, &()).await.is_ok());
    }

    #[tokio::test]
    async fn guide_is_forbidden() {
        let mut parts = parts_with(Some(UserRole::Guide));
        let err = RequireRole::<AdminOnly>::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn anonymous_is_unauthorized() {
        let mut parts = parts_with(None);
        let err = RequireRole::<AdminOnly>::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
