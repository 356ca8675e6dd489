//! Route guards.
//!
//! Views call a guard before mounting. A failed guard carries the route to
//! redirect to (see [`ClientError::redirect`]).

use shopease_core::{CurrentUser, OrderId, ProductId};

use crate::error::ClientError;
use crate::session::Session;

/// Navigable views.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Products,
    ProductDetail(ProductId),
    Cart,
    Checkout,
    Orders,
    OrderDetail(OrderId),
    AdminDashboard,
    AdminOrders,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Home => write!(f, "/"),
            Self::Login => write!(f, "/login"),
            Self::Products => write!(f, "/products"),
            Self::ProductDetail(id) => write!(f, "/products/{id}"),
            Self::Cart => write!(f, "/cart"),
            Self::Checkout => write!(f, "/checkout"),
            Self::Orders => write!(f, "/orders"),
            Self::OrderDetail(id) => write!(f, "/orders/{id}"),
            Self::AdminDashboard => write!(f, "/admin"),
            Self::AdminOrders => write!(f, "/admin/orders"),
        }
    }
}

/// Require a signed-in session.
///
/// # Errors
///
/// Returns `ClientError::NotAuthenticated` if there is no token.
pub async fn require_auth(session: &Session) -> Result<(), ClientError> {
    if session.is_authenticated().await {
        Ok(())
    } else {
        Err(ClientError::NotAuthenticated)
    }
}

/// Require a signed-in administrator.
///
/// The profile must already be loaded into the session (login or a
/// current-user fetch after restore).
///
/// # Errors
///
/// Returns `ClientError::NotAuthenticated` without a session, and
/// `ClientError::Forbidden` if the user is not an administrator.
pub async fn require_admin(session: &Session) -> Result<CurrentUser, ClientError> {
    require_auth(session).await?;

    match session.user().await {
        Some(user) if user.is_admin() => Ok(user),
        _ => Err(ClientError::Forbidden),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use shopease_core::{UserId, UserRole};

    use super::*;

    fn user(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_guards_without_session() {
        let session = Session::in_memory();

        assert!(matches!(
            require_auth(&session).await,
            Err(ClientError::NotAuthenticated)
        ));
        assert!(matches!(
            require_admin(&session).await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_admin_guard_checks_role() {
        let session = Session::in_memory();
        session
            .begin(SecretString::from("tok"), user(UserRole::User))
            .await
            .unwrap();

        assert!(require_auth(&session).await.is_ok());
        assert!(matches!(
            require_admin(&session).await,
            Err(ClientError::Forbidden)
        ));

        session.set_user(user(UserRole::Admin)).await;
        assert!(require_admin(&session).await.is_ok());
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::OrderDetail(OrderId::new("o1")).to_string(), "/orders/o1");
        assert_eq!(Route::Login.to_string(), "/login");
    }
}
