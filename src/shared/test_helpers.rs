use axum::{extract::Request, middleware::Next, Router};

use crate::features::auth::CurrentUser;

/// Wraps `router` so every request runs as the guest user `user_id`
pub fn with_user(router: Router, user_id: i64) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| async move {
            request.extensions_mut().insert(CurrentUser::guest(user_id));
            next.run(request).await
        },
    ))
}
