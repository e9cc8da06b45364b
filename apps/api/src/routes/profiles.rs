//! # Profile Routes
//!
//! Everything here acts on the caller's own account (see [`CurrentUser`]).
//!
//! ```text
//! GET  /profile          { success, user }
//! PUT  /profile          multipart: name, bio, location, mobile, file "profileImage"
//! GET  /notifications    { success, notifications: [] }
//! GET  /settings         { success, emailNotifications, publicProfile, showLocation }
//! PUT  /settings         partial boolean update, same shape
//! ```

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use harvest_core::validation::FormFields;
use harvest_core::{Account, AccountSettings, CoreError, ProfileUpdate, SettingsUpdate, IMAGE_PATH};

use super::images;
use crate::error::{ApiResult, ResultExt};
use crate::identity::CurrentUser;
use crate::multipart::UploadForm;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/notifications", get(notifications))
        .route("/settings", get(get_settings).put(update_settings))
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub success: bool,
    pub user: Account,
}

#[derive(Debug, Serialize)]
pub struct Notifications {
    pub success: bool,
    pub notifications: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct Settings {
    pub success: bool,
    #[serde(flatten)]
    pub settings: AccountSettings,
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<Profile>> {
    let account = state
        .accounts
        .accounts()
        .get(user.uid())
        .await
        .on_failure("Server error")?
        .ok_or_else(|| CoreError::AccountNotFound(user.uid().to_string()))?;

    Ok(Json(Profile {
        success: true,
        user: account,
    }))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    multipart: Multipart,
) -> ApiResult<Json<Profile>> {
    let form = UploadForm::read(multipart, "profileImage", state.config.max_upload_bytes).await?;

    let accounts = state.accounts.accounts();
    let current = accounts
        .get(user.uid())
        .await
        .on_failure("Server error")?
        .ok_or_else(|| CoreError::AccountNotFound(user.uid().to_string()))?;

    let mut update = profile_update(&form.fields);
    let mut stored = None;
    if let Some(upload) = &form.file {
        let filename = images::store(&state, upload).await?;
        update.profile_image = Some(format!("{IMAGE_PATH}/{filename}"));
        stored = Some(filename);
    }
    let replaced_image = update
        .profile_image
        .as_ref()
        .and(current.profile_image.as_deref())
        .and_then(|url| url.strip_prefix(IMAGE_PATH))
        .map(|name| name.trim_start_matches('/').to_string());

    let account = match accounts.update_profile(user.uid(), update).await {
        Ok(account) => account,
        Err(e) => {
            if let Some(filename) = &stored {
                images::discard(&state, filename).await;
            }
            return Err(e).on_failure("Server error");
        }
    };

    if let Some(old) = replaced_image {
        images::discard(&state, &old).await;
    }

    info!(uid = %account.uid, "Profile updated");

    Ok(Json(Profile {
        success: true,
        user: account,
    }))
}

fn profile_update(fields: &FormFields) -> ProfileUpdate {
    let field = |key: &str| fields.get(key).cloned();
    ProfileUpdate {
        name: field("name"),
        bio: field("bio"),
        location: field("location"),
        mobile: field("mobile"),
        profile_image: None,
    }
}

async fn notifications(_user: CurrentUser) -> Json<Notifications> {
    Json(Notifications {
        success: true,
        notifications: Vec::new(),
    })
}

async fn get_settings(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<Settings>> {
    let settings = state
        .accounts
        .accounts()
        .get(user.uid())
        .await
        .on_failure("Server error")?
        .map(|account| account.settings)
        .ok_or_else(|| CoreError::AccountNotFound(user.uid().to_string()))?;

    Ok(Json(Settings {
        success: true,
        settings,
    }))
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    payload: Result<Json<SettingsUpdate>, JsonRejection>,
) -> ApiResult<Json<Settings>> {
    let Json(update) = payload?;

    let settings = state
        .accounts
        .accounts()
        .update_settings(user.uid(), update)
        .await
        .on_failure("Server error")?;

    info!(uid = %user.uid(), "Settings updated");

    Ok(Json(Settings {
        success: true,
        settings,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::Utc;
    use serde_json::json;

    use harvest_core::{Account, AccountRole, AccountSettings};

    use crate::identity::USER_ID_HEADER;
    use crate::routes::testing::{self, MultipartBody, TestApp};

    async fn app_with_user(uid: &str) -> TestApp {
        let app = testing::app().await;
        let now = Utc::now();
        app.state
            .accounts
            .accounts()
            .insert(&Account {
                uid: uid.to_string(),
                name: "Meena Sawant".to_string(),
                email: format!("{uid}@example.com"),
                role: AccountRole::Farmer,
                mobile: None,
                bio: None,
                location: Some("Ratnagiri".to_string()),
                profile_image: None,
                settings: AccountSettings::default(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        app
    }

    fn as_user(uid: &str, request: Request<Body>) -> Request<Body> {
        let (mut parts, body) = request.into_parts();
        parts.headers.insert(USER_ID_HEADER, uid.parse().unwrap());
        Request::from_parts(parts, body)
    }

    #[tokio::test]
    async fn test_missing_identity_is_401() {
        let app = testing::app().await;
        for uri in ["/api/users/profile", "/api/users/settings", "/api/users/notifications"] {
            let (status, body) = app.get(uri).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["success"], false);
        }
    }

    #[tokio::test]
    async fn test_get_profile() {
        let app = app_with_user("u1").await;

        let request = as_user("u1", Request::get("/api/users/profile").body(Body::empty()).unwrap());
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["name"], "Meena Sawant");

        let request = as_user("ghost", Request::get("/api/users/profile").body(Body::empty()).unwrap());
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");
    }

    #[tokio::test]
    async fn test_update_profile_skips_blank_fields_and_stores_image() {
        let app = app_with_user("u1").await;

        let request = MultipartBody::new()
            .text("name", "")
            .text("bio", "Alphonso mangoes since 1982")
            .file("profileImage", "me.jpg", "image/jpeg", &[0xff, 0xd8, 0xff])
            .request("PUT", "/api/users/profile");
        let (status, body) = app.send(as_user("u1", request)).await;

        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["user"]["name"], "Meena Sawant");
        assert_eq!(body["user"]["bio"], "Alphonso mangoes since 1982");
        assert_eq!(body["user"]["location"], "Ratnagiri");

        let image_url = body["user"]["profile_image"].as_str().unwrap().to_string();
        assert!(image_url.starts_with("/api/images/"));
        let (status, _) = app.get(&image_url).await;
        assert_eq!(status, StatusCode::OK);

        // a second upload replaces the first blob
        let request = MultipartBody::new()
            .file("profileImage", "me2.jpg", "image/jpeg", &[0xff, 0xd8, 0xff, 0xe0])
            .request("PUT", "/api/users/profile");
        let (status, _) = app.send(as_user("u1", request)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.get(&image_url).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_failed_profile_update_discards_the_new_image() {
        let app = app_with_user("u1").await;
        testing::reject_updates(app.state.accounts.pool(), "users").await;

        let request = MultipartBody::new()
            .text("bio", "Cashew grower")
            .file("profileImage", "me.jpg", "image/jpeg", &[0xff, 0xd8, 0xff])
            .request("PUT", "/api/users/profile");
        let (status, body) = app.send(as_user("u1", request)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Server error");
        assert_eq!(app.state.documents.images().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_notifications_are_empty() {
        let app = app_with_user("u1").await;
        let request = as_user(
            "u1",
            Request::get("/api/users/notifications").body(Body::empty()).unwrap(),
        );
        let (status, body) = app.send(request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notifications"], json!([]));
    }

    #[tokio::test]
    async fn test_settings_default_false_and_partial_update() {
        let app = app_with_user("u1").await;

        let request = as_user("u1", Request::get("/api/users/settings").body(Body::empty()).unwrap());
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["emailNotifications"], false);
        assert_eq!(body["publicProfile"], false);
        assert_eq!(body["showLocation"], false);

        let request = Request::put("/api/users/settings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "showLocation": true }).to_string()))
            .unwrap();
        let (status, body) = app.send(as_user("u1", request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["showLocation"], true);
        assert_eq!(body["emailNotifications"], false);

        let request = Request::put("/api/users/settings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, _) = app.send(as_user("ghost", request)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
