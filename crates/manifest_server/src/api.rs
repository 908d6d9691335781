//! API routes: app manifests, the software catalog, user config, and desktop
//! state persistence.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Path as UrlPath, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use desktop_app_contract::AppRules;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::paths::{default_desktop_state, default_user_config, read_json_or, ServerPaths};

/// Builds the API router over the server paths.
pub fn router(paths: Arc<ServerPaths>) -> Router {
    Router::new()
        .route("/api/software", get(list_software))
        .route("/api/apps", get(list_apps))
        .route("/api/apps/{appname}", get(list_app_scripts))
        .route("/api/user-config", get(user_config))
        .route("/api/install", post(install_app))
        .route("/api/save-state", post(save_state))
        .route("/api/load-state", get(load_state))
        .route("/download/software/{file}", get(download_software))
        .with_state(paths)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct SoftwareItem {
    file: String,
    name: String,
    version: String,
    size: String,
    sha: String,
    icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct AppListing {
    name: String,
    rules: AppRules,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstallRequest {
    app_id: String,
    added_to: Option<String>,
}

async fn list_software(State(paths): State<Arc<ServerPaths>>) -> Json<Vec<SoftwareItem>> {
    Json(scan_software(&paths.uploads_dir))
}

async fn list_apps(State(paths): State<Arc<ServerPaths>>) -> Json<Vec<AppListing>> {
    Json(scan_apps(&paths.apps_dir))
}

async fn list_app_scripts(
    State(paths): State<Arc<ServerPaths>>,
    UrlPath(appname): UrlPath<String>,
) -> Result<Json<Vec<String>>, (StatusCode, Json<Value>)> {
    if !is_safe_name(&appname) {
        return Err(not_found("App not found"));
    }
    let app_dir = paths.apps_dir.join(&appname);
    if !app_dir.is_dir() {
        return Err(not_found("App not found"));
    }

    let mut scripts: Vec<String> = fs::read_dir(&app_dir)
        .map(|entries| {
            entries
                .flatten()
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| name.ends_with(".js"))
                .collect()
        })
        .unwrap_or_default();
    scripts.sort();
    Ok(Json(scripts))
}

async fn user_config(State(paths): State<Arc<ServerPaths>>) -> Json<Value> {
    Json(read_json_or(&paths.user_config_file, default_user_config()))
}

async fn install_app(
    State(paths): State<Arc<ServerPaths>>,
    Json(request): Json<InstallRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut config = read_json_or(&paths.user_config_file, default_user_config());
    if !config
        .get("installedApps")
        .map_or(false, serde_json::Value::is_object)
    {
        config = default_user_config();
    }
    config["installedApps"][request.app_id.as_str()] = serde_json::json!({
        "installed": true,
        "addedTo": request.added_to,
        "asked": true,
    });

    write_json(&paths.user_config_file, &config)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn save_state(
    State(paths): State<Arc<ServerPaths>>,
    Json(snapshot): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    write_json(&paths.state_file, &snapshot)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn load_state(State(paths): State<Arc<ServerPaths>>) -> Json<Value> {
    Json(read_json_or(&paths.state_file, default_desktop_state()))
}

async fn download_software(
    State(paths): State<Arc<ServerPaths>>,
    UrlPath(file): UrlPath<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    if !is_safe_name(&file) {
        return Err(not_found("File not found"));
    }
    let path = paths.uploads_dir.join(&file);
    let bytes = fs::read(&path).map_err(|_| not_found("File not found"))?;
    Ok((
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file}\""),
        )],
        bytes,
    ))
}

/// Lists the uploads directory with sizes and SHA-256 digests.
fn scan_software(uploads_dir: &Path) -> Vec<SoftwareItem> {
    let Ok(entries) = fs::read_dir(uploads_dir) else {
        return Vec::new();
    };

    let mut items: Vec<SoftwareItem> = entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let path = entry.path();
            let file = entry.file_name().into_string().ok()?;
            let size = entry.metadata().ok()?.len();
            let sha = match fs::read(&path) {
                Ok(bytes) => sha256_hex(&bytes),
                Err(err) => {
                    warn!(file = %path.display(), %err, "skipping unreadable upload");
                    return None;
                }
            };
            Some(SoftwareItem {
                name: path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.clone()),
                file,
                version: "1.0.0".to_string(),
                size: format_size_mb(size),
                sha,
                icon: "⬇️".to_string(),
            })
        })
        .collect();
    items.sort_by(|a, b| a.file.cmp(&b.file));
    items
}

/// Lists community app directories, merging each `app.properties.json` over
/// the built-in default rules.
fn scan_apps(apps_dir: &Path) -> Vec<AppListing> {
    let Ok(entries) = fs::read_dir(apps_dir) else {
        return Vec::new();
    };

    let mut apps: Vec<AppListing> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let rules = load_app_rules(&entry.path().join("app.properties.json"));
            Some(AppListing { name, rules })
        })
        .collect();
    apps.sort_by(|a, b| a.name.cmp(&b.name));
    apps
}

/// Parses a manifest file; missing fields fill from defaults, and a missing
/// or malformed file yields the defaults outright.
fn load_app_rules(manifest: &Path) -> AppRules {
    let Ok(raw) = fs::read_to_string(manifest) else {
        return AppRules::default();
    };
    match serde_json::from_str(&raw) {
        Ok(rules) => rules,
        Err(err) => {
            warn!(file = %manifest.display(), %err, "malformed app manifest; using defaults");
            AppRules::default()
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn format_size_mb(bytes: u64) -> String {
    format!("{} MB", (bytes as f64 / (1024.0 * 1024.0)).round() as u64)
}

/// Accepts plain file/directory names only; anything that could traverse out
/// of the served directory is rejected.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && name != "."
        && name != ".."
}

fn not_found(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": message })),
    )
}

fn write_json(file: &Path, value: &Value) -> Result<(), (StatusCode, Json<Value>)> {
    let raw = serde_json::to_string_pretty(value).map_err(internal_error)?;
    fs::write(file, raw).map_err(internal_error)
}

fn internal_error(err: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    warn!(%err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn sha256_matches_the_reference_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sizes_round_to_whole_megabytes() {
        assert_eq!(format_size_mb(0), "0 MB");
        assert_eq!(format_size_mb(1024 * 1024), "1 MB");
        assert_eq!(format_size_mb(1024 * 1024 * 3 / 2), "2 MB");
    }

    #[test]
    fn traversal_names_are_rejected() {
        assert!(is_safe_name("FrutigerAeroOS.exe"));
        assert!(!is_safe_name("../secrets"));
        assert!(!is_safe_name("a/b"));
        assert!(!is_safe_name("a\\b"));
        assert!(!is_safe_name(".."));
        assert!(!is_safe_name(""));
    }

    #[test]
    fn partial_manifest_payload_merges_over_defaults() {
        let rules: AppRules =
            serde_json::from_str(r#"{ "maxInstances": 2, "resizable": false }"#).expect("rules");
        assert_eq!(rules.max_instances, 2);
        assert!(!rules.resizable);
        assert!(rules.minimizable, "unset fields keep their defaults");
    }
}
