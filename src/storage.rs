use crate::errors::AppError;
use crate::models::AppData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, warn};

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse calendar file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read calendar file: {err}");
            AppData::default()
        }
    }
}

/// Writes the calendar next to `path` and renames it into place, so a
/// crash mid-write never leaves a truncated file behind.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    let staging = staging_path(path);
    fs::write(&staging, payload).await.map_err(AppError::internal)?;

    if let Err(err) = fs::rename(&staging, path).await {
        error!("failed to replace calendar file {}: {err}", path.display());
        if let Err(cleanup) = fs::remove_file(&staging).await {
            warn!("failed to remove {}: {cleanup}", staging.display());
        }
        return Err(AppError::internal(err));
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayEntry;
    use crate::status::Status;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("study_calendar_{}_{name}.json", std::process::id()));
        path
    }

    #[tokio::test]
    async fn persisted_days_load_back() {
        let path = temp_path("roundtrip");
        let mut data = AppData::default();
        data.days.insert(
            "2025-03-09".to_string(),
            DayEntry {
                status: Status::Partial,
                updated_at: "2025-03-09T10:00:00+00:00".to_string(),
            },
        );

        persist_data(&path, &data).await.unwrap();
        let loaded = load_data(&path).await;
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.days, data.days);
        assert!(!staging_path(&path).exists());
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_file() {
        // Renaming over a directory fails, which stands in for a full disk.
        let path = temp_path("blocked");
        let _ = std::fs::remove_file(&path);
        std::fs::create_dir_all(&path).unwrap();

        let err = persist_data(&path, &AppData::default()).await.unwrap_err();
        let staged = staging_path(&path).exists();
        let _ = std::fs::remove_dir_all(&path);

        assert_eq!(err.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!staged);
    }

    #[tokio::test]
    async fn plans_survive_reload() {
        let path = temp_path("plans");
        let mut data = AppData::default();
        crate::plans::create_plan(&mut data, "Algebra", "math", String::new()).unwrap();

        persist_data(&path, &data).await.unwrap();
        let loaded = load_data(&path).await;
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.plans, data.plans);
    }

    #[tokio::test]
    async fn missing_or_corrupt_file_starts_empty() {
        let path = temp_path("missing");
        let _ = std::fs::remove_file(&path);
        assert!(load_data(&path).await.days.is_empty());

        let path = temp_path("corrupt");
        std::fs::write(&path, b"{ not json").unwrap();
        let loaded = load_data(&path).await;
        let _ = std::fs::remove_file(&path);
        assert!(loaded.days.is_empty());
    }
}
