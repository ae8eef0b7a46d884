use crate::config::ServerConfig;
use crate::errors::AppError;
use crate::models::AppData;
use crate::storage::{load_data, persist_data};
use std::{path::PathBuf, sync::Arc};
use tokio::{fs, sync::Mutex};

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Prepares the data directory and loads whatever calendar was saved there.
    pub async fn load(config: &ServerConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.data_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let data = load_data(&config.data_path).await;
        Ok(Self::new(config.data_path.clone(), data))
    }

    /// Applies `change` to a copy of the calendar and saves the copy. Only a
    /// saved copy becomes visible; on any error the calendar is unchanged.
    pub async fn update<T>(
        &self,
        change: impl FnOnce(&mut AppData) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let value = change(&mut next)?;
        persist_data(&self.data_path, &next).await?;
        *data = next;
        Ok(value)
    }
}
