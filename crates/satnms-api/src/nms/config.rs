// NMS configuration snapshot endpoints
//
// Full-configuration capture and restore. The shared store lives on the NMS
// server and is addressed by name; export/import move the artifact bytes
// so a caller can keep its own store.

use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::nms::client::NmsClient;
use crate::nms::models::SnapshotRequest;

impl NmsClient {
    /// Save the current configuration into the NMS-side store.
    ///
    /// `POST /api/config/save` with `{"name": "..."}`
    pub async fn save_config(&self, name: &str) -> Result<(), Error> {
        let url = self.api_url("config/save")?;
        debug!(name, "saving configuration snapshot");
        let _: Value = self.post(url, &SnapshotRequest { name }).await?;
        Ok(())
    }

    /// Replace the running configuration with a snapshot from the NMS-side store.
    ///
    /// `POST /api/config/load` with `{"name": "..."}`
    pub async fn load_config(&self, name: &str) -> Result<(), Error> {
        let url = self.api_url("config/load")?;
        debug!(name, "loading configuration snapshot");
        let _: Value = self.post(url, &SnapshotRequest { name }).await?;
        Ok(())
    }

    /// Download the running configuration as an opaque artifact.
    ///
    /// `GET /api/config/export`
    pub async fn export_config(&self) -> Result<Vec<u8>, Error> {
        let url = self.api_url("config/export")?;
        debug!("exporting configuration");
        self.get_bytes(url).await
    }

    /// Upload an artifact, replacing the running configuration.
    ///
    /// `POST /api/config/import`
    pub async fn import_config(&self, artifact: Vec<u8>) -> Result<(), Error> {
        let url = self.api_url("config/import")?;
        debug!(bytes = artifact.len(), "importing configuration");
        let _: Value = self.post_bytes(url, artifact).await?;
        Ok(())
    }
}
