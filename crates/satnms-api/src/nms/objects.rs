// NMS object endpoints
//
// Insert, write and read of configuration objects addressed by
// `type:index` handles. Parameter maps are passed through untouched:
// enum-valued fields may be numeric or string encoded.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Error;
use crate::nms::client::NmsClient;
use crate::nms::models::{InsertRequest, TickInfo};

impl NmsClient {
    /// Create a child object under `parent` (a handle or `root`).
    ///
    /// `POST /api/object/insert/{parent}`
    ///
    /// Returns whatever the NMS echoes back as `data`, usually the stored
    /// parameter set.
    pub async fn insert_object(
        &self,
        parent: &str,
        item_type: &str,
        index: u32,
        params: &Map<String, Value>,
    ) -> Result<Value, Error> {
        let url = self.api_url(&format!("object/insert/{parent}"))?;
        debug!(parent, item_type, index, "inserting object");
        let body = InsertRequest {
            new_item: item_type,
            index,
            params,
        };
        self.post(url, &body).await
    }

    /// Submit a partial parameter change.
    ///
    /// `POST /api/object/write/{handle}`
    pub async fn write_object(&self, handle: &str, params: &Map<String, Value>) -> Result<(), Error> {
        let url = self.api_url(&format!("object/write/{handle}"))?;
        debug!(handle, fields = params.len(), "writing object");
        let _: Value = self.post(url, params).await?;
        Ok(())
    }

    /// Read every parameter of an object, including its `state` and `faults`.
    ///
    /// `GET /api/object/get/{handle}`
    pub async fn get_object(&self, handle: &str) -> Result<Map<String, Value>, Error> {
        let url = self.api_url(&format!("object/get/{handle}"))?;
        self.get(url).await
    }

    /// Current value of the NMS configuration-push cycle counter.
    ///
    /// `GET /api/realtime/tick`
    pub async fn get_tick(&self) -> Result<u64, Error> {
        let url = self.api_url("realtime/tick")?;
        let info: TickInfo = self.get(url).await?;
        Ok(info.tick)
    }
}
