// NMS authentication
//
// Cookie-based session login/logout. The login endpoint sets a session
// cookie in the client's jar; subsequent requests carry it automatically.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::Error;
use crate::nms::client::NmsClient;

impl NmsClient {
    /// Authenticate with username/password.
    ///
    /// `POST /api/login`
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.api_url("login")?;
        debug!("logging in at {}", url);

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });

        let resp = self.http().post(url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        Self::parse_envelope::<Value>(resp)
            .await
            .map_err(|e| match e {
                Error::Nms { code, message } => Error::Authentication {
                    message: format!("login rejected (error_code={code}): {message}"),
                },
                other => other,
            })?;

        debug!("login successful");
        Ok(())
    }

    /// End the current session.
    ///
    /// `POST /api/logout`
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.api_url("logout")?;
        debug!("logging out at {}", url);
        let resp = self.http().post(url).send().await?;
        Self::parse_envelope::<Value>(resp).await?;
        Ok(())
    }
}
