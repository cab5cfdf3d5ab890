// UHP HTTP form client
//
// The modem's web interface is a set of named pages, each carrying one HTML
// form. Reading a page yields its fields as an ordered key/value map;
// submitting posts url-encoded fields back to the same page. Pages that a
// hardware model doesn't have answer 404, which is reported as `None`
// rather than an error.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Ordered form fields: inputs, then selects, then textareas, each in page order.
pub type FormFields = IndexMap<String, String>;

static INPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<input\b([^>]*)>").expect("static regex"));
static SELECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<select\b([^>]*)>(.*?)</select>").expect("static regex")
});
static OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<option\b([^>]*)>([^<]*)").expect("static regex"));
static TEXTAREA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<textarea\b([^>]*)>(.*?)</textarea>").expect("static regex")
});
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)([a-z_:-]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("static regex")
});

/// Attributes of one tag, lowercased names. Valueless attributes map to "".
fn attributes(raw: &str) -> IndexMap<String, String> {
    ATTR_RE
        .captures_iter(raw)
        .map(|c| {
            let name = c[1].to_ascii_lowercase();
            let value = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map_or_else(String::new, |m| m.as_str().to_owned());
            (name, value)
        })
        .collect()
}

/// Extract every named field of the forms on a page.
///
/// - text/hidden/number inputs contribute their `value`
/// - checkboxes contribute `"1"` when checked, `"0"` otherwise
/// - radio groups contribute the checked member's value
/// - selects contribute the selected option (first option if none is marked)
/// - textareas contribute their body
pub fn parse_form(html: &str) -> FormFields {
    let mut fields = FormFields::new();

    for cap in INPUT_RE.captures_iter(html) {
        let attrs = attributes(&cap[1]);
        let Some(name) = attrs.get("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        let kind = attrs.get("type").map_or("text", String::as_str);
        let checked = attrs.contains_key("checked");
        match kind.to_ascii_lowercase().as_str() {
            "submit" | "button" | "reset" | "image" => {}
            "checkbox" => {
                fields.insert(name.clone(), if checked { "1" } else { "0" }.into());
            }
            "radio" => {
                if checked {
                    fields.insert(name.clone(), attrs.get("value").cloned().unwrap_or_default());
                }
            }
            _ => {
                fields.insert(name.clone(), attrs.get("value").cloned().unwrap_or_default());
            }
        }
    }

    for cap in SELECT_RE.captures_iter(html) {
        let attrs = attributes(&cap[1]);
        let Some(name) = attrs.get("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        let mut first = None;
        let mut selected = None;
        for opt in OPTION_RE.captures_iter(&cap[2]) {
            let opt_attrs = attributes(&opt[1]);
            let value = opt_attrs
                .get("value")
                .cloned()
                .unwrap_or_else(|| opt[2].trim().to_owned());
            if first.is_none() {
                first = Some(value.clone());
            }
            if opt_attrs.contains_key("selected") {
                selected = Some(value);
            }
        }
        if let Some(value) = selected.or(first) {
            fields.insert(name.clone(), value);
        }
    }

    for cap in TEXTAREA_RE.captures_iter(html) {
        let attrs = attributes(&cap[1]);
        if let Some(name) = attrs.get("name").filter(|n| !n.is_empty()) {
            fields.insert(name.clone(), cap[2].to_owned());
        }
    }

    fields
}

/// HTTP client for one modem's web management interface.
///
/// Stateless per call: every request carries basic-auth credentials when
/// they are configured.
pub struct HttpFormClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Option<(String, SecretString)>,
}

impl HttpFormClient {
    pub fn new(
        base_url: Url,
        transport: &TransportConfig,
        credentials: Option<(String, SecretString)>,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            credentials,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            credentials: None,
        }
    }

    /// The modem's base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn page_url(&self, page: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{}", page.trim_start_matches('/')))?)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some((user, pass)) => builder.basic_auth(user, Some(pass.expose_secret())),
            None => builder,
        }
    }

    /// Fetch a page as text. `Ok(None)` when the page doesn't exist on this model.
    pub async fn fetch_page(&self, page: &str) -> Result<Option<String>, Error> {
        let url = self.page_url(page)?;
        debug!("GET {}", url);
        let resp = self.authorize(self.http.get(url)).send().await?;
        Self::read_body(resp).await
    }

    /// Fetch a page and parse its form fields.
    pub async fn fetch_form(&self, page: &str) -> Result<Option<FormFields>, Error> {
        Ok(self.fetch_page(page).await?.map(|html| parse_form(&html)))
    }

    /// Post fields to a page and return the reply page.
    /// `Ok(None)` when the page doesn't exist on this model.
    pub async fn submit_form(
        &self,
        page: &str,
        fields: &FormFields,
    ) -> Result<Option<String>, Error> {
        let url = self.page_url(page)?;
        debug!(fields = fields.len(), "POST {}", url);
        let resp = self.authorize(self.http.post(url).form(fields)).send().await?;
        Self::read_body(resp).await
    }

    async fn read_body(resp: reqwest::Response) -> Result<Option<String>, Error> {
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "modem rejected web credentials".into(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }
        Ok(Some(resp.text().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inputs_selects_and_checkboxes() {
        let html = r#"
            <form action="/cw3">
              <input type="text" name="rx_freq" value="1150000">
              <input type=hidden name='sr' value=2000>
              <input type="checkbox" name="tx_on" checked>
              <input type="checkbox" name="acm">
              <input type="radio" name="mode" value="star">
              <input type="radio" name="mode" value="dama" checked>
              <select name="modcod">
                <option value="1">QPSK 1/2</option>
                <option value="4" selected>QPSK 3/4</option>
              </select>
              <textarea name="script">pro 1 run</textarea>
              <input type="submit" name="apply" value="Apply">
            </form>"#;

        let fields = parse_form(html);
        assert_eq!(fields["rx_freq"], "1150000");
        assert_eq!(fields["sr"], "2000");
        assert_eq!(fields["tx_on"], "1");
        assert_eq!(fields["acm"], "0");
        assert_eq!(fields["mode"], "dama");
        assert_eq!(fields["modcod"], "4");
        assert_eq!(fields["script"], "pro 1 run");
        assert!(!fields.contains_key("apply"));
    }

    #[test]
    fn select_without_selection_takes_first_option() {
        let fields = parse_form(r#"<select name="ro"><option>20</option><option>25</option></select>"#);
        assert_eq!(fields["ro"], "20");
    }

    #[test]
    fn field_order_follows_page() {
        let fields = parse_form(r#"<input name="b" value="2"><input name="a" value="1">"#);
        let names: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["b", "a"]);
    }
}
