/// Authenticated HTTP connection to the CloudControl API.
use std::fmt;

use log::{debug, trace};
use reqwest::{header, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::{xml, ProviderError, ProviderResult};
use crate::utils::truncate_error_message;

pub(crate) const API_V1_ROOT: &str = "/oec/0.9";
pub(crate) const API_V2_ROOT: &str = "/caas/2.4";

// <Account> returned by /oec/0.9/myaccount
#[derive(Debug, Deserialize)]
struct AccountXml {
    #[serde(rename = "orgId")]
    org_id: String,
}

// <response> returned by 2.x calls
#[derive(Debug, Deserialize)]
struct ResponseXml {
    #[serde(rename = "responseCode")]
    response_code: String,
    #[serde(default)]
    message: String,
    #[serde(rename = "info", default)]
    info: Vec<InfoXml>,
}

#[derive(Debug, Deserialize)]
struct InfoXml {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@value")]
    value: String,
}

// <Status> returned by 0.9 calls
#[derive(Debug, Deserialize)]
struct StatusXml {
    result: String,
    #[serde(rename = "resultDetail", default)]
    result_detail: String,
    #[serde(rename = "resultCode")]
    result_code: Option<String>,
}

/// Outcome document of a mutating call, from either API generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseStatus {
    pub code: String,
    pub message: String,
    /// `<info name=".." value=".."/>` pairs returned by 2.x calls.
    pub info: Vec<(String, String)>,
}

impl From<ResponseXml> for ResponseStatus {
    fn from(response: ResponseXml) -> Self {
        Self {
            code: response.response_code,
            message: response.message,
            info: response
                .info
                .into_iter()
                .map(|i| (i.name, i.value))
                .collect(),
        }
    }
}

impl From<StatusXml> for ResponseStatus {
    fn from(status: StatusXml) -> Self {
        let code = match status.result_code {
            Some(code) if status.result != "SUCCESS" => code,
            _ => status.result,
        };
        Self {
            code,
            message: status.result_detail,
            info: vec![],
        }
    }
}

impl ResponseStatus {
    /// Read a 2.x `response` or 0.9 `Status` document.
    pub fn parse(document: &str) -> Option<Self> {
        if let Ok(response) = xml::from_str::<ResponseXml>(document) {
            return Some(response.into());
        }
        xml::from_str::<StatusXml>(document).ok().map(Self::from)
    }

    pub fn info(&self, name: &str) -> Option<&str> {
        self.info
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// 2.x reports accepted work as `IN_PROGRESS` or `OK`, 0.9 as `SUCCESS`.
    pub fn is_success(&self) -> bool {
        matches!(self.code.as_str(), "IN_PROGRESS" | "OK" | "SUCCESS")
    }
}

pub struct Connection {
    base_url: String,
    user: String,
    password: String,
    http_client: reqwest::Client,
    org_id: OnceCell<String>,
}

impl Connection {
    pub fn new(base_url: &str, user: &str, password: &str) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("didata/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user: user.to_string(),
            password: password.to_string(),
            http_client,
            org_id: OnceCell::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Organization id of the authenticated account, fetched on first use.
    pub async fn org_id(&self) -> ProviderResult<&str> {
        let org_id = self
            .org_id
            .get_or_try_init(|| async {
                let document = self
                    .get(&format!("{}/myaccount", API_V1_ROOT), &[])
                    .await?;
                let account: AccountXml = xml::from_str(&document)?;
                Ok::<_, ProviderError>(account.org_id)
            })
            .await?;
        Ok(org_id.as_str())
    }

    /// GET a path under the 2.x organization root.
    pub async fn get_v2<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ProviderResult<T> {
        let path = format!("{}/{}/{}", API_V2_ROOT, self.org_id().await?, path);
        xml::from_str(&self.get(&path, query).await?)
    }

    /// POST `body` as `<root>` under the 2.x organization root.
    pub async fn post_v2<B: Serialize + Sync>(
        &self,
        path: &str,
        root: &str,
        body: &B,
    ) -> ProviderResult<ResponseStatus> {
        let path = format!("{}/{}/{}", API_V2_ROOT, self.org_id().await?, path);
        let document = self.post(&path, Some(xml::to_string(root, body)?)).await?;
        let response: ResponseXml = xml::from_str(&document)?;
        Ok(response.into())
    }

    /// GET a path under the 0.9 organization root.
    pub async fn get_v1<T: DeserializeOwned>(&self, path: &str) -> ProviderResult<T> {
        let path = format!("{}/{}/{}", API_V1_ROOT, self.org_id().await?, path);
        xml::from_str(&self.get(&path, &[]).await?)
    }

    /// POST `body` as `<root>` under the 0.9 organization root.
    pub async fn post_v1<B: Serialize + Sync>(
        &self,
        path: &str,
        root: &str,
        body: &B,
    ) -> ProviderResult<ResponseStatus> {
        self.post_v1_document(path, Some(xml::to_string(root, body)?))
            .await
    }

    /// POST without a body, as the 0.9 `?disable` calls expect.
    pub async fn post_v1_empty(&self, path: &str) -> ProviderResult<ResponseStatus> {
        self.post_v1_document(path, None).await
    }

    async fn post_v1_document(
        &self,
        path: &str,
        document: Option<String>,
    ) -> ProviderResult<ResponseStatus> {
        let path = format!("{}/{}/{}", API_V1_ROOT, self.org_id().await?, path);
        let document = self.post(&path, document).await?;
        let status: StatusXml = xml::from_str(&document)?;
        Ok(status.into())
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> ProviderResult<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .query(query)
            .send()
            .await?;

        read_response(response).await
    }

    async fn post(&self, path: &str, document: Option<String>) -> ProviderResult<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let mut request = self
            .http_client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password));
        if let Some(document) = document {
            trace!("request body: {}", document);
            request = request
                .header(header::CONTENT_TYPE, "application/xml")
                .body(document);
        }

        read_response(request.send().await?).await
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.base_url)
    }
}

async fn read_response(response: reqwest::Response) -> ProviderResult<String> {
    let status = response.status();
    let text = response.text().await?;
    trace!("response {}: {}", status, text);

    if status.is_success() {
        return Ok(text);
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(ProviderError::Api {
            code: "UNAUTHORIZED".to_string(),
            message: "Invalid credentials for the selected region".to_string(),
        });
    }

    // error responses normally still carry a status document
    if let Some(api_status) = ResponseStatus::parse(&text) {
        return Err(ProviderError::Api {
            code: api_status.code,
            message: api_status.message,
        });
    }

    Err(ProviderError::Communication(format!(
        "HTTP {}: {}",
        status,
        truncate_error_message(&text, 5)
    )))
}
