/// XML documents exchanged with the CloudControl API.
///
/// Responses are decoded with `quick_xml::de` into `#[derive(Deserialize)]`
/// structs. Elements and attributes match on their local name, so the
/// `ns3:`/`ns6:` prefixes of the 0.9 API need no special handling. Requests
/// are encoded with `quick_xml::se` under an explicit root element.
use quick_xml::{de, se};
use serde::{de::DeserializeOwned, Serialize};

use super::ProviderError;

pub const TYPES_NAMESPACE: &str = "urn:didata.com:api:cloud:types";
pub const BACKUP_NAMESPACE: &str = "http://oec.api.opsource.net/schemas/backup";

pub fn from_str<T: DeserializeOwned>(document: &str) -> Result<T, ProviderError> {
    de::from_str(document).map_err(|e| ProviderError::Parse(e.to_string()))
}

/// Encode `body` as `<root ...>...</root>`.
pub fn to_string<T: Serialize>(root: &str, body: &T) -> Result<String, ProviderError> {
    se::to_string_with_root(root, body).map_err(|e| ProviderError::Parse(e.to_string()))
}
