//! Bridge response envelopes.
//!
//! Writes and pairing answer with a list of `{"success": ...}` or
//! `{"error": ...}` entries. Reads answer with the resource itself, or with
//! the same error list when the request failed.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::Error;
use crate::transport::HttpResponse;

type Result<T> = std::result::Result<T, Error>;

/// An error entry reported by the bridge.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: u32,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
}

impl ApiError {
    /// Error type the bridge uses when the link button was not pressed.
    pub const LINK_BUTTON_NOT_PRESSED: u32 = 101;

    pub fn into_error(self) -> Error {
        Error::Bridge {
            kind: self.kind,
            address: self.address,
            description: self.description,
        }
    }
}

/// One entry of a bridge response list.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum ApiEntry {
    #[serde(rename = "success")]
    Success(Value),
    #[serde(rename = "error")]
    Error(ApiError),
}

/// Parse a response list; anything that is not a list yields an empty one.
pub(crate) fn entries(resp: &HttpResponse) -> Result<Vec<ApiEntry>> {
    let value: Value = resp.json()?;
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// The first element of a response list, parsed on its own.
///
/// `None` when the body is not a list, the list is empty, or its first
/// element is neither a success nor an error entry.
pub(crate) fn first_entry(resp: &HttpResponse) -> Result<Option<ApiEntry>> {
    let value: Value = resp.json()?;
    Ok(value
        .as_array()
        .and_then(|items| items.first())
        .and_then(|item| serde_json::from_value(item.clone()).ok()))
}

/// Parse a read response, surfacing bridge error lists as [`Error::Bridge`].
pub(crate) fn parse_resource<T: DeserializeOwned>(resp: HttpResponse) -> Result<T> {
    let resp = resp.error_for_status()?;
    let value: Value = resp.json()?;
    if let Some(err) = first_error(&value) {
        return Err(err.into_error());
    }
    serde_json::from_value(value).map_err(Error::JsonLoad)
}

/// Check a write response; the first error entry fails the whole write.
pub(crate) fn check_write(resp: HttpResponse) -> Result<()> {
    let resp = resp.error_for_status()?;
    for entry in entries(&resp)? {
        if let ApiEntry::Error(err) = entry {
            return Err(err.into_error());
        }
    }
    Ok(())
}

fn first_error(value: &Value) -> Option<ApiError> {
    value
        .as_array()?
        .iter()
        .filter_map(|item| item.get("error"))
        .find_map(|err| serde_json::from_value(err.clone()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn resp(body: &str) -> HttpResponse {
        HttpResponse::new("http://bridge/api/user/lights/1", 200, body)
    }

    #[test]
    fn test_entries() {
        let parsed = entries(&resp(
            r#"[{"success": {"username": "abc"}},
                {"error": {"type": 101, "address": "", "description": "link button not pressed"}}]"#,
        ))
        .unwrap();

        assert_eq!(parsed.len(), 2);
        assert!(matches!(&parsed[0], ApiEntry::Success(v) if v["username"] == "abc"));
        assert!(matches!(
            &parsed[1],
            ApiEntry::Error(e) if e.kind == ApiError::LINK_BUTTON_NOT_PRESSED
        ));
    }

    #[test]
    fn test_first_entry_is_positional() {
        let first = first_entry(&resp(r#"[{"unexpected": 1}, {"success": {"username": "x"}}]"#));
        assert_eq!(first.unwrap(), None);

        let first = first_entry(&resp(r#"[{"success": {"username": "x"}}, {"unexpected": 1}]"#));
        assert!(matches!(first.unwrap(), Some(ApiEntry::Success(_))));

        assert_eq!(first_entry(&resp("[]")).unwrap(), None);
        assert_eq!(first_entry(&resp(r#"{"success": {}}"#)).unwrap(), None);
    }

    #[test]
    fn test_resource_error_list() {
        let result: Result<Value> = parse_resource(resp(
            r#"[{"error": {"type": 3, "address": "/lights/9", "description": "resource, /lights/9, not available"}}]"#,
        ));
        assert_eq!(
            result,
            Err(Error::Bridge {
                kind: 3,
                address: "/lights/9".to_string(),
                description: "resource, /lights/9, not available".to_string(),
            })
        );
    }

    #[test]
    fn test_resource_object() {
        let map: BTreeMap<String, Value> =
            parse_resource(resp(r#"{"1": {"name": "Sotto"}}"#)).unwrap();
        assert_eq!(map["1"]["name"], "Sotto");
    }

    #[test]
    fn test_check_write() {
        assert!(check_write(resp(r#"[{"success": {"/lights/1/state/on": true}}]"#)).is_ok());
        assert!(matches!(
            check_write(resp(
                r#"[{"error": {"type": 201, "address": "/lights/1/state/bri", "description": "parameter, bri, is not modifiable. Device is set to off."}}]"#
            )),
            Err(Error::Bridge { kind: 201, .. })
        ));
        assert!(matches!(
            check_write(HttpResponse::new("u", 500, "")),
            Err(Error::Status { status: 500, .. })
        ));
    }
}
