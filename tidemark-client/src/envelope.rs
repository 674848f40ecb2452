/// Paged response envelope
///
/// Every paginated response is an object holding the current page's records
/// under a segment key plus, when more pages exist, a continuation under
/// `next_page.next_query`. The continuation is a complete replacement query
/// the server built; the client never inspects or merges it.
use serde_json::Value;

use crate::{ClientError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    /// Records of this page, in server order. May be empty.
    pub segment: Vec<Value>,
    /// Body to send verbatim to fetch the next page, if any.
    pub continuation: Option<Value>,
}

impl ResponseEnvelope {
    /// Parse one response body.
    ///
    /// The segment key must be present and hold an array; an empty array is
    /// a valid (empty) page. A missing or null `next_page.next_query` means
    /// this is the final page.
    pub fn parse(body: &str, segment_key: &str) -> Result<Self> {
        let mut root: Value = serde_json::from_str(body)
            .map_err(|e| ClientError::Malformed(format!("response body is not JSON: {}", e)))?;

        let object = root.as_object_mut().ok_or_else(|| {
            ClientError::Malformed("response body is not a JSON object".to_string())
        })?;

        let segment = match object.remove(segment_key) {
            Some(Value::Array(records)) => records,
            Some(_) => {
                return Err(ClientError::Malformed(format!(
                    "response field {:?} is not an array",
                    segment_key
                )))
            }
            None => {
                return Err(ClientError::Malformed(format!(
                    "response is missing field {:?}",
                    segment_key
                )))
            }
        };

        let continuation = object
            .get_mut("next_page")
            .and_then(|page| page.get_mut("next_query"))
            .map(Value::take)
            .filter(|query| !query.is_null());

        Ok(Self {
            segment,
            continuation,
        })
    }
}
