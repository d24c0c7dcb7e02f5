use serde_json::{Map, Value};

/// The three contact fields as they arrived. `None` means absent or null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

/// Parse a request body based on Content-Type header.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<ContactPayload, String> {
    let ct = content_type.unwrap_or("application/json");

    let value = if ct.contains("application/json") {
        serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)?
    } else if ct.contains("multipart/form-data") {
        return Err("Unsupported content type: multipart/form-data".to_string());
    } else {
        // Try JSON first, then form-urlencoded
        serde_json::from_slice(body)
            .or_else(|_| parse_form_urlencoded(body))
            .map_err(|e| format!("Unable to parse body: {e}"))?
    };

    extract_fields(&value)
}

fn parse_form_urlencoded(body: &[u8]) -> Result<Value, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;

    let mut map = Map::new();
    for (k, v) in form_urlencoded::parse(body_str.as_bytes()) {
        // First occurrence wins for repeated keys.
        map.entry(k.into_owned())
            .or_insert_with(|| Value::String(v.into_owned()));
    }
    Ok(Value::Object(map))
}

fn extract_fields(value: &Value) -> Result<ContactPayload, String> {
    let Some(obj) = value.as_object() else {
        return Err("Request body must be an object".to_string());
    };

    Ok(ContactPayload {
        name: string_field(obj, "name")?,
        email: string_field(obj, "email")?,
        message: string_field(obj, "message")?,
    })
}

fn string_field(obj: &Map<String, Value>, field: &str) -> Result<Option<String>, String> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(format!("Field '{field}' must be a string")),
    }
}
