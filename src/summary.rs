use serde_json::Value;

const DEFAULT_SUMMARY: &str = "Tag detected";

/// Derive a one-line display summary from raw tag data.
///
/// Total over arbitrary input: malformed payloads fall back to a technology
/// listing or a fixed default rather than failing.
pub fn summarize(tag: &Value) -> String {
    if let Some(text) = ndef_text(tag) {
        return format!("NDEF text: {}", text);
    }

    match tag.as_object() {
        Some(map) if !map.is_empty() => {
            let technologies: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("Tag technologies: {}", technologies.join(", "))
        }
        _ => DEFAULT_SUMMARY.to_string(),
    }
}

/// Extract the text of the first cached NDEF record, if there is one.
fn ndef_text(tag: &Value) -> Option<String> {
    let records = tag
        .get("ndef")?
        .get("cachedMessage")?
        .get("records")?
        .as_array()?;

    let payload = records.first()?.get("payload")?.as_array()?;
    let bytes: Vec<u8> = payload
        .iter()
        .filter_map(|v| v.as_u64())
        .map(|b| b as u8)
        .collect();

    if bytes.is_empty() {
        return None;
    }

    // The first byte is the language-code-length prefix of a short text
    // record; skip it when anything follows.
    let text_bytes = if bytes.len() > 1 {
        &bytes[1..]
    } else {
        &bytes[..]
    };

    let text = String::from_utf8_lossy(text_bytes).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
