use rcm_core::domain::Critique;
use serde_json::Value;

/// Remove a surrounding Markdown code fence (```` ```json ```` or ```` ``` ````).
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let inner = if let Some(rest) = text.strip_prefix("```json") {
        rest
    } else if let Some(rest) = text.strip_prefix("```") {
        rest
    } else {
        return text;
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Parse the critique model output. Malformed output scores zero with a `Parse Error` reason.
pub fn parse_critique(raw: &str) -> Critique {
    let value: Value = match serde_json::from_str(strip_code_fence(raw)) {
        Ok(v) => v,
        Err(e) => return Critique::zero(format!("Parse Error: {e}")),
    };
    let Some(obj) = value.as_object() else {
        return Critique::zero("Parse Error: expected a JSON object");
    };

    let score = match obj.get("score") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(|f| f.round() as i64).unwrap_or(0),
        _ => 0,
    };
    let reasoning = match obj.get("reasoning") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    Critique {
        score: score.clamp(0, 10),
        reasoning,
    }
}
