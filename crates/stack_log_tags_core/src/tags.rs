use crate::contract::TagSet;
use crate::error::ValidationError;

pub const MAX_TAGS_PER_LOG_GROUP: usize = 50;
pub const MAX_TAG_KEY_CHARS: usize = 128;
pub const MAX_TAG_VALUE_CHARS: usize = 256;
const RESERVED_KEY_PREFIX: &str = "aws:";

/// Checks a tag set against the CloudWatch Logs tagging limits.
pub fn validate_tag_set(tags: &TagSet) -> Result<(), ValidationError> {
    if tags.is_empty() {
        return Err(ValidationError::new("at least one tag is required"));
    }
    if tags.len() > MAX_TAGS_PER_LOG_GROUP {
        return Err(ValidationError::new(format!(
            "a log group accepts at most {MAX_TAGS_PER_LOG_GROUP} tags, got {}",
            tags.len()
        )));
    }

    for (key, value) in tags {
        let key_chars = key.chars().count();
        if key_chars == 0 {
            return Err(ValidationError::new("tag keys must be non-empty strings"));
        }
        if key_chars > MAX_TAG_KEY_CHARS {
            return Err(ValidationError::new(format!(
                "tag key '{key}' exceeds {MAX_TAG_KEY_CHARS} characters"
            )));
        }
        if key
            .get(..RESERVED_KEY_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(RESERVED_KEY_PREFIX))
        {
            return Err(ValidationError::new(format!(
                "tag key '{key}' uses the reserved 'aws:' prefix"
            )));
        }
        if value.chars().count() > MAX_TAG_VALUE_CHARS {
            return Err(ValidationError::new(format!(
                "value of tag '{key}' exceeds {MAX_TAG_VALUE_CHARS} characters"
            )));
        }
    }

    Ok(())
}

/// Parses a `KEY=VALUE` assignment. The value may be empty or contain `=`.
/// Neither side is trimmed.
pub fn parse_tag_assignment(raw: &str) -> Result<(String, String), ValidationError> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(ValidationError::new(format!(
            "tag '{raw}' must be written as KEY=VALUE"
        )));
    };
    if key.is_empty() {
        return Err(ValidationError::new(format!("tag '{raw}' has an empty key")));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Decodes a JSON object of scalar values into a tag set.
pub fn tag_set_from_json(raw: &str) -> Result<TagSet, ValidationError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|error| ValidationError::new(format!("malformed tag JSON: {error}")))?;
    tag_set_from_value(&value)
}

pub fn tag_set_from_value(value: &serde_json::Value) -> Result<TagSet, ValidationError> {
    let Some(object) = value.as_object() else {
        return Err(ValidationError::new("tags must be a JSON object"));
    };

    let mut tags = TagSet::new();
    for (key, value) in object {
        let value = match value {
            serde_json::Value::String(text) => text.clone(),
            serde_json::Value::Number(number) => number.to_string(),
            serde_json::Value::Bool(flag) => flag.to_string(),
            _ => {
                return Err(ValidationError::new(format!(
                    "value of tag '{key}' must be a string, number or boolean"
                )))
            }
        };
        tags.insert(key.clone(), value);
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> TagSet {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn accepts_ordinary_tags() {
        validate_tag_set(&tags(&[("team", "payments"), ("env", "")]))
            .expect("tags should pass");
    }

    #[test]
    fn rejects_empty_tag_set() {
        let error = validate_tag_set(&TagSet::new()).expect_err("empty set should fail");
        assert_eq!(error.message(), "at least one tag is required");
    }

    #[test]
    fn rejects_reserved_prefix_case_insensitively() {
        let error = validate_tag_set(&tags(&[("AWS:cloudformation", "x")]))
            .expect_err("reserved key should fail");
        assert!(error.message().contains("reserved"));
    }

    #[test]
    fn rejects_oversized_keys_and_values() {
        let long_key = "k".repeat(MAX_TAG_KEY_CHARS + 1);
        assert!(validate_tag_set(&tags(&[(long_key.as_str(), "v")])).is_err());

        let long_value = "v".repeat(MAX_TAG_VALUE_CHARS + 1);
        assert!(validate_tag_set(&tags(&[("team", long_value.as_str())])).is_err());
    }

    #[test]
    fn rejects_too_many_tags() {
        let many: TagSet = (0..=MAX_TAGS_PER_LOG_GROUP)
            .map(|index| (format!("key-{index}"), "v".to_string()))
            .collect();
        let error = validate_tag_set(&many).expect_err("too many tags should fail");
        assert!(error.message().contains("at most 50"));
    }

    #[test]
    fn parses_assignment_with_equals_in_value() {
        assert_eq!(
            parse_tag_assignment("query=a=b").expect("assignment should parse"),
            ("query".to_string(), "a=b".to_string())
        );
        assert!(parse_tag_assignment("novalue").is_err());
        assert!(parse_tag_assignment("=value").is_err());
    }

    #[test]
    fn assignment_keeps_surrounding_whitespace() {
        assert_eq!(
            parse_tag_assignment(" team =x ").expect("assignment should parse"),
            (" team ".to_string(), "x ".to_string())
        );
        assert_eq!(
            parse_tag_assignment(" =x").expect("a blank key is still a key"),
            (" ".to_string(), "x".to_string())
        );
    }

    #[test]
    fn json_tags_accept_scalars_and_reject_nested_values() {
        let parsed = tag_set_from_value(&json!({"team": "payments", "tier": 2, "pci": true}))
            .expect("scalars should parse");
        assert_eq!(parsed["tier"], "2");
        assert_eq!(parsed["pci"], "true");

        let error = tag_set_from_value(&json!({"team": ["a"]})).expect_err("arrays are rejected");
        assert_eq!(
            error.message(),
            "value of tag 'team' must be a string, number or boolean"
        );
        assert!(tag_set_from_json("[]").is_err());
    }
}
