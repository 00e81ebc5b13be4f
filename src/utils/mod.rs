pub mod global_id;

pub use global_id::{from_gid_or_none, from_global_id, gid_to_int, to_global_id};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Expected a flag (true/false), got '{0}'")]
pub struct ParseBoolError(pub String);

/// Parse the boolean spellings accepted in configuration and env vars
pub fn parse_bool(value: &str) -> Result<bool, ParseBoolError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "t" | "y" | "1" => Ok(true),
        "no" | "false" | "f" | "n" | "0" => Ok(false),
        _ => Err(ParseBoolError(value.to_string())),
    }
}

/// Parse an integer, `None` when the text is not a number
pub fn parse_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

/// `DeliveryNote` -> `delivery_note`
pub fn underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' {
            out.push('_');
            continue;
        }
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map_or(false, |n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `delivery_note_ids` -> `deliveryNoteIds`, `DeleteNote` -> `deleteNote`
pub fn lower_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if out.is_empty() {
            out.extend(c.to_lowercase());
        } else if upper_next {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        upper_next = false;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("Yes"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int(Some("42")), Some(42));
        assert_eq!(parse_int(Some("x")), None);
        assert_eq!(parse_int(None), None);
    }

    #[test]
    fn test_underscore() {
        assert_eq!(underscore("Note"), "note");
        assert_eq!(underscore("DeliveryNote"), "delivery_note");
        assert_eq!(underscore("HTTPRequest"), "http_request");
        assert_eq!(underscore("Version2Item"), "version2_item");
    }

    #[test]
    fn test_lower_camel() {
        assert_eq!(lower_camel("note_id"), "noteId");
        assert_eq!(lower_camel("delivery_note_ids"), "deliveryNoteIds");
        assert_eq!(lower_camel("ids"), "ids");
        assert_eq!(lower_camel("DeleteNote"), "deleteNote");
        assert_eq!(lower_camel("DeleteNotes"), "deleteNotes");
        assert_eq!(lower_camel("_private_key"), "privateKey");
    }
}
