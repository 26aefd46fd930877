//! JSON-API content negotiation.
//!
//! Clients may send `ext` and `profile` on the JSON-API media type and nothing
//! else; `Accept` must list the media type at least once without foreign
//! parameters, and repeated `Accept` headers are read as one list. A message
//! carries at most one `Content-Type`. Servers must answer with the bare
//! media type. Parsing never panics: anything that does not
//! look like a media type list is reported as `MalformedHeader`.

use std::collections::BTreeSet;

use crate::error::NegotiationViolation;
use crate::http::{header_values, MEDIA_TYPE};

/// One media range with its parameters, names lower-cased and values unquoted.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MediaRange {
    essence: String,
    params: Vec<(String, String)>,
}

impl MediaRange {
    fn is_json_api(&self) -> bool {
        self.essence == MEDIA_TYPE
    }
}

/// Check outgoing headers against the client-side rules.
///
/// `Accept` entries for the JSON-API media type that carry parameters other
/// than `ext`, `profile` or `q` are ignored; the header fails only when no
/// usable JSON-API entry remains.
pub fn check_request(
    headers: &[(String, String)],
    extensions: &BTreeSet<String>,
) -> Result<(), NegotiationViolation> {
    if let Some(value) = content_type(headers)? {
        let range = parse_single(value).ok_or_else(|| malformed("Content-Type", value))?;
        if !range.is_json_api() {
            return Err(NegotiationViolation::ContentTypeMediaType(range.essence));
        }
        for (name, value) in &range.params {
            match name.as_str() {
                "ext" => check_extensions(value, extensions)?,
                "profile" => {}
                _ => return Err(NegotiationViolation::ContentTypeParameter(name.clone())),
            }
        }
    }

    // A repeated list header means the same as one header joined with ','.
    let accept: Vec<&str> = header_values(headers, "accept").collect();
    if !accept.is_empty() {
        let value = accept.join(",");
        let ranges = parse_list(&value).ok_or_else(|| malformed("Accept", &value))?;
        let mut found = false;
        let mut skipped = None;
        for range in ranges.iter().filter(|range| range.is_json_api()) {
            let foreign = range
                .params
                .iter()
                .find(|(name, _)| !matches!(name.as_str(), "ext" | "profile" | "q"));
            if let Some((name, _)) = foreign {
                skipped.get_or_insert_with(|| name.clone());
                continue;
            }
            for (_, value) in range.params.iter().filter(|(name, _)| name == "ext") {
                check_extensions(value, extensions)?;
            }
            found = true;
        }
        if !found {
            return Err(match skipped {
                Some(name) => NegotiationViolation::AcceptParameter(name),
                None => NegotiationViolation::AcceptMissingJsonApi,
            });
        }
    }

    Ok(())
}

/// Check incoming headers against the server-side rule: a `Content-Type` of
/// exactly the JSON-API media type.
pub fn check_response(headers: &[(String, String)]) -> Result<(), NegotiationViolation> {
    let value = content_type(headers)?.ok_or(NegotiationViolation::MissingContentType)?;
    let range = parse_single(value).ok_or_else(|| malformed("Content-Type", value))?;
    if !range.is_json_api() {
        return Err(NegotiationViolation::ContentTypeMediaType(range.essence));
    }
    match range.params.into_iter().next() {
        Some((name, _)) => Err(NegotiationViolation::ContentTypeParameter(name)),
        None => Ok(()),
    }
}

/// The single `Content-Type` value, if any. Repeats are malformed.
fn content_type(headers: &[(String, String)]) -> Result<Option<&str>, NegotiationViolation> {
    let mut values = header_values(headers, "content-type");
    let first = values.next();
    if values.next().is_some() {
        let all: Vec<&str> = header_values(headers, "content-type").collect();
        return Err(malformed("Content-Type", &all.join(", ")));
    }
    Ok(first)
}

fn check_extensions(value: &str, extensions: &BTreeSet<String>) -> Result<(), NegotiationViolation> {
    match value.split_whitespace().find(|uri| !extensions.contains(*uri)) {
        Some(unknown) => Err(NegotiationViolation::UnsupportedExtension(unknown.to_string())),
        None => Ok(()),
    }
}

fn malformed(name: &str, value: &str) -> NegotiationViolation {
    NegotiationViolation::MalformedHeader {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn parse_single(value: &str) -> Option<MediaRange> {
    let mut ranges = parse_list(value)?;
    if ranges.len() != 1 {
        return None;
    }
    ranges.pop()
}

fn parse_list(value: &str) -> Option<Vec<MediaRange>> {
    split_outside_quotes(value, ',')?
        .into_iter()
        .map(parse_range)
        .collect()
}

fn parse_range(raw: &str) -> Option<MediaRange> {
    let mut parts = split_outside_quotes(raw, ';')?.into_iter();
    let essence = parts.next()?.trim().to_ascii_lowercase();
    let (kind, subtype) = essence.split_once('/')?;
    if !is_token(kind) || !is_token(subtype) {
        return None;
    }

    let mut params = Vec::new();
    for part in parts {
        let (name, value) = part.split_once('=')?;
        let name = name.trim().to_ascii_lowercase();
        if !is_token(&name) {
            return None;
        }
        params.push((name, unquote(value.trim())?));
    }
    Some(MediaRange { essence, params })
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

fn unquote(value: &str) -> Option<String> {
    match value.strip_prefix('"') {
        Some(rest) => {
            let inner = rest.strip_suffix('"')?;
            let mut out = String::with_capacity(inner.len());
            let mut chars = inner.chars();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => out.push(chars.next()?),
                    '"' => return None,
                    c => out.push(c),
                }
            }
            Some(out)
        }
        None if is_token(value) => Some(value.to_string()),
        None => None,
    }
}

/// Split on `sep` except inside quoted strings. `None` on an unterminated quote.
fn split_outside_quotes(value: &str, sep: char) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            c if c == sep && !quoted => {
                parts.push(&value[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if quoted {
        return None;
    }
    parts.push(&value[start..]);
    Some(parts)
}
