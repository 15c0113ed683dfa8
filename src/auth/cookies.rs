// ABOUTME: Token extraction from cookies and the Authorization header
// ABOUTME: Decodes chunked and base64-prefixed Supabase SSR session cookies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::collections::BTreeMap;

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use bubble_core::constants::supabase;
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SessionCookiePayload {
    access_token: String,
}

/// Iterate over every `name=value` pair across all `Cookie` headers
fn cookie_pairs(headers: &HeaderMap) -> impl Iterator<Item = (&str, &str)> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.trim(), value.trim()))
        })
}

/// Value of the named cookie, if present and non-empty
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    cookie_pairs(headers)
        .find(|(cookie_name, _)| *cookie_name == name)
        .map(|(_, value)| value.to_owned())
        .filter(|value| !value.is_empty())
}

/// Bearer token from the `sb-access-token` cookie, else `Authorization: Bearer`
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = get_cookie_value(headers, supabase::ACCESS_TOKEN_COOKIE) {
        return Some(token);
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

fn session_cookie_base(name: &str) -> Option<&str> {
    let trimmed = match name.rsplit_once('.') {
        Some((base, chunk)) if chunk.chars().all(|c| c.is_ascii_digit()) => base,
        _ => name,
    };
    let is_session = trimmed.starts_with(supabase::SESSION_COOKIE_PREFIX)
        && trimmed.ends_with(supabase::SESSION_COOKIE_SUFFIX);
    is_session.then_some(trimmed)
}

/// Reassemble the SSR session cookie, joining `.0`, `.1`, ... chunks in order
fn session_cookie_raw(headers: &HeaderMap) -> Option<String> {
    let mut whole: Option<String> = None;
    let mut chunks: BTreeMap<u32, &str> = BTreeMap::new();

    for (name, value) in cookie_pairs(headers) {
        let Some(base) = session_cookie_base(name) else {
            continue;
        };
        if base == name {
            whole = Some(value.to_owned());
        } else if let Some(index) = name
            .rsplit_once('.')
            .and_then(|(_, chunk)| chunk.parse::<u32>().ok())
        {
            chunks.insert(index, value);
        }
    }

    if whole.is_some() {
        return whole;
    }
    if chunks.is_empty() {
        return None;
    }
    Some(chunks.into_values().collect())
}

fn decode_base64(encoded: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .or_else(|_| URL_SAFE.decode(encoded))
        .or_else(|_| STANDARD.decode(encoded))
        .ok()
}

/// Access token carried by the SSR session cookie
///
/// The cookie value is either JSON or `base64-` followed by base64 JSON, and
/// may be split across numbered chunks. Anything undecodable yields `None`.
#[must_use]
pub fn session_access_token(headers: &HeaderMap) -> Option<String> {
    let raw = session_cookie_raw(headers)?;
    let json = match raw.strip_prefix(supabase::SESSION_COOKIE_BASE64_PREFIX) {
        Some(encoded) => {
            let bytes = decode_base64(encoded)?;
            String::from_utf8(bytes).ok()?
        }
        None => raw,
    };

    match serde_json::from_str::<SessionCookiePayload>(&json) {
        Ok(payload) if !payload.access_token.is_empty() => Some(payload.access_token),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "Session cookie is not a session payload");
            None
        }
    }
}
