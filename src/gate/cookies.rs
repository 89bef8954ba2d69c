//! Cookie jar parsing, Set-Cookie splitting, token extraction, and cookie
//! mirroring.
//!
//! Mirroring re-issues a token received from the upstream identity service as
//! a cookie scoped to the serving origin: always `Path=/`, always `HttpOnly`,
//! never a `Domain` attribute, `Secure` and `SameSite` per configuration.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use regex::Regex;
use serde_json::Value;

use crate::gate::config::GateConfig;

/// First-party access cookie on the serving origin. Matches the name
/// upstream uses, so forwarded-cookie verification needs no renaming.
pub const ACCESS_COOKIE: &str = "access_token";
/// First-party refresh cookie on the serving origin.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Names an earlier revision of the hub issued. Still accepted on inbound
/// requests so signed-in users survive the migration.
pub const LEGACY_ACCESS_COOKIE: &str = "allstar_at";
pub const LEGACY_REFRESH_COOKIE: &str = "allstar_rt";

/// Recognized names for each credential, in precedence order. Consulted
/// only here; routes never re-implement the aliasing.
pub const ACCESS_ALIASES: [&str; 2] = [ACCESS_COOKIE, LEGACY_ACCESS_COOKIE];
pub const REFRESH_ALIASES: [&str; 2] = [REFRESH_COOKIE, LEGACY_REFRESH_COOKIE];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lax => "Lax",
            Self::Strict => "Strict",
            Self::None => "None",
        }
    }
}

/// Where an extracted token came from. Upstream revisions are inconsistent,
/// so extraction records the channel that won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    HeaderEntries,
    FlattenedHeader,
    JsonBody,
    QueryParam,
}

/// A token pulled out of an upstream response, with whatever `Max-Age` the
/// upstream attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedToken {
    pub value: String,
    pub max_age: Option<i64>,
    pub source: TokenSource,
}

/// Tokens harvested from one upstream response.
#[derive(Debug, Default)]
pub struct TokenHarvest {
    pub access: Option<ExtractedToken>,
    pub refresh: Option<ExtractedToken>,
}

/// The only artifact this service writes: a Set-Cookie directive bound to
/// the serving origin. A `Domain` attribute is unrepresentable on purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieDirective {
    pub name: String,
    pub value: String,
    pub same_site: SameSite,
    pub secure: bool,
    pub max_age: Option<i64>,
}

impl CookieDirective {
    /// Render the directive as a Set-Cookie header value.
    /// # Errors
    /// Returns an error if the token value is not a valid header value.
    pub fn header_value(&self) -> std::result::Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite={}",
            self.name,
            self.value,
            self.same_site.as_str()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        if let Some(max_age) = self.max_age {
            cookie.push_str(&format!("; Max-Age={max_age}"));
        }
        HeaderValue::from_str(&cookie)
    }
}

/// Translate an upstream-minted token into a locally-scoped cookie directive.
///
/// When upstream omitted a `Max-Age`, a configured default applies so the
/// cookie does not degrade into a session-only cookie: short for access
/// tokens, long for refresh tokens.
#[must_use]
pub fn mirror(
    config: &GateConfig,
    name: &str,
    token: &ExtractedToken,
    kind: TokenKind,
) -> CookieDirective {
    let max_age = token.max_age.unwrap_or(match kind {
        TokenKind::Access => config.access_max_age(),
        TokenKind::Refresh => config.refresh_max_age(),
    });

    CookieDirective {
        name: name.to_string(),
        value: token.value.clone(),
        same_site: config.same_site(),
        secure: config.cookie_secure(),
        max_age: Some(max_age),
    }
}

/// A directive that expires a stale cookie immediately.
#[must_use]
pub fn clear(config: &GateConfig, name: &str) -> CookieDirective {
    CookieDirective {
        name: name.to_string(),
        value: String::new(),
        same_site: config.same_site(),
        secure: config.cookie_secure(),
        max_age: Some(0),
    }
}

/// The inbound request's cookies, parsed once per request. Request-scoped;
/// nothing here outlives the request.
#[derive(Debug, Default)]
pub struct CookieJar(Vec<(String, String)>);

impl CookieJar {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut pairs = Vec::new();
        for header in headers.get_all(COOKIE) {
            let Ok(raw) = header.to_str() else { continue };
            for pair in raw.split(';') {
                let mut parts = pair.trim().splitn(2, '=');
                let (Some(name), Some(value)) = (parts.next(), parts.next()) else {
                    continue;
                };
                pairs.push((name.trim().to_string(), value.trim().to_string()));
            }
        }
        Self(pairs)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn first_of(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.get(name))
    }

    /// The access credential under any recognized alias.
    #[must_use]
    pub fn access(&self) -> Option<&str> {
        self.first_of(&ACCESS_ALIASES)
    }

    /// The refresh credential under any recognized alias.
    #[must_use]
    pub fn refresh(&self) -> Option<&str> {
        self.first_of(&REFRESH_ALIASES)
    }

    /// Recognized credential cookies present in the jar, for clearing when a
    /// request is denied.
    #[must_use]
    pub fn stale_credentials(&self) -> Vec<&'static str> {
        ACCESS_ALIASES
            .iter()
            .chain(REFRESH_ALIASES.iter())
            .filter(|name| self.get(name).is_some())
            .copied()
            .collect()
    }
}

/// Split a Set-Cookie header that may carry several cookies flattened into
/// one value.
///
/// Splitting happens only before a `name=` pattern that follows a comma,
/// never on every comma: attribute values such as `Expires` dates contain
/// commas of their own.
#[must_use]
pub fn split_set_cookie(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let Ok(boundary) = Regex::new(r",\s*[^;,\s=]+=") else {
        return vec![trimmed.to_string()];
    };

    let mut parts = Vec::new();
    let mut start = 0;
    for found in boundary.find_iter(raw) {
        parts.push(&raw[start..found.start()]);
        // skip the comma, keep the `name=` with the next cookie
        start = found.start() + 1;
    }
    parts.push(&raw[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse one Set-Cookie line into its cookie pair and `Max-Age`, if any.
fn parse_set_cookie(line: &str) -> Option<(String, String, Option<i64>)> {
    let mut segments = line.split(';');
    let mut pair = segments.next()?.trim().splitn(2, '=');
    let name = pair.next()?.trim();
    let value = pair.next()?.trim();
    if name.is_empty() {
        return None;
    }

    let max_age = segments.find_map(|segment| {
        let mut attr = segment.trim().splitn(2, '=');
        let key = attr.next()?.trim();
        if key.eq_ignore_ascii_case("max-age") {
            attr.next()?.trim().parse::<i64>().ok()
        } else {
            None
        }
    });

    Some((name.to_string(), value.to_string(), max_age))
}

/// Extract access and refresh tokens from an upstream response.
///
/// Upstream revisions return tokens through different channels, so each is
/// tried in a fixed priority order: individual Set-Cookie header entries,
/// then cookies re-split out of a flattened Set-Cookie value, then the JSON
/// body's `access`/`refresh` fields. Header wins over body; the source
/// material never settled on one convention, so the choice is made here once
/// and nowhere else.
#[must_use]
pub fn harvest_tokens(headers: &HeaderMap, body: Option<&Value>) -> TokenHarvest {
    let mut harvest = TokenHarvest::default();

    for entry in headers.get_all(SET_COOKIE) {
        let Ok(raw) = entry.to_str() else { continue };
        let lines = split_set_cookie(raw);
        // Classified per entry: one header value that re-split into several
        // cookies was flattened, whatever its neighbors look like.
        let source = if lines.len() > 1 {
            TokenSource::FlattenedHeader
        } else {
            TokenSource::HeaderEntries
        };
        for line in lines {
            let Some((name, value, max_age)) = parse_set_cookie(&line) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            let token = ExtractedToken {
                value,
                max_age,
                source,
            };
            if name == ACCESS_COOKIE && harvest.access.is_none() {
                harvest.access = Some(token);
            } else if name == REFRESH_COOKIE && harvest.refresh.is_none() {
                harvest.refresh = Some(token);
            }
        }
    }

    if let Some(body) = body {
        if harvest.access.is_none() {
            harvest.access = body_token(body, "access");
        }
        if harvest.refresh.is_none() {
            harvest.refresh = body_token(body, "refresh");
        }
    }

    harvest
}

fn body_token(body: &Value, field: &str) -> Option<ExtractedToken> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(|value| ExtractedToken {
            value: value.to_string(),
            max_age: None,
            source: TokenSource::JsonBody,
        })
}
