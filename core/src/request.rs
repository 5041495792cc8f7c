/*
 * request.rs
 * Copyright (C) 2026 Edgeflush contributors
 *
 * This file is part of Edgeflush, a client for edge cache invalidation.
 *
 * Edgeflush is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Edgeflush is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Edgeflush.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Request construction: action and target in, a fully specified request out.
//!
//! Building is pure. Nothing here touches the network, so the same client, action, and
//! target always produce the same options modulo the shared agent handle.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::client::EdgeClient;
use crate::error::PurgeError;
use crate::net::Agent;

/// All requests use this method, whatever the action.
pub const METHOD: &str = "PURGE";

/// Remote actions implemented by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Invalidate immediately.
    Purge,
    /// Mark stale instead of evicting.
    SoftPurge,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Purge => "purge",
            Action::SoftPurge => "softPurge",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = PurgeError;

    /// Accepts the published action names; anything else is `UnsupportedAction`.
    fn from_str(s: &str) -> Result<Self, PurgeError> {
        match s {
            "purge" => Ok(Action::Purge),
            "softPurge" | "soft-purge" => Ok(Action::SoftPurge),
            _ => Err(PurgeError::UnsupportedAction),
        }
    }
}

/// Target resource for an action: an already-parsed URL, or a raw string parsed on use.
///
/// Outcomes report the target in its original spelling, so a raw string round-trips
/// as given even though building normalizes it.
#[derive(Debug, Clone)]
pub enum Target {
    Url(Url),
    Raw(String),
}

impl Target {
    /// String form reported in outcomes and logs.
    pub fn as_str(&self) -> &str {
        match self {
            Target::Url(url) => url.as_str(),
            Target::Raw(raw) => raw,
        }
    }

    /// Hostname and path, dropping scheme, port, query, and fragment.
    fn host_and_path(&self) -> Result<(String, String), PurgeError> {
        let parsed;
        let url = match self {
            Target::Url(url) => url,
            Target::Raw(raw) => {
                parsed = Url::parse(raw).map_err(|_| PurgeError::InvalidTarget(raw.clone()))?;
                &parsed
            }
        };
        let host = url
            .host_str()
            .ok_or_else(|| PurgeError::InvalidTarget(self.as_str().to_string()))?;
        Ok((host.to_string(), url.path().to_string()))
    }
}

impl From<Url> for Target {
    fn from(url: Url) -> Self {
        Target::Url(url)
    }
}

impl From<String> for Target {
    fn from(raw: String) -> Self {
        Target::Raw(raw)
    }
}

impl From<&str> for Target {
    fn from(raw: &str) -> Self {
        Target::Raw(raw.to_string())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully specified outbound request, derived once per exchange.
///
/// Headers keep insertion order; serialization writes them as stored.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: &'static str,
    pub hostname: String,
    pub path: String,
    pub headers: Vec<(&'static str, String)>,
    pub port: u16,
    pub auth: Option<String>,
    pub agent: Agent,
}

/// Returns request options for the client, action, and target.
///
/// The credential header is added only when the client holds a non-empty token; soft
/// purge adds its marker header on top of the common set.
pub fn build(client: &EdgeClient, action: Action, target: &Target) -> Result<RequestOptions, PurgeError> {
    let (hostname, path) = target.host_and_path()?;
    let mut headers: Vec<(&'static str, String)> = vec![("accept", "application/json".to_string())];
    if let Some(token) = client.token() {
        if !token.is_empty() {
            headers.push(("Fastly-Key", token.to_string()));
        }
    }
    if action == Action::SoftPurge {
        headers.push(("Fastly-Soft-Purge", "1".to_string()));
    }
    Ok(RequestOptions {
        method: METHOD,
        hostname,
        path,
        headers,
        port: client.port(),
        auth: client.auth().map(str::to_string),
        agent: client.agent().clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_token(token: Option<&str>) -> EdgeClient {
        EdgeClient::new(token.map(str::to_string), None)
    }

    fn header<'a>(options: &'a RequestOptions, name: &str) -> Option<&'a str> {
        options
            .headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn purge_builds_purge_method_without_marker() {
        let client = client_with_token(Some("abc123"));
        let target = Target::from("https://www.example.test/image.jpg");
        let options = build(&client, Action::Purge, &target).unwrap();
        assert_eq!(options.method, "PURGE");
        assert_eq!(options.hostname, "www.example.test");
        assert_eq!(options.path, "/image.jpg");
        assert_eq!(header(&options, "Fastly-Soft-Purge"), None);
    }

    #[test]
    fn soft_purge_adds_marker_header() {
        let client = client_with_token(Some("abc123"));
        let target = Target::from("https://www.example.test/image.jpg");
        let options = build(&client, Action::SoftPurge, &target).unwrap();
        assert_eq!(options.method, "PURGE");
        assert_eq!(header(&options, "Fastly-Soft-Purge"), Some("1"));
    }

    #[test]
    fn token_becomes_credential_header() {
        let client = client_with_token(Some("abc123"));
        let target = Target::from("https://www.example.test/");
        let options = build(&client, Action::Purge, &target).unwrap();
        assert_eq!(header(&options, "Fastly-Key"), Some("abc123"));
    }

    #[test]
    fn missing_or_empty_token_omits_credential_header() {
        let target = Target::from("https://www.example.test/");
        let options = build(&client_with_token(None), Action::Purge, &target).unwrap();
        assert_eq!(header(&options, "Fastly-Key"), None);
        let options = build(&client_with_token(Some("")), Action::Purge, &target).unwrap();
        assert_eq!(header(&options, "Fastly-Key"), None);
    }

    #[test]
    fn header_order_is_deterministic() {
        let client = client_with_token(Some("k"));
        let target = Target::from("https://h.test/");
        let options = build(&client, Action::SoftPurge, &target).unwrap();
        let names: Vec<&str> = options.headers.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["accept", "Fastly-Key", "Fastly-Soft-Purge"]);
    }

    #[test]
    fn target_drops_query_fragment_and_port() {
        let client = client_with_token(None);
        let target = Target::from("https://h.test:8443/a/b?q=1#frag");
        let options = build(&client, Action::Purge, &target).unwrap();
        assert_eq!(options.hostname, "h.test");
        assert_eq!(options.path, "/a/b");
    }

    #[test]
    fn bare_origin_gets_root_path() {
        let client = client_with_token(None);
        let options = build(&client, Action::Purge, &Target::from("https://h.test")).unwrap();
        assert_eq!(options.path, "/");
    }

    #[test]
    fn parsed_url_target_is_accepted() {
        let client = client_with_token(None);
        let url = Url::parse("https://h.test/x").unwrap();
        let options = build(&client, Action::Purge, &Target::from(url)).unwrap();
        assert_eq!(options.hostname, "h.test");
        assert_eq!(options.path, "/x");
    }

    #[test]
    fn unparseable_target_is_rejected() {
        let client = client_with_token(None);
        let result = build(&client, Action::Purge, &Target::from("not a url"));
        assert!(matches!(result, Err(PurgeError::InvalidTarget(_))));
    }

    #[test]
    fn hostless_target_is_rejected() {
        let client = client_with_token(None);
        let result = build(&client, Action::Purge, &Target::from("mailto:user@example.test"));
        assert!(matches!(result, Err(PurgeError::InvalidTarget(_))));
    }

    #[test]
    fn raw_target_reports_original_spelling() {
        let target = Target::from("https://h.test/x?keep=me");
        assert_eq!(target.as_str(), "https://h.test/x?keep=me");
    }

    #[test]
    fn config_port_and_auth_are_copied() {
        let mut client = EdgeClient::new(None, Some("user:pass".to_string()));
        client.set_port(8443);
        let options = build(&client, Action::Purge, &Target::from("https://h.test/")).unwrap();
        assert_eq!(options.port, 8443);
        assert_eq!(options.auth.as_deref(), Some("user:pass"));
    }

    #[test]
    fn action_names_parse() {
        assert_eq!("purge".parse::<Action>().unwrap(), Action::Purge);
        assert_eq!("softPurge".parse::<Action>().unwrap(), Action::SoftPurge);
        assert_eq!("soft-purge".parse::<Action>().unwrap(), Action::SoftPurge);
        assert!(matches!(
            "ban".parse::<Action>(),
            Err(PurgeError::UnsupportedAction)
        ));
    }
}
