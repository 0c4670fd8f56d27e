use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

/// One URL slated for capture. Immutable once created by [`parse_targets`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureTarget {
    pub sequence_index: usize,
    pub raw_url: String,
    pub normalized_url: String,
}

impl CaptureTarget {
    /// Host of the normalized URL, or `None` for rejected lines.
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.normalized_url)
            .ok()
            .and_then(|url| url.host_str().map(ToOwned::to_owned))
    }
}

/// A unique input line that could not be turned into an absolute http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub target: CaptureTarget,
    pub reason: String,
}

/// Parsed input: valid targets plus rejected lines, sharing one contiguous
/// `sequence_index` space in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetList {
    pub targets: Vec<CaptureTarget>,
    pub rejected: Vec<RejectedLine>,
}

impl TargetList {
    pub fn total(&self) -> usize {
        self.targets.len() + self.rejected.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no usable URLs in input ({rejected} line(s) rejected)")]
pub struct InvalidInputError {
    pub rejected: usize,
}

/// Split `raw` into lines, drop blanks and `#` comments, normalize and dedupe.
pub fn parse_targets(raw: &str) -> Result<TargetList, InvalidInputError> {
    let mut list = TargetList::default();
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut seen_rejected: HashSet<String> = HashSet::new();
    let mut next_index = 0usize;

    for line in raw.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match normalize_url(line) {
            Ok(url) => {
                if !seen_keys.insert(dedupe_key(&url)) {
                    continue;
                }
                list.targets.push(CaptureTarget {
                    sequence_index: next_index,
                    raw_url: line.to_string(),
                    normalized_url: url.to_string(),
                });
            }
            Err(reason) => {
                if !seen_rejected.insert(line.to_string()) {
                    continue;
                }
                list.rejected.push(RejectedLine {
                    target: CaptureTarget {
                        sequence_index: next_index,
                        raw_url: line.to_string(),
                        normalized_url: line.to_string(),
                    },
                    reason,
                });
            }
        }
        next_index += 1;
    }

    if list.targets.is_empty() {
        return Err(InvalidInputError {
            rejected: list.rejected.len(),
        });
    }
    Ok(list)
}

/// Canonical absolute form: `https://` when no scheme is given, fragment dropped.
pub fn normalize_url(input: &str) -> Result<Url, String> {
    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{input}")
    };
    let mut url = Url::parse(&candidate).map_err(|err| format!("invalid url: {err}"))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme {other}")),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("invalid url: missing host".to_string());
    }
    url.set_fragment(None);
    Ok(url)
}

/// Scheme-insensitive identity used for deduplication.
pub fn dedupe_key(url: &Url) -> String {
    let rest = &url[url::Position::BeforeUsername..];
    match rest.split_once('?') {
        Some((path, query)) => format!("{}?{query}", path.trim_end_matches('/')),
        None => rest.trim_end_matches('/').to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{dedupe_key, normalize_url};

    #[test]
    fn missing_scheme_defaults_to_https() {
        let url = normalize_url("Example.COM/path").unwrap();
        assert_eq!(url.as_str(), "https://example.com/path");
    }

    #[test]
    fn host_port_without_scheme_is_not_a_scheme() {
        let url = normalize_url("localhost:8080").unwrap();
        assert_eq!(url.as_str(), "https://localhost:8080/");
    }

    #[test]
    fn fragment_is_dropped() {
        let url = normalize_url("http://a.com/x#top").unwrap();
        assert_eq!(url.as_str(), "http://a.com/x");
    }

    #[test]
    fn non_web_scheme_rejected() {
        assert!(normalize_url("ftp://a.com").is_err());
    }

    #[test]
    fn dedupe_key_ignores_scheme_and_trailing_slash() {
        let a = normalize_url("http://a.com").unwrap();
        let b = normalize_url("https://a.com/").unwrap();
        assert_eq!(dedupe_key(&a), dedupe_key(&b));
        assert_eq!(dedupe_key(&a), "a.com");
    }

    #[test]
    fn dedupe_key_keeps_query() {
        let a = normalize_url("a.com/?q=1").unwrap();
        let b = normalize_url("a.com/?q=2").unwrap();
        assert_ne!(dedupe_key(&a), dedupe_key(&b));
    }
}
