/// Extension used for every captured image.
pub const IMAGE_EXTENSION: &str = "jpg";

/// Windows-safe, deterministic image name: `{sanitized_host}_{index:04}.jpg`.
///
/// The sequence index keeps names unique when several targets share a host.
pub fn capture_filename(host: Option<&str>, sequence_index: usize) -> String {
    let sanitized = sanitize_host(host.unwrap_or("unknown"));
    format!("{sanitized}_{sequence_index:04}.{IMAGE_EXTENSION}")
}

fn sanitize_host(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut compacted = String::with_capacity(replaced.len());
    let mut prev_underscore = false;
    for c in replaced.trim_matches(&['_', '.'][..]).chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }

    if compacted.is_empty() {
        compacted = "unknown".to_string();
    }
    compacted.truncate(80);
    if is_reserved_windows_name(&compacted) {
        compacted.push('_');
    }
    compacted
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::capture_filename;

    #[test]
    fn host_and_index_make_the_name() {
        assert_eq!(capture_filename(Some("example.com"), 3), "example.com_0003.jpg");
    }

    #[test]
    fn same_host_different_index_differs() {
        assert_ne!(
            capture_filename(Some("a.com"), 1),
            capture_filename(Some("a.com"), 2)
        );
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(capture_filename(Some("[::1]"), 0), "1_0000.jpg");
        assert_eq!(capture_filename(Some("bücher.de"), 12), "b_cher.de_0012.jpg");
    }

    #[test]
    fn missing_or_reserved_hosts_stay_usable() {
        assert_eq!(capture_filename(None, 7), "unknown_0007.jpg");
        assert_eq!(capture_filename(Some("con"), 1), "con__0001.jpg");
    }
}
