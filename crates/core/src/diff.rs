//! Helpers over git-style unified diffs.
//!
//! A diff is a sequence of file sections, each opened by a
//! `diff --git a/<old> b/<new>` header. Everything here works at section
//! granularity: a file is either carried over whole or dropped.

const FILE_HEADER: &str = "diff --git ";

/// Whether a `diff --git` header names a path under `prefix`, on either side.
pub fn header_touches_prefix(line: &str, prefix: &str) -> bool {
    header_paths(line).is_some_and(|(old, new)| old.starts_with(prefix) || new.starts_with(prefix))
}

/// Old and new path of a `diff --git` header, without their `a/`/`b/`
/// components.
///
/// Git wraps a path in double quotes and C-escapes it when it contains
/// control characters, quotes, backslashes or non-ASCII bytes; such paths are
/// unquoted here. Unquoted paths may contain spaces.
pub fn header_paths(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix(FILE_HEADER)?.trim_end_matches(['\r', '\n']);

    let (old, new) = if let Some(quoted) = rest.strip_prefix('"') {
        let (old, tail) = unquote(quoted)?;
        let tail = tail.strip_prefix(' ')?;
        let new = match tail.strip_prefix('"') {
            Some(quoted) => unquote(quoted)?.0,
            None => tail.to_string(),
        };
        (old, new)
    } else if let Some(split) = rest.find(" \"b/") {
        let (new, _) = unquote(&rest[split + 2..])?;
        (rest[..split].to_string(), new)
    } else {
        let split = split_unquoted(rest)?;
        (rest[..split].to_string(), rest[split + 1..].to_string())
    };

    Some((
        old.strip_prefix("a/")?.to_string(),
        new.strip_prefix("b/")?.to_string(),
    ))
}

/// Byte index of the space separating two unquoted header paths.
fn split_unquoted(rest: &str) -> Option<usize> {
    // Same path on both sides: "a/<p> b/<p>".
    let mid = rest.len() / 2;
    if rest.len() % 2 == 1
        && rest.as_bytes()[mid] == b' '
        && rest.get(2..mid) == rest.get(mid + 3..)
        && rest.get(mid + 1..mid + 3) == Some("b/")
    {
        return Some(mid);
    }
    rest.find(" b/")
}

/// Undo git's C-style quoting. `quoted` starts right after the opening quote;
/// returns the decoded path and the text after the closing quote.
fn unquote(quoted: &str) -> Option<(String, &str)> {
    let bytes = quoted.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let path = String::from_utf8_lossy(&decoded).into_owned();
                return Some((path, &quoted[i + 1..]));
            }
            b'\\' => {
                let escaped = *bytes.get(i + 1)?;
                i += 2;
                match escaped {
                    b'0'..=b'7' => {
                        let digits = quoted.get(i - 1..i + 2)?;
                        decoded.push(u8::from_str_radix(digits, 8).ok()?);
                        i += 2;
                    }
                    b'n' => decoded.push(b'\n'),
                    b't' => decoded.push(b'\t'),
                    b'r' => decoded.push(b'\r'),
                    b'a' => decoded.push(0x07),
                    b'b' => decoded.push(0x08),
                    b'f' => decoded.push(0x0c),
                    b'v' => decoded.push(0x0b),
                    other => decoded.push(other),
                }
            }
            byte => {
                decoded.push(byte);
                i += 1;
            }
        }
    }

    None
}

/// True iff any file header of `diff` names a path beginning with `prefix`.
pub fn contains_upstreamable_changes(diff: &str, prefix: &str) -> bool {
    diff.lines()
        .any(|line| header_touches_prefix(line, prefix))
}

/// Keep only the file sections of `diff` whose paths fall under `prefix`.
///
/// Text before the first file header (mail headers, stat summaries) is
/// dropped. Line endings are preserved byte for byte.
pub fn filter_to_prefix(diff: &str, prefix: &str) -> String {
    let mut filtered = String::with_capacity(diff.len());
    let mut keep = false;

    for line in diff.split_inclusive('\n') {
        if line.starts_with(FILE_HEADER) {
            keep = header_touches_prefix(line, prefix);
        }
        if keep {
            filtered.push_str(line);
        }
    }

    filtered
}

/// Number of leading path components `git apply -p` must strip so that paths
/// under `prefix` land at the root of the upstream repository.
///
/// Counts the `a/`/`b/` component plus one per directory in `prefix`, which
/// must end with `/`.
pub fn strip_count(prefix: &str) -> usize {
    prefix.matches('/').count() + 1
}

/// Paths named by the file headers of `diff`, new side.
pub fn touched_paths(diff: &str) -> Vec<String> {
    diff.lines()
        .filter_map(header_paths)
        .map(|(_, new)| new)
        .collect()
}
