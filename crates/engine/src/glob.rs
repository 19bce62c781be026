/// Match a path glob against a whole path. Supports `*`, `?`, and `[...]`
/// character classes (including negation with `!` or `^`). Wildcards never
/// match the `/` separator, so `/data/*` matches `/data/x` but not
/// `/data/x/y`.
pub(crate) fn glob_match(pattern: &str, path: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = path.chars().collect();
    glob_match_inner(&pat, &txt)
}

fn glob_match_inner(pat: &[char], txt: &[char]) -> bool {
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < txt.len() {
        let step = match pat.get(pi) {
            Some('?') if txt[ti] != '/' => Some(1),
            Some('*') => {
                star = Some((pi, ti));
                pi += 1;
                continue;
            }
            Some('[') => match match_bracket(&pat[pi..], txt[ti]) {
                Some((true, len)) => Some(len),
                Some((false, _)) => None,
                // Malformed bracket, treat as literal
                None if txt[ti] == '[' => Some(1),
                None => None,
            },
            Some('\\') if pat.get(pi + 1) == Some(&txt[ti]) => Some(2),
            Some(&c) if c == txt[ti] && c != '?' && c != '\\' => Some(1),
            _ => None,
        };
        match step {
            Some(len) => {
                pi += len;
                ti += 1;
            }
            // Let the last star absorb one more character, unless that
            // character is a separator.
            None => match star {
                Some((star_pi, star_ti)) if txt[star_ti] != '/' => {
                    star = Some((star_pi, star_ti + 1));
                    pi = star_pi + 1;
                    ti = star_ti + 1;
                }
                _ => return false,
            },
        }
    }

    while pat.get(pi) == Some(&'*') {
        pi += 1;
    }
    pi == pat.len()
}

/// Try to match a bracket expression `[...]` at the start of `pat` against
/// character `ch`. Returns `Some((matched, chars_consumed))` or `None` if
/// the bracket is malformed (no closing `]`).
fn match_bracket(pat: &[char], ch: char) -> Option<(bool, usize)> {
    // pat[0] == '['
    let mut i = 1;
    let negate = matches!(pat.get(i), Some('!' | '^'));
    if negate {
        i += 1;
    }

    let mut matched = false;
    // A ']' immediately after '[' (or '[!' / '[^') is treated as literal
    if pat.get(i) == Some(&']') {
        matched = ch == ']';
        i += 1;
    }

    while i < pat.len() && pat[i] != ']' {
        if i + 2 < pat.len() && pat[i + 1] == '-' && pat[i + 2] != ']' {
            // Range: [a-z]
            matched |= (pat[i]..=pat[i + 2]).contains(&ch);
            i += 3;
        } else {
            matched |= pat[i] == ch;
            i += 1;
        }
    }

    if i < pat.len() {
        Some(((matched ^ negate) && ch != '/', i + 1))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::glob_match;

    #[test]
    fn star_stays_within_segment() {
        assert!(glob_match("/data/*", "/data/file.txt"));
        assert!(!glob_match("/data/*", "/data/sub/file.txt"));
        assert!(glob_match("/data/*/*.log", "/data/sub/app.log"));
        assert!(glob_match("/home/*/project", "/home/alice/project"));
        assert!(!glob_match("/home/*/project", "/home/alice/x/project"));
    }

    #[test]
    fn question_mark_and_classes() {
        assert!(glob_match("/tmp/file?.txt", "/tmp/file1.txt"));
        assert!(!glob_match("/tmp/a?b", "/tmp/a/b"));
        assert!(glob_match("/srv/[a-c]*", "/srv/build"));
        assert!(!glob_match("/srv/[!a-c]*", "/srv/build"));
        assert!(glob_match("/srv/[^a-c]*", "/srv/dist"));
        assert!(!glob_match("/srv[!x]y", "/srv/y"));
    }

    #[test]
    fn exact_and_escaped() {
        assert!(glob_match("/opt/app", "/opt/app"));
        assert!(!glob_match("/opt/app", "/opt/app/bin"));
        assert!(glob_match("/opt/\\*", "/opt/*"));
        assert!(!glob_match("/opt/\\*", "/opt/x"));
        assert!(glob_match("/opt/[x", "/opt/[x"));
    }

    #[test]
    fn backtracking() {
        assert!(glob_match("*x/*", "axbx/c"));
        assert!(glob_match("/var/*.log", "/var/a.b.log"));
        assert!(!glob_match("/var/*.log", "/var/a.b.txt"));
    }
}
