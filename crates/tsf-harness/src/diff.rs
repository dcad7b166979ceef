//! Diff rendering for fixture comparison.
//!
//! Formatter output is usually one line, so besides a per-line diff the
//! rendering points at the first differing byte. Control characters are
//! shown escaped so padding and NUL differences are visible.

/// Render a text diff between expected and actual output.
#[must_use]
pub fn render_diff(expected: &str, actual: &str) -> String {
    if expected == actual {
        return String::from("[identical]");
    }

    let mut out = String::new();
    out.push_str("--- expected\n");
    out.push_str("+++ actual\n");

    let expected_lines: Vec<&str> = expected.split('\n').collect();
    let actual_lines: Vec<&str> = actual.split('\n').collect();
    for i in 0..expected_lines.len().max(actual_lines.len()) {
        let e = expected_lines.get(i).copied();
        let a = actual_lines.get(i).copied();
        if e == a {
            continue;
        }
        out.push_str(&format!("@@ line {} @@\n", i + 1));
        if let Some(e) = e {
            out.push_str(&format!("-{}\n", visible(e)));
        }
        if let Some(a) = a {
            out.push_str(&format!("+{}\n", visible(a)));
        }
    }

    let offset = expected
        .bytes()
        .zip(actual.bytes())
        .position(|(e, a)| e != a)
        .unwrap_or(expected.len().min(actual.len()));
    out.push_str(&format!(
        "first difference at byte {offset} (expected {} bytes, got {})\n",
        expected.len(),
        actual.len()
    ));
    out
}

fn visible(line: &str) -> String {
    line.chars().flat_map(char::escape_debug).collect()
}
