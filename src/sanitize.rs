/// Substitution applied to a single character when building safe names
///
/// The table deliberately rewrites rather than strips where a readable
/// replacement exists ("&" becomes "and", "*" becomes "x") so that titles
/// stay recognizable after sanitization.
fn substitute(c: char) -> Option<&'static str> {
    match c {
        ':' | '/' | '\\' | '<' | '>' | '|' | ';' | '=' | '~' => Some("-"),
        '?' | '"' | '\'' | '#' | '$' | '%' | '^' | '`' => Some(""),
        '*' => Some("x"),
        '&' => Some("and"),
        '@' => Some("at"),
        '+' => Some("plus"),
        '[' | '{' => Some("("),
        ']' | '}' => Some(")"),
        _ => None,
    }
}

/// Map arbitrary text to a filesystem-safe name
///
/// Applies the fixed substitution table, collapses repeated dashes and
/// whitespace runs, then trims leading/trailing dashes and spaces.
/// Idempotent: `sanitize_name(sanitize_name(x)) == sanitize_name(x)`.
pub fn sanitize_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for c in name.chars() {
        match substitute(c) {
            Some(replacement) => result.push_str(replacement),
            None => result.push(c),
        }
    }

    while result.contains("--") {
        result = result.replace("--", "-");
    }

    let collapsed = result.split_whitespace().collect::<Vec<_>>().join(" ");

    collapsed.trim_matches(['-', ' ']).to_string()
}
