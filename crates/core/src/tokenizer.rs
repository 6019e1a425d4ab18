/// Delimiters used for pattern detection and template expansion.
pub const DEFAULT_DELIMITERS: &[char] = &['-', '_', ' '];

/// Older delimiter set that treated dots as separators.
pub const LEGACY_DELIMITERS: &[char] = &['-', '_', '.'];

/// Splits `name` at its last dot. The extension keeps the dot. A name without
/// a dot, or whose only dot is the first character, has no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    }
}

pub fn tokenize(name: &str) -> Vec<String> {
    tokenize_with(name, DEFAULT_DELIMITERS)
}

/// Strips the extension and splits the base name on runs of `delimiters`.
///
/// Leading or trailing delimiters yield empty tokens and an empty name yields
/// a single empty token, so the result is never empty.
pub fn tokenize_with(name: &str, delimiters: &[char]) -> Vec<String> {
    let (base, _) = split_extension(name);

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_run = false;

    for ch in base.chars() {
        if delimiters.contains(&ch) {
            if !in_run {
                tokens.push(std::mem::take(&mut current));
                in_run = true;
            }
        } else {
            in_run = false;
            current.push(ch);
        }
    }
    tokens.push(current);

    tokens
}

/// Picks the separator a batch most likely uses, checking `-`, then `_`, then
/// space. Returns an empty string when the name has none of them.
pub fn detect_delimiter(name: &str) -> String {
    let (base, _) = split_extension(name);
    ['-', '_', ' ']
        .into_iter()
        .find(|d| base.contains(*d))
        .map(String::from)
        .unwrap_or_default()
}
