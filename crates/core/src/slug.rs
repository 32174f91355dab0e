//! URL-safe project slugs.
//!
//! A slug is derived from the project name and must be unique across all
//! projects. Collisions are resolved by appending `-2`, `-3`, ... to the base.
//! Slugs are lowercase ASCII and never purely numeric, so a path segment of
//! digits always means an id.

/// Fallback used when a name contains no alphanumeric characters, and prefix
/// for names made only of digits.
const EMPTY_SLUG: &str = "project";

/// ASCII spelling of common accented Latin letters.
fn fold(c: char) -> Option<&'static str> {
    Some(match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => "a",
        'æ' => "ae",
        'ç' | 'č' | 'ć' => "c",
        'ď' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ě' | 'ę' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' => "i",
        'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ß' => "ss",
        'š' | 'ś' => "s",
        'ť' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ž' | 'ź' | 'ż' => "z",
        'þ' => "th",
        _ => return None,
    })
}

/// Convert a name to a URL-safe slug.
///
/// ```
/// use worklog_core::slug::slugify;
///
/// assert_eq!(slugify("My Project"), "my-project");
/// assert_eq!(slugify("  Tax  Return (2024)!"), "tax-return-2024");
/// assert_eq!(slugify("2024"), "project-2024");
/// ```
pub fn slugify(name: &str) -> String {
    let mut ascii = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            ascii.push(c);
        } else if let Some(folded) = fold(c) {
            ascii.push_str(folded);
        } else {
            ascii.push('-');
        }
    }

    let slug = ascii
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else if slug.bytes().all(|b| b.is_ascii_digit()) {
        format!("{EMPTY_SLUG}-{slug}")
    } else {
        slug
    }
}

/// Pick the first free slug for `base` given the slugs already taken.
///
/// `taken` only needs to contain slugs sharing the `base` prefix; anything
/// else is ignored.
pub fn unique_slug<S: AsRef<str>>(base: &str, taken: &[S]) -> String {
    let is_taken = |candidate: &str| taken.iter().any(|s| s.as_ref() == candidate);

    if !is_taken(base) {
        return base.to_string();
    }

    let mut suffix = 2u32;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !is_taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Whether a path segment looks like a numeric id rather than a slug.
pub fn parse_numeric_key(key: &str) -> Option<i64> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}
