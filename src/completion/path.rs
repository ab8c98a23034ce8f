pub const SEPARATOR: char = '/';

/// A partial path split at its last separator.
///
/// `parent` keeps the text exactly as typed (including the trailing
/// separator) so a resolved completion can be spliced back onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialPath<'a> {
    pub parent: &'a str,
    pub segment: &'a str,
}

impl<'a> PartialPath<'a> {
    pub fn parse(partial: &'a str) -> Self {
        match partial.rfind(SEPARATOR) {
            Some(idx) => Self {
                parent: &partial[..=idx],
                segment: &partial[idx + 1..],
            },
            None => Self {
                parent: "",
                segment: partial,
            },
        }
    }

    /// Directory whose children complete `segment`, in canonical form.
    pub fn directory(&self) -> String {
        normalize_dir(self.parent)
    }
}

/// Collapses repeated separators and drops the trailing one.
///
/// An empty parent means the current directory (`.`); the root stays `/`.
pub fn normalize_dir(dir: &str) -> String {
    if dir.is_empty() {
        return ".".to_string();
    }

    let mut normalized = String::with_capacity(dir.len());
    let mut last_was_sep = false;
    for c in dir.chars() {
        if c == SEPARATOR {
            if !last_was_sep {
                normalized.push(c);
            }
            last_was_sep = true;
        } else {
            normalized.push(c);
            last_was_sep = false;
        }
    }

    while normalized.len() > 1 && normalized.ends_with(SEPARATOR) {
        normalized.pop();
    }
    normalized
}

pub fn filter_by_prefix(names: &[String], prefix: &str) -> Vec<String> {
    names
        .iter()
        .filter(|name| name.starts_with(prefix))
        .cloned()
        .collect()
}

/// Character-wise common prefix of every candidate.
pub fn longest_common_prefix(candidates: &[String]) -> String {
    let mut iter = candidates.iter();
    let first = match iter.next() {
        Some(first) => first,
        None => return String::new(),
    };

    let mut prefix_chars = first.chars().count();
    for candidate in iter {
        let shared = first
            .chars()
            .zip(candidate.chars())
            .take_while(|(a, b)| a == b)
            .count();
        prefix_chars = prefix_chars.min(shared);
        if prefix_chars == 0 {
            break;
        }
    }

    first.chars().take(prefix_chars).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabResolution {
    /// Nothing to do.
    NoOp,
    /// Exactly one match: the input now names that directory.
    Descend(String),
    /// Several matches: the trailing segment grew to their common prefix.
    Extend(String),
}

impl TabResolution {
    pub fn input(&self) -> Option<&str> {
        match self {
            TabResolution::NoOp => None,
            TabResolution::Descend(input) | TabResolution::Extend(input) => Some(input),
        }
    }
}

/// Applies a candidate list to the partial path the user typed.
pub fn resolve_tab(partial: &str, candidates: &[String]) -> TabResolution {
    let path = PartialPath::parse(partial);

    match candidates {
        [] => TabResolution::NoOp,
        [only] => TabResolution::Descend(format!("{}{}{}", path.parent, only, SEPARATOR)),
        _ => {
            let prefix = longest_common_prefix(candidates);
            if prefix.is_empty() || prefix == path.segment {
                TabResolution::NoOp
            } else {
                TabResolution::Extend(format!("{}{}", path.parent, prefix))
            }
        }
    }
}
