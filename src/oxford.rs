//! Oxford-comma lists: `X`, `X or X`, `X, X, or X`, ...
//!
//! Rule sentences enumerate field names, enum values and roles this way. The
//! builder produces the regex fragment for such a list over some particle;
//! the extractors recover the list items from the matched text.

use once_cell::sync::Lazy;
use regex::Regex;

static QUOTED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)""#).expect("unreachable: list grammar is invalid"));

/// How a list pattern is built.
#[derive(Debug, Clone, Copy)]
pub struct ListOptions<'a> {
    /// Each item is preceded by "a" or "an".
    pub article: bool,
    /// Name of the capture group around the whole list.
    pub capture: Option<&'a str>,
    /// The word before the last item.
    pub connector: &'a str,
}

impl<'a> Default for ListOptions<'a> {
    fn default() -> Self {
        ListOptions {
            article: false,
            capture: None,
            connector: "or",
        }
    }
}

/// Builds the pattern for a list of `particle`s.
///
/// `particle` is repeated inside the output, so it must not contain named
/// groups of its own.
pub fn list_pattern(particle: &str, options: ListOptions) -> String {
    let item = if options.article {
        format!(r"an?\s+({})", particle)
    } else {
        format!("({})", particle)
    };
    let open = match options.capture {
        Some(name) => format!("(?P<{}>", name),
        None => "(".to_owned(),
    };

    format!(
        r"{open}{item}((((,\s+{item})+,)?)?\s+{connector}\s+{item})?)",
        open = open,
        item = item,
        connector = options.connector,
    )
}

/// The quoted items of a matched list, quotes removed, in order.
pub fn break_string_list(list: &str) -> Vec<String> {
    QUOTED_ITEM
        .captures_iter(list)
        .map(|c| c[1].to_owned())
        .collect()
}

/// The pattern for one item of a role list, as consumed by
/// [`break_role_list`](fn.break_role_list.html).
pub fn role_item_pattern(roles: &str) -> String {
    format!(r"\ban?\s+({})(,\s+)?", roles)
}

/// The role names of a matched role list, in order.
///
/// `role_item` is compiled from [`role_item_pattern`](fn.role_item_pattern.html)
/// over the role alternation the list was matched against. Every item
/// carries its article, which also covers the final "and a ROLE" / "or an
/// ROLE" item.
pub fn break_role_list(role_item: &Regex, list: &str) -> Vec<String> {
    role_item
        .captures_iter(list)
        .map(|c| c[1].to_owned())
        .collect()
}
