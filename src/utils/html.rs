use std::sync::LazyLock;

use regex::Regex;

// `<` followed by a letter, `/`, `!` or `?` opens a tag, comment or
// processing instruction. Any other `<` is plain text to an HTML parser.
static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z/!?]").expect("markup pattern is valid"));

/// Strips markup that could run in a browser from user-supplied text,
/// keeping harmless formatting tags.
///
/// Text without any markup is returned untouched, so `&` and a lone `<` are
/// not turned into entities.
pub fn clean_html(input: &str) -> String {
    if MARKUP_RE.is_match(input) {
        ammonia::clean(input)
    } else {
        input.to_string()
    }
}
