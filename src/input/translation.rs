//! Translation source file helpers

use std::path::Path;

/// Filename marker identifying a translation source.
pub const TRANSLATED_MARKER: &str = "_translated";

/// Separator between the project prefix and the country token in a filename.
const TOKEN_SEPARATOR: &str = "__";

/// Derive the country/language token of a translation source from its filename.
///
/// Strips the extension, keeps the part after the last `__`, drops a trailing
/// `_translated` (any case) and upper-cases the rest.
///
/// The token is a display label for reports only; lookups never use it.
///
/// # Examples
/// - `P027822__DEU_translated.xlsx` → `DEU`
/// - `survey__fr_Translated.xls` → `FR`
/// - `spain_translated.xlsx` → `SPAIN`
#[must_use]
pub fn source_token(path: &Path) -> String {
    let stem = path.file_stem().map(|stem| stem.to_string_lossy()).unwrap_or_default();

    let segment = stem.rsplit(TOKEN_SEPARATOR).next().unwrap_or_default();
    let segment = strip_suffix_ignore_case(segment, TRANSLATED_MARKER);

    segment.to_uppercase()
}

/// 大文字小文字を区別せずに末尾を取り除く
fn strip_suffix_ignore_case<'a>(text: &'a str, suffix: &str) -> &'a str {
    let Some(split) = text.len().checked_sub(suffix.len()) else {
        return text;
    };

    match (text.get(..split), text.get(split..)) {
        (Some(head), Some(tail)) if tail.eq_ignore_ascii_case(suffix) => head,
        _ => text,
    }
}
