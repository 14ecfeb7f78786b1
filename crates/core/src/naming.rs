//! Output file naming convention.
//!
//! Every envelope gets its name from [`output_file_name`], whichever
//! strategy produced the bytes.

use std::collections::HashSet;

use crate::codec::OutputFormat;

/// Suffixes recognized as image extensions (case-sensitive).
///
/// Includes every extension [`OutputFormat::extension`] can produce, so the
/// rule is idempotent.
pub const RECOGNIZED_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".webp"];

/// Stem used when the original name is absent or unrecognized.
pub const DEFAULT_STEM: &str = "file";

/// Derive the output file name for a compressed image.
///
/// Convention: `{stem}.{ext}` where `ext` follows `format`.
///
/// - `stem` = the final path component of the original name (split on
///   `/` and `\`) minus its recognized image suffix
/// - original names without a recognized suffix (or with an empty stem)
///   fall back to [`DEFAULT_STEM`]
///
/// # Examples
///
/// ```
/// use toolbench_core::codec::OutputFormat;
/// use toolbench_core::naming::output_file_name;
///
/// assert_eq!(output_file_name(Some("cat.png"), OutputFormat::WebP), "cat.webp");
/// assert_eq!(output_file_name(Some("cat.jpeg"), OutputFormat::Jpeg), "cat.jpg");
/// assert_eq!(output_file_name(None, OutputFormat::Png), "file.png");
/// assert_eq!(output_file_name(Some("notes.txt"), OutputFormat::Png), "file.png");
/// assert_eq!(output_file_name(Some("../cat.png"), OutputFormat::Png), "cat.png");
/// ```
pub fn output_file_name(original: Option<&str>, format: OutputFormat) -> String {
    let stem = original
        .map(base_name)
        .and_then(strip_image_extension)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(DEFAULT_STEM);

    format!("{stem}.{}", format.extension())
}

/// Return `name`, or `name` with a numeric suffix before its extension if
/// `used` already holds it (`photo.png`, `photo-1.png`, `photo-2.png`).
///
/// The returned name is recorded in `used`.
pub fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    };
    let mut n = 1;
    loop {
        let candidate = format!("{stem}-{n}{ext}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// The part of `name` after its last `/` or `\`.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Strip a recognized image extension, returning `None` if there is none.
fn strip_image_extension(name: &str) -> Option<&str> {
    RECOGNIZED_EXTENSIONS
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_to_webp() {
        assert_eq!(
            output_file_name(Some("holiday.png"), OutputFormat::WebP),
            "holiday.webp"
        );
    }

    #[test]
    fn jpeg_keeps_format_with_short_extension() {
        assert_eq!(
            output_file_name(Some("holiday.jpeg"), OutputFormat::Jpeg),
            "holiday.jpg"
        );
        assert_eq!(
            output_file_name(Some("holiday.jpg"), OutputFormat::Jpeg),
            "holiday.jpg"
        );
    }

    #[test]
    fn only_the_trailing_suffix_is_rewritten() {
        assert_eq!(
            output_file_name(Some("a.png.backup.jpg"), OutputFormat::Png),
            "a.png.backup.png"
        );
    }

    #[test]
    fn case_sensitive_suffix_falls_back_to_default() {
        assert_eq!(output_file_name(Some("SHOUT.PNG"), OutputFormat::Png), "file.png");
    }

    #[test]
    fn absent_or_empty_stem_uses_default() {
        assert_eq!(output_file_name(None, OutputFormat::WebP), "file.webp");
        assert_eq!(output_file_name(Some(".png"), OutputFormat::Jpeg), "file.jpg");
        assert_eq!(output_file_name(Some(""), OutputFormat::Png), "file.png");
    }

    #[test]
    fn directory_components_are_dropped() {
        assert_eq!(output_file_name(Some("../x.png"), OutputFormat::Png), "x.png");
        assert_eq!(output_file_name(Some("a/b.png"), OutputFormat::WebP), "b.webp");
        assert_eq!(output_file_name(Some("/abs.png"), OutputFormat::Jpeg), "abs.jpg");
        assert_eq!(
            output_file_name(Some("..\\..\\evil.jpg"), OutputFormat::Jpeg),
            "evil.jpg"
        );
        assert_eq!(output_file_name(Some("dir/.png"), OutputFormat::Png), "file.png");
        assert_eq!(output_file_name(Some("../.."), OutputFormat::Png), "file.png");
    }

    #[test]
    fn colliding_names_get_suffixes() {
        let mut used = HashSet::new();
        assert_eq!(unique_name("photo.png", &mut used), "photo.png");
        assert_eq!(unique_name("photo.png", &mut used), "photo-1.png");
        assert_eq!(unique_name("photo.png", &mut used), "photo-2.png");
        assert_eq!(unique_name("README", &mut used), "README");
        assert_eq!(unique_name("README", &mut used), "README-1");
        assert_eq!(unique_name(".hidden", &mut used), ".hidden");
        assert_eq!(unique_name(".hidden", &mut used), ".hidden-1");
    }

    #[test]
    fn suffixed_name_already_taken_is_skipped() {
        let mut used = HashSet::from(["a-1.jpg".to_string()]);
        assert_eq!(unique_name("a.jpg", &mut used), "a.jpg");
        assert_eq!(unique_name("a.jpg", &mut used), "a-2.jpg");
    }

    #[test]
    fn rule_is_idempotent() {
        let names = [
            Some("x.png"),
            Some("y.jpeg"),
            Some("z.webp"),
            Some("odd"),
            Some("../up.png"),
            None,
        ];
        let formats = [OutputFormat::Png, OutputFormat::Jpeg, OutputFormat::WebP];

        for name in names {
            for format in formats {
                let once = output_file_name(name, format);
                let twice = output_file_name(Some(&once), format);
                assert_eq!(once, twice, "not idempotent for {name:?} -> {format:?}");
            }
        }
    }
}
