//! Title normalization module
//!
//! This module derives clean search queries from raw release filenames and
//! from the text a user typed into the search dialog.

use regex::Regex;
use std::sync::LazyLock;

/// Trailing file extension, e.g. `.mkv`
static EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[^.]+$").expect("valid extension pattern"));

/// Release-tag vocabulary: resolution, source, codec and audio markers
///
/// Word boundaries are ASCII-only, so a tag glued to a CJK title still matches.
static RELEASE_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?-u:\b)(\d{3,4}p|web[- ]?dl|bluray|uhd|hdr|10bit|hevc|dts[- ]?x|ma|atmos|beast|x264|x265|aac|ddp|remux|repack|dual|audio|dolby|vision)(?-u:\b)",
    )
    .expect("valid release tag pattern")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[._]+").expect("valid separator pattern"));

/// A parenthesized four digit year, e.g. `(2023)`
static PAREN_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\d{4}\)").expect("valid year pattern"));

/// Derives a search query from a raw media filename
///
/// Strips the extension, turns `.` and `_` into spaces, removes release tags
/// such as `1080p`, `BluRay` or `x264` (case-insensitive, whole words only),
/// collapses whitespace and trims the result.
///
/// # Examples
///
/// ```
/// use mediamm_pilot::normalize_title;
///
/// let query = normalize_title("Movie.Name.2023.1080p.BluRay.x264-GROUP.mkv");
/// assert_eq!(query, "Movie Name 2023 -GROUP");
/// ```
pub fn normalize_title(filename: &str) -> String {
    let stem = EXTENSION.replace(filename, "");
    let mut current = collapse(&stem.replace(['.', '_'], " "));

    // Removing a tag can join the halves of another one ("web x264 dl")
    loop {
        let next = collapse(&RELEASE_TAGS.replace_all(&current, ""));
        if next == current {
            return current;
        }
        current = next;
    }
}

fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Cleans the text typed into the search dialog before it is sent
///
/// Runs of `.` and `_` become single spaces.
pub fn search_text(raw: &str) -> String {
    SEPARATORS.replace_all(raw, " ").trim().to_string()
}

/// Derives the subtitle search query from the current search text
///
/// The subtitle backend matches on title only, so a parenthesized year
/// like `(2023)` is removed.
pub fn subtitle_query(raw: &str) -> String {
    let text = search_text(raw);
    collapse(&PAREN_YEAR.replace(&text, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_release_tags() {
        let result = normalize_title("Movie.Name.2023.1080p.BluRay.x264-GROUP.mkv");
        assert!(!result.contains("1080p"));
        assert!(!result.contains("BluRay"));
        assert!(!result.contains("x264"));
        assert_eq!(result, "Movie Name 2023 -GROUP");
    }

    #[test]
    fn test_normalize_is_case_insensitive() {
        assert_eq!(
            normalize_title("the_matrix_2160P_uhd_HEVC_Atmos.mp4"),
            "the matrix"
        );
        assert_eq!(normalize_title("Heat [WEB-DL] [DDP].mkv"), "Heat [] []");
    }

    #[test]
    fn test_normalize_keeps_words_containing_tags() {
        // "ma" and "audio" only match as whole words
        assert_eq!(normalize_title("Mama.Audiobook.avi"), "Mama Audiobook");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Movie.Name.2023.1080p.BluRay.x264-GROUP.mkv",
            "Some_Show_720p_WEB-DL_AAC.mp4",
            "Dune.Part.Two.2024.2160p.UHD.REMUX.HDR.DTS-X.Dolby.Vision.mkv",
            "already clean title",
            "trailing.",
            "",
            "电影.名字.2021.1080p.mkv",
            "Odd.web.x264.dl.Cut.mkv",
        ];

        for sample in samples {
            let once = normalize_title(sample);
            assert_eq!(normalize_title(&once), once, "input: {sample}");
        }
    }

    #[test]
    fn test_normalize_strips_whole_vocabulary() {
        let cases = [
            ("Movie.720P.mkv", "Movie"),
            ("Movie.Web-DL.webdl.WEB DL.mkv", "Movie"),
            ("Movie.BluRay.UHD.hdr.mkv", "Movie"),
            ("Movie.10BIT.Hevc.mkv", "Movie"),
            ("Movie.DTS-X.dtsx.Ma.Atmos.mkv", "Movie"),
            ("Movie.10bit.Beast.REPACK.DUAL.Audio.MA.mkv", "Movie"),
            ("Movie.X264.x265.AAC.ddp.Remux.mkv", "Movie"),
            ("Movie.Dolby.VISION.mkv", "Movie"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize_title(input), expected, "input: {input}");
        }
    }

    #[test]
    fn test_normalize_strips_tags_glued_to_cjk_titles() {
        assert_eq!(normalize_title("流浪地球1080p.mkv"), "流浪地球");
        assert_eq!(normalize_title("流浪地球1080p Mama.mkv"), "流浪地球 Mama");
        assert_eq!(normalize_title("电影.名字.2021.1080p.mkv"), "电影 名字 2021");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_title("  A   B . x265 . C .mkv"), "A B C");
    }

    #[test]
    fn test_normalize_removes_tags_joined_by_removal() {
        assert_eq!(normalize_title("Odd.web.x264.dl.Cut.mkv"), "Odd Cut");
    }

    #[test]
    fn test_search_text_replaces_separators() {
        assert_eq!(search_text(" Movie..Name_2023 "), "Movie Name 2023");
    }

    #[test]
    fn test_subtitle_query_strips_year() {
        assert_eq!(subtitle_query("Movie Name (2023)"), "Movie Name");
        assert_eq!(subtitle_query("Movie.Name.(1999).x"), "Movie Name x");
        assert_eq!(subtitle_query("Movie 2023"), "Movie 2023");
    }
}
