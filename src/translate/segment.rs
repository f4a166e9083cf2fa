use regex::Regex;
use std::sync::LazyLock;

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[。？?！!]").expect("sentence terminator pattern"));

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank run pattern"));

/// Cuts text into translatable pieces.
///
/// Lines are trimmed; a blank line becomes an empty segment so it survives
/// the round trip. Each sentence of a line, terminator included, is its own
/// segment, and trailing text without a terminator is one more.
pub fn split_text(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            segments.push(String::new());
            continue;
        }

        let mut start = 0;
        for end in SENTENCE_END.find_iter(line) {
            let sentence = line[start..end.end()].trim();
            if !sentence.is_empty() {
                segments.push(sentence.to_string());
            }
            start = end.end();
        }
        let rest = line[start..].trim();
        if !rest.is_empty() {
            segments.push(rest.to_string());
        }
    }
    segments
}

/// One segment per line, with runs of blank lines squeezed to one.
pub fn join_segments(segments: &[String]) -> String {
    BLANK_RUN.replace_all(&segments.join("\n"), "\n\n").into_owned()
}
