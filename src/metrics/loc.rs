//! Physical line counting.
//!
//! A line counts as physical when any code appears on it; full-line comments
//! and blanks are excluded, and a trailing inline comment does not stop its
//! line from counting. Block comments (nested, per Rust) and string literals
//! are tracked across lines so `//` inside a string is not a comment.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStats {
    pub total: usize,
    /// Lines with code on them
    pub physical: usize,
    /// Full-line comments plus block-comment interior lines
    pub comment: usize,
    pub blank: usize,
}

impl LineStats {
    /// comment lines / (code + comment lines)
    pub fn comment_density(&self) -> f64 {
        let populated = self.physical + self.comment;
        if populated == 0 {
            0.0
        } else {
            self.comment as f64 / populated as f64
        }
    }
}

#[derive(Default)]
struct ScanState {
    block_depth: usize,
    in_string: bool,
    raw_hashes: Option<usize>,
}

pub fn count_lines(source: &str) -> LineStats {
    let mut stats = LineStats::default();
    let mut state = ScanState::default();

    for line in source.lines() {
        stats.total += 1;
        let (has_code, has_comment) = scan_line(line, &mut state);
        if has_code {
            stats.physical += 1;
        } else if has_comment {
            stats.comment += 1;
        } else {
            stats.blank += 1;
        }
    }
    stats
}

fn scan_line(line: &str, state: &mut ScanState) -> (bool, bool) {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    let mut has_code = false;
    let mut has_comment = false;

    while i < chars.len() {
        if state.block_depth > 0 {
            has_comment = true;
            if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                state.block_depth -= 1;
                i += 2;
            } else if chars[i] == '/' && chars.get(i + 1) == Some(&'*') {
                state.block_depth += 1;
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }

        if state.in_string {
            has_code = true;
            match state.raw_hashes {
                Some(hashes) => {
                    if chars[i] == '"' && closes_raw_string(&chars, i, hashes) {
                        state.in_string = false;
                        state.raw_hashes = None;
                        i += 1 + hashes;
                    } else {
                        i += 1;
                    }
                }
                None => {
                    if chars[i] == '\\' {
                        i += 2;
                    } else if chars[i] == '"' {
                        state.in_string = false;
                        i += 1;
                    } else {
                        i += 1;
                    }
                }
            }
            continue;
        }

        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '/' && chars.get(i + 1) == Some(&'/') {
            has_comment = true;
            break;
        } else if c == '/' && chars.get(i + 1) == Some(&'*') {
            has_comment = true;
            state.block_depth += 1;
            i += 2;
        } else if c == '"' {
            has_code = true;
            state.in_string = true;
            state.raw_hashes = None;
            i += 1;
        } else if c == 'r' && is_raw_string_start(&chars, i) {
            has_code = true;
            let hashes = count_hashes(&chars, i + 1);
            state.in_string = true;
            state.raw_hashes = Some(hashes);
            i += 2 + hashes;
        } else {
            has_code = true;
            i += 1;
        }
    }

    (has_code, has_comment)
}

fn is_raw_string_start(chars: &[char], i: usize) -> bool {
    let mut j = i + 1;
    while chars.get(j) == Some(&'#') {
        j += 1;
    }
    chars.get(j) == Some(&'"')
}

fn count_hashes(chars: &[char], mut i: usize) -> usize {
    let mut n = 0;
    while chars.get(i) == Some(&'#') {
        n += 1;
        i += 1;
    }
    n
}

fn closes_raw_string(chars: &[char], i: usize, hashes: usize) -> bool {
    (1..=hashes).all(|k| chars.get(i + k) == Some(&'#'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn blanks_and_full_comments_are_excluded() {
        let stats = count_lines(indoc! {r#"
            // a full-line comment

            let x = 1;
            let y = 2; // trailing comment still counts the line
        "#});
        assert_eq!(stats.total, 4);
        assert_eq!(stats.physical, 2);
        assert_eq!(stats.comment, 1);
        assert_eq!(stats.blank, 1);
    }

    #[test]
    fn block_comment_interior_lines_are_comments() {
        let stats = count_lines(indoc! {r#"
            /* start
               middle
               end */
            let x = 1;
        "#});
        assert_eq!(stats.physical, 1);
        assert_eq!(stats.comment, 3);
    }

    #[test]
    fn nested_block_comments_track_depth() {
        let stats = count_lines(indoc! {r#"
            /* outer /* inner */
               still comment */
            fn f() {}
        "#});
        assert_eq!(stats.physical, 1);
        assert_eq!(stats.comment, 2);
    }

    #[test]
    fn comment_markers_inside_strings_are_code() {
        let stats = count_lines(r#"let url = "http://example.com"; "#);
        assert_eq!(stats.physical, 1);
        assert_eq!(stats.comment, 0);
    }

    #[test]
    fn raw_strings_span_lines_as_code() {
        let stats = count_lines(indoc! {r##"
            let s = r#"first
            // not a comment
            last"#;
        "##});
        assert_eq!(stats.physical, 3);
        assert_eq!(stats.comment, 0);
    }

    #[test]
    fn code_after_block_close_counts_once() {
        let stats = count_lines("/* note */ let x = 1;");
        assert_eq!(stats.physical, 1);
    }

    #[test]
    fn density_is_zero_for_empty_input() {
        assert_eq!(count_lines("").comment_density(), 0.0);
    }
}
