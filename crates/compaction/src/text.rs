//! Boundary-aware truncation and heading-based section compaction.
//!
//! All lengths are measured in chars (Unicode scalar values), and every cut
//! lands on a char boundary — a truncation can never split a codepoint.

/// Truncate `text` to at most `max_chars`, preferring natural boundaries.
///
/// Cut points are tried in order:
/// 1. the last sentence-ending punctuation (`.`, `!`, `?` followed by
///    whitespace or end of input) at or before `max_chars`, accepted only
///    when it falls past the midpoint of `max_chars`;
/// 2. the last paragraph break (`\n\n`);
/// 3. the last word boundary (space), with a leading space before the
///    ellipsis;
/// 4. a hard cut at exactly `max_chars`.
///
/// Returns the input unchanged when it already fits. Otherwise the result
/// ends with `"..."` and is never longer than the input plus the ellipsis.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    // Byte offset just past the first `max_chars` chars.
    let window_end = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(idx, _)| idx);
    let window = &text[..window_end];

    if let Some(cut) = last_sentence_end(text, window, max_chars) {
        return format!("{}...", &text[..cut]);
    }

    if let Some(break_start) = window.rfind("\n\n") {
        if break_start > 0 {
            return format!("{}...", &text[..break_start]);
        }
    }

    if let Some(space) = window.rfind(' ') {
        if space > 0 {
            return format!("{} ...", text[..space].trim_end());
        }
    }

    format!("{window}...")
}

/// Byte offset just past the best sentence-ending cut, if one exists past
/// the midpoint of the truncation window.
fn last_sentence_end(text: &str, window: &str, max_chars: usize) -> Option<usize> {
    let midpoint = max_chars / 2;
    let mut best = None;
    for (pos, (idx, ch)) in window.char_indices().enumerate() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let after = idx + ch.len_utf8();
        let followed_ok = text[after..].chars().next().is_none_or(char::is_whitespace);
        if followed_ok && pos + 1 > midpoint {
            best = Some(after);
        }
    }
    best
}

/// Compact markdown-ish content section by section.
///
/// Content is split on heading lines (one or more `#` followed by
/// whitespace, any nesting level); text before the first heading — or all of
/// it when no headings exist — forms an anonymous section. Each emitted
/// section keeps its heading line verbatim; its body is truncated to
/// `preview_chars` unless the whole section already fits. At most
/// `max_sections` sections are emitted, followed by a
/// `"<n> more sections omitted"` line when any were dropped.
///
/// Code blocks, tables, and lists inside a body are opaque text and may be
/// cut mid-structure.
pub fn compact_by_section(content: &str, preview_chars: usize, max_sections: usize) -> String {
    let sections = split_sections(content);
    let total = sections.len();

    let mut rendered: Vec<String> = sections
        .iter()
        .take(max_sections)
        .map(|section| render_section(section, preview_chars))
        .collect();

    if total > max_sections {
        rendered.push(format!("{} more sections omitted", total - max_sections));
    }

    rendered.join("\n\n")
}

struct Section<'a> {
    heading: Option<&'a str>,
    body_lines: Vec<&'a str>,
}

impl Section<'_> {
    fn body(&self) -> String {
        self.body_lines.join("\n").trim().to_string()
    }
}

fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    hashes > 0 && line[hashes..].starts_with([' ', '\t'])
}

fn split_sections(content: &str) -> Vec<Section<'_>> {
    let mut sections = Vec::new();
    let mut current = Section {
        heading: None,
        body_lines: Vec::new(),
    };

    for line in content.lines() {
        if is_heading(line) {
            // Flush the anonymous leading section only if it has content.
            if current.heading.is_some() || !current.body().is_empty() {
                sections.push(current);
            }
            current = Section {
                heading: Some(line),
                body_lines: Vec::new(),
            };
        } else {
            current.body_lines.push(line);
        }
    }

    if current.heading.is_some() || !current.body().is_empty() || sections.is_empty() {
        sections.push(current);
    }

    sections
}

fn render_section(section: &Section<'_>, preview_chars: usize) -> String {
    let body = section.body();
    let full = match section.heading {
        Some(heading) if body.is_empty() => heading.to_string(),
        Some(heading) => format!("{heading}\n{body}"),
        None => body.clone(),
    };

    if full.chars().count() <= preview_chars {
        return full;
    }

    match section.heading {
        Some(heading) if body.is_empty() => heading.to_string(),
        Some(heading) => format!(
            "{heading}\n{}",
            truncate_with_ellipsis(&body, preview_chars)
        ),
        None => truncate_with_ellipsis(&body, preview_chars),
    }
}
