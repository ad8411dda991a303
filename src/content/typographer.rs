// Typographic substitutions over rendered HTML text. Tags, comments and the
// contents of verbatim elements are copied untouched.

const VERBATIM_TAGS: [&str; 5] = ["pre", "code", "kbd", "script", "style"];

pub fn smarten(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + html.len() / 8);
    let mut verbatim_depth = 0usize;
    let mut prev: Option<char> = None;
    let mut rest = html;

    while let Some(c) = rest.chars().next() {
        if rest.starts_with("<!--") {
            let end = rest.find("-->").map_or(rest.len(), |i| i + 3);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }

        if c == '<' {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            let tag = &rest[..end];
            track_verbatim(tag, &mut verbatim_depth);
            out.push_str(tag);
            rest = &rest[end..];
            continue;
        }

        if verbatim_depth > 0 {
            out.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        }

        let (replacement, consumed, last) = if rest.starts_with("---") {
            ("&mdash;", 3, '-')
        } else if rest.starts_with("--") {
            ("&ndash;", 2, '-')
        } else if rest.starts_with("...") {
            ("&hellip;", 3, '.')
        } else if rest.starts_with("&quot;") {
            (if opens_quote(prev) { "&ldquo;" } else { "&rdquo;" }, 6, '"')
        } else if c == '\'' {
            (if opens_quote(prev) { "&lsquo;" } else { "&rsquo;" }, 1, '\'')
        } else if c == '&' {
            // Any other entity is copied as is
            let end = rest.char_indices()
                .take(12)
                .find(|&(_, ch)| ch == ';')
                .map_or(1, |(i, _)| i + 1);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            prev = Some('&');
            continue;
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
            prev = Some(c);
            continue;
        };

        out.push_str(replacement);
        rest = &rest[consumed..];
        prev = Some(last);
    }

    out
}

fn opens_quote(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => c.is_whitespace() || "([{-".contains(c),
    }
}

fn track_verbatim(tag: &str, depth: &mut usize) {
    let inner = tag.trim_start_matches('<');
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(name) => (true, name),
        None => (false, inner),
    };
    let name: String = inner.chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if !VERBATIM_TAGS.contains(&name.as_str()) {
        return;
    }

    if closing {
        *depth = depth.saturating_sub(1);
    } else if !tag.ends_with("/>") {
        *depth += 1;
    }
}
