use crate::types::{DocumentTree, Section};

/// One title per line, indented two spaces per nesting level.
pub fn render_indented(tree: &DocumentTree) -> String {
    fn walk(sections: &[Section], depth: usize, out: &mut String) {
        for section in sections {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&section.title);
            out.push('\n');
            walk(&section.children, depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(&tree.sections, 0, &mut out);
    out
}

/// Render the outline as Markdown: a heading per section (`#` per depth,
/// capped at six) followed by its content as one paragraph.
pub fn render_markdown(tree: &DocumentTree) -> String {
    fn walk(sections: &[Section], depth: usize, out: &mut String) {
        for section in sections {
            let hashes = "#".repeat(depth.min(6));
            out.push_str(&format!("{} {}\n\n", hashes, escape_markdown(&section.title)));
            if !section.content.is_empty() {
                let paragraph: Vec<String> =
                    section.content.iter().map(|c| escape_markdown(c)).collect();
                out.push_str(&paragraph.join(" "));
                out.push_str("\n\n");
            }
            walk(&section.children, depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(&tree.sections, 1, &mut out);
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Escape Markdown special characters in text.
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '`' | '*' | '_' | '[' | ']' | '|' | '#') {
            result.push('\\');
        }
        result.push(c);
    }
    result
}
