//! Line diff of template against merged output, for `merge --diff`.

use colored::Colorize;
use similar::{ChangeTag, TextDiff};

/// Render a unified-style diff with three lines of context.
pub fn render(old_name: &str, new_name: &str, old: &str, new: &str) -> String {
    let mut out = String::new();
    if old == new {
        return out;
    }

    let diff = TextDiff::from_lines(old, new);

    out.push_str(&format!("{}\n{}\n", format!("--- {old_name}").bold(), format!("+++ {new_name}").bold()));
    for group in diff.grouped_ops(3) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_start = first.old_range().start;
        let new_start = first.new_range().start;
        let header = format!(
            "@@ -{},{} +{},{} @@",
            old_start + 1,
            last.old_range().end - old_start,
            new_start + 1,
            last.new_range().end - new_start,
        );
        out.push_str(&format!("{}\n", header.cyan()));

        for op in &group {
            for change in diff.iter_changes(op) {
                let line = change.value().trim_end_matches('\n');
                let rendered = match change.tag() {
                    ChangeTag::Equal => format!(" {line}").normal(),
                    ChangeTag::Delete => format!("-{line}").red(),
                    ChangeTag::Insert => format!("+{line}").green(),
                };
                out.push_str(&format!("{rendered}\n"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(old: &str, new: &str) -> String {
        colored::control::set_override(false);
        render("a", "b", old, new)
    }

    #[test]
    fn identical_inputs_render_nothing() {
        assert_eq!(plain("x\ny\n", "x\ny\n"), "");
    }

    #[test]
    fn marks_inserted_lines() {
        let out = plain("<r>\n  <X/>\n</r>\n", "<r>\n  <X>1</X>\n  <X>2</X>\n</r>\n");
        assert!(out.starts_with("--- a\n+++ b\n@@ -1,3 +1,4 @@\n"));
        assert!(out.contains("\n-  <X/>\n"));
        assert!(out.contains("\n+  <X>1</X>\n+  <X>2</X>\n"));
        assert!(out.contains("\n </r>\n"));
    }
}
