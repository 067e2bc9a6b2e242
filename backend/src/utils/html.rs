/// Sanitizes free text that clients render as HTML.
///
/// Whitelist-based: safe inline tags survive, `<script>` and friends are
/// removed together with their content, event-handler attributes are dropped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input.trim())
}

#[cfg(test)]
mod tests {
    use super::clean_html;

    #[test]
    fn strips_scripts_and_keeps_text() {
        assert_eq!(clean_html("  What is 2 + 2?  "), "What is 2 + 2?");
        assert_eq!(clean_html("<b>bold</b><script>alert(1)</script>"), "<b>bold</b>");
    }
}
