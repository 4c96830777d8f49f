use sanitize_html::sanitize_str;
use sanitize_html::rules::predefined::RESTRICTED;

/// Strip all markup from user submitted text (bios, descriptions, comments)
pub fn clean_text(input: &str) -> String {
    sanitize_str(&RESTRICTED, input).unwrap_or_default()
}
