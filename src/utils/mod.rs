pub mod text_processor;

pub use text_processor::{
    char_len, normalize_whitespace, sanitize_filename, strip_html_tags, truncate_chars,
    TitlePatterns,
};
