use pulldown_cmark::{html, Options, Parser};

pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Markdown to unsanitized HTML. Use [`render_markdown`] for anything shown
/// to a user.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Strip scripts, event handlers and other active content. Links may keep a
/// `target`; `rel` is always forced to `noopener noreferrer`.
pub fn sanitize(html: &str) -> String {
    ammonia::Builder::default()
        .add_tag_attributes("a", &["target"])
        .clean(html)
        .to_string()
}

pub fn render_markdown(markdown: &str) -> String {
    sanitize(&markdown_to_html(markdown))
}

const PRINT_STYLE: &str = "\
body { font-family: Arial, sans-serif; font-size: 12px; line-height: 1.6; color: #000; background: #fff; padding: 40px; }
h1 { font-size: 24px; margin-top: 20px; margin-bottom: 10px; }
h2 { font-size: 20px; margin-top: 18px; margin-bottom: 8px; }
h3 { font-size: 16px; margin-top: 14px; margin-bottom: 6px; }
code, pre { background-color: #f4f4f4; }
blockquote { border-left: 4px solid #ddd; padding-left: 15px; margin-left: 0; color: #666; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }";

/// A standalone printable HTML page around already-sanitized `body`.
pub fn html_document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n<style>\n{PRINT_STYLE}\n</style>\n</head>\n<body>\n<div class=\"markdown-body\">\n{body}</div>\n</body>\n</html>\n",
        ammonia::clean_text(title)
    )
}
