//! Server-rendered upload page.
//!
//! One page serves every state of a session: the empty form, banners from the last
//! upload, and the QA service's answer. The answer is shown verbatim, escaped and with
//! whitespace preserved.

use crate::config::UiConfig;
use crate::services::session::{Notice, NoticeLevel};
use crate::utils::html::escape_html;

/// Everything the page shows besides the static chrome
#[derive(Debug, Default)]
pub struct PageView<'a> {
    pub notices: &'a [Notice],
    pub filename: Option<&'a str>,
    pub answer: Option<&'a str>,
    /// Offer the retry button (a document is staged but its query failed)
    pub can_retry: bool,
}

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem;color:#222}\
.notice{padding:.6rem .9rem;border-radius:.4rem;margin:.6rem 0}\
.notice-success{background:#e6f4ea;color:#1e4620}\
.notice-warning{background:#fff4e5;color:#663c00}\
.notice-error{background:#fdecea;color:#611a15}\
.answer{white-space:pre-wrap;background:#f6f8fa;padding:1rem;border-radius:.4rem}\
form{margin:1rem 0}";

fn notice_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Success => "notice notice-success",
        NoticeLevel::Warning => "notice notice-warning",
        NoticeLevel::Error => "notice notice-error",
    }
}

/// `accept` attribute for the file input, e.g. ".docx"
fn accept_attr(extensions: &[String]) -> String {
    extensions
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn render_page(ui: &UiConfig, allowed_extensions: &[String], view: &PageView<'_>) -> String {
    let mut body = String::new();

    body.push_str(&format!("<h1>{}</h1>\n", escape_html(&ui.title)));
    body.push_str(&format!("<p>{}</p>\n", escape_html(&ui.tagline)));

    body.push_str(&format!(
        "<form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
         <label for=\"file\">Choose Word file</label>\n\
         <input type=\"file\" id=\"file\" name=\"file\" accept=\"{}\" required>\n\
         <button type=\"submit\">Analyze</button>\n\
         </form>\n",
        escape_html(&accept_attr(allowed_extensions))
    ));

    for notice in view.notices {
        body.push_str(&format!(
            "<div class=\"{}\" role=\"status\">{}</div>\n",
            notice_class(notice.level),
            escape_html(&notice.message)
        ));
    }

    if view.can_retry {
        body.push_str(
            "<form method=\"post\" action=\"/retry\">\
             <button type=\"submit\">Retry analysis</button></form>\n",
        );
    }

    if let Some(answer) = view.answer {
        if let Some(filename) = view.filename {
            body.push_str(&format!("<h2>Result for {}</h2>\n", escape_html(filename)));
        }
        body.push_str(&format!(
            "<div class=\"answer\" id=\"answer\">{}</div>\n",
            escape_html(answer)
        ));
    }

    if !ui.info_links.is_empty() {
        body.push_str("<details>\n<summary>About this app</summary>\n<ul>\n");
        for link in &ui.info_links {
            body.push_str(&format!(
                "<li><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></li>\n",
                escape_html(&link.url),
                escape_html(&link.label)
            ));
        }
        body.push_str("</ul>\n</details>\n");
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(&ui.title),
        STYLE,
        body
    )
}
