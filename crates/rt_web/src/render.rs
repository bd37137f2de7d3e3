//! Server-side HTML for the tracker page.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use rt_core::{CrewOutput, ResultTable};

use crate::CSV_FILENAME;

/// Prefix of the download link's `href`; the percent-encoded CSV follows it.
pub const CSV_DATA_URL_PREFIX: &str = "data:text/csv;charset=utf-8,";

const STYLE: &str = "body{font-family:sans-serif;margin:2rem auto;max-width:72rem;padding:0 1rem}\
table{border-collapse:collapse;width:100%}th,td{border:1px solid #ccc;padding:.4rem;text-align:left;vertical-align:top}\
th{background:#f3f3f3}.notice{background:#fff4e5;border:1px solid #f0b46c;padding:.6rem}\
pre{white-space:pre-wrap;background:#f7f7f7;padding:.6rem}";

/// Everything one rendering of the page can show.
#[derive(Debug, Default)]
pub struct PageView {
    pub topic: String,
    pub notice: Option<String>,
    pub table: ResultTable,
    /// CSV offered by the download link. Only set when the table has rows.
    pub csv: Option<String>,
    pub output: Option<CrewOutput>,
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn page(view: &PageView) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Regulatory News Tracker</title>\n");
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));
    html.push_str("<h1>Regulatory News Tracker</h1>\n");

    html.push_str(&form(&view.topic));

    if let Some(notice) = &view.notice {
        html.push_str(&format!("<p class=\"notice\">{}</p>\n", escape(notice)));
    }

    if !view.table.is_empty() {
        html.push_str(&table(&view.table));
    }

    if let Some(csv) = &view.csv {
        html.push_str(&download_link(csv));
    }

    if let Some(output) = &view.output {
        html.push_str(&details(output));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn form(topic: &str) -> String {
    format!(
        "<form method=\"post\" action=\"/track\" \
         onsubmit=\"document.getElementById('busy').hidden=false;this.querySelector('button').disabled=true\">\n\
         <label for=\"topic\">Enter a topic to track</label>\n\
         <input id=\"topic\" name=\"topic\" type=\"text\" value=\"{}\" placeholder=\"Anti-Money Laundering\">\n\
         <button type=\"submit\">Track news</button>\n\
         </form>\n\
         <p id=\"busy\" class=\"notice\" hidden>Tracking news, this can take a few minutes...</p>\n",
        escape(topic)
    )
}

fn table(table: &ResultTable) -> String {
    let mut html = String::from("<table>\n<thead><tr>");
    for column in table.columns() {
        html.push_str(&format!("<th>{}</th>", escape(column)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in table.rows() {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

/// The CSV travels inside the link itself, so the browser saves it byte for byte.
fn download_link(csv: &str) -> String {
    format!(
        "<p><a download=\"{}\" href=\"{}{}\">Download CSV</a></p>\n",
        CSV_FILENAME,
        CSV_DATA_URL_PREFIX,
        utf8_percent_encode(csv, NON_ALPHANUMERIC)
    )
}

fn details(output: &CrewOutput) -> String {
    let mut html = String::from("<details>\n<summary>Pipeline details</summary>\n");
    for (i, task) in output.tasks_output.iter().enumerate() {
        html.push_str(&format!(
            "<h3>Task {}: {}</h3>\n<p>{}</p>\n<pre>{}</pre>\n",
            i + 1,
            escape(&task.agent),
            escape(&task.summary()),
            escape(&task.raw)
        ));
        if !task.delegations.is_empty() {
            html.push_str("<ul>\n");
            for record in &task.delegations {
                html.push_str(&format!(
                    "<li>Delegated to {}: {} ({:?})</li>\n",
                    escape(&record.coworker),
                    escape(&record.task),
                    record.outcome
                ));
            }
            html.push_str("</ul>\n");
        }
    }

    let usage = &output.token_usage;
    html.push_str(&format!(
        "<h3>Token usage</h3>\n<ul>\n<li>Prompt tokens: {}</li>\n<li>Completion tokens: {}</li>\n\
         <li>Total tokens: {}</li>\n<li>Successful requests: {}</li>\n</ul>\n</details>\n",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens, usage.successful_requests
    ));
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_empty_page_has_form_only() {
        let html = page(&PageView::default());
        assert!(html.contains("action=\"/track\""));
        assert!(html.contains("id=\"busy\""));
        assert!(!html.contains("<table>"));
        assert!(!html.contains(CSV_DATA_URL_PREFIX));
        assert!(!html.contains("Pipeline details"));
    }

    #[test]
    fn test_table_cells_are_escaped() {
        let csv = "News_Title,News_Link\n<b>Fine</b>,https://www.centralbank.ie/news/article/fine\n";
        let view = PageView {
            topic: "AML".to_string(),
            table: ResultTable::from_csv(csv).unwrap(),
            csv: Some(csv.to_string()),
            ..PageView::default()
        };
        let html = page(&view);
        assert!(html.contains("<th>News_Title</th><th>News_Link</th>"));
        assert!(html.contains("<td>&lt;b&gt;Fine&lt;/b&gt;</td>"));
        assert!(html.contains("value=\"AML\""));
        assert!(html.contains(&format!(
            "<a download=\"regulatory_news.csv\" href=\"{}News%5FTitle%2CNews%5FLink%0A%3Cb%3EFine",
            CSV_DATA_URL_PREFIX
        )));
    }
}
