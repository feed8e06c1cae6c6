//! Directory listing module
//!
//! Enumerates the immediate children of a directory and renders them as a
//! minimal HTML document. Entries are sorted by name so the output is
//! stable across platforms and runs.

use crate::handler::upload::is_staging_name;
use crate::logger;
use std::io;
use std::path::Path;
use tokio::fs;

/// One immediate child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read the immediate children of `dir`, sorted by name
///
/// Upload staging files are hidden, and names that are not valid UTF-8 are
/// skipped since no request path can address them.
pub async fn read_entries(dir: &Path) -> io::Result<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            logger::log_debug(&format!(
                "Skipping non UTF-8 entry in {}",
                dir.display()
            ));
            continue;
        };
        if is_staging_name(&name) {
            continue;
        }

        // Follow symlinks so a link to a directory is listed as one
        let is_dir = match fs::metadata(entry.path()).await {
            Ok(meta) => meta.is_dir(),
            Err(_) => entry.file_type().await.is_ok_and(|t| t.is_dir()),
        };

        entries.push(DirectoryEntry { name, is_dir });
    }

    entries.sort();
    Ok(entries)
}

/// Render a listing for the directory addressed by `segments`
pub fn render_listing(segments: &[String], entries: &[DirectoryEntry]) -> String {
    let base = encode_path(segments);
    let title = escape_html(&format!("Index of {}", display_path(segments)));

    let mut html = String::with_capacity(256 + entries.len() * 64);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n</head>\n<body>\n"));
    html.push_str(&format!("<h1>{title}</h1>\n<ul>\n"));

    for entry in entries {
        let mut href = format!("{base}{}", urlencoding::encode(&entry.name));
        if entry.is_dir {
            href.push('/');
        }
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape_html(&href),
            escape_html(&entry.name)
        ));
    }

    html.push_str("</ul>\n</body>\n</html>\n");
    html
}

/// Percent-encoded path of a directory, with leading and trailing slash
fn encode_path(segments: &[String]) -> String {
    let mut path = String::from("/");
    for segment in segments {
        path.push_str(&urlencoding::encode(segment));
        path.push('/');
    }
    path
}

fn display_path(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
