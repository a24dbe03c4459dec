//! Markdown rendering of generated posts, and the reverse parse used by revisions

use crate::services::ai::generation::{BlogPost, BlogSection};

const REFERENCES_HEADING: &str = "**References:**";
const CONCLUSION_HEADING: &str = "Conclusion";
const TAKEAWAYS_HEADING: &str = "Key Takeaways";

pub fn to_markdown(post: &BlogPost) -> String {
    let mut markdown = format!("# {}\n\n", post.title);
    markdown.push_str(&format!("{}\n\n", post.introduction));

    for section in &post.sections {
        markdown.push_str(&format!("## {}\n\n", section.title));
        markdown.push_str(&format!("{}\n\n", section.content));
        if !section.citations.is_empty() {
            markdown.push_str(REFERENCES_HEADING);
            markdown.push('\n');
            for (i, citation) in section.citations.iter().enumerate() {
                markdown.push_str(&format!(
                    "{}. {} ({}s-{}s)\n",
                    i + 1,
                    citation.speaker.as_deref().unwrap_or("Unknown"),
                    citation.start_ms / 1000,
                    citation.end_ms / 1000
                ));
            }
            markdown.push('\n');
        }
    }

    markdown.push_str(&format!("## {}\n\n{}\n\n", CONCLUSION_HEADING, post.conclusion));
    markdown.push_str(&format!("## {}\n\n", TAKEAWAYS_HEADING));
    for takeaway in &post.key_takeaways {
        markdown.push_str(&format!("- {}\n", takeaway));
    }
    markdown
}

/// Recover the post layout from rendered markdown. Citations are not
/// recoverable from the reference list and come back empty.
pub fn from_markdown(markdown: &str) -> BlogPost {
    let mut title = String::new();
    let mut introduction: Vec<&str> = Vec::new();
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();
    let mut in_references = false;

    for line in markdown.lines() {
        if let Some(heading) = line.strip_prefix("# ") {
            if title.is_empty() {
                title = heading.trim().to_string();
                continue;
            }
        }
        if let Some(heading) = line.strip_prefix("## ") {
            sections.push((heading.trim().to_string(), Vec::new()));
            in_references = false;
            continue;
        }
        if line.trim() == REFERENCES_HEADING {
            in_references = true;
            continue;
        }
        if in_references {
            if line.trim().is_empty() {
                in_references = false;
            }
            continue;
        }
        match sections.last_mut() {
            Some((_, body)) => body.push(line),
            None => introduction.push(line),
        }
    }

    let mut conclusion = String::new();
    let mut key_takeaways = Vec::new();
    let mut body_sections = Vec::new();
    for (heading, body) in sections {
        let text = body.join("\n").trim().to_string();
        if heading == CONCLUSION_HEADING {
            conclusion = text;
        } else if heading == TAKEAWAYS_HEADING {
            key_takeaways = text
                .lines()
                .filter_map(|l| l.trim().strip_prefix("- "))
                .map(|l| l.trim().to_string())
                .collect();
        } else {
            body_sections.push(BlogSection {
                title: heading,
                content: text,
                citations: Vec::new(),
            });
        }
    }

    BlogPost {
        title,
        introduction: introduction.join("\n").trim().to_string(),
        sections: body_sections,
        conclusion,
        key_takeaways,
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Replace paired `marker` delimiters with an HTML tag
fn wrap_pairs(text: &str, marker: &str, tag: &str) -> String {
    let parts: Vec<&str> = text.split(marker).collect();
    if parts.len() < 3 {
        return text.to_string();
    }
    let mut result = String::new();
    let pairs = (parts.len() - 1) / 2;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            let opening = i % 2 == 1;
            if i <= pairs * 2 {
                result.push_str(if opening { "<" } else { "</" });
                result.push_str(tag);
                result.push('>');
            } else {
                result.push_str(marker);
            }
        }
        result.push_str(part);
    }
    result
}

/// Stands in for an unpaired `**` while single `*` pairs are matched
const LONE_BOLD: &str = "\u{E000}";

fn inline(text: &str) -> String {
    let escaped = escape_html(text);
    let bold = wrap_pairs(&escaped, "**", "strong");
    let code = wrap_pairs(&bold, "`", "code");
    let shielded = code.replace("**", LONE_BOLD);
    wrap_pairs(&shielded, "*", "em").replace(LONE_BOLD, "**")
}

enum Block {
    Paragraph(Vec<String>),
    Unordered(Vec<String>),
    Ordered(Vec<String>),
}

fn flush(block: &mut Option<Block>, html: &mut String) {
    match block.take() {
        Some(Block::Paragraph(lines)) => {
            html.push_str(&format!("<p>{}</p>\n", inline(&lines.join(" "))));
        }
        Some(Block::Unordered(items)) => {
            html.push_str("<ul>\n");
            for item in items {
                html.push_str(&format!("<li>{}</li>\n", inline(&item)));
            }
            html.push_str("</ul>\n");
        }
        Some(Block::Ordered(items)) => {
            html.push_str("<ol>\n");
            for item in items {
                html.push_str(&format!("<li>{}</li>\n", inline(&item)));
            }
            html.push_str("</ol>\n");
        }
        None => {}
    }
}

fn ordered_item(line: &str) -> Option<&str> {
    let (number, rest) = line.split_once(". ")?;
    if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
        Some(rest)
    } else {
        None
    }
}

/// Minimal Markdown to HTML: headings, paragraphs, lists and inline emphasis
pub fn markdown_to_html(markdown: &str) -> String {
    let mut html = String::new();
    let mut block: Option<Block> = None;

    for raw in markdown.lines() {
        let line = raw.trim();
        if line.is_empty() {
            flush(&mut block, &mut html);
            continue;
        }

        let level = line.chars().take_while(|c| *c == '#').count();
        if (1..=6).contains(&level) && line[level..].starts_with(' ') {
            flush(&mut block, &mut html);
            html.push_str(&format!(
                "<h{level}>{}</h{level}>\n",
                inline(line[level..].trim()),
                level = level
            ));
            continue;
        }

        if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            match &mut block {
                Some(Block::Unordered(items)) => items.push(item.to_string()),
                _ => {
                    flush(&mut block, &mut html);
                    block = Some(Block::Unordered(vec![item.to_string()]));
                }
            }
            continue;
        }

        if let Some(item) = ordered_item(line) {
            match &mut block {
                Some(Block::Ordered(items)) => items.push(item.to_string()),
                _ => {
                    flush(&mut block, &mut html);
                    block = Some(Block::Ordered(vec![item.to_string()]));
                }
            }
            continue;
        }

        match &mut block {
            Some(Block::Paragraph(lines)) => lines.push(line.to_string()),
            _ => {
                flush(&mut block, &mut html);
                block = Some(Block::Paragraph(vec![line.to_string()]));
            }
        }
    }
    flush(&mut block, &mut html);
    html
}
