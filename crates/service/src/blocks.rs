//! Structured article bodies.
//!
//! Articles are edited as an ordered list of blocks and stored as JSON;
//! [`render_html`] turns them into the markup the public pages embed.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Heading {
        #[serde(default = "default_heading_level")]
        level: u8,
        text: String,
    },
    /// Inline-formatted paragraph; `html` is emitted as authored.
    Text { html: String },
    Image {
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Gallery { images: Vec<String> },
    List {
        #[serde(default)]
        ordered: bool,
        items: Vec<String>,
    },
    Quote { text: String },
    Divider,
    Spacer,
    Columns { columns: Vec<Vec<Block>> },
}

fn default_heading_level() -> u8 {
    3
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

fn render_block(block: &Block, out: &mut String) {
    // Writing into a String cannot fail.
    let _ = match block {
        Block::Heading { level, text } => {
            let level = (*level).clamp(1, 6);
            write!(out, "<h{level}>{}</h{level}>", escape(text))
        }
        Block::Text { html } => write!(out, "<p>{html}</p>"),
        Block::Image { src, caption: Some(caption) } => write!(
            out,
            "<figure><img src=\"{}\" alt=\"{}\"><figcaption>{}</figcaption></figure>",
            escape(src),
            escape(caption),
            escape(caption)
        ),
        Block::Image { src, caption: None } => write!(out, "<img src=\"{}\" alt=\"\">", escape(src)),
        Block::Gallery { images } => {
            out.push_str("<div class=\"gallery-grid\">");
            for src in images {
                let _ = write!(out, "<img src=\"{}\" alt=\"\">", escape(src));
            }
            out.push_str("</div>");
            Ok(())
        }
        Block::List { ordered, items } => {
            let tag = if *ordered { "ol" } else { "ul" };
            let _ = write!(out, "<{tag}>");
            for item in items {
                let _ = write!(out, "<li>{}</li>", escape(item));
            }
            write!(out, "</{tag}>")
        }
        Block::Quote { text } => write!(out, "<blockquote>{}</blockquote>", escape(text)),
        Block::Divider => write!(out, "<hr>"),
        Block::Spacer => write!(out, "<div class=\"spacer-block\"></div>"),
        Block::Columns { columns } => {
            out.push_str("<div class=\"columns-block\">");
            for column in columns {
                out.push_str("<div class=\"column\">");
                for inner in column {
                    render_block(inner, out);
                }
                out.push_str("</div>");
            }
            out.push_str("</div>");
            Ok(())
        }
    };
}

pub fn render_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        render_block(block, &mut out);
    }
    out
}
