//! Embedding of images referenced by the HTML body.
//!
//! `<img src="...">` references that point at local files relative to the
//! base directory are attached as inline parts and rewritten to `cid:` URLs.
//! Anything that cannot be resolved is left untouched.

use std::path::Path;
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};
use uuid::Uuid;

use crate::mail::attachment::{Attachment, Disposition};

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\bsrc\s*=\s*)(["'])([^"']+)(["'])"#)
        .expect("static image pattern is valid")
});

/// An inline part referenced from the HTML body by its Content-ID.
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub content_id: String,
    pub attachment: Attachment,
}

/// Rewrite local image references in `html` and return the images to embed.
/// The same file referenced twice is embedded once.
pub fn embed_images(html: &str, base_dir: &Path) -> (String, Vec<InlineImage>) {
    let mut images: Vec<InlineImage> = Vec::new();

    let rewritten = IMG_SRC.replace_all(html, |caps: &Captures<'_>| {
        let src = &caps[3];
        if is_remote(src) {
            return caps[0].to_string();
        }

        // References are URLs, so `my%20chart.png` names `my chart.png`.
        let decoded = percent_decode_str(src).decode_utf8_lossy();
        let path = base_dir.join(&*decoded);
        if !path.is_file() {
            tracing::debug!(src, "Inline image not found, leaving reference as-is");
            return caps[0].to_string();
        }

        let mut attachment = Attachment::from_path(&path);
        attachment.disposition = Disposition::Inline;

        let content_id = match images.iter().find(|i| i.attachment.path == attachment.path) {
            Some(existing) => existing.content_id.clone(),
            None => {
                let content_id = format!("{}@report-mailer", Uuid::new_v4().simple());
                images.push(InlineImage {
                    content_id: content_id.clone(),
                    attachment,
                });
                content_id
            }
        };

        format!("{}{}cid:{}{}", &caps[1], &caps[2], content_id, &caps[4])
    });

    (rewritten.into_owned(), images)
}

fn is_remote(src: &str) -> bool {
    let lower = src.trim_start().to_ascii_lowercase();
    ["http:", "https:", "cid:", "data:", "ftp:", "file:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}
