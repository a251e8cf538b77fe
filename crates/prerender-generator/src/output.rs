//! Page path → output file mapping.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

/// Map a logical page path to the file name it is written to, relative to the
/// output directory.
///
/// `trailing_slash` is the site policy: `None` is the legacy layout where every
/// page becomes `<path>/index.html`, `Some(true)` always emits directories and
/// `Some(false)` emits `<path>.html` unless the path itself ends with a slash.
/// Paths already naming an `.html`/`.htm` file are kept as they are.
#[must_use]
pub fn output_file_name(path: &str, trailing_slash: Option<bool>) -> String {
    let relative = path.strip_prefix(['/', '\\']).unwrap_or(path);

    if has_html_extension(relative) {
        return relative.to_string();
    }

    let Some(trailing_slash) = trailing_slash else {
        return join_index(relative);
    };

    if relative.is_empty() || path.ends_with('/') || trailing_slash {
        join_index(relative)
    } else {
        format!("{relative}.html")
    }
}

/// Replace a leading `base_url` with `/` so the path is relative to the site root.
///
/// Paths outside the base URL are returned untouched.
#[must_use]
pub fn strip_base_url<'a>(path: &'a str, base_url: &str) -> Cow<'a, str> {
    if base_url.is_empty() || base_url == "/" {
        return Cow::Borrowed(path);
    }

    match path.strip_prefix(base_url) {
        Some(rest) => Cow::Owned(format!("/{rest}")),
        None => Cow::Borrowed(path),
    }
}

/// Absolute location a page is written to.
#[must_use]
pub fn output_file_path(
    output_dir: &Path,
    path: &str,
    base_url: &str,
    trailing_slash: Option<bool>,
) -> PathBuf {
    let site_path = strip_base_url(path, base_url);
    output_dir.join(output_file_name(&site_path, trailing_slash))
}

fn has_html_extension(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm")
}

fn join_index(dir: &str) -> String {
    if dir.is_empty() {
        "index.html".to_string()
    } else if dir.ends_with(['/', '\\']) {
        format!("{dir}index.html")
    } else {
        format!("{dir}/index.html")
    }
}
