use std::path::{Path, PathBuf};

use serde::Serialize;
use url::Url;

use crate::error::ContentError;
use crate::html::HtmlReader;
use crate::identity::identity_key;

// ── Model ───────────────────────────────────────────────────────────

/// One local document, ready to be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalDocument {
    /// Path relative to the content root, `/`-separated.
    pub path: String,
    pub title: String,
    pub body: String,
    pub identity_key: String,
    pub url: String,
}

/// How documents are discovered and identified.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Namespace mixed into every identity key (the external content source id).
    pub namespace: String,
    /// Public base URL documents are served under.
    pub target_base_url: Url,
    /// Selector for the element whose text becomes the body.
    pub selector: String,
    /// File extension to pick up, without the dot.
    pub extension: String,
}

impl LoadOptions {
    pub fn new(namespace: impl Into<String>, target_base_url: Url) -> Self {
        Self {
            namespace: namespace.into(),
            target_base_url: directory_url(target_base_url),
            selector: "body".into(),
            extension: "html".into(),
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Absolute URL for a root-relative document path. Each segment is
    /// percent-encoded, so `:`, `?` and `#` in file names stay in the path.
    pub fn document_url(&self, path: &str) -> Result<Url, url::ParseError> {
        let mut url = self.target_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(path.split('/'));
        Ok(url)
    }
}

/// A base URL without a trailing slash would lose its last segment on join.
fn directory_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load every document under `root`, sorted by relative path.
///
/// Fails on the first unreadable or unparsable file: reconciling a partial
/// corpus would delete the remote records of the files that were skipped.
pub fn load_all(root: &Path, options: &LoadOptions) -> Result<Vec<LocalDocument>, ContentError> {
    if !root.is_dir() {
        return Err(ContentError::RootMissing(root.to_path_buf()));
    }

    let reader = HtmlReader::new(&options.selector).map_err(ContentError::Selector)?;

    let mut files = discover(root, &options.extension)?;
    files.sort_by(|a, b| a.0.cmp(&b.0));

    tracing::debug!(root = %root.display(), files = files.len(), "discovered content files");

    let mut documents = Vec::with_capacity(files.len());
    for (rel_path, abs_path) in files {
        documents.push(load_one(&reader, options, rel_path, &abs_path)?);
    }

    tracing::info!("Found {} local documents", documents.len());
    Ok(documents)
}

fn discover(root: &Path, extension: &str) -> Result<Vec<(String, PathBuf)>, ContentError> {
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|source| ContentError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }

        let rel_path = relative_path(root, entry.path())?;
        files.push((rel_path, entry.into_path()));
    }

    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> Result<String, ContentError> {
    let display = path.display().to_string();
    let rel = path.strip_prefix(root).map_err(|_| ContentError::Parse {
        path: display.clone(),
        reason: "file is outside the content root".into(),
    })?;

    let mut parts = Vec::new();
    for component in rel.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| ContentError::Parse {
            path: display.clone(),
            reason: "path is not valid UTF-8".into(),
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

fn load_one(
    reader: &HtmlReader,
    options: &LoadOptions,
    rel_path: String,
    abs_path: &Path,
) -> Result<LocalDocument, ContentError> {
    let parse_err = |reason: String| ContentError::Parse {
        path: rel_path.clone(),
        reason,
    };

    let bytes = std::fs::read(abs_path).map_err(|e| parse_err(format!("cannot read: {e}")))?;
    let html = String::from_utf8(bytes).map_err(|_| parse_err("file is not valid UTF-8".into()))?;
    let extracted = reader.extract(&html).map_err(parse_err)?;
    let url = options
        .document_url(&rel_path)
        .map_err(|e| parse_err(format!("cannot build url: {e}")))?;

    tracing::debug!(path = %rel_path, title = %extracted.title, "loaded document");

    Ok(LocalDocument {
        identity_key: identity_key(&options.namespace, &rel_path),
        url: url.to_string(),
        title: extracted.title,
        body: extracted.body,
        path: rel_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(base: &str) -> LoadOptions {
        LoadOptions::new("src-1", Url::parse(base).unwrap())
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let opts = options("https://help.example.com/docs");
        assert_eq!(
            opts.document_url("guides/a.html").unwrap().as_str(),
            "https://help.example.com/docs/guides/a.html"
        );

        let opts = options("https://help.example.com/");
        assert_eq!(
            opts.document_url("a.html").unwrap().as_str(),
            "https://help.example.com/a.html"
        );
    }

    #[test]
    fn test_special_characters_stay_in_path() {
        let opts = options("https://docs.example.com/kb");
        assert_eq!(
            opts.document_url("a:b.html").unwrap().as_str(),
            "https://docs.example.com/kb/a:b.html"
        );
        assert_eq!(
            opts.document_url("faq#1.html").unwrap().as_str(),
            "https://docs.example.com/kb/faq%231.html"
        );
        assert_eq!(
            opts.document_url("guides/what?.html").unwrap().as_str(),
            "https://docs.example.com/kb/guides/what%3F.html"
        );

        let url = opts.document_url("faq#1.html").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/content");
        let path = Path::new("/content/guides/setup/a.html");
        assert_eq!(relative_path(root, path).unwrap(), "guides/setup/a.html");
    }

    #[test]
    fn test_missing_root() {
        let err = load_all(Path::new("/definitely/not/here"), &options("https://x.test/"))
            .unwrap_err();
        assert!(matches!(err, ContentError::RootMissing(_)));
    }
}
