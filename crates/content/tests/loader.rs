use std::fs;
use std::path::Path;

use guidesync_content::{identity_key, load_all, ContentError, LoadOptions};
use url::Url;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn page(title: &str, body: &str) -> String {
    format!("<html><head><title>{title}</title></head><body><main>{body}</main></body></html>")
}

fn options() -> LoadOptions {
    LoadOptions::new("source-01", Url::parse("https://help.example.com/kb").unwrap())
}

#[test]
fn loads_recursively_in_path_order() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "zeta.html", &page("Zeta", "z"));
    write(dir.path(), "a/b/deep.html", &page("Deep", "d"));
    write(dir.path(), "a.html", &page("A", "a"));
    write(dir.path(), "notes.txt", "not html");
    write(dir.path(), "a/readme.md", "# nope");

    let docs = load_all(dir.path(), &options()).unwrap();
    let paths: Vec<&str> = docs.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(paths, vec!["a.html", "a/b/deep.html", "zeta.html"]);

    let deep = &docs[1];
    assert_eq!(deep.title, "Deep");
    assert_eq!(deep.body, "d");
    assert_eq!(deep.url, "https://help.example.com/kb/a/b/deep.html");
    assert_eq!(deep.identity_key, identity_key("source-01", "a/b/deep.html"));
}

#[test]
fn url_special_file_names_are_encoded() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a:b.html", &page("Colon", "c"));
    write(dir.path(), "faq#1.html", &page("Hash", "h"));
    write(dir.path(), "what?.html", &page("Question", "q"));

    let docs = load_all(dir.path(), &options()).unwrap();
    let urls: Vec<&str> = docs.iter().map(|d| d.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://help.example.com/kb/a:b.html",
            "https://help.example.com/kb/faq%231.html",
            "https://help.example.com/kb/what%3F.html",
        ]
    );
    for doc in &docs {
        let url = Url::parse(&doc.url).unwrap();
        assert_eq!(url.host_str(), Some("help.example.com"));
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }
}

#[test]
fn identities_are_stable_across_loads() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "one.html", &page("One", "1"));
    write(dir.path(), "two/two.html", &page("Two", "2"));

    let first = load_all(dir.path(), &options()).unwrap();
    let second = load_all(dir.path(), &options()).unwrap();
    assert_eq!(first, second);
    assert_ne!(first[0].identity_key, first[1].identity_key);
}

#[test]
fn selector_narrows_body() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "x.html",
        "<title>X</title><body><nav>menu</nav><article class=\"doc\">Only this</article></body>",
    );

    let docs = load_all(dir.path(), &options().with_selector(".doc")).unwrap();
    assert_eq!(docs[0].body, "Only this");
}

#[test]
fn one_bad_document_fails_the_whole_load() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "good.html", &page("Good", "fine"));
    write(dir.path(), "sub/bad.html", "<html><body>no title here</body></html>");

    let err = load_all(dir.path(), &options()).unwrap_err();
    match err {
        ContentError::Parse { path, reason } => {
            assert_eq!(path, "sub/bad.html");
            assert!(reason.contains("<title>"), "{reason}");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn non_utf8_document_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("latin1.html"), [0x3c, 0x74, 0xff, 0xfe]).unwrap();

    let err = load_all(dir.path(), &options()).unwrap_err();
    assert!(matches!(err, ContentError::Parse { ref path, .. } if path == "latin1.html"));
}

#[test]
fn invalid_selector_is_reported_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.html", &page("A", "a"));

    let err = load_all(dir.path(), &options().with_selector("div > p")).unwrap_err();
    assert!(matches!(err, ContentError::Selector(_)));
}

#[test]
fn empty_root_yields_no_documents() {
    let dir = tempfile::tempdir().unwrap();
    let docs = load_all(dir.path(), &options()).unwrap();
    assert!(docs.is_empty());
}
