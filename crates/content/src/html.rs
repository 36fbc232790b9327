//! Minimal HTML reader: document title plus the text of one content element.
//!
//! This is not a conforming HTML parser. It understands enough structure to
//! pull `<title>` and the balanced contents of a single element picked by a
//! simple selector (`main`, `#content`, `.article`, `div#content`,
//! `section.body`).

use regex::Regex;

/// Title and body text pulled out of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub title: String,
    pub body: String,
}

/// Simple selector: optional tag name, optional id, optional class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub class: Option<String>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err("empty selector".into());
        }
        if input.contains(char::is_whitespace) || input.contains(['>', '+', '~', '[', ':']) {
            return Err(format!(
                "unsupported selector '{input}' (expected tag, #id, .class or tag#id / tag.class)"
            ));
        }

        let split_at = input.find(['#', '.']).unwrap_or(input.len());
        let (tag, rest) = input.split_at(split_at);
        let tag = (!tag.is_empty()).then(|| tag.to_ascii_lowercase());

        let (id, class) = match rest.chars().next() {
            None => (None, None),
            Some('#') => (Some(rest[1..].to_string()), None),
            Some(_) => (None, Some(rest[1..].to_string())),
        };

        if id.as_deref() == Some("") || class.as_deref() == Some("") {
            return Err(format!("selector '{input}' has an empty id or class"));
        }
        if id.as_deref().is_some_and(|v| v.contains(['#', '.']))
            || class.as_deref().is_some_and(|v| v.contains(['#', '.']))
        {
            return Err(format!("selector '{input}' combines more than one id/class"));
        }
        if let Some(ref t) = tag {
            if !t.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(format!("invalid tag name in selector '{input}'"));
            }
        }

        Ok(Self { tag, id, class })
    }
}

/// Compiled reader, built once per run and reused for every document.
pub struct HtmlReader {
    selector: Selector,
    title_re: Regex,
    open_tag_re: Regex,
    attr_re: Regex,
    strip_block_re: Regex,
    tag_re: Regex,
    entity_re: Regex,
    space_re: Regex,
}

impl HtmlReader {
    pub fn new(selector: &str) -> Result<Self, String> {
        let selector = Selector::parse(selector)?;
        Ok(Self {
            selector,
            title_re: compile(r"(?is)<title(?:\s[^>]*)?>(.*?)</title\s*>")?,
            open_tag_re: compile(r"(?is)<([a-z][a-z0-9-]*)(\s[^>]*)?>")?,
            attr_re: compile(
                r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#,
            )?,
            strip_block_re: compile(
                r"(?is)<!--.*?-->|<script(?:\s[^>]*)?>.*?</script\s*>|<style(?:\s[^>]*)?>.*?</style\s*>",
            )?,
            tag_re: compile(r"(?s)<[^>]*>")?,
            entity_re: compile(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);")?,
            space_re: compile(r"\s+")?,
        })
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Extract title and body text. The error string names what is missing.
    ///
    /// Comments, scripts and styles are removed first, so markup inside them
    /// never counts as the title or the content element.
    pub fn extract(&self, html: &str) -> Result<Extracted, String> {
        let html = self.strip_block_re.replace_all(html, " ");
        let html = html.as_ref();

        let raw_title = self
            .title_re
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .ok_or("missing <title> element")?;
        let title = self.to_text(raw_title);
        if title.is_empty() {
            return Err("empty <title> element".into());
        }

        let inner = self
            .select_inner(html)
            .ok_or_else(|| format!("no element matches selector {}", describe(&self.selector)))?;
        let body = self.to_text(inner);

        Ok(Extracted { title, body })
    }

    /// Inner markup of the first element matching the selector.
    fn select_inner<'a>(&self, html: &'a str) -> Option<&'a str> {
        for caps in self.open_tag_re.captures_iter(html) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str().to_ascii_lowercase();
            let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or("");

            if !self.matches(&name, attrs) {
                continue;
            }
            if whole.as_str().ends_with("/>") {
                return Some("");
            }
            return Some(self.balanced_inner(html, &name, whole.end()));
        }
        None
    }

    fn matches(&self, name: &str, attrs: &str) -> bool {
        if let Some(ref tag) = self.selector.tag {
            if tag != name {
                return false;
            }
        }
        if self.selector.id.is_none() && self.selector.class.is_none() {
            return true;
        }

        let mut id_ok = self.selector.id.is_none();
        let mut class_ok = self.selector.class.is_none();
        for caps in self.attr_re.captures_iter(attrs) {
            let key = caps.get(1).map(|m| m.as_str().to_ascii_lowercase());
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or("");
            match key.as_deref() {
                Some("id") => id_ok |= self.selector.id.as_deref() == Some(value),
                Some("class") => {
                    class_ok |= self
                        .selector
                        .class
                        .as_deref()
                        .is_some_and(|c| value.split_whitespace().any(|v| v == c))
                }
                _ => {}
            }
        }
        id_ok && class_ok
    }

    /// Contents from `start` up to the close tag that balances the element
    /// opened just before `start`. An unclosed element runs to end of input.
    fn balanced_inner<'a>(&self, html: &'a str, name: &str, start: usize) -> &'a str {
        let Ok(edge_re) = Regex::new(&format!(
            r"(?is)<(/?){}(?:\s[^>]*)?>",
            regex::escape(name)
        )) else {
            return &html[start..];
        };

        let mut depth = 1usize;
        for m in edge_re.captures_iter(&html[start..]) {
            let Some(whole) = m.get(0) else { continue };
            let closing = m.get(1).is_some_and(|c| !c.as_str().is_empty());
            if closing {
                depth -= 1;
                if depth == 0 {
                    return &html[start..start + whole.start()];
                }
            } else if !whole.as_str().ends_with("/>") {
                depth += 1;
            }
        }
        &html[start..]
    }

    fn to_text(&self, markup: &str) -> String {
        let without_blocks = self.strip_block_re.replace_all(markup, " ");
        let without_tags = self.tag_re.replace_all(&without_blocks, " ");
        let decoded = self.entity_re.replace_all(&without_tags, |caps: &regex::Captures| {
            let entity = &caps[1];
            decode_entity(entity).unwrap_or_else(|| caps[0].to_string())
        });
        self.space_re.replace_all(decoded.trim(), " ").into_owned()
    }
}

fn compile(pattern: &str) -> Result<Regex, String> {
    Regex::new(pattern).map_err(|e| format!("invalid pattern {pattern}: {e}"))
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32).map(String::from);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32).map(String::from);
    }
    let ch = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "copy" => '©',
        _ => return None,
    };
    Some(ch.to_string())
}

fn describe(selector: &Selector) -> String {
    let mut out = selector.tag.clone().unwrap_or_default();
    if let Some(ref id) = selector.id {
        out.push('#');
        out.push_str(id);
    }
    if let Some(ref class) = selector.class {
        out.push('.');
        out.push_str(class);
    }
    format!("'{out}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html>
<head><title>  Resetting   your password </title>
<style>body { color: red }</style></head>
<body>
  <nav class="menu">Home | Docs</nav>
  <main id="content" class="article wide">
    <h1>Reset</h1>
    <div><p>Click <b>Forgot</b> &amp; follow the link.</p></div>
    <script>var x = "<div>";</script>
    <div>Done &#8212; that&#39;s it.</div>
  </main>
  <footer>© Example</footer>
</body>
</html>"#;

    #[test]
    fn parses_selectors() {
        assert_eq!(
            Selector::parse("main").unwrap(),
            Selector { tag: Some("main".into()), id: None, class: None }
        );
        assert_eq!(
            Selector::parse("#content").unwrap(),
            Selector { tag: None, id: Some("content".into()), class: None }
        );
        assert_eq!(
            Selector::parse("DIV.article").unwrap(),
            Selector { tag: Some("div".into()), id: None, class: Some("article".into()) }
        );
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("div p").is_err());
        assert!(Selector::parse("#").is_err());
        assert!(Selector::parse("a#b.c").is_err());
    }

    #[test]
    fn extracts_title_and_body_text() {
        let reader = HtmlReader::new("body").unwrap();
        let out = reader.extract(PAGE).unwrap();
        assert_eq!(out.title, "Resetting your password");
        assert!(out.body.starts_with("Home | Docs Reset Click Forgot & follow the link."));
        assert!(out.body.contains("Done — that's it."));
        assert!(out.body.ends_with("© Example"));
        assert!(!out.body.contains("var x"));
        assert!(!out.body.contains("color: red"));
    }

    #[test]
    fn selects_element_by_id_and_class() {
        for sel in ["#content", ".article", "main.wide", "main#content", "main"] {
            let reader = HtmlReader::new(sel).unwrap();
            let out = reader.extract(PAGE).unwrap();
            assert_eq!(
                out.body,
                "Reset Click Forgot & follow the link. Done — that's it.",
                "selector {sel}"
            );
        }
    }

    #[test]
    fn nested_same_tag_is_balanced() {
        let html = "<title>T</title><div class=\"x\">a<div>b</div>c</div><div>outside</div>";
        let reader = HtmlReader::new(".x").unwrap();
        assert_eq!(reader.extract(html).unwrap().body, "a b c");
    }

    const DRAFTS: &str = "<title>Live</title>\
        <!-- <div id=\"content\">OLD DRAFT</div> -->\
        <div id=\"content\">live text</div>\
        <script>var s='<main>js</main>';</script>\
        <main>real main</main>";

    #[test]
    fn commented_out_element_is_ignored() {
        let reader = HtmlReader::new("#content").unwrap();
        assert_eq!(reader.extract(DRAFTS).unwrap().body, "live text");
    }

    #[test]
    fn tags_inside_scripts_are_ignored() {
        let reader = HtmlReader::new("main").unwrap();
        assert_eq!(reader.extract(DRAFTS).unwrap().body, "real main");
    }

    #[test]
    fn commented_out_title_is_ignored() {
        let reader = HtmlReader::new("body").unwrap();
        let html = "<!-- <title>Old</title> --><title>New</title><body>x</body>";
        assert_eq!(reader.extract(html).unwrap().title, "New");

        let err = reader.extract("<!-- <title>Old</title> --><body>x</body>").unwrap_err();
        assert!(err.contains("missing <title>"), "{err}");
    }

    #[test]
    fn missing_title_is_an_error() {
        let reader = HtmlReader::new("body").unwrap();
        let err = reader.extract("<html><body>hi</body></html>").unwrap_err();
        assert!(err.contains("<title>"), "{err}");

        let err = reader.extract("<title>   </title><body>hi</body>").unwrap_err();
        assert!(err.contains("empty"), "{err}");
    }

    #[test]
    fn missing_content_element_is_an_error() {
        let reader = HtmlReader::new("#content").unwrap();
        let err = reader.extract("<title>T</title><body>hi</body>").unwrap_err();
        assert!(err.contains("'#content'"), "{err}");
    }

    #[test]
    fn unknown_entities_are_kept() {
        let reader = HtmlReader::new("body").unwrap();
        let out = reader.extract("<title>A &foo; B</title><body>x</body>").unwrap();
        assert_eq!(out.title, "A &foo; B");
    }
}
