use scraper::{ElementRef, Html, Selector};

use super::{ExtractionError, HtmlButton, HtmlForm, HtmlLink, HtmlText, PageExtractor, PageState};

/// Elements whose content never counts as page text.
const IGNORED_ANCESTORS: &[&str] = &[
    "script", "style", "head", "nav", "footer", "header", "aside", "noscript", "template",
];

const LINKS: &str = "a[href]";
const BUTTONS: &str = "button[id], input[type=submit][id], input[type=button][id]";
const FORMS: &str = "form[id]";
const FORM_FIELDS: &str = "input, select, textarea";
const TEXT: &str = "p, h1, h2, h3, h4, h5, h6, span, li, div";

/// [`PageExtractor`] backed by `scraper`.
///
/// Elements without an identity the driver can address (a button or form
/// without an id, a link without an href) are skipped.
#[derive(Debug, Clone, Default)]
pub struct HtmlExtractor {
    /// Fragments longer than this many characters are truncated. `None` keeps all.
    max_text_len: Option<usize>,
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_text_len(mut self, max: usize) -> Self {
        self.max_text_len = Some(max);
        self
    }

    fn links(&self, document: &Html) -> Result<Vec<HtmlLink>, ExtractionError> {
        Ok(document
            .select(&selector(LINKS)?)
            .filter_map(|a| {
                let href = a.value().attr("href")?.trim();
                if href.is_empty() || href.starts_with("javascript:") {
                    return None;
                }
                Some(HtmlLink {
                    url: href.to_string(),
                    text: self.clip(collapse(a.text())),
                })
            })
            .collect())
    }

    fn buttons(&self, document: &Html) -> Result<Vec<HtmlButton>, ExtractionError> {
        Ok(document
            .select(&selector(BUTTONS)?)
            .filter_map(|el| {
                let id = non_empty(el.value().attr("id"))?;
                let text = if el.value().name() == "input" {
                    el.value().attr("value").unwrap_or_default().trim().to_string()
                } else {
                    collapse(el.text())
                };
                Some(HtmlButton {
                    id,
                    text: self.clip(text),
                })
            })
            .collect())
    }

    fn forms(&self, document: &Html) -> Result<Vec<HtmlForm>, ExtractionError> {
        let fields = selector(FORM_FIELDS)?;
        Ok(document
            .select(&selector(FORMS)?)
            .filter_map(|form| {
                let id = non_empty(form.value().attr("id"))?;
                let fields = form
                    .select(&fields)
                    .filter(|field| {
                        !matches!(
                            field.value().attr("type"),
                            Some("hidden" | "submit" | "button" | "reset" | "image")
                        )
                    })
                    .filter_map(|field| {
                        non_empty(field.value().attr("name"))
                            .or_else(|| non_empty(field.value().attr("id")))
                    })
                    .collect();
                Some(HtmlForm {
                    id,
                    text: self.clip(collapse(form.text())),
                    fields,
                })
            })
            .collect())
    }

    fn texts(&self, document: &Html) -> Result<Vec<HtmlText>, ExtractionError> {
        Ok(document
            .select(&selector(TEXT)?)
            .filter(|el| !inside_ignored(el))
            .filter_map(|el| {
                let own = collapse(
                    el.children()
                        .filter_map(|child| child.value().as_text().map(|t| &**t)),
                );
                if own.is_empty() {
                    return None;
                }
                Some(HtmlText {
                    id: non_empty(el.value().attr("id")),
                    text: self.clip(own),
                })
            })
            .collect())
    }

    fn clip(&self, text: String) -> String {
        match self.max_text_len {
            Some(max) if text.chars().count() > max => {
                let mut clipped: String = text.chars().take(max).collect();
                clipped.push('…');
                clipped
            }
            _ => text,
        }
    }
}

impl PageExtractor for HtmlExtractor {
    fn extract(&self, markup: &str, url: Option<&str>) -> Result<PageState, ExtractionError> {
        let document = Html::parse_document(markup);

        Ok(PageState {
            url: url.map(str::to_string),
            links: self.links(&document)?,
            buttons: self.buttons(&document)?,
            forms: self.forms(&document)?,
            texts: self.texts(&document)?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

fn collapse<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    pieces
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn inside_ignored(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| IGNORED_ANCESTORS.contains(&ancestor.value().name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head><title>Shop</title><style>p { color: red }</style></head>
          <body>
            <header><p>Site banner</p></header>
            <nav><a href="/home">Home</a></nav>
            <h1 id="title">Find   a
                book</h1>
            <div>Welcome <span>back</span></div>
            <a href="/cart" id="cart-link">Cart (2)</a>
            <a>no href</a>
            <a href="javascript:void(0)">noop</a>
            <button id="buy">Buy now</button>
            <button>Unaddressable</button>
            <form id="search">
              Search the catalog
              <input type="text" name="q">
              <input type="hidden" name="token" value="abc">
              <select id="category"><option>Books</option></select>
              <input type="submit" id="go" value="Go">
            </form>
            <form><input name="orphan"></form>
            <script>document.write("<p>hidden</p>")</script>
            <footer><p>Copyright</p></footer>
          </body>
        </html>
    "#;

    fn state() -> PageState {
        HtmlExtractor::new()
            .extract(PAGE, Some("https://shop.test/"))
            .unwrap()
    }

    #[test]
    fn links_keep_href_and_collapsed_text() {
        let state = state();
        assert_eq!(state.url.as_deref(), Some("https://shop.test/"));
        assert_eq!(
            state.links,
            vec![
                HtmlLink { url: "/home".into(), text: "Home".into() },
                HtmlLink { url: "/cart".into(), text: "Cart (2)".into() },
            ]
        );
    }

    #[test]
    fn buttons_require_an_id() {
        let ids: Vec<_> = state().buttons.into_iter().map(|b| (b.id, b.text)).collect();
        assert_eq!(
            ids,
            vec![("buy".to_string(), "Buy now".to_string()), ("go".into(), "Go".into())]
        );
    }

    #[test]
    fn forms_list_addressable_fields() {
        let forms = state().forms;
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].id, "search");
        assert_eq!(forms[0].fields, vec!["q".to_string(), "category".to_string()]);
        assert!(forms[0].text.starts_with("Search the catalog"));
    }

    #[test]
    fn text_skips_chrome_and_scripts() {
        let texts = state().texts;
        let rendered: Vec<_> = texts.iter().map(|t| t.text.as_str()).collect();

        assert!(rendered.contains(&"Find a book"));
        assert!(rendered.contains(&"Welcome"));
        assert!(rendered.contains(&"back"));
        assert!(!rendered.iter().any(|t| t.contains("banner")));
        assert!(!rendered.iter().any(|t| t.contains("Copyright")));
        assert!(!rendered.iter().any(|t| t.contains("hidden")));

        let title = texts.iter().find(|t| t.text == "Find a book").unwrap();
        assert_eq!(title.id.as_deref(), Some("title"));
    }

    #[test]
    fn long_fragments_are_clipped() {
        let extractor = HtmlExtractor::new().with_max_text_len(5);
        let state = extractor
            .extract("<p>abcdefghij</p>", None)
            .unwrap();
        assert_eq!(state.texts[0].text, "abcde…");
    }

    #[test]
    fn empty_markup_yields_empty_state() {
        let state = HtmlExtractor::new().extract("", None).unwrap();
        assert!(state.is_empty());
    }
}
