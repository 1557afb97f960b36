use regex::Regex;
use scraper::{ElementRef, Selector};

/// Parses a CSS selector literal. Only ever called with string constants.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

/// What sits at a given place in the markup: an element, a bare text node,
/// or nothing at all.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Element(ElementRef<'a>),
    Text(&'a str),
    Absent,
}

impl<'a> From<Option<ElementRef<'a>>> for Node<'a> {
    fn from(element: Option<ElementRef<'a>>) -> Self {
        match element {
            Some(element) => Node::Element(element),
            None => Node::Absent,
        }
    }
}

impl<'a> Node<'a> {
    /// First descendant element matching `selector`.
    pub fn find(self, selector: &Selector) -> Node<'a> {
        match self {
            Node::Element(element) => element.select(selector).next().into(),
            Node::Text(_) | Node::Absent => Node::Absent,
        }
    }

    /// Last descendant element matching `selector`.
    pub fn find_last(self, selector: &Selector) -> Node<'a> {
        match self {
            Node::Element(element) => element.select(selector).last().into(),
            Node::Text(_) | Node::Absent => Node::Absent,
        }
    }

    /// Trimmed text content; `None` when absent.
    pub fn text(self) -> Option<String> {
        match self {
            Node::Element(element) => Some(element_text(element)),
            Node::Text(text) => Some(text.trim().to_string()),
            Node::Absent => None,
        }
    }

    pub fn attr(self, name: &str) -> Option<String> {
        match self {
            Node::Element(element) => element.value().attr(name).map(str::to_string),
            Node::Text(_) | Node::Absent => None,
        }
    }

    pub fn has_class(self, class: &str) -> bool {
        match self {
            Node::Element(element) => element.value().classes().any(|c| c == class),
            Node::Text(_) | Node::Absent => false,
        }
    }
}

/// All text below `element`, concatenated and trimmed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Every text node trimmed on its own, then joined without separator.
pub fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect::<String>()
}

/// German postal codes are exactly five digits.
pub fn is_valid_postal_code(postal_code: &str) -> bool {
    let pattern = Regex::new(r"^\d{5}$").expect("valid postal code pattern");
    pattern.is_match(postal_code)
}
