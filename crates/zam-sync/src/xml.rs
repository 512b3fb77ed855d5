//! A small owned element tree over quick-xml, enough for the AN feeds.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::FetchError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Local name, without namespace prefix.
    pub name: String,
    /// Attributes keyed by their qualified name (`xsi:nil`).
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    /// Parse a document and return its root element.
    pub fn parse(bytes: &[u8]) -> Result<Element, FetchError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);
        let mut buf = Vec::new();
        // Synthetic document node at the bottom of the stack.
        let mut stack = vec![Element::default()];

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(start) => stack.push(element_from(&start)?),
                Event::Empty(start) => {
                    let element = element_from(&start)?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(element);
                    }
                }
                Event::End(_) => {
                    if stack.len() < 2 {
                        return Err(FetchError::Invalid("unbalanced XML end tag".into()));
                    }
                    if let Some(element) = stack.pop() {
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(element);
                        }
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    let data = data.into_inner();
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if stack.len() != 1 {
            return Err(FetchError::Invalid("unterminated XML element".into()));
        }
        stack
            .pop()
            .and_then(|document| document.children.into_iter().next())
            .ok_or_else(|| FetchError::Invalid("empty XML document".into()))
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_nil(&self) -> bool {
        self.attr("xsi:nil") == Some("true")
    }

    /// Text of the child element `name`, or `None` when it is absent or
    /// marked `xsi:nil="true"`.
    pub fn text_of(&self, name: &str) -> Option<&str> {
        self.child(name)
            .filter(|c| !c.is_nil())
            .map(|c| c.text.as_str())
    }

    /// Like [`Element::text_of`], but a missing child is an error.
    pub fn required_text(&self, name: &str) -> Result<Option<&str>, FetchError> {
        let child = self
            .child(name)
            .ok_or_else(|| FetchError::Invalid(format!("missing <{name}> in <{}>", self.name)))?;
        Ok((!child.is_nil()).then_some(child.text.as_str()))
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, FetchError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        name,
        attrs,
        children: Vec::new(),
        text: String::new(),
    })
}
