use std::fmt;

use crate::error::UnknownLink;

/// Sequential identifier of a hyperlink span, starting at 0 in every document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(pub usize);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Metadata recorded for one `<a>` span.
///
/// `target` is opaque to the layout engine: it is the `href` of the tag (empty when absent).
/// Any other attributes of the tag are kept in `attrs` for the application to interpret.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Link {
    pub target: String,
    pub text: String,
    pub attrs: Vec<(String, String)>,
}

impl Link {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Append-only table of the links discovered while laying out one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkTable {
    links: Vec<Link>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, link: Link) -> LinkId {
        self.links.push(link);
        LinkId(self.links.len() - 1)
    }

    pub fn resolve(&self, id: LinkId) -> Result<&Link, UnknownLink> {
        self.links.get(id.0).ok_or(UnknownLink(id))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.links.iter().enumerate().map(|(i, l)| (LinkId(i), l))
    }

    pub(crate) fn push_text(&mut self, id: LinkId, ch: char) {
        if let Some(link) = self.links.get_mut(id.0) {
            link.text.push(ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_from_zero() {
        let mut table = LinkTable::new();
        assert_eq!(table.register(Link::new("/a")), LinkId(0));
        assert_eq!(table.register(Link::new("/b")), LinkId(1));
        assert_eq!(table.resolve(LinkId(1)).unwrap().target, "/b");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn unregistered_id_is_unknown() {
        let table = LinkTable::new();
        assert_eq!(table.resolve(LinkId(0)), Err(UnknownLink(LinkId(0))));
    }

    #[test]
    fn attr_lookup() {
        let mut link = Link::new("");
        link.attrs.push(("data-num".into(), "42".into()));
        assert_eq!(link.attr("data-num"), Some("42"));
        assert_eq!(link.attr("data-thread"), None);
    }
}
