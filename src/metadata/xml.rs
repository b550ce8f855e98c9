//! Field lookup in the game's per-item XML files.
//!
//! Paths are relative to the document root, `./`-prefixed and `/`-separated
//! (`./name/id`). Each step picks the first child element with that tag.

use std::path::Path;

use roxmltree::{Document, Node};

use crate::{Error, Result};

/// Parse the XML file at `path` and hand its root element to `read`.
pub fn read_file<T>(path: &Path, read: impl FnOnce(&Fields<'_, '_>) -> Result<T>) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let doc = Document::parse(&text)
        .map_err(|e| Error::parse(format!("XML {}", path.display()), e.to_string()))?;
    read(&Fields {
        root: doc.root_element(),
        path,
    })
}

/// Required-field accessors over one document.
pub struct Fields<'a, 'input> {
    root: Node<'a, 'input>,
    path: &'a Path,
}

impl<'a, 'input> Fields<'a, 'input> {
    /// Text of the element at `xpath`. An empty element reads as `""`.
    pub fn text(&self, xpath: &str) -> Result<String> {
        let node = find(self.root, xpath).ok_or_else(|| self.missing(xpath))?;
        Ok(node.text().unwrap_or_default().trim().to_owned())
    }

    pub fn int(&self, xpath: &str) -> Result<i64> {
        let text = self.text(xpath)?;
        text.parse().map_err(|_| {
            Error::parse(
                format!("XML {}", self.path.display()),
                format!("{xpath} is not an integer: {text:?}"),
            )
        })
    }

    fn missing(&self, xpath: &str) -> Error {
        Error::parse(
            format!("XML {}", self.path.display()),
            format!("missing element {xpath}"),
        )
    }
}

fn find<'a, 'input>(root: Node<'a, 'input>, xpath: &str) -> Option<Node<'a, 'input>> {
    xpath
        .trim_start_matches("./")
        .split('/')
        .try_fold(root, |node, tag| {
            node.children()
                .find(|child| child.is_element() && child.tag_name().name() == tag)
        })
}
