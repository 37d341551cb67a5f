// core/src/xml.rs
use std::collections::BTreeMap;

use crate::error::Result;

/// Eid XML-element (roxmltree låner input-strengen, dette gjør ikke det).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let attributes = node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect();
        let children = node
            .children()
            .filter(|c| c.is_element())
            .map(XmlElement::from_node)
            .collect();
        XmlElement {
            name: node.tag_name().name().to_string(),
            attributes,
            text: node.text().map(str::to_string),
            children,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Alle etterkommere langs en `a/b/c`-sti, relativt til dette elementet.
    pub fn find_all(&self, path: &str) -> Vec<&XmlElement> {
        let mut current = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|e| e.children.iter().filter(move |c| c.name == step))
                .collect();
        }
        current
    }
}

/// Trim, bytt ut `&hellip;` (som parseren ikke kjenner) med `...`, og parse.
pub fn parse_graph_xml(raw: &str) -> Result<XmlElement> {
    let cleaned = raw.trim().replace("&hellip;", "...");
    let doc = roxmltree::Document::parse(&cleaned)?;
    Ok(XmlElement::from_node(doc.root_element()))
}
