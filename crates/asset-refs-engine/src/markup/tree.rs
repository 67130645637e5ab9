use logos::Logos;

use super::lexer::{Markup, TokenKind, lex_error};
use super::tag::OpenTag;
use crate::error::RewriteError;

/// Elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Stable handle to a node in a [`Fragment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: OpenTag,
    /// Source text of the end tag; `None` when the input never closed it.
    end_tag: Option<String>,
}

impl Element {
    pub fn name(&self) -> &str {
        self.tag.name()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.tag.attribute(name)
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.iter().any(|v| self.tag.is_named(v))
    }

    fn is_raw_text(&self) -> bool {
        RAW_TEXT_ELEMENTS.iter().any(|v| self.tag.is_named(v))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Root,
    Element(Element),
    Text(String),
    Comment(String),
    /// Declarations and unmatched end tags, written back verbatim.
    Raw(String),
}

/// Serializer work item.
enum Step {
    Open(NodeId),
    Close(NodeId),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// An HTML fragment parsed into an arena of nodes.
///
/// Nodes are never removed from the arena; replacing content detaches the
/// old nodes, so handles collected before a mutation stay valid.
#[derive(Debug, Clone)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    const ROOT: NodeId = NodeId(0);

    pub fn parse(input: &str) -> Result<Self, RewriteError> {
        let mut fragment = Fragment {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Root,
            }],
        };
        let mut open = vec![Self::ROOT];
        let mut lexer = TokenKind::lexer(input);

        while let Some(result) = lexer.next() {
            let offset = lexer.span().start;
            let kind = result.map_err(|err| lex_error(&err, offset))?;
            let text = lexer.slice();
            let parent = open.last().copied().unwrap_or(Self::ROOT);

            match kind {
                TokenKind::Text | TokenKind::Markup(Markup::Stray) => {
                    fragment.push_text(parent, text);
                }
                TokenKind::Markup(Markup::Comment) => {
                    fragment.push(parent, NodeData::Comment(text.to_string()));
                }
                TokenKind::Markup(Markup::Declaration) => {
                    fragment.push(parent, NodeData::Raw(text.to_string()));
                }
                TokenKind::Markup(Markup::StartTag) => {
                    let element = Element {
                        tag: OpenTag::parse(text),
                        end_tag: None,
                    };
                    if element.is_void() || element.tag.is_self_closing() {
                        fragment.push(parent, NodeData::Element(element));
                        continue;
                    }
                    let raw_text = element.is_raw_text();
                    let name = element.name().to_string();
                    let id = fragment.push(parent, NodeData::Element(element));
                    open.push(id);

                    if raw_text {
                        // Skip the lexer over the content; the end tag lexes normally.
                        let rest = lexer.remainder();
                        let len = find_end_tag(rest, &name).unwrap_or(rest.len());
                        if len > 0 {
                            fragment.push_text(id, &rest[..len]);
                            lexer.bump(len);
                        }
                    }
                }
                TokenKind::Markup(Markup::EndTag) => {
                    let name = end_tag_name(text);
                    let matching = open.iter().rposition(|&id| {
                        fragment
                            .element(id)
                            .is_some_and(|element| element.tag.is_named(name))
                    });
                    match matching {
                        Some(position) => {
                            let id = open[position];
                            open.truncate(position);
                            if let Some(element) = fragment.element_mut(id) {
                                element.end_tag = Some(text.to_string());
                            }
                        }
                        None => {
                            fragment.push(parent, NodeData::Raw(text.to_string()));
                        }
                    }
                }
            }
        }

        Ok(fragment)
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Whether `id` is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while current != Self::ROOT {
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        true
    }

    /// All nodes below `id` in document (pre-)order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Elements carrying `attribute`, in document order.
    pub fn elements_with_attribute(&self, attribute: &str) -> Vec<NodeId> {
        self.descendants(Self::ROOT)
            .into_iter()
            .filter(|&id| {
                self.element(id)
                    .is_some_and(|element| element.tag.has_attribute(attribute))
            })
            .collect()
    }

    pub fn first_descendant_element(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(id).into_iter().find(|&node| {
            self.element(node)
                .is_some_and(|element| element.tag.is_named(name))
        })
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.element(child).is_some())
    }

    /// Replaces the children of `target` with copies of the children of
    /// `source_parent` in `source`.
    pub fn replace_children(&mut self, target: NodeId, source: &Fragment, source_parent: NodeId) {
        for child in std::mem::take(&mut self.nodes[target.0].children) {
            self.nodes[child.0].parent = None;
        }
        self.graft(target, source, source_parent);
    }

    /// Copies the subtrees below `source_parent` under `parent`.
    fn graft(&mut self, parent: NodeId, source: &Fragment, source_parent: NodeId) {
        let mut stack: Vec<(NodeId, NodeId)> = source
            .children(source_parent)
            .iter()
            .rev()
            .map(|&child| (parent, child))
            .collect();
        while let Some((parent, source_id)) = stack.pop() {
            let id = self.push(parent, source.data(source_id).clone());
            stack.extend(source.children(source_id).iter().rev().map(|&child| (id, child)));
        }
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serializes the whole fragment.
    pub fn to_html(&self) -> String {
        self.inner_html(Self::ROOT)
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let mut stack = vec![Step::Open(id)];
        while let Some(step) = stack.pop() {
            let id = match step {
                Step::Open(id) => id,
                Step::Close(id) => {
                    if let Some(end_tag) = self.element(id).and_then(|e| e.end_tag.as_deref()) {
                        out.push_str(end_tag);
                    }
                    continue;
                }
            };
            match self.data(id) {
                NodeData::Root => {}
                NodeData::Element(element) => {
                    element.tag.write_to(out);
                    stack.push(Step::Close(id));
                }
                NodeData::Text(text) | NodeData::Comment(text) | NodeData::Raw(text) => {
                    out.push_str(text);
                }
            }
            stack.extend(self.children(id).iter().rev().map(|&child| Step::Open(child)));
        }
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.nodes[parent.0].children.last()
            && let NodeData::Text(existing) = &mut self.nodes[last.0].data
        {
            existing.push_str(text);
            return;
        }
        self.push(parent, NodeData::Text(text.to_string()));
    }
}

fn end_tag_name(raw: &str) -> &str {
    let body = raw.trim_start_matches("</");
    let end = body
        .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
        .unwrap_or(body.len());
    &body[..end]
}

/// Byte offset of the `</name` that closes a raw text element.
fn find_end_tag(rest: &str, name: &str) -> Option<usize> {
    rest.match_indices("</").map(|(i, _)| i).find(|&i| {
        let after = i + 2;
        let named = rest
            .get(after..after + name.len())
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name));
        let closed = match rest.as_bytes().get(after + name.len()) {
            None => true,
            Some(&b) => b == b'>' || b == b'/' || b.is_ascii_whitespace(),
        };
        named && closed
    })
}
