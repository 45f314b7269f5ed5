//! COLLADA document model
//!
//! Wraps an `xmltree` element tree with namespace prefixes stripped once at
//! load time, and exposes the tag/attribute lookups every extractor uses.

use anyhow::Context;
use std::borrow::Cow;
use std::path::Path;
use std::str::FromStr;
use xmltree::{Element, XMLNode};

use crate::error::{ConvertError, Result};

/// Parsed, namespace-free COLLADA document
///
/// Built once per conversion and only read afterwards.
#[derive(Debug)]
pub struct SceneDocument {
    root: Element,
}

impl SceneDocument {
    /// Parse a document from raw XML text
    pub fn parse(text: &str) -> Result<Self> {
        let mut root = Element::parse(text.as_bytes())
            .map_err(|e| ConvertError::MalformedDocument(e.to_string()))?;
        strip_namespaces(&mut root);
        Ok(Self { root })
    }

    /// Read and parse a `.dae` file; the file handle is closed before returning
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read COLLADA file: {:?}", path))?;
        let document =
            Self::parse(&text).with_context(|| format!("Failed to parse {:?}", path))?;
        tracing::debug!("Loaded {:?} (root <{}>)", path, document.root.name);
        Ok(document)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Top-level `library_*` element, if present
    pub fn library(&self, tag: &str) -> Option<&Element> {
        self.root.child(tag)
    }

    pub fn require_library(&self, tag: &str) -> Result<&Element> {
        self.root.require_child(tag)
    }
}

fn strip_namespaces(element: &mut Element) {
    element.prefix = None;
    element.namespace = None;
    element.namespaces = None;
    if let Some((_, local)) = element.name.split_once(':') {
        element.name = local.to_string();
    }
    for node in &mut element.children {
        if let XMLNode::Element(child) = node {
            strip_namespaces(child);
        }
    }
}

/// Tag, attribute and text lookups on document elements
pub trait ElementExt {
    /// Direct child elements, in document order
    fn elements(&self) -> impl Iterator<Item = &Element>;

    /// First direct child with the given tag
    fn child(&self, tag: &str) -> Option<&Element>;

    /// All direct children with the given tag
    fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element>;

    fn require_child(&self, tag: &str) -> Result<&Element>;

    /// First descendant with the given tag (depth-first, pre-order)
    fn find_descendant(&self, tag: &str) -> Option<&Element>;

    /// All descendants with the given tag (depth-first, pre-order)
    fn descendants_named(&self, tag: &str) -> Vec<&Element>;

    /// First descendant with the given tag whose attribute equals `value`
    fn find_with_attr(&self, tag: &str, attr: &str, value: &str) -> Option<&Element>;

    /// Direct `<input semantic="...">` child
    fn input(&self, semantic: &str) -> Option<&Element>;

    fn attr(&self, name: &str) -> Option<&str>;

    fn require_attr(&self, name: &str) -> Result<&str>;

    /// Concatenated text content, empty if none
    fn text(&self) -> Cow<'_, str>;

    /// Short human-readable label for error messages, e.g. `geometry 'Cube'`
    fn describe(&self) -> String;
}

impl ElementExt for Element {
    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            XMLNode::Element(child) => Some(child),
            _ => None,
        })
    }

    fn child(&self, tag: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == tag)
    }

    fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.name == tag)
    }

    fn require_child(&self, tag: &str) -> Result<&Element> {
        self.child(tag)
            .ok_or_else(|| ConvertError::missing(tag, self.describe()))
    }

    fn find_descendant(&self, tag: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.name == tag {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(tag) {
                return Some(found);
            }
        }
        None
    }

    fn descendants_named(&self, tag: &str) -> Vec<&Element> {
        fn walk<'a>(element: &'a Element, tag: &str, out: &mut Vec<&'a Element>) {
            for child in element.elements() {
                if child.name == tag {
                    out.push(child);
                }
                walk(child, tag, out);
            }
        }

        let mut out = Vec::new();
        walk(self, tag, &mut out);
        out
    }

    fn find_with_attr(&self, tag: &str, attr: &str, value: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.name == tag && child.attr(attr) == Some(value) {
                return Some(child);
            }
            if let Some(found) = child.find_with_attr(tag, attr, value) {
                return Some(found);
            }
        }
        None
    }

    fn input(&self, semantic: &str) -> Option<&Element> {
        self.children_named("input")
            .find(|i| i.attr("semantic") == Some(semantic))
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn require_attr(&self, name: &str) -> Result<&str> {
        self.attr(name)
            .ok_or_else(|| ConvertError::missing(format!("@{}", name), self.describe()))
    }

    fn text(&self) -> Cow<'_, str> {
        self.get_text().unwrap_or(Cow::Borrowed(""))
    }

    fn describe(&self) -> String {
        match self.attr("id").or_else(|| self.attr("sid")) {
            Some(id) => format!("{} '{}'", self.name, id),
            None => self.name.clone(),
        }
    }
}

/// Strip the leading `#` from a URL-style reference
pub fn fragment(url: &str) -> &str {
    url.strip_prefix('#').unwrap_or(url)
}

/// Parse whitespace-separated numbers, failing on the first bad token
pub fn parse_numbers<T: FromStr>(text: &str, context: &str) -> Result<Vec<T>> {
    text.split_whitespace()
        .map(|token| {
            token.parse::<T>().map_err(|_| ConvertError::InvalidNumber {
                context: context.to_string(),
                token: token.to_string(),
            })
        })
        .collect()
}

/// Float payload of a `<source>` with its accessor stride
#[derive(Debug, Clone)]
pub struct FloatSource {
    pub id: String,
    pub values: Vec<f32>,
    pub stride: usize,
}

impl FloatSource {
    /// Number of stride-sized tuples
    pub fn len(&self) -> usize {
        self.values.len() / self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Split into fixed-size tuples, keeping the leading `N` components of each
    pub fn tuples<const N: usize>(&self) -> Result<Vec<[f32; N]>> {
        if self.stride < N {
            return Err(ConvertError::count(
                format!("source '{}'", self.id),
                format!("stride {} is smaller than tuple width {}", self.stride, N),
            ));
        }
        Ok(self
            .values
            .chunks_exact(self.stride)
            .map(|chunk| {
                let mut tuple = [0.0; N];
                tuple.copy_from_slice(&chunk[..N]);
                tuple
            })
            .collect())
    }
}

/// Resolve `<source id=...>` below `scope` and read its `float_array`
///
/// The stride comes from `technique_common/accessor/@stride`, falling back to
/// `default_stride`. A declared `count` must match the token count and be a
/// multiple of the stride.
pub fn read_float_source(scope: &Element, id: &str, default_stride: usize) -> Result<FloatSource> {
    let source = scope
        .find_with_attr("source", "id", id)
        .ok_or_else(|| ConvertError::unresolved("source", id))?;
    let array = source.require_child("float_array")?;
    let context = format!("source '{}'", id);

    let values: Vec<f32> = parse_numbers(&array.text(), &context)?;
    let declared = check_declared_count(array, values.len(), &context)?;

    let stride = match accessor(source).and_then(|a| a.attr("stride")) {
        Some(stride) => stride.trim().parse::<usize>().map_err(|_| ConvertError::InvalidNumber {
            context: context.clone(),
            token: stride.to_string(),
        })?,
        None => default_stride,
    };
    if stride == 0 || declared % stride != 0 {
        return Err(ConvertError::count(
            context,
            format!("count {} is not a multiple of stride {}", declared, stride),
        ));
    }

    Ok(FloatSource {
        id: id.to_string(),
        values,
        stride,
    })
}

/// Resolve `<source id=...>` below `scope` and read its `Name_array`/`IDREF_array`
pub fn read_name_source(scope: &Element, id: &str) -> Result<Vec<String>> {
    let source = scope
        .find_with_attr("source", "id", id)
        .ok_or_else(|| ConvertError::unresolved("source", id))?;
    let array = source
        .child("Name_array")
        .or_else(|| source.child("IDREF_array"))
        .ok_or_else(|| ConvertError::missing("Name_array", source.describe()))?;
    let names: Vec<String> = array.text().split_whitespace().map(str::to_string).collect();
    check_declared_count(array, names.len(), &format!("source '{}'", id))?;
    Ok(names)
}

/// An array's `count` attribute must equal its token count; returns the count
fn check_declared_count(array: &Element, found: usize, context: &str) -> Result<usize> {
    let Some(count) = array.attr("count") else {
        return Ok(found);
    };
    let declared = count.trim().parse::<usize>().map_err(|_| ConvertError::InvalidNumber {
        context: context.to_string(),
        token: count.to_string(),
    })?;
    if declared != found {
        return Err(ConvertError::count(
            context,
            format!("declared count {} but found {} values", declared, found),
        ));
    }
    Ok(declared)
}

fn accessor(source: &Element) -> Option<&Element> {
    source.child("technique_common")?.child("accessor")
}
