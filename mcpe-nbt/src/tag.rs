use indexmap::IndexMap;

use crate::error::{NbtError, Result};

/// A top-level tag together with its name
pub type NamedTag = (String, Tag);

/// Tag kind ids as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagKind {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
}

impl TagKind {
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => TagKind::End,
            1 => TagKind::Byte,
            2 => TagKind::Short,
            3 => TagKind::Int,
            4 => TagKind::Long,
            5 => TagKind::Float,
            6 => TagKind::Double,
            7 => TagKind::ByteArray,
            8 => TagKind::String,
            9 => TagKind::List,
            10 => TagKind::Compound,
            11 => TagKind::IntArray,
            _ => return None,
        })
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            TagKind::End => "end",
            TagKind::Byte => "byte",
            TagKind::Short => "short",
            TagKind::Int => "int",
            TagKind::Long => "long",
            TagKind::Float => "float",
            TagKind::Double => "double",
            TagKind::ByteArray => "byte array",
            TagKind::String => "string",
            TagKind::List => "list",
            TagKind::Compound => "compound",
            TagKind::IntArray => "int array",
        }
    }
}

/// One node of a decoded tag tree
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    List(TagList),
    Compound(Compound),
    IntArray(Vec<i32>),
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::End => TagKind::End,
            Tag::Byte(_) => TagKind::Byte,
            Tag::Short(_) => TagKind::Short,
            Tag::Int(_) => TagKind::Int,
            Tag::Long(_) => TagKind::Long,
            Tag::Float(_) => TagKind::Float,
            Tag::Double(_) => TagKind::Double,
            Tag::ByteArray(_) => TagKind::ByteArray,
            Tag::String(_) => TagKind::String,
            Tag::List(_) => TagKind::List,
            Tag::Compound(_) => TagKind::Compound,
            Tag::IntArray(_) => TagKind::IntArray,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&TagList> {
        match self {
            Tag::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Tag::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// Homogeneous list; the element kind is fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct TagList {
    kind: TagKind,
    items: Vec<Tag>,
}

impl TagList {
    pub fn new(kind: TagKind) -> Self {
        Self { kind, items: Vec::new() }
    }

    /// Build a list, taking the element kind from the first item
    pub fn from_items(items: Vec<Tag>) -> Result<Self> {
        let kind = items.first().map(Tag::kind).unwrap_or(TagKind::End);
        let mut list = Self::new(kind);
        for item in items {
            list.push(item)?;
        }
        Ok(list)
    }

    pub fn push(&mut self, tag: Tag) -> Result<()> {
        if self.items.is_empty() && self.kind == TagKind::End {
            self.kind = tag.kind();
        }
        if tag.kind() != self.kind {
            return Err(NbtError::ListKindMismatch { expected: self.kind, actual: tag.kind() });
        }
        self.items.push(tag);
        Ok(())
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.items.iter()
    }

    /// Compound elements; empty for lists of any other kind
    pub fn compounds(&self) -> impl Iterator<Item = &Compound> {
        self.items.iter().filter_map(Tag::as_compound)
    }

    /// All elements as floats, if this is a float list
    pub fn floats(&self) -> Option<Vec<f32>> {
        if self.kind != TagKind::Float {
            return None;
        }
        self.items.iter().map(Tag::as_f32).collect()
    }
}

impl<'a> IntoIterator for &'a TagList {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Named children in insertion order
///
/// Every typed getter returns `None` unless the key is present *and* holds
/// the expected kind, so callers never have to special-case mis-typed data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    entries: IndexMap<String, Tag>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a child; an existing key keeps its position and takes the new value
    pub fn insert(&mut self, name: impl Into<String>, tag: Tag) -> Option<Tag> {
        self.entries.insert(name.into(), tag)
    }

    /// Builder form of `insert`
    pub fn with(mut self, name: impl Into<String>, tag: Tag) -> Self {
        self.insert(name, tag);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.entries.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn has(&self, name: &str, kind: TagKind) -> bool {
        self.get(name).is_some_and(|t| t.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Tag> {
        self.entries.iter()
    }

    pub fn get_byte(&self, name: &str) -> Option<i8> {
        match self.get(name) {
            Some(Tag::Byte(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_short(&self, name: &str) -> Option<i16> {
        match self.get(name) {
            Some(Tag::Short(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        match self.get(name) {
            Some(Tag::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_long(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Tag::Long(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(Tag::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_double(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Tag::Double(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Tag::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn get_list(&self, name: &str) -> Option<&TagList> {
        match self.get(name) {
            Some(Tag::List(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_compound(&self, name: &str) -> Option<&Compound> {
        match self.get(name) {
            Some(Tag::Compound(v)) => Some(v),
            _ => None,
        }
    }
}

impl<'a> IntoIterator for &'a Compound {
    type Item = (&'a String, &'a Tag);
    type IntoIter = indexmap::map::Iter<'a, String, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
