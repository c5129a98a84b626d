//! Payload shapes and record traits.
//!
//! Every payload that travels over a link is a plain Rust struct. Alongside the Rust
//! type, each stage declares the *shape* of its input and output: an ordered list of named
//! fields with bit widths. Shapes are what chains and graphs compare when they are built,
//! so a stage declaring a 24-bit mantissa cannot be wired behind one producing 27 bits
//! even though both use the same Rust type.

use std::fmt;

/// One named field of a payload shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    /// Field name, for diagnostics only.
    pub name: &'static str,
    /// Width of the field in bits.
    pub width: u32,
}

impl Field {
    /// Creates a field descriptor.
    pub const fn new(name: &'static str, width: u32) -> Self {
        Self { name, width }
    }
}

/// Declared layout of a payload record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    name: &'static str,
    fields: Vec<Field>,
}

impl Shape {
    /// Creates a shape from an ordered list of fields.
    pub fn new(name: &'static str, fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            name,
            fields: fields.into_iter().collect(),
        }
    }

    /// Creates a single-field shape.
    pub fn scalar(name: &'static str, width: u32) -> Self {
        Self::new(name, [Field::new(name, width)])
    }

    /// Returns the shape name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the ordered field list.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Total width in bits.
    pub fn width(&self) -> u32 {
        self.fields.iter().map(|f| f.width).sum()
    }

    /// Returns a copy with `other`'s fields appended after this shape's fields.
    pub fn extend(mut self, other: &Self) -> Self {
        self.fields.extend_from_slice(&other.fields);
        self
    }

    /// Whether a value of this shape can be assigned to a value of `target`.
    ///
    /// Assignment is positional: both shapes need the same number of fields and every
    /// field pair the same width. Field names are ignored.
    pub fn is_assignable_to(&self, target: &Self) -> bool {
        self.fields.len() == target.fields.len()
            && self
                .fields
                .iter()
                .zip(&target.fields)
                .all(|(a, b)| a.width == b.width)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.name, field.width)?;
        }
        write!(f, "}}")
    }
}

/// Payload carried over a link.
///
/// Records need a reset value (`Default`) because every register in the model starts out
/// holding one, and `Clone` because a settled output is copied into the next input.
pub trait Record: Clone + Default + fmt::Debug {}

impl<T: Clone + Default + fmt::Debug> Record for T {}

/// A record that carries a multiplex ID.
///
/// The fan-in stamps the ID of the accepted lane; every stage downstream must copy it
/// unchanged so the fan-out can route the result home.
pub trait MuxId {
    /// Returns the multiplex ID.
    fn muxid(&self) -> usize;

    /// Overwrites the multiplex ID.
    fn set_muxid(&mut self, id: usize);
}
