use std::{cell::RefCell, rc::Rc};

use crate::{ast::BlockArg, interpreter::value::mapping::Mapping};

/// An integer range with an inclusive or exclusive upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValue {
    /// The lower bound.
    pub start:     i64,
    /// The upper bound.
    pub end:       i64,
    /// Whether the upper bound is excluded.
    pub exclusive: bool,
}

impl RangeValue {
    /// The last value the range produces, or `None` for an empty range.
    #[must_use]
    pub const fn last(&self) -> Option<i64> {
        let last = if self.exclusive { self.end - 1 } else { self.end };
        if last < self.start {
            None
        } else {
            Some(last)
        }
    }

    /// How many values the range produces.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self.last() {
            Some(last) => (last - self.start + 1) as usize,
            None => 0,
        }
    }

    /// Returns `true` when the range produces no values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when `n` lies within the range.
    #[must_use]
    pub const fn contains(&self, n: i64) -> bool {
        if self.exclusive {
            n >= self.start && n < self.end
        } else {
            n >= self.start && n <= self.end
        }
    }
}

/// Represents a runtime value in the interpreter.
///
/// This enum models all the possible types that can appear in expressions,
/// assignments, method returns, and conditional evaluations. Arrays and
/// mappings are reference-shared: cloning a `Value` clones the handle, not
/// the underlying storage, so two variables may alias the same collection and
/// in-place mutation through one is visible through the other. Copying is
/// explicit via `dup`.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent value, `nil`. Falsy.
    Nil,
    /// A boolean value. `false` is falsy; every other value is truthy.
    Bool(bool),
    /// A 64-bit integer value.
    Integer(i64),
    /// A 64-bit floating-point value.
    Float(f64),
    /// An immutable text value.
    Text(String),
    /// An interned name token, compared by name equality.
    Symbol(String),
    /// An ordered, mutable, reference-shared sequence of values.
    Array(Rc<RefCell<Vec<Self>>>),
    /// An insertion-ordered, mutable, reference-shared mapping.
    Mapping(Rc<RefCell<Mapping>>),
    /// An integer range.
    Range(RangeValue),
    /// A block argument captured as a value and handed to block-taking
    /// built-ins.
    Callable(Rc<BlockArg>),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::Array(Rc::new(RefCell::new(v)))
    }
}

impl From<Mapping> for Value {
    fn from(v: Mapping) -> Self {
        Self::Mapping(Rc::new(RefCell::new(v)))
    }
}

impl Value {
    /// The user-facing name of this value's kind, as used in dispatch and
    /// error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Float(_) => "Float",
            Self::Text(_) => "String",
            Self::Symbol(_) => "Symbol",
            Self::Array(_) => "Array",
            Self::Mapping(_) => "Hash",
            Self::Range(_) => "Range",
            Self::Callable(_) => "Proc",
        }
    }

    /// Truthiness: only `nil` and `false` are falsy; every other value,
    /// including `0`, empty text and empty collections, is truthy.
    #[must_use]
    pub const fn is_truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Bool(false))
    }

    /// Returns `true` if the value is [`Nil`].
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns `true` if the value is numeric ([`Integer`] or [`Float`]).
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }

    /// The numeric value as `f64`, or `None` for non-numeric kinds.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(r) => Some(*r),
            _ => None,
        }
    }

    /// The textual form used by `puts`, `print`, interpolation and text
    /// coercion. `nil` renders as the empty string; arrays render as a
    /// bracketed comma-joined list of their elements' textual forms.
    #[must_use]
    pub fn to_display(&self) -> String {
        format!("{self}")
    }

    /// The inspect form used by `p`: text is quoted, symbols keep their
    /// leading colon, `nil` renders as `nil`, and collections render their
    /// elements' inspect forms recursively.
    #[must_use]
    pub fn inspect(&self) -> String {
        match self {
            Self::Nil => "nil".to_string(),
            Self::Text(s) => format!("\"{s}\""),
            Self::Array(items) => {
                let rendered: Vec<String> =
                    items.borrow().iter().map(Self::inspect).collect();
                format!("[{}]", rendered.join(", "))
            },
            Self::Mapping(map) => {
                let rendered: Vec<String> = map
                    .borrow()
                    .iter()
                    .map(|(key, value)| format!("{key}=>{}", value.inspect()))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            },
            _ => self.to_display(),
        }
    }

    /// A shallow copy: arrays and mappings get fresh storage, scalars are
    /// cloned as-is.
    #[must_use]
    pub fn dup(&self) -> Self {
        match self {
            Self::Array(items) => Self::from(items.borrow().clone()),
            Self::Mapping(map) => Self::from(map.borrow().clone()),
            other => other.clone(),
        }
    }
}

impl PartialEq for Value {
    /// Equality is structural for arrays and mappings, value-based for
    /// scalars, numeric across `Integer`/`Float`, and name-based for symbols.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Integer(a), Self::Float(b)) | (Self::Float(b), Self::Integer(a)) => {
                (*a as f64) == *b
            },
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Mapping(a), Self::Mapping(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            },
            (Self::Range(a), Self::Range(b)) => a == b,
            (Self::Callable(a), Self::Callable(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nil => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(r) => write!(f, "{r}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Symbol(name) => write!(f, ":{name}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (index, value) in items.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            },
            Self::Mapping(map) => {
                write!(f, "{{")?;
                for (index, (key, value)) in map.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}=>{}", value.inspect())?;
                }
                write!(f, "}}")
            },
            Self::Range(range) => {
                let dots = if range.exclusive { "..." } else { ".." };
                write!(f, "{}{dots}{}", range.start, range.end)
            },
            Self::Callable(_) => write!(f, "#<block>"),
        }
    }
}
