//! Shared table type and table keys.
//!
//! This module provides [`Table`], a cheap-to-clone handle around an
//! [`IndexMap`] of [`Key`] to [`Value`]. Cloning a `Table` clones the handle,
//! not the entries, so the same table can appear in several places (or inside
//! itself). The allocation address is the table's identity, which is what the
//! encoder uses for cycle detection.
//!
//! ## Why IndexMap?
//!
//! Entry order carries no meaning in the format, but `IndexMap` keeps the order
//! the entries were inserted in. A decoded save re-encodes in its original
//! order, which keeps diffs between saves readable.
//!
//! ## Examples
//!
//! ```rust
//! use serde_jkr::{Table, Value};
//!
//! let table = Table::new();
//! table.insert("name", "Jimbo");
//! table.insert(1, 42);
//!
//! assert_eq!(table.len(), 2);
//! assert_eq!(table.get("name"), Some(Value::from("Jimbo")));
//! assert_eq!(table.get(1), Some(Value::Number(42.0)));
//! ```

use crate::format::PLACEHOLDER_MARKER_KEY;
use crate::value::{Function, Value};
use crate::Error;
use indexmap::IndexMap;
use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A table key.
///
/// Only [`Key::String`] and [`Key::Number`] can be written to a jkr file; the
/// other variants exist because host tables may be keyed by them, and the
/// encoder reports them as [`Error::InvalidKeyType`].
///
/// Number keys compare by value with `-0.0` equal to `0.0`. Table and function
/// keys compare by identity.
#[derive(Clone)]
pub enum Key {
    String(Vec<u8>),
    Number(f64),
    Boolean(bool),
    Table(Table),
    Function(Function),
}

impl Key {
    /// Returns the Lua type name of this key.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Key::String(_) => "string",
            Key::Number(_) => "number",
            Key::Boolean(_) => "boolean",
            Key::Table(_) => "table",
            Key::Function(_) => "function",
        }
    }

    /// If the key is a UTF-8 string, returns it.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::String(s) => std::str::from_utf8(s).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Key::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Converts the key into the equivalent [`Value`].
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Key::String(s) => Value::String(s),
            Key::Number(n) => Value::Number(n),
            Key::Boolean(b) => Value::Boolean(b),
            Key::Table(t) => Value::Table(t),
            Key::Function(f) => Value::Function(f),
        }
    }
}

fn number_bits(n: f64) -> u64 {
    if n == 0.0 {
        0
    } else if n.is_nan() {
        f64::NAN.to_bits()
    } else {
        n.to_bits()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::String(a), Key::String(b)) => a == b,
            (Key::Number(a), Key::Number(b)) => number_bits(*a) == number_bits(*b),
            (Key::Boolean(a), Key::Boolean(b)) => a == b,
            (Key::Table(a), Key::Table(b)) => a.ptr_eq(b),
            (Key::Function(a), Key::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Key::String(s) => s.hash(state),
            Key::Number(n) => number_bits(*n).hash(state),
            Key::Boolean(b) => b.hash(state),
            Key::Table(t) => t.id().hash(state),
            Key::Function(f) => f.id().hash(state),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::String(s) => write!(f, "{:?}", String::from_utf8_lossy(s)),
            Key::Number(n) => write!(f, "{}", n),
            Key::Boolean(b) => write!(f, "{}", b),
            Key::Table(t) => write!(f, "table: {:#x}", t.id()),
            Key::Function(func) => write!(f, "{:?}", func),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::String(value.as_bytes().to_vec())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::String(value.into_bytes())
    }
}

impl From<&[u8]> for Key {
    fn from(value: &[u8]) -> Self {
        Key::String(value.to_vec())
    }
}

impl From<Vec<u8>> for Key {
    fn from(value: Vec<u8>) -> Self {
        Key::String(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Number(value as f64)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Number(value as f64)
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key::Number(value as f64)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Number(value as f64)
    }
}

impl From<f64> for Key {
    fn from(value: f64) -> Self {
        Key::Number(value)
    }
}

impl From<bool> for Key {
    fn from(value: bool) -> Self {
        Key::Boolean(value)
    }
}

impl From<Table> for Key {
    fn from(value: Table) -> Self {
        Key::Table(value)
    }
}

impl From<Function> for Key {
    fn from(value: Function) -> Self {
        Key::Function(value)
    }
}

impl TryFrom<Value> for Key {
    type Error = Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Nil => Err(Error::custom("table index is nil")),
            Value::Boolean(b) => Ok(Key::Boolean(b)),
            Value::Number(n) => Ok(Key::Number(n)),
            Value::String(s) => Ok(Key::String(s)),
            Value::Table(t) => Ok(Key::Table(t)),
            Value::Function(f) => Ok(Key::Function(f)),
        }
    }
}

/// A shared, mutable table handle.
///
/// `Table` behaves like a Lua table reference: clones alias the same entries,
/// and [`Table::insert`] takes `&self`. Inserting a key that is already present
/// replaces its value.
///
/// Equality (`==`) is structural and ignores entry order. It terminates on
/// cyclic tables. Use [`Table::ptr_eq`] for identity.
///
/// # Examples
///
/// ```rust
/// use serde_jkr::{Table, Value};
///
/// let outer = Table::new();
/// let inner = Table::new();
/// inner.insert("a", 1);
/// outer.insert("nested", inner.clone());
///
/// // The handle stored in `outer` aliases `inner`.
/// inner.insert("b", 2);
/// let stored = outer.get("nested").unwrap();
/// assert_eq!(stored.as_table().map(|t| t.len()), Some(2));
/// ```
#[derive(Clone, Default)]
pub struct Table(Rc<RefCell<IndexMap<Key, Value>>>);

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Table(Rc::new(RefCell::new(IndexMap::new())))
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Table(Rc::new(RefCell::new(IndexMap::with_capacity(capacity))))
    }

    /// Inserts a key-value pair, returning the previous value for the key.
    ///
    /// # Panics
    ///
    /// Panics if called while the table's entries are borrowed, which only
    /// happens from inside [`Table::for_each`] on the same table.
    pub fn insert(&self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    /// Returns a clone of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        self.0.borrow().get(&key.into()).cloned()
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub fn remove(&self, key: impl Into<Key>) -> Option<Value> {
        self.0.borrow_mut().shift_remove(&key.into())
    }

    #[must_use]
    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.0.borrow().contains_key(&key.into())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Returns a snapshot of the entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<(Key, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns a snapshot of the keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Calls `f` for every entry without cloning.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Key, &Value),
    {
        for (k, v) in self.0.borrow().iter() {
            f(k, v);
        }
    }

    /// Returns `true` if both handles point at the same table.
    #[must_use]
    pub fn ptr_eq(&self, other: &Table) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns `true` if this table stands for a host object.
    ///
    /// A table is an object placeholder when its `"is"` entry is a
    /// [`Function`]. The encoder writes such tables as `"MANUAL_REPLACE"`
    /// instead of descending into them.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self.0.borrow().get(&Key::from(PLACEHOLDER_MARKER_KEY)),
            Some(Value::Function(_))
        )
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn borrow(&self) -> Ref<'_, IndexMap<Key, Value>> {
        self.0.borrow()
    }
}

impl<K, V> FromIterator<(K, V)> for Table
where
    K: Into<Key>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let map = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Table(Rc::new(RefCell::new(map)))
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        tables_equal(self, other, &mut HashSet::new())
    }
}

pub(crate) fn values_equal(a: &Value, b: &Value, seen: &mut HashSet<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Table(x), Value::Table(y)) => tables_equal(x, y, seen),
        (Value::Function(x), Value::Function(y)) => x.ptr_eq(y),
        _ => false,
    }
}

fn tables_equal(a: &Table, b: &Table, seen: &mut HashSet<(usize, usize)>) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    // A pair already under comparison is assumed equal; any real difference
    // is found on the path that first entered it.
    if !seen.insert((a.id(), b.id())) {
        return true;
    }
    let (left, right) = (a.borrow(), b.borrow());
    left.len() == right.len()
        && left.iter().all(|(key, value)| {
            right
                .get(key)
                .map_or(false, |other| values_equal(value, other, seen))
        })
}

thread_local! {
    static OPEN_TABLES: RefCell<HashSet<usize>> = RefCell::new(HashSet::new());
}

/// Marks a table as open for the current thread's recursive walk.
///
/// Used by `Debug` and `Serialize`, which cannot thread a visited set through
/// their trait signatures. Dropping the guard closes the table again.
pub(crate) struct OpenGuard(usize);

impl OpenGuard {
    pub(crate) fn enter(table: &Table) -> Option<OpenGuard> {
        let id = table.id();
        let inserted = OPEN_TABLES.with(|open| open.borrow_mut().insert(id));
        if inserted {
            Some(OpenGuard(id))
        } else {
            None
        }
    }
}

impl Drop for OpenGuard {
    fn drop(&mut self) {
        OPEN_TABLES.with(|open| {
            open.borrow_mut().remove(&self.0);
        });
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match OpenGuard::enter(self) {
            Some(_guard) => f.debug_map().entries(self.borrow().iter()).finish(),
            None => write!(f, "<cycle: table {:#x}>", self.id()),
        }
    }
}
