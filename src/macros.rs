/// Builds a [`Table`](crate::Table) from Lua-like constructor syntax.
///
/// Keys are string or number literals. Values are `nil`, `true`, `false`,
/// a nested `{ ... }` or any single token tree convertible into a
/// [`Value`](crate::Value); wrap longer expressions such as `-1.5` in
/// parentheses.
///
/// ```rust
/// use serde_jkr::{table, to_string};
///
/// let table = table!({
///     "GAME": { "round": 3, "won": false },
///     1: "Joker",
/// });
/// assert_eq!(table.len(), 2);
/// assert_eq!(to_string(&table!({ 1: (-1.5) })).unwrap(), "return {[1]=-1.5,}");
/// ```
#[macro_export]
macro_rules! table {
    ({}) => {
        $crate::Table::new()
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let table = $crate::Table::new();
        $(
            table.insert($key, $crate::value!($value));
        )*
        table
    }};
}

/// Builds a [`Value`](crate::Value).
///
/// ```rust
/// use serde_jkr::{value, Value};
///
/// assert_eq!(value!(nil), Value::Nil);
/// assert_eq!(value!("Jimbo"), Value::from("Jimbo"));
/// assert!(value!({ "chips": 10 }).is_table());
/// ```
#[macro_export]
macro_rules! value {
    (nil) => {
        $crate::Value::Nil
    };

    (true) => {
        $crate::Value::Boolean(true)
    };

    (false) => {
        $crate::Value::Boolean(false)
    };

    ({ $($body:tt)* }) => {
        $crate::Value::Table($crate::table!({ $($body)* }))
    };

    ($other:expr) => {
        $crate::Value::from($other)
    };
}
