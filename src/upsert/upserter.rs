//! Get-or-create upserts into lists and maps nested under a root map.

use super::{ShapePolicy, UpsertError};
use crate::value::{Map, Shape, Value};
use tracing::{debug, error};

/// UpsertRoot is anything that can stand in as the root map of an upsert.
///
/// Implementations hand out the underlying [`Map`] or explain why there
/// is none. They must not mutate anything when they fail.
pub trait UpsertRoot {
    /// Returns the root map.
    fn root_map(&mut self) -> Result<&mut Map, UpsertError>;
}

impl UpsertRoot for Map {
    fn root_map(&mut self) -> Result<&mut Map, UpsertError> {
        Ok(self)
    }
}

impl UpsertRoot for Value {
    fn root_map(&mut self) -> Result<&mut Map, UpsertError> {
        match self {
            Value::Map(m) => Ok(m),
            Value::Null => {
                error!("root map is not initialized");
                Err(UpsertError::UninitializedRoot)
            }
            other => {
                let actual = other.shape();
                error!(%actual, "root is not a map");
                Err(UpsertError::RootNotMap { actual })
            }
        }
    }
}

impl UpsertRoot for Option<Map> {
    fn root_map(&mut self) -> Result<&mut Map, UpsertError> {
        match self {
            Some(m) => Ok(m),
            None => {
                error!("root map is not initialized");
                Err(UpsertError::UninitializedRoot)
            }
        }
    }
}

/// UpserterBuilder is a builder for creating an Upserter.
#[derive(Debug, Default)]
pub struct UpserterBuilder {
    policy: ShapePolicy,
}

impl UpserterBuilder {
    /// Creates a new UpserterBuilder.
    pub fn new() -> Self {
        UpserterBuilder::default()
    }

    /// Sets how entries holding the wrong shape are handled.
    pub fn policy(mut self, policy: ShapePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds the Upserter.
    pub fn build(self) -> Upserter {
        Upserter {
            policy: self.policy,
        }
    }
}

/// Upserter performs get-or-create upserts under a fixed [`ShapePolicy`].
///
/// Each operation looks up `key` in the root map. When the entry already
/// holds the container the operation needs, it is mutated in place.
/// Otherwise a fresh container is installed first, subject to the policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Upserter {
    policy: ShapePolicy,
}

impl Upserter {
    /// Creates a new UpserterBuilder.
    pub fn builder() -> UpserterBuilder {
        UpserterBuilder::new()
    }

    /// Creates an Upserter with the given policy.
    pub fn with_policy(policy: ShapePolicy) -> Self {
        Upserter { policy }
    }

    pub fn policy(&self) -> ShapePolicy {
        self.policy
    }

    /// Appends every element of `items`, in order, to the list at `key`.
    pub fn append_list_range<R, K, I>(
        &self,
        root: &mut R,
        key: K,
        items: I,
    ) -> Result<(), UpsertError>
    where
        R: UpsertRoot + ?Sized,
        K: Into<Value>,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let map = root.root_map()?;
        self.with_list(map, key.into(), |list| {
            list.extend(items.into_iter().map(Into::into));
        })
    }

    /// Appends a single `item` to the list at `key`.
    pub fn append_to_list<R, K, V>(
        &self,
        root: &mut R,
        key: K,
        item: V,
    ) -> Result<(), UpsertError>
    where
        R: UpsertRoot + ?Sized,
        K: Into<Value>,
        V: Into<Value>,
    {
        let map = root.root_map()?;
        self.with_list(map, key.into(), |list| list.push(item.into()))
    }

    /// Sets `sub_key` to `value` in the map at `key`, replacing any value
    /// already stored under `sub_key`.
    pub fn set_in_map<R, K, S, V>(
        &self,
        root: &mut R,
        key: K,
        sub_key: S,
        value: V,
    ) -> Result<(), UpsertError>
    where
        R: UpsertRoot + ?Sized,
        K: Into<Value>,
        S: Into<Value>,
        V: Into<Value>,
    {
        let map = root.root_map()?;
        self.with_map(map, key.into(), |nested| {
            nested.set(sub_key, value);
        })
    }

    fn with_list(
        &self,
        root: &mut Map,
        key: Value,
        mutate: impl FnOnce(&mut Vec<Value>),
    ) -> Result<(), UpsertError> {
        if let Some(Value::List(list)) = root.get_shaped_mut(&key, Shape::List) {
            mutate(list);
            return Ok(());
        }
        self.check_entry(root, &key, Shape::List)?;

        let slot = root.fields.entry(key).or_default();
        let mut list = match std::mem::take(slot) {
            Value::List(list) => list,
            Value::Null => Vec::new(),
            prior if self.policy == ShapePolicy::Merge => vec![prior],
            _ => Vec::new(),
        };
        mutate(&mut list);
        *slot = Value::List(list);
        Ok(())
    }

    fn with_map(
        &self,
        root: &mut Map,
        key: Value,
        mutate: impl FnOnce(&mut Map),
    ) -> Result<(), UpsertError> {
        if let Some(Value::Map(nested)) = root.get_shaped_mut(&key, Shape::Map) {
            mutate(nested);
            return Ok(());
        }
        self.check_entry(root, &key, Shape::Map)?;

        let slot = root.fields.entry(key).or_default();
        let mut nested = match std::mem::take(slot) {
            Value::Map(nested) => nested,
            _ => Map::new(),
        };
        mutate(&mut nested);
        *slot = Value::Map(nested);
        Ok(())
    }

    /// Decides whether the entry at `key` may become a container of the
    /// `expected` shape. Runs before anything is touched so that a refusal
    /// leaves the root as it was.
    fn check_entry(&self, root: &Map, key: &Value, expected: Shape) -> Result<(), UpsertError> {
        if root.get_shaped(key, expected).is_some() {
            return Ok(());
        }
        let actual = match root.get(key) {
            None => {
                debug!(%key, shape = %expected, "creating nested container");
                return Ok(());
            }
            Some(v) => v.shape(),
        };
        if actual == Shape::Null {
            return Ok(());
        }

        match self.policy {
            ShapePolicy::Overwrite => {
                debug!(%key, discarded = %actual, shape = %expected, "overwriting entry");
                Ok(())
            }
            ShapePolicy::Merge if expected == Shape::List && actual.is_scalar() => {
                debug!(%key, carried = %actual, "wrapping entry into a list");
                Ok(())
            }
            ShapePolicy::Fail | ShapePolicy::Merge => {
                Err(UpsertError::shape_mismatch(key, expected, actual))
            }
        }
    }
}

/// NestedUpsert adds the upsert operations directly to root maps, using
/// the default [`ShapePolicy::Overwrite`] policy.
///
/// ```
/// use data_extensions::{Map, NestedUpsert, Value};
///
/// let mut root = Map::new();
/// root.append_to_list("scores", 1).unwrap();
/// root.append_to_list("scores", 2).unwrap();
/// root.set_in_map("users", "alice", 42).unwrap();
///
/// assert_eq!(
///     root.get(&"scores".into()),
///     Some(&Value::List(vec![Value::Int(1), Value::Int(2)]))
/// );
/// ```
pub trait NestedUpsert: UpsertRoot {
    /// Appends every element of `items` to the list at `key`.
    fn append_list_range<K, I>(&mut self, key: K, items: I) -> Result<(), UpsertError>
    where
        K: Into<Value>,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Upserter::default().append_list_range(self, key, items)
    }

    /// Appends `item` to the list at `key`.
    fn append_to_list<K, V>(&mut self, key: K, item: V) -> Result<(), UpsertError>
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        Upserter::default().append_to_list(self, key, item)
    }

    /// Sets `sub_key` to `value` in the map at `key`.
    fn set_in_map<K, S, V>(&mut self, key: K, sub_key: S, value: V) -> Result<(), UpsertError>
    where
        K: Into<Value>,
        S: Into<Value>,
        V: Into<Value>,
    {
        Upserter::default().set_in_map(self, key, sub_key, value)
    }
}

impl<T: UpsertRoot + ?Sized> NestedUpsert for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted events in memory.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn error_events(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(tracing::Level::ERROR)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_builder_sets_policy() {
        let upserter = Upserter::builder().policy(ShapePolicy::Fail).build();
        assert_eq!(upserter.policy(), ShapePolicy::Fail);
        assert_eq!(Upserter::default().policy(), ShapePolicy::Overwrite);
        assert_eq!(Upserter::with_policy(ShapePolicy::Merge).policy(), ShapePolicy::Merge);
    }

    #[test]
    fn test_root_map_from_value() {
        let mut root = Value::Map(Map::new());
        assert!(root.root_map().is_ok());

        let mut root = Value::Null;
        assert_eq!(root.root_map().unwrap_err(), UpsertError::UninitializedRoot);

        let mut root = Value::Int(3);
        assert_eq!(
            root.root_map().unwrap_err(),
            UpsertError::RootNotMap { actual: Shape::Int }
        );
    }

    #[test]
    fn test_root_map_from_option() {
        let mut root: Option<Map> = None;
        assert_eq!(root.root_map().unwrap_err(), UpsertError::UninitializedRoot);

        let mut root = Some(Map::new());
        assert!(root.root_map().is_ok());
    }

    #[test]
    fn test_invalid_roots_are_logged_alike() {
        let logs = error_events(|| {
            let _ = Value::Null.root_map();
        });
        assert!(logs.contains("ERROR"), "{}", logs);
        assert!(logs.contains("root map is not initialized"), "{}", logs);

        let logs = error_events(|| {
            let _ = Value::Int(3).root_map();
        });
        assert!(logs.contains("ERROR"), "{}", logs);
        assert!(logs.contains("root is not a map"), "{}", logs);
        assert!(logs.contains("actual=int"), "{}", logs);

        let logs = error_events(|| {
            let _ = Value::Map(Map::new()).root_map();
        });
        assert!(logs.is_empty(), "{}", logs);
    }
}
