use crate::{type_of, TypeId};
use rustc_hash::FxHashMap;
use std::any::Any;

/// A type that can live in the `Context` as a data container. The container is
/// constructed with `init()` the first time it is requested mutably.
pub trait DataPlugin: Any + Sized {
    fn init() -> Self;
}

impl<T: 'static> DataPlugin for Vec<T> {
    fn init() -> Self {
        Vec::new()
    }
}

/// Owns the per-run state that is not part of the grid itself: parameters and
/// the random number streams. Each run gets its own `Context`, so nothing is
/// shared between runs or between tests.
#[derive(Default)]
pub struct Context {
    // This is actually a `HashMap<TypeId, Box<T: DataPlugin>>`.
    data_plugins: FxHashMap<TypeId, Box<dyn Any>>,
}

impl Context {
    pub fn new() -> Self {
        Context {
            data_plugins: FxHashMap::default(),
        }
    }

    /// Returns a mutable reference for the data container for `T`, creating it if it doesn't exist yet.
    pub fn get_data_container_mut<T: DataPlugin>(&mut self) -> &mut T {
        self.data_plugins
            .entry(type_of::<T>())
            .or_insert_with(|| Box::new(T::init()))
            .downcast_mut::<T>()
            .unwrap() // Will never panic as data container has the matching type
    }

    /// Returns a reference to the data container for `T` if it exists.
    /// If you need a mutable reference or lazy instantiation, use `Context::get_data_container_mut()`.
    pub fn get_data_container<T: DataPlugin>(&self) -> Option<&T> {
        self.data_plugins
            .get(&type_of::<T>())
            .and_then(|data| data.downcast_ref::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StepLog(Vec<usize>);
    impl DataPlugin for StepLog {
        fn init() -> Self {
            StepLog(vec![0])
        }
    }

    #[test]
    fn containers_are_created_lazily() {
        let mut context = Context::new();
        assert!(context.get_data_container::<StepLog>().is_none());

        context.get_data_container_mut::<StepLog>().0.push(1);
        context.get_data_container_mut::<StepLog>().0.push(2);

        let log = context.get_data_container::<StepLog>().unwrap();
        assert_eq!(log.0, vec![0, 1, 2]);
    }

    #[test]
    fn containers_are_keyed_by_type() {
        let mut context = Context::new();
        {
            // If you specify the type of the variable the compiler can infer the generic type.
            let counts: &mut Vec<u8> = context.get_data_container_mut();
            counts.push(3);
        }
        {
            let labels: &mut Vec<&str> = context.get_data_container_mut();
            labels.push("Dorms");
        }

        assert_eq!(context.get_data_container::<Vec<u8>>().unwrap(), &vec![3]);
        assert_eq!(context.get_data_container::<Vec<&str>>().unwrap(), &vec!["Dorms"]);
    }
}
