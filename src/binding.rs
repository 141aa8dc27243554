//! Bound-field descriptors: a name, the declared type(s), and an accessor
//! that fetches the field's current value from a decoded container.
//!
//! The accessor is captured as a closure at construction time, so resolution
//! never needs runtime type introspection. [`Binding::field`] installs the
//! standard accessor for a struct member; the schema front-end may supply any
//! other closure via [`Binding::with_accessor`].

use crate::error::BindError;
use crate::value::{TypeTag, Value};
use std::fmt;
use std::sync::Arc;

pub type Accessor = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

pub struct Binding {
    name: String,
    types: Vec<TypeTag>,
    accessor: Accessor,
}

impl Binding {
    /// Binding for a plain struct member: the accessor looks the member up
    /// by name in the container.
    pub fn field(name: impl Into<String>, tag: TypeTag) -> Self {
        Self::field_multi(name, vec![tag])
    }

    /// Polymorphic binding: the field's static type is the union of `types`.
    /// At least one tag is required.
    pub fn field_multi(name: impl Into<String>, types: Vec<TypeTag>) -> Self {
        let name = name.into();
        let key = name.clone();
        let accessor: Accessor =
            Arc::new(move |container| container.as_struct()?.get(&key).cloned());
        Self::with_accessor(name, types, accessor)
    }

    pub fn with_accessor(
        name: impl Into<String>,
        types: Vec<TypeTag>,
        accessor: Accessor,
    ) -> Self {
        assert!(!types.is_empty(), "a binding declares at least one type");
        Binding { name: name.into(), types, accessor }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &[TypeTag] {
        &self.types
    }

    /// Fetch the field's current value from a decoded container instance.
    pub fn get(&self, container: &Value) -> Result<Value, BindError> {
        (self.accessor)(container).ok_or_else(|| BindError::BindingAccess {
            name: self.name.clone(),
            reason: "accessor found no value on the container".to_string(),
        })
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("types", &self.types)
            .finish_non_exhaustive()
    }
}
