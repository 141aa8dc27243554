//! The binding resolution graph: scopes, references, and resolvers.
//!
//! One scope exists per structure being decoded; scopes live in a [`Scopes`]
//! arena and chain to their enclosing scope through a parent handle, which
//! mirrors the static nesting of structure definitions. Resolving a name
//! against a scope yields a [`Reference`]: a reusable handle independent of
//! any particular decoded instance. A [`Resolver`] supplies the instance side
//! at decode time; references are resolved many times against different
//! resolvers.
//!
//! The reserved name `outer` designates the enclosing structure. It is
//! special-cased once, in [`Scopes::resolve`]; everything downstream works
//! with typed reference variants instead of comparing strings.

use crate::binding::Binding;
use crate::error::BindError;
use crate::expr::{evaluate_size, Expression};
use crate::value::{TypeTag, Value};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// The reserved identifier naming the enclosing structure.
pub const OUTER: &str = "outer";

/// Handle to one scope in a [`Scopes`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

struct Scope {
    bindings: IndexMap<String, Binding>,
    outer: Option<ScopeId>,
}

/// Arena owning every scope of one decode. A scope's parent must already
/// exist when the scope is created, so the outer chain is finite and acyclic
/// by construction.
#[derive(Default)]
pub struct Scopes {
    scopes: Vec<Scope>,
}

impl Scopes {
    pub fn new() -> Self {
        Scopes::default()
    }

    pub fn create(&mut self, outer: Option<ScopeId>) -> ScopeId {
        if let Some(ScopeId(ix)) = outer {
            assert!(ix < self.scopes.len(), "outer scope does not exist");
        }
        self.scopes.push(Scope { bindings: IndexMap::new(), outer });
        ScopeId(self.scopes.len() - 1)
    }

    /// Register a binding as its field becomes decodable. Registration order
    /// is field-decode order and is preserved for enumeration.
    pub fn register(&mut self, id: ScopeId, binding: Binding) -> Result<(), BindError> {
        let scope = &mut self.scopes[id.0];
        if scope.bindings.contains_key(binding.name()) {
            return Err(BindError::DuplicateBinding { name: binding.name().to_string() });
        }
        scope.bindings.insert(binding.name().to_string(), binding);
        Ok(())
    }

    /// Resolve a symbolic name to a reference. The reserved name `outer`
    /// always resolves structurally, whether or not an enclosing scope
    /// exists; missing enclosure only surfaces when the reference is
    /// resolved against a resolver.
    pub fn resolve(&self, id: ScopeId, name: &str) -> Result<Reference, BindError> {
        let scope = &self.scopes[id.0];
        if name == OUTER {
            return Ok(Reference::Outer { outer: scope.outer });
        }
        match scope.bindings.get(name) {
            Some(binding) => Ok(Reference::Binding {
                scope: id,
                name: binding.name().to_string(),
                types: binding.types().to_vec(),
            }),
            None => Err(BindError::UnknownBinding {
                name: name.to_string(),
                known: scope.bindings.keys().cloned().collect(),
            }),
        }
    }

    /// Resolve a name and immediately select an element by index expression.
    pub fn resolve_indexed(
        &self,
        id: ScopeId,
        name: &str,
        index: Arc<dyn Expression>,
    ) -> Result<Reference, BindError> {
        self.resolve(id, name)?.index(index)
    }

    /// Render the scope's known names for documentation: "one of a, b" or
    /// "no variables".
    pub fn describe(&self, id: ScopeId) -> String {
        let scope = &self.scopes[id.0];
        if scope.bindings.is_empty() {
            "no variables".to_string()
        } else {
            let names: Vec<&str> = scope.bindings.keys().map(String::as_str).collect();
            format!("one of {}", names.join(", "))
        }
    }

    /// Bindings of a scope in registration order.
    pub fn bindings(&self, id: ScopeId) -> impl Iterator<Item = &Binding> {
        self.scopes[id.0].bindings.values()
    }

    fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }
}

/// A pre-resolved handle to a named or derived value, independent of any
/// decoded instance. References compose: attribute selection and indexing
/// build new references on top of existing ones, and a polymorphic binding
/// fans out into a [`Reference::Multi`] whose branches are tried in order at
/// resolve time.
#[derive(Clone)]
pub enum Reference {
    /// A binding looked up by name in its owning scope.
    Binding { scope: ScopeId, name: String, types: Vec<TypeTag> },
    /// The enclosing structure itself.
    Outer { outer: Option<ScopeId> },
    /// A reference resolved one resolver level up.
    InOuter(Box<Reference>),
    /// Attribute selection on the value `via` produces. `of` is the declared
    /// branch type this reference applies to.
    Attribute { via: Box<Reference>, name: String, of: TypeTag },
    /// Element selection; the index expression is evaluated at resolve time.
    Index { via: Box<Reference>, index: Arc<dyn Expression>, elem: TypeTag },
    /// Fan-out across the declared types of a polymorphic binding.
    Multi(Vec<Reference>),
}

impl Reference {
    /// Resolve to a value against one decoded instance.
    pub fn resolve(&self, resolver: &Resolver<'_>) -> Result<Value, BindError> {
        match self {
            Reference::Binding { scope, name, .. } => resolver.get_in(*scope, name),
            Reference::Outer { .. } => {
                let outer = resolver
                    .outer()
                    .ok_or_else(|| BindError::IncompleteContext { name: OUTER.to_string() })?;
                outer
                    .container()
                    .cloned()
                    .ok_or_else(|| BindError::IncompleteContext { name: OUTER.to_string() })
            }
            Reference::InOuter(inner) => {
                let outer = resolver
                    .outer()
                    .ok_or_else(|| BindError::IncompleteContext { name: OUTER.to_string() })?;
                inner.resolve(outer)
            }
            Reference::Attribute { via, name, of } => {
                let value = via.resolve(resolver)?;
                if !of.matches(&value) {
                    return Err(BindError::BindingAccess {
                        name: name.clone(),
                        reason: "value does not fit this type branch".to_string(),
                    });
                }
                value
                    .as_struct()
                    .and_then(|m| m.get(name))
                    .cloned()
                    .ok_or_else(|| BindError::BindingAccess {
                        name: name.clone(),
                        reason: "no such attribute on the value".to_string(),
                    })
            }
            Reference::Index { via, index, elem } => {
                let value = via.resolve(resolver)?;
                let at = evaluate_size(index.as_ref(), resolver)? as usize;
                let items = value.as_list().ok_or_else(|| BindError::BindingAccess {
                    name: self.describe(),
                    reason: "value is not indexable".to_string(),
                })?;
                let item = items.get(at).ok_or_else(|| BindError::BindingAccess {
                    name: self.describe(),
                    reason: format!("index {at} out of bounds ({} elements)", items.len()),
                })?;
                if !elem.matches(item) {
                    return Err(BindError::BindingAccess {
                        name: self.describe(),
                        reason: "element does not fit this type branch".to_string(),
                    });
                }
                Ok(item.clone())
            }
            Reference::Multi(branches) => {
                let mut last = None;
                for branch in branches {
                    match branch.resolve(resolver) {
                        Ok(v) => return Ok(v),
                        Err(e) => last = Some(e),
                    }
                }
                Err(last.unwrap_or_else(|| BindError::BindingAccess {
                    name: self.describe(),
                    reason: "reference has no branches".to_string(),
                }))
            }
        }
    }

    /// Select an attribute, supporting dotted-path expressions. On a
    /// polymorphic binding this fans out one branch per declared struct type.
    pub fn attribute(&self, scopes: &Scopes, name: &str) -> Result<Reference, BindError> {
        match self {
            Reference::Binding { name: own, types, .. } => {
                let branches: Vec<Reference> = types
                    .iter()
                    .filter(|t| matches!(t, TypeTag::Struct(_) | TypeTag::Any))
                    .map(|t| Reference::Attribute {
                        via: Box::new(self.clone()),
                        name: name.to_string(),
                        of: t.clone(),
                    })
                    .collect();
                Self::fan_out(branches, || BindError::BindingAccess {
                    name: own.clone(),
                    reason: format!("no declared type exposes attribute {name:?}"),
                })
            }
            Reference::Outer { outer } => {
                let outer = outer.ok_or_else(|| BindError::IncompleteContext {
                    name: OUTER.to_string(),
                })?;
                Ok(Reference::InOuter(Box::new(scopes.resolve(outer, name)?)))
            }
            Reference::InOuter(inner) => {
                Ok(Reference::InOuter(Box::new(inner.attribute(scopes, name)?)))
            }
            Reference::Multi(branches) => {
                let ok: Vec<Reference> = branches
                    .iter()
                    .filter_map(|b| b.attribute(scopes, name).ok())
                    .collect();
                Self::fan_out(ok, || BindError::BindingAccess {
                    name: self.describe(),
                    reason: format!("no branch exposes attribute {name:?}"),
                })
            }
            _ => Ok(Reference::Attribute {
                via: Box::new(self.clone()),
                name: name.to_string(),
                of: TypeTag::Any,
            }),
        }
    }

    /// Select an element by index expression. On a polymorphic binding this
    /// fans out one branch per declared array type.
    pub fn index(&self, index: Arc<dyn Expression>) -> Result<Reference, BindError> {
        match self {
            Reference::Binding { name, types, .. } => {
                let branches: Vec<Reference> = types
                    .iter()
                    .filter_map(|t| match t {
                        TypeTag::Array(elem) => Some(Reference::Index {
                            via: Box::new(self.clone()),
                            index: Arc::clone(&index),
                            elem: (**elem).clone(),
                        }),
                        _ => None,
                    })
                    .collect();
                Self::fan_out(branches, || BindError::BindingAccess {
                    name: name.clone(),
                    reason: "no declared type is an array".to_string(),
                })
            }
            Reference::Outer { .. } => Err(BindError::BindingAccess {
                name: OUTER.to_string(),
                reason: "the enclosing structure is not indexable".to_string(),
            }),
            Reference::InOuter(inner) => {
                Ok(Reference::InOuter(Box::new(inner.index(index)?)))
            }
            Reference::Multi(branches) => {
                let ok: Vec<Reference> = branches
                    .iter()
                    .filter_map(|b| b.index(Arc::clone(&index)).ok())
                    .collect();
                Self::fan_out(ok, || BindError::BindingAccess {
                    name: self.describe(),
                    reason: "no branch is indexable".to_string(),
                })
            }
            _ => Ok(Reference::Index {
                via: Box::new(self.clone()),
                index,
                elem: TypeTag::Any,
            }),
        }
    }

    /// True iff `tag` is compatible with at least one declared type branch.
    pub fn is_assignable_to(&self, tag: &TypeTag) -> bool {
        match self {
            Reference::Binding { types, .. } => {
                types.iter().any(|t| t.compatible_with(tag))
            }
            Reference::Outer { .. } => matches!(tag, TypeTag::Any | TypeTag::Struct(_)),
            Reference::InOuter(inner) => inner.is_assignable_to(tag),
            Reference::Attribute { .. } => true,
            Reference::Index { elem, .. } => elem.compatible_with(tag),
            Reference::Multi(branches) => branches.iter().any(|b| b.is_assignable_to(tag)),
        }
    }

    /// Path-style rendering for documentation and error messages.
    pub fn describe(&self) -> String {
        match self {
            Reference::Binding { name, .. } => name.clone(),
            Reference::Outer { .. } => OUTER.to_string(),
            Reference::InOuter(inner) => format!("{OUTER}.{}", inner.describe()),
            Reference::Attribute { via, name, .. } => format!("{}.{name}", via.describe()),
            Reference::Index { via, index, .. } => {
                format!("{}[{}]", via.describe(), index.describe())
            }
            Reference::Multi(branches) => {
                let parts: Vec<String> = branches.iter().map(Reference::describe).collect();
                format!("either of ({})", parts.join(", "))
            }
        }
    }

    fn fan_out(
        mut branches: Vec<Reference>,
        none: impl FnOnce() -> BindError,
    ) -> Result<Reference, BindError> {
        match branches.len() {
            0 => Err(none()),
            1 => Ok(branches.remove(0)),
            _ => Ok(Reference::Multi(branches)),
        }
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({})", self.describe())
    }
}

/// Runtime lookup for one decoded instance: maps a binding name to the
/// field's current value. Fresh per decode invocation, never persisted.
pub struct Resolver<'a> {
    scopes: &'a Scopes,
    scope: ScopeId,
    container: Option<&'a Value>,
    outer: Option<&'a Resolver<'a>>,
}

impl<'a> Resolver<'a> {
    pub fn new(scopes: &'a Scopes, scope: ScopeId, container: Option<&'a Value>) -> Self {
        Resolver { scopes, scope, container, outer: None }
    }

    /// Resolver for a nested structure, chained to the resolver of its
    /// enclosing structure.
    pub fn nested(
        scopes: &'a Scopes,
        scope: ScopeId,
        container: Option<&'a Value>,
        outer: &'a Resolver<'a>,
    ) -> Self {
        Resolver { scopes, scope, container, outer: Some(outer) }
    }

    /// Current value of the named binding. A known name with no container
    /// yet is an incomplete context (forward reference); an unknown name
    /// reports the scope's known names.
    pub fn get(&self, name: &str) -> Result<Value, BindError> {
        self.get_in(self.scope, name)
    }

    /// Look the binding up in a specific scope. A reference resolves through
    /// the scope that produced it, not through whatever scope the resolver
    /// happens to carry, so a same-named binding elsewhere never shadows it.
    fn get_in(&self, scope: ScopeId, name: &str) -> Result<Value, BindError> {
        let scope = self.scopes.scope(scope);
        match scope.bindings.get(name) {
            Some(binding) => {
                let container = self.container.ok_or_else(|| {
                    BindError::IncompleteContext { name: name.to_string() }
                })?;
                binding.get(container)
            }
            None => Err(BindError::UnknownBinding {
                name: name.to_string(),
                known: scope.bindings.keys().cloned().collect(),
            }),
        }
    }

    pub fn container(&self) -> Option<&Value> {
        self.container
    }

    pub fn outer(&self) -> Option<&Resolver<'a>> {
        self.outer
    }
}
