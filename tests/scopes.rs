//! Binding resolution tests: registration, name lookup, the reserved `outer`
//! name, indexed and polymorphic references, dotted paths, and documentation
//! rendering.

use bitbound::{
    BindError, Binding, Const, Reference, Resolver, Scopes, TypeTag, Value,
};
use indexmap::IndexMap;
use std::sync::Arc;

fn container(fields: &[(&str, Value)]) -> Value {
    let mut m = IndexMap::new();
    for (k, v) in fields {
        m.insert(k.to_string(), v.clone());
    }
    Value::Struct(m)
}

// ==================== Registration ====================

#[test]
fn registering_the_same_name_twice_is_a_duplicate() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes.register(scope, Binding::field("x", TypeTag::Uint)).unwrap();
    let err = scopes
        .register(scope, Binding::field("x", TypeTag::Text))
        .unwrap_err();
    assert!(matches!(err, BindError::DuplicateBinding { ref name } if name == "x"));
}

#[test]
fn same_name_in_different_scopes_is_fine() {
    let mut scopes = Scopes::new();
    let a = scopes.create(None);
    let b = scopes.create(Some(a));
    scopes.register(a, Binding::field("x", TypeTag::Uint)).unwrap();
    scopes.register(b, Binding::field("x", TypeTag::Text)).unwrap();
}

// ==================== Name lookup ====================

#[test]
fn unknown_name_reports_the_known_names() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes.register(scope, Binding::field("x", TypeTag::Uint)).unwrap();
    scopes.register(scope, Binding::field("y", TypeTag::Uint)).unwrap();

    let err = scopes.resolve(scope, "z").unwrap_err();
    match err {
        BindError::UnknownBinding { name, known } => {
            assert_eq!(name, "z");
            assert_eq!(known, vec!["x".to_string(), "y".to_string()]);
        }
        other => panic!("expected UnknownBinding, got {other:?}"),
    }
    // The rendered message carries the alternatives.
    let msg = scopes.resolve(scope, "z").unwrap_err().to_string();
    assert!(msg.contains("one of x, y"), "message was: {msg}");
}

#[test]
fn resolving_a_binding_reads_the_container_value() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes.register(scope, Binding::field("len", TypeTag::Uint)).unwrap();

    let c = container(&[("len", Value::U16(42))]);
    let resolver = Resolver::new(&scopes, scope, Some(&c));
    let r = scopes.resolve(scope, "len").unwrap();
    assert_eq!(r.resolve(&resolver).unwrap(), Value::U16(42));
}

#[test]
fn resolving_against_an_absent_container_is_incomplete_context() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes.register(scope, Binding::field("len", TypeTag::Uint)).unwrap();

    let resolver = Resolver::new(&scopes, scope, None);
    let r = scopes.resolve(scope, "len").unwrap();
    let err = r.resolve(&resolver).unwrap_err();
    assert!(matches!(err, BindError::IncompleteContext { ref name } if name == "len"));
}

#[test]
fn accessor_failure_is_a_binding_access_error() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes.register(scope, Binding::field("len", TypeTag::Uint)).unwrap();

    // Container exists but has no such member.
    let c = container(&[]);
    let resolver = Resolver::new(&scopes, scope, Some(&c));
    let err = scopes.resolve(scope, "len").unwrap().resolve(&resolver).unwrap_err();
    assert!(matches!(err, BindError::BindingAccess { ref name, .. } if name == "len"));
}

#[test]
fn reference_resolves_through_its_owning_scope() {
    let mut scopes = Scopes::new();
    let a = scopes.create(None);
    let b = scopes.create(None);
    // Same name in both scopes, but scope A's binding doubles the raw value.
    scopes
        .register(
            a,
            Binding::with_accessor(
                "len",
                vec![TypeTag::Uint],
                Arc::new(|c: &Value| {
                    let n = c.as_struct()?.get("len")?.as_u64()?;
                    Some(Value::U64(n * 2))
                }),
            ),
        )
        .unwrap();
    scopes.register(b, Binding::field("len", TypeTag::Uint)).unwrap();

    let c = container(&[("len", Value::U8(21))]);
    let from_a = scopes.resolve(a, "len").unwrap();

    // Even against a resolver carrying scope B, the reference keeps using
    // the binding of the scope that produced it.
    let resolver = Resolver::new(&scopes, b, Some(&c));
    assert_eq!(from_a.resolve(&resolver).unwrap(), Value::U64(42));
}

// ==================== The reserved outer name ====================

#[test]
fn outer_resolves_structurally_even_without_an_enclosing_scope() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    // Lookup itself succeeds.
    let r = scopes.resolve(scope, "outer").unwrap();

    // Resolution against a resolver with no outer is an incomplete context,
    // not an unknown binding.
    let resolver = Resolver::new(&scopes, scope, None);
    let err = r.resolve(&resolver).unwrap_err();
    assert!(matches!(err, BindError::IncompleteContext { ref name } if name == "outer"));
}

#[test]
fn outer_field_resolves_through_the_enclosing_resolver() {
    let mut scopes = Scopes::new();
    let outer_scope = scopes.create(None);
    let inner_scope = scopes.create(Some(outer_scope));
    scopes.register(outer_scope, Binding::field("version", TypeTag::Uint)).unwrap();

    let outer_value = container(&[("version", Value::U8(2))]);
    let inner_value = container(&[]);

    let outer_resolver = Resolver::new(&scopes, outer_scope, Some(&outer_value));
    let inner_resolver =
        Resolver::nested(&scopes, inner_scope, Some(&inner_value), &outer_resolver);

    let r = scopes
        .resolve(inner_scope, "outer")
        .unwrap()
        .attribute(&scopes, "version")
        .unwrap();
    assert_eq!(r.resolve(&inner_resolver).unwrap(), Value::U8(2));
    assert_eq!(r.describe(), "outer.version");
}

#[test]
fn outer_chains_nest_across_two_levels() {
    let mut scopes = Scopes::new();
    let top = scopes.create(None);
    let mid = scopes.create(Some(top));
    let leaf = scopes.create(Some(mid));
    scopes.register(top, Binding::field("magic", TypeTag::Uint)).unwrap();

    let top_value = container(&[("magic", Value::U32(0xCAFE))]);
    let mid_value = container(&[]);
    let leaf_value = container(&[]);

    let top_r = Resolver::new(&scopes, top, Some(&top_value));
    let mid_r = Resolver::nested(&scopes, mid, Some(&mid_value), &top_r);
    let leaf_r = Resolver::nested(&scopes, leaf, Some(&leaf_value), &mid_r);

    let r = scopes
        .resolve(leaf, "outer")
        .unwrap()
        .attribute(&scopes, "outer")
        .unwrap()
        .attribute(&scopes, "magic")
        .unwrap();
    assert_eq!(r.resolve(&leaf_r).unwrap(), Value::U32(0xCAFE));
    assert_eq!(r.describe(), "outer.outer.magic");
}

#[test]
fn outer_reference_yields_the_enclosing_container_itself() {
    let mut scopes = Scopes::new();
    let outer_scope = scopes.create(None);
    let inner_scope = scopes.create(Some(outer_scope));

    let outer_value = container(&[("n", Value::U8(1))]);
    let outer_resolver = Resolver::new(&scopes, outer_scope, Some(&outer_value));
    let inner_resolver = Resolver::nested(&scopes, inner_scope, None, &outer_resolver);

    let r = scopes.resolve(inner_scope, "outer").unwrap();
    assert_eq!(r.resolve(&inner_resolver).unwrap(), outer_value);
}

// ==================== Indexed and polymorphic references ====================

#[test]
fn indexed_reference_selects_a_list_element() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes
        .register(
            scope,
            Binding::field("items", TypeTag::Array(Box::new(TypeTag::Uint))),
        )
        .unwrap();

    let c = container(&[(
        "items",
        Value::List(vec![Value::U8(10), Value::U8(20), Value::U8(30)]),
    )]);
    let resolver = Resolver::new(&scopes, scope, Some(&c));

    let r = scopes
        .resolve_indexed(scope, "items", Arc::new(Const(Value::U8(1))))
        .unwrap();
    assert_eq!(r.resolve(&resolver).unwrap(), Value::U8(20));
    assert_eq!(r.describe(), "items[1]");
}

#[test]
fn indexed_reference_out_of_bounds_is_a_binding_access_error() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes
        .register(
            scope,
            Binding::field("items", TypeTag::Array(Box::new(TypeTag::Uint))),
        )
        .unwrap();

    let c = container(&[("items", Value::List(vec![Value::U8(10)]))]);
    let resolver = Resolver::new(&scopes, scope, Some(&c));
    let r = scopes
        .resolve_indexed(scope, "items", Arc::new(Const(Value::U8(5))))
        .unwrap();
    assert!(matches!(r.resolve(&resolver), Err(BindError::BindingAccess { .. })));
}

#[test]
fn indexing_a_non_array_binding_fails_at_construction() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes.register(scope, Binding::field("n", TypeTag::Uint)).unwrap();
    let err = scopes
        .resolve_indexed(scope, "n", Arc::new(Const(Value::U8(0))))
        .unwrap_err();
    assert!(matches!(err, BindError::BindingAccess { ref name, .. } if name == "n"));
}

#[test]
fn polymorphic_indexed_reference_fans_out_and_picks_the_live_branch() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    // Static type is a union of two array types; the runtime value decides.
    scopes
        .register(
            scope,
            Binding::field_multi(
                "data",
                vec![
                    TypeTag::Array(Box::new(TypeTag::Uint)),
                    TypeTag::Array(Box::new(TypeTag::Text)),
                ],
            ),
        )
        .unwrap();

    let r = scopes
        .resolve_indexed(scope, "data", Arc::new(Const(Value::U8(0))))
        .unwrap();
    assert!(matches!(r, Reference::Multi(_)));
    assert!(r.is_assignable_to(&TypeTag::Uint));
    assert!(r.is_assignable_to(&TypeTag::Text));
    assert!(!r.is_assignable_to(&TypeTag::Bool));

    let texts = container(&[(
        "data",
        Value::List(vec![Value::Text("hi".to_string())]),
    )]);
    let resolver = Resolver::new(&scopes, scope, Some(&texts));
    assert_eq!(r.resolve(&resolver).unwrap(), Value::Text("hi".to_string()));

    let uints = container(&[("data", Value::List(vec![Value::U8(9)]))]);
    let resolver = Resolver::new(&scopes, scope, Some(&uints));
    assert_eq!(r.resolve(&resolver).unwrap(), Value::U8(9));
}

#[test]
fn dotted_path_reaches_into_a_struct_binding() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes
        .register(scope, Binding::field("header", TypeTag::Struct("Header".to_string())))
        .unwrap();

    let header = container(&[("size", Value::U16(8))]);
    let c = container(&[("header", header)]);
    let resolver = Resolver::new(&scopes, scope, Some(&c));

    let r = scopes
        .resolve(scope, "header")
        .unwrap()
        .attribute(&scopes, "size")
        .unwrap();
    assert_eq!(r.resolve(&resolver).unwrap(), Value::U16(8));
    assert_eq!(r.describe(), "header.size");
}

#[test]
fn attribute_on_a_non_struct_binding_fails_at_construction() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes.register(scope, Binding::field("n", TypeTag::Uint)).unwrap();
    let err = scopes
        .resolve(scope, "n")
        .unwrap()
        .attribute(&scopes, "size")
        .unwrap_err();
    assert!(matches!(err, BindError::BindingAccess { .. }));
}

#[test]
fn polymorphic_attribute_fans_out_per_struct_branch() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes
        .register(
            scope,
            Binding::field_multi(
                "body",
                vec![
                    TypeTag::Struct("Ping".to_string()),
                    TypeTag::Struct("Pong".to_string()),
                ],
            ),
        )
        .unwrap();

    let r = scopes
        .resolve(scope, "body")
        .unwrap()
        .attribute(&scopes, "seq")
        .unwrap();
    assert!(matches!(r, Reference::Multi(_)));

    let body = container(&[("seq", Value::U32(7))]);
    let c = container(&[("body", body)]);
    let resolver = Resolver::new(&scopes, scope, Some(&c));
    assert_eq!(r.resolve(&resolver).unwrap(), Value::U32(7));
}

// ==================== Custom accessors ====================

#[test]
fn binding_accessors_are_arbitrary_closures() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes
        .register(
            scope,
            Binding::with_accessor(
                "double_len",
                vec![TypeTag::Uint],
                Arc::new(|c: &Value| {
                    let n = c.as_struct()?.get("len")?.as_u64()?;
                    Some(Value::U64(n * 2))
                }),
            ),
        )
        .unwrap();

    let c = container(&[("len", Value::U8(21))]);
    let resolver = Resolver::new(&scopes, scope, Some(&c));
    let r = scopes.resolve(scope, "double_len").unwrap();
    assert_eq!(r.resolve(&resolver).unwrap(), Value::U64(42));
}

// ==================== Documentation rendering ====================

#[test]
fn scope_documentation_lists_names_in_registration_order() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes.register(scope, Binding::field("x", TypeTag::Uint)).unwrap();
    scopes.register(scope, Binding::field("y", TypeTag::Uint)).unwrap();
    assert_eq!(scopes.describe(scope), "one of x, y");

    let names: Vec<&str> = scopes.bindings(scope).map(|b| b.name()).collect();
    assert_eq!(names, vec!["x", "y"]);
}

#[test]
fn empty_scope_documentation_renders_no_variables() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    assert_eq!(scopes.describe(scope), "no variables");
}

#[test]
fn multi_reference_documentation_lists_alternatives() {
    let mut scopes = Scopes::new();
    let scope = scopes.create(None);
    scopes
        .register(
            scope,
            Binding::field_multi(
                "data",
                vec![
                    TypeTag::Array(Box::new(TypeTag::Uint)),
                    TypeTag::Array(Box::new(TypeTag::Text)),
                ],
            ),
        )
        .unwrap();
    let r = scopes
        .resolve_indexed(scope, "data", Arc::new(Const(Value::U8(0))))
        .unwrap();
    assert_eq!(r.describe(), "either of (data[0], data[0])");
}
