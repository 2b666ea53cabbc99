use crate::VariableDeclaration;
use crate::VariableSpec;
use crate::infer_declarations;
use crate::strip_modifiers;
use crate::tests::utils::vars;
use crate::variable_declaration::join_declarations;
use serde_json::json;

fn declared(referenced: &[&str], variables: serde_json::Value) -> String {
    join_declarations(&infer_declarations(referenced, &vars(variables)))
}

#[test]
fn infers_every_supported_kind_in_key_order() {
    let declarations = declared(&["name", "bool", "int", "id"], json!({
        "name": "fatih",
        "bool": true,
        "int": 2,
        "float": 2.3,
        "id": 1,
        "user_id!": 2,
        "postID": "45af67cd",
        "custom_id!CustomType": "1",
        "customId": "1",
        "target![ID!]": ["Q29uZ3JhdHVsYXRpb25z"],
    }));

    assert_eq!(
        declarations,
        "$name: String!, $bool: Boolean!, $int: Int!, $float: Float!, $id: ID!, \
        $user_id: Int!, $postID: ID!, $custom_id: CustomType!, $customId: ID!, \
        $target: [ID!]!",
    );
}

#[test]
fn arrays_are_typed_from_their_first_element() {
    assert_eq!(declared(&[], json!({"tags": ["a", "b"]})), "$tags: [String!]!");
    assert_eq!(declared(&[], json!({"scores": [1.5, 2]})), "$scores: [Float!]!");
}

#[test]
fn integral_floats_are_ints() {
    assert_eq!(declared(&[], json!({"count": 2.0})), "$count: Int!");
}

#[test]
fn uninferable_values_are_not_declared() {
    assert_eq!(declared(&[], json!({"filter": {"a": 1}, "none": null, "empty": []})), "");
}

#[test]
fn referenced_names_without_values_declare_only_ids() {
    assert_eq!(declared(&["postId", "title"], json!({})), "$postId: ID!");
}

#[test]
fn each_name_is_declared_once() {
    assert_eq!(declared(&["id"], json!({"id": 1, "id!": 2})), "$id: ID!");
}

#[test]
fn parses_modifier_grammar() {
    let bare = VariableSpec::parse("name");
    assert_eq!(bare.name(), "name");
    assert_eq!(bare.explicit_type(), None);
    assert!(!bare.forced_non_null());

    let forced = VariableSpec::parse("name!");
    assert_eq!(forced.name(), "name");
    assert_eq!(forced.explicit_type(), None);
    assert!(forced.forced_non_null());

    let custom = VariableSpec::parse("custom_id!CustomType");
    assert_eq!(custom.name(), "custom_id");
    assert_eq!(custom.explicit_type(), Some("CustomType"));

    let bracketed = VariableSpec::parse("target![ID!]");
    assert_eq!(bracketed.name(), "target");
    assert_eq!(bracketed.explicit_type(), Some("[ID!]"));
}

#[test]
fn explicit_types_bypass_inference() {
    let spec = VariableSpec::parse("when!DateTime");
    assert_eq!(
        spec.declaration(Some(&json!(42))),
        Some(VariableDeclaration::new("when", "DateTime!")),
    );
}

#[test]
fn strip_modifiers_keeps_first_value_per_name() {
    let stripped = strip_modifiers(&vars(json!({
        "user_id!": 2,
        "custom_id!CustomType": "1",
        "user_id": 3,
    })));
    assert_eq!(stripped, vars(json!({"user_id": 2, "custom_id": "1"})));
}
