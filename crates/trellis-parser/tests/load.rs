use trellis_core::{
    model::{TypeKind, TypeRef, Visibility},
    relation::RelationKind,
};
use trellis_parser::{
    error::ErrorCode,
    load_model,
    tags::{MatchKind, parse_match, parse_option, parse_relation},
};

const SHOP: &str = r#"
[[types]]
name = "shop.Order"
imports = ["java.util.List", "java.util.Map"]
tags = [
    "@navcomposed 1 - * LineItem",
    "@depend - - - billing.Invoice",
    "@opt attributes",
]

[[types.fields]]
name = "lines"
type = "List<LineItem>"

[[types.fields]]
name = "byCode"
type = "Map<String, LineItem>"
visibility = "protected"

[[types]]
name = "shop.LineItem"

[[types]]
name = "shop.Status"
kind = "enum"
enum_constants = ["OPEN", "PAID"]

[[types]]
name = "billing.Invoice"
"#;

#[test]
fn test_load_shop_model() {
    let model = load_model(SHOP).expect("Failed to load model");

    let roots: Vec<&str> = model.roots().map(|decl| decl.name()).collect();
    assert_eq!(
        roots,
        vec!["shop.Order", "shop.LineItem", "shop.Status", "billing.Invoice"]
    );
    assert_eq!(model.packages(), vec!["shop", "billing"]);

    let order = model.get("shop.Order").unwrap();
    assert_eq!(
        order.fields()[0].type_ref(),
        &TypeRef::generic("java.util.List", vec![TypeRef::class("shop.LineItem")])
    );
    assert_eq!(order.fields()[1].visibility(), Visibility::Protected);

    let status = model.get("shop.Status").unwrap();
    assert_eq!(status.kind(), TypeKind::Enum);
    assert_eq!(status.enum_constants(), ["OPEN", "PAID"]);
}

#[test]
fn test_tags_of_loaded_model_parse() {
    let model = load_model(SHOP).expect("Failed to load model");
    let order = model.get("shop.Order").unwrap();

    let composed = order.tags_named("navcomposed").next().unwrap();
    let rel = parse_relation(RelationKind::NavComposed, composed.text()).unwrap();
    assert_eq!(rel.tail_label(), "1");
    assert_eq!(rel.head_label(), "*");
    assert_eq!(
        model.resolve_name(order, rel.target()).map(|decl| decl.name()),
        Some("shop.LineItem")
    );

    let opt = order.tags_named("opt").next().unwrap();
    assert!(parse_option(opt.text()).unwrap().is("attributes"));
}

#[test]
fn test_view_tags() {
    let spec = parse_match("subclass shop\\..*").expect("Failed to parse match");
    assert_eq!(spec.kind(), MatchKind::Subclass);
    assert_eq!(spec.pattern(), "shop\\..*");
}

#[test]
fn test_load_reports_every_duplicate() {
    let src = r#"
        [[types]]
        name = "a.A"
        [[types]]
        name = "a.A"
        [[types]]
        name = "a.B"
        [[types]]
        name = "a.B"
    "#;

    let err = load_model(src).unwrap_err();
    let codes: Vec<_> = err
        .diagnostics()
        .iter()
        .filter_map(|diag| diag.code())
        .collect();
    assert_eq!(codes, vec![ErrorCode::E201, ErrorCode::E201]);
    assert!(err.to_string().contains("(+1 more)"));
}
