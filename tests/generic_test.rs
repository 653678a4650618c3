use failure::Error;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use statelint::node::{Node, ValueType};
use statelint::{Config, Problem, ProblemKind, RuleError, RuleSet, Validator};

const INVENTORY_RULES: &str = r#"This document specifies a JSON object called an "Inventory".

An Inventory MUST have an object field named "items"; each field is an "Item".
An Inventory MAY have a nullable-string field named "owner".
An Inventory MAY have a field named "extensions".

An Item MUST have a string field named "kind" whose value MUST be one of "tool", "part", or "kit".
An Item MAY have a nonnegative-integer field named "count".
An Item MAY have an integer-array field named "sizes".
An Item MAY have a numeric field named "price" whose value MUST be greater than 0.

An Item is a "Record".
A Record with a "parts" field is a "Bundle".
A Bundle whose "kind" field's value is "kit" is a "Kit".
A Bundle MUST have a nonempty-string-array field named "parts".
A Kit MAY have a string field named "box".
A Kit MUST NOT have a field named "sizes".

An Item MAY have a string field named "sku".
An Item MAY have a string field named "barcode".
An Item MUST have only one of "sku" and "barcode".
"#;

fn validate(document: Value) -> Result<Vec<Problem>, Error> {
    let rules = RuleSet::compile(INVENTORY_RULES)?;

    let mut config = Config::new();
    config.structural_checks(false);
    Ok(Validator::new_with_config(config).validate(&rules, &document))
}

fn kinds(problems: &[Problem]) -> Vec<ProblemKind> {
    problems.iter().map(Problem::kind).collect()
}

#[test]
fn valid_inventory() -> Result<(), Error> {
    let problems = validate(json!({
        "items": {
            "hammer": {"kind": "tool", "count": 3, "sku": "H-1", "price": 9.5},
            "bolt": {"kind": "part", "sizes": [4, 6, 8], "barcode": "0001"},
            "starter": {"kind": "kit", "parts": ["hammer", "bolt"], "box": "small"}
        },
        "owner": null,
        "extensions": {"anything": ["goes", 1, {"here": true}]}
    }))?;

    assert_eq!(problems, vec![]);
    Ok(())
}

#[test]
fn roles_chain_through_rule_families() -> Result<(), Error> {
    // Item -> Record by is-a, Record -> Bundle by field presence, Bundle ->
    // Kit by field value, all while closing the roles of one node.
    let problems = validate(json!({
        "items": {
            "starter": {"kind": "kit", "parts": [], "box": 1, "sizes": [1]}
        }
    }))?;

    assert_eq!(
        kinds(&problems),
        vec![
            ProblemKind::NonEmptyArray,
            ProblemKind::FieldType,
            ProblemKind::DoesNotHaveField
        ]
    );
    Ok(())
}

#[test]
fn unknown_fields() -> Result<(), Error> {
    let problems = validate(json!({
        "items": {"a": {"kind": "tool", "colour": "red", "box": "large"}},
        "ownr": "me"
    }))?;

    assert_eq!(
        problems
            .iter()
            .map(|p| p.message().to_owned())
            .collect::<Vec<_>>(),
        vec![
            "Field \"ownr\" not allowed in Inventory.",
            "Field \"colour\" not allowed in Inventory.items.a.",
            "Field \"box\" not allowed in Inventory.items.a.",
        ]
    );
    Ok(())
}

#[test]
fn array_elements_are_checked_one_by_one() -> Result<(), Error> {
    let problems = validate(json!({
        "items": {"a": {"kind": "part", "sizes": [1, 2, "x", 4]}}
    }))?;
    assert_eq!(kinds(&problems), vec![ProblemKind::FieldType]);
    assert_eq!(problems[0].args()[0], "Inventory.items.a.sizes[2]");

    let problems = validate(json!({
        "items": {"a": {"kind": "part", "sizes": [1, 2, 3]}}
    }))?;
    assert_eq!(problems, vec![]);
    Ok(())
}

#[test]
fn nullable_fields() -> Result<(), Error> {
    assert_eq!(validate(json!({"items": {}, "owner": null}))?, vec![]);

    let problems = validate(json!({"items": null}))?;
    assert_eq!(kinds(&problems), vec![ProblemKind::FieldTypeNull]);
    Ok(())
}

#[test]
fn values_and_ranges() -> Result<(), Error> {
    let problems = validate(json!({
        "items": {
            "a": {"kind": "gadget", "count": -1, "price": 0}
        }
    }))?;

    assert_eq!(
        kinds(&problems),
        vec![
            ProblemKind::FieldValueEnum,
            ProblemKind::FieldValueMin,
            ProblemKind::FieldValueFloor,
        ]
    );
    assert_eq!(
        problems[0].message(),
        "Inventory.items.a.kind is \"gadget\", should be one of [\"tool\", \"part\", \"kit\"]."
    );
    Ok(())
}

#[test]
fn only_one_of() -> Result<(), Error> {
    let problems = validate(json!({
        "items": {"a": {"kind": "tool", "sku": "1", "barcode": "2"}}
    }))?;
    assert_eq!(kinds(&problems), vec![ProblemKind::OnlyOneOf]);

    let problems = validate(json!({"items": {"a": {"kind": "tool", "sku": "1"}}}))?;
    assert_eq!(problems, vec![]);
    Ok(())
}

#[test]
fn structural_checks_apply_to_any_vocabulary() -> Result<(), Error> {
    let rules = RuleSet::compile(
        r#"This document specifies a JSON object called a "Flow".
A Flow MUST have an object field named "States"; each field is a "Step".
A Flow MUST have a string field named "StartAt".
A Step MAY have a string field named "Type".
A Step MAY have a string field named "Next".
A Step MAY have a boolean field named "End".
"#,
    )?;

    let document = json!({
        "StartAt": "a",
        "States": {
            "a": {"Next": "b"},
            "b": {"End": true},
            "c": {"Type": "Succeed"}
        }
    });

    let problems = Validator::new().validate(&rules, &document);
    assert_eq!(kinds(&problems), vec![ProblemKind::UnreachableState]);
    assert_eq!(problems[0].args(), &["Flow".to_owned(), "c".to_owned()][..]);
    Ok(())
}

#[test]
fn reading_a_validated_document() -> Result<(), Error> {
    let rules = RuleSet::state_machine()?;
    let document = json!({
        "StartAt": "Hold",
        "TimeoutSeconds": 60.0,
        "States": {
            "Hold": {"Type": "Wait", "Timestamp": "2016-03-14T01:59:00+02:00", "End": true}
        }
    });
    assert_eq!(Validator::new().validate(&rules, &document), vec![]);

    let machine = Node::new(&document);
    assert_eq!(machine.field("TimeoutSeconds").to_i64(), 60);

    let hold = machine.field("States").field("Hold");
    assert!(hold.field("Timestamp").is(ValueType::Timestamp));
    let at = hold.field("Timestamp").to_timestamp();
    assert_eq!(at.to_rfc3339(), "2016-03-14T01:59:00+02:00");
    assert_eq!(at.timestamp(), 1_457_913_540);
    Ok(())
}

#[test]
fn broken_rule_files() {
    assert_eq!(
        RuleSet::compile("An Item MUST have a string field named \"kind\".").unwrap_err(),
        RuleError::MissingRoot { line: 1 }
    );

    let err = RuleSet::compile(
        "This document specifies a JSON object called an \"Inventory\".\n\
         An Inventory MUST have a string field named \"kind\".\n\
         An Inventory SHOULD have a string field named \"name\".\n",
    )
    .unwrap_err();
    assert_eq!(
        err,
        RuleError::UnrecognizedLine {
            line: 3,
            text: "An Inventory SHOULD have a string field named \"name\".".to_owned(),
        }
    );
}
