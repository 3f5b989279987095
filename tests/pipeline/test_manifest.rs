use morphflow::core::pipeline::ast::Node;
use morphflow::core::pipeline::{
    from, join, lift, to_event_bus, to_queue, Function, PipelineManifest,
};
use morphflow::core::state_machine::{Compiler, CompilerOptions, StateKind};
use morphflow::core::types::ErrorCategory;
use morphflow::core::{EventBusRef, FunctionRef, QueueRef};
use std::io::Write;
use tempfile::NamedTempFile;

const ACCOUNT_MANIFEST: &str = r#"
version: "1.0"
pipeline:
  name: recommend
  event_buses:
    input: { uri: "arn:bus:input" }
  queues:
    reply: { uri: "https://sqs/reply" }
  functions:
    AtoU: { uri: "arn:fn:AtoU", input: Account, output: User }
    UtoCs: { uri: "arn:fn:UtoCs", input: User, output: "[Category]" }
    CtoPs: { uri: "arn:fn:CtoPs", input: Category, output: "Vec<Product>" }
    PtoS: { uri: "arn:fn:PtoS", input: Product, output: Mail }
  dead_letter_queue: reply
  steps:
    - from: { bus: input, type: Account }
    - join: AtoU
    - join: UtoCs
    - lift: CtoPs
    - lift: PtoS
    - to_queue: reply
"#;

struct Account;
struct User;
struct Category;
struct Product;
struct Mail;

fn function<A, B>(id: &str) -> Function<A, B> {
    Function::new(FunctionRef::new(id, format!("arn:fn:{}", id)))
}

#[test]
fn test_manifest_builds_same_ast_as_typed_pipeline() {
    let manifest = PipelineManifest::from_yaml_str(ACCOUNT_MANIFEST).expect("manifest");
    let from_manifest = manifest.build().expect("build");

    let get_user: Function<Account, User> = function("AtoU");
    let pick_category: Function<User, Vec<Category>> = function("UtoCs");
    let pick_product: Function<Category, Vec<Product>> = function("CtoPs");
    let mail_to: Function<Product, Mail> = function("PtoS");
    let typed = to_queue(
        &QueueRef::new("reply", "https://sqs/reply"),
        lift(
            &mail_to,
            lift(
                &pick_product,
                join(
                    &pick_category,
                    join(&get_user, from::<Account>(&EventBusRef::new("input", "arn:bus:input"), &[])),
                ),
            ),
        ),
    );

    assert_eq!(from_manifest, typed.ast().expect("ast"));
}

#[test]
fn test_manifest_compiles_account_scenario() {
    let manifest = PipelineManifest::from_yaml_str(ACCOUNT_MANIFEST).expect("manifest");
    let options = CompilerOptions {
        dead_letter_queue: manifest.dead_letter_queue(),
        ..CompilerOptions::default()
    };
    let compiled = Compiler::new(options)
        .compile_ast(&manifest.build().expect("build"))
        .expect("compile");

    let ids: Vec<_> = compiled
        .state_machine
        .chain
        .states
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(ids, vec!["MapAtoU", "MapUtoCs", "Seq880240ab", "Sink"]);
    let invokes = compiled
        .state_machine
        .chain
        .all_states()
        .into_iter()
        .filter(|s| matches!(s.kind, StateKind::Invoke { .. }))
        .count();
    assert_eq!(invokes, 4);
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(ACCOUNT_MANIFEST.as_bytes()).expect("write");

    let manifest = PipelineManifest::load_from_file(file.path()).expect("load");
    assert_eq!(manifest.name(), "recommend");
    assert_eq!(
        manifest.dead_letter_queue(),
        Some(QueueRef::new("reply", "https://sqs/reply"))
    );
    let function_ids: Vec<_> = manifest.pipeline.functions.keys().cloned().collect();
    assert_eq!(function_ids, vec!["AtoU", "UtoCs", "CtoPs", "PtoS"]);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = PipelineManifest::load_from_file(&dir.path().join("absent.yaml")).unwrap_err();
    assert_eq!(err.category, ErrorCategory::IoError);
    assert_eq!(err.code, "PIPE-MAN-001");
}

#[test]
fn test_malformed_yaml_is_parse_error() {
    let err = PipelineManifest::from_yaml_str("version: [unclosed").unwrap_err();
    assert_eq!(err.category, ErrorCategory::SerializationError);
    assert_eq!(err.code, "PIPE-MAN-002");
}

#[test]
fn test_type_mismatch_on_join() {
    let text = ACCOUNT_MANIFEST.replace("input: User, output", "input: Customer, output");
    let manifest = PipelineManifest::from_yaml_str(&text).expect("manifest");
    let err = manifest.build().unwrap_err();
    assert_eq!(err.code, "PIPE-COMP-001");
    assert_eq!(err.category, ErrorCategory::CompositionError);
    assert!(err.message.contains("step 3: UtoCs expects Customer, got User"));
}

#[test]
fn test_type_mismatch_on_lift_element() {
    let text = ACCOUNT_MANIFEST.replace("input: Product", "input: Category");
    let manifest = PipelineManifest::from_yaml_str(&text).expect("manifest");
    let err = manifest.build().unwrap_err();
    assert_eq!(err.code, "PIPE-COMP-001");
    assert!(err.message.contains("PtoS expects Category, got Product"));
}

#[test]
fn test_step_after_sink() {
    let text = ACCOUNT_MANIFEST.replace(
        "    - to_queue: reply\n",
        "    - to_queue: reply\n    - join: AtoU\n",
    );
    let err = PipelineManifest::from_yaml_str(&text).unwrap_err();
    assert_eq!(err.code, "PIPE-MAN-006");
    assert!(err.message.contains("step 7: join after the terminal sink"));
}

#[test]
fn test_missing_sink() {
    let text = ACCOUNT_MANIFEST.replace("    - to_queue: reply\n", "");
    let err = PipelineManifest::from_yaml_str(&text).unwrap_err();
    assert_eq!(err.code, "PIPE-COMP-003");
}

#[test]
fn test_from_must_come_first() {
    let text = ACCOUNT_MANIFEST.replace(
        "    - from: { bus: input, type: Account }\n    - join: AtoU\n",
        "    - join: AtoU\n    - from: { bus: input, type: Account }\n",
    );
    let err = PipelineManifest::from_yaml_str(&text).unwrap_err();
    assert_eq!(err.code, "PIPE-MAN-006");
    assert!(err.message.contains("must start with from, found join"));
}

#[test]
fn test_unknown_dead_letter_queue() {
    let text = ACCOUNT_MANIFEST.replace("dead_letter_queue: reply", "dead_letter_queue: dlq");
    let err = PipelineManifest::from_yaml_str(&text).unwrap_err();
    assert_eq!(err.code, "PIPE-MAN-005");
    assert!(err.message.contains("'dlq'"));
}

#[test]
fn test_empty_name_and_steps() {
    let text = ACCOUNT_MANIFEST.replace("name: recommend", "name: \"  \"");
    let err = PipelineManifest::from_yaml_str(&text).unwrap_err();
    assert_eq!(err.code, "PIPE-MAN-004");

    let err = PipelineManifest::from_yaml_str(
        "version: \"1.0\"\npipeline:\n  name: empty\n  steps: []\n",
    )
    .unwrap_err();
    assert_eq!(err.code, "PIPE-MAN-004");
    assert!(err.message.contains("at least one step"));
}

#[test]
fn test_unit_outside_fan_out() {
    let text = ACCOUNT_MANIFEST.replace("    - join: UtoCs\n", "    - unit\n    - join: UtoCs\n");
    let manifest = PipelineManifest::from_yaml_str(&text).expect("manifest");
    let err = manifest.build().unwrap_err();
    assert_eq!(err.code, "PIPE-COMP-002");
}

#[test]
fn test_wrap_and_event_bus_sink() {
    let text = r#"
version: "1.0"
pipeline:
  name: fan
  event_buses:
    input: { uri: "arn:bus:input" }
    output: { uri: "arn:bus:output" }
  functions:
    OtoIs: { uri: "arn:fn:OtoIs", input: Order, output: "[Item]" }
    ItoP: { uri: "arn:fn:ItoP", input: Item, output: Price }
  steps:
    - from: { bus: input, type: Order, categories: [order.created] }
    - join: OtoIs
    - wrap
    - join: ItoP
    - unit
    - to_event_bus: { bus: output, source: shop.prices, categories: [price.computed] }
"#;
    let manifest = PipelineManifest::from_yaml_str(text).expect("manifest");
    let ast = manifest.build().expect("build");
    let kinds: Vec<_> = ast.nodes.iter().map(Node::kind).collect();
    assert_eq!(kinds, vec!["From", "Map", "Seq", "Yield"]);

    let compiled = Compiler::default().compile_ast(&ast).expect("compile");
    assert_eq!(compiled.rule.pattern.detail_type, vec!["order.created".to_string()]);
    match &compiled.state_machine.chain.states[2].kind {
        StateKind::SendToEventBus {
            source,
            detail_type,
            ..
        } => {
            assert_eq!(source, "shop.prices");
            assert_eq!(detail_type, "price.computed");
        }
        other => panic!("expected SendToEventBus, found {}", other.name()),
    }
}

#[test]
fn test_event_bus_sink_matches_typed_categories() {
    let text = r#"
version: "1.0"
pipeline:
  name: users
  event_buses:
    input: { uri: "arn:bus:input" }
  functions:
    AtoU: { uri: "arn:fn:AtoU", input: Account, output: User }
  steps:
    - from: { bus: input, type: Account }
    - join: AtoU
    - to_event_bus: { bus: input, source: shop.users, categories: [user.found, user.seen] }
"#;
    let manifest = PipelineManifest::from_yaml_str(text).expect("manifest");
    let bus = EventBusRef::new("input", "arn:bus:input");
    let get_user: Function<Account, User> = function("AtoU");
    let typed = to_event_bus(
        "shop.users",
        &bus,
        join(&get_user, from::<Account>(&bus, &[])),
        &["user.found", "user.seen"],
    );
    assert_eq!(manifest.build().expect("build"), typed.ast().expect("ast"));

    let without = text.replace(", categories: [user.found, user.seen]", "");
    let ast = PipelineManifest::from_yaml_str(&without)
        .expect("manifest")
        .build()
        .expect("build");
    let compiled = Compiler::default().compile_ast(&ast).expect("compile");
    match &compiled.state_machine.chain.states[1].kind {
        StateKind::SendToEventBus { detail_type, .. } => assert_eq!(detail_type, "User"),
        other => panic!("expected SendToEventBus, found {}", other.name()),
    }
}
