use morphflow::core::error::AppError;
use morphflow::core::pipeline::ast::{AstFrom, AstMap, AstSeq, AstYield, Node, Sink};
use morphflow::core::pipeline::{
    from, join, lift, lift_p, to_event_bus, to_queue, unit, walk, wrap, Binding, Function,
    Visitor,
};
use morphflow::core::types::ErrorCategory;
use morphflow::core::{EventBusRef, FunctionRef, QueueRef};

struct Account;
struct User;
struct Category;
struct Product;
struct Mail;

fn function<A, B>(id: &str) -> Function<A, B> {
    Function::new(FunctionRef::new(id, format!("arn:fn:{}", id)))
}

fn bus() -> EventBusRef {
    EventBusRef::new("input", "arn:bus:input")
}

fn reply() -> QueueRef {
    QueueRef::new("reply", "https://sqs/reply")
}

fn recommend_ast() -> AstSeq {
    let get_user: Function<Account, User> = function("AtoU");
    let pick_category: Function<User, Vec<Category>> = function("UtoCs");
    let pick_product: Function<Category, Vec<Product>> = function("CtoPs");
    let mail_to: Function<Product, Mail> = function("PtoS");

    let a = from::<Account>(&bus(), &[]);
    let b = join(&get_user, a);
    let c = join(&pick_category, b);
    let d = lift(&pick_product, c);
    let e = lift(&mail_to, d);
    to_queue(&reply(), e).ast().expect("ast")
}

/// Records every hook invocation with its depth.
#[derive(Default)]
struct Trace {
    events: Vec<String>,
}

impl Trace {
    fn push(&mut self, event: String) -> Result<(), AppError> {
        self.events.push(event);
        Ok(())
    }
}

impl Visitor for Trace {
    fn on_enter_morphism(&mut self, depth: usize, _node: &AstSeq) -> Result<(), AppError> {
        self.push(format!("enter morphism {}", depth))
    }

    fn on_leave_morphism(&mut self, depth: usize, _node: &AstSeq) -> Result<(), AppError> {
        self.push(format!("leave morphism {}", depth))
    }

    fn on_enter_from(&mut self, depth: usize, node: &AstFrom) -> Result<(), AppError> {
        self.push(format!("enter from {} {}", node.type_name, depth))
    }

    fn on_leave_from(&mut self, depth: usize, _node: &AstFrom) -> Result<(), AppError> {
        self.push(format!("leave from {}", depth))
    }

    fn on_enter_map(&mut self, depth: usize, node: &AstMap) -> Result<(), AppError> {
        self.push(format!("enter map {} {}", node.binding.function.id, depth))
    }

    fn on_leave_map(&mut self, depth: usize, node: &AstMap) -> Result<(), AppError> {
        self.push(format!("leave map {} {}", node.binding.function.id, depth))
    }

    fn on_enter_seq(&mut self, depth: usize, _node: &AstSeq) -> Result<(), AppError> {
        self.push(format!("enter seq {}", depth))
    }

    fn on_leave_seq(&mut self, depth: usize, _node: &AstSeq) -> Result<(), AppError> {
        self.push(format!("leave seq {}", depth))
    }

    fn on_enter_yield(&mut self, depth: usize, node: &AstYield) -> Result<(), AppError> {
        self.push(format!("enter yield {} {}", node.type_name, depth))
    }
}

#[test]
fn test_lowered_shape_nests_fan_outs() {
    let ast = recommend_ast();
    let kinds: Vec<_> = ast.nodes.iter().map(Node::kind).collect();
    assert_eq!(kinds, vec!["From", "Map", "Map", "Seq", "Yield"]);

    let Node::Seq(outer) = &ast.nodes[3] else {
        panic!("expected Seq");
    };
    let inner_kinds: Vec<_> = outer.nodes.iter().map(Node::kind).collect();
    assert_eq!(inner_kinds, vec!["Map", "Seq"]);

    let Node::From(source) = &ast.nodes[0] else {
        panic!("expected From");
    };
    assert_eq!(source.type_name, "Account");
    assert!(source.categories.is_empty());

    let Node::Yield(sink) = &ast.nodes[4] else {
        panic!("expected Yield");
    };
    assert_eq!(sink.type_name, "Mail");
    assert_eq!(sink.sink, Sink::Queue(reply()));
}

#[test]
fn test_walk_visits_in_order() {
    let mut trace = Trace::default();
    walk(&recommend_ast(), &mut trace).expect("walk");
    assert_eq!(
        trace.events,
        vec![
            "enter morphism 0",
            "enter from Account 0",
            "leave from 0",
            "enter map AtoU 0",
            "leave map AtoU 0",
            "enter map UtoCs 0",
            "leave map UtoCs 0",
            "enter seq 0",
            "enter map CtoPs 1",
            "leave map CtoPs 1",
            "enter seq 1",
            "enter map PtoS 2",
            "leave map PtoS 2",
            "leave seq 1",
            "leave seq 0",
            "enter yield Mail 0",
            "leave morphism 0",
        ]
    );
}

#[test]
fn test_visitor_error_aborts_walk() {
    struct StopAtSeq(usize);

    impl Visitor for StopAtSeq {
        fn on_enter_map(&mut self, _depth: usize, _node: &AstMap) -> Result<(), AppError> {
            self.0 += 1;
            Ok(())
        }

        fn on_enter_seq(&mut self, _depth: usize, _node: &AstSeq) -> Result<(), AppError> {
            Err(AppError::new(ErrorCategory::ValidationError, "no fan-out allowed"))
        }
    }

    let mut visitor = StopAtSeq(0);
    let err = walk(&recommend_ast(), &mut visitor).unwrap_err();
    assert_eq!(err.message, "no fan-out allowed");
    assert_eq!(visitor.0, 2);
}

#[test]
fn test_nested_from_is_protocol_error() {
    let from_node = Node::From(AstFrom {
        source: bus(),
        categories: vec![],
        type_name: "Account".into(),
    });
    let ast = AstSeq {
        nodes: vec![
            from_node.clone(),
            Node::Seq(AstSeq {
                nodes: vec![from_node],
            }),
        ],
    };
    let err = walk(&ast, &mut Trace::default()).unwrap_err();
    assert_eq!(err.category, ErrorCategory::ProtocolError);
    assert_eq!(err.code, "PIPE-PROTO-001");
    assert_eq!(err.context.get("node"), Some(&"From".to_string()));
}

#[test]
fn test_yield_inside_fan_out_is_protocol_error() {
    let ast = AstSeq {
        nodes: vec![Node::Seq(AstSeq {
            nodes: vec![Node::Yield(AstYield {
                sink: Sink::Queue(reply()),
                type_name: "Mail".into(),
            })],
        })],
    };
    let err = walk(&ast, &mut Trace::default()).unwrap_err();
    assert_eq!(err.code, "PIPE-PROTO-001");
    assert!(err.message.contains("nesting level 1"));
}

#[test]
fn test_lift_p_records_concurrency() {
    let items: Function<Account, Vec<User>> = function("AtoUs");
    let each: Function<User, Mail> = function("UtoM");
    let ast = to_queue(&reply(), lift_p(5, &each, join(&items, from::<Account>(&bus(), &[]))))
        .ast()
        .expect("ast");
    let Node::Seq(seq) = &ast.nodes[2] else {
        panic!("expected Seq");
    };
    assert_eq!(
        seq.nodes[0],
        Node::Map(AstMap {
            binding: Binding::new(FunctionRef::new("UtoM", "arn:fn:UtoM")).with_concurrency(5),
        })
    );
}

#[test]
fn test_unit_closes_innermost_fan_out() {
    let items: Function<Account, Vec<User>> = function("AtoUs");
    let each: Function<User, Mail> = function("UtoM");
    let after: Function<Vec<Mail>, Mail> = function("MsToM");
    let ast = to_queue(
        &reply(),
        join(&after, unit(lift(&each, join(&items, from::<Account>(&bus(), &[]))))),
    )
    .ast()
    .expect("ast");
    let kinds: Vec<_> = ast.nodes.iter().map(Node::kind).collect();
    assert_eq!(kinds, vec!["From", "Map", "Seq", "Map", "Yield"]);
}

#[test]
fn test_wrap_without_function_yields_empty_seq() {
    let items: Function<Account, Vec<User>> = function("AtoUs");
    let ast = to_queue(&reply(), unit(wrap(join(&items, from::<Account>(&bus(), &[])))))
        .ast()
        .expect("ast");
    assert_eq!(ast.nodes[2], Node::Seq(AstSeq::default()));
}

#[test]
fn test_unit_outside_fan_out_fails() {
    let get_user: Function<Account, User> = function("AtoU");
    let err = to_queue(&reply(), unit(join(&get_user, from::<Account>(&bus(), &[]))))
        .ast()
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::CompositionError);
    assert_eq!(err.code, "PIPE-COMP-002");
}

#[test]
fn test_morphism_without_sink_cannot_lower() {
    let get_user: Function<Account, User> = function("AtoU");
    let err = join(&get_user, from::<Account>(&bus(), &[])).ast().unwrap_err();
    assert_eq!(err.code, "PIPE-COMP-003");
}

#[test]
fn test_shared_upstream_is_not_mutated() {
    let get_user: Function<Account, User> = function("AtoU");
    let base = join(&get_user, from::<Account>(&bus(), &["account.created"]));
    let to_reply = to_queue(&reply(), base.clone()).ast().expect("queue ast");
    let to_bus = to_event_bus("shop.users", &bus(), base, &[]).ast().expect("bus ast");

    assert_eq!(to_reply.nodes[..2], to_bus.nodes[..2]);
    let Node::Yield(sink) = &to_bus.nodes[2] else {
        panic!("expected Yield");
    };
    assert_eq!(sink.type_name, "User");
    assert_eq!(
        sink.sink,
        Sink::EventBus {
            bus: bus(),
            source: "shop.users".into(),
            categories: vec![],
        }
    );
}

#[test]
fn test_debug_shows_short_type_names() {
    let pick_category: Function<User, Vec<Category>> = function("UtoCs");
    let m = join(&pick_category, from::<User>(&bus(), &[]));
    let debug = format!("{:?}", m);
    assert!(debug.contains("\"User\""));
    assert!(debug.contains("\"Vec<Category>\""));
}
