use insta::assert_snapshot;
use morphflow::core::pipeline::{from, join, lift_p, to_queue, Function};
use morphflow::core::state_machine::definition::render;
use morphflow::core::state_machine::{CompiledPipeline, Compiler, CompilerOptions};
use morphflow::core::{EventBusRef, FunctionRef, QueueRef};
use serde_json::{Map, Value};

struct Order;
struct Item;
struct Price;

fn compile_prices() -> CompiledPipeline {
    let orders = EventBusRef::new("orders", "arn:bus:orders");
    let prices = QueueRef::new("prices", "https://sqs/prices");
    let dlq = QueueRef::new("dlq", "https://sqs/dlq");
    let items: Function<Order, Vec<Item>> = Function::new(FunctionRef::new("OtoIs", "arn:fn:OtoIs"));
    let price: Function<Item, Price> = Function::new(FunctionRef::new("ItoP", "arn:fn:ItoP"));

    let pipeline = to_queue(
        &prices,
        lift_p(4, &price, join(&items, from::<Order>(&orders, &[]))),
    );
    Compiler::new(CompilerOptions::default().with_dead_letter_queue(dlq))
        .compile(&pipeline)
        .expect("compile")
}

/// Rebuild every object with sorted keys so the rendering does not depend
/// on the map implementation backing `serde_json::Value`.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&map[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(&sorted(value)).expect("render json")
}

#[test]
fn test_document_rendering_is_stable() {
    let document = compile_prices().to_document();
    assert_snapshot!(pretty(&document), @r#"
    {
      "Rule": {
        "EventBusName": "arn:bus:orders",
        "EventPattern": {
          "detail-type": [
            "Order"
          ]
        },
        "Name": "Rule",
        "Targets": [
          {
            "Id": "Target0",
            "StateMachine": "StateMachine"
          }
        ]
      },
      "StateMachine": {
        "Definition": {
          "StartAt": "MapOtoIs",
          "States": {
            "ErrOtoIs": {
              "Type": "Fail"
            },
            "MapOtoIs": {
              "Catch": [
                {
                  "ErrorEquals": [
                    "States.ALL"
                  ],
                  "Next": "TryOtoIs",
                  "ResultPath": "$.error"
                }
              ],
              "InputPath": "$.detail",
              "Next": "Seq271deffb",
              "Parameters": {
                "FunctionName": "arn:fn:OtoIs",
                "Payload.$": "$"
              },
              "Resource": "arn:aws:states:::lambda:invoke",
              "Type": "Task"
            },
            "Seq271deffb": {
              "ItemProcessor": {
                "ProcessorConfig": {
                  "Mode": "INLINE"
                },
                "StartAt": "MapItoP",
                "States": {
                  "ErrItoP": {
                    "Type": "Fail"
                  },
                  "MapItoP": {
                    "Catch": [
                      {
                        "ErrorEquals": [
                          "States.ALL"
                        ],
                        "Next": "TryItoP",
                        "ResultPath": "$.error"
                      }
                    ],
                    "End": true,
                    "InputPath": "$",
                    "Parameters": {
                      "FunctionName": "arn:fn:ItoP",
                      "Payload.$": "$"
                    },
                    "Resource": "arn:aws:states:::lambda:invoke",
                    "Type": "Task"
                  },
                  "TryItoP": {
                    "Next": "ErrItoP",
                    "Parameters": {
                      "MessageBody.$": "$",
                      "QueueUrl": "https://sqs/dlq"
                    },
                    "Resource": "arn:aws:states:::sqs:sendMessage",
                    "Type": "Task"
                  }
                }
              },
              "ItemsPath": "$.Payload",
              "MaxConcurrency": 4,
              "Next": "Sink",
              "Type": "Map"
            },
            "Sink": {
              "End": true,
              "Parameters": {
                "MessageBody.$": "$.Payload",
                "QueueUrl": "https://sqs/prices"
              },
              "Resource": "arn:aws:states:::sqs:sendMessage",
              "Type": "Task"
            },
            "TryOtoIs": {
              "Next": "ErrOtoIs",
              "Parameters": {
                "MessageBody.$": "$",
                "QueueUrl": "https://sqs/dlq"
              },
              "Resource": "arn:aws:states:::sqs:sendMessage",
              "Type": "Task"
            }
          }
        },
        "Name": "StateMachine"
      }
    }
    "#);
}

#[test]
fn test_render_matches_document_definition() {
    let compiled = compile_prices();
    let document = compiled.to_document();
    assert_eq!(
        document["StateMachine"]["Definition"],
        render(&compiled.state_machine)
    );
}

#[test]
fn test_event_bus_sink_rendering() {
    let bus = EventBusRef::new("mail", "arn:bus:mail");
    let items: Function<Order, Item> = Function::new(FunctionRef::new("OtoI", "arn:fn:OtoI"));
    let pipeline = morphflow::core::pipeline::to_event_bus(
        "shop.orders",
        &bus,
        join(&items, from::<Order>(&bus, &["order.created"])),
        &[],
    );
    let compiled = Compiler::default().compile(&pipeline).expect("compile");
    let definition = render(&compiled.state_machine);

    let sink = &definition["States"]["Sink"];
    assert_eq!(sink["Resource"], "arn:aws:states:::events:putEvents");
    let entry = &sink["Parameters"]["Entries"][0];
    assert_eq!(entry["Detail.$"], "$.Payload");
    assert_eq!(entry["DetailType"], "Item");
    assert_eq!(entry["Source"], "shop.orders");
    assert_eq!(entry["EventBusName"], "arn:bus:mail");
    assert_eq!(sink["End"], true);

    let document = compiled.to_document();
    assert_eq!(
        document["Rule"]["EventPattern"]["detail-type"],
        serde_json::json!(["order.created"])
    );
    assert!(definition["States"]["MapOtoI"].get("Catch").is_none());
}
