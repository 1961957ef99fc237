mod common;

use common::{init_logging, memory_output, test_registry};
use logchain::{object, Level, MemorySink, Output, OutputExt, Properties, PropertyRegistry, Selector};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_clean_object_forwards_messages() {
    init_logging();
    let registry = test_registry();
    let (sink, output) = memory_output(Properties::new(), &registry);

    output
        .info("Hello!", &[])
        .unwrap()
        .warn("It's a trap!", &[])
        .unwrap()
        .error("Oh no!", &[])
        .unwrap();

    assert_eq!(sink.messages_at(Level::Info), vec!["Hello!"]);
    assert_eq!(sink.messages_at(Level::Warn), vec!["It's a trap!"]);
    assert_eq!(sink.messages_at(Level::Error), vec!["Oh no!"]);
}

#[test]
fn test_property_chain_is_applied_latest_first() {
    let registry = test_registry();
    let (sink, output) = memory_output(
        Properties::new().with("custom", true).with("raw", "raw"),
        &registry,
    );

    output.info("Hello!", &[]).unwrap();
    assert_eq!(sink.last_message().unwrap(), "success/info/Hello!/raw");
}

#[test]
fn test_prop_and_unprop_chain() {
    let registry = test_registry();
    let (sink, output) = memory_output(Properties::new(), &registry);

    output
        .prop(Properties::new().with("custom", true))
        .unwrap()
        .unprop(["custom"])
        .info("plain", &[])
        .unwrap();
    assert_eq!(sink.last_message().unwrap(), "plain");

    output
        .prop(json!({ "raw": "r", "custom": 1 }))
        .unwrap()
        .unprop([Selector::filter(|_, value| value.is_number())])
        .warn("x", &[])
        .unwrap();
    assert_eq!(sink.last_message().unwrap(), "warn/x/r");
}

#[test]
fn test_formatting_uses_params() {
    let registry = test_registry();
    let (sink, output) = memory_output(Properties::new(), &registry);

    output
        .info("%s took %dms %j", &[json!("query"), json!(41.7), json!({"rows": 2})])
        .unwrap();
    assert_eq!(sink.last_message().unwrap(), "query took 41ms {\"rows\":2}");

    output.info("extra", &[json!(1), json!("two")]).unwrap();
    assert_eq!(sink.last_message().unwrap(), "extra 1 two");
}

#[test]
fn test_destroy_is_forwarded_unless_disabled() {
    let registry = test_registry();
    let (sink, output) = memory_output(Properties::new(), &registry);
    output.destroy().unwrap();
    assert_eq!(sink.destroy_count(), 1);

    let (sink, output) = memory_output(Properties::new().with("destroy", false), &registry);
    output.destroy().unwrap();
    assert_eq!(sink.destroy_count(), 0);
}

#[test]
fn test_sink_without_destroy_is_accepted() {
    struct Silent;
    impl logchain::Sink for Silent {
        fn info(&self, _: &str) -> logchain::LogResult<()> {
            Ok(())
        }
        fn warn(&self, _: &str) -> logchain::LogResult<()> {
            Ok(())
        }
        fn error(&self, _: &str) -> logchain::LogResult<()> {
            Ok(())
        }
    }

    let output = object(Arc::new(Silent), Properties::new()).unwrap();
    output.info("nothing", &[]).unwrap();
    output.destroy().unwrap();
}

#[test]
fn test_global_builtins_are_available() {
    let sink = Arc::new(MemorySink::new());
    let output = object(sink.clone(), Properties::new().with("level", true)).unwrap();
    output.error("boom", &[]).unwrap();
    assert_eq!(sink.last_message().unwrap(), "[error] boom");

    let global = PropertyRegistry::global();
    assert!(global.property_exists("level"));
    #[cfg(feature = "date")]
    assert!(global.property_exists("date"));
    #[cfg(feature = "color")]
    assert!(global.property_exists("color"));
}

#[cfg(feature = "color")]
#[test]
fn test_color_property_keeps_message_text() {
    let sink = Arc::new(MemorySink::new());
    let output = object(sink.clone(), Properties::new().with("color", true)).unwrap();
    output.warn("careful", &[]).unwrap();
    assert!(sink.last_message().unwrap().contains("careful"));
}

#[test]
fn test_registry_is_shared_between_outputs() {
    let registry = Arc::new(PropertyRegistry::new());
    registry.register("shout", |m, _, _| m.to_uppercase()).unwrap();
    let (first, a) = memory_output(Properties::new().with("shout", true), &registry);
    let (second, b) = memory_output(Properties::new().with("shout", true), &registry);

    registry.deregister(["shout"]).unwrap();
    a.info("quiet", &[]).unwrap();
    b.info("quiet", &[]).unwrap();

    assert_eq!(first.last_message().unwrap(), "quiet");
    assert_eq!(second.last_message().unwrap(), "quiet");
    assert!(a.properties().is_empty());
}
