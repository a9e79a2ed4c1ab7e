//! Integration tests for registration, ordering and value threading.

mod helpers;

use serde_json::json;

use hookhub_core::types::CallbackId;
use hookhub_plugin::{Callback, HasResult, HookEngine, Value};

use helpers::Journal;

fn id(name: &str) -> CallbackId {
    CallbackId::parse(name).expect("valid id")
}

#[test]
fn test_priority_then_insertion_order() {
    let engine = HookEngine::new();
    let journal = Journal::new();

    engine.add_callback("wp_head", journal.callback("late"), 20, 0);
    engine.add_callback("wp_head", journal.callback("first_at_ten"), 10, 0);
    engine.add_callback("wp_head", journal.callback("second_at_ten"), 10, 0);
    engine.add_callback("wp_head", journal.callback("early"), -5, 0);

    engine.fire_action("wp_head", &[]);

    assert_eq!(
        journal.entries(),
        ["early", "first_at_ten", "second_at_ten", "late"]
    );
}

#[test]
fn test_duplicate_registration_is_idempotent_per_priority() {
    let engine = HookEngine::new();
    let journal = Journal::new();

    engine.add_callback("save_post", journal.callback("notify"), 10, 0);
    engine.add_callback("save_post", journal.callback("notify"), 10, 0);
    engine.fire_action("save_post", &[]);
    assert_eq!(journal.entries(), ["notify"]);

    journal.clear();
    engine.add_callback("save_post", journal.callback("notify"), 20, 0);
    engine.fire_action("save_post", &[]);
    assert_eq!(journal.entries(), ["notify", "notify"]);

    assert_eq!(
        engine.has_callback("save_post", Some(&id("notify"))),
        HasResult::At(Some(10))
    );
}

#[test]
fn test_filter_threads_value_in_priority_order() {
    let inc = || {
        Callback::named("inc", |args| json!(args[0].as_i64().unwrap_or_default() + 1))
            .expect("valid id")
    };
    let double = || {
        Callback::named("double", |args| {
            json!(args[0].as_i64().unwrap_or_default() * 2)
        })
        .expect("valid id")
    };

    let engine = HookEngine::new();
    engine.add_callback("number", double(), 5, 1);
    engine.add_callback("number", inc(), 10, 1);
    assert_eq!(engine.fire_filter("number", json!(3), &[]), json!(7));

    let engine = HookEngine::new();
    engine.add_callback("number", inc(), 5, 1);
    engine.add_callback("number", double(), 10, 1);
    assert_eq!(engine.fire_filter("number", json!(3), &[]), json!(8));
}

#[test]
fn test_arity_truncates_arguments() {
    let engine = HookEngine::new();
    let journal = Journal::new();

    for arity in [0usize, 1, 2, 5] {
        let journal = journal.clone();
        engine.add_callback(
            "transition_post_status",
            Callback::closure(move |args| {
                journal.push(format!("{arity}:{}", args.len()));
                Value::Null
            }),
            10,
            arity,
        );
    }

    engine.fire_action(
        "transition_post_status",
        &[json!("publish"), json!("draft"), json!(42)],
    );

    assert_eq!(journal.entries(), ["0:0", "1:1", "2:2", "5:3"]);
}

#[test]
fn test_empty_hook_fast_path() {
    let engine = HookEngine::new();

    assert_eq!(
        engine.fire_filter("the_title", json!("Hello"), &[json!(1)]),
        json!("Hello")
    );
    engine.fire_action("the_title", &[]);

    assert_eq!(engine.times_fired("the_title"), 2);
    assert!(!engine.has_callback("the_title", None).is_registered());
    assert!(!engine.is_firing(None));
}

#[test]
fn test_wildcard_observes_every_fire_first() {
    let engine = HookEngine::new();
    let journal = Journal::new();

    let observer = journal.clone();
    engine.add_callback(
        "all",
        Callback::closure(move |args| {
            observer.push(format!("all{}", Value::Array(args.to_vec())));
            Value::Null
        }),
        10,
        0,
    );
    engine.add("save_post", journal.callback("save"));
    engine.add("the_title", Callback::closure(|args| args[0].clone()));

    engine.fire_action("save_post", &[json!(7)]);
    let title = engine.fire_filter("the_title", json!("x"), &[json!(2)]);

    assert_eq!(title, json!("x"));
    assert_eq!(
        journal.entries(),
        [
            r#"all["save_post",7]"#,
            "save",
            r#"all["the_title","x",2]"#,
        ]
    );
}

#[test]
fn test_wildcard_fired_directly_runs_once() {
    let engine = HookEngine::new();
    let journal = Journal::new();
    engine.add_callback("all", journal.callback("observer"), 10, 0);

    engine.fire_action("all", &[]);

    assert_eq!(journal.entries(), ["observer"]);
    assert_eq!(engine.times_fired("all"), 1);
}

#[test]
fn test_call_counts_are_monotonic() {
    let engine = HookEngine::new();
    engine.add("tick", Callback::closure(|_| Value::Null));

    let mut last = 0;
    for _ in 0..5 {
        engine.fire_action("tick", &[]);
        let now = engine.times_fired("tick");
        assert_eq!(now, last + 1);
        last = now;
    }
    engine.remove_all_callbacks("tick", None);
    engine.fire_action("tick", &[]);
    assert_eq!(engine.times_fired("tick"), 6);
    assert_eq!(engine.times_fired("never"), 0);
}

#[test]
fn test_has_and_remove_callback() {
    let engine = HookEngine::new();
    engine.add_callback("init", Callback::named("boot", |_| Value::Null).expect("id"), 15, 0);

    assert_eq!(engine.has_callback("init", None), HasResult::Any(true));
    assert_eq!(engine.has_callback("init", Some(&id("boot"))), HasResult::At(Some(15)));
    assert_eq!(engine.has_callback("init", Some(&id("other"))), HasResult::At(None));
    assert_eq!(engine.has_callback("unknown", None), HasResult::Any(false));

    assert!(!engine.remove_callback("init", &id("boot"), 10));
    assert!(engine.remove_callback("init", &id("boot"), 15));
    assert!(!engine.remove_callback("init", &id("boot"), 15));
    assert_eq!(engine.has_callback("init", None), HasResult::Any(false));
}

#[test]
fn test_remove_all_callbacks_by_priority() {
    let engine = HookEngine::new();
    let journal = Journal::new();
    engine.add_callback("wp_footer", journal.callback("a"), 5, 0);
    engine.add_callback("wp_footer", journal.callback("b"), 10, 0);
    engine.add_callback("wp_footer", journal.callback("c"), 10, 0);

    engine.remove_all_callbacks("wp_footer", Some(10));
    engine.fire_action("wp_footer", &[]);
    assert_eq!(journal.entries(), ["a"]);

    engine.remove_all_callbacks("wp_footer", None);
    assert!(!engine.has_callback("wp_footer", None).is_registered());
    engine.remove_all_callbacks("missing", None);
}

#[test]
fn test_method_identity_distinguishes_instances() {
    #[derive(Debug)]
    struct Widget;

    let first = std::sync::Arc::new(Widget);
    let second = std::sync::Arc::new(Widget);
    let engine = HookEngine::new();

    engine.add(
        "widgets_init",
        Callback::bound(&first, "register", |_, _| Value::Null).expect("id"),
    );
    engine.add(
        "widgets_init",
        Callback::bound(&second, "register", |_, _| Value::Null).expect("id"),
    );

    let first_id = CallbackId::method(&first, "register").expect("id");
    assert_eq!(
        engine.has_callback("widgets_init", Some(&first_id)),
        HasResult::At(Some(10))
    );
    assert!(engine.remove_callback("widgets_init", &first_id, 10));
    assert!(engine.has_callback("widgets_init", None).is_registered());
}

#[test]
fn test_method_identity_not_reused_after_instance_drop() {
    let engine = HookEngine::new();

    for round in 0..50u64 {
        let first = std::sync::Arc::new(round);
        engine.add(
            "the_content",
            Callback::new(
                CallbackId::method(&first, "render").expect("id"),
                |_| Value::Null,
            ),
        );
        drop(first);

        let second = std::sync::Arc::new(round + 100);
        let second_id = CallbackId::method(&second, "render").expect("id");
        assert_eq!(
            engine.has_callback("the_content", Some(&second_id)),
            HasResult::At(None),
            "round {round}"
        );
        assert!(!engine.remove_callback("the_content", &second_id, 10));
    }

    assert_eq!(engine.stats("the_content").expect("known").callbacks, 50);
}

#[test]
fn test_deprecated_fire_warns_only_when_used() {
    let engine = HookEngine::new();

    engine.fire_action_deprecated("old_action", &[], "2.0.0", Some("new_action"));
    assert_eq!(engine.times_fired("old_action"), 0);

    engine.add("old_filter", Callback::closure(|_| json!("patched")));
    let value =
        engine.fire_filter_deprecated("old_filter", json!("raw"), &[], "2.0.0", None);
    assert_eq!(value, json!("patched"));
    assert_eq!(engine.times_fired("old_filter"), 1);
}

#[test]
fn test_stats_report_registered_hooks() {
    let engine = HookEngine::new();
    engine.add("b_hook", Callback::closure(|_| Value::Null));
    engine.add("a_hook", Callback::closure(|_| Value::Null));
    engine.add("a_hook", Callback::closure(|_| Value::Null));
    engine.fire_action("a_hook", &[]);

    let stats = engine.all_stats();
    let names: Vec<&str> = stats.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["a_hook", "b_hook"]);

    let a = engine.stats("a_hook").expect("known hook");
    assert_eq!(a.callbacks, 2);
    assert_eq!(a.times_fired, 1);
    assert_eq!(a.firing_depth, 0);
    assert!(a.last_fired.is_some());
    assert!(engine.stats("b_hook").expect("known").last_fired.is_none());
}
