use std::io::Read;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use anyhow::bail;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use lamrun::Args;
use lamrun::Context;
use lamrun::ContextConfig;
use lamrun::Engine;
use lamrun::EnvContextProvider;
use lamrun::ErrorKind;
use lamrun::FieldKind;
use lamrun::OverloadSignature;
use lamrun::ParameterKind;
use lamrun::RecordSchema;
use lamrun::Registry;
use lamrun::ReturnKind;
use lamrun::Returned;
use lamrun::invoke::Fault;

const UNIT: &str = "lambdatest.Hello";

fn engine(registry: Registry) -> Engine {
    Engine::builder()
        .registry(Arc::new(registry))
        .context_provider(|| Context::builder().function_name("test-context").build())
        .build()
}

fn handler(method: &str) -> String {
    format!("{}::{}", UNIT, method)
}

fn body(outcome: &lamrun::Outcome) -> Value {
    serde_json::from_slice(outcome.body().unwrap_or(&b"null"[..])).unwrap()
}

// --- Test 1: Scalars ---

#[test]
fn test_int_payload() -> anyhow::Result<()> {
    let registry = Registry::new();
    registry.unit(UNIT).overload(
        "inc",
        OverloadSignature::new(vec![ParameterKind::int()], ReturnKind::Value(ParameterKind::int())),
        |args: &mut Args| -> anyhow::Result<Returned> { Ok(json!(args.int(0)? + 1).into()) },
    );
    let engine = engine(registry);

    let out = engine.invoke(&handler("inc"), "123")?;
    assert_eq!(body(&out), json!(124));

    let err = engine.invoke(&handler("inc"), "abc").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    Ok(())
}

#[test]
fn test_bool_payload() -> anyhow::Result<()> {
    let registry = Registry::new();
    registry.unit(UNIT).overload(
        "not",
        OverloadSignature::new(vec![ParameterKind::bool()], ReturnKind::Value(ParameterKind::bool())),
        |args: &mut Args| -> anyhow::Result<Returned> { Ok(json!(!args.bool(0)?).into()) },
    );
    let engine = engine(registry);

    assert_eq!(body(&engine.invoke(&handler("not"), "true")?), json!(false));
    assert_eq!(body(&engine.invoke(&handler("not"), "false")?), json!(true));
    assert_eq!(engine.invoke(&handler("not"), "yes").unwrap_err().kind(), ErrorKind::TypeMismatch);
    Ok(())
}

// --- Test 2: Streams ---

#[test]
fn test_stream_uppercase() -> anyhow::Result<()> {
    let registry = Registry::new();
    registry.unit(UNIT).overload(
        "upper",
        OverloadSignature::void(vec![ParameterKind::InputStream, ParameterKind::OutputStream, ParameterKind::Context]),
        |args: &mut Args| -> anyhow::Result<Returned> {
            assert!(args.context().is_some());
            let (input, output) = args.streams()?;
            let mut text = String::new();
            input.read_to_string(&mut text)?;
            output.write_all(text.to_uppercase().as_bytes())?;
            Ok(Returned::Void)
        },
    );

    let out = engine(registry).invoke(&handler("upper"), "hello")?;
    assert_eq!(out.body(), Some(&b"HELLO"[..]));
    Ok(())
}

// --- Test 3: Records ---

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Atom {
    symbol: String,
    atomic_number: i64,
    found_on_earth: bool,
    isotopes: Vec<i64>,
}

fn atom_registry() -> Registry {
    let registry = Registry::new();
    registry
        .unit(UNIT)
        .record(
            RecordSchema::new("Atom")
                .field("symbol", FieldKind::String)
                .field("atomicNumber", FieldKind::Int)
                .field("foundOnEarth", FieldKind::Bool)
                .field("isotopes", FieldKind::List),
        )
        .overload(
            "echo",
            OverloadSignature::new(vec![ParameterKind::record("Atom")], ReturnKind::Value(ParameterKind::record("Atom"))),
            |args: &mut Args| -> anyhow::Result<Returned> {
                let atom: Atom = args.typed(0)?;
                Returned::json(&atom)
            },
        );
    registry
}

#[test]
fn test_record_round_trip() -> anyhow::Result<()> {
    let engine = engine(atom_registry());
    let atom = Atom {
        symbol: "He".into(),
        atomic_number: 2,
        found_on_earth: true,
        isotopes: vec![3, 4],
    };

    let first = engine.invoke(&handler("echo"), serde_json::to_string(&atom)?)?;
    let decoded: Atom = serde_json::from_slice(first.body().unwrap_or_default())?;
    assert_eq!(decoded, atom);

    let second = engine.invoke(&handler("echo"), first.body().unwrap_or_default())?;
    assert_eq!(second, first);
    Ok(())
}

#[test]
fn test_record_absent_fields_are_zeroed() -> anyhow::Result<()> {
    let out = engine(atom_registry()).invoke(&handler("echo"), r#"{"symbol": "Og", "extra": 1}"#)?;
    assert_eq!(
        body(&out),
        json!({"symbol": "Og", "atomicNumber": 0, "foundOnEarth": false, "isotopes": []})
    );
    Ok(())
}

#[test]
fn test_record_wrong_field_type() {
    let err = engine(atom_registry())
        .invoke(&handler("echo"), r#"{"symbol": 2}"#)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert!(err.to_string().contains("$0.symbol"));
}

// --- Test 4: Two value positions ---

#[test]
fn test_two_positions_from_array() -> anyhow::Result<()> {
    let registry = Registry::new();
    registry.unit(UNIT).overload(
        "repeat",
        OverloadSignature::new(
            vec![ParameterKind::string(), ParameterKind::int(), ParameterKind::Context],
            ReturnKind::Value(ParameterKind::string()),
        ),
        |args: &mut Args| -> anyhow::Result<Returned> {
            let count = usize::try_from(args.int(1)?)?;
            Ok(json!(args.str(0)?.repeat(count)).into())
        },
    );
    let engine = engine(registry);

    assert_eq!(body(&engine.invoke(&handler("repeat"), r#"["ab", 3]"#)?), json!("ababab"));
    let err = engine.invoke(&handler("repeat"), r#"["ab"]"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    Ok(())
}

// --- Test 5: Faults ---

#[test]
fn test_handler_error_is_user_code() {
    let registry = Registry::new();
    let id = registry.register(UNIT, "fail", OverloadSignature::void(vec![]), |_: &mut Args| -> anyhow::Result<Returned> {
        bail!("no such element")
    });

    let err = engine(registry).invoke(&handler("fail"), "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UserCode);
    assert!(!err.is_rejection());
    match err {
        lamrun::Error::UserCode(e) => {
            assert_eq!(e.id, id);
            assert!(matches!(e.fault, Fault::Failed(_)));
            assert!(e.to_string().contains("no such element"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_handler_panic_is_user_code() {
    let registry = Registry::new();
    registry.register(UNIT, "divide", OverloadSignature::void(vec![ParameterKind::int()]), |args: &mut Args| -> anyhow::Result<Returned> {
        let divisor = args.int(0)?;
        Ok(json!(10 / divisor).into())
    });

    let err = engine(registry).invoke(&handler("divide"), "0").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UserCode);
    assert!(matches!(err, lamrun::Error::UserCode(ref e) if matches!(e.fault, Fault::Panicked(_))));
}

#[test]
fn test_context_not_last_never_runs() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    let registry = Registry::new();
    registry.register(
        UNIT,
        "bad",
        OverloadSignature::void(vec![ParameterKind::Context, ParameterKind::int()]),
        |_: &mut Args| -> anyhow::Result<Returned> {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(Returned::Void)
        },
    );

    let err = engine(registry).invoke(&handler("bad"), "1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidShape);
    assert!(err.is_rejection());
    assert_eq!(CALLS.load(Ordering::SeqCst), 0);
}

// --- Test 6: Context ---

#[test]
fn test_context_fields() -> anyhow::Result<()> {
    let registry = Registry::new();
    registry.register(UNIT, "myHandler", OverloadSignature::void(vec![ParameterKind::Context]), |args: &mut Args| -> anyhow::Result<Returned> {
        let Some(ctx) = args.context() else {
            bail!("no context injected");
        };
        assert!(ctx.function_name().contains("context"));
        assert_eq!(ctx.function_version(), "$LATEST");
        assert!(!ctx.request_id().is_empty());
        assert!(ctx.memory_limit_mb() > 0);
        let before = ctx.remaining_time();
        assert!(ctx.remaining_time() <= before);
        Ok(Returned::Void)
    });

    assert_eq!(engine(registry).invoke(&handler("myHandler"), "")?, lamrun::Outcome::Void);
    Ok(())
}

#[test]
fn test_oversized_timeout_still_invokes() -> anyhow::Result<()> {
    let config = ContextConfig::from_lookup(|key| match key {
        "TASK_TIMEOUT" => Some("18446744073709551615".to_string()),
        _ => None,
    });

    let registry = Registry::new();
    registry.register(UNIT, "myHandler", OverloadSignature::void(vec![ParameterKind::Context]), |args: &mut Args| -> anyhow::Result<Returned> {
        assert!(args.context().is_some());
        Ok(Returned::Void)
    });
    let engine = Engine::builder()
        .registry(Arc::new(registry))
        .context_provider(EnvContextProvider::new(config))
        .build();

    assert_eq!(engine.invoke(&handler("myHandler"), "")?, lamrun::Outcome::Void);
    Ok(())
}

#[test]
fn test_return_of_wrong_type_is_classified() {
    let registry = Registry::new();
    registry.unit(UNIT).overload(
        "count",
        OverloadSignature::new(vec![], ReturnKind::Value(ParameterKind::int())),
        |_: &mut Args| -> anyhow::Result<Returned> { Ok(json!("seven").into()) },
    );

    let err = engine(registry).invoke(&handler("count"), "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReturnType);
    assert!(!err.is_rejection());
}
