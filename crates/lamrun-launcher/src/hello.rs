//! The `example.Hello` demo unit.

use std::io::Read;
use std::io::Write;

use anyhow::Context as _;
use anyhow::anyhow;
use lamrun::Args;
use lamrun::FieldKind;
use lamrun::OverloadSignature;
use lamrun::ParameterKind;
use lamrun::RecordSchema;
use lamrun::Registry;
use lamrun::ReturnKind;
use lamrun::Returned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tracing::info;

pub const UNIT: &str = "example.Hello";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestClass {
    first_name: String,
    last_name: String,
}

#[derive(Debug, Serialize)]
struct ResponseClass {
    greetings: String,
    greetings2: String,
    greetings3: String,
}

impl ResponseClass {
    fn new(greetings: String) -> Self {
        Self {
            greetings,
            greetings2: "123".into(),
            greetings3: "123".into(),
        }
    }
}

fn log_context(args: &Args) {
    if let Some(ctx) = args.context() {
        info!(
            function = ctx.function_name(),
            request_id = ctx.request_id(),
            remaining_ms = ctx.remaining_time().as_millis() as u64,
            "handling request"
        );
    }
}

fn my_handler_int(args: &mut Args) -> anyhow::Result<Returned> {
    log_context(args);
    Ok(json!(args.int(0)?.to_string()).into())
}

fn my_handler_string(args: &mut Args) -> anyhow::Result<Returned> {
    log_context(args);
    Ok(json!(args.str(0)?).into())
}

fn my_handler_io(args: &mut Args) -> anyhow::Result<Returned> {
    let (input, output) = args.streams()?;
    let mut text = Vec::new();
    input.read_to_end(&mut text).context("reading request stream")?;
    output
        .write_all(&text.to_ascii_uppercase())
        .context("writing response stream")?;
    Ok(Returned::Void)
}

fn my_handler_pojo(args: &mut Args) -> anyhow::Result<Returned> {
    let request: RequestClass = args.typed(0)?;
    if request.first_name.is_empty() && request.last_name.is_empty() {
        return Err(anyhow!("request names nobody"));
    }
    let greetings = format!("Hello {}, {}.", request.first_name, request.last_name);
    Returned::json(&ResponseClass::new(greetings))
}

pub fn register(registry: &Registry) {
    use ParameterKind::Context;
    use ParameterKind::InputStream;
    use ParameterKind::OutputStream;

    let string = || ReturnKind::Value(ParameterKind::string());

    registry
        .unit(UNIT)
        .record(
            RecordSchema::new("RequestClass")
                .field("firstName", FieldKind::String)
                .field("lastName", FieldKind::String),
        )
        .record(
            RecordSchema::new("ResponseClass")
                .field("greetings", FieldKind::String)
                .field("greetings2", FieldKind::String)
                .field("greetings3", FieldKind::String),
        )
        .overload(
            "myHandlerInt",
            OverloadSignature::new(vec![ParameterKind::int(), Context], string()),
            my_handler_int,
        )
        .overload(
            "myHandlerString",
            OverloadSignature::new(vec![ParameterKind::string(), Context], string()),
            my_handler_string,
        )
        .overload(
            "myHandlerIO",
            OverloadSignature::void(vec![InputStream, OutputStream, Context]),
            my_handler_io,
        )
        .overload(
            "myHandlerPOJO",
            OverloadSignature::new(
                vec![ParameterKind::record("RequestClass"), Context],
                ReturnKind::Value(ParameterKind::record("ResponseClass")),
            ),
            my_handler_pojo,
        );
}
