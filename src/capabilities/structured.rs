//! Structured extraction: typed input in, typed output back.
//!
//! The input and output shapes travel as flattened field-type maps next to the
//! free-form instructions. The service answers with an `output` value that is
//! coerced onto the declared output shape.

use crate::capabilities::dispatch::Dispatcher;
use crate::capabilities::{Args, Invoke};
use crate::structured::{validate, CoercionError, OutputShape, SchemaType};
use crate::transport::Session;
use crate::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Clone)]
pub struct Structured {
    dispatcher: Dispatcher,
}

impl Structured {
    pub const NAME: &'static str = "multi/structured";
    pub const PATH: &'static str = "/structured";

    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Run `instructions` over `input`, returning a value of the declared
    /// output shape.
    pub fn call<I, O>(&self, output: &OutputShape<O>, instructions: &str, input: &I) -> Result<O>
    where
        I: Serialize + JsonSchema,
        O: DeserializeOwned,
    {
        let payload = typed_payload(output, instructions, input)?;
        let response = self.dispatcher.post(Self::NAME, Self::PATH, &payload)?;
        Ok(output.coerce(take_output(response)?)?)
    }

    pub async fn call_async<I, O>(
        &self,
        output: &OutputShape<O>,
        instructions: &str,
        input: &I,
        session: Option<&Session>,
    ) -> Result<O>
    where
        I: Serialize + JsonSchema,
        O: DeserializeOwned,
    {
        let payload = typed_payload(output, instructions, input)?;
        let response = self
            .dispatcher
            .post_async(Self::NAME, Self::PATH, &payload, session)
            .await?;
        Ok(output.coerce(take_output(response)?)?)
    }
}

fn typed_payload<I, O>(output: &OutputShape<O>, instructions: &str, input: &I) -> Result<Value>
where
    I: Serialize + JsonSchema,
    O: DeserializeOwned,
{
    let input_spec = SchemaType::of::<I>()?;
    let input = serde_json::to_value(input)?;
    Ok(payload(&input_spec, output.schema(), instructions, input))
}

fn payload(
    input_spec: &SchemaType,
    output_spec: &SchemaType,
    instructions: &str,
    input: Value,
) -> Value {
    debug!(input_spec = %input_spec, output_spec = %output_spec, "structured payload");
    json!({
        "input_spec": input_spec.flatten(),
        "output_spec": output_spec.flatten(),
        "instructions": instructions,
        "input": input,
    })
}

/// The `output` member of a structured response.
fn take_output(response: Value) -> std::result::Result<Value, CoercionError> {
    match response {
        Value::Object(mut map) => map
            .remove("output")
            .ok_or_else(|| CoercionError::single("$.output", "response has no output field")),
        _ => Err(CoercionError::single("$", "response is not a JSON object")),
    }
}

struct DynamicRequest {
    output_spec: SchemaType,
    payload: Value,
}

impl DynamicRequest {
    fn from_args(args: &Value) -> Result<Self> {
        let args = Args::new(Structured::NAME, args)?;
        let input_spec = SchemaType::from_flattened(args.value("input_spec")?)?;
        let output_spec = SchemaType::from_flattened(args.value("output_spec")?)?;
        let instructions = args.str("instructions")?;
        let input = args.value("input")?.clone();
        let payload = payload(&input_spec, &output_spec, instructions, input);
        Ok(Self {
            output_spec,
            payload,
        })
    }

    fn finish(&self, response: Value) -> Result<Value> {
        let output = take_output(response)?;
        validate(&self.output_spec, &output)?;
        Ok(output)
    }
}

/// Dynamic form: `input_spec` and `output_spec` are flattened field-type maps;
/// the result is the shape-validated `output` value.
#[async_trait]
impl Invoke for Structured {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn invoke(&self, args: &Value) -> Result<Value> {
        let request = DynamicRequest::from_args(args)?;
        let response = self
            .dispatcher
            .post(Self::NAME, Self::PATH, &request.payload)?;
        request.finish(response)
    }

    async fn invoke_async(&self, args: &Value, session: Option<&Session>) -> Result<Value> {
        let request = DynamicRequest::from_args(args)?;
        let response = self
            .dispatcher
            .post_async(Self::NAME, Self::PATH, &request.payload, session)
            .await?;
        request.finish(response)
    }
}
