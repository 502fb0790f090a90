//! Runner evaluating literal cells.
//!
//! Each export's JSON value is the cell's result for that name, except:
//! - a string `"$name"` echoes the input `name`
//! - an object `{"$throw": message}` makes the cell throw `message`

use ignition_core::engine::{Bindings, CellRunner, RunRequest};
use ignition_core::graph::EdgeName;
use serde_json::Value;

use crate::notebook_file::LiteralCode;

#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralRunner;

impl LiteralRunner {
    fn evaluate(value: &Value, inputs: &Bindings<Value>) -> Result<Value, String> {
        match value {
            Value::String(text) => match text.strip_prefix('$') {
                Some(name) => inputs
                    .get(name)
                    .cloned()
                    .ok_or_else(|| format!("{} is not defined", name)),
                None => Ok(value.clone()),
            },
            Value::Object(fields) => match fields.get("$throw") {
                Some(Value::String(message)) => Err(message.clone()),
                Some(other) => Err(other.to_string()),
                None => Ok(value.clone()),
            },
            _ => Ok(value.clone()),
        }
    }
}

impl CellRunner for LiteralRunner {
    type Code = LiteralCode;
    type Value = Value;

    fn run(
        &self,
        request: RunRequest<LiteralCode, Value>,
    ) -> impl Future<Output = Result<Bindings<Value>, String>> + Send {
        if request.abort.is_aborted() {
            return std::future::ready(Err(format!("{} was aborted", request.id)));
        }

        let result = request
            .code
            .exports
            .iter()
            .map(|(name, value)| {
                let value = Self::evaluate(value, &request.inputs)?;
                Ok((name.clone(), value))
            })
            .collect::<Result<Bindings<Value>, String>>();
        std::future::ready(result)
    }
}
