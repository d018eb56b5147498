//! `prompt` (§4.5, §6, §10.4): sends its arguments, space-joined, to an LLM
//! chat-completions endpoint and returns the reply text.

use async_trait::async_trait;

use crate::control_flow::RunError;
use crate::primitive::{ExecContext, Primitive};
use crate::prompt_client::{PromptClient, PromptConfig};
use crate::value::Value;

pub struct PromptPrimitive;

#[async_trait]
impl Primitive for PromptPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/prompt"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        if args.is_empty() {
            return Err(RunError::MissingArgument {
                opcode: self.canonical_path().to_string(),
                expected: "at least 1 argument".to_string(),
            });
        }
        let message = args.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ");
        let config = PromptConfig::from_env()?;
        let client = PromptClient::new(config);
        let reply = client.complete(&message).await?;
        Ok(Value::string(reply))
    }
}

pub fn register(registry: &mut crate::registry::Registry) {
    use std::sync::Arc;
    registry.register(Arc::new(PromptPrimitive));
}
