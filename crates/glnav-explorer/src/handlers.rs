//! Built-in handlers.
//!
//! [`GenericHandler`] drives any operation from its parameter descriptors.
//! [`Protocol`] covers the selectors that deserve a tailored flow: fixed
//! prompt labels, a picker instead of a raw dump, or a short confirmation
//! instead of a result.

use async_trait::async_trait;
use glnav_core::{
    Args, Error, OperationDescriptor, Outcome, Param, ParamKind, Record, Result, Selector,
};
use serde_json::Value;
use tracing::debug;

use crate::dispatch::{Console, Handler, Invocation};
use crate::operator::Operator;

/// Default access level offered when approving an access request.
pub const DEFAULT_ACCESS_LEVEL: i64 = 30;

// ============================================================================
// Shared input helpers
// ============================================================================

/// Prompt for one value of `kind`.
///
/// Empty input takes `default` verbatim when there is one. Input that does
/// not parse is reported and the same value is asked again.
pub async fn ask(
    operator: &dyn Operator,
    label: &str,
    kind: ParamKind,
    default: Option<&Value>,
) -> Result<Value> {
    let suggestion = default.map(|v| kind.render(v));
    loop {
        let input = operator.prompt(label, suggestion.as_deref()).await?;
        if input.is_empty()
            && let Some(value) = default
        {
            return Ok(value.clone());
        }
        match kind.parse(&input) {
            Ok(value) => return Ok(value),
            Err(e @ Error::InvalidInput(_)) => operator.error(&e.to_string()),
            Err(e) => return Err(e),
        }
    }
}

/// Prompt for one declared parameter, labelled with its name.
pub async fn ask_param(operator: &dyn Operator, param: &Param) -> Result<Value> {
    ask(operator, &param.name, param.kind, param.default.as_ref()).await
}

/// Prompt once for every declared parameter, in order.
pub async fn collect_arguments(
    operation: &OperationDescriptor,
    operator: &dyn Operator,
) -> Result<Args> {
    let mut args = Args::new();
    for param in &operation.params {
        let value = ask_param(operator, param).await?;
        args.insert(param.name.clone(), value);
    }
    Ok(args)
}

/// Show what an invocation produced.
pub fn report(outcome: Outcome, operator: &dyn Operator) -> Result<()> {
    match outcome {
        Outcome::Done => operator.success("Done."),
        Outcome::Value(value) => operator.show_value(&value),
        Outcome::Records(records) => {
            operator.show_value(&Value::Array(records.iter().map(Record::to_value).collect()))
        }
        Outcome::Bytes(bytes) => operator.write_bytes(&bytes)?,
    }
    Ok(())
}

// ============================================================================
// GenericHandler
// ============================================================================

/// Fallback handler driven purely by parameter descriptors.
#[derive(Clone, Copy, Debug, Default)]
pub struct GenericHandler;

#[async_trait]
impl Handler for GenericHandler {
    async fn handle(&self, call: &Invocation<'_>, console: &Console) -> Result<()> {
        let operator = console.operator();
        let args = collect_arguments(&call.operation, operator).await?;
        let outcome = call.target.invoke(call.selector(), args).await?;
        report(outcome, operator)
    }
}

// ============================================================================
// Named protocols
// ============================================================================

/// Tailored input/output flow for a well-known selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    /// Fetch all items, pick one, show its attributes.
    Pick,
    /// Ask for an ID when the operation takes one, show the result.
    Lookup,
    /// Single JSON payload, plus an ID when the operation takes one.
    Payload,
    /// Ask for the ID to delete when the operation takes one.
    Remove,
    /// No arguments; report the given message.
    Confirm(&'static str),
    /// Key then value.
    KeyValue,
    /// Numeric access level.
    Approve,
    /// Write the raw bytes out.
    Stream,
    /// Generic parameter collection, result shown unless empty.
    Collect,
    /// Report only how many records came back.
    Count,
    /// Link URL then image URL.
    Render,
}

impl Protocol {
    /// The built-in selector → protocol table.
    pub fn standard_set() -> Vec<(Selector, Protocol)> {
        vec![
            (Selector::LIST, Protocol::Pick),
            (Selector::GET, Protocol::Lookup),
            (Selector::CREATE, Protocol::Payload),
            (Selector::UPDATE, Protocol::Payload),
            (Selector::DELETE, Protocol::Remove),
            (Selector::REFRESH, Protocol::Confirm("Refreshed.")),
            (Selector::SAVE, Protocol::Confirm("Saved changes.")),
            (Selector::SUBSCRIBE, Protocol::Confirm("Subscribe done.")),
            (Selector::UNSUBSCRIBE, Protocol::Confirm("Unsubscribe done.")),
            (Selector::TODO, Protocol::Confirm("Todo done.")),
            (Selector::SET, Protocol::KeyValue),
            (Selector::APPROVE, Protocol::Approve),
            (Selector::DOWNLOAD, Protocol::Stream),
            (Selector::TIME_STATS, Protocol::Collect),
            (Selector::TIME_ESTIMATE, Protocol::Collect),
            (Selector::RESET_TIME_ESTIMATE, Protocol::Collect),
            (Selector::ADD_SPENT_TIME, Protocol::Collect),
            (Selector::RESET_SPENT_TIME, Protocol::Collect),
            (Selector::PARTICIPANTS, Protocol::Count),
            (Selector::RENDER, Protocol::Render),
        ]
    }
}

/// Name of the `index`-th declared parameter, or `fallback`.
fn param_name(op: &OperationDescriptor, index: usize, fallback: &str) -> String {
    op.params
        .get(index)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| fallback.to_string())
}

async fn ask_id(operator: &dyn Operator, op: &OperationDescriptor, label: &str, args: &mut Args) -> Result<()> {
    if let Some(param) = op.param("id") {
        let id = ask(operator, label, ParamKind::Text, param.default.as_ref()).await?;
        args.insert("id", id);
    }
    Ok(())
}

#[async_trait]
impl Handler for Protocol {
    async fn handle(&self, call: &Invocation<'_>, console: &Console) -> Result<()> {
        let operator = console.operator();
        let op = &call.operation;
        let selector = call.selector();

        match *self {
            Protocol::Pick => {
                let records = call.target.invoke(selector, Args::new()).await?.into_records()?;
                if records.is_empty() {
                    operator.info("No items.");
                    return Ok(());
                }
                let lines: Vec<String> = records.iter().map(Record::menu_line).collect();
                match console.menu().select(&lines, "Select an item").await? {
                    Some(index) => operator.show_value(&records[index].to_value()),
                    None => debug!("list selection cancelled"),
                }
                Ok(())
            }

            Protocol::Lookup => {
                let mut args = Args::new();
                ask_id(operator, op, "Enter ID", &mut args).await?;
                let outcome = call.target.invoke(selector, args).await?;
                report(outcome, operator)
            }

            Protocol::Payload => {
                let Some(payload) = op.params.iter().find(|p| p.kind == ParamKind::Json) else {
                    let args = collect_arguments(op, operator).await?;
                    let outcome = call.target.invoke(selector, args).await?;
                    return report(outcome, operator);
                };
                let mut args = Args::new();
                ask_id(operator, op, "Enter ID", &mut args).await?;
                let label = format!("Enter data for {selector} (as JSON)");
                let data = ask(operator, &label, ParamKind::Json, payload.default.as_ref()).await?;
                args.insert(payload.name.clone(), data);
                let outcome = call.target.invoke(selector, args).await?;
                report(outcome, operator)
            }

            Protocol::Remove => {
                let mut args = Args::new();
                ask_id(operator, op, "Enter ID to delete", &mut args).await?;
                call.target.invoke(selector, args).await?;
                operator.success("Deleted.");
                Ok(())
            }

            Protocol::Confirm(message) => {
                call.target.invoke(selector, Args::new()).await?;
                operator.success(message);
                Ok(())
            }

            Protocol::KeyValue => {
                let key = ask(operator, "Enter key", ParamKind::Text, None).await?;
                let value = ask(operator, "Enter value", ParamKind::Text, None).await?;
                let args = Args::new()
                    .with(param_name(op, 0, "key"), key)
                    .with(param_name(op, 1, "value"), value);
                let outcome = call.target.invoke(selector, args).await?;
                report(outcome, operator)
            }

            Protocol::Approve => {
                let name = param_name(op, 0, "access_level");
                let default = op
                    .param(&name)
                    .and_then(|p| p.default.clone())
                    .unwrap_or(Value::from(DEFAULT_ACCESS_LEVEL));
                let level = ask(operator, "Enter access level", ParamKind::Integer, Some(&default)).await?;
                call.target.invoke(selector, Args::new().with(name, level)).await?;
                operator.success("Approved.");
                Ok(())
            }

            Protocol::Stream => {
                let args = collect_arguments(op, operator).await?;
                let outcome = call.target.invoke(selector, args).await?;
                report(outcome, operator)
            }

            Protocol::Collect => {
                let args = collect_arguments(op, operator).await?;
                match call.target.invoke(selector, args).await? {
                    Outcome::Done => {
                        operator.success("Done.");
                        Ok(())
                    }
                    outcome => report(outcome, operator),
                }
            }

            Protocol::Count => {
                let records = call.target.invoke(selector, Args::new()).await?.into_records()?;
                operator.info(&format!("{} participants", records.len()));
                Ok(())
            }

            Protocol::Render => {
                let link = ask(operator, "Enter link_url", ParamKind::Text, None).await?;
                let image = ask(operator, "Enter image_url", ParamKind::Text, None).await?;
                let args = Args::new()
                    .with(param_name(op, 0, "link_url"), link)
                    .with(param_name(op, 1, "image_url"), image);
                let outcome = call.target.invoke(selector, args).await?;
                report(outcome, operator)
            }
        }
    }
}
