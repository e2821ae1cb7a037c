//! Tool dispatch: the closed set of tools a plan may reference, and the
//! mapping from each tool to its adapter server, operation, and parameter
//! shape.

pub mod gateway;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

pub use gateway::{AdapterRegistry, EchoGateway, ServerAdapter, ToolGateway};

/// The closed set of tools a plan may invoke.
///
/// Plans carry tool names as free-form strings; normalization parses them
/// into this enum. A name that does not parse marks its step for immediate
/// failure at execution start, before any adapter call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Search,
    EmailSend,
    PaymentRegister,
    ContactSave,
    Chat,
}

/// Where a tool's invocations are routed and how its parameters are
/// reshaped for the adapter.
#[derive(Debug, Clone, Copy)]
pub struct ToolBinding {
    pub server: &'static str,
    pub operation: &'static str,
    /// Plan-level field name -> adapter-level field name.
    renames: &'static [(&'static str, &'static str)],
}

impl ToolKind {
    /// Dispatch-table entry for this tool.
    ///
    /// Adding a tool means adding a variant plus one arm here, and an
    /// adapter on the named server. The match is exhaustive on purpose.
    #[must_use]
    pub fn binding(self) -> ToolBinding {
        match self {
            Self::Search => ToolBinding {
                server: "catalog",
                operation: "product_search",
                renames: &[("query", "keyword")],
            },
            Self::EmailSend => ToolBinding {
                server: "mailer",
                operation: "send_email",
                renames: &[("recipientEmail", "to"), ("body", "text")],
            },
            Self::PaymentRegister => ToolBinding {
                server: "billing",
                operation: "register_payment",
                renames: &[("customerId", "customer_id")],
            },
            Self::ContactSave => ToolBinding {
                server: "directory",
                operation: "upsert_contact",
                renames: &[],
            },
            Self::Chat => ToolBinding {
                server: "assistant",
                operation: "chat_reply",
                renames: &[],
            },
        }
    }
}

impl ToolBinding {
    /// Reshape plan-supplied params into the adapter's expected shape.
    ///
    /// Keys without a rename entry pass through unchanged. Non-object
    /// params are returned as-is; the validator guarantees an object for
    /// real plans.
    #[must_use]
    pub fn translate_params(&self, params: &Value) -> Value {
        let Some(obj) = params.as_object() else {
            return params.clone();
        };
        let mut translated = serde_json::Map::new();
        for (key, value) in obj {
            let name = match self.renames.iter().find(|(from, _)| key == from) {
                Some((_, to)) => *to,
                None => key.as_str(),
            };
            translated.insert(name.to_string(), value.clone());
        }
        Value::Object(translated)
    }
}
