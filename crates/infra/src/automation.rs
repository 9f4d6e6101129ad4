//! Automation dispatcher: named commands with JSON params mapped onto engine
//! operations.
//!
//! ```json
//! { "command": "one_time_rule", "params": { "order_id": "…", "action": "cancel" } }
//! ```
//!
//! Unknown commands and malformed params are validation errors. Results are
//! plain JSON values.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::{info, instrument};

use leadflow_core::{OrderId, RegionCode};
use leadflow_leads::LeadStatus;
use leadflow_orders::OrderStatus;

use crate::allocation::OrderRequest;
use crate::engine::LeadEngine;
use crate::error::EngineError;
use crate::store::{LeadFilter, LeadStore, OrderFilter, Pagination};

/// Raw request as received from a rules runner or the HTTP surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRequest {
    pub command: String,
    #[serde(default)]
    pub params: JsonValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Fulfill,
    Cancel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderListParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LeadListParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OrderRef {
    order_id: OrderId,
}

#[derive(Debug, Deserialize)]
struct OneTimeRuleParams {
    order_id: OrderId,
    action: RuleAction,
}

/// A parsed automation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomationCommand {
    CreateOrder(OrderRequest),
    FulfillOrder { order_id: OrderId },
    DeleteOrder { order_id: OrderId },
    GetOrders(OrderListParams),
    GetLeads(LeadListParams),
    OneTimeRule { order_id: OrderId, action: RuleAction },
}

impl AutomationCommand {
    pub fn name(&self) -> &'static str {
        match self {
            AutomationCommand::CreateOrder(_) => "create_order",
            AutomationCommand::FulfillOrder { .. } => "fulfill_order",
            AutomationCommand::DeleteOrder { .. } => "delete_order",
            AutomationCommand::GetOrders(_) => "get_orders",
            AutomationCommand::GetLeads(_) => "get_leads",
            AutomationCommand::OneTimeRule { .. } => "one_time_rule",
        }
    }

    pub fn parse(request: AutomationRequest) -> Result<Self, EngineError> {
        let AutomationRequest { command, params } = request;
        let command = match command.trim() {
            "create_order" => AutomationCommand::CreateOrder(params_as(&command, params)?),
            "fulfill_order" => {
                let OrderRef { order_id } = params_as(&command, params)?;
                AutomationCommand::FulfillOrder { order_id }
            }
            "delete_order" => {
                let OrderRef { order_id } = params_as(&command, params)?;
                AutomationCommand::DeleteOrder { order_id }
            }
            "get_orders" => AutomationCommand::GetOrders(params_as(&command, params)?),
            "get_leads" => AutomationCommand::GetLeads(params_as(&command, params)?),
            "one_time_rule" => {
                let OneTimeRuleParams { order_id, action } = params_as(&command, params)?;
                AutomationCommand::OneTimeRule { order_id, action }
            }
            other => {
                return Err(EngineError::Validation(format!(
                    "unknown automation command {other:?}"
                )));
            }
        };
        Ok(command)
    }
}

/// Missing params are treated as an empty object.
fn params_as<T: DeserializeOwned>(command: &str, params: JsonValue) -> Result<T, EngineError> {
    let params = match params {
        JsonValue::Null => JsonValue::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(params)
        .map_err(|e| EngineError::Validation(format!("invalid params for {command}: {e}")))
}

pub struct AutomationDispatcher<S: ?Sized> {
    engine: Arc<LeadEngine<S>>,
}

impl<S: ?Sized> Clone for AutomationDispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S> AutomationDispatcher<S>
where
    S: LeadStore + ?Sized,
{
    pub fn new(engine: Arc<LeadEngine<S>>) -> Self {
        Self { engine }
    }

    /// Parse and execute a raw request.
    pub async fn dispatch(&self, request: AutomationRequest) -> Result<JsonValue, EngineError> {
        let command = AutomationCommand::parse(request)?;
        self.execute(command).await
    }

    #[instrument(skip(self, command), fields(command = command.name()), err)]
    pub async fn execute(&self, command: AutomationCommand) -> Result<JsonValue, EngineError> {
        let name = command.name();
        let result = match command {
            AutomationCommand::CreateOrder(request) => {
                let allocation = self.engine.create_order(request).await?;
                json!({
                    "order": allocation.order,
                    "assigned_leads": allocation.assigned_leads,
                })
            }
            AutomationCommand::FulfillOrder { order_id } => {
                let order = self.engine.fulfill_order(order_id).await?;
                json!({ "order": order })
            }
            AutomationCommand::DeleteOrder { order_id } => {
                self.engine.delete_order(order_id).await?;
                json!({ "deleted": true, "order_id": order_id })
            }
            AutomationCommand::GetOrders(params) => {
                let filter = OrderFilter {
                    status: params
                        .status
                        .as_deref()
                        .map(str::parse::<OrderStatus>)
                        .transpose()?,
                };
                let pagination = Pagination::from_query(params.page, params.page_size)?;
                let page = self.engine.list_orders(&filter, pagination).await?;
                json!({
                    "orders": page.items,
                    "total": page.total,
                    "has_more": page.has_more,
                })
            }
            AutomationCommand::GetLeads(params) => {
                let filter = LeadFilter {
                    status: params
                        .status
                        .as_deref()
                        .map(str::parse::<LeadStatus>)
                        .transpose()?,
                    region: params
                        .region
                        .as_deref()
                        .map(RegionCode::parse)
                        .transpose()?,
                };
                let pagination = Pagination::from_query(params.page, params.page_size)?;
                let page = self.engine.list_leads(&filter, pagination).await?;
                json!({
                    "leads": page.items,
                    "total": page.total,
                    "has_more": page.has_more,
                })
            }
            AutomationCommand::OneTimeRule { order_id, action } => {
                let order = match action {
                    RuleAction::Fulfill => self.engine.fulfill_order(order_id).await?,
                    RuleAction::Cancel => self.engine.cancel_order(order_id).await?,
                };
                json!({ "order": order, "action": action })
            }
        };
        info!(command = name, "automation command executed");
        Ok(result)
    }
}
