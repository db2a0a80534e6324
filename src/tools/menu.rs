//! 菜单相关能力：查价、下单、列出菜单
//!
//! 三者都只读 MenuStore；找不到、存储出错、参数无效都以文本回给模型。

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::memory::OrderLine;
use crate::store::{MenuItem, MenuStore};
use crate::tools::schema::{parameters_schema, parse_args, AddToOrderArgs, ListMenuArgs, LookupPriceArgs};
use crate::tools::{Capability, CapabilityKind, CapabilityOutput};

/// 菜单标题中的标记词，回复后处理据此识别菜单结果
pub const DEFAULT_MENU_MARKER: &str = "CARDÁPIO";

fn invalid_args(kind: CapabilityKind, err: serde_json::Error) -> CapabilityOutput {
    tracing::warn!(capability = %kind, error = %err, "Invalid capability arguments");
    CapabilityOutput::text(format!("Argumentos inválidos para {}: {}", kind, err))
}

fn store_failure(context: &str, prefix: &str, err: impl std::fmt::Display) -> CapabilityOutput {
    tracing::error!(error = %err, "{}", context);
    CapabilityOutput::text(format!("{}: {}", prefix, err))
}

const QUERY_FAILED: &str = "Erro ao consultar o banco de dados";
const ORDER_FAILED: &str = "Erro ao processar pedido";

/// 查询某款披萨的价格与配料
pub struct LookupPrice {
    store: Arc<dyn MenuStore>,
}

impl LookupPrice {
    pub fn new(store: Arc<dyn MenuStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Capability for LookupPrice {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::LookupPrice
    }

    fn description(&self) -> &str {
        "Consulta o preço e os ingredientes de uma pizza no cardápio. \
         Use quando o cliente perguntar o preço de uma pizza ou o que vem nela."
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema::<LookupPriceArgs>()
    }

    async fn execute(&self, args: Value) -> CapabilityOutput {
        let args: LookupPriceArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return invalid_args(self.kind(), e),
        };
        tracing::info!(item = %args.item_name, "Searching for pizza");

        match self.store.find_by_name(&args.item_name).await {
            Ok(Some(item)) => {
                tracing::info!(item = %item.name, "Found pizza");
                CapabilityOutput::text(format!(
                    "A pizza de {} custa R$ {:.2} e leva {}.",
                    item.name, item.price, item.ingredients
                ))
            }
            Ok(None) => {
                tracing::warn!(item = %args.item_name, "Pizza not found");
                CapabilityOutput::text(format!(
                    "Desculpe, não encontrei a pizza de {} no cardápio.",
                    args.item_name
                ))
            }
            Err(e) => store_failure("Error querying menu store", QUERY_FAILED, e),
        }
    }
}

/// 把披萨加入订单：返回单价与小计，并带回结构化订单行
pub struct AddToOrder {
    store: Arc<dyn MenuStore>,
}

impl AddToOrder {
    pub fn new(store: Arc<dyn MenuStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Capability for AddToOrder {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::AddToOrder
    }

    fn description(&self) -> &str {
        "Adiciona uma pizza ao pedido. Use quando o cliente confirmar que quer pedir uma pizza."
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema::<AddToOrderArgs>()
    }

    async fn execute(&self, args: Value) -> CapabilityOutput {
        let args: AddToOrderArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return invalid_args(self.kind(), e),
        };
        if args.quantity == 0 {
            return CapabilityOutput::text("A quantidade deve ser pelo menos 1.");
        }
        tracing::info!(item = %args.item_name, quantity = args.quantity, "Adding to order");

        match self.store.find_by_name(&args.item_name).await {
            Ok(Some(item)) => {
                let subtotal = item.price * Decimal::from(args.quantity);
                tracing::info!(item = %item.name, quantity = args.quantity, %subtotal, "Added to order");
                CapabilityOutput {
                    text: format!(
                        "Adicionado {}x {} ao pedido. Valor unitário: R$ {:.2}. Subtotal: R$ {:.2}",
                        args.quantity, item.name, item.price, subtotal
                    ),
                    order_line: Some(OrderLine {
                        item_name: item.name,
                        quantity: args.quantity,
                        subtotal,
                    }),
                }
            }
            Ok(None) => {
                tracing::warn!(item = %args.item_name, "Pizza not found for order");
                CapabilityOutput::text(format!(
                    "Desculpe, não encontrei a pizza de {} para adicionar ao pedido.",
                    args.item_name
                ))
            }
            Err(e) => store_failure("Error adding to order", ORDER_FAILED, e),
        }
    }
}

/// 列出完整菜单；标题含标记词
pub struct ListMenu {
    store: Arc<dyn MenuStore>,
    marker: String,
}

impl ListMenu {
    pub fn new(store: Arc<dyn MenuStore>, marker: impl Into<String>) -> Self {
        Self {
            store,
            marker: marker.into(),
        }
    }
}

/// 菜单文本：标题行 + 每款一行（存储顺序）
pub fn format_menu(items: &[MenuItem], marker: &str) -> String {
    let mut s = format!("🍕 {} 🍕\n", marker);
    for item in items {
        s.push_str(&format!(
            "\n- {} (R$ {:.2}): {}",
            item.name, item.price, item.ingredients
        ));
    }
    s
}

#[async_trait]
impl Capability for ListMenu {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::ListMenu
    }

    fn description(&self) -> &str {
        "Lista o cardápio completo com nomes, ingredientes e preços. \
         Use quando o cliente pedir para ver o cardápio ou as opções disponíveis."
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema::<ListMenuArgs>()
    }

    async fn execute(&self, args: Value) -> CapabilityOutput {
        if let Err(e) = parse_args::<ListMenuArgs>(args) {
            return invalid_args(self.kind(), e);
        }
        match self.store.list_all().await {
            Ok(items) if items.is_empty() => {
                CapabilityOutput::text("O cardápio está vazio no momento.")
            }
            Ok(items) => {
                tracing::info!(count = items.len(), "Listing menu");
                CapabilityOutput::text(format_menu(&items, &self.marker))
            }
            Err(e) => store_failure("Error listing menu", QUERY_FAILED, e),
        }
    }
}
