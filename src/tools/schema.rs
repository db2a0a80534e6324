//! 能力参数 JSON Schema 生成（schemars 自动生成）
//!
//! 每个能力的参数是一个带 JsonSchema 的结构体；目录中的 parameters 字段由它生成，
//! 执行时用同一个结构体反序列化模型给出的参数，保证两边一致。

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 暴露给模型的能力目录条目：名称、描述、参数 schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilitySpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// lookup_price 参数
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LookupPriceArgs {
    /// Nome (ou parte do nome) da pizza, por exemplo "calabresa"
    pub item_name: String,
}

/// add_to_order 参数
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddToOrderArgs {
    /// Nome (ou parte do nome) da pizza
    pub item_name: String,
    /// Quantidade de pizzas (padrão 1)
    #[serde(default = "default_quantity", deserialize_with = "quantity_lenient")]
    #[schemars(with = "u32")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// 模型常把整数参数写成字符串（"2"），两种形式都接受
fn quantity_lenient<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u32),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("quantity must be a whole number, got {:?}", s))
        }),
    }
}

/// list_menu 无参数
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListMenuArgs {}

/// 生成参数 schema；去掉 `$schema` / `title` 等模型不需要的元信息
pub fn parameters_schema<T: JsonSchema>() -> Value {
    let schema = schema_for!(T);
    let mut value = serde_json::to_value(&schema).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.remove("description");
        obj.entry("properties")
            .or_insert_with(|| Value::Object(Default::default()));
    }
    value
}

/// 反序列化参数；null 视为空对象（部分模型对无参工具传 null）
pub fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, serde_json::Error> {
    let args = if args.is_null() {
        serde_json::json!({})
    } else {
        args
    };
    serde_json::from_value(args)
}
