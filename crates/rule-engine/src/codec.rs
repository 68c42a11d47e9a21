//! 表达式树序列化
//!
//! 线上格式：`{"Type": "...", "Value": "...", "Left": {...}, "Right": {...}}`，
//! 只有分支节点带 `Left`/`Right`，叶子节点完全不含这两个键。

use crate::error::{Result, RuleError};
use crate::models::{MAX_TREE_DEPTH, Node, NodeKind};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

const TYPE_KEY: &str = "Type";
const VALUE_KEY: &str = "Value";
const LEFT_KEY: &str = "Left";
const RIGHT_KEY: &str = "Right";
const ROOT_FIELD: &str = "<root>";

/// 将表达式树编码为线上格式
pub fn encode(node: &Node) -> Value {
    let mut object = Map::new();
    object.insert(TYPE_KEY.to_string(), Value::from(node.kind().wire_name()));
    object.insert(VALUE_KEY.to_string(), Value::from(node.value()));

    if let Some((left, right)) = node.children() {
        object.insert(LEFT_KEY.to_string(), encode(left));
        object.insert(RIGHT_KEY.to_string(), encode(right));
    }

    Value::Object(object)
}

/// 从线上格式解码表达式树
pub fn decode(wire: &Value) -> Result<Node> {
    decode_at(wire, "", 1)
}

/// 编码为 JSON 字符串
pub fn to_json_string(node: &Node) -> Result<String> {
    Ok(serde_json::to_string(&encode(node))?)
}

/// 从 JSON 字符串解码
pub fn from_json_str(json: &str) -> Result<Node> {
    decode(&parse_wire(json)?)
}

/// 读取线上格式的 JSON 文本
///
/// 嵌套层数不超过 [`MAX_TREE_DEPTH`] 的输入不受 serde_json 默认递归上限（128）限制。
pub fn parse_wire(json: &str) -> Result<Value> {
    if nesting_depth(json) > MAX_TREE_DEPTH {
        return Err(RuleError::format(
            ROOT_FIELD,
            format!("嵌套层数超过 {}", MAX_TREE_DEPTH),
        ));
    }

    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let wire = Value::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(wire)
}

/// 统计 JSON 文本中对象和数组的最大嵌套层数，忽略字符串内的括号
fn nesting_depth(json: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in json.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    deepest
}

fn decode_at(wire: &Value, path: &str, depth: usize) -> Result<Node> {
    let field = if path.is_empty() { ROOT_FIELD } else { path };
    if depth > MAX_TREE_DEPTH {
        return Err(RuleError::format(
            field,
            format!("表达式树深度超过 {}", MAX_TREE_DEPTH),
        ));
    }

    let object = wire
        .as_object()
        .ok_or_else(|| RuleError::format(field, "必须是 JSON 对象"))?;

    let type_field = field_path(path, TYPE_KEY);
    let type_name = match object.get(TYPE_KEY) {
        Some(Value::String(name)) => name,
        Some(_) => return Err(RuleError::format(type_field, "必须是字符串")),
        None => return Err(RuleError::format(type_field, "缺失")),
    };
    let kind = NodeKind::from_wire_name(type_name)
        .ok_or_else(|| RuleError::format(&type_field, format!("未知的节点类型 '{}'", type_name)))?;

    let value = match object.get(VALUE_KEY) {
        Some(Value::String(value)) => value.clone(),
        Some(_) => return Err(RuleError::format(field_path(path, VALUE_KEY), "必须是字符串")),
        None => return Err(RuleError::format(field_path(path, VALUE_KEY), "缺失")),
    };

    match kind {
        NodeKind::Branch(branch) => {
            let left = decode_child(object, path, LEFT_KEY, depth + 1)?;
            let right = decode_child(object, path, RIGHT_KEY, depth + 1)?;
            Ok(Node::branch(branch, value, left, right))
        }
        NodeKind::Leaf(leaf) => {
            for key in [LEFT_KEY, RIGHT_KEY] {
                if object.contains_key(key) {
                    return Err(RuleError::format(
                        field_path(path, key),
                        format!("叶子节点 {} 不能包含子节点", kind),
                    ));
                }
            }
            Ok(Node::leaf(leaf, value))
        }
    }
}

fn decode_child(
    object: &Map<String, Value>,
    path: &str,
    key: &str,
    depth: usize,
) -> Result<Node> {
    let child_path = field_path(path, key);
    match object.get(key) {
        Some(child) => decode_at(child, &child_path, depth),
        None => Err(RuleError::format(child_path, "分支节点缺少子节点")),
    }
}

fn field_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        encode(self).serialize(serializer)
    }
}

/// 经由 `serde_json::from_str` 读取时仍受其默认递归上限约束，深层树使用 [`from_json_str`]
impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = Value::deserialize(deserializer)?;
        decode(&wire).map_err(serde::de::Error::custom)
    }
}
