//! 规则解析与求值的性质测试
//!
//! 随机生成合法的规则文本和上下文，验证解析确定性、编码往返和求值一致性。

use proptest::prelude::*;
use rule_engine::{
    Context, MAX_TREE_DEPTH, Node, RuleCompiler, RuleError, RuleExecutor, Value, codec, combine,
    decode, encode, evaluate, parse,
};

const FIELDS: &[&str] = &["age", "salary", "department", "vip", "level"];

fn field_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(FIELDS).prop_map(str::to_string)
}

fn operand_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..100_000).prop_map(|n| n.to_string()),
        prop::sample::select(vec!["'Sales'", "\"HR\"", "'30'", "''", "true", "null"])
            .prop_map(str::to_string),
        field_strategy(),
    ]
}

fn comparison_strategy() -> impl Strategy<Value = String> {
    let operators = prop::sample::select(vec!["=", "!=", ">", ">=", "<", "<="]);
    (field_strategy(), operators, operand_strategy())
        .prop_map(|(field, op, operand)| format!("{} {} {}", field, op, operand))
}

/// 随机规则文本，覆盖 AND/OR、别名、括号和裸字段
fn rule_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![4 => comparison_strategy(), 1 => field_strategy()];

    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{} AND {}", l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{} OR {}", l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{} && {}", l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{} || {}", l, r)),
            inner.prop_map(|r| format!("({})", r)),
        ]
    })
}

/// 同一连接符串起的比较链，长度跨越树深度上限
fn chain_strategy() -> impl Strategy<Value = (usize, String)> {
    let separators = prop::sample::select(vec![" AND ", " OR ", " && ", " || "]);
    (prop::collection::vec(comparison_strategy(), 1..MAX_TREE_DEPTH + 64), separators)
        .prop_map(|(conditions, separator)| (conditions.len(), conditions.join(separator)))
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-1000i64..100_000).prop_map(Value::from),
        (-1000.0f64..100_000.0).prop_map(Value::from),
        prop::sample::select(vec!["Sales", "HR", "30", "", "gold"]).prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

/// 随机上下文，部分字段缺失
fn context_strategy() -> impl Strategy<Value = Context> {
    prop::collection::vec((field_strategy(), value_strategy()), 0..FIELDS.len())
        .prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #[test]
    fn test_parse_is_deterministic(rule in rule_strategy()) {
        let first = parse(&rule).unwrap();
        let second = parse(&rule).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_codec_round_trip(rule in rule_strategy()) {
        let node = parse(&rule).unwrap();

        prop_assert_eq!(&decode(&encode(&node)).unwrap(), &node);

        let json = codec::to_json_string(&node).unwrap();
        prop_assert_eq!(codec::from_json_str(&json).unwrap(), node);
    }

    #[test]
    fn test_display_reparses_to_same_tree(rule in rule_strategy()) {
        let node = parse(&rule).unwrap();
        let rendered = node.to_string();
        prop_assert_eq!(parse(&rendered).unwrap(), node);
    }

    #[test]
    fn test_executor_agrees_with_evaluate(rule in rule_strategy(), context in context_strategy()) {
        let mut compiler = RuleCompiler::new();
        let compiled = compiler.compile("prop", &rule).unwrap();
        let expected = evaluate(compiled.root(), &context);

        prop_assert_eq!(evaluate(compiled.root(), &context), expected);
        prop_assert_eq!(RuleExecutor::new().execute(&compiled, &context).matched, expected);
        prop_assert_eq!(RuleExecutor::new().with_trace().execute(&compiled, &context).matched, expected);
    }

    #[test]
    fn test_combine_is_logical_or(
        first in rule_strategy(),
        second in rule_strategy(),
        context in context_strategy(),
    ) {
        let combined: Node = combine(&[first.as_str(), second.as_str()]).unwrap();
        let expected = evaluate(&parse(&first).unwrap(), &context)
            || evaluate(&parse(&second).unwrap(), &context);

        prop_assert_eq!(evaluate(&combined, &context), expected);
    }

    #[test]
    fn test_chain_depth_limit((conditions, rule) in chain_strategy(), context in context_strategy()) {
        // 每个比较两层，每个连接符再加一层
        let depth = conditions + 1;

        match parse(&rule) {
            Ok(node) => {
                prop_assert!(depth <= MAX_TREE_DEPTH);
                prop_assert_eq!(node.depth(), depth);

                let json = codec::to_json_string(&node).unwrap();
                let decoded = codec::from_json_str(&json).unwrap();
                prop_assert_eq!(&decoded, &node);

                let compiled = RuleCompiler::new().compile("chain", &rule).unwrap();
                prop_assert_eq!(
                    RuleExecutor::new().execute(&compiled, &context).matched,
                    evaluate(&node, &context)
                );
            }
            Err(err) => {
                prop_assert!(depth > MAX_TREE_DEPTH);
                prop_assert!(matches!(err, RuleError::Syntax { .. }), "expected RuleError::Syntax, got {:?}", err);
            }
        }
    }
}
