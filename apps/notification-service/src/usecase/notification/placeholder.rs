//! # プレースホルダー置換
//!
//! `{{key}}` 形式のトークンをコンテキストの値で置き換える。
//! 組み込みテンプレート・DB テンプレート・呼び出し元指定の件名/本文すべてで共通。
//!
//! - キーは `[A-Za-z0-9_.]+`。ドット区切りはネストしたオブジェクトをたどる
//! - 括弧の内側の空白は許容する（`{{ userName }}`）
//! - コンテキストに存在しないキーはトークンをそのまま残す
//! - HTML に埋め込む場合は値をエスケープする。件名はエスケープしない

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("valid regex"));

/// 置換先の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// HTML 本文（値をエスケープする）
    Html,
    /// 件名などのプレーンテキスト
    Text,
}

/// テンプレート中のプレースホルダーを置換する
pub fn substitute(template: &str, context: &Map<String, Value>, target: Target) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let Some(value) = lookup(context, &caps[1]) else {
                return caps[0].to_string();
            };

            let text = display_value(value);
            match target {
                Target::Html => tera::escape_html(&text),
                Target::Text => text,
            }
        })
        .into_owned()
}

/// テンプレート中のプレースホルダーのキーを出現順に列挙する
pub fn keys(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn lookup<'a>(context: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let first = context.get(segments.next()?)?;
    segments.try_fold(first, |value, segment| value.as_object()?.get(segment))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn context() -> Map<String, Value> {
        match json!({
            "userName": "Alice",
            "rating": 4,
            "artist": { "name": "Nova", "genre": "électro" },
            "bio": "<script>alert(1)</script>",
            "empty": null
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[rstest]
    #[case("Bonjour {{userName}} !", "Bonjour Alice !")]
    #[case("Bonjour {{ userName }} !", "Bonjour Alice !")]
    #[case("{{rating}}/5", "4/5")]
    #[case("{{artist.name}} ({{artist.genre}})", "Nova (électro)")]
    #[case("[{{empty}}]", "[]")]
    #[case("{{missing}} reste", "{{missing}} reste")]
    #[case("{{artist.missing}}", "{{artist.missing}}")]
    #[case("{{ user-name }}", "{{ user-name }}")]
    fn test_プレースホルダーを置換する(#[case] template: &str, #[case] expected: &str) {
        assert_eq!(substitute(template, &context(), Target::Text), expected);
    }

    #[test]
    fn test_html置換では値をエスケープする() {
        let html = substitute("<p>{{bio}}</p>", &context(), Target::Html);

        assert_eq!(html, "<p>&lt;script&gt;alert(1)&lt;&#x2F;script&gt;</p>");
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_テキスト置換ではエスケープしない() {
        let subject = substitute("{{bio}}", &context(), Target::Text);
        assert_eq!(subject, "<script>alert(1)</script>");
    }

    #[test]
    fn test_オブジェクト値はjson文字列になる() {
        let text = substitute("{{artist}}", &context(), Target::Text);
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({ "name": "Nova", "genre": "électro" }));
    }

    #[test]
    fn test_キーを出現順に列挙する() {
        assert_eq!(
            keys("{{a}} et {{ b.c }} puis {{a}}"),
            vec!["a".to_string(), "b.c".to_string(), "a".to_string()]
        );
    }
}
