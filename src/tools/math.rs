//! Arithmetic tools.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

/// Multiply two numbers.
pub struct Multiply;

#[async_trait]
impl Tool for Multiply {
    fn name(&self) -> &str {
        "multiply"
    }

    fn description(&self) -> &str {
        "Multiply two numbers and return the product. Use for any multiplication instead of computing it yourself."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "a": {
                    "type": "number",
                    "description": "First operand"
                },
                "b": {
                    "type": "number",
                    "description": "Second operand"
                }
            },
            "required": ["a", "b"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let a = operand(&args, "a")?;
        let b = operand(&args, "b")?;
        Ok(multiply(a, b).to_string())
    }
}

/// Operands keep integer precision when both sides are integers.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

fn operand(args: &Value, key: &str) -> anyhow::Result<Number> {
    let value = args
        .get(key)
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", key))?;

    // Small models frequently quote numbers.
    let value = match value {
        Value::String(s) => serde_json::from_str::<Value>(s.trim())
            .map_err(|_| anyhow::anyhow!("Argument '{}' is not a number: {}", key, s))?,
        other => other.clone(),
    };

    if let Some(i) = value.as_i64() {
        Ok(Number::Int(i))
    } else if let Some(f) = value.as_f64() {
        Ok(Number::Float(f))
    } else {
        Err(anyhow::anyhow!("Argument '{}' is not a number: {}", key, value))
    }
}

fn multiply(a: Number, b: Number) -> Value {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => match x.checked_mul(y) {
            Some(p) => json!(p),
            None => json!(x as f64 * y as f64),
        },
        (x, y) => json!(as_f64(x) * as_f64(y)),
    }
}

fn as_f64(n: Number) -> f64 {
    match n {
        Number::Int(i) => i as f64,
        Number::Float(f) => f,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn six_times_seven() {
        let out = Multiply.execute(json!({"a": 6, "b": 7})).await.unwrap();
        assert_eq!(out, "42");
        // Same answer regardless of what ran before.
        Multiply.execute(json!({"a": 3.5, "b": 2})).await.unwrap();
        let again = Multiply.execute(json!({"a": 6, "b": 7})).await.unwrap();
        assert_eq!(again, "42");
    }

    #[tokio::test]
    async fn floats_and_quoted_numbers() {
        assert_eq!(
            Multiply.execute(json!({"a": 2.5, "b": 4})).await.unwrap(),
            "10.0"
        );
        assert_eq!(
            Multiply.execute(json!({"a": "6", "b": "7"})).await.unwrap(),
            "42"
        );
    }

    #[tokio::test]
    async fn missing_or_bad_operands_fail() {
        let err = Multiply.execute(json!({"a": 6})).await.unwrap_err();
        assert!(err.to_string().contains("Missing 'b'"));

        let err = Multiply
            .execute(json!({"a": "six", "b": 7}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a number"));
    }

    #[test]
    fn overflow_falls_back_to_float() {
        let product = multiply(Number::Int(i64::MAX), Number::Int(2));
        assert!(product.is_f64());
    }
}
