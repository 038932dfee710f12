//! Calculator tool behaviour, both direct and through the built-in tool registry.

use aiverse::config::AiverseConfig;
use aiverse::tools::{builtin_registry, Calculator, CALCULATOR_TOOL};
use serde_json::json;

#[tokio::test]
async fn test_simple_arithmetic() {
    let calc = Calculator::new();
    assert_eq!(calc.evaluate("2 + 2").await.unwrap(), 4.0);
    assert_eq!(calc.evaluate("10 - 3").await.unwrap(), 7.0);
    assert_eq!(calc.evaluate("4 * 5").await.unwrap(), 20.0);
    assert_eq!(calc.evaluate("20 / 4").await.unwrap(), 5.0);
}

#[tokio::test]
async fn test_division_is_not_truncated() {
    let calc = Calculator::new();
    assert_eq!(calc.evaluate("7 / 2").await.unwrap(), 3.5);
    assert_eq!(calc.evaluate("1 / 4").await.unwrap(), 0.25);
}

#[tokio::test]
async fn test_exponentiation() {
    let calc = Calculator::new();
    assert_eq!(calc.evaluate("2^3").await.unwrap(), 8.0);
    assert_eq!(calc.evaluate("2**3").await.unwrap(), 8.0);
    assert_eq!(calc.evaluate("10^2").await.unwrap(), 100.0);
}

#[tokio::test]
async fn test_modulo() {
    let calc = Calculator::new();
    assert_eq!(calc.evaluate("17 % 5").await.unwrap(), 2.0);
    assert_eq!(calc.evaluate("20 % 4").await.unwrap(), 0.0);
}

#[tokio::test]
async fn test_order_of_operations() {
    let calc = Calculator::new();
    assert_eq!(calc.evaluate("2 + 3 * 4").await.unwrap(), 14.0);
    assert_eq!(calc.evaluate("(2 + 3) * 4").await.unwrap(), 20.0);
    assert_eq!(calc.evaluate("10 - 5 - 2").await.unwrap(), 3.0);
    assert_eq!(calc.evaluate("2^3 * 2").await.unwrap(), 16.0);
}

#[tokio::test]
async fn test_functions_and_constants() {
    let calc = Calculator::new();
    assert_eq!(calc.evaluate("sqrt(16)").await.unwrap(), 4.0);
    assert_eq!(calc.evaluate("abs(-3.5)").await.unwrap(), 3.5);
    assert!((calc.evaluate("pi").await.unwrap() - std::f64::consts::PI).abs() < 1e-12);
    assert!((calc.evaluate("ln(e)").await.unwrap() - 1.0).abs() < 1e-12);
    assert!(calc.evaluate("sin(0)").await.unwrap().abs() < 1e-12);
}

#[tokio::test]
async fn test_errors() {
    let calc = Calculator::new();
    assert!(calc.evaluate("").await.is_err());
    assert!(calc.evaluate("2 +").await.is_err());
    assert!(calc.evaluate("1 / 0").await.is_err());
    assert!(calc.evaluate("sqrt(-1)").await.is_err());
    assert!(calc.evaluate("unknown_var * 2").await.is_err());
}

#[tokio::test]
async fn test_calculator_through_registry() {
    let registry = builtin_registry(&AiverseConfig::default()).await.unwrap();

    let result = registry
        .execute_tool(CALCULATOR_TOOL, json!({"expression": "(12.5 * 4) / 5"}))
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.output, json!("10"));

    let err = registry
        .execute_tool(CALCULATOR_TOOL, json!({"expression": "1 / 0"}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Calculator error"));

    let err = registry
        .execute_tool(CALCULATOR_TOOL, json!({}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("expression"));
}
