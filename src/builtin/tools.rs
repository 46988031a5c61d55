use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::schema::Arguments;
use crate::server::{FnToolHandler, ServerBuilder, ToolHandler};
use crate::types::{text_result, McpError, Tool, ToolResult};

pub const HELLO: &str = "hello";
pub const CALCULATE: &str = "calculate";

pub(super) fn register(
    mut builder: ServerBuilder,
    names: &[&str],
    defs: &[Tool],
    empty_name: Option<&'static str>,
) -> Result<ServerBuilder, McpError> {
    for &name in names {
        let def = super::definition(defs, name, |t| t.name.as_str())?.clone();
        let handler: Arc<dyn ToolHandler> = match name {
            HELLO => FnToolHandler::new(move |args: Arguments| async move {
                hello(&args, empty_name)
            }),
            CALCULATE => Arc::new(Calculate),
            other => {
                return Err(McpError::Definition(format!(
                    "no handler for built-in tool \"{}\"",
                    other
                )))
            }
        };
        builder = builder.tool(def, handler);
    }
    Ok(builder)
}

/// `hello`: greet `name`. An empty name is replaced by `empty_name` when
/// one is given and greeted as-is otherwise.
pub fn hello(args: &Arguments, empty_name: Option<&str>) -> Result<ToolResult, McpError> {
    let name = match (args.require_str("name")?, empty_name) {
        ("", Some(fallback)) => fallback,
        (name, _) => name,
    };
    Ok(text_result(format!("Hello, {}! Welcome to MCP!", name)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        }
    }

    /// Apply the operation with plain f64 semantics. Only division by zero
    /// is rejected; overflow and NaN operands pass through.
    pub fn apply(self, a: f64, b: f64) -> Result<f64, McpError> {
        match self {
            Operation::Add => Ok(a + b),
            Operation::Subtract => Ok(a - b),
            Operation::Multiply => Ok(a * b),
            Operation::Divide if b == 0.0 => {
                Err(McpError::domain("Division by zero is not allowed"))
            }
            Operation::Divide => Ok(a / b),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Operation::Add),
            "subtract" => Ok(Operation::Subtract),
            "multiply" => Ok(Operation::Multiply),
            "divide" => Ok(Operation::Divide),
            other => Err(McpError::invalid_arguments(format!("Unknown operation: {}", other))),
        }
    }
}

/// Render `"{a} {operation} {b} = {result}"`.
pub fn calculate(operation: Operation, a: f64, b: f64) -> Result<String, McpError> {
    let result = operation.apply(a, b)?;
    Ok(format!(
        "{} {} {} = {}",
        format_number(a),
        operation,
        format_number(b),
        format_number(result)
    ))
}

/// Shortest round-trip rendering in ECMAScript `Number#toString` form:
/// `5` rather than `5.0`, exponent notation below `1e-6` and from `1e21`
/// up (`1e-7`, `1.5e+300`), and the usual names for the non-finite values.
pub fn format_number(x: f64) -> String {
    if x.is_nan() {
        return "NaN".into();
    }
    if x.is_infinite() {
        return if x > 0.0 {
            "Infinity".into()
        } else {
            "-Infinity".into()
        };
    }
    if x == 0.0 {
        // Covers -0.0 as well.
        return "0".into();
    }

    // `{:e}` yields the shortest round-trip digits as `d[.ddd]e<exp>`.
    let sci = format!("{:e}", x.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    // Position of the decimal point relative to the first digit.
    let n = exp.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        format!("{}.{}", &digits[..n as usize], &digits[n as usize..])
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let sign = if n - 1 < 0 { '-' } else { '+' };
        let exponent = (n - 1).abs();
        if k == 1 {
            format!("{}e{}{}", digits, sign, exponent)
        } else {
            format!("{}.{}e{}{}", &digits[..1], &digits[1..], sign, exponent)
        }
    };

    if x < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

struct Calculate;

#[async_trait]
impl ToolHandler for Calculate {
    async fn call(&self, args: Arguments) -> Result<ToolResult, McpError> {
        let operation: Operation = args.require_str("operation")?.parse()?;
        let a = args.require_number("a")?;
        let b = args.require_number("b")?;
        Ok(text_result(calculate(operation, a, b)?))
    }
}
