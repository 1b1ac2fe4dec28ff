//! Reads weight expressions such as `p/(p+q)` or `1 - 0.3*p^2` into exact
//! rational functions, using evalexpr's operator tree.

use std::fmt;

use evalexpr::{build_operator_tree, DefaultNumericTypes, Node, Operator, Value};
use num::{BigInt, BigRational, Signed, ToPrimitive, Zero};

use super::parameter::Parameter;
use super::rational_function::RationalFunction;

#[derive(Clone, Debug, PartialEq)]
enum ExpressionParseErrorType {
	Syntax(String),              // evalexpr's description
	UnsupportedOperator(String), // The operator we cannot express
	UnsupportedValue(String),    // A literal that is not a number
	DivisionByZero,
	InvalidExponent(String), // Exponents must be non-negative integer constants
}

impl fmt::Display for ExpressionParseErrorType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Syntax(desc) => write!(f, "Syntax error: {}", desc),
			Self::UnsupportedOperator(op) => write!(f, "Unsupported operator `{}`.", op),
			Self::UnsupportedValue(value) => write!(f, "Unsupported value `{}`.", value),
			Self::DivisionByZero => write!(f, "Division by zero."),
			Self::InvalidExponent(exponent) => {
				write!(f, "Exponent `{}` is not a non-negative integer constant.", exponent)
			}
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionParseError {
	expression: String,
	etype: ExpressionParseErrorType,
}

impl ExpressionParseError {
	fn new(expression: &str, etype: ExpressionParseErrorType) -> Self {
		Self {
			expression: expression.to_string(),
			etype,
		}
	}

	pub fn expression(&self) -> &str {
		&self.expression
	}
}

impl fmt::Display for ExpressionParseError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"[Parse Error] Unable to read expression `{}`: {}",
			self.expression, self.etype
		)
	}
}

impl std::error::Error for ExpressionParseError {}

/// Reads `expression` into a rational function. Identifiers become parameters.
pub fn read_rational_function(expression: &str) -> Result<RationalFunction, ExpressionParseError> {
	let tree = build_operator_tree::<DefaultNumericTypes>(expression).map_err(|err| {
		ExpressionParseError::new(expression, ExpressionParseErrorType::Syntax(err.to_string()))
	})?;
	convert(&tree, expression)
}

fn binary<'n>(
	children: &'n [Node<DefaultNumericTypes>],
	expression: &str,
) -> Result<(&'n Node<DefaultNumericTypes>, &'n Node<DefaultNumericTypes>), ExpressionParseError> {
	match children {
		[left, right] => Ok((left, right)),
		_ => Err(ExpressionParseError::new(
			expression,
			ExpressionParseErrorType::Syntax(format!("expected two operands, got {}", children.len())),
		)),
	}
}

fn convert(
	node: &Node<DefaultNumericTypes>,
	expression: &str,
) -> Result<RationalFunction, ExpressionParseError> {
	let children = node.children();
	match node.operator() {
		Operator::RootNode => match children {
			[child] => convert(child, expression),
			_ => Err(ExpressionParseError::new(
				expression,
				ExpressionParseErrorType::Syntax("expected exactly one expression".to_string()),
			)),
		},
		Operator::Add => {
			let (left, right) = binary(children, expression)?;
			Ok(convert(left, expression)? + convert(right, expression)?)
		}
		Operator::Sub => {
			let (left, right) = binary(children, expression)?;
			Ok(convert(left, expression)? - convert(right, expression)?)
		}
		Operator::Mul => {
			let (left, right) = binary(children, expression)?;
			Ok(convert(left, expression)? * convert(right, expression)?)
		}
		Operator::Div => {
			let (left, right) = binary(children, expression)?;
			let divisor = convert(right, expression)?;
			if divisor.is_zero() {
				return Err(ExpressionParseError::new(
					expression,
					ExpressionParseErrorType::DivisionByZero,
				));
			}
			Ok(convert(left, expression)? / divisor)
		}
		Operator::Neg => match children {
			[child] => Ok(-&convert(child, expression)?),
			_ => Err(ExpressionParseError::new(
				expression,
				ExpressionParseErrorType::Syntax("negation without operand".to_string()),
			)),
		},
		Operator::Exp => {
			let (base, exponent) = binary(children, expression)?;
			let base = convert(base, expression)?;
			let exponent = convert(exponent, expression)?;
			let power = exponent
				.constant_value()
				.filter(|value| value.is_integer() && !value.is_negative())
				.and_then(|value| value.to_integer().to_u32())
				.ok_or_else(|| {
					ExpressionParseError::new(
						expression,
						ExpressionParseErrorType::InvalidExponent(exponent.to_string()),
					)
				})?;
			Ok((0..power).fold(RationalFunction::one(), |acc, _| &acc * &base))
		}
		Operator::Const { value } => match value {
			Value::Int(i) => Ok(RationalFunction::constant(BigRational::from_integer((*i).into()))),
			Value::Float(x) => read_decimal(&x.to_string())
				.map(RationalFunction::constant)
				.ok_or_else(|| {
					ExpressionParseError::new(
						expression,
						ExpressionParseErrorType::UnsupportedValue(x.to_string()),
					)
				}),
			other => Err(ExpressionParseError::new(
				expression,
				ExpressionParseErrorType::UnsupportedValue(format!("{:?}", other)),
			)),
		},
		Operator::VariableIdentifierRead { identifier } => {
			Ok(RationalFunction::parameter(Parameter::new(identifier.as_str())))
		}
		other => Err(ExpressionParseError::new(
			expression,
			ExpressionParseErrorType::UnsupportedOperator(format!("{:?}", other)),
		)),
	}
}

/// Reads an exact rational from a decimal (`-0.25`) or fraction (`1/3`) literal.
pub fn read_decimal(text: &str) -> Option<BigRational> {
	let text = text.trim();
	if let Some((numerator, denominator)) = text.split_once('/') {
		let numerator = read_decimal(numerator)?;
		let denominator = read_decimal(denominator)?;
		if denominator.is_zero() {
			return None;
		}
		return Some(numerator / denominator);
	}
	let (negative, digits) = match text.strip_prefix('-') {
		Some(rest) => (true, rest),
		None => (false, text),
	};
	let (integral, fractional) = digits.split_once('.').unwrap_or((digits, ""));
	if integral.is_empty() && fractional.is_empty() {
		return None;
	}
	if !integral.chars().chain(fractional.chars()).all(|c| c.is_ascii_digit()) {
		return None;
	}
	let mantissa: BigInt = format!("{}{}", integral, fractional).parse().ok()?;
	let scale = BigInt::from(10u32).pow(fractional.len() as u32);
	let value = BigRational::new(mantissa, scale);
	Some(if negative { -value } else { value })
}
