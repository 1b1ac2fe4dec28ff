/// Implements the by-value form of a binary operator in terms of the
/// by-reference one.
macro_rules! forward_owned_binop {
	($imp:ident, $method:ident, $t:ty) => {
		impl std::ops::$imp<$t> for $t {
			type Output = $t;

			fn $method(self, rhs: $t) -> $t {
				std::ops::$imp::$method(&self, &rhs)
			}
		}
	};
}

pub mod parameter;
pub mod parse;
pub mod polynomial;
pub mod rational_function;
pub mod sign;
pub mod smt;
