//! Operator overloads building graph nodes.

use std::ops::{Add, Div, Mul, Neg, Sub};

use super::{BinaryOp, Constant, Expr};

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<Expr>> $trait<R> for Expr {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl<R: Into<Expr>> $trait<R> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl<R: Into<Expr>> $trait<R> for &Constant {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl $trait<Expr> for f64 {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl $trait<&Expr> for f64 {
            type Output = Expr;

            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl $trait<&Constant> for f64 {
            type Output = Expr;

            fn $method(self, rhs: &Constant) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, BinaryOp::Add);
impl_binary_op!(Sub, sub, BinaryOp::Sub);
impl_binary_op!(Mul, mul, BinaryOp::Mul);
impl_binary_op!(Div, div, BinaryOp::Div);

// Negation is `0 - x` so the result stays tied to the operand's leaves.
impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::binary(BinaryOp::Sub, 0.0, self)
    }
}

impl Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::binary(BinaryOp::Sub, 0.0, self)
    }
}

impl Neg for &Constant {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::binary(BinaryOp::Sub, 0.0, self)
    }
}
