//! Function definitions for the function registry
//!
//! Derivative formulas follow standard calculus (DLMF §4 for the elementary
//! functions). Each derivative already applies the chain rule.

use super::registry::FunctionDefinition;
use super::{div_opt, func, mul_opt, neg, square};
use crate::Expr;

fn one() -> Expr {
    Expr::number(1.0)
}

/// Return all function definitions for populating the registry
pub(crate) fn all_definitions() -> Vec<FunctionDefinition> {
    vec![
        // Trigonometric
        FunctionDefinition {
            name: "sin",
            arity: 1..=1,
            eval: |args| Some(args[0].sin()),
            // d/dx sin(u) = cos(u) * u'
            derivative: |args, primes| mul_opt(func("cos", args[0].clone()), primes[0].clone()),
            latex: r"\sin",
        },
        FunctionDefinition {
            name: "cos",
            arity: 1..=1,
            eval: |args| Some(args[0].cos()),
            // d/dx cos(u) = -sin(u) * u'
            derivative: |args, primes| {
                mul_opt(neg(func("sin", args[0].clone())), primes[0].clone())
            },
            latex: r"\cos",
        },
        FunctionDefinition {
            name: "tan",
            arity: 1..=1,
            eval: |args| Some(args[0].tan()),
            // d/dx tan(u) = sec^2(u) * u'
            derivative: |args, primes| {
                mul_opt(square(func("sec", args[0].clone())), primes[0].clone())
            },
            latex: r"\tan",
        },
        FunctionDefinition {
            name: "cot",
            arity: 1..=1,
            eval: |args| Some(1.0 / args[0].tan()),
            // d/dx cot(u) = -csc^2(u) * u'
            derivative: |args, primes| {
                mul_opt(neg(square(func("csc", args[0].clone()))), primes[0].clone())
            },
            latex: r"\cot",
        },
        FunctionDefinition {
            name: "sec",
            arity: 1..=1,
            eval: |args| Some(1.0 / args[0].cos()),
            // d/dx sec(u) = sec(u)tan(u) * u'
            derivative: |args, primes| {
                mul_opt(
                    Expr::mul_expr(func("sec", args[0].clone()), func("tan", args[0].clone())),
                    primes[0].clone(),
                )
            },
            latex: r"\sec",
        },
        FunctionDefinition {
            name: "csc",
            arity: 1..=1,
            eval: |args| Some(1.0 / args[0].sin()),
            // d/dx csc(u) = -csc(u)cot(u) * u'
            derivative: |args, primes| {
                mul_opt(
                    neg(Expr::mul_expr(
                        func("csc", args[0].clone()),
                        func("cot", args[0].clone()),
                    )),
                    primes[0].clone(),
                )
            },
            latex: r"\csc",
        },
        // Inverse trigonometric
        FunctionDefinition {
            name: "asin",
            arity: 1..=1,
            eval: |args| Some(args[0].asin()),
            // d/dx asin(u) = u' / sqrt(1 - u^2)
            derivative: |args, primes| {
                div_opt(
                    primes[0].clone(),
                    func("sqrt", Expr::sub_expr(one(), square(args[0].clone()))),
                )
            },
            latex: r"\operatorname{asin}",
        },
        FunctionDefinition {
            name: "acos",
            arity: 1..=1,
            eval: |args| Some(args[0].acos()),
            // d/dx acos(u) = -u' / sqrt(1 - u^2)
            derivative: |args, primes| {
                div_opt(
                    neg(primes[0].clone()),
                    func("sqrt", Expr::sub_expr(one(), square(args[0].clone()))),
                )
            },
            latex: r"\operatorname{acos}",
        },
        FunctionDefinition {
            name: "atan",
            arity: 1..=1,
            eval: |args| Some(args[0].atan()),
            // d/dx atan(u) = u' / (1 + u^2)
            derivative: |args, primes| {
                div_opt(
                    primes[0].clone(),
                    Expr::add_expr(one(), square(args[0].clone())),
                )
            },
            latex: r"\operatorname{atan}",
        },
        FunctionDefinition {
            name: "atan2",
            arity: 2..=2,
            eval: |args| Some(args[0].atan2(args[1])),
            // d atan2(y, x) = (x*y' - y*x') / (x^2 + y^2)
            derivative: |args, primes| {
                let (y, x) = (args[0].clone(), args[1].clone());
                let numerator = Expr::sub_expr(
                    mul_opt(x.clone(), primes[0].clone()),
                    mul_opt(y.clone(), primes[1].clone()),
                );
                div_opt(numerator, Expr::add_expr(square(x), square(y)))
            },
            latex: r"\operatorname{atan_{2}}",
        },
        // Hyperbolic
        FunctionDefinition {
            name: "sinh",
            arity: 1..=1,
            eval: |args| Some(args[0].sinh()),
            derivative: |args, primes| mul_opt(func("cosh", args[0].clone()), primes[0].clone()),
            latex: r"\sinh",
        },
        FunctionDefinition {
            name: "cosh",
            arity: 1..=1,
            eval: |args| Some(args[0].cosh()),
            derivative: |args, primes| mul_opt(func("sinh", args[0].clone()), primes[0].clone()),
            latex: r"\cosh",
        },
        FunctionDefinition {
            name: "tanh",
            arity: 1..=1,
            eval: |args| Some(args[0].tanh()),
            // d/dx tanh(u) = (1 - tanh^2(u)) * u'
            derivative: |args, primes| {
                mul_opt(
                    Expr::sub_expr(one(), square(func("tanh", args[0].clone()))),
                    primes[0].clone(),
                )
            },
            latex: r"\tanh",
        },
        FunctionDefinition {
            name: "asinh",
            arity: 1..=1,
            eval: |args| Some(args[0].asinh()),
            // d/dx asinh(u) = u' / sqrt(u^2 + 1)
            derivative: |args, primes| {
                div_opt(
                    primes[0].clone(),
                    func("sqrt", Expr::add_expr(square(args[0].clone()), one())),
                )
            },
            latex: r"\operatorname{asinh}",
        },
        FunctionDefinition {
            name: "acosh",
            arity: 1..=1,
            eval: |args| Some(args[0].acosh()),
            // d/dx acosh(u) = u' / sqrt(u^2 - 1)
            derivative: |args, primes| {
                div_opt(
                    primes[0].clone(),
                    func("sqrt", Expr::sub_expr(square(args[0].clone()), one())),
                )
            },
            latex: r"\operatorname{acosh}",
        },
        FunctionDefinition {
            name: "atanh",
            arity: 1..=1,
            eval: |args| Some(args[0].atanh()),
            // d/dx atanh(u) = u' / (1 - u^2)
            derivative: |args, primes| {
                div_opt(
                    primes[0].clone(),
                    Expr::sub_expr(one(), square(args[0].clone())),
                )
            },
            latex: r"\operatorname{atanh}",
        },
        // Exponential and logarithmic
        FunctionDefinition {
            name: "exp",
            arity: 1..=1,
            eval: |args| Some(args[0].exp()),
            derivative: |args, primes| mul_opt(func("exp", args[0].clone()), primes[0].clone()),
            latex: r"\exp",
        },
        FunctionDefinition {
            name: "ln",
            arity: 1..=1,
            eval: |args| Some(args[0].ln()),
            // d/dx ln(u) = u' / u
            derivative: |args, primes| div_opt(primes[0].clone(), args[0].clone()),
            latex: r"\log",
        },
        FunctionDefinition {
            name: "log",
            arity: 1..=2,
            eval: |args| match args {
                [x] => Some(x.ln()),
                [x, base] => Some(x.ln() / base.ln()),
                _ => None,
            },
            // log(u) is natural; log(u, b) = ln(u) / ln(b)
            derivative: |args, primes| match (args, primes) {
                ([u, b], [du, db]) => {
                    let ln_b = func("ln", b.clone());
                    let numerator = Expr::sub_expr(
                        mul_opt(div_opt(du.clone(), u.clone()), ln_b.clone()),
                        mul_opt(func("ln", u.clone()), div_opt(db.clone(), b.clone())),
                    );
                    div_opt(numerator, square(ln_b))
                }
                _ => div_opt(primes[0].clone(), args[0].clone()),
            },
            latex: r"\log",
        },
        FunctionDefinition {
            name: "log10",
            arity: 1..=1,
            eval: |args| Some(args[0].log10()),
            // d/dx log10(u) = u' / (u * ln(10))
            derivative: |args, primes| {
                div_opt(
                    primes[0].clone(),
                    Expr::mul_expr(args[0].clone(), func("ln", Expr::number(10.0))),
                )
            },
            latex: r"\log_{10}",
        },
        FunctionDefinition {
            name: "log2",
            arity: 1..=1,
            eval: |args| Some(args[0].log2()),
            derivative: |args, primes| {
                div_opt(
                    primes[0].clone(),
                    Expr::mul_expr(args[0].clone(), func("ln", Expr::number(2.0))),
                )
            },
            latex: r"\log_{2}",
        },
        // Roots
        FunctionDefinition {
            name: "sqrt",
            arity: 1..=1,
            eval: |args| Some(args[0].sqrt()),
            // d/dx sqrt(u) = u' / (2 * sqrt(u))
            derivative: |args, primes| {
                div_opt(
                    primes[0].clone(),
                    Expr::mul_expr(Expr::number(2.0), func("sqrt", args[0].clone())),
                )
            },
            latex: r"\sqrt",
        },
        FunctionDefinition {
            name: "cbrt",
            arity: 1..=1,
            eval: |args| Some(args[0].cbrt()),
            // d/dx cbrt(u) = u' / (3 * cbrt(u)^2)
            derivative: |args, primes| {
                div_opt(
                    primes[0].clone(),
                    Expr::mul_expr(Expr::number(3.0), square(func("cbrt", args[0].clone()))),
                )
            },
            latex: r"\sqrt[3]",
        },
        // Piecewise
        FunctionDefinition {
            name: "abs",
            arity: 1..=1,
            eval: |args| Some(args[0].abs()),
            // d/dx |u| = sign(u) * u'
            derivative: |args, primes| mul_opt(func("sign", args[0].clone()), primes[0].clone()),
            latex: r"\left|",
        },
        FunctionDefinition {
            name: "sign",
            arity: 1..=1,
            eval: |args| {
                let x = args[0];
                Some(if x == 0.0 { 0.0 } else { x.signum() })
            },
            derivative: |_, _| Expr::number(0.0),
            latex: r"\operatorname{sign}",
        },
    ]
}
