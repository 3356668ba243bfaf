// Differentiation engine - applies calculus rules
//
// The inline checks (0 + x → x, 1 * x → x) keep intermediate trees small
// before the simplification engine runs over the result.

use rustc_hash::FxHashSet;

use crate::functions::registry::Registry;
use crate::functions::{func, mul_opt};
use crate::{DiffError, Expr, ExprKind};

fn add_opt(a: Expr, b: Expr) -> Expr {
    if a.is_zero_num() {
        b
    } else if b.is_zero_num() {
        a
    } else {
        Expr::add_expr(a, b)
    }
}

fn sub_opt(a: Expr, b: Expr) -> Expr {
    if b.is_zero_num() {
        a
    } else if a.is_zero_num() {
        Expr::mul_expr(Expr::number(-1.0), b)
    } else {
        Expr::sub_expr(a, b)
    }
}

impl Expr {
    /// Differentiate this expression with respect to a variable
    ///
    /// Symbols in `fixed_vars` are treated as constants. A variable that does
    /// not occur in the expression has derivative zero.
    pub(crate) fn derive(&self, var: &str, fixed_vars: &FxHashSet<String>) -> Result<Expr, DiffError> {
        let depends = |e: &Expr| e.contains_var(var) && !fixed_vars.contains(var);

        Ok(match &self.kind {
            ExprKind::Number(_) => Expr::number(0.0),

            ExprKind::Symbol(name) => {
                if name == var && !fixed_vars.contains(var) {
                    Expr::number(1.0)
                } else {
                    Expr::number(0.0)
                }
            }

            ExprKind::FunctionCall { name, args } => {
                if !depends(self) {
                    return Ok(Expr::number(0.0));
                }
                let def = Registry::get(name).ok_or_else(|| DiffError::UnknownFunction {
                    name: name.clone(),
                    span: None,
                })?;
                if !def.validate_arity(args.len()) {
                    return Err(DiffError::InvalidArity {
                        name: name.clone(),
                        expected: def.arity_description(),
                        got: args.len(),
                    });
                }
                let arg_primes = args
                    .iter()
                    .map(|arg| arg.derive(var, fixed_vars))
                    .collect::<Result<Vec<_>, _>>()?;
                (def.derivative)(args, &arg_primes)
            }

            // Sum rule: (u + v)' = u' + v'
            ExprKind::Add(u, v) => add_opt(u.derive(var, fixed_vars)?, v.derive(var, fixed_vars)?),

            // Subtraction rule: (u - v)' = u' - v'
            ExprKind::Sub(u, v) => sub_opt(u.derive(var, fixed_vars)?, v.derive(var, fixed_vars)?),

            // Product rule: (u * v)' = u' * v + u * v'
            ExprKind::Mul(u, v) => {
                let u_prime = u.derive(var, fixed_vars)?;
                let v_prime = v.derive(var, fixed_vars)?;
                add_opt(
                    mul_opt(u_prime, v.as_ref().clone()),
                    mul_opt(u.as_ref().clone(), v_prime),
                )
            }

            // Quotient rule: (u / v)' = (u' * v - u * v') / v^2
            ExprKind::Div(u, v) => {
                let u_prime = u.derive(var, fixed_vars)?;
                let v_prime = v.derive(var, fixed_vars)?;

                if v_prime.is_zero_num() {
                    // Constant denominator: u' / v
                    if u_prime.is_zero_num() {
                        Expr::number(0.0)
                    } else if v.is_one_num() {
                        u_prime
                    } else {
                        Expr::div_expr(u_prime, v.as_ref().clone())
                    }
                } else {
                    let numerator = sub_opt(
                        mul_opt(u_prime, v.as_ref().clone()),
                        mul_opt(u.as_ref().clone(), v_prime),
                    );
                    if numerator.is_zero_num() {
                        Expr::number(0.0)
                    } else {
                        Expr::div_expr(numerator, Expr::pow(v.as_ref().clone(), Expr::number(2.0)))
                    }
                }
            }

            ExprKind::Pow(u, v) => {
                let u_prime = u.derive(var, fixed_vars)?;

                if !depends(v) {
                    // Constant exponent: (u^n)' = n * u^(n-1) * u'
                    if u_prime.is_zero_num() {
                        return Ok(Expr::number(0.0));
                    }
                    match v.as_number() {
                        Some(n) if n == 0.0 => Expr::number(0.0),
                        Some(n) if n == 1.0 => u_prime,
                        Some(n) => {
                            let reduced = if n == 2.0 {
                                u.as_ref().clone()
                            } else {
                                Expr::pow(u.as_ref().clone(), Expr::number(n - 1.0))
                            };
                            mul_opt(Expr::mul_expr(Expr::number(n), reduced), u_prime)
                        }
                        None => {
                            let n_minus_1 = Expr::sub_expr(v.as_ref().clone(), Expr::number(1.0));
                            mul_opt(
                                Expr::mul_expr(
                                    v.as_ref().clone(),
                                    Expr::pow(u.as_ref().clone(), n_minus_1),
                                ),
                                u_prime,
                            )
                        }
                    }
                } else {
                    // Variable exponent, logarithmic differentiation:
                    // d/dx[u^v] = u^v * (v' * ln(u) + v * u'/u)
                    let v_prime = v.derive(var, fixed_vars)?;
                    let ln_u = if u.is_one_num() {
                        Expr::number(0.0)
                    } else {
                        func("ln", u.as_ref().clone())
                    };
                    let term1 = if ln_u.is_zero_num() {
                        Expr::number(0.0)
                    } else {
                        mul_opt(v_prime, ln_u)
                    };
                    let term2 = if u_prime.is_zero_num() {
                        Expr::number(0.0)
                    } else {
                        mul_opt(
                            v.as_ref().clone(),
                            Expr::div_expr(u_prime, u.as_ref().clone()),
                        )
                    };
                    let sum = add_opt(term1, term2);
                    mul_opt(Expr::pow(u.as_ref().clone(), v.as_ref().clone()), sum)
                }
            }
        })
    }
}
