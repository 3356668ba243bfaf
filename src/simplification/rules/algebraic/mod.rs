use std::sync::Arc;

use crate::simplification::rules::Rule;

pub(crate) mod abs_sign;
pub(crate) mod combination;
pub(crate) mod powers;

/// Get all algebraic rules in priority order
pub(crate) fn get_algebraic_rules() -> Vec<Arc<dyn Rule + Send + Sync>> {
    vec![
        // Absolute value and sign rules
        Arc::new(abs_sign::AbsAbsRule),
        Arc::new(abs_sign::AbsNegRule),
        Arc::new(abs_sign::AbsPowEvenRule),
        Arc::new(abs_sign::AbsPositiveRule),
        Arc::new(abs_sign::SignPositiveRule),
        // Power rules
        Arc::new(powers::PowerPowerRule),
        Arc::new(powers::PowerOfProductRule),
        // Collection of like terms and factors
        Arc::new(combination::CombineFactorsRule),
        Arc::new(combination::CombineTermsRule),
    ]
}
