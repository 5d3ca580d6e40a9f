//! Filter simplification.
//!
//! This pass rewrites a filter into an equivalent, smaller one by:
//! - Folding Include/Exclude through AND, OR and NOT
//! - Eliminating double negation: NOT(NOT(x)) → x
//! - Flattening nested AND/OR and removing duplicate operands
//! - Collapsing single-operand AND/OR to the operand itself

use crate::filter::Filter;
use alloc::boxed::Box;
use alloc::vec::Vec;

/// Constant-folding simplifier for filters.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilterSimplifier;

impl FilterSimplifier {
    pub fn new() -> Self {
        Self
    }

    /// Returns an equivalent, simplified filter.
    pub fn simplify(&self, filter: Filter) -> Filter {
        match filter {
            Filter::And(operands) => self.simplify_and(operands),
            Filter::Or(operands) => self.simplify_or(operands),
            Filter::Not(inner) => {
                let simplified_inner = self.simplify(*inner);
                self.simplify_not(simplified_inner)
            }
            other => other,
        }
    }

    fn simplify_and(&self, operands: Vec<Filter>) -> Filter {
        let mut kept: Vec<Filter> = Vec::new();
        for operand in operands {
            match self.simplify(operand) {
                Filter::Include => {}
                Filter::Exclude => return Filter::Exclude,
                Filter::And(inner) => push_all_unique(&mut kept, inner),
                other => push_unique(&mut kept, other),
            }
        }
        match kept.len() {
            0 => Filter::Include,
            1 => kept.remove(0),
            _ => Filter::And(kept),
        }
    }

    fn simplify_or(&self, operands: Vec<Filter>) -> Filter {
        let mut kept: Vec<Filter> = Vec::new();
        for operand in operands {
            match self.simplify(operand) {
                Filter::Exclude => {}
                Filter::Include => return Filter::Include,
                Filter::Or(inner) => push_all_unique(&mut kept, inner),
                other => push_unique(&mut kept, other),
            }
        }
        match kept.len() {
            0 => Filter::Exclude,
            1 => kept.remove(0),
            _ => Filter::Or(kept),
        }
    }

    /// Simplifies NOT(inner) where `inner` is already simplified.
    fn simplify_not(&self, inner: Filter) -> Filter {
        match inner {
            Filter::Include => Filter::Exclude,
            Filter::Exclude => Filter::Include,
            Filter::Not(x) => *x,
            other => Filter::Not(Box::new(other)),
        }
    }
}

fn push_unique(kept: &mut Vec<Filter>, filter: Filter) {
    if !kept.contains(&filter) {
        kept.push(filter);
    }
}

fn push_all_unique(kept: &mut Vec<Filter>, filters: Vec<Filter>) {
    for f in filters {
        push_unique(kept, f);
    }
}
