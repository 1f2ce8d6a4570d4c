//! Overload resolution
//!
//! A candidate applies when its arity equals the argument count and every
//! argument is assignable to the matching parameter. Candidates rank by
//! how many arguments land in `any` parameters, then by the summed
//! conversion cost of the typed parameters. The lowest rank wins and a tie
//! at the lowest rank is ambiguous.

use std::sync::Arc;

use raya_meta::{ArgType, TypeRef, Value};

use crate::descriptor::MemberDescriptor;

/// Outcome of selecting among candidates
#[derive(Debug)]
pub(crate) enum Choice<'a> {
    /// A single best candidate
    Found(&'a Arc<MemberDescriptor>),
    /// No candidate accepts the arguments
    NoMatch,
    /// This many candidates tie at the best score
    Ambiguous(usize),
}

/// Rank of an applicable candidate. `any` parameters form their own tier,
/// so a typed parameter beats `any` however deep the class widening is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Score {
    untyped: u32,
    cost: u32,
}

/// Rank of passing `args` to `candidate`, or `None` when it does not apply
pub(crate) fn score(candidate: &MemberDescriptor, args: &[Value]) -> Option<Score> {
    let params = candidate.params();
    if params.len() != args.len() {
        return None;
    }
    params.iter().zip(args).try_fold(
        Score { untyped: 0, cost: 0 },
        |score, (param, arg)| match param {
            TypeRef::Any => Some(Score {
                untyped: score.untyped + 1,
                ..score
            }),
            _ => Some(Score {
                cost: score.cost.saturating_add(param.conversion_cost(arg)?),
                ..score
            }),
        },
    )
}

/// Pick the best candidate for `args`
pub(crate) fn select<'a>(
    candidates: impl IntoIterator<Item = &'a Arc<MemberDescriptor>>,
    args: &[Value],
) -> Choice<'a> {
    let mut best: Option<(Score, &'a Arc<MemberDescriptor>)> = None;
    let mut ties = 0usize;
    for candidate in candidates {
        let Some(cost) = score(candidate, args) else {
            continue;
        };
        match best {
            Some((best_cost, _)) if cost > best_cost => {}
            Some((best_cost, _)) if cost == best_cost => ties += 1,
            _ => {
                best = Some((cost, candidate));
                ties = 1;
            }
        }
    }
    match best {
        None => Choice::NoMatch,
        Some((_, winner)) if ties == 1 => Choice::Found(winner),
        Some(_) => Choice::Ambiguous(ties),
    }
}

/// Runtime argument types, used as part of invoker cache keys
pub(crate) fn signature(args: &[Value]) -> Vec<ArgType> {
    args.iter().map(Value::arg_type).collect()
}
