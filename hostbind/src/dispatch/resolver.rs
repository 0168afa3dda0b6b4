//! Main overload resolution algorithm.

use std::sync::Arc;

use tracing::debug;

use super::result::{AmbiguityError, NoMatchError, ResolutionError};
use super::signature::Dispatch;
use crate::callsite::TypeTag;
use crate::convert::{ConversionEngine, Distance, DistanceOracle};
use crate::member::{Capabilities, MemberDescriptor, OverloadSet};

/// A candidate that survived the applicability pass, with the distance of
/// every argument to its parameter.
#[derive(Debug, Clone)]
struct Scored {
    member: Arc<MemberDescriptor>,
    distances: Vec<Distance>,
}

/// Overload resolution context.
///
/// Resolution is a pure function of the overload set and the call shape, so
/// a resolver can be shared freely between threads.
pub struct OverloadResolver {
    /// Scores each argument against its declared parameter type.
    oracle: Arc<dyn DistanceOracle>,
}

impl Default for OverloadResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl OverloadResolver {
    /// Create a resolver scoring arguments with the conversion engine.
    pub fn new() -> Self {
        Self {
            oracle: Arc::new(ConversionEngine::new()),
        }
    }

    /// Create a resolver with a custom distance oracle.
    ///
    /// The oracle must use the same direction as [`Distance`]: higher is better
    /// and zero means inapplicable.
    pub fn with_oracle(oracle: Arc<dyn DistanceOracle>) -> Self {
        Self { oracle }
    }

    /// Resolve a call against an overload set.
    ///
    /// Given the dispatch kind and the argument tags, finds the single best
    /// member or returns an appropriate error.
    pub fn resolve(
        &self,
        set: &OverloadSet,
        dispatch: Dispatch,
        tags: &[TypeTag],
    ) -> Result<Arc<MemberDescriptor>, ResolutionError> {
        let argc = tags.len();

        // Pass 1 and 2: static context and arity
        let shaped: Vec<&Arc<MemberDescriptor>> = set
            .iter()
            .filter(|m| m.can_invoke() && m.is_static() == dispatch.is_static())
            .filter(|m| m.accepts_arity(argc))
            .collect();

        // Pass 3: applicability
        let mut applicable: Vec<Scored> = shaped
            .into_iter()
            .filter_map(|m| self.score(m, tags))
            .collect();
        debug!(
            member = set.name(),
            applicable = applicable.len(),
            "applicability pass"
        );

        // Pass 4: fixed arity beats variadic
        if applicable.iter().any(|c| !c.member.is_variadic()) {
            applicable.retain(|c| !c.member.is_variadic());
        }

        // Pass 5 and 6: closeness, then specificity
        let closest = self.eliminate_dominated(applicable);
        let mut maximal = self.eliminate_less_specific(closest, argc);
        debug!(member = set.name(), survivors = maximal.len(), "specificity pass");

        if maximal.len() > 1 {
            return Err(AmbiguityError {
                owner: set.owner().name().to_string(),
                member_name: set.name().to_string(),
                arg_tags: tags.to_vec(),
                candidates: maximal.into_iter().map(|c| c.member).collect(),
            }
            .into());
        }
        match maximal.pop() {
            Some(winner) => Ok(winner.member),
            None => Err(NoMatchError {
                owner: set.owner().name().to_string(),
                member_name: set.name().to_string(),
                arg_tags: tags.to_vec(),
                candidates: set.members().to_vec(),
            }
            .into()),
        }
    }

    /// Score every argument against a member's parameters.
    ///
    /// Returns `None` if any argument is inapplicable. Arguments in a
    /// variadic tail are scored against the element type.
    fn score(&self, member: &Arc<MemberDescriptor>, tags: &[TypeTag]) -> Option<Scored> {
        let mut distances = Vec::with_capacity(tags.len());
        for (position, tag) in tags.iter().enumerate() {
            let param = member.param_type_at(position)?;
            let distance = self.oracle.distance(tag, param);
            if !distance.is_applicable() {
                return None;
            }
            distances.push(distance);
        }
        Some(Scored {
            member: member.clone(),
            distances,
        })
    }

    /// Drop every candidate dominated on distance by another candidate.
    fn eliminate_dominated(&self, candidates: Vec<Scored>) -> Vec<Scored> {
        let keep: Vec<bool> = candidates
            .iter()
            .enumerate()
            .map(|(i, a)| {
                !candidates
                    .iter()
                    .enumerate()
                    .any(|(j, b)| i != j && dominates(b, a))
            })
            .collect();
        candidates
            .into_iter()
            .zip(keep)
            .filter_map(|(c, keep)| keep.then_some(c))
            .collect()
    }

    /// Drop every candidate that has a strictly more specific rival.
    fn eliminate_less_specific(&self, candidates: Vec<Scored>, argc: usize) -> Vec<Scored> {
        let keep: Vec<bool> = candidates
            .iter()
            .enumerate()
            .map(|(i, a)| {
                !candidates
                    .iter()
                    .enumerate()
                    .any(|(j, b)| i != j && self.is_more_specific(&b.member, &a.member, argc))
            })
            .collect();
        candidates
            .into_iter()
            .zip(keep)
            .filter_map(|(c, keep)| keep.then_some(c))
            .collect()
    }

    /// Check if `m1` is more specific than `m2` over the first `argc` positions.
    ///
    /// m1 is more specific than m2 if:
    /// - At every position, m2's declared type is assignable from m1's
    /// - At one position at least, m1's declared type is strictly narrower
    pub fn is_more_specific(&self, m1: &MemberDescriptor, m2: &MemberDescriptor, argc: usize) -> bool {
        let mut some_strictly = false;

        for position in 0..argc {
            let (Some(p1), Some(p2)) = (m1.param_type_at(position), m2.param_type_at(position)) else {
                return false;
            };
            if !p2.is_assignable_from(p1) {
                return false;
            }
            if !p1.is_assignable_from(p2) {
                some_strictly = true;
            }
        }

        some_strictly
    }
}

/// `b` dominates `a` if it is no worse at every position and better at one.
fn dominates(b: &Scored, a: &Scored) -> bool {
    let mut strictly = false;
    for (db, da) in b.distances.iter().zip(&a.distances) {
        if db < da {
            return false;
        }
        if db > da {
            strictly = true;
        }
    }
    strictly
}
