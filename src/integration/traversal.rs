//! Integration-point traversal.
//!
//! Every operation that touches points (volume sums, state commit, packing,
//! persistence, mapping) goes through here so the visiting order is always
//! rule order, then point order within a rule.

use super::gauss_point::GaussPoint;
use super::rule::{RuleArena, RuleId};
use num_traits::Zero;

/// Position of a point within an element: rule handle plus 0-based index.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct IpRef {
    pub rule: RuleId,
    pub point: usize,
}

impl IpRef {
    pub fn new(rule: RuleId, point: usize) -> Self {
        Self { rule, point }
    }
}

/// Read-only traversal over the points of a [`RuleArena`].
#[derive(Copy, Clone, Debug)]
pub struct IpTraversal<'a> {
    rules: &'a RuleArena,
}

impl<'a> IpTraversal<'a> {
    pub fn new(rules: &'a RuleArena) -> Self {
        Self { rules }
    }

    /// Points in traversal order.
    pub fn iter(self) -> impl Iterator<Item = (IpRef, &'a GaussPoint)> + 'a {
        self.rules.iter().flat_map(|(id, r)| {
            r.points()
                .iter()
                .enumerate()
                .map(move |(i, gp)| (IpRef::new(id, i), gp))
        })
    }

    pub fn refs(self) -> impl Iterator<Item = IpRef> + 'a {
        self.iter().map(|(ip, _)| ip)
    }

    pub fn count(self) -> usize {
        self.iter().count()
    }

    pub fn for_each(self, mut f: impl FnMut(IpRef, &GaussPoint)) {
        for (ip, gp) in self.iter() {
            f(ip, gp);
        }
    }

    /// Stops at the first error.
    pub fn try_for_each<E>(
        self,
        mut f: impl FnMut(IpRef, &GaussPoint) -> Result<(), E>,
    ) -> Result<(), E> {
        for (ip, gp) in self.iter() {
            f(ip, gp)?;
        }
        Ok(())
    }

    pub fn fold<A>(self, init: A, mut f: impl FnMut(A, IpRef, &GaussPoint) -> A) -> A {
        self.iter().fold(init, |acc, (ip, gp)| f(acc, ip, gp))
    }

    pub fn try_fold<A, E>(
        self,
        init: A,
        mut f: impl FnMut(A, IpRef, &GaussPoint) -> Result<A, E>,
    ) -> Result<A, E> {
        let mut acc = init;
        for (ip, gp) in self.iter() {
            acc = f(acc, ip, gp)?;
        }
        Ok(acc)
    }

    /// Sum of a fallible per-point contribution.
    pub fn try_sum<T: Zero, E>(
        self,
        mut f: impl FnMut(IpRef, &GaussPoint) -> Result<T, E>,
    ) -> Result<T, E> {
        self.try_fold(T::zero(), |acc, ip, gp| Ok(acc + f(ip, gp)?))
    }

    /// Map every point in parallel; results keep traversal order.
    #[cfg(feature = "rayon")]
    pub fn par_map<R: Send>(self, f: impl Fn(IpRef, &GaussPoint) -> R + Sync) -> Vec<R> {
        use rayon::prelude::*;
        let items: Vec<(IpRef, &GaussPoint)> = self.iter().collect();
        items.into_par_iter().map(|(ip, gp)| f(ip, gp)).collect()
    }
}

/// Mutable visit of every point in traversal order.
pub fn for_each_ip_mut(rules: &mut RuleArena, mut f: impl FnMut(IpRef, &mut GaussPoint)) {
    for (id, rule) in rules.iter_mut() {
        for (i, gp) in rule.points_mut().iter_mut().enumerate() {
            f(IpRef::new(id, i), gp);
        }
    }
}

/// Fallible mutable visit; stops at the first error.
pub fn try_for_each_ip_mut<E>(
    rules: &mut RuleArena,
    mut f: impl FnMut(IpRef, &mut GaussPoint) -> Result<(), E>,
) -> Result<(), E> {
    for (id, rule) in rules.iter_mut() {
        for (i, gp) in rule.points_mut().iter_mut().enumerate() {
            f(IpRef::new(id, i), gp)?;
        }
    }
    Ok(())
}
