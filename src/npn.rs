use std::collections::HashSet;

use itertools::Itertools;

use crate::{Transform, TruthTable};

/// Returns the canonical representative of the NPN class of `f`: the table
/// of minimum integer value over the orbit of `f` under input permutation,
/// input negation and output negation.
///
/// The result is deterministic and identical for every member of the class.
/// Each call enumerates the full group, which is exponential in the arity;
/// class tables are meant to be computed once and cached, not
/// re-canonicalized per query.
pub fn representative(f: &TruthTable) -> TruthTable {
    representative_with_transform(f).0
}

/// Like [`representative`], but also returns the transform that maps `f`
/// onto the representative. Ties between transforms yielding the same
/// minimum are broken by enumeration order, so the returned transform is
/// deterministic as well.
pub fn representative_with_transform(f: &TruthTable) -> (TruthTable, Transform) {
    let mut best = f.clone();
    let mut best_transform = Transform::identity(f.n_vars());
    let mut best_value = f.value();
    for t in Transform::all(f.n_vars()) {
        let candidate = t.apply(f);
        if candidate.value() < best_value {
            best_value = candidate.value();
            best = candidate;
            best_transform = t;
        }
    }
    (best, best_transform)
}

/// Maps every function to its representative and deduplicates, returning
/// the distinct class representatives in ascending order of their value.
pub fn classes(functions: impl IntoIterator<Item = TruthTable>) -> Vec<TruthTable> {
    let mut seen = HashSet::new();
    let mut representatives = functions
        .into_iter()
        .map(|f| representative(&f))
        .filter(|r| seen.insert(r.clone()))
        .collect_vec();
    representatives.sort_by_key(TruthTable::value);
    representatives
}

/// Returns true if the two functions are NPN equivalent.
pub fn equivalent(f: &TruthTable, g: &TruthTable) -> bool {
    f.n_vars() == g.n_vars() && representative(f) == representative(g)
}

/// Returns true if exchanging variables `i` and `j` leaves `f` unchanged.
pub fn symmetric(f: &TruthTable, i: usize, j: usize) -> bool {
    Transform::swap(f.n_vars(), i, j).apply(f) == *f
}

/// Returns all pairs `(i, j)` with `i < j` of variables `f` is symmetric in.
pub fn symmetric_pairs(f: &TruthTable) -> Vec<(usize, usize)> {
    (0..f.n_vars())
        .tuple_combinations()
        .filter(|&(i, j)| symmetric(f, i, j))
        .collect()
}
