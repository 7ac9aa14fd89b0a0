use itertools::Itertools;

use crate::TruthTable;

/// One element of the NPN transform group: a permutation of the input
/// variables, a negation mask over the inputs and an output negation.
///
/// Applied to a function `f`, the element produces `g` with
/// `g(x) = output_negation ^ f(w)` where `w_j = x_{permutation[j]} ^ mask_j`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transform {
    permutation: Vec<usize>,
    input_negation: u32,
    output_negation: bool,
}

impl Transform {
    /// Creates a transform from its parts.
    ///
    /// Panics if `permutation` is not a permutation of `0..permutation.len()`
    /// or if the negation mask uses bits beyond the permutation length.
    pub fn new(permutation: Vec<usize>, input_negation: u32, output_negation: bool) -> Transform {
        let n = permutation.len();
        let mut seen = vec![false; n];
        for &p in &permutation {
            assert!(p < n && !seen[p], "Not a permutation of 0..{n}.");
            seen[p] = true;
        }
        assert!(
            input_negation < 1 << n,
            "Negation mask uses more than {n} variables."
        );
        Transform {
            permutation,
            input_negation,
            output_negation,
        }
    }

    /// The identity transform on `n_vars` variables.
    pub fn identity(n_vars: usize) -> Transform {
        Transform {
            permutation: (0..n_vars).collect(),
            input_negation: 0,
            output_negation: false,
        }
    }

    /// The transposition of variables `i` and `j`, identity elsewhere.
    pub fn swap(n_vars: usize, i: usize, j: usize) -> Transform {
        assert!(i < n_vars && j < n_vars, "Variable index out of range.");
        let mut permutation: Vec<_> = (0..n_vars).collect();
        permutation.swap(i, j);
        Transform {
            permutation,
            input_negation: 0,
            output_negation: false,
        }
    }

    /// Enumerates the full group over `n_vars` variables lazily, in a fixed
    /// order: permutations lexicographically, crossed with binary-counted
    /// input negation masks, crossed with the output negation bit.
    ///
    /// The group has `n_vars! * 2^(n_vars + 1)` elements.
    pub fn all(n_vars: usize) -> impl Iterator<Item = Transform> {
        (0..n_vars).permutations(n_vars).flat_map(move |permutation| {
            (0..1u32 << n_vars).flat_map(move |input_negation| {
                let permutation = permutation.clone();
                [false, true].into_iter().map(move |output_negation| Transform {
                    permutation: permutation.clone(),
                    input_negation,
                    output_negation,
                })
            })
        })
    }

    /// Returns the number of variables the transform acts on.
    pub fn n_vars(&self) -> usize {
        self.permutation.len()
    }

    /// Returns the input permutation.
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Returns true if input `var` of the transformed function is negated.
    pub fn input_negated(&self, var: usize) -> bool {
        (self.input_negation >> var) & 1 == 1
    }

    /// Returns true if the output is negated.
    pub fn output_negated(&self) -> bool {
        self.output_negation
    }

    /// Applies the transform to a function, producing a new table.
    ///
    /// Panics if the arities do not match.
    pub fn apply(&self, f: &TruthTable) -> TruthTable {
        assert_eq!(
            f.n_vars(),
            self.n_vars(),
            "Transform and function arities do not match."
        );
        let n = self.n_vars();
        let rows = f.row_count();
        let value = (0..rows).fold(0u64, |acc, x| {
            let w = (0..n).fold(0usize, |w, j| {
                let bit = (x >> self.permutation[j]) & 1 == 1;
                w | (usize::from(bit ^ self.input_negated(j)) << j)
            });
            acc | (u64::from(f.row(w) ^ self.output_negation) << (rows - 1 - x))
        });
        TruthTable::from_value(value, n)
    }

    /// Returns the inverse group element, i.e. the transform that maps
    /// `self.apply(f)` back to `f`.
    pub fn inverse(&self) -> Transform {
        let n = self.n_vars();
        let mut permutation = vec![0; n];
        for (j, &p) in self.permutation.iter().enumerate() {
            permutation[p] = j;
        }
        let input_negation = (0..n).fold(0u32, |mask, i| {
            mask | (u32::from(self.input_negated(permutation[i])) << i)
        });
        Transform {
            permutation,
            input_negation,
            output_negation: self.output_negation,
        }
    }
}
