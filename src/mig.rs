use itertools::Itertools;

use crate::{Transform, TruthTable};

/// Identifier of a gate inside a [`Mig`].
///
/// Handles are only handed out by [`Mig::add_gate`], so a signal built from
/// one can never reference a gate that has not been appended yet. This makes
/// the "fanins only point backwards" invariant impossible to violate by
/// construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GateId(usize);

impl GateId {
    /// Returns the position of the gate in the gate list.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where a signal originates: a constant, a primary input or a gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    Constant(bool),
    Input(usize),
    Gate(GateId),
}

/// A possibly inverted reference to a constant, a primary input or a gate.
/// Inversion lives on the edge; there are no inverter gates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Signal {
    source: Source,
    negated: bool,
}

impl Signal {
    /// Creates a signal reading primary input `var`.
    pub fn input(var: usize) -> Signal {
        Signal {
            source: Source::Input(var),
            negated: false,
        }
    }

    /// Returns where the signal originates.
    pub fn source(self) -> Source {
        self.source
    }

    /// Returns true if the signal inverts its source.
    pub fn is_negated(self) -> bool {
        self.negated
    }
}

impl From<bool> for Signal {
    /// Creates a constant signal.
    fn from(value: bool) -> Signal {
        Signal {
            source: Source::Constant(value),
            negated: false,
        }
    }
}

impl From<GateId> for Signal {
    /// Creates a signal reading the output of a gate.
    fn from(gate: GateId) -> Signal {
        Signal {
            source: Source::Gate(gate),
            negated: false,
        }
    }
}

impl std::ops::Not for Signal {
    type Output = Signal;

    /// Inverts the signal. Constants are folded, so a constant signal never
    /// carries an inversion.
    fn not(self) -> Signal {
        match self.source {
            Source::Constant(value) => (!value).into(),
            _ => Signal {
                negated: !self.negated,
                ..self
            },
        }
    }
}

impl std::fmt::Display for Signal {
    /// Formats the signal as a literal: `x<i>` for inputs (1-based),
    /// `g<k>` for gates, `0`/`1` for constants, with `¬` for inversion.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.negated {
            write!(f, "¬")?;
        }
        match self.source {
            Source::Constant(value) => write!(f, "{}", u8::from(value)),
            Source::Input(var) => write!(f, "x{}", var + 1),
            Source::Gate(gate) => write!(f, "g{}", gate.0 + 1),
        }
    }
}

/// A majority-inverter graph: an append-only network of three-input
/// majority gates over a fixed set of primary inputs, with inversions
/// carried on the edges and a single designated output signal.
///
/// Gates are stored in construction order and may only reference constants,
/// primary inputs and earlier gates, so the graph is acyclic by
/// construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mig {
    n_vars: usize,
    gates: Vec<[Signal; 3]>,
    output: Signal,
}

impl Mig {
    /// Creates an empty graph over `n_vars` primary inputs whose output is
    /// the constant false.
    pub fn new(n_vars: usize) -> Mig {
        Mig {
            n_vars,
            gates: Vec::new(),
            output: false.into(),
        }
    }

    /// Returns the number of primary inputs.
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    /// Appends a majority gate over the three fanin signals and returns its
    /// handle.
    ///
    /// Panics if a fanin references an input outside the declared arity or a
    /// gate handle from a larger graph.
    pub fn add_gate(&mut self, fanins: [Signal; 3]) -> GateId {
        for fanin in &fanins {
            self.check_signal(*fanin);
        }
        self.gates.push(fanins);
        GateId(self.gates.len() - 1)
    }

    /// Designates the output of the graph.
    pub fn set_output(&mut self, output: Signal) {
        self.check_signal(output);
        self.output = output;
    }

    fn check_signal(&self, signal: Signal) {
        match signal.source {
            Source::Constant(_) => {}
            Source::Input(var) => {
                assert!(var < self.n_vars, "Input index {var} out of range.")
            }
            Source::Gate(gate) => assert!(
                gate.0 < self.gates.len(),
                "Gate handle does not belong to this graph."
            ),
        }
    }

    /// Returns the output signal.
    pub fn output(&self) -> Signal {
        self.output
    }

    /// Returns the fanins of a gate.
    pub fn gate(&self, gate: GateId) -> &[Signal; 3] {
        &self.gates[gate.0]
    }

    /// Returns the number of gates. Constants and plain wires have size 0.
    pub fn size(&self) -> usize {
        self.gates.len()
    }

    /// Returns the length of the longest chain of gates from any primary
    /// input or constant to the output.
    pub fn depth(&self) -> usize {
        let mut depths = Vec::with_capacity(self.gates.len());
        for fanins in &self.gates {
            let depth = 1 + fanins
                .iter()
                .map(|s| self.signal_depth(*s, &depths))
                .max()
                .unwrap();
            depths.push(depth);
        }
        self.signal_depth(self.output, &depths)
    }

    fn signal_depth(&self, signal: Signal, depths: &[usize]) -> usize {
        match signal.source {
            Source::Constant(_) | Source::Input(_) => 0,
            Source::Gate(gate) => depths[gate.0],
        }
    }

    /// Evaluates the graph under the given input assignment, folding each
    /// gate in construction order: a gate outputs true if at least two of
    /// its three polarity-adjusted fanins are true.
    pub fn evaluate(&self, assignment: &[bool]) -> bool {
        assert_eq!(
            assignment.len(),
            self.n_vars,
            "Assignment length does not match the number of inputs."
        );
        let mut values = Vec::with_capacity(self.gates.len());
        for fanins in &self.gates {
            let ones = fanins
                .iter()
                .filter(|s| self.signal_value(**s, assignment, &values))
                .count();
            values.push(ones >= 2);
        }
        self.signal_value(self.output, assignment, &values)
    }

    fn signal_value(&self, signal: Signal, assignment: &[bool], values: &[bool]) -> bool {
        let value = match signal.source {
            Source::Constant(value) => value,
            Source::Input(var) => assignment[var],
            Source::Gate(gate) => values[gate.0],
        };
        value ^ signal.negated
    }

    /// Rebuilds the complete truth table by evaluating every assignment.
    pub fn truth_table(&self) -> TruthTable {
        let rows = 1usize << self.n_vars;
        let value = (0..rows).fold(0u64, |acc, i| {
            let assignment = (0..self.n_vars).map(|j| (i >> j) & 1 == 1).collect_vec();
            (acc << 1) | u64::from(self.evaluate(&assignment))
        });
        TruthTable::from_value(value, self.n_vars)
    }

    /// Returns true if the graph computes exactly the given function.
    /// An approximate match is not valid.
    pub fn validate(&self, target: &TruthTable) -> bool {
        self.n_vars == target.n_vars() && self.truth_table() == *target
    }

    /// Returns the graph computing `t.apply(f)`, where `f` is the function
    /// this graph computes: primary input references are rewired through
    /// the transform's permutation and negation mask, and the output
    /// negation is folded into the output signal.
    pub fn transformed(&self, t: &Transform) -> Mig {
        assert_eq!(
            t.n_vars(),
            self.n_vars,
            "Transform and graph arities do not match."
        );
        let map = |signal: &Signal| match signal.source {
            Source::Input(var) => Signal {
                source: Source::Input(t.permutation()[var]),
                negated: signal.negated ^ t.input_negated(var),
            },
            _ => *signal,
        };
        let mut output = map(&self.output);
        if t.output_negated() {
            output = !output;
        }
        Mig {
            n_vars: self.n_vars,
            gates: self
                .gates
                .iter()
                .map(|fanins| [map(&fanins[0]), map(&fanins[1]), map(&fanins[2])])
                .collect(),
            output,
        }
    }
}

impl std::fmt::Display for Mig {
    /// Formats the graph in the class database shape: one `Gate <k>: MAJ(...)`
    /// line per gate followed by an `Output:` line, all 1-based.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (index, fanins) in self.gates.iter().enumerate() {
            writeln!(f, "Gate {}: MAJ({})", index + 1, fanins.iter().format(", "))?;
        }
        writeln!(f, "Output: {}", self.output)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tt(text: &str) -> TruthTable {
        TruthTable::parse(text).unwrap()
    }

    /// MAJ(0, x1, x2), i.e. the conjunction of the two inputs.
    fn and_gate() -> Mig {
        let mut mig = Mig::new(2);
        let g = mig.add_gate([false.into(), Signal::input(0), Signal::input(1)]);
        mig.set_output(g.into());
        mig
    }

    #[test]
    fn constant_graph() {
        let mut mig = Mig::new(2);
        mig.set_output(true.into());
        assert_eq!(mig.size(), 0);
        assert_eq!(mig.depth(), 0);
        assert_eq!(mig.truth_table(), tt("1111"));
    }

    #[test]
    fn wire_graph() {
        let mut mig = Mig::new(2);
        mig.set_output(!Signal::input(0));
        assert_eq!(mig.size(), 0);
        assert_eq!(mig.truth_table(), tt("1010"));
    }

    #[test]
    fn and_gate_truth_table() {
        let mig = and_gate();
        assert_eq!(mig.size(), 1);
        assert_eq!(mig.depth(), 1);
        assert!(mig.validate(&tt("0001")));
        assert!(!mig.validate(&tt("0111")));
    }

    #[test]
    fn or_from_negations() {
        // De Morgan: !MAJ(0, !x1, !x2) is the disjunction.
        let mut mig = Mig::new(2);
        let g = mig.add_gate([false.into(), !Signal::input(0), !Signal::input(1)]);
        mig.set_output(!Signal::from(g));
        assert!(mig.validate(&tt("0111")));
    }

    #[test]
    fn majority_of_three() {
        let mut mig = Mig::new(3);
        let g = mig.add_gate([Signal::input(0), Signal::input(1), Signal::input(2)]);
        mig.set_output(g.into());
        assert!(mig.validate(&tt("00010111")));
    }

    #[test]
    fn two_level_graph() {
        // MAJ(x1, x2, MAJ(0, x2, x3)): depth 2, size 2.
        let mut mig = Mig::new(3);
        let inner = mig.add_gate([false.into(), Signal::input(1), Signal::input(2)]);
        let outer = mig.add_gate([Signal::input(0), Signal::input(1), inner.into()]);
        mig.set_output(outer.into());
        assert_eq!(mig.size(), 2);
        assert_eq!(mig.depth(), 2);
        assert!(mig.validate(&mig.truth_table()));
    }

    #[test]
    fn display_format() {
        let mut mig = Mig::new(3);
        let inner = mig.add_gate([false.into(), Signal::input(1), !Signal::input(2)]);
        let outer = mig.add_gate([Signal::input(0), Signal::input(1), inner.into()]);
        mig.set_output(!Signal::from(outer));
        assert_eq!(
            mig.to_string(),
            "Gate 1: MAJ(0, x2, ¬x3)\nGate 2: MAJ(x1, x2, g1)\nOutput: ¬g2\n"
        );
    }

    #[test]
    fn constant_inversion_is_folded() {
        assert_eq!(!Signal::from(false), Signal::from(true));
        assert_eq!((!Signal::from(true)).to_string(), "0");
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn rejects_out_of_range_input() {
        let mut mig = Mig::new(2);
        mig.add_gate([false.into(), Signal::input(0), Signal::input(2)]);
    }

    mod transformed {
        use super::*;
        use crate::Transform;
        use pretty_assertions::assert_eq;

        #[test]
        fn matches_transformed_table() {
            let mig = and_gate();
            let f = mig.truth_table();
            for t in Transform::all(2) {
                let transformed = mig.transformed(&t);
                assert!(transformed.validate(&t.apply(&f)));
            }
        }

        #[test]
        fn output_negation_reaches_constant_outputs() {
            let mut mig = Mig::new(1);
            mig.set_output(false.into());
            let t = Transform::new(vec![0], 0, true);
            assert_eq!(mig.transformed(&t).truth_table(), tt("11"));
        }
    }
}
