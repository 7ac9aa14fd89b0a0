use std::collections::HashMap;
use std::time::{Duration, Instant};

use itertools::Itertools;
use log::debug;

use crate::{mig::GateId, Mig, Signal, TruthTable};

/// The outcome of an exact synthesis run. The three cases are distinct on
/// purpose: a timeout can be retried with a larger budget, an exhausted gate
/// cap cannot.
#[derive(Clone, Debug)]
pub enum Synthesis {
    /// A minimum-size majority-inverter graph computing the target exactly.
    Realized(Mig),
    /// The time budget ran out before the current gate-count level finished.
    Timeout,
    /// Every gate count up to the cap was searched without a match.
    Infeasible,
}

impl Synthesis {
    /// Returns the synthesized graph, if any.
    pub fn realized(&self) -> Option<&Mig> {
        match self {
            Synthesis::Realized(mig) => Some(mig),
            Synthesis::Timeout | Synthesis::Infeasible => None,
        }
    }
}

/// A synthesis outcome together with the measured search time.
#[derive(Clone, Debug)]
pub struct Report {
    pub outcome: Synthesis,
    pub elapsed: Duration,
}

/// Exact synthesis of minimum-size majority-inverter graphs by iterative
/// deepening on the gate count.
///
/// At level `k`, all well-formed `k`-gate graphs are enumerated: each new
/// gate draws three distinct fanin sources, in strictly increasing order
/// under a fixed total order (constant, then primary inputs, then earlier
/// gates), with an independent polarity per fanin. Only the final gate is
/// checked against the target, so the first match is found at the smallest
/// feasible gate count. Enumeration order is fixed, which makes the result
/// deterministic.
#[derive(Clone, Debug)]
pub struct Synthesizer {
    gate_cap: usize,
    time_limit: Duration,
}

impl Default for Synthesizer {
    fn default() -> Synthesizer {
        Synthesizer {
            gate_cap: 8,
            time_limit: Duration::from_secs(60),
        }
    }
}

impl Synthesizer {
    pub fn new() -> Synthesizer {
        Synthesizer::default()
    }

    /// Sets the largest gate count to try before giving up with
    /// [`Synthesis::Infeasible`].
    pub fn with_gate_cap(mut self, gate_cap: usize) -> Synthesizer {
        self.gate_cap = gate_cap;
        self
    }

    /// Sets the time budget. The deadline is observed cooperatively: it is
    /// sampled between levels and periodically between candidate expansions,
    /// and the search unwinds itself with [`Synthesis::Timeout`].
    pub fn with_time_limit(mut self, time_limit: Duration) -> Synthesizer {
        self.time_limit = time_limit;
        self
    }

    /// Searches for a minimum-size graph computing `target` exactly.
    pub fn run(&self, target: &TruthTable) -> Report {
        let start = Instant::now();
        let outcome = self.search(target, start);
        Report {
            outcome,
            elapsed: start.elapsed(),
        }
    }

    fn search(&self, target: &TruthTable, start: Instant) -> Synthesis {
        let n_vars = target.n_vars();
        let support = target.support();
        // Constants and single variables need no gates at all.
        if support.is_empty() {
            let mut mig = Mig::new(n_vars);
            mig.set_output(target.row(0).into());
            return Synthesis::Realized(mig);
        }
        if let [var] = support[..] {
            let mut mig = Mig::new(n_vars);
            let positive = *target == TruthTable::variable(var, n_vars);
            let signal = Signal::input(var);
            mig.set_output(if positive { signal } else { !signal });
            return Synthesis::Realized(mig);
        }

        let deadline = start + self.time_limit;
        for gate_count in 1..=self.gate_cap {
            if Instant::now() >= deadline {
                return Synthesis::Timeout;
            }
            let mut search = Search::new(target, deadline);
            match search.extend(gate_count) {
                Ok(true) => return Synthesis::Realized(search.into_mig()),
                Ok(false) => {
                    debug!("No {gate_count}-gate realization of {target}, deepening.")
                }
                Err(Expired) => return Synthesis::Timeout,
            }
        }
        Synthesis::Infeasible
    }
}

/// Convenience wrapper around [`Synthesizer::run`] with the default gate cap.
pub fn synthesize_minimum(target: &TruthTable, time_limit: Duration) -> Synthesis {
    Synthesizer::new()
        .with_time_limit(time_limit)
        .run(target)
        .outcome
}

/// Signals that the deadline passed mid-search.
struct Expired;

/// One level of the iterative deepening search. Truth tables of candidate
/// gates are carried as bitmasks over the `2^n_vars` assignment rows, so a
/// majority gate is three bitwise operations.
struct Search {
    n_vars: usize,
    full: u64,
    target: u64,
    deadline: Instant,
    ticks: u32,
    /// Tables of the available fanin sources: index 0 is the constant
    /// false, followed by the primary inputs, followed by gates built so
    /// far at this level.
    source_tables: Vec<u64>,
    /// Gates built so far: fanin source indices and polarities.
    gates: Vec<([usize; 3], [bool; 3])>,
    /// Functions already realized by some source, in both polarities,
    /// scoped to this search. A gate recomputing one of them adds nothing,
    /// since every consumer can invert its edge.
    realized: HashMap<u64, usize>,
    output_negated: bool,
}

impl Search {
    fn new(target: &TruthTable, deadline: Instant) -> Search {
        let n_vars = target.n_vars();
        let rows = target.row_count();
        let full = if rows == 64 { u64::MAX } else { (1 << rows) - 1 };
        let mut source_tables = vec![0u64];
        for var in 0..n_vars {
            source_tables.push(table_mask(&TruthTable::variable(var, n_vars)));
        }
        let realized = source_tables
            .iter()
            .enumerate()
            .flat_map(|(index, &table)| [(table, index), (table ^ full, index)])
            .collect();
        Search {
            n_vars,
            full,
            target: table_mask(target),
            deadline,
            ticks: 0,
            source_tables,
            gates: Vec::new(),
            realized,
            output_negated: false,
        }
    }

    /// Adds `remaining` more gates in all canonical ways, checking the last
    /// one against the target. Returns whether a match was found; the
    /// matching graph is then left in `gates`.
    fn extend(&mut self, remaining: usize) -> Result<bool, Expired> {
        let source_count = self.source_tables.len();
        for (i, j, k) in (0..source_count).tuple_combinations() {
            for polarity in 0..8u32 {
                self.tick()?;
                let a = self.fanin_table(i, polarity & 1 != 0);
                let b = self.fanin_table(j, polarity & 2 != 0);
                let c = self.fanin_table(k, polarity & 4 != 0);
                let table = (a & b) | (a & c) | (b & c);
                let fanins = (
                    [i, j, k],
                    [polarity & 1 != 0, polarity & 2 != 0, polarity & 4 != 0],
                );
                if remaining == 1 {
                    if table == self.target || table == self.target ^ self.full {
                        self.output_negated = table != self.target;
                        self.gates.push(fanins);
                        return Ok(true);
                    }
                } else if !self.realized.contains_key(&table) {
                    let index = self.source_tables.len();
                    self.source_tables.push(table);
                    self.realized.insert(table, index);
                    self.realized.insert(table ^ self.full, index);
                    self.gates.push(fanins);
                    if self.extend(remaining - 1)? {
                        return Ok(true);
                    }
                    self.gates.pop();
                    self.realized.remove(&table);
                    self.realized.remove(&(table ^ self.full));
                    self.source_tables.pop();
                }
            }
        }
        Ok(false)
    }

    fn fanin_table(&self, source: usize, negated: bool) -> u64 {
        self.source_tables[source] ^ if negated { self.full } else { 0 }
    }

    fn tick(&mut self) -> Result<(), Expired> {
        self.ticks = self.ticks.wrapping_add(1);
        if self.ticks & 0x3ff == 0 && Instant::now() >= self.deadline {
            return Err(Expired);
        }
        Ok(())
    }

    /// Converts the found gate list into a graph, the last gate being the
    /// output.
    fn into_mig(self) -> Mig {
        let mut mig = Mig::new(self.n_vars);
        let mut handles: Vec<GateId> = Vec::with_capacity(self.gates.len());
        for (sources, polarities) in &self.gates {
            let signals = [0, 1, 2].map(|f| {
                let signal = self.source_signal(sources[f], &handles);
                if polarities[f] {
                    !signal
                } else {
                    signal
                }
            });
            handles.push(mig.add_gate(signals));
        }
        let output = Signal::from(*handles.last().unwrap());
        mig.set_output(if self.output_negated { !output } else { output });
        mig
    }

    fn source_signal(&self, source: usize, handles: &[GateId]) -> Signal {
        if source == 0 {
            false.into()
        } else if source <= self.n_vars {
            Signal::input(source - 1)
        } else {
            handles[source - self.n_vars - 1].into()
        }
    }
}

/// The table of `f` as a bitmask, bit `i` being row `i`.
fn table_mask(f: &TruthTable) -> u64 {
    (0..f.row_count()).fold(0, |acc, i| acc | (u64::from(f.row(i)) << i))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tt(text: &str) -> TruthTable {
        TruthTable::parse(text).unwrap()
    }

    fn synthesize(text: &str) -> Mig {
        let target = tt(text);
        match synthesize_minimum(&target, Duration::from_secs(60)) {
            Synthesis::Realized(mig) => {
                assert!(mig.validate(&target));
                mig
            }
            other => panic!("Expected a realization for {text}, got {other:?}"),
        }
    }

    #[test]
    fn constants_need_no_gates() {
        assert_eq!(synthesize("0000").size(), 0);
        assert_eq!(synthesize("1111").size(), 0);
        assert_eq!(synthesize("11111111").size(), 0);
    }

    #[test]
    fn single_variables_need_no_gates() {
        assert_eq!(synthesize("01").size(), 0);
        assert_eq!(synthesize("10").size(), 0);
        assert_eq!(synthesize("0011").size(), 0);
        assert_eq!(synthesize("1100").size(), 0);
        // A three-variable function depending on one variable only.
        assert_eq!(synthesize("01010101").size(), 0);
    }

    #[test]
    fn and_takes_one_gate() {
        let mig = synthesize("0001");
        assert_eq!(mig.size(), 1);
        assert_eq!(mig.to_string(), "Gate 1: MAJ(0, x1, x2)\nOutput: g1\n");
    }

    #[test]
    fn or_takes_one_gate() {
        let mig = synthesize("0111");
        assert_eq!(mig.size(), 1);
        assert_eq!(mig.to_string(), "Gate 1: MAJ(1, x1, x2)\nOutput: g1\n");
    }

    #[test]
    fn and_with_negated_input_takes_one_gate() {
        assert_eq!(synthesize("0100").size(), 1);
    }

    #[test]
    fn majority_takes_one_gate() {
        let mig = synthesize("00010111");
        assert_eq!(mig.size(), 1);
        assert_eq!(mig.to_string(), "Gate 1: MAJ(x1, x2, x3)\nOutput: g1\n");
    }

    #[test]
    fn xor_takes_three_gates() {
        // There is no one- or two-gate majority realization of parity.
        let mig = synthesize("0110");
        assert!(mig.size() > 1);
        assert_eq!(mig.size(), 3);
    }

    #[test]
    fn three_input_parity_takes_three_gates() {
        assert_eq!(synthesize("01101001").size(), 3);
    }

    #[test]
    fn all_two_variable_functions_are_minimal() {
        for target in TruthTable::all_functions(2) {
            let mig = match synthesize_minimum(&target, Duration::from_secs(60)) {
                Synthesis::Realized(mig) => mig,
                other => panic!("Expected a realization, got {other:?}"),
            };
            assert!(mig.validate(&target));
            let support = target.support();
            match support.len() {
                0 | 1 => assert_eq!(mig.size(), 0, "target {target}"),
                2 if target == tt("0110") || target == tt("1001") => {
                    assert_eq!(mig.size(), 3, "target {target}")
                }
                _ => assert_eq!(mig.size(), 1, "target {target}"),
            }
        }
    }

    #[test]
    fn zero_budget_times_out() {
        let outcome = synthesize_minimum(&tt("0110"), Duration::ZERO);
        assert!(matches!(outcome, Synthesis::Timeout));
    }

    #[test]
    fn exhausted_cap_is_infeasible() {
        let outcome = Synthesizer::new()
            .with_gate_cap(1)
            .run(&tt("0110"))
            .outcome;
        assert!(matches!(outcome, Synthesis::Infeasible));
    }

    #[test]
    fn shortcuts_ignore_the_budget() {
        // Support shortcuts do not even start the clocked search.
        let outcome = synthesize_minimum(&tt("0011"), Duration::ZERO);
        assert!(outcome.realized().is_some());
    }

    #[test]
    fn report_carries_elapsed_time() {
        let report = Synthesizer::new().run(&tt("0001"));
        assert!(report.outcome.realized().is_some());
        assert!(report.elapsed <= Duration::from_secs(60));
    }
}
