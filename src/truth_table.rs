use std::str::FromStr;

/// A boolean function of `n_vars` variables, stored as its complete truth table.
///
/// Row `i` holds the output for the input assignment given by the binary
/// expansion of `i`, least-significant bit first: bit `j` of `i` is the value
/// of variable `j`. All transforming operations return new tables; a
/// constructed table is never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TruthTable {
    bits: Vec<bool>,
    n_vars: usize,
}

impl TruthTable {
    /// Parses a truth table from a string of `'0'` and `'1'` characters,
    /// one per row.
    ///
    /// Fails if the length is not a power of two or if any other character
    /// occurs.
    pub fn parse(text: &str) -> Result<TruthTable, String> {
        if text.is_empty() || text.len() > 64 || !text.len().is_power_of_two() {
            return Err(format!(
                "Invalid truth table length {}, expected a power of two up to 64.",
                text.len()
            ));
        }
        let bits = text
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(format!("Invalid character '{c}' in truth table.")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TruthTable {
            n_vars: bits.len().trailing_zeros() as usize,
            bits,
        })
    }

    /// Creates the table of the constant function over `n_vars` variables.
    pub fn constant(value: bool, n_vars: usize) -> TruthTable {
        assert!(n_vars <= 6, "At most six variables are supported.");
        TruthTable {
            bits: vec![value; 1 << n_vars],
            n_vars,
        }
    }

    /// Creates the table of the projection onto variable `var`.
    pub fn variable(var: usize, n_vars: usize) -> TruthTable {
        assert!(n_vars <= 6, "At most six variables are supported.");
        assert!(var < n_vars, "Variable index {var} out of range.");
        TruthTable {
            bits: (0..1usize << n_vars).map(|i| (i >> var) & 1 == 1).collect(),
            n_vars,
        }
    }

    /// Creates a table from its integer value, the inverse of
    /// [`TruthTable::value`].
    pub fn from_value(value: u64, n_vars: usize) -> TruthTable {
        assert!(n_vars <= 6, "At most six variables are supported.");
        let rows = 1usize << n_vars;
        TruthTable {
            bits: (0..rows).map(|i| (value >> (rows - 1 - i)) & 1 == 1).collect(),
            n_vars,
        }
    }

    /// Returns every truth table of `n_vars` variables, in ascending order
    /// of their integer value.
    ///
    /// Panics for more than four variables, where the enumeration would be
    /// astronomically large anyway.
    pub fn all_functions(n_vars: usize) -> impl Iterator<Item = TruthTable> {
        assert!(
            n_vars <= 4,
            "Enumerating all functions is only supported up to four variables."
        );
        (0..1u64 << (1 << n_vars)).map(move |value| TruthTable::from_value(value, n_vars))
    }

    /// Returns the number of input variables.
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    /// Returns the number of rows, i.e. `2^n_vars`.
    pub fn row_count(&self) -> usize {
        self.bits.len()
    }

    /// Returns the output value of the row with the given index.
    pub fn row(&self, index: usize) -> bool {
        self.bits[index]
    }

    /// Returns the table read as an unsigned integer, row 0 being the most
    /// significant bit. Comparing values is the same as comparing the row
    /// strings lexicographically; this is the ordering used to select
    /// canonical representatives.
    pub fn value(&self) -> u64 {
        self.bits
            .iter()
            .fold(0, |acc, &b| (acc << 1) | u64::from(b))
    }

    /// Evaluates the function under the given input assignment.
    ///
    /// Panics if the assignment length does not match the number of variables.
    pub fn evaluate(&self, assignment: &[bool]) -> bool {
        assert_eq!(
            assignment.len(),
            self.n_vars,
            "Assignment length does not match the number of variables."
        );
        let index = assignment
            .iter()
            .enumerate()
            .fold(0, |acc, (j, &v)| acc | (usize::from(v) << j));
        self.bits[index]
    }

    /// Returns the sub-function obtained by fixing variable `var` to `value`.
    /// The remaining variables keep their relative order.
    pub fn cofactor(&self, var: usize, value: bool) -> TruthTable {
        assert!(var < self.n_vars, "Variable index {var} out of range.");
        let bits = (0..self.bits.len())
            .filter(|i| (i >> var) & 1 == usize::from(value))
            .map(|i| self.bits[i])
            .collect();
        TruthTable {
            bits,
            n_vars: self.n_vars - 1,
        }
    }

    /// Returns true if the function actually depends on variable `var`,
    /// i.e. if its two cofactors with respect to `var` differ.
    pub fn depends_on(&self, var: usize) -> bool {
        self.cofactor(var, false) != self.cofactor(var, true)
    }

    /// Returns the variables the function depends on. Empty for constants.
    pub fn support(&self) -> Vec<usize> {
        (0..self.n_vars).filter(|&v| self.depends_on(v)).collect()
    }
}

impl FromStr for TruthTable {
    type Err = String;

    fn from_str(text: &str) -> Result<TruthTable, String> {
        TruthTable::parse(text)
    }
}

impl std::ops::Not for &TruthTable {
    type Output = TruthTable;

    /// Complements the output of the function.
    fn not(self) -> TruthTable {
        TruthTable {
            bits: self.bits.iter().map(|b| !b).collect(),
            n_vars: self.n_vars,
        }
    }
}

impl std::fmt::Display for TruthTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for &b in &self.bits {
            write!(f, "{}", if b { '1' } else { '0' })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tt(text: &str) -> TruthTable {
        TruthTable::parse(text).unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(tt("0110").to_string(), "0110");
        assert_eq!(tt("0110").n_vars(), 2);
        assert_eq!(tt("01101001").n_vars(), 3);
        assert_eq!(tt("01").n_vars(), 1);
    }

    #[test]
    fn parse_rejects_bad_length() {
        assert!(TruthTable::parse("").is_err());
        assert!(TruthTable::parse("011").is_err());
        assert!(TruthTable::parse("01100").is_err());
    }

    #[test]
    fn parse_rejects_bad_characters() {
        assert!(TruthTable::parse("01x0").is_err());
        assert!(TruthTable::parse("2110").is_err());
    }

    #[test]
    fn value_matches_lexicographic_order() {
        assert_eq!(tt("0001").value(), 1);
        assert_eq!(tt("1000").value(), 8);
        assert_eq!(tt("0110").value(), 6);
        assert_eq!(TruthTable::from_value(6, 2), tt("0110"));
        assert_eq!(TruthTable::from_value(1, 2), tt("0001"));
    }

    #[test]
    fn evaluate_uses_bit_order() {
        // AND of two variables: only the all-ones row is true.
        let and = tt("0001");
        assert!(!and.evaluate(&[false, false]));
        assert!(!and.evaluate(&[true, false]));
        assert!(!and.evaluate(&[false, true]));
        assert!(and.evaluate(&[true, true]));
        // Projection onto variable 0: rows 1 and 3.
        let x0 = tt("0101");
        assert!(x0.evaluate(&[true, false]));
        assert!(!x0.evaluate(&[false, true]));
        assert_eq!(TruthTable::variable(0, 2), x0);
        assert_eq!(TruthTable::variable(1, 2), tt("0011"));
    }

    #[test]
    fn cofactors() {
        let maj = tt("00010111");
        assert_eq!(maj.cofactor(0, false), tt("0001"));
        assert_eq!(maj.cofactor(0, true), tt("0111"));
        assert_eq!(maj.cofactor(2, false), tt("0001"));
    }

    #[test]
    fn support_and_dependence() {
        assert_eq!(tt("0110").support(), vec![0, 1]);
        assert_eq!(tt("0000").support(), vec![]);
        assert_eq!(tt("1111").support(), vec![]);
        // "0011" is the projection onto variable 1.
        assert_eq!(tt("0011").support(), vec![1]);
        assert!(tt("0011").depends_on(1));
        assert!(!tt("0011").depends_on(0));
    }

    #[test]
    fn complement() {
        assert_eq!(!&tt("0110"), tt("1001"));
        assert_eq!(!&tt("0000"), tt("1111"));
    }

    #[test]
    fn all_functions_of_two_variables() {
        let all: Vec<_> = TruthTable::all_functions(2).collect();
        assert_eq!(all.len(), 16);
        assert_eq!(all[0], tt("0000"));
        assert_eq!(all[15], tt("1111"));
        assert_eq!(all[6], tt("0110"));
    }
}
