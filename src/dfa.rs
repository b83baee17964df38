use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io::BufRead;

use tracing::warn;

use crate::alphabet::Alphabet;
use crate::math;

/// The bit of a [`Signature`] that marks a state as final.
pub const FINALITY_BIT: usize = 63;

/// A compact summary of a state: bit `i` (for `i < 63`) is set iff the state has an
/// outgoing transition on the symbol with alphabet index `i`, and bit 63 is set iff
/// the state is final. Signatures compare as plain unsigned integers. Two states with
/// different signatures differ in their defined symbols or in their finality, so
/// there is a string on which exactly one of them gets stuck or accepts; they can
/// never be language equivalent.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature(u64);

impl Signature {
    /// Sets the bit for the symbol with the given alphabet `index`.
    pub fn insert(&mut self, index: usize) {
        if index < 64 {
            self.0 |= 1 << index;
        } else {
            warn!("signature has no bit for index {index}");
        }
    }

    /// Sets the finality bit.
    pub fn set_final(&mut self) {
        self.0 |= 1 << FINALITY_BIT;
    }

    /// Returns true if the bit for the given symbol `index` is set.
    pub fn contains(&self, index: usize) -> bool {
        index < 64 && self.0 >> index & 1 == 1
    }

    /// Returns true if the finality bit is set.
    pub fn is_final(&self) -> bool {
        self.contains(FINALITY_BIT)
    }

    /// Gives the raw bitmask.
    pub fn bits(&self) -> u64 {
        self.0
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({:#018x})", self.0)
    }
}

/// A deterministic finite automaton over `char` symbols.
///
/// States are identified by dense indices; state `i` owns the `i`-th slot of the
/// signature vector and of the transition table. By construction an automaton always
/// has at least one state, the start state of a freshly created automaton is state 0.
/// Finality is tracked both in a set of state indices and in bit 63 of the state's
/// [`Signature`], the two are kept consistent by all operations.
///
/// Determinism is structural: a transition row maps each symbol to at most one
/// target, recording a second transition on the same symbol overwrites the first.
#[derive(Clone, Debug)]
pub struct Dfa {
    alphabet: Alphabet,
    signatures: Vec<Signature>,
    transitions: Vec<BTreeMap<char, usize>>,
    final_states: math::Set<usize>,
    start_state: usize,
    transition_count: usize,
}

impl Default for Dfa {
    fn default() -> Self {
        Self::new()
    }
}

impl Dfa {
    /// Creates an automaton with a single non-final state 0, which is the start
    /// state, and an empty default-bounded alphabet.
    pub fn new() -> Self {
        Self {
            alphabet: Alphabet::default(),
            signatures: vec![Signature::default()],
            transitions: vec![BTreeMap::new()],
            final_states: math::Set::default(),
            start_state: 0,
            transition_count: 0,
        }
    }

    /// Reads an automaton from a line-oriented tabular description. A line with a
    /// single integer token marks that state as final; a line with three tokens
    /// `source target symbol` records a transition, where `symbol` must be a single
    /// character. The source of the first transition line becomes the start state.
    /// Empty lines are skipped, tokens are separated by whitespace. A later
    /// transition from the same state on the same symbol overwrites the earlier one.
    ///
    /// Malformed lines are rejected with a [`ParseError`] naming the offending line.
    pub fn from_att<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let mut dfa = Self::new();
        let mut seen_transition = false;
        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(ParseError::Io)?;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                [] => {}
                [state] => {
                    let state = parse_state(state, number + 1)?;
                    dfa.enlarge(state);
                    dfa.mark_final(state);
                }
                [source, target, symbol] => {
                    let source = parse_state(source, number + 1)?;
                    let target = parse_state(target, number + 1)?;
                    let sym = parse_symbol(symbol, number + 1)?;
                    if !seen_transition {
                        seen_transition = true;
                        dfa.start_state = source;
                    }
                    dfa.enlarge(source.max(target));
                    dfa.add_transition(source, sym, target);
                }
                _ => {
                    return Err(ParseError::WrongTokenCount {
                        line: number + 1,
                        count: tokens.len(),
                    })
                }
            }
        }
        Ok(dfa)
    }

    /// Inserts `word` into the automaton: starting from the start state, existing
    /// transitions are followed and missing ones are created towards brand-new
    /// states. The state reached after the last symbol is marked final. Feeding a
    /// word list to this method builds a trie; common suffixes are not shared, it is
    /// [minimization](Self::minimize) that later collapses that redundancy.
    pub fn add_word<W: AsRef<str>>(&mut self, word: W) {
        let mut current = self.start_state;
        for sym in word.as_ref().chars() {
            if let Some(&target) = self.transitions[current].get(&sym) {
                current = target;
            } else {
                let target = self.signatures.len();
                if let Some(index) = self.alphabet.add(sym) {
                    self.signatures[current].insert(index);
                }
                self.transitions[current].insert(sym, target);
                self.signatures.push(Signature::default());
                self.transitions.push(BTreeMap::new());
                self.transition_count += 1;
                current = target;
            }
        }
        self.mark_final(current);
    }

    /// Runs the automaton on `word` from the start state. The word is accepted if
    /// every symbol has a defined transition and the last one leads into a final
    /// state; an undefined transition rejects immediately.
    pub fn accepts<W: AsRef<str>>(&self, word: W) -> bool {
        let mut current = self.start_state;
        for sym in word.as_ref().chars() {
            match self.transitions[current].get(&sym) {
                Some(&target) => current = target,
                None => return false,
            }
        }
        self.final_states.contains(&current)
    }

    /// The number of states.
    pub fn size(&self) -> usize {
        self.signatures.len()
    }

    /// The number of defined transitions.
    pub fn transition_count(&self) -> usize {
        self.transition_count
    }

    /// The number of final states.
    pub fn final_state_count(&self) -> usize {
        self.final_states.len()
    }

    /// The designated start state.
    pub fn start_state(&self) -> usize {
        self.start_state
    }

    /// Returns true if `state` is final.
    pub fn is_final(&self, state: usize) -> bool {
        self.final_states.contains(&state)
    }

    /// The signature of the given state.
    pub fn signature(&self, state: usize) -> Signature {
        self.signatures[state]
    }

    /// All signatures, indexed by state.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// The outgoing transitions of the given state, as a map from symbol to target.
    pub fn transitions_from(&self, state: usize) -> &BTreeMap<char, usize> {
        &self.transitions[state]
    }

    /// The alphabet that indexes the symbols of this automaton.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// An iterator over all state indices.
    pub fn state_indices(&self) -> std::ops::Range<usize> {
        0..self.size()
    }

    /// Swaps the automaton's entire content for the given one. This is the sole
    /// mutation point used by the minimization to install the reduced automaton.
    pub(crate) fn replace_with(
        &mut self,
        signatures: Vec<Signature>,
        transitions: Vec<BTreeMap<char, usize>>,
        final_states: math::Set<usize>,
        start_state: usize,
        transition_count: usize,
    ) {
        debug_assert_eq!(signatures.len(), transitions.len());
        debug_assert!(start_state < signatures.len());
        self.signatures = signatures;
        self.transitions = transitions;
        self.final_states = final_states;
        self.start_state = start_state;
        self.transition_count = transition_count;
    }

    /// Grows the signature and transition vectors to cover the state `index`.
    fn enlarge(&mut self, index: usize) {
        if index >= self.signatures.len() {
            self.signatures.resize(index + 1, Signature::default());
            self.transitions.resize(index + 1, BTreeMap::new());
        }
    }

    fn mark_final(&mut self, state: usize) {
        self.final_states.insert(state);
        self.signatures[state].set_final();
    }

    fn add_transition(&mut self, source: usize, sym: char, target: usize) {
        if let Some(index) = self.alphabet.add(sym) {
            self.signatures[source].insert(index);
        }
        if self.transitions[source].insert(sym, target).is_none() {
            self.transition_count += 1;
        }
    }
}

impl std::fmt::Display for Dfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "acceptor, {} states, {} transitions, {} final states",
            self.size(),
            self.transition_count,
            self.final_states.len()
        )
    }
}

impl TryFrom<&str> for Dfa {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_att(value.as_bytes())
    }
}

fn parse_state(token: &str, line: usize) -> Result<usize, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidStateIndex {
        line,
        token: token.to_string(),
    })
}

fn parse_symbol(token: &str, line: usize) -> Result<char, ParseError> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(sym), None) => Ok(sym),
        _ => Err(ParseError::InvalidSymbol {
            line,
            token: token.to_string(),
        }),
    }
}

/// Represents the types of errors that can occur when reading an automaton from its
/// tabular description.
#[derive(Debug)]
pub enum ParseError {
    /// A line could not be read from the underlying reader.
    Io(std::io::Error),
    /// A token in place of a state index was not a non-negative integer.
    InvalidStateIndex {
        /// The 1-based line the token appeared on.
        line: usize,
        /// The offending token.
        token: String,
    },
    /// The symbol of a transition line was not a single character.
    InvalidSymbol {
        /// The 1-based line the token appeared on.
        line: usize,
        /// The offending token.
        token: String,
    },
    /// A line had neither one nor three tokens.
    WrongTokenCount {
        /// The 1-based line number.
        line: usize,
        /// The number of tokens that were found.
        count: usize,
    },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Io(err) => write!(f, "could not read line: {err}"),
            ParseError::InvalidStateIndex { line, token } => {
                write!(f, "line {line}: {token:?} is not a state index")
            }
            ParseError::InvalidSymbol { line, token } => {
                write!(f, "line {line}: {token:?} is not a single-character symbol")
            }
            ParseError::WrongTokenCount { line, count } => {
                write!(f, "line {line}: expected one or three tokens, found {count}")
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(err) => Some(err),
            _ => None,
        }
    }
}
