//! Library for building and minimizing deterministic finite automata (DFAs).
//!
//! A [`dfa::Dfa`] stores its states densely: state `i` owns the `i`-th entry of a
//! signature vector and of a transition table. The transition table maps a symbol to
//! the index of the target state, while the [`dfa::Signature`] is a 64 bit mask that
//! records which symbols have a defined outgoing transition (one bit per symbol index,
//! as handed out by the [`alphabet::Alphabet`]) together with the finality of the
//! state in bit 63. Two states with distinct signatures either differ in their defined
//! symbols or in their finality, so they can never accept the same language. This
//! makes the signature a cheap first discriminator during minimization: comparing two
//! masks as integers replaces a set comparison of the outgoing symbols.
//!
//! Automata can be built in three ways: [`dfa::Dfa::from_att`] reads a tabular
//! description where each line either marks a final state or lists a transition
//! triple, [`dfa::Dfa::add_word`] grows a trie branch per inserted word, and
//! [`dfa::Dfa::new`] gives the single-state automaton to start from. Minimization is
//! invoked through [`dfa::Dfa::minimize`] and rewrites the automaton in place into
//! the unique minimal acceptor of the same language. The algorithm is of the Hopcroft
//! family, but deliberately not the work-list variant: it repeats full
//! sort-and-rescan refinement passes over all states until the number of equivalence
//! classes reaches a fixpoint. See the [`minimization`] module for details.
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything,
/// i.e. `use hopcroft::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::Alphabet,
        dfa::{Dfa, ParseError, Signature},
        math,
    };
}

/// This module contains some definitions of mathematical objects which are used
/// throughout the crate and do not really fit to the top level.
pub mod math;

/// Module that contains the indexing of alphabet symbols.
pub mod alphabet;

/// Defines the automaton model itself, including tabular import and word insertion.
pub mod dfa;

/// Projection of an automaton into the graphviz dot format.
pub mod dot;

/// Contains the implementation of the minimization algorithm.
pub mod minimization;

#[cfg(test)]
mod tests {
    use crate::dfa::Dfa;

    pub fn wiki_dfa() -> Dfa {
        Dfa::try_from(
            "0\t1\ta\n\
             0\t2\tb\n\
             1\t0\ta\n\
             1\t3\tb\n\
             2\t4\ta\n\
             2\t5\tb\n\
             3\t4\ta\n\
             3\t5\tb\n\
             4\t4\ta\n\
             4\t5\tb\n\
             5\t5\ta\n\
             5\t5\tb\n\
             2\n\
             3\n\
             4",
        )
        .expect("table is well-formed")
    }

    #[test]
    fn wiki_dfa_shape() {
        let dfa = wiki_dfa();
        assert_eq!(dfa.size(), 6);
        assert_eq!(dfa.transition_count(), 12);
        assert_eq!(dfa.final_state_count(), 3);
        assert_eq!(dfa.start_state(), 0);
    }
}
