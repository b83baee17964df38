use itertools::Itertools;

use crate::dfa::Dfa;

impl Dfa {
    /// Computes the graphviz representation of the automaton, for more information on
    /// the DOT format, see the [graphviz documentation](https://graphviz.org/doc/info/lang.html).
    ///
    /// Final states are drawn with doubled shapes and the start state as an octagon,
    /// so the start state gets a `doubleoctagon` when it is also final. Every defined
    /// transition becomes a labeled edge.
    pub fn dot_representation(&self) -> String {
        let header = [
            "digraph finite_state_machine {".to_string(),
            "rankdir=LR;".to_string(),
        ];

        let states = self.state_indices().map(|q| {
            let shape = match (self.is_final(q), q == self.start_state()) {
                (true, true) => "doubleoctagon",
                (true, false) => "doublecircle",
                (false, true) => "octagon",
                (false, false) => "circle",
            };
            format!("{q} [shape = {shape}, label = \"{q}\", fontsize = 12]")
        });

        let transitions = self.state_indices().flat_map(|q| {
            self.transitions_from(q)
                .iter()
                .map(move |(sym, target)| format!("{q} -> {target} [label = \"{sym}\"]"))
        });

        let mut lines = header
            .into_iter()
            .chain(states)
            .chain(transitions)
            .chain(std::iter::once("}".to_string()));
        lines.join("\n")
    }

    /// Writes the dot representation to the file at `path`.
    pub fn save_dot<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), std::io::Error> {
        std::fs::write(path, self.dot_representation())
    }

    /// Renders the automaton visually (as PNG) and returns a vec of bytes/u8s encoding
    /// the rendered image. This method is only available on the `graphviz` crate
    /// feature and requires the `dot` executable to be installed.
    #[cfg(feature = "graphviz")]
    pub fn render(&self) -> Result<Vec<u8>, std::io::Error> {
        use std::io::{Read, Write};

        use tracing::trace;
        let dot = self.dot_representation();
        trace!("writing dot representation\n{}", dot);

        let mut child = std::process::Command::new("dot")
            .arg("-Tpng")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(dot.as_bytes())?;
        }

        let mut output = Vec::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_end(&mut output)?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("dot process exited with status: {}", status),
            ));
        }

        Ok(output)
    }
}
