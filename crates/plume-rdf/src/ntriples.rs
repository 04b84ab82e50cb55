//! Canonical N-Triples writer.
//!
//! Lines come out sorted (the graph is an ordered set), so two equal graphs
//! always serialize to the same text.

use crate::graph::Graph;

pub fn to_ntriples(graph: &Graph) -> String {
    let mut out = String::new();
    for triple in graph {
        out.push_str(&triple.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{Literal, Node, Term};

    #[test]
    fn writes_one_sorted_line_per_triple() {
        let mut g = Graph::new();
        g.add(Node::iri("http://e/b"), "http://p/x", Literal::plain("2"));
        g.add(Node::iri("http://e/a"), "http://p/x", Term::Blank("b0".into()));
        let nt = to_ntriples(&g);
        let lines: Vec<_> = nt.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "<http://e/a> <http://p/x> _:b0 .");
        assert_eq!(lines[1], "<http://e/b> <http://p/x> \"2\" .");
    }
}
