//! In-memory triple set.

use crate::namespaces::rdf;
use crate::term::{Node, Term, Triple};
use sophia::api::term::{BnodeId, LanguageTag, SimpleTerm};
use sophia::api::MownStr;
use sophia::iri::IriRef;
use std::collections::BTreeSet;

/// An ordered set of triples.
///
/// Lookups are linear scans; metadata graphs hold a few hundred triples at
/// most.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    triples: BTreeSet<Triple>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    pub fn add(&mut self, subject: Node, predicate: impl Into<String>, object: impl Into<Term>) -> bool {
        self.insert(Triple::new(subject, predicate, object))
    }

    pub fn remove(&mut self, triple: &Triple) -> bool {
        self.triples.remove(triple)
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    /// Removes every `(subject, predicate, *)` triple.
    pub fn remove_objects(&mut self, subject: &Node, predicate: &str) {
        self.triples
            .retain(|t| !(t.subject == *subject && t.predicate == predicate));
    }

    pub fn objects<'a>(&'a self, subject: &Node, predicate: &str) -> impl Iterator<Item = &'a Term> + 'a {
        let subject = subject.clone();
        let predicate = predicate.to_string();
        self.triples
            .iter()
            .filter(move |t| t.subject == subject && t.predicate == predicate)
            .map(|t| &t.object)
    }

    pub fn value(&self, subject: &Node, predicate: &str) -> Option<&Term> {
        self.objects(subject, predicate).next()
    }

    pub fn predicate_objects<'a>(&'a self, subject: &Node) -> impl Iterator<Item = (&'a str, &'a Term)> + 'a {
        let subject = subject.clone();
        self.triples
            .iter()
            .filter(move |t| t.subject == subject)
            .map(|t| (t.predicate.as_str(), &t.object))
    }

    pub fn subjects<'a>(&'a self, predicate: &str, object: &Term) -> impl Iterator<Item = &'a Node> + 'a {
        let predicate = predicate.to_string();
        let object = object.clone();
        self.triples
            .iter()
            .filter(move |t| t.predicate == predicate && t.object == object)
            .map(|t| &t.subject)
    }

    pub fn subjects_of_type<'a>(&'a self, class: &str) -> impl Iterator<Item = &'a Node> + 'a {
        let class = Term::Iri(class.to_string());
        self.triples
            .iter()
            .filter(move |t| t.predicate == rdf::TYPE && t.object == class)
            .map(|t| &t.subject)
    }

    /// Objects reached from `subject` by following every segment of `path`.
    pub fn path_objects(&self, subject: &Node, path: &crate::PropertyPath) -> Vec<&Term> {
        let mut frontier = vec![subject.clone()];
        let mut reached = Vec::new();
        for (idx, predicate) in path.segments().iter().enumerate() {
            let last = idx + 1 == path.len();
            let mut next = Vec::new();
            for node in &frontier {
                for object in self.objects(node, predicate) {
                    if last {
                        reached.push(object);
                    } else if let Some(n) = object.as_node() {
                        next.push(n);
                    }
                }
            }
            frontier = next;
        }
        reached
    }

    pub fn rdf_type(&self, subject: &Node) -> Option<&str> {
        self.value(subject, rdf::TYPE).and_then(Term::as_iri)
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Triple>) {
        self.triples.extend(other);
    }

    /// Structural equality up to blank node relabeling, decided by Sophia.
    ///
    /// A graph holding a term Sophia rejects (malformed IRI, blank node
    /// label or language tag) is only isomorphic to an identical graph.
    pub fn is_isomorphic(&self, other: &Graph) -> bool {
        if self.len() != other.len() {
            return false;
        }
        match (self.to_sophia(), other.to_sophia()) {
            (Some(a), Some(b)) => matches!(sophia::isomorphism::isomorphic_graphs(&a, &b), Ok(true)),
            _ => self == other,
        }
    }

    fn to_sophia(&self) -> Option<Vec<[SimpleTerm<'_>; 3]>> {
        self.triples
            .iter()
            .map(|t| {
                Some([
                    sophia_node(&t.subject)?,
                    SimpleTerm::Iri(IriRef::new(MownStr::from(t.predicate.as_str())).ok()?),
                    sophia_term(&t.object)?,
                ])
            })
            .collect()
    }
}

fn sophia_node(node: &Node) -> Option<SimpleTerm<'_>> {
    match node {
        Node::Iri(iri) => Some(SimpleTerm::Iri(IriRef::new(MownStr::from(iri.as_str())).ok()?)),
        Node::Blank(label) => Some(SimpleTerm::BlankNode(BnodeId::new(MownStr::from(label.as_str())).ok()?)),
    }
}

fn sophia_term(term: &Term) -> Option<SimpleTerm<'_>> {
    match term {
        Term::Iri(iri) => Some(SimpleTerm::Iri(IriRef::new(MownStr::from(iri.as_str())).ok()?)),
        Term::Blank(label) => Some(SimpleTerm::BlankNode(BnodeId::new(MownStr::from(label.as_str())).ok()?)),
        Term::Literal(lit) => {
            let lexical = MownStr::from(lit.lexical.as_str());
            match &lit.language {
                Some(lang) => Some(SimpleTerm::LiteralLanguage(
                    lexical,
                    LanguageTag::new(MownStr::from(lang.as_str())).ok()?,
                )),
                None => Some(SimpleTerm::LiteralDatatype(
                    lexical,
                    IriRef::new(MownStr::from(lit.datatype.as_str())).ok()?,
                )),
            }
        }
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Graph {
    type Item = Triple;
    type IntoIter = std::collections::btree_set::IntoIter<Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.into_iter()
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = std::collections::btree_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Literal;

    fn ds() -> Node {
        Node::iri("urn:uuid:479fd670-32c5-4ade-a26d-0268b0ce5046")
    }

    #[test]
    fn isomorphism_ignores_blank_labels() {
        let mut a = Graph::new();
        a.add(ds(), "http://p/temporal", Term::Blank("x".into()));
        a.add(Node::Blank("x".into()), "http://p/start", Literal::plain("2020"));

        let mut b = Graph::new();
        b.add(ds(), "http://p/temporal", Term::Blank("y".into()));
        b.add(Node::Blank("y".into()), "http://p/start", Literal::plain("2020"));
        assert!(a.is_isomorphic(&b));

        b.add(Node::Blank("y".into()), "http://p/end", Literal::plain("2021"));
        assert!(!a.is_isomorphic(&b));
    }

    #[test]
    fn isomorphism_distinguishes_nested_values() {
        let mut a = Graph::new();
        a.add(ds(), "http://p/temporal", Term::Blank("x".into()));
        a.add(Node::Blank("x".into()), "http://p/start", Literal::plain("2020"));
        let mut b = Graph::new();
        b.add(ds(), "http://p/temporal", Term::Blank("x".into()));
        b.add(Node::Blank("x".into()), "http://p/start", Literal::plain("2019"));
        assert!(!a.is_isomorphic(&b));
    }

    #[test]
    fn isomorphism_counts_duplicate_blank_nodes() {
        let a_node = Node::Blank("a".into());
        let mut g1 = Graph::new();
        g1.add(ds(), "http://p/p", Term::Blank("a".into()));
        g1.add(a_node.clone(), "http://p/q", Literal::plain("1"));
        g1.add(ds(), "http://p/p", Term::Blank("b".into()));
        g1.add(Node::Blank("b".into()), "http://p/q", Literal::plain("1"));

        let mut g2 = Graph::new();
        g2.add(ds(), "http://p/p", Term::Blank("a".into()));
        g2.add(a_node, "http://p/q", Literal::plain("1"));
        g2.add(Node::Blank("c".into()), "http://p/r", Term::Blank("d".into()));
        g2.add(Node::Blank("d".into()), "http://p/r", Term::Blank("c".into()));

        assert_eq!(g1.len(), g2.len());
        assert!(!g1.is_isomorphic(&g2));
        assert!(!g2.is_isomorphic(&g1));
    }

    #[test]
    fn isomorphism_follows_blank_node_cycles() {
        let cycle = |x: &str, y: &str| {
            let mut g = Graph::new();
            g.add(Node::Blank(x.into()), "http://p/r", Term::Blank(y.into()));
            g.add(Node::Blank(y.into()), "http://p/r", Term::Blank(x.into()));
            g
        };
        assert!(cycle("c", "d").is_isomorphic(&cycle("e", "f")));

        let mut open = Graph::new();
        open.add(Node::Blank("e".into()), "http://p/r", Term::Blank("f".into()));
        open.add(Node::Blank("f".into()), "http://p/r", Term::Blank("g".into()));
        assert!(!cycle("c", "d").is_isomorphic(&open));
    }

    #[test]
    fn lookups_by_subject_and_predicate() {
        let mut g = Graph::new();
        g.add(ds(), rdf::TYPE, Term::iri("http://www.w3.org/ns/dcat#Dataset"));
        g.add(ds(), "http://p/kw", Literal::plain("a"));
        g.add(ds(), "http://p/kw", Literal::plain("b"));
        assert_eq!(g.objects(&ds(), "http://p/kw").count(), 2);
        assert_eq!(g.rdf_type(&ds()), Some("http://www.w3.org/ns/dcat#Dataset"));
        assert_eq!(g.subjects_of_type("http://www.w3.org/ns/dcat#Dataset").count(), 1);
        g.remove_objects(&ds(), "http://p/kw");
        assert_eq!(g.len(), 1);
    }
}
