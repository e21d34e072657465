use http::Method;

use super::route::Verb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiation {
    Match,
    WrongMethod,
}

/// Checks an inbound method against the verbs a matched route accepts.
pub fn negotiate(methods: &[Verb], method: &Method) -> Negotiation {
    if methods.iter().any(|verb| verb.is(method)) {
        Negotiation::Match
    } else {
        Negotiation::WrongMethod
    }
}

/// Value of the `Allow` header sent with a 405.
pub fn allow_header(methods: &[Verb]) -> String {
    methods
        .iter()
        .map(Verb::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
