//! Operation Names
//!
//! Grammar: `VERB[:NAMESPACE[|NAMESPACE...]][:TARGET]`
//!
//! ```text
//! GET:ELEMENT:memory     read one element
//! SET:ELEMENT:memory     write one element
//! GET:ELEMENT:pages      look up a page by id
//! ```
//!
//! The verb must be known. Unknown namespace tokens are skipped, but if
//! namespaces were given and none of them is known the name is rejected.
//! An empty namespace segment (`GET::memory`) means no namespaces.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Base verb of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Set,
    Call,
    New,
    Remove,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Set => "SET",
            Verb::Call => "CALL",
            Verb::New => "NEW",
            Verb::Remove => "REMOVE",
        }
    }
}

impl FromStr for Verb {
    type Err = OperationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Verb::Get),
            "SET" => Ok(Verb::Set),
            "CALL" => Ok(Verb::Call),
            "NEW" => Ok(Verb::New),
            "REMOVE" => Ok(Verb::Remove),
            other => Err(OperationParseError::UnknownVerb(other.to_string())),
        }
    }
}

/// Namespace qualifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Property,
    Element,
    Method,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Property => "PROPERTY",
            Namespace::Element => "ELEMENT",
            Namespace::Method => "METHOD",
        }
    }

    fn parse(s: &str) -> Option<Namespace> {
        match s {
            "PROPERTY" => Some(Namespace::Property),
            "ELEMENT" => Some(Namespace::Element),
            "METHOD" => Some(Namespace::Method),
            _ => None,
        }
    }
}

/// Errors from parsing an operation name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationParseError {
    #[error("empty operation name")]
    Empty,

    #[error("unknown verb '{0}'")]
    UnknownVerb(String),

    #[error("no recognized namespace in '{0}'")]
    NoKnownNamespace(String),
}

/// Parsed operation name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operation {
    verb: Verb,
    namespaces: Vec<Namespace>,
    target: Option<String>,
}

impl Operation {
    pub fn new(verb: Verb) -> Self {
        Self {
            verb,
            namespaces: Vec::new(),
            target: None,
        }
    }

    /// Add namespace qualifiers
    pub fn with_namespaces(mut self, namespaces: impl IntoIterator<Item = Namespace>) -> Self {
        self.namespaces.extend(namespaces);
        self
    }

    /// Name the operation's target
    pub fn named(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn has_namespace(&self, namespace: Namespace) -> bool {
        self.namespaces.contains(&namespace)
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

impl FromStr for Operation {
    type Err = OperationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(OperationParseError::Empty);
        }

        let mut parts = s.splitn(3, ':');
        let verb: Verb = parts.next().unwrap_or_default().parse()?;
        let mut op = Operation::new(verb);

        if let Some(tokens) = parts.next().filter(|tokens| !tokens.is_empty()) {
            let namespaces: Vec<Namespace> =
                tokens.split('|').filter_map(Namespace::parse).collect();
            if namespaces.is_empty() {
                return Err(OperationParseError::NoKnownNamespace(tokens.to_string()));
            }
            op = op.with_namespaces(namespaces);
        }

        if let Some(target) = parts.next() {
            op = op.named(target);
        }

        Ok(op)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb.as_str())?;
        if !self.namespaces.is_empty() || self.target.is_some() {
            f.write_str(":")?;
            let names: Vec<&str> = self.namespaces.iter().map(Namespace::as_str).collect();
            f.write_str(&names.join("|"))?;
        }
        if let Some(target) = &self.target {
            write!(f, ":{}", target)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let op: Operation = "GET:ELEMENT:memory".parse().unwrap();
        assert_eq!(op.verb(), Verb::Get);
        assert_eq!(op.namespaces(), &[Namespace::Element]);
        assert_eq!(op.target(), Some("memory"));
        assert_eq!(op.to_string(), "GET:ELEMENT:memory");
    }

    #[test]
    fn test_parse_verb_only() {
        let op: Operation = "SET".parse().unwrap();
        assert_eq!(op.verb(), Verb::Set);
        assert!(op.namespaces().is_empty());
        assert_eq!(op.target(), None);
    }

    #[test]
    fn test_unknown_namespaces_skipped() {
        let op: Operation = "GET:BOGUS|ELEMENT|PROPERTY:pages".parse().unwrap();
        assert_eq!(op.namespaces(), &[Namespace::Element, Namespace::Property]);
        assert_eq!(op.target(), Some("pages"));
    }

    #[test]
    fn test_all_namespaces_unknown() {
        let err = "GET:BOGUS|WAT:memory".parse::<Operation>().unwrap_err();
        assert_eq!(err, OperationParseError::NoKnownNamespace("BOGUS|WAT".to_string()));
    }

    #[test]
    fn test_unknown_verb() {
        let err = "FROB:ELEMENT:memory".parse::<Operation>().unwrap_err();
        assert_eq!(err, OperationParseError::UnknownVerb("FROB".to_string()));
    }

    #[test]
    fn test_empty() {
        assert_eq!("".parse::<Operation>(), Err(OperationParseError::Empty));
    }

    #[test]
    fn test_target_may_contain_colon() {
        let op: Operation = "CALL:METHOD:a:b".parse().unwrap();
        assert_eq!(op.target(), Some("a:b"));
    }

    #[test]
    fn test_empty_namespace_segment() {
        let op: Operation = "GET::memory".parse().unwrap();
        assert!(op.namespaces().is_empty());
        assert_eq!(op.target(), Some("memory"));
    }

    #[test]
    fn test_display_parses_back() {
        let ops = [
            Operation::new(Verb::Get).named("memory"),
            Operation::new(Verb::Remove),
            Operation::new(Verb::New).with_namespaces([Namespace::Method]),
            Operation::new(Verb::Set)
                .with_namespaces([Namespace::Property, Namespace::Element])
                .named("memory"),
        ];
        for op in ops {
            let printed = op.to_string();
            assert_eq!(printed.parse::<Operation>(), Ok(op), "{}", printed);
        }
        assert_eq!(
            Operation::new(Verb::Get).named("memory").to_string(),
            "GET::memory"
        );
    }

    #[test]
    fn test_builder() {
        let op = Operation::new(Verb::Set)
            .with_namespaces([Namespace::Element])
            .named("memory");
        assert_eq!(op, "SET:ELEMENT:memory".parse().unwrap());
    }
}
