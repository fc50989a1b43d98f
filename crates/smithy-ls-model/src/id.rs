//! Shape identifiers: `namespace#name` with an optional `$member`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeIdError {
    #[error("shape id '{0}' has no namespace")]
    MissingNamespace(String),
    #[error("shape id '{0}' has an empty name")]
    EmptyName(String),
    #[error("shape id '{0}' has more than one '$'")]
    NestedMember(String),
}

/// An absolute shape id. Member ids use a single `$` separator; ids
/// with more than one are rejected outright.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId {
    namespace: String,
    name: String,
    member: Option<String>,
}

impl ShapeId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            member: None,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    /// The id without its member segment.
    pub fn container(&self) -> ShapeId {
        ShapeId {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            member: None,
        }
    }

    pub fn with_member(&self, member: impl Into<String>) -> ShapeId {
        ShapeId {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            member: Some(member.into()),
        }
    }

    pub fn is_member(&self) -> bool {
        self.member.is_some()
    }

    /// `namespace#name`, ignoring any member segment.
    pub fn absolute_name(&self) -> String {
        format!("{}#{}", self.namespace, self.name)
    }

    /// Whether `token` is syntactically usable as a shape id or a
    /// relative shape name.
    pub fn is_valid_token(token: &str) -> bool {
        !token.is_empty()
            && token.matches('#').count() <= 1
            && token.matches('$').count() <= 1
            && token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '#' | '$'))
            && token
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    }
}

impl FromStr for ShapeId {
    type Err = ShapeIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (namespace, rest) = value
            .split_once('#')
            .ok_or_else(|| ShapeIdError::MissingNamespace(value.to_string()))?;
        if namespace.is_empty() {
            return Err(ShapeIdError::MissingNamespace(value.to_string()));
        }
        let (name, member) = match rest.split_once('$') {
            Some((name, member)) => {
                if member.contains('$') {
                    return Err(ShapeIdError::NestedMember(value.to_string()));
                }
                (name, Some(member.to_string()))
            }
            None => (rest, None),
        };
        if name.is_empty() {
            return Err(ShapeIdError::EmptyName(value.to_string()));
        }
        Ok(ShapeId {
            namespace: namespace.to_string(),
            name: name.to_string(),
            member,
        })
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.namespace, self.name)?;
        if let Some(member) = &self.member {
            write!(f, "${member}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_id() {
        let id: ShapeId = "com.example#MyShape".parse().unwrap();
        assert_eq!(id.namespace(), "com.example");
        assert_eq!(id.name(), "MyShape");
        assert_eq!(id.member(), None);
    }

    #[test]
    fn parses_member_id() {
        let id: ShapeId = "com.example#MyShape$member".parse().unwrap();
        assert_eq!(id.member(), Some("member"));
        assert_eq!(id.container().to_string(), "com.example#MyShape");
    }

    #[test]
    fn rejects_relative_and_malformed_ids() {
        assert!("MyShape".parse::<ShapeId>().is_err());
        assert!("#Name".parse::<ShapeId>().is_err());
        assert!("com.example#".parse::<ShapeId>().is_err());
        assert_eq!(
            "com.a#S$m$n".parse::<ShapeId>(),
            Err(ShapeIdError::NestedMember("com.a#S$m$n".to_string()))
        );
    }

    #[test]
    fn token_validity() {
        assert!(ShapeId::is_valid_token("Foo"));
        assert!(ShapeId::is_valid_token("com.example#Foo$bar"));
        assert!(!ShapeId::is_valid_token(""));
        assert!(!ShapeId::is_valid_token("1Foo"));
        assert!(!ShapeId::is_valid_token("a#b#c"));
        assert!(!ShapeId::is_valid_token("a b"));
    }
}
