//! Typed identifier wrappers.
//!
//! Sessions and background agents are addressed by opaque strings; the
//! newtypes below keep the two namespaces from being confused at call
//! sites without adding any runtime cost.

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a string as this id type.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(SessionId);
typed_id!(AgentId);

impl AgentId {
    /// The session a background agent's runs are recorded under.
    pub fn session_id(&self) -> SessionId {
        SessionId::new(format!("background:{}", self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_session_id_is_derived() {
        let agent = AgentId::new("watcher-1");
        assert_eq!(agent.session_id(), SessionId::new("background:watcher-1"));
    }

    #[test]
    fn display_matches_inner_string() {
        let session = SessionId::new("abc");
        assert_eq!(session.to_string(), "abc");
    }

    #[test]
    fn serde_is_transparent() {
        let agent = AgentId::new("a1");
        let json = serde_json::to_string(&agent).unwrap();
        assert_eq!(json, "\"a1\"");
        let back: AgentId = serde_json::from_str(&json).unwrap();
        assert_eq!(agent, back);
    }
}
