use std::fmt;

use async_graphql::Enum;

/// Notification bus channels, one per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    User,
    Profile,
    Fish,
    Fly,
    River,
    Tackle,
    Trip,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Profile => "profile",
            Self::Fish => "fish",
            Self::Fly => "fly",
            Self::River => "river",
            Self::Tackle => "tackle",
            Self::Trip => "trip",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the record carried by a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum MutationKind {
    Created,
    Updated,
    Deleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_names_match_wire_names() {
        let topics = [
            Topic::User,
            Topic::Profile,
            Topic::Fish,
            Topic::Fly,
            Topic::River,
            Topic::Tackle,
            Topic::Trip,
        ];
        let names: Vec<&str> = topics.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, ["user", "profile", "fish", "fly", "river", "tackle", "trip"]);
        assert_eq!(Topic::Tackle.to_string(), "tackle");
    }
}
