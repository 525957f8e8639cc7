use serde::{Deserialize, Serialize};

/// What a subscriber wants to hear about. Closed set, validated when the request body is
/// deserialized so unknown tags never reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interest {
    Attending,
    Vendor,
    Organising,
    Venue,
}

impl Interest {
    pub fn parse(interest: &str) -> Result<Interest, String> {
        match interest {
            "attending" => Ok(Interest::Attending),
            "vendor" => Ok(Interest::Vendor),
            "organising" => Ok(Interest::Organising),
            "venue" => Ok(Interest::Venue),
            _ => Err(format!("{} is not a valid interest", interest)),
        }
    }
}

impl AsRef<str> for Interest {
    fn as_ref(&self) -> &str {
        match self {
            Interest::Attending => "attending",
            Interest::Vendor => "vendor",
            Interest::Organising => "organising",
            Interest::Venue => "venue",
        }
    }
}

/// Duplicate-free interest tags, kept in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Interests(Vec<Interest>);

impl Interests {
    pub fn new(interests: impl IntoIterator<Item = Interest>) -> Self {
        let mut unique = Vec::new();

        for interest in interests {
            if !unique.contains(&interest) {
                unique.push(interest);
            }
        }

        Self(unique)
    }

    /// Rebuilds the tags from their stored text form.
    pub fn parse(raw: Vec<String>) -> Result<Interests, String> {
        let interests = raw
            .iter()
            .map(|interest| Interest::parse(interest))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(interests))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interest> {
        self.0.iter()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|i| i.as_ref().to_string()).collect()
    }
}

impl<'de> Deserialize<'de> for Interests {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let interests = Vec::<Interest>::deserialize(deserializer)?;

        Ok(Self::new(interests))
    }
}
