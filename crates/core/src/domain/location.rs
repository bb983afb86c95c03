use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A fully resolved city lookup. All three parts are non-empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationQuery {
    city: String,
    state: String,
    country: String,
}

impl LocationQuery {
    pub fn new(
        city: impl Into<String>,
        state: impl Into<String>,
        country: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let query = Self { city: city.into(), state: state.into(), country: country.into() };
        for (field, value) in
            [("city", &query.city), ("state", &query.state), ("country", &query.country)]
        {
            if value.trim().is_empty() {
                return Err(DomainError::EmptyLocationField(field));
            }
        }
        Ok(query)
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn country(&self) -> &str {
        &self.country
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedLocation {
    Sf,
    Nyc,
    Seattle,
    La,
}

impl NamedLocation {
    pub fn query(self) -> LocationQuery {
        let (city, state, country) = match self {
            Self::Sf => ("San Francisco", "California", "USA"),
            Self::Nyc => ("New York City", "New York", "USA"),
            Self::Seattle => ("Seattle", "Washington", "USA"),
            Self::La => ("Los Angeles", "California", "USA"),
        };
        LocationQuery {
            city: city.to_owned(),
            state: state.to_owned(),
            country: country.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LocationQuery, NamedLocation};
    use crate::errors::DomainError;

    #[test]
    fn rejects_blank_location_parts() {
        let error = LocationQuery::new("Oakland", " ", "USA").expect_err("blank state");
        assert_eq!(error, DomainError::EmptyLocationField("state"));
    }

    #[test]
    fn named_locations_expand_to_full_queries() {
        let nyc = NamedLocation::Nyc.query();
        assert_eq!(nyc.city(), "New York City");
        assert_eq!(nyc.state(), "New York");
        assert_eq!(nyc.country(), "USA");

        assert_eq!(NamedLocation::La.query().city(), "Los Angeles");
    }
}
