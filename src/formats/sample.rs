//! Author age samples and age brackets.

use serde::{Deserialize, Serialize};

use crate::error::{AuthorAgeError, Result};

/// One labelled document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthorAgeSample {
    /// Age bracket label, e.g. `25-34`.
    pub category: String,
    /// Exact age of the author when known.
    pub age: Option<u32>,
    /// The document text.
    pub text: String,
}

impl AuthorAgeSample {
    /// Create a sample labelled only with a category.
    pub fn with_category<C: Into<String>, T: Into<String>>(category: C, text: T) -> Self {
        Self {
            category: category.into(),
            age: None,
            text: text.into(),
        }
    }

    /// Create a sample with an exact age; the category comes from `brackets`.
    pub fn with_age<T: Into<String>>(age: u32, text: T, brackets: &AgeBrackets) -> Self {
        Self {
            category: brackets.category(age),
            age: Some(age),
            text: text.into(),
        }
    }
}

/// Age bracket boundaries used to derive categories from exact ages.
///
/// Each bound is the first age of a bracket. With the default bounds
/// `[18, 25, 35, 50, 65]` the categories are `xx-17`, `18-24`, `25-34`,
/// `35-49`, `50-64` and `65-xx`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBrackets {
    bounds: Vec<u32>,
}

impl Default for AgeBrackets {
    fn default() -> Self {
        Self {
            bounds: vec![18, 25, 35, 50, 65],
        }
    }
}

impl AgeBrackets {
    /// Create brackets from strictly increasing lower bounds.
    pub fn new(bounds: Vec<u32>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(AuthorAgeError::invalid_argument(
                "age brackets need at least one bound",
            ));
        }
        if bounds.windows(2).any(|pair| pair[0] >= pair[1]) || bounds[0] == 0 {
            return Err(AuthorAgeError::invalid_argument(
                "age bracket bounds must be positive and strictly increasing",
            ));
        }
        Ok(Self { bounds })
    }

    /// Category label of `age`.
    pub fn category(&self, age: u32) -> String {
        let below = self.bounds.iter().take_while(|&&bound| bound <= age).count();
        match below {
            0 => format!("xx-{}", self.bounds[0] - 1),
            n if n == self.bounds.len() => format!("{}-xx", self.bounds[n - 1]),
            n => format!("{}-{}", self.bounds[n - 1], self.bounds[n] - 1),
        }
    }

    /// Every category label, youngest first.
    pub fn categories(&self) -> Vec<String> {
        let mut labels = vec![self.category(0)];
        labels.extend(self.bounds.iter().map(|&bound| self.category(bound)));
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_brackets() {
        let brackets = AgeBrackets::default();
        assert_eq!(brackets.category(12), "xx-17");
        assert_eq!(brackets.category(18), "18-24");
        assert_eq!(brackets.category(24), "18-24");
        assert_eq!(brackets.category(40), "35-49");
        assert_eq!(brackets.category(65), "65-xx");
        assert_eq!(brackets.category(99), "65-xx");
        assert_eq!(
            brackets.categories(),
            vec!["xx-17", "18-24", "25-34", "35-49", "50-64", "65-xx"]
        );
    }

    #[test]
    fn test_invalid_brackets() {
        assert!(AgeBrackets::new(vec![]).is_err());
        assert!(AgeBrackets::new(vec![30, 20]).is_err());
        assert!(AgeBrackets::new(vec![0, 20]).is_err());
        assert!(AgeBrackets::new(vec![30]).is_ok());
    }

    #[test]
    fn test_sample_with_age() {
        let sample = AuthorAgeSample::with_age(30, "hello", &AgeBrackets::default());
        assert_eq!(sample.category, "25-34");
        assert_eq!(sample.age, Some(30));
    }
}
