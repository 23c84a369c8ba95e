//! Directory queries over a routed restaurant set.
//!
//! Filtering always happens client-side; the remote API is never asked to
//! filter.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::models::Restaurant;

/// A cuisine or neighborhood filter; `"all"` disables filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Only(String),
}

impl Filter {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(value.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == value,
        }
    }

    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl FromStr for Filter {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(value))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(value) => f.write_str(value),
        }
    }
}

impl From<Option<String>> for Filter {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map_or(Self::All, Self::parse)
    }
}

pub fn find_by_id(restaurants: &[Restaurant], id: i64) -> Option<&Restaurant> {
    restaurants.iter().find(|restaurant| restaurant.id == id)
}

pub fn by_cuisine(restaurants: &[Restaurant], cuisine: &str) -> Vec<Restaurant> {
    restaurants
        .iter()
        .filter(|restaurant| restaurant.cuisine_type == cuisine)
        .cloned()
        .collect()
}

pub fn by_neighborhood(restaurants: &[Restaurant], neighborhood: &str) -> Vec<Restaurant> {
    restaurants
        .iter()
        .filter(|restaurant| restaurant.neighborhood == neighborhood)
        .cloned()
        .collect()
}

/// Apply both filters; an `All` filter leaves that dimension unfiltered.
pub fn by_cuisine_and_neighborhood(
    restaurants: &[Restaurant],
    cuisine: &Filter,
    neighborhood: &Filter,
) -> Vec<Restaurant> {
    restaurants
        .iter()
        .filter(|restaurant| cuisine.matches(&restaurant.cuisine_type))
        .filter(|restaurant| neighborhood.matches(&restaurant.neighborhood))
        .cloned()
        .collect()
}

/// Distinct neighborhoods in first-occurrence order.
pub fn neighborhoods(restaurants: &[Restaurant]) -> Vec<String> {
    distinct(restaurants.iter().map(|restaurant| restaurant.neighborhood.as_str()))
}

/// Distinct cuisines in first-occurrence order.
pub fn cuisines(restaurants: &[Restaurant]) -> Vec<String> {
    distinct(restaurants.iter().map(|restaurant| restaurant.cuisine_type.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !seen.iter().any(|existing| existing == value) {
            seen.push(value.to_string());
        }
    }
    seen
}
