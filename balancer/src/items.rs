use std::collections::BTreeMap;
use std::fmt;

/// Weight used when a caller does not pick one.
pub const DEFAULT_WEIGHT: u32 = 1;

/// Candidate identifier to weight. Weight 0 keeps a candidate registered but
/// never selected.
pub type WeightedSet = BTreeMap<String, u32>;

/// Which shape of candidate set a strategy works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Ordered identifiers, duplicates allowed.
    Ordered,
    /// Unique identifiers with weights.
    Weighted,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Ordered => write!(f, "ordered"),
            Family::Weighted => write!(f, "weighted"),
        }
    }
}

/// A full candidate set, as accepted by `Balancer::update` and returned by
/// `Balancer::all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Items {
    Ordered(Vec<String>),
    Weighted(WeightedSet),
}

impl Items {
    pub fn family(&self) -> Family {
        match self {
            Items::Ordered(_) => Family::Ordered,
            Items::Weighted(_) => Family::Weighted,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Items::Ordered(items) => items.len(),
            Items::Weighted(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_ordered(&self) -> Option<&[String]> {
        match self {
            Items::Ordered(items) => Some(items.as_slice()),
            Items::Weighted(_) => None,
        }
    }

    pub fn as_weighted(&self) -> Option<&WeightedSet> {
        match self {
            Items::Weighted(items) => Some(items),
            Items::Ordered(_) => None,
        }
    }

    /// Parses `A:5,B:1,C` into a weighted set. A missing weight means
    /// `DEFAULT_WEIGHT`. Returns `None` on a malformed weight.
    pub fn parse_weighted(input: &str) -> Option<Self> {
        let mut items = WeightedSet::new();
        for entry in input.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, weight) = match entry.split_once(':') {
                Some((name, weight)) => (name.trim(), weight.trim().parse().ok()?),
                None => (entry, DEFAULT_WEIGHT),
            };
            items.insert(name.to_string(), weight);
        }
        Some(Items::Weighted(items))
    }

    /// Parses `A,B,C` into an ordered list. Weight suffixes are dropped.
    pub fn parse_ordered(input: &str) -> Self {
        Items::Ordered(
            input
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(|e| e.split(':').next().unwrap_or(e).trim().to_string())
                .collect(),
        )
    }
}

impl From<Vec<String>> for Items {
    fn from(items: Vec<String>) -> Self {
        Items::Ordered(items)
    }
}

impl From<Vec<&str>> for Items {
    fn from(items: Vec<&str>) -> Self {
        Items::Ordered(items.into_iter().map(String::from).collect())
    }
}

impl From<WeightedSet> for Items {
    fn from(items: WeightedSet) -> Self {
        Items::Weighted(items)
    }
}

impl<const N: usize> From<[(&str, u32); N]> for Items {
    fn from(items: [(&str, u32); N]) -> Self {
        Items::Weighted(
            items
                .into_iter()
                .map(|(item, weight)| (item.to_string(), weight))
                .collect(),
        )
    }
}
