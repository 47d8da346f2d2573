use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::Serialize;

type Tiers = OrderedEntries<Vec<String>>;

/// Domain -> tier -> ordered prompts, kept in the order the catalog declares them.
/// Validated on load and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionCatalog {
    domains: OrderedEntries<Tiers>,
}

/// JSON object entries in document order. A repeated key keeps its first position
/// and takes the last value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderedEntries<V>(Vec<(String, V)>);

impl<V> OrderedEntries<V> {
    fn get(&self, key: &str) -> Option<&V> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.0.iter().map(|(name, value)| (name, value))
    }

    fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.iter().map(|(name, _)| name)
    }

    fn upsert(&mut self, key: String, value: V) {
        match self.0.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }
}

impl<V> FromIterator<(String, V)> for OrderedEntries<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut entries = Self(Vec::new());
        for (key, value) in iter {
            entries.upsert(key, value);
        }
        entries
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedEntries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = OrderedEntries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = OrderedEntries(Vec::with_capacity(map.size_hint().unwrap_or(0)));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    entries.upsert(key, value);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

const STANDARD_DOMAINS: [&str; 5] = [
    "Financial Services",
    "Healthcare",
    "Manufacturing",
    "Retail & E-commerce",
    "Education",
];

// `{domain}` is substituted with the domain name when the standard catalog is built.
const STANDARD_TIERS: [(&str, [&str; 5]); 5] = [
    (
        "Tier 1",
        [
            "Does leadership in your {domain} organisation have a shared understanding of what AI can deliver?",
            "Are the key business processes you would automate documented end to end?",
            "Is operational data captured digitally rather than on paper or in ad-hoc spreadsheets?",
            "Has budget been earmarked for an initial AI or analytics pilot?",
            "Are staff open to changing workflows when new tools are introduced?",
        ],
    ),
    (
        "Tier 2",
        [
            "Is your core {domain} data centralised in a system that teams can query?",
            "Do you track data quality issues and who owns fixing them?",
            "Have you identified at least three high-value AI use cases with measurable outcomes?",
            "Do you have in-house or contracted analytics talent available to projects?",
            "Are privacy and consent obligations for customer data clearly assigned?",
        ],
    ),
    (
        "Tier 3",
        [
            "Has an AI or machine learning model reached production in your {domain} operations?",
            "Are model results monitored against business KPIs after launch?",
            "Is there a repeatable process for moving a pilot into production?",
            "Do product and engineering teams share a roadmap for AI features?",
            "Are vendors and third-party AI services assessed for risk before adoption?",
        ],
    ),
    (
        "Tier 4",
        [
            "Do multiple {domain} business units run AI systems on shared data platforms?",
            "Is model retraining automated when data or performance drifts?",
            "Does a governance board review fairness, safety and regulatory exposure of AI systems?",
            "Are AI outcomes reported to the executive team alongside financial results?",
            "Do you measure the return on investment of each AI initiative?",
        ],
    ),
    (
        "Tier 5",
        [
            "Is AI a defining part of your {domain} strategy and customer proposition?",
            "Do you build proprietary models or datasets that competitors cannot easily replicate?",
            "Are employees across functions trained to design and use AI tools day to day?",
            "Do you contribute to industry standards, research or partnerships on responsible AI?",
            "Can new AI capabilities be launched across the organisation within weeks?",
        ],
    ),
];

impl QuestionCatalog {
    /// Built-in catalog covering the standard domains and five tiers.
    pub fn standard() -> Self {
        let domains = STANDARD_DOMAINS
            .iter()
            .map(|domain| {
                let tiers: Tiers = STANDARD_TIERS
                    .iter()
                    .map(|(tier, prompts)| {
                        let prompts: Vec<String> = prompts
                            .iter()
                            .map(|prompt| prompt.replace("{domain}", domain))
                            .collect();
                        (tier.to_string(), prompts)
                    })
                    .collect();
                (domain.to_string(), tiers)
            })
            .collect();

        Self { domains }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = File::open(path.as_ref()).map_err(|source| CatalogError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let domains: OrderedEntries<Tiers> = serde_json::from_reader(reader)?;
        Self::validated(domains)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let domains: OrderedEntries<Tiers> = serde_json::from_str(raw)?;
        Self::validated(domains)
    }

    fn validated(domains: OrderedEntries<Tiers>) -> Result<Self, CatalogError> {
        if domains.is_empty() {
            return Err(CatalogError::Empty);
        }

        for (domain, tiers) in domains.iter() {
            if tiers.is_empty() {
                return Err(CatalogError::DomainWithoutTiers(domain.clone()));
            }
            for (tier, prompts) in tiers.iter() {
                if prompts.iter().all(|prompt| prompt.trim().is_empty()) {
                    return Err(CatalogError::TierWithoutQuestions {
                        domain: domain.clone(),
                        tier: tier.clone(),
                    });
                }
            }
        }

        Ok(Self { domains })
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    pub fn tiers(&self, domain: &str) -> Result<impl Iterator<Item = &str>, CatalogError> {
        self.domains
            .get(domain)
            .map(|tiers| tiers.keys().map(String::as_str))
            .ok_or_else(|| CatalogError::UnknownDomain(domain.to_string()))
    }

    pub fn questions(&self, domain: &str, tier: &str) -> Result<&[String], CatalogError> {
        let tiers = self
            .domains
            .get(domain)
            .ok_or_else(|| CatalogError::UnknownDomain(domain.to_string()))?;
        tiers
            .get(tier)
            .map(Vec::as_slice)
            .ok_or_else(|| CatalogError::UnknownTier {
                domain: domain.to_string(),
                tier: tier.to_string(),
            })
    }

    pub fn summary(&self) -> Vec<CatalogDomainView> {
        self.domains
            .iter()
            .map(|(domain, tiers)| CatalogDomainView {
                domain: domain.clone(),
                tiers: tiers
                    .iter()
                    .map(|(tier, prompts)| CatalogTierView {
                        tier: tier.clone(),
                        question_count: prompts.len(),
                    })
                    .collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogDomainView {
    pub domain: String,
    pub tiers: Vec<CatalogTierView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogTierView {
    pub tier: String,
    pub question_count: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to read question catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("question catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question catalog contains no domains")]
    Empty,
    #[error("domain '{0}' has no tiers")]
    DomainWithoutTiers(String),
    #[error("domain '{domain}' tier '{tier}' has no questions")]
    TierWithoutQuestions { domain: String, tier: String },
    #[error("unknown domain '{0}'")]
    UnknownDomain(String),
    #[error("unknown tier '{tier}' for domain '{domain}'")]
    UnknownTier { domain: String, tier: String },
}
