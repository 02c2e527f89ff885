//! Seed data loading
//!
//! A seed file describes each brand (identity, ambassadors, events, products)
//! plus industry-wide trends. It is turned into graph triplets, brand notes and
//! shared trend notes, then written through a [`BrandMemorySystem`].

use crate::system::BrandMemorySystem;
use brandmem_core::{
    AttributeValue, Error, KGTriplet, MemoryNote, Namespace, NoteCategory, Result,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{info, warn};

pub const FOUNDING_SIGNIFICANCE: f64 = 1.0;
pub const PHILOSOPHY_SIGNIFICANCE: f64 = 1.0;
pub const AMBASSADOR_SIGNIFICANCE: f64 = 0.6;
pub const EVENT_SIGNIFICANCE: f64 = 0.7;
pub const TREND_SIGNIFICANCE: f64 = 0.8;

// ========== File format ==========

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub brands: BTreeMap<String, BrandSeed>,
    pub industry_context: IndustryContext,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrandSeed {
    pub identifiers: Identifiers,
    pub founding: Option<Founding>,
    pub philosophy: Option<Philosophy>,
    pub ambassador_history: Vec<Ambassador>,
    pub historical_events: Vec<HistoricalEvent>,
    pub products: BTreeMap<String, ProductSeed>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Identifiers {
    pub name_en: Option<String>,
    pub parent_company: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Founding {
    pub year: Option<Value>,
    pub historical_origin: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Philosophy {
    pub core_mission: Option<String>,
    pub brand_ethos: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Ambassador {
    pub name: Option<String>,
    pub period: Option<String>,
    pub significance: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoricalEvent {
    pub year: Option<Value>,
    pub event: Option<String>,
    pub significance: Option<String>,
    pub sales_impact: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductSeed {
    pub full_name: Option<String>,
    pub abv: Option<Value>,
    pub key_claim: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndustryContext {
    /// Period label to description
    pub trends_over_time: BTreeMap<String, String>,
}

// ========== Extraction ==========

/// Everything a seed file contributes
#[derive(Debug, Clone, Default)]
pub struct SeedBundle {
    pub triplets: Vec<KGTriplet>,
    pub brand_notes: Vec<MemoryNote>,
    /// Destined for the shared pool
    pub trend_notes: Vec<MemoryNote>,
}

/// What [`SeedBundle::apply`] wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub triplets: usize,
    pub brand_notes: usize,
    pub shared_notes: usize,
    /// Brand keys that are not configured namespaces
    pub skipped_brands: BTreeSet<String>,
}

impl SeedBundle {
    /// Read and extract a seed file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let bundle = Self::parse(&raw)?;
        info!(
            "Loaded seed {}: {} triplets, {} brand notes, {} trend notes",
            path.display(),
            bundle.triplets.len(),
            bundle.brand_notes.len(),
            bundle.trend_notes.len()
        );
        Ok(bundle)
    }

    /// Extract from seed JSON text
    pub fn parse(json: &str) -> Result<Self> {
        let file: SeedFile = serde_json::from_str(json)
            .map_err(|e| Error::Deserialization(format!("seed file: {}", e)))?;
        Ok(Self::from_seed(&file))
    }

    pub fn from_seed(file: &SeedFile) -> Self {
        let mut bundle = Self::default();
        for (key, brand) in &file.brands {
            let ns = Namespace::new(key.as_str());
            let name = brand
                .identifiers
                .name_en
                .clone()
                .unwrap_or_else(|| key.to_uppercase());
            bundle.triplets.extend(brand_triplets(&name, brand, &ns));
            bundle.brand_notes.extend(brand_notes(&name, brand, &ns));
        }

        bundle.trend_notes = file
            .industry_context
            .trends_over_time
            .iter()
            .map(|(period, description)| {
                MemoryNote::new(
                    format!("Liquor Industry Trend ({}): {}", period, description),
                    Namespace::shared(),
                    NoteCategory::Trend,
                )
                .with_tags(["trend", "industry", "history"])
                .with_significance(TREND_SIGNIFICANCE)
            })
            .collect();

        bundle
    }

    /// Write the bundle, skipping brands that aren't configured namespaces
    pub async fn apply(&self, memory: &BrandMemorySystem) -> Result<SeedReport> {
        let configured: BTreeSet<Namespace> =
            memory.config().brand_namespaces().into_iter().collect();
        let mut report = SeedReport::default();

        for triplet in &self.triplets {
            if configured.contains(&triplet.brand_namespace) {
                memory.add_triplet(triplet.clone()).await?;
                report.triplets += 1;
            } else {
                report.skipped_brands.insert(triplet.brand_namespace.to_string());
            }
        }

        for note in &self.brand_notes {
            if configured.contains(&note.brand_namespace) {
                memory.insert_note(note.clone()).await?;
                report.brand_notes += 1;
            } else {
                report.skipped_brands.insert(note.brand_namespace.to_string());
            }
        }

        for note in &self.trend_notes {
            memory.add_shared_note(note.clone()).await?;
            report.shared_notes += 1;
        }

        for brand in &report.skipped_brands {
            warn!("Skipped seed data for unconfigured brand '{}'", brand);
        }
        info!(
            "Seeded {} triplets, {} brand notes, {} shared notes",
            report.triplets, report.brand_notes, report.shared_notes
        );
        Ok(report)
    }
}

fn brand_triplets(name: &str, brand: &BrandSeed, ns: &Namespace) -> Vec<KGTriplet> {
    let mut triplets = Vec::new();

    if let Some(parent) = &brand.identifiers.parent_company {
        triplets.push(KGTriplet::new(name, "OWNED_BY", parent.as_str(), ns.clone()));
    }

    for model in &brand.ambassador_history {
        let Some(model_name) = &model.name else { continue };
        let mut t = KGTriplet::new(name, "HIRED_MODEL", model_name.as_str(), ns.clone());
        set_text(&mut t, "period", &model.period);
        set_text(&mut t, "significance", &model.significance);
        triplets.push(t);
    }

    for event in &brand.historical_events {
        let Some(event_name) = &event.event else { continue };
        let mut t = KGTriplet::new(name, "EXPERIENCED_EVENT", event_name.as_str(), ns.clone());
        set_value(&mut t, "year", &event.year);
        set_text(&mut t, "impact", &event.sales_impact);
        triplets.push(t);
    }

    for (key, product) in &brand.products {
        let product_name = product.full_name.as_deref().unwrap_or(key);
        let mut t = KGTriplet::new(name, "PRODUCES", product_name, ns.clone());
        set_value(&mut t, "abv", &product.abv);
        set_text(&mut t, "claim", &product.key_claim);
        triplets.push(t);
    }

    triplets
}

fn brand_notes(name: &str, brand: &BrandSeed, ns: &Namespace) -> Vec<MemoryNote> {
    let mut notes = Vec::new();

    if let Some(founding) = &brand.founding {
        notes.push(
            MemoryNote::new(
                format!(
                    "[{}] {} origins: {}",
                    scalar_text(&founding.year),
                    name,
                    text(&founding.historical_origin)
                ),
                ns.clone(),
                NoteCategory::BrandIdentity,
            )
            .with_tags(["founding", "history"])
            .with_keywords([name.to_lowercase(), "origin".to_string(), "year".to_string()])
            .with_significance(FOUNDING_SIGNIFICANCE),
        );
    }

    if let Some(philosophy) = &brand.philosophy {
        notes.push(
            MemoryNote::new(
                format!(
                    "{} mission: {}. Ethos: {}",
                    name,
                    text(&philosophy.core_mission),
                    text(&philosophy.brand_ethos)
                ),
                ns.clone(),
                NoteCategory::BrandIdentity,
            )
            .with_tags(["philosophy", "ethos"])
            .with_significance(PHILOSOPHY_SIGNIFICANCE),
        );
    }

    for model in &brand.ambassador_history {
        notes.push(
            MemoryNote::new(
                format!(
                    "{} model {} ({}): {}",
                    name,
                    text(&model.name),
                    text(&model.period),
                    text(&model.significance)
                ),
                ns.clone(),
                NoteCategory::Marketing,
            )
            .with_tags(["model", "ambassador", "marketing"])
            .with_significance(AMBASSADOR_SIGNIFICANCE),
        );
    }

    // Events are part of the brand's identity; there is no separate history category
    for event in &brand.historical_events {
        notes.push(
            MemoryNote::new(
                format!(
                    "Historical Event ({}): {} - {} Impact: {}",
                    scalar_text(&event.year),
                    text(&event.event),
                    text(&event.significance),
                    text(&event.sales_impact)
                ),
                ns.clone(),
                NoteCategory::BrandIdentity,
            )
            .with_tags(["event", "sales"])
            .with_significance(EVENT_SIGNIFICANCE),
        );
    }

    notes
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

fn scalar_text(value: &Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn set_text(triplet: &mut KGTriplet, key: &str, value: &Option<String>) {
    if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
        triplet.attributes.insert(key.to_string(), AttributeValue::from(v));
    }
}

fn set_value(triplet: &mut KGTriplet, key: &str, value: &Option<Value>) {
    if let Some(v) = value.as_ref().and_then(AttributeValue::from_json) {
        triplet.attributes.insert(key.to_string(), v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfig;

    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/seed_soju.json");

    fn bundle() -> SeedBundle {
        SeedBundle::load(FIXTURE).unwrap()
    }

    #[test]
    fn test_extraction_counts() {
        let b = bundle();
        assert_eq!(b.triplets.len(), 15);
        assert_eq!(b.brand_notes.len(), 14);
        assert_eq!(b.trend_notes.len(), 3);
    }

    #[test]
    fn test_triplets_cover_brands_and_predicates() {
        let b = bundle();
        let namespaces: BTreeSet<&str> = b.triplets.iter().map(|t| t.brand_namespace.as_str()).collect();
        assert_eq!(namespaces, BTreeSet::from(["chamisul", "chumchurum", "saero"]));

        let predicates: BTreeSet<&str> = b.triplets.iter().map(|t| t.predicate.as_str()).collect();
        assert_eq!(
            predicates,
            BTreeSet::from(["EXPERIENCED_EVENT", "HIRED_MODEL", "OWNED_BY", "PRODUCES"])
        );
    }

    #[test]
    fn test_triplet_attributes() {
        let b = bundle();
        let iu = b.triplets.iter().find(|t| t.object == "IU").unwrap();
        assert_eq!(iu.subject, "Chamisul");
        assert_eq!(iu.attributes["period"], AttributeValue::from("2014-2022"));

        let original = b.triplets.iter().find(|t| t.object == "Chamisul Original").unwrap();
        assert_eq!(original.attributes["abv"].as_float(), Some(20.1));
        assert_eq!(
            original.text(),
            "Chamisul → PRODUCES → Chamisul Original (abv=20.1, claim=Bamboo charcoal filtered)"
        );

        let retro = b.triplets.iter().find(|t| t.object == "Jinro Is Back retro relaunch").unwrap();
        assert_eq!(retro.attributes["year"], AttributeValue::from("2019"));
    }

    #[test]
    fn test_note_significance_and_categories() {
        let b = bundle();
        let founding = b
            .brand_notes
            .iter()
            .find(|n| n.content.starts_with("[1998] Chamisul origins:"))
            .unwrap();
        assert_eq!(founding.significance, 1.0);
        assert_eq!(founding.category, NoteCategory::BrandIdentity);
        assert_eq!(founding.keywords, vec!["chamisul", "origin", "year"]);

        let model = b.brand_notes.iter().find(|n| n.content.contains("model IU")).unwrap();
        assert_eq!(model.significance, 0.6);
        assert_eq!(model.category, NoteCategory::Marketing);

        let event = b
            .brand_notes
            .iter()
            .find(|n| n.content.starts_with("Historical Event (2006): Chamisul Fresh launch"))
            .unwrap();
        assert_eq!(event.significance, 0.7);

        assert!(b.trend_notes.iter().all(|n| n.brand_namespace.is_shared()));
        assert!(b.trend_notes.iter().all(|n| n.significance == 0.8));
    }

    #[test]
    fn test_missing_sections_default() {
        let b = SeedBundle::parse(r#"{"brands": {"saero": {}}}"#).unwrap();
        assert!(b.triplets.is_empty());
        assert!(b.brand_notes.is_empty());
        assert!(b.trend_notes.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let err = SeedBundle::parse("{not json").unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }

    #[tokio::test]
    async fn test_apply_writes_everything() {
        let memory = BrandMemorySystem::in_memory(MemoryConfig::for_testing()).unwrap();
        let report = bundle().apply(&memory).await.unwrap();

        assert_eq!(report.triplets, 15);
        assert_eq!(report.brand_notes, 14);
        assert_eq!(report.shared_notes, 3);
        assert!(report.skipped_brands.is_empty());

        let stats = memory.stats(&Namespace::from("chamisul")).unwrap();
        assert_eq!(stats.notes_cached, 6);
        assert_eq!(stats.graph_triplets, 7);
        // Chamisul, HiteJinro, 2 models, 2 events, 2 products
        assert_eq!(stats.graph_entities, 8);
    }

    #[tokio::test]
    async fn test_apply_skips_unconfigured_brands() {
        let config = MemoryConfig::for_testing().namespaces(["chamisul"]);
        let memory = BrandMemorySystem::in_memory(config).unwrap();
        let report = bundle().apply(&memory).await.unwrap();

        assert_eq!(report.triplets, 7);
        assert_eq!(report.brand_notes, 6);
        assert_eq!(
            report.skipped_brands,
            BTreeSet::from(["chumchurum".to_string(), "saero".to_string()])
        );
        assert_eq!(memory.stats(&Namespace::from("saero")).unwrap().graph_triplets, 0);
    }
}
