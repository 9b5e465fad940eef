//! Fetches a third-party phone spec page and turns it into a [`SpecRecord`].
//!
//! Lookups are anchored on the text of section headers and row labels rather than
//! on positional selectors, because the upstream markup is reshuffled between site
//! revisions. Every field degrades on its own: a missing section, row or element
//! leaves that field empty and the rest of the record is still returned. Only a
//! failed fetch fails the whole extraction.

use crate::domain::extract::rules::{Field, FieldRule, RowMatch, RULES, TITLE_SELECTORS};
use crate::domain::model::{NewPhone, SpecSheet};
use crate::error::{CoreError, CoreResult};
use crate::infra::http_fetch::PageFetcher;
use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;

/// Structured result of an extraction. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct SpecRecord {
    pub source_url: Option<String>,
    pub model_name: Option<String>,
    pub release_date: Option<String>,
    pub specs: SpecSheet,
}

impl SpecRecord {
    pub fn get(&self, field: Field) -> Option<&str> {
        let slot = match field {
            Field::Model => &self.model_name,
            Field::ReleaseDate => &self.release_date,
            Field::Dimensions => &self.specs.dimensions,
            Field::Weight => &self.specs.weight,
            Field::DisplaySize => &self.specs.display_size,
            Field::Os => &self.specs.os,
            Field::Chipset => &self.specs.chipset,
            Field::InternalMemory => &self.specs.internal_memory,
            Field::MainCamera => &self.specs.main_camera,
            Field::SelfieCamera => &self.specs.selfie_camera,
            Field::Battery => &self.specs.battery,
        };
        slot.as_deref()
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        let slot = match field {
            Field::Model => &mut self.model_name,
            Field::ReleaseDate => &mut self.release_date,
            Field::Dimensions => &mut self.specs.dimensions,
            Field::Weight => &mut self.specs.weight,
            Field::DisplaySize => &mut self.specs.display_size,
            Field::Os => &mut self.specs.os,
            Field::Chipset => &mut self.specs.chipset,
            Field::InternalMemory => &mut self.specs.internal_memory,
            Field::MainCamera => &mut self.specs.main_camera,
            Field::SelfieCamera => &mut self.specs.selfie_camera,
            Field::Battery => &mut self.specs.battery,
        };
        *slot = value;
    }

    /// Fields the page did not yield.
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    /// First word of the model name, which the spec pages use as the brand.
    pub fn brand_guess(&self) -> Option<String> {
        self.model_name
            .as_deref()
            .and_then(|m| m.split_whitespace().next())
            .map(str::to_string)
    }

    /// Catalog fields an admin would confirm before committing the phone.
    pub fn to_new_phone(&self) -> NewPhone {
        NewPhone {
            model_name: self.model_name.clone().unwrap_or_default(),
            brand: self.brand_guess().unwrap_or_default(),
            release_date: self.release_date.clone(),
        }
    }
}

/// Fetch + parse. Holds no state besides the fetcher.
#[derive(Clone)]
pub struct Extractor {
    fetcher: Arc<dyn PageFetcher>,
}

impl Extractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn extract(&self, url: &str) -> CoreResult<SpecRecord> {
        let url = validate_url(url)?;
        let html = self.fetcher.fetch(&url).await?;
        let mut record = parse_spec_page(&html);
        record.source_url = Some(url.clone());

        let missing = record.missing();
        if missing.is_empty() {
            info!(url = %url, "extracted all fields");
        } else {
            let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
            info!(url = %url, missing = ?names, "extracted partial record");
        }
        Ok(record)
    }
}

/// Accepts absolute http(s) URLs only.
pub fn validate_url(raw: &str) -> CoreResult<String> {
    let parsed = reqwest::Url::parse(raw.trim())
        .map_err(|e| CoreError::validation(format!("invalid url '{}': {}", raw, e)))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed.to_string()),
        _ => Err(CoreError::validation(format!(
            "url must be an absolute http(s) address, got '{}'",
            raw
        ))),
    }
}

/// Parses an already fetched page. Never fails; absent fields stay `None`.
pub fn parse_spec_page(html: &str) -> SpecRecord {
    let doc = Html::parse_document(html);
    let mut record = SpecRecord {
        model_name: extract_title(&doc),
        ..Default::default()
    };

    let sections = collect_sections(&doc);
    for rule in RULES {
        let value = extract_rule(&sections, rule);
        if value.is_none() {
            debug!(field = %rule.field, section = rule.section, "field not found");
        }
        record.set(rule.field, value);
    }
    record
}

/// One spec table: its header text and `(label, value)` rows in document order.
struct Section {
    header: String,
    rows: Vec<(Option<String>, String)>,
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn extract_title(doc: &Html) -> Option<String> {
    TITLE_SELECTORS.iter().find_map(|css| {
        let sel = selector(css)?;
        doc.select(&sel)
            .map(|el| el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" "))
            .find(|t| !t.is_empty())
    })
}

fn collect_sections(doc: &Html) -> Vec<Section> {
    let (Some(table_sel), Some(th_sel), Some(tr_sel), Some(td_sel)) =
        (selector("table"), selector("th"), selector("tr"), selector("td"))
    else {
        return Vec::new();
    };

    doc.select(&table_sel)
        .map(|table| {
            let header = table
                .select(&th_sel)
                .map(cell_text)
                .collect::<Vec<_>>()
                .join(" ");
            let rows = table
                .select(&tr_sel)
                .filter_map(|row| {
                    let cells: Vec<ElementRef> = row.select(&td_sel).collect();
                    let value = cells.last().map(|c| cell_text(*c))?;
                    let label = if cells.len() >= 2 {
                        Some(cell_text(cells[cells.len() - 2]))
                    } else {
                        None
                    };
                    Some((label, value))
                })
                .collect();
            Section { header, rows }
        })
        .collect()
}

fn extract_rule(sections: &[Section], rule: &FieldRule) -> Option<String> {
    let section_kw = rule.section.to_lowercase();
    sections
        .iter()
        .filter(|s| s.header.to_lowercase().contains(&section_kw))
        .find_map(|section| {
            let raw = match rule.row {
                RowMatch::First => section.rows.first().map(|(_, v)| v.as_str()),
                RowMatch::Label(kw) => {
                    let kw = kw.to_lowercase();
                    section
                        .rows
                        .iter()
                        .find(|(label, _)| {
                            label
                                .as_deref()
                                .map_or(false, |l| l.to_lowercase().contains(&kw))
                        })
                        .map(|(_, v)| v.as_str())
                }
            }?;
            rule.clean.apply(raw)
        })
}

/// Text content of a cell, with `<br>` turned into line breaks.
fn cell_text(el: ElementRef) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) if e.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    const PAGE: &str = include_str!("../../../tests/fixtures/phone_page.html");

    struct FixtureFetcher(&'static str);

    #[async_trait]
    impl PageFetcher for FixtureFetcher {
        async fn fetch(&self, _url: &str) -> CoreResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct DownFetcher;

    #[async_trait]
    impl PageFetcher for DownFetcher {
        async fn fetch(&self, url: &str) -> CoreResult<String> {
            Err(CoreError::Fetch(format!("timed out fetching {}", url)))
        }
    }

    #[test]
    fn full_page_yields_all_fields() {
        let record = parse_spec_page(PAGE);
        assert!(record.missing().is_empty(), "missing: {:?}", record.missing());
        assert_eq!(record.model_name.as_deref(), Some("Samsung Galaxy S21 5G"));
        assert_eq!(record.release_date.as_deref(), Some("2021, January 29"));
        assert_eq!(record.specs.dimensions.as_deref(), Some("151.7 x 71.2 x 7.9 mm"));
        assert_eq!(record.specs.weight.as_deref(), Some("169 g"));
        assert_eq!(record.specs.display_size.as_deref(), Some("6.2 inches"));
        assert_eq!(record.specs.os.as_deref(), Some("Android 11, up to Android 15, One UI 7"));
        assert_eq!(record.specs.chipset.as_deref(), Some("Exynos 2100 (5 nm)"));
        assert_eq!(
            record.specs.internal_memory.as_deref(),
            Some("128GB 8GB RAM, 256GB 8GB RAM")
        );
        assert_eq!(
            record.specs.main_camera.as_deref(),
            Some("12 MP, f/1.8, 26mm (wide)\n64 MP, f/2.0, 29mm (telephoto)\n12 MP, f/2.2, 13mm (ultrawide)")
        );
        assert_eq!(record.specs.selfie_camera.as_deref(), Some("10 MP"));
        assert_eq!(record.specs.battery.as_deref(), Some("Li-Ion 4000 mAh"));
        assert_eq!(record.brand_guess().as_deref(), Some("Samsung"));
    }

    #[test]
    fn missing_row_degrades_single_field() {
        let without_weight = PAGE.replace(
            r#"<tr><td class="ttl">Weight</td><td class="nfo">169 g (5.96 oz)</td></tr>"#,
            "",
        );
        assert_ne!(without_weight, PAGE, "fixture no longer contains the weight row");

        let record = parse_spec_page(&without_weight);
        assert_eq!(record.missing(), vec![Field::Weight]);
        assert_eq!(record.specs.dimensions.as_deref(), Some("151.7 x 71.2 x 7.9 mm"));
    }

    #[test]
    fn reordered_sections_still_match() {
        let html = r#"<html><body><h1>Acme One</h1>
            <table><tr><th>Battery</th><td class="ttl">Type</td><td>5000 mAh, removable</td></tr></table>
            <table><tr><th>Body</th><td>Weight</td><td>200 g (7.05 oz)</td></tr>
                   <tr><td>Dimensions</td><td>160 x 75 x 8 mm</td></tr></table>
            </body></html>"#;
        let record = parse_spec_page(html);
        assert_eq!(record.model_name.as_deref(), Some("Acme One"));
        assert_eq!(record.specs.battery.as_deref(), Some("5000 mAh"));
        assert_eq!(record.specs.weight.as_deref(), Some("200 g"));
        assert_eq!(record.specs.dimensions.as_deref(), Some("160 x 75 x 8 mm"));
        assert_eq!(record.specs.os, None);
    }

    #[test]
    fn garbage_yields_empty_record() {
        let record = parse_spec_page("<<<not html at all");
        assert_eq!(record.missing().len(), Field::ALL.len());
    }

    #[test]
    fn url_must_be_absolute_http() {
        assert!(validate_url("https://example.com/phone-1.php").is_ok());
        assert!(matches!(validate_url("ftp://example.com/x"), Err(CoreError::Validation(_))));
        assert!(matches!(validate_url("not a url"), Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn extract_sets_source_url() {
        let extractor = Extractor::new(Arc::new(FixtureFetcher(PAGE)));
        let record = extractor
            .extract("https://example.com/samsung_galaxy_s21_5g-10626.php")
            .await
            .unwrap();
        assert_eq!(
            record.source_url.as_deref(),
            Some("https://example.com/samsung_galaxy_s21_5g-10626.php")
        );
        assert!(record.missing().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_fails_whole_operation() {
        let extractor = Extractor::new(Arc::new(DownFetcher));
        let err = extractor.extract("https://example.com/x").await.unwrap_err();
        assert!(matches!(err, CoreError::Fetch(_)));
    }
}
