//! Lookup of Danish companies in the CVR Elasticsearch distribution.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{config::CvrConfig, dto::shops::CompanyInfo, error::AppResult};

const INDEX: &str = "cvr-permanent";

#[async_trait]
pub trait CvrRegistry: Send + Sync {
    /// The active company registered under `cvr`, if exactly one matches.
    async fn lookup(&self, cvr: &str) -> AppResult<Option<CompanyInfo>>;
}

#[derive(Debug, Clone)]
pub struct ElasticCvrRegistry {
    http: reqwest::Client,
    config: CvrConfig,
}

impl ElasticCvrRegistry {
    pub fn new(http: reqwest::Client, config: CvrConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl CvrRegistry for ElasticCvrRegistry {
    async fn lookup(&self, cvr: &str) -> AppResult<Option<CompanyInfo>> {
        let url = format!("{}/{INDEX}/_search", self.config.url.trim_end_matches('/'));
        let response: SearchResponse = self
            .http
            .post(url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&search_body(cvr))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.single_company())
    }
}

/// Companies with status NORMAL whose status period is still open.
pub fn search_body(cvr: &str) -> Value {
    json!({
        "_source": ["Vrvirksomhed.virksomhedMetadata"],
        "query": {
            "bool": {
                "must": {
                    "nested": {
                        "path": "Vrvirksomhed.virksomhedsstatus",
                        "query": {
                            "bool": {
                                "must": [
                                    { "match": { "Vrvirksomhed.virksomhedsstatus.status": "NORMAL" } }
                                ],
                                "must_not": [
                                    { "exists": { "field": "Vrvirksomhed.virksomhedsstatus.periode.gyldigTil" } }
                                ]
                            }
                        }
                    }
                },
                "filter": {
                    "term": { "Vrvirksomhed.cvrNummer": cvr }
                }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    total: HitTotal,
    #[serde(default)]
    hits: Vec<Hit>,
}

/// Elasticsearch 6 reports a bare number, 7+ an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HitTotal {
    Count(u64),
    Detailed { value: u64 },
}

impl HitTotal {
    fn value(&self) -> u64 {
        match self {
            HitTotal::Count(value) | HitTotal::Detailed { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: Source,
}

#[derive(Debug, Deserialize)]
struct Source {
    #[serde(rename = "Vrvirksomhed")]
    company: Company,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Company {
    virksomhed_metadata: Metadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    nyeste_navn: LatestName,
    nyeste_beliggenhedsadresse: RegistryAddress,
}

#[derive(Debug, Deserialize)]
struct LatestName {
    navn: String,
}

/// Address block as the registry stores it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryAddress {
    pub vejnavn: Option<String>,
    pub husnummer_fra: Option<Value>,
    pub bogstav_fra: Option<String>,
    pub etage: Option<String>,
    pub sidedoer: Option<String>,
    pub husnummer_til: Option<Value>,
    pub bogstav_til: Option<String>,
    pub postdistrikt: Option<String>,
    pub postnummer: Option<Value>,
}

impl SearchResponse {
    fn single_company(self) -> Option<CompanyInfo> {
        if self.hits.total.value() != 1 {
            return None;
        }
        let metadata = self.hits.hits.into_iter().next()?.source.company.virksomhed_metadata;
        let address = &metadata.nyeste_beliggenhedsadresse;
        Some(CompanyInfo {
            name: metadata.nyeste_navn.navn.clone(),
            address: format_address(address),
            city: address.postdistrikt.clone().unwrap_or_default(),
            postcode: text(&address.postnummer).unwrap_or_default(),
        })
    }
}

/// `"<street> <from>[ <letter>][ <floor>.][ <door>][ - <to>][ <letter to>]"`
pub fn format_address(address: &RegistryAddress) -> String {
    let mut out = format!(
        "{} {}",
        address.vejnavn.as_deref().unwrap_or_default(),
        text(&address.husnummer_fra).unwrap_or_default()
    );
    if let Some(letter) = non_empty(&address.bogstav_fra) {
        out = format!("{out} {letter}");
    }
    if let Some(floor) = non_empty(&address.etage) {
        out = format!("{out} {floor}.");
    }
    if let Some(door) = non_empty(&address.sidedoer) {
        out = format!("{out} {door}");
    }
    if let Some(to) = text(&address.husnummer_til) {
        out = format!("{out} - {to}");
    }
    if let Some(letter) = non_empty(&address.bogstav_til) {
        out = format!("{out} {letter}");
    }
    out
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Registry numbers arrive either as JSON numbers or strings.
fn text(value: &Option<Value>) -> Option<String> {
    match value.as_ref()? {
        Value::Number(n) if n.as_i64() != Some(0) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
