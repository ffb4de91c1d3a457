use serde::Deserialize;
use std::{fmt, time::Duration};

const POKEAPI_BASE: &str = "https://pokeapi.co/api/v2";
const SPRITE_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/back";

/// Minimal catalog record returned by list queries. The `url` field encodes
/// the numeric entity id as its final non-empty path segment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntitySummary {
    pub name: String,
    pub url: String,
}

impl EntitySummary {
    /// Parses the numeric id out of the reference URL, e.g.
    /// `https://pokeapi.co/api/v2/pokemon/25/` -> `25`.
    pub fn id(&self) -> Option<u32> {
        self.url
            .split('/')
            .rev()
            .find(|segment| !segment.is_empty())?
            .parse()
            .ok()
    }

    pub fn sprite_url(&self) -> Option<String> {
        self.id().map(|id| format!("{SPRITE_BASE}/{id}.png"))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntityDetail {
    pub id: u32,
    pub name: String,
    pub height: u32,
    pub weight: u32,
    #[serde(default)]
    pub base_experience: Option<u32>,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatEntry {
    pub base_stat: u32,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedResource {
    pub name: String,
}

/// Failure at the catalog boundary. `Display` is deliberately generic so raw
/// transport/parse detail never reaches the UI; the cause stays reachable
/// through `Error::source` for debugging.
#[derive(Debug)]
pub enum CatalogError {
    Http(reqwest::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Http(_) => f.write_str("network request failed"),
            CatalogError::Parse(_) => f.write_str("could not decode catalog response"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Http(err) => Some(err),
            CatalogError::Parse(err) => Some(err),
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(value: reqwest::Error) -> Self {
        CatalogError::Http(value)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(value: serde_json::Error) -> Self {
        CatalogError::Parse(value)
    }
}

/// Remote catalog operations, injected into the paging core so tests can
/// substitute a scripted client.
pub trait CatalogClient {
    fn list_entities(
        &self,
        limit: u32,
        offset: u32,
    ) -> impl Future<Output = Result<Vec<EntitySummary>, CatalogError>> + Send;

    fn entity_detail(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<EntityDetail, CatalogError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<EntitySummary>,
}

#[derive(Clone)]
pub struct PokeApiClient {
    http: reqwest::Client,
}

impl PokeApiClient {
    pub fn new() -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .user_agent("pokedex-tui/0.1.0")
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http })
    }

    pub async fn fetch_sprite(&self, id: u32) -> Result<Vec<u8>, CatalogError> {
        let bytes = self
            .http
            .get(format!("{SPRITE_BASE}/{id}.png"))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

impl CatalogClient for PokeApiClient {
    async fn list_entities(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<EntitySummary>, CatalogError> {
        let response = self
            .http
            .get(format!("{POKEAPI_BASE}/pokemon"))
            .query(&[("limit", limit.to_string()), ("offset", offset.to_string())])
            .send()
            .await?
            .error_for_status()?;

        let payload: ListResponse = response.json().await?;
        Ok(payload.results)
    }

    async fn entity_detail(&self, name: &str) -> Result<EntityDetail, CatalogError> {
        let response = self
            .http
            .get(format!("{POKEAPI_BASE}/pokemon/{name}"))
            .send()
            .await?
            .error_for_status()?;

        // The detail payload carries far more than we render; go through a
        // Value so unknown fields never fail the decode.
        let payload: serde_json::Value = response.json().await?;
        let detail = serde_json::from_value(payload)?;
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_last_non_empty_path_segment() {
        let summary = EntitySummary {
            name: "pikachu".into(),
            url: "https://pokeapi.co/api/v2/pokemon/25/".into(),
        };
        assert_eq!(summary.id(), Some(25));
        assert_eq!(
            summary.sprite_url().as_deref(),
            Some("https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/back/25.png")
        );
    }

    #[test]
    fn id_handles_missing_trailing_slash_and_garbage() {
        let no_slash = EntitySummary {
            name: "bulbasaur".into(),
            url: "https://pokeapi.co/api/v2/pokemon/1".into(),
        };
        assert_eq!(no_slash.id(), Some(1));

        let garbage = EntitySummary {
            name: "missingno".into(),
            url: "https://pokeapi.co/api/v2/pokemon/not-a-number/".into(),
        };
        assert_eq!(garbage.id(), None);
        assert_eq!(garbage.sprite_url(), None);
    }

    #[test]
    fn detail_decodes_leniently() {
        let payload = serde_json::json!({
            "id": 25,
            "name": "pikachu",
            "height": 4,
            "weight": 60,
            "base_experience": 112,
            "types": [
                { "slot": 1, "type": { "name": "electric", "url": "..." } }
            ],
            "stats": [
                { "base_stat": 35, "effort": 0, "stat": { "name": "hp", "url": "..." } }
            ],
            "sprites": { "front_default": "ignored" },
            "moves": []
        });
        let detail: EntityDetail = serde_json::from_value(payload).unwrap();
        assert_eq!(detail.name, "pikachu");
        assert_eq!(detail.types[0].kind.name, "electric");
        assert_eq!(detail.stats[0].base_stat, 35);
    }

    #[test]
    fn catalog_error_display_is_generic() {
        let parse_err = serde_json::from_str::<ListResponse>("not json").unwrap_err();
        let err = CatalogError::from(parse_err);
        assert_eq!(err.to_string(), "could not decode catalog response");
    }
}
