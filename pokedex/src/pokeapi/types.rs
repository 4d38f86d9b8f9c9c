// PokeAPI response types, limited to the fields the catalog uses
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Index entry, as returned by `GET /pokemon?limit=N`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogEntry {
    pub name: String,
    /// Detail URL for this entry
    pub url: String,
}

/// Paginated index response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub next: Option<String>,
    pub results: Vec<CatalogEntry>,
}

/// Detail response from `GET /pokemon/{id}/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokemonDetail {
    #[serde(default)]
    pub name: Option<String>,
    pub sprites: Sprites,
    pub types: Vec<TypeSlot>,
    pub height: i64,
    pub weight: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: Option<OtherSprites>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork", default)]
    pub official_artwork: Option<Artwork>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Artwork {
    pub front_default: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSlot {
    #[serde(default)]
    pub slot: Option<u8>,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl PokemonDetail {
    /// Official artwork when available, else the default front sprite.
    pub fn image_url(&self) -> Option<&str> {
        self.sprites
            .other
            .as_ref()
            .and_then(|other| other.official_artwork.as_ref())
            .and_then(|art| art.front_default.as_deref())
            .or(self.sprites.front_default.as_deref())
    }

    /// Type names in slot order
    pub fn type_names(&self) -> Vec<String> {
        let mut slots: Vec<&TypeSlot> = self.types.iter().collect();
        slots.sort_by_key(|t| t.slot.unwrap_or(u8::MAX));
        slots.into_iter().map(|t| t.kind.name.clone()).collect()
    }
}
