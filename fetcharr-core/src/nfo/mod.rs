//! Kodi NFO read/write. No direct teacher precedent (`quick-xml` is in the
//! teacher's dependency table but unused in its own source); the spec
//! treats NFO XML syntax as a fixed external contract so the document
//! shape here is deliberately small — the fields every media type shares
//! plus a `uniqueid` list for provider cross-references — rather than a
//! byte-exact reproduction of Kodi's full schema.

use fetcharr_model::{EntityType, MediaItem, ProviderIds};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The root element Kodi expects for each entity type (§9 open question 2,
/// decided in `publish::naming`).
pub fn root_tag(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Movie => "movie",
        EntityType::Series => "tvshow",
        EntityType::Season => "season",
        EntityType::Episode => "episodedetails",
        EntityType::Artist => "artist",
        EntityType::Album => "album",
        EntityType::Track => "track",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniqueId {
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(rename = "$text")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NfoDocument {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, rename = "genre", skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, rename = "studio", skip_serializing_if = "Vec::is_empty")]
    pub studios: Vec<String>,
    #[serde(default, rename = "actor", skip_serializing_if = "Vec::is_empty")]
    pub actors: Vec<String>,
    #[serde(default, rename = "uniqueid", skip_serializing_if = "Vec::is_empty")]
    pub unique_ids: Vec<UniqueId>,
}

impl NfoDocument {
    /// §4.H step 2: built from current DB state, never from provider data
    /// directly — the database is the source of truth at publish time.
    pub fn from_media_item(item: &MediaItem) -> Self {
        let mut unique_ids = Vec::new();
        if let Some(tmdb) = &item.provider_ids.tmdb {
            unique_ids.push(UniqueId { kind: "tmdb".to_string(), value: tmdb.clone() });
        }
        if let Some(tvdb) = &item.provider_ids.tvdb {
            unique_ids.push(UniqueId { kind: "tvdb".to_string(), value: tvdb.clone() });
        }
        if let Some(imdb) = &item.provider_ids.imdb {
            unique_ids.push(UniqueId { kind: "imdb".to_string(), value: imdb.clone() });
        }
        if let Some(mb) = &item.provider_ids.musicbrainz {
            unique_ids.push(UniqueId { kind: "musicbrainz".to_string(), value: mb.clone() });
        }

        Self {
            title: item.title.clone(),
            year: item.year,
            plot: item.metadata.plot.clone(),
            tagline: item.metadata.tagline.clone(),
            runtime: item.metadata.runtime_minutes,
            rating: item.metadata.rating,
            genres: item.metadata.genres.clone(),
            studios: item.metadata.studios.clone(),
            actors: item.metadata.actors.clone(),
            unique_ids,
        }
    }

    pub fn provider_ids(&self) -> ProviderIds {
        let mut ids = ProviderIds::default();
        for unique_id in &self.unique_ids {
            match unique_id.kind.as_str() {
                "tmdb" => ids.tmdb = Some(unique_id.value.clone()),
                "tvdb" => ids.tvdb = Some(unique_id.value.clone()),
                "imdb" => ids.imdb = Some(unique_id.value.clone()),
                "musicbrainz" => ids.musicbrainz = Some(unique_id.value.clone()),
                _ => {}
            }
        }
        ids
    }
}

pub fn generate(entity_type: EntityType, doc: &NfoDocument) -> Result<String> {
    let body = quick_xml::se::to_string_with_root(root_tag(entity_type), doc)
        .map_err(|e| CoreError::Internal(format!("nfo serialization failed: {e}")))?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n{body}\n"))
}

pub fn parse(xml: &str) -> Result<NfoDocument> {
    quick_xml::de::from_str(xml).map_err(|e| CoreError::Validation(format!("malformed nfo: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetcharr_model::{LibraryId, MediaItem};

    #[test]
    fn generates_and_reparses_a_movie_nfo() {
        let mut item = MediaItem::new(LibraryId::new(), EntityType::Movie, "Example", "/movies/Example");
        item.year = Some(2024);
        item.provider_ids.tmdb = Some("603".to_string());
        item.metadata.plot = Some("A story.".to_string());

        let doc = NfoDocument::from_media_item(&item);
        let xml = generate(EntityType::Movie, &doc).unwrap();

        assert!(xml.contains("<movie>"));
        assert!(xml.contains("</movie>"));

        let reparsed = parse(&xml).unwrap();
        assert_eq!(reparsed.title, "Example");
        assert_eq!(reparsed.provider_ids().tmdb.as_deref(), Some("603"));
    }
}
