//! The static index: the fixed, ordered list of everything in the catalog.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pokedex_catalog::types::{NamedResource, ResourceList, id_from_url};
use pokedex_catalog::{ClientTrait, FetchError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A pointer into the static index.
///
/// Serializes as the `{ "name": …, "url": … }` pairs of the remote listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntryRef {
    #[serde(rename = "name")]
    pub identifier: String,
    #[serde(rename = "url")]
    pub resource_url: String,
}

impl CatalogEntryRef {
    pub fn new(identifier: impl Into<String>, resource_url: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            resource_url: resource_url.into(),
        }
    }

    /// The numeric id encoded in [`CatalogEntryRef::resource_url`].
    pub fn id(&self) -> Option<u32> {
        id_from_url(&self.resource_url)
    }
}

impl From<NamedResource> for CatalogEntryRef {
    fn from(resource: NamedResource) -> Self {
        Self {
            identifier: resource.name,
            resource_url: resource.url,
        }
    }
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("could not read index file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse index")]
    Parse(#[source] serde_json::Error),
    #[error("could not fetch index listing")]
    Fetch(#[source] FetchError),
}

/// Either a bare list of references or a whole listing page.
#[derive(Deserialize)]
#[serde(untagged)]
enum IndexDocument {
    Refs(Vec<CatalogEntryRef>),
    Listing(ResourceList),
}

/// The ordered, fixed-size list of all catalog entry references.
///
/// Cheap to clone; the references are shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticIndex {
    refs: Arc<[CatalogEntryRef]>,
}

impl StaticIndex {
    pub fn new(refs: Vec<CatalogEntryRef>) -> Self {
        Self { refs: refs.into() }
    }

    /// References for ids `1..=count` below `catalog_url`,
    /// identified by their id.
    pub fn generated(catalog_url: &str, count: u32) -> Self {
        let base = catalog_url.trim_end_matches('/');
        (1..=count)
            .map(|id| CatalogEntryRef::new(id.to_string(), format!("{base}/pokemon/{id}/")))
            .collect::<Vec<_>>()
            .into()
    }

    /// Parse a JSON list of `{ name, url }` pairs,
    /// or a listing page with such a list under `results`.
    pub fn from_json_str(json: &str) -> Result<Self, IndexError> {
        let document: IndexDocument = serde_json::from_str(json).map_err(IndexError::Parse)?;
        let refs = match document {
            IndexDocument::Refs(refs) => refs,
            IndexDocument::Listing(listing) => {
                listing.results.into_iter().map(Into::into).collect()
            },
        };
        Ok(Self::new(refs))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| IndexError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_json_str(&contents)?;
        debug!(path = %path.display(), len = index.len(), "read static index");
        Ok(index)
    }

    /// Fetch the first `limit` references from the remote listing,
    /// `GET /pokemon?limit={limit}&offset=0`.
    pub async fn fetch(client: &impl ClientTrait, limit: u32) -> Result<Self, IndexError> {
        let url = format!("{}/pokemon?limit={limit}&offset=0", client.catalog_url());
        let value = client.fetch_resource(&url).await.map_err(IndexError::Fetch)?;
        let listing: ResourceList = serde_json::from_value(value).map_err(IndexError::Parse)?;
        debug!(len = listing.results.len(), total = listing.count, "fetched static index");
        Ok(listing
            .results
            .into_iter()
            .map(CatalogEntryRef::from)
            .collect::<Vec<_>>()
            .into())
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&CatalogEntryRef> {
        self.refs.get(position)
    }

    /// The references in `range`, clamped to the index bounds.
    pub fn slice(&self, range: Range<usize>) -> &[CatalogEntryRef] {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        &self.refs[start..end]
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntryRef> {
        self.refs.iter()
    }
}

impl From<Vec<CatalogEntryRef>> for StaticIndex {
    fn from(refs: Vec<CatalogEntryRef>) -> Self {
        Self::new(refs)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pokedex_catalog::{MockClient, MockResponse};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn generated_index_points_at_entries() {
        let index = StaticIndex::generated("https://pokeapi.co/api/v2/", 3);

        assert_eq!(index.len(), 3);
        assert_eq!(
            index.get(0),
            Some(&CatalogEntryRef::new("1", "https://pokeapi.co/api/v2/pokemon/1/"))
        );
        assert_eq!(index.iter().map(|r| r.id()).collect::<Vec<_>>(), vec![
            Some(1),
            Some(2),
            Some(3)
        ]);
    }

    #[test]
    fn parses_bare_list() {
        let index = StaticIndex::from_json_str(
            r#"[
                { "name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon/1/" },
                { "name": "ivysaur", "url": "https://pokeapi.co/api/v2/pokemon/2/" }
            ]"#,
        )
        .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.get(1).unwrap().identifier, "ivysaur");
    }

    #[test]
    fn parses_listing_page() {
        let index = StaticIndex::from_json_str(
            &json!({
                "count": 1302,
                "next": "https://pokeapi.co/api/v2/pokemon?offset=1&limit=1",
                "previous": null,
                "results": [{ "name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon/1/" }]
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get(0).unwrap().id(), Some(1));
    }

    #[test]
    fn rejects_malformed_index() {
        let err = StaticIndex::from_json_str(r#"{ "pokemon": [] }"#).unwrap_err();
        assert!(matches!(err, IndexError::Parse(_)));
    }

    #[test]
    fn reads_index_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{ "name": "mew", "url": "https://pokeapi.co/api/v2/pokemon/151/" }}]"#
        )
        .unwrap();

        let index = StaticIndex::from_json_file(file.path()).unwrap();
        assert_eq!(index.get(0).unwrap().id(), Some(151));
    }

    #[test]
    fn missing_index_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = StaticIndex::from_json_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, IndexError::Read { .. }));
    }

    #[test]
    fn slice_is_clamped() {
        let index = StaticIndex::generated("https://pokeapi.co/api/v2", 5);

        assert_eq!(index.slice(3..10).len(), 2);
        assert_eq!(index.slice(7..10).len(), 0);
    }

    #[tokio::test]
    async fn fetches_listing() {
        let client = MockClient::default();
        client.respond(
            format!("{}/pokemon?limit=2&offset=0", client.catalog_url()),
            MockResponse::Json(json!({
                "count": 1302,
                "results": [
                    { "name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon/1/" },
                    { "name": "ivysaur", "url": "https://pokeapi.co/api/v2/pokemon/2/" }
                ]
            })),
        );

        let index = StaticIndex::fetch(&client, 2).await.unwrap();
        assert_eq!(
            index.iter().map(|r| r.identifier.as_str()).collect::<Vec<_>>(),
            vec!["bulbasaur", "ivysaur"]
        );
    }

    #[tokio::test]
    async fn failed_listing_fetch() {
        let client = MockClient::default();
        let err = StaticIndex::fetch(&client, 2).await.unwrap_err();
        assert!(matches!(err, IndexError::Fetch(_)));
    }
}
