use serde::Deserialize;
use tracing::{event, Level};
use url::Url;

use crate::content::{Client, Request};
use crate::helpers::{DriveTimeError, TileLoadingContext};
use crate::world::Source;

pub const GOOGLE_TILES_URL: &str = "https://tile.googleapis.com/v1/3dtiles/root.json";
/// Google Photorealistic 3D Tiles as served through Cesium ion.
pub const GOOGLE_PHOTOREALISTIC_ION_ASSET: u64 = 2_275_207;

pub fn ion_endpoint_url(asset_id: u64) -> String {
    format!("https://api.cesium.com/v1/assets/{asset_id}/endpoint")
}

#[derive(Debug, Deserialize)]
struct TilesetJson {
    asset: AssetInfo,
    #[serde(rename = "geometricError")]
    geometric_error: f64,
    root: TileSource,
}

#[derive(Debug, Deserialize)]
struct AssetInfo {
    version: String,
}

#[derive(Debug, Deserialize, Clone)]
struct TileSource {
    #[serde(rename = "boundingVolume")]
    bounding_volume: BoundingVolume,
    content: Option<TileSourceContent>,
    children: Option<Vec<TileSource>>,
}

#[derive(Debug, Deserialize, Clone)]
struct TileSourceContent {
    uri: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BoundingVolume {
    #[serde(rename = "box")]
    pub bbox: Option<[f64; 12]>,
    pub region: Option<[f64; 6]>,
    pub sphere: Option<[f64; 4]>,
}

/// How follow-up tile requests authenticate.
#[derive(Debug, Clone, PartialEq)]
pub enum TileAccess {
    Key(String),
    Bearer(String),
    Headers(Vec<(String, String)>),
}

/// A resolved photorealistic tileset root, ready for the renderer to stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    pub url: String,
    pub version: String,
    pub geometric_error: f64,
    pub root_volume: BoundingVolume,
    pub session: Option<String>,
    pub access: TileAccess,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IonEndpoint {
    #[serde(rename = "type")]
    kind: String,
    url: Option<String>,
    access_token: Option<String>,
    options: Option<IonExternalOptions>,
}

#[derive(Debug, Deserialize)]
struct IonExternalOptions {
    url: Option<String>,
    key: Option<String>,
}

/// Resolves and fetches the tileset root for `source`.
pub async fn create_photorealistic_tileset(
    client: &Client,
    source: &Source,
) -> Result<Tileset, DriveTimeError> {
    let (url, access) = match source {
        Source::Google { key, url } => {
            if key.is_empty() {
                return Err(DriveTimeError::InvalidInput(
                    "no Google Maps API key configured".to_string(),
                ));
            }
            (url.clone(), TileAccess::Key(key.clone()))
        }
        Source::CesiumIon { key, url } => resolve_ion_endpoint(client, key, url).await?,
        Source::SelfHosted { headers, url } => (url.clone(), TileAccess::Headers(headers.clone())),
    };

    event!(Level::INFO, url = %url, "loading photorealistic tileset");

    let response = authorize(client.get(&url), &access)
        .send()
        .await
        .map_err(|e| DriveTimeError::Network(e.to_string()))?;
    if !response.status().is_success() {
        return Err(DriveTimeError::TileLoading(format!(
            "tileset root answered HTTP {}",
            response.status()
        )));
    }
    let body = response
        .text()
        .await
        .map_err(|e| DriveTimeError::Network(e.to_string()))?;

    parse_tileset(&url, access, &body)
}

async fn resolve_ion_endpoint(
    client: &Client,
    token: &str,
    endpoint: &str,
) -> Result<(String, TileAccess), DriveTimeError> {
    if token.is_empty() {
        return Err(DriveTimeError::InvalidInput(
            "no Cesium ion access token configured".to_string(),
        ));
    }

    let endpoint: IonEndpoint = client
        .get(endpoint)
        .query(&[("access_token", token)])
        .send()
        .await
        .map_err(|e| DriveTimeError::Network(e.to_string()))?
        .json::<IonEndpoint>()
        .await
        .tile_loading("invalid ion endpoint response")?;

    if endpoint.kind != "3DTILES" {
        return Err(DriveTimeError::TileLoading(format!(
            "ion asset is {}, not 3DTILES",
            endpoint.kind
        )));
    }

    // external assets hand back the provider's own url and key
    if let Some(IonExternalOptions {
        url: Some(url),
        key: Some(key),
    }) = endpoint.options
    {
        return Ok((url, TileAccess::Key(key)));
    }

    match (endpoint.url, endpoint.access_token) {
        (Some(url), Some(token)) => Ok((url, TileAccess::Bearer(token))),
        _ => Err(DriveTimeError::TileLoading(
            "ion endpoint names no tileset url".to_string(),
        )),
    }
}

fn authorize(request: Request, access: &TileAccess) -> Request {
    match access {
        TileAccess::Key(key) => request.query(&[("key", key.as_str())]),
        TileAccess::Bearer(token) => request.bearer_auth(token),
        TileAccess::Headers(headers) => headers
            .iter()
            .fold(request, |req, (name, value)| req.header(name, value)),
    }
}

/// Parses a tileset root body fetched from `url`.
pub fn parse_tileset(url: &str, access: TileAccess, body: &str) -> Result<Tileset, DriveTimeError> {
    let json: TilesetJson = serde_json::from_str(body).tile_loading("invalid tileset json")?;

    let root_volume = json.root.bounding_volume.clone();
    if root_volume.bbox.is_none() && root_volume.region.is_none() && root_volume.sphere.is_none() {
        return Err(DriveTimeError::TileLoading(
            "tileset root has an empty bounding volume".to_string(),
        ));
    }

    Ok(Tileset {
        url: url.to_string(),
        version: json.asset.version,
        geometric_error: json.geometric_error,
        root_volume,
        session: find_session(&json.root).map(str::to_string),
        access,
    })
}

fn find_session(tile: &TileSource) -> Option<&str> {
    if let Some(session) = tile.content.as_ref().and_then(|c| extract_session(&c.uri)) {
        return Some(session);
    }
    tile.children
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find_map(find_session)
}

fn extract_session(url: &str) -> Option<&str> {
    url.split_once("session=")
        .map(|(_, rest)| rest.split('&').next().unwrap_or(rest))
}

impl Tileset {
    /// Resolves a content uri against the root and appends key and session.
    pub fn content_url(&self, relative: &str) -> Result<String, DriveTimeError> {
        let mut base = Url::parse(&self.url).tile_loading("invalid base url")?;
        base.set_query(None);
        let mut url = base.join(relative).tile_loading("Failed to join base url")?;

        if let TileAccess::Key(key) = &self.access {
            if !url.query_pairs().any(|(k, _)| k == "key") {
                url.query_pairs_mut().append_pair("key", key);
            }
        }
        if let Some(session) = &self.session {
            if !url.query_pairs().any(|(k, _)| k == "session") {
                url.query_pairs_mut().append_pair("session", session);
            }
        }
        Ok(url.to_string())
    }
}
