//! Drive v3 `files` resource
//!
//! Free functions over a [`DriveClient`], one per endpoint:
//! - [`list`] - `GET /drive/v3/files`
//! - [`create`] - `POST /drive/v3/files`, or a multipart upload with media
//! - [`update`] - `PATCH /drive/v3/files/{id}`, or a multipart upload with media
//! - [`delete`] - `DELETE /drive/v3/files/{id}`
//!
//! ## Google Drive API References
//!
//! - [files.list](https://developers.google.com/drive/api/reference/rest/v3/files/list)
//! - [Multipart upload](https://developers.google.com/drive/api/guides/manage-uploads#multipart)

use bytes::Bytes;
use driveops_core::domain::{RemoteId, ResourceMetadata};
use driveops_core::ports::{ListPage, ListRequest, Media, RemoteItem};
use futures_util::stream::{self, StreamExt};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::client::{check_status, DriveClient};
use crate::DriveError;

/// Metadata endpoint of the `files` resource
const FILES_PATH: &str = "/drive/v3/files";

/// Media upload endpoint of the `files` resource
const UPLOAD_PATH: &str = "/upload/drive/v3/files";

/// Content type used when the caller names none
const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

// ============================================================================
// Response types
// ============================================================================

/// Response of `files.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<RemoteItem>,
    next_page_token: Option<String>,
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, DriveError> {
    let body = check_status(response).await?.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| DriveError::InvalidResponse(e.to_string()))
}

// ============================================================================
// Endpoints
// ============================================================================

/// Fetches one page of `files.list`
pub async fn list(client: &DriveClient, request: &ListRequest) -> Result<ListPage, DriveError> {
    let mut params: Vec<(&str, String)> = vec![
        ("q", request.query.clone()),
        ("fields", request.fields.clone()),
        ("pageSize", request.page_size.to_string()),
        ("spaces", request.spaces.clone()),
    ];
    if let Some(token) = &request.page_token {
        params.push(("pageToken", token.clone()));
    }

    debug!(query = %request.query, has_token = request.page_token.is_some(), "files.list");

    let builder = client.request(Method::GET, FILES_PATH)?.query(&params);
    let page: FileList = parse_json(client.execute_with_retry(builder).await?).await?;

    Ok(ListPage {
        items: page.files,
        next_page_token: page.next_page_token.filter(|token| !token.is_empty()),
    })
}

/// Creates a file or folder
///
/// Without media only metadata is sent; folders are created this way.
pub async fn create(
    client: &DriveClient,
    metadata: &ResourceMetadata,
    media: Option<Media>,
    fields: &str,
) -> Result<RemoteItem, DriveError> {
    debug!(name = ?metadata.name(), with_media = media.is_some(), "files.create");

    let builder = match media {
        None => client
            .request(Method::POST, FILES_PATH)?
            .query(&[("fields", fields)])
            .json(metadata),
        Some(media) => multipart(
            client.request(Method::POST, UPLOAD_PATH)?,
            metadata,
            media,
            fields,
        )?,
    };

    parse_json(client.execute_with_retry(builder).await?).await
}

/// Updates an existing file's metadata and, with media, its content
pub async fn update(
    client: &DriveClient,
    id: &RemoteId,
    metadata: &ResourceMetadata,
    media: Option<Media>,
    fields: &str,
) -> Result<RemoteItem, DriveError> {
    debug!(id = %id, with_media = media.is_some(), "files.update");

    let builder = match media {
        None => client
            .request(Method::PATCH, &format!("{FILES_PATH}/{id}"))?
            .query(&[("fields", fields)])
            .json(metadata),
        Some(media) => multipart(
            client.request(Method::PATCH, &format!("{UPLOAD_PATH}/{id}"))?,
            metadata,
            media,
            fields,
        )?,
    };

    parse_json(client.execute_with_retry(builder).await?).await
}

/// Deletes a file, or a folder together with its descendants
pub async fn delete(client: &DriveClient, id: &RemoteId) -> Result<(), DriveError> {
    debug!(id = %id, "files.delete");

    let builder = client.request(Method::DELETE, &format!("{FILES_PATH}/{id}"))?;
    check_status(client.execute_with_retry(builder).await?).await?;
    Ok(())
}

// ============================================================================
// Multipart upload
// ============================================================================

/// Attaches a `multipart/related` body: the JSON metadata part followed by
/// the streamed media part
fn multipart(
    builder: reqwest::RequestBuilder,
    metadata: &ResourceMetadata,
    media: Media,
    fields: &str,
) -> Result<reqwest::RequestBuilder, DriveError> {
    let boundary = format!("driveops-{}", uuid::Uuid::new_v4().simple());
    let json = serde_json::to_string(metadata)
        .map_err(|e| DriveError::InvalidResponse(format!("Unserializable metadata: {e}")))?;
    let media_type = media
        .mime_type
        .as_deref()
        .or_else(|| metadata.mime_type())
        .unwrap_or(DEFAULT_MEDIA_TYPE)
        .to_string();

    let (preamble, epilogue) = multipart_frame(&boundary, &json, &media_type);
    let body = stream::once(async move { Ok::<_, std::io::Error>(preamble) })
        .chain(media.body)
        .chain(stream::once(async move { Ok(epilogue) }));

    Ok(builder
        .query(&[("uploadType", "multipart"), ("fields", fields)])
        .header(
            reqwest::header::CONTENT_TYPE,
            format!("multipart/related; boundary={boundary}"),
        )
        .body(reqwest::Body::wrap_stream(body)))
}

/// Bytes surrounding the media part of a multipart body
fn multipart_frame(boundary: &str, json: &str, media_type: &str) -> (Bytes, Bytes) {
    let preamble = format!(
        "--{boundary}\r\n\
         Content-Type: application/json; charset=UTF-8\r\n\r\n\
         {json}\r\n\
         --{boundary}\r\n\
         Content-Type: {media_type}\r\n\r\n"
    );
    let epilogue = format!("\r\n--{boundary}--");
    (Bytes::from(preamble), Bytes::from(epilogue))
}
