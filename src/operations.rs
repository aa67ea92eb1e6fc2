//! Browse, search, management and download operations
//!
//! One method per remote call, each returning a typed result. These are
//! simple synchronous request/response calls; the interesting concurrency
//! lives in [`crate::upload`].

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::client::{check_status, CiClient};
use crate::error::{CiError, Result};
use crate::types::{
    DownloadInfo, FolderCreated, FolderDetail, Item, MediaboxCreated, MediaboxRequest,
    MessageResponse, Page, Workspace,
};

/// Paging and filter options for listing calls
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Item kind filter: `all`, `asset` or `folder`
    pub kind: String,
    pub limit: u64,
    pub offset: u64,
    /// Comma-separated extra fields to include per item
    pub fields: String,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            kind: "all".to_string(),
            limit: PAGE_SIZE,
            offset: 0,
            fields: "metadata".to_string(),
        }
    }
}

impl ListOptions {
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = fields.into();
        self
    }
}

/// Page size used when accumulating full listings
const PAGE_SIZE: u64 = 50;

impl CiClient {
    /// List workspaces available to the account
    pub fn workspaces(&self, limit: u64, offset: u64, fields: &str) -> Result<Vec<Workspace>> {
        let url = self.api_url("workspaces");
        let response = self
            .get(&url)
            .query(&[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("fields", fields.to_string()),
            ])
            .send()?;
        let page: Page<Workspace> = self.parse_json(response)?;
        debug!(count = page.count, "listed workspaces");
        Ok(page.items)
    }

    /// One page of the default workspace's contents
    pub fn list(&self, options: &ListOptions) -> Result<Page<Item>> {
        let url = self.api_url(&format!("workspaces/{}/contents", self.workspace_id()));
        self.list_contents(&url, options)
    }

    /// One page of a folder's contents
    pub fn list_folder(&self, folder_id: &str, options: &ListOptions) -> Result<Page<Item>> {
        let url = self.api_url(&format!("folders/{}/contents", folder_id));
        self.list_contents(&url, options)
    }

    fn list_contents(&self, url: &str, options: &ListOptions) -> Result<Page<Item>> {
        let response = self
            .get(url)
            .query(&[
                ("kind", options.kind.clone()),
                ("limit", options.limit.to_string()),
                ("offset", options.offset.to_string()),
                ("fields", options.fields.clone()),
            ])
            .send()?;
        self.parse_json(response)
    }

    /// All items in the workspace, accumulated across pages
    pub fn items(&self) -> Result<Vec<Item>> {
        self.collect_pages(ListOptions::default())
    }

    /// All assets in the workspace
    pub fn assets(&self) -> Result<Vec<Item>> {
        self.collect_pages(ListOptions::default().kind("asset"))
    }

    /// All folders in the workspace
    pub fn folders(&self) -> Result<Vec<Item>> {
        self.collect_pages(ListOptions::default().kind("folder").fields("parentId"))
    }

    /// All assets inside one folder
    pub fn folder_contents(&self, folder_id: &str) -> Result<Vec<Item>> {
        let mut options = ListOptions::default().kind("asset");
        let mut items = Vec::new();
        loop {
            let page = self.list_folder(folder_id, &options)?;
            if page.items.is_empty() {
                break;
            }
            items.extend(page.items);
            options.offset += PAGE_SIZE;
        }
        Ok(items)
    }

    fn collect_pages(&self, mut options: ListOptions) -> Result<Vec<Item>> {
        options.limit = PAGE_SIZE;
        let mut items = Vec::new();
        loop {
            let page = self.list(&options)?;
            if page.items.is_empty() {
                break;
            }
            items.extend(page.items);
            options.offset += PAGE_SIZE;
        }
        Ok(items)
    }

    /// Search a workspace by name
    pub fn search(
        &self,
        query: &str,
        options: &ListOptions,
        workspace_id: Option<&str>,
    ) -> Result<Page<Item>> {
        let workspace = workspace_id.unwrap_or_else(|| self.workspace_id());
        let url = self.api_url(&format!("workspaces/{}/search", workspace));
        let response = self
            .get(&url)
            .query(&[
                ("kind", options.kind.clone()),
                ("limit", options.limit.to_string()),
                ("offset", options.offset.to_string()),
                ("query", query.to_string()),
            ])
            .send()?;
        self.parse_json(response)
    }

    /// Create a folder; returns the new folder id
    pub fn create_folder(
        &self,
        name: &str,
        parent_folder_id: Option<&str>,
        workspace_id: Option<&str>,
    ) -> Result<String> {
        let url = self.api_url("folders");
        let mut body = serde_json::json!({ "name": name });
        if let Some(parent) = parent_folder_id {
            body["parentFolderId"] = parent.into();
        }
        body["workspaceId"] = workspace_id.unwrap_or_else(|| self.workspace_id()).into();

        let response = self.post(&url).json(&body).send()?;
        let created: FolderCreated = self.parse_json(response)?;
        info!(folder_id = %created.folder_id, "folder created");
        Ok(created.folder_id)
    }

    /// Folder detail
    pub fn detail_folder(&self, folder_id: &str) -> Result<FolderDetail> {
        let url = self.api_url(&format!("folders/{}", folder_id));
        let response = self.get(&url).send()?;
        self.parse_json(response)
    }

    /// Move assets into a folder
    pub fn move_assets(&self, asset_ids: &[String], folder_id: Option<&str>) -> Result<()> {
        let url = self.api_url("assets/move");
        let mut body = serde_json::json!({ "assetIds": asset_ids });
        if let Some(folder) = folder_id {
            body["folderId"] = folder.into();
        }
        let response = self.post(&url).json(&body).send()?;
        check_status(response)?;
        info!(count = asset_ids.len(), "assets moved");
        Ok(())
    }

    /// Permanently delete a folder
    pub fn delete_folder(&self, folder_id: &str) -> Result<bool> {
        let url = self.api_url(&format!("folders/{}", folder_id));
        let response = self.delete(&url).send()?;
        let message: MessageResponse = self.parse_json(response)?;
        Ok(message.message == "Folder was deleted.")
    }

    /// Move a folder to the trash
    pub fn trash_folder(&self, folder_id: &str) -> Result<bool> {
        let url = self.api_url(&format!("folders/{}/trash", folder_id));
        let response = self.post(&url).send()?;
        let message: MessageResponse = self.parse_json(response)?;
        Ok(message.message == "Folder was trashed.")
    }

    /// Start archiving an asset
    pub fn archive_asset(&self, asset_id: &str) -> Result<bool> {
        let url = self.api_url(&format!("assets/{}/archive", asset_id));
        let response = self.post(&url).send()?;
        let message: MessageResponse = self.parse_json(response)?;
        Ok(message.message == "Asset archive has started.")
    }

    /// Permanently delete an asset
    pub fn delete_asset(&self, asset_id: &str) -> Result<bool> {
        let url = self.api_url(&format!("assets/{}", asset_id));
        let response = self.delete(&url).send()?;
        let message: MessageResponse = self.parse_json(response)?;
        Ok(message.message == "Asset was deleted.")
    }

    /// Download an asset into a directory; returns the written path
    ///
    /// The service hands back a presigned location which is fetched without
    /// the bearer token.
    pub fn download(&self, asset_id: &str, dest_dir: &Path) -> Result<PathBuf> {
        // The download endpoint does not return the asset name; look it up
        let name = self
            .assets()?
            .into_iter()
            .find(|a| a.id == asset_id)
            .and_then(|a| a.name)
            .unwrap_or_else(|| asset_id.to_string());

        let url = self.api_url(&format!("assets/{}/download", asset_id));
        let response = self.get(&url).send()?;
        let info: DownloadInfo = self.parse_json(response)?;

        let location = info.location.ok_or_else(|| {
            CiError::UnexpectedResponse(format!("No download location for asset {}", asset_id))
        })?;

        let dest = dest_dir.join(&name);
        let mut response = check_status(self.http().get(&location).send()?)?;
        let mut file = File::create(&dest)?;
        let bytes = response
            .copy_to(&mut file)
            .map_err(|e| CiError::Io(format!("Writing {}: {}", dest.display(), e)))?;
        info!(asset_id, bytes, path = %dest.display(), "asset downloaded");
        Ok(dest)
    }

    /// Create a mediabox share link; returns (mediabox id, link)
    pub fn create_mediabox(&self, request: &MediaboxRequest) -> Result<(String, String)> {
        let url = self.api_url("mediaboxes");
        let response = self.post(&url).json(request).send()?;
        let created: MediaboxCreated = self.parse_json(response)?;
        if created.link.is_empty() {
            warn!(mediabox_id = %created.mediabox_id, "mediabox created without a link");
        }
        Ok((created.mediabox_id, created.link))
    }
}
