//! Recursive directory operations
//!
//! The service has no multi-object transactions, so both walks issue one
//! call per directory or object. Any failure aborts the walk and is
//! returned as-is; there is no partial result.

use futures::FutureExt;
use futures::future::BoxFuture;
use mt_core::types::is_directory;
use mt_core::{EntryType, Error, RemotePath, Result, TreeOperationResult, is_root_or_top_level};

use crate::client::MantaClient;

impl MantaClient {
    /// Create a directory and every missing ancestor (`mkdir -p`)
    ///
    /// The namespace root and its first level (`/acct`, `/acct/stor`) are
    /// never created. An ancestor rejected with `NoMatchingRoleTag` is
    /// assumed to exist and is skipped. The target itself is always
    /// created and its errors always propagate.
    pub async fn create_with_ancestors(
        &self,
        path: impl AsRef<[u8]>,
    ) -> Result<TreeOperationResult> {
        let target = RemotePath::from_bytes(path.as_ref())?;
        let prefixes = target.prefixes();
        let Some((target, ancestors)) = prefixes.split_last() else {
            return Err(Error::InvalidPath(
                "cannot create the namespace root".to_string(),
            ));
        };

        let mut result = TreeOperationResult::default();
        for ancestor in ancestors {
            let ancestor = ancestor.to_string();
            if is_root_or_top_level(&ancestor) {
                tracing::trace!(path = %ancestor, "Skipping provisioned directory");
                continue;
            }

            match self.put_directory(&ancestor).await {
                Ok(response) => result.push_step(response.into_headers()),
                Err(e) if e.is_no_matching_role_tag() => {
                    tracing::debug!(
                        path = %ancestor,
                        "No role tag on ancestor, assuming it exists"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let response = self.put_directory(target.to_string()).await?;
        tracing::debug!(path = %target, steps = result.steps() + 1, "Created directory tree");
        Ok(result.finish(response.into_headers()))
    }

    /// Delete a path, and with `recursive` everything below it first
    ///
    /// Children are processed in listing order, depth-first; each
    /// directory's descendants are gone before its next sibling is touched.
    pub async fn delete_recursive(
        &self,
        path: impl AsRef<[u8]>,
        recursive: bool,
    ) -> Result<TreeOperationResult> {
        let target = RemotePath::from_bytes(path.as_ref())?;

        if recursive {
            let head = self.head(target.to_string()).await?;
            if is_directory(head.headers()) {
                let result = self.delete_tree(target.clone()).await?;
                tracing::debug!(path = %target, steps = result.steps(), "Deleted directory tree");
                return Ok(result);
            }
        }

        let response = self.delete(target.to_string()).await?;
        Ok(TreeOperationResult::default().finish(response.into_headers()))
    }

    fn delete_tree(&self, dir: RemotePath) -> BoxFuture<'_, Result<TreeOperationResult>> {
        async move {
            let children = self.list_directory(dir.to_string()).await?;

            let mut result = TreeOperationResult::default();
            for child in children {
                let child_path = dir.join(&child.name);
                match child.entry_type {
                    EntryType::Directory => {
                        result.absorb(self.delete_tree(child_path).await?);
                    }
                    EntryType::Object => {
                        let response = self.delete(child_path.to_string()).await?;
                        result.push_step(response.into_headers());
                    }
                }
            }

            let response = self.delete(dir.to_string()).await?;
            Ok(result.finish(response.into_headers()))
        }
        .boxed()
    }
}
