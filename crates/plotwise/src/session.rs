// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::dataset::Dataset;
use crate::error::DecodeResult;
use crate::loader::TableLoader;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Identity of one upload: its name and a digest of its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadKey {
    file_name: String,
    digest: blake3::Hash,
}
impl UploadKey {
    pub fn new(file_name: &str, bytes: &[u8]) -> Self {
        Self {
            file_name: file_name.to_string(),
            digest: blake3::hash(bytes),
        }
    }
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
    pub fn digest_hex(&self) -> String {
        self.digest.to_hex().to_string()
    }
}
impl fmt::Display for UploadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.digest.to_hex();
        write!(f, "{}@{}", self.file_name, &hex.as_str()[..12])
    }
}

/// Holds the decoded dataset of the current upload. A new upload replaces
/// it; classification and plans are always recomputed by the caller.
#[derive(Default)]
pub struct DashboardSession {
    loader: TableLoader,
    current: Option<(UploadKey, Arc<Dataset>)>,
}
impl DashboardSession {
    pub fn new() -> Self {
        Self::default()
    }
    /// Decodes `bytes` unless the same upload is already held. A failed
    /// decode clears the session.
    pub fn load(&mut self, bytes: &[u8], file_name: &str) -> DecodeResult<Arc<Dataset>> {
        let key = UploadKey::new(file_name, bytes);
        if let Some((held, dataset)) = &self.current {
            if *held == key {
                debug!(upload = %key, "reusing decoded dataset");
                return Ok(Arc::clone(dataset));
            }
        }
        self.current = None;
        let dataset = Arc::new(self.loader.load(bytes, file_name)?);
        self.current = Some((key, Arc::clone(&dataset)));
        Ok(dataset)
    }
    pub fn current(&self) -> Option<&Arc<Dataset>> {
        self.current.as_ref().map(|(_, dataset)| dataset)
    }
    pub fn current_key(&self) -> Option<&UploadKey> {
        self.current.as_ref().map(|(key, _)| key)
    }
    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_depends_on_name_and_bytes() {
        let a = UploadKey::new("a.csv", b"x,y\n1,2\n");
        assert_eq!(a, UploadKey::new("a.csv", b"x,y\n1,2\n"));
        assert_ne!(a, UploadKey::new("b.csv", b"x,y\n1,2\n"));
        assert_ne!(a, UploadKey::new("a.csv", b"x,y\n1,3\n"));
        assert_eq!(a.digest_hex().len(), 64);
        assert!(a.to_string().starts_with("a.csv@"));
    }

    #[test]
    fn failed_upload_clears_session() {
        let mut session = DashboardSession::new();
        assert!(session.load(b"x\n1\n", "data.csv").is_ok());
        assert!(session.current().is_some());
        assert!(session.load(b"hello", "notes.txt").is_err());
        assert!(session.current().is_none());
    }
}
