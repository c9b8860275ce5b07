//! storium registry contract binding
//!
//! a [`ContractBinding`] is scoped to one deployed address and one signing
//! account. reads go through `eth_call`, writes through
//! `eth_sendTransaction` so the wallet prompts for signature. failures are
//! handed back to the calling panel untouched, nothing is retried here.

use crate::abi::{self, IStorium};
use crate::address::Address;
use crate::error::{ClientError, Result};
use crate::provider::{methods, unexpected, WalletProvider};
use alloy_primitives::{B256, U256};
use alloy_sol_types::{SolCall, SolEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// return data larger than this is refused before decoding
pub const MAX_RETURN_DATA: usize = 4 * 1024 * 1024;

/// file entry as stored by the registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub file_name: String,
    pub file_type: String,
    /// external storage locator (ipfs cid), not interpreted here
    pub content_address: String,
    pub file_size: U256,
    /// unix seconds
    pub upload_time: U256,
    pub owner: Address,
    pub is_public: bool,
    pub description: String,
    pub tags: Vec<String>,
}

impl From<abi::FileEntry> for FileRecord {
    fn from(entry: abi::FileEntry) -> Self {
        Self {
            file_name: entry.fileName,
            file_type: entry.fileType,
            content_address: entry.ipfsHash,
            file_size: entry.fileSize,
            upload_time: entry.uploadTime,
            owner: entry.owner.into(),
            is_public: entry.isPublic,
            description: entry.description,
            tags: entry.tags,
        }
    }
}

/// arguments of `addFile`
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct NewFile {
    pub file_name: String,
    pub file_type: String,
    pub content_address: String,
    pub file_size: U256,
    pub is_public: bool,
    pub description: String,
    pub tags: Vec<String>,
}

/// entry of `shareAccess()`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserAccess {
    pub user: Address,
    pub access: bool,
}

/// entry of `getFileAccessList()`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessGrant {
    pub file_id: U256,
    pub user: Address,
    pub has_access: bool,
}

/// account plus the wallet that signs for it
pub struct Signer<P: ?Sized> {
    account: Address,
    provider: Arc<P>,
}

impl<P: ?Sized> Clone for Signer<P> {
    fn clone(&self) -> Self {
        Self {
            account: self.account.clone(),
            provider: self.provider.clone(),
        }
    }
}

impl<P: ?Sized> Signer<P> {
    pub fn new(account: Address, provider: Arc<P>) -> Self {
        Self { account, provider }
    }

    pub fn account(&self) -> &Address {
        &self.account
    }
}

pub struct ContractBinding<P: ?Sized> {
    address: Address,
    signer: Signer<P>,
}

impl<P: ?Sized> Clone for ContractBinding<P> {
    fn clone(&self) -> Self {
        Self {
            address: self.address.clone(),
            signer: self.signer.clone(),
        }
    }
}

impl<P: WalletProvider + ?Sized> ContractBinding<P> {
    pub fn new(address: Address, signer: Signer<P>) -> Self {
        Self { address, signer }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn signer(&self) -> &Signer<P> {
        &self.signer
    }

    /// read-only call. return data must be canonically encoded, aliased
    /// offsets fail validation instead of being expanded.
    async fn call<C: SolCall + Send>(&self, call: C) -> Result<C::Return> {
        let params = json!([
            {
                "from": self.signer.account,
                "to": self.address,
                "data": to_hex(&call.abi_encode()),
            },
            "latest"
        ]);
        debug!("eth_call {} on {}", C::SIGNATURE, self.address);
        let result = self.signer.provider.request(methods::CALL, params).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| unexpected(methods::CALL, "result is not a hex string"))?;
        let data = from_hex(raw)?;
        if data.len() > MAX_RETURN_DATA {
            return Err(ClientError::Abi(format!(
                "{} returned {} bytes, limit is {}",
                C::SIGNATURE,
                data.len(),
                MAX_RETURN_DATA
            )));
        }
        Ok(C::abi_decode_returns(&data, true)?)
    }

    /// submit a transaction, returning its hash
    async fn send<C: SolCall + Send>(&self, call: C) -> Result<String> {
        let params = json!([{
            "from": self.signer.account,
            "to": self.address,
            "data": to_hex(&call.abi_encode()),
        }]);
        debug!("eth_sendTransaction {} on {}", C::SIGNATURE, self.address);
        let result = self
            .signer
            .provider
            .request(methods::SEND_TRANSACTION, params)
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| unexpected(methods::SEND_TRANSACTION, "tx hash is not a string"))
    }

    pub async fn add_file(&self, file: &NewFile) -> Result<String> {
        self.send(IStorium::addFileCall {
            fileName: file.file_name.clone(),
            fileType: file.file_type.clone(),
            ipfsHash: file.content_address.clone(),
            fileSize: file.file_size,
            isPublic: file.is_public,
            description: file.description.clone(),
            tags: file.tags.clone(),
        })
        .await
    }

    pub async fn get_my_files(&self) -> Result<Vec<FileRecord>> {
        let ret = self.call(IStorium::getMyFilesCall {}).await?;
        Ok(ret.files.into_iter().map(FileRecord::from).collect())
    }

    pub async fn get_public_files(&self) -> Result<Vec<FileRecord>> {
        let ret = self.call(IStorium::getPublicFilesCall {}).await?;
        Ok(ret.files.into_iter().map(FileRecord::from).collect())
    }

    pub async fn get_user_files(&self, user: &Address) -> Result<Vec<FileRecord>> {
        let ret = self
            .call(IStorium::getUserFilesCall {
                user: user.to_alloy(),
            })
            .await?;
        Ok(ret.files.into_iter().map(FileRecord::from).collect())
    }

    pub async fn allow(&self, user: &Address) -> Result<String> {
        self.send(IStorium::allowCall {
            user: user.to_alloy(),
        })
        .await
    }

    pub async fn disallow(&self, user: &Address) -> Result<String> {
        self.send(IStorium::disallowCall {
            user: user.to_alloy(),
        })
        .await
    }

    pub async fn share_access(&self) -> Result<Vec<UserAccess>> {
        let ret = self.call(IStorium::shareAccessCall {}).await?;
        Ok(ret
            .entries
            .into_iter()
            .map(|e| UserAccess {
                user: e.user.into(),
                access: e.access,
            })
            .collect())
    }

    pub async fn delete_file(&self, file_id: U256) -> Result<String> {
        self.send(IStorium::deleteFileCall { fileId: file_id }).await
    }

    pub async fn grant_file_access(&self, file_id: U256, user: &Address) -> Result<String> {
        self.send(IStorium::grantFileAccessCall {
            fileId: file_id,
            user: user.to_alloy(),
        })
        .await
    }

    pub async fn revoke_file_access(&self, file_id: U256, user: &Address) -> Result<String> {
        self.send(IStorium::revokeFileAccessCall {
            fileId: file_id,
            user: user.to_alloy(),
        })
        .await
    }

    pub async fn get_file_access_list(&self) -> Result<Vec<AccessGrant>> {
        let ret = self.call(IStorium::getFileAccessListCall {}).await?;
        Ok(ret
            .entries
            .into_iter()
            .map(|e| AccessGrant {
                file_id: e.fileId,
                user: e.user.into(),
                has_access: e.hasAccess,
            })
            .collect())
    }

    pub async fn has_file_access(&self, file_id: U256, user: &Address) -> Result<bool> {
        let ret = self
            .call(IStorium::hasFileAccessCall {
                fileId: file_id,
                user: user.to_alloy(),
            })
            .await?;
        Ok(ret.allowed)
    }

    /// registry event from a log, `None` for foreign contracts or events
    pub fn decode_event(&self, log: &Log) -> Result<Option<ContractEvent>> {
        ContractEvent::decode(log, &self.address)
    }
}

fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn from_hex(s: &str) -> Result<Vec<u8>> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| ClientError::Abi(format!("bad hex: {}", e)))
}

/// raw log as returned in receipts / `eth_getLogs`
#[derive(Clone, Debug, Deserialize)]
pub struct Log {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
}

/// registry events, used by panels as refresh cues
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractEvent {
    FileUploaded {
        user: Address,
        file_id: U256,
        file_name: String,
        content_address: String,
    },
    AccessGranted {
        owner: Address,
        user: Address,
    },
    FileDeleted {
        user: Address,
        file_id: U256,
    },
    FileAccessGranted {
        owner: Address,
        user: Address,
        file_id: U256,
    },
    FileAccessRevoked {
        owner: Address,
        user: Address,
        file_id: U256,
    },
}

impl ContractEvent {
    /// decode a log emitted by `registry`. logs from any other address, or
    /// whose topic0 is not a registry event, give `None`.
    pub fn decode(log: &Log, registry: &Address) -> Result<Option<Self>> {
        if !registry.matches(&log.address) {
            return Ok(None);
        }
        let topics = log
            .topics
            .iter()
            .map(|t| {
                t.parse::<B256>()
                    .map_err(|e| ClientError::Abi(format!("bad topic {}: {}", t, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        let Some(topic0) = topics.first().copied() else {
            return Ok(None);
        };
        let data = from_hex(&log.data)?;
        let words = || topics.iter().copied();

        let event = if topic0 == IStorium::FileUploaded::SIGNATURE_HASH {
            let e = IStorium::FileUploaded::decode_raw_log(words(), &data, true)?;
            ContractEvent::FileUploaded {
                user: e.user.into(),
                file_id: e.fileId,
                file_name: e.fileName,
                content_address: e.ipfsHash,
            }
        } else if topic0 == IStorium::AccessGranted::SIGNATURE_HASH {
            let e = IStorium::AccessGranted::decode_raw_log(words(), &data, true)?;
            ContractEvent::AccessGranted {
                owner: e.owner.into(),
                user: e.user.into(),
            }
        } else if topic0 == IStorium::FileDeleted::SIGNATURE_HASH {
            let e = IStorium::FileDeleted::decode_raw_log(words(), &data, true)?;
            ContractEvent::FileDeleted {
                user: e.user.into(),
                file_id: e.fileId,
            }
        } else if topic0 == IStorium::FileAccessGranted::SIGNATURE_HASH {
            let e = IStorium::FileAccessGranted::decode_raw_log(words(), &data, true)?;
            ContractEvent::FileAccessGranted {
                owner: e.owner.into(),
                user: e.user.into(),
                file_id: e.fileId,
            }
        } else if topic0 == IStorium::FileAccessRevoked::SIGNATURE_HASH {
            let e = IStorium::FileAccessRevoked::decode_raw_log(words(), &data, true)?;
            ContractEvent::FileAccessRevoked {
                owner: e.owner.into(),
                user: e.user.into(),
                file_id: e.fileId,
            }
        } else {
            return Ok(None);
        };
        Ok(Some(event))
    }

    /// whether `account` is one of the indexed parties
    pub fn involves(&self, account: &Address) -> bool {
        match self {
            ContractEvent::FileUploaded { user, .. } | ContractEvent::FileDeleted { user, .. } => {
                user == account
            }
            ContractEvent::AccessGranted { owner, user }
            | ContractEvent::FileAccessGranted { owner, user, .. }
            | ContractEvent::FileAccessRevoked { owner, user, .. } => {
                owner == account || user == account
            }
        }
    }
}
