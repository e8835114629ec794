//! # Transaction Manager Configuration

use serde::{Deserialize, Serialize};
use shared_types::Address;
use thiserror::Error;

/// Default number of records a paginated read visits.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Upper bound accepted for `page_size`.
pub const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("page_size must be greater than zero")]
    ZeroPageSize,

    #[error("page_size {size} exceeds the maximum of {max}")]
    PageSizeTooLarge { size: usize, max: usize },

    #[error("proxy address {address} is not a contract")]
    ProxyNotContract { address: Address },
}

/// Transaction manager configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// The owning proxy. Every entry point requires it as sender.
    pub proxy_address: Address,

    /// Account whose funds the batches spend and deposits credit.
    pub wallet_address: Address,

    /// Records visited by one paginated read.
    pub page_size: usize,

    /// Re-evaluate the waiting queue after a batch changed the quorum.
    pub retry_waiting_on_quorum_change: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            proxy_address: Address::contract_from_byte(0x01),
            wallet_address: Address::contract_from_byte(0x02),
            page_size: DEFAULT_PAGE_SIZE,
            retry_waiting_on_quorum_change: true,
        }
    }
}

impl ManagerConfig {
    pub fn new(proxy_address: Address, wallet_address: Address) -> Self {
        Self {
            proxy_address,
            wallet_address,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_retry_waiting_on_quorum_change(mut self, enabled: bool) -> Self {
        self.retry_waiting_on_quorum_change = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::PageSizeTooLarge {
                size: self.page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        if !self.proxy_address.is_contract() {
            return Err(ConfigError::ProxyNotContract {
                address: self.proxy_address,
            });
        }
        Ok(())
    }
}
