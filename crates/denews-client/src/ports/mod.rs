//! # Ports
//!
//! API traits (inbound) and dependency traits (outbound) with mock
//! implementations for testing.

pub mod inbound;
pub mod outbound;

pub use inbound::NewsroomApi;
pub use outbound::{
    CallLog, ContentGateway, LedgerContract, MockGateway, MockLedger, MockWallet, WalletEvent,
    WalletProvider,
};
