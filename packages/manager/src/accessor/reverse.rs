use super::Ens;
use crate::error::{ManagerError, Result};
use crate::ledger::TxReceipt;
use alloy_sol_types::SolCall;
use ens::reverse_registrar::ReverseRegistrar;
use ens::utils::{namehash, normalize_name, reverse_name, reverse_node, REVERSE_SUFFIX};
use ens::Address;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct ReverseRecord {
    pub name: Option<String>,
}

impl Ens {
    /// The reverse registrar is whoever owns `addr.reverse`.
    pub async fn reverse_registrar(&self) -> Result<Address> {
        let registrar = self.owner_of(namehash(REVERSE_SUFFIX)).await?;
        if registrar.is_zero() {
            return Err(ManagerError::ReverseRegistrarNotFound {});
        }
        Ok(registrar)
    }

    async fn execute_reverse_registrar<C: SolCall>(&self, call: C) -> Result<TxReceipt> {
        let registrar = self.reverse_registrar().await?;
        self.transact(registrar, call).await
    }

    /// Name claimed by `address`, if its reverse node has a resolver with a
    /// non-empty `name` record.
    pub async fn get_name(&self, address: Address) -> Result<ReverseRecord> {
        let node = reverse_node(&address);
        let resolver = self.resolver_of(node).await?;
        if resolver.is_zero() {
            debug!(%address, "reverse node has no resolver");
            return Ok(ReverseRecord { name: None });
        }
        let name = self.name_with_resolver(resolver, node).await?;
        Ok(ReverseRecord {
            name: if name.is_empty() { None } else { Some(name) },
        })
    }

    /// Makes `owner` the owner of the sender's reverse node.
    pub async fn claim(&self, owner: Address) -> Result<TxReceipt> {
        self.execute_reverse_registrar(ReverseRegistrar::claimCall { owner })
            .await
    }

    /// Claims the sender's reverse node for the sender and points it at `resolver`.
    pub async fn claim_reverse_record(&self, resolver: Address) -> Result<TxReceipt> {
        let owner = self.sender().await?;
        self.execute_reverse_registrar(ReverseRegistrar::claimWithResolverCall { owner, resolver })
            .await
    }

    /// One transaction through the registrar: claim with its default resolver
    /// and record `name`.
    pub async fn claim_and_set_reverse_record_name(&self, name: &str) -> Result<TxReceipt> {
        let name = normalize_name(name)?;
        self.execute_reverse_registrar(ReverseRegistrar::setNameCall { name })
            .await
    }

    /// Writes `name` on the resolver of the sender's already claimed reverse node.
    pub async fn set_reverse_record_name(&self, name: &str) -> Result<TxReceipt> {
        let sender = self.sender().await?;
        self.set_resolver_name(&reverse_name(&sender), name).await
    }
}
