use super::Ens;
use crate::error::{ManagerError, Result};
use crate::ledger::TxReceipt;
use alloy_sol_types::SolCall;
use ens::resolver::PublicResolver;
use ens::utils::{name_to_node, normalize_name};
use ens::{Address, B256};

impl Ens {
    pub(super) async fn addr_with_resolver(&self, resolver: Address, node: B256) -> Result<Address> {
        let addr = self
            .query(resolver, PublicResolver::addrCall { node })
            .await?;
        Ok(addr._0)
    }

    pub(super) async fn content_with_resolver(&self, resolver: Address, node: B256) -> Result<B256> {
        let content = self
            .query(resolver, PublicResolver::contentCall { node })
            .await?;
        Ok(content._0)
    }

    pub(super) async fn name_with_resolver(&self, resolver: Address, node: B256) -> Result<String> {
        let name = self
            .query(resolver, PublicResolver::nameCall { node })
            .await?;
        Ok(name._0)
    }

    /// Writes go to the resolver currently set for the name.
    async fn execute_resolver<C: SolCall>(&self, name: &str, node: B256, call: C) -> Result<TxReceipt> {
        let resolver = self.resolver_of(node).await?;
        if resolver.is_zero() {
            return Err(ManagerError::NoResolver {
                name: name.to_string(),
            });
        }
        self.transact(resolver, call).await
    }

    /// Fails with the resolver's revert when no address is recorded.
    pub async fn get_addr(&self, name: &str) -> Result<Address> {
        let node = name_to_node(name)?;
        let resolver = self.resolver_of(node).await?;
        self.addr_with_resolver(resolver, node).await
    }

    pub async fn set_address(&self, name: &str, address: Address) -> Result<TxReceipt> {
        let node = name_to_node(name)?;
        let call = PublicResolver::setAddrCall { node, addr: address };
        self.execute_resolver(name, node, call).await
    }

    pub async fn get_content(&self, name: &str) -> Result<B256> {
        let node = name_to_node(name)?;
        let resolver = self.resolver_of(node).await?;
        self.content_with_resolver(resolver, node).await
    }

    pub async fn set_content(&self, name: &str, hash: B256) -> Result<TxReceipt> {
        let node = name_to_node(name)?;
        let call = PublicResolver::setContentCall { node, hash };
        self.execute_resolver(name, node, call).await
    }

    /// The resolver's `name` record of `name`.
    pub async fn get_resolver_name(&self, name: &str) -> Result<String> {
        let node = name_to_node(name)?;
        let resolver = self.resolver_of(node).await?;
        self.name_with_resolver(resolver, node).await
    }

    pub async fn set_resolver_name(&self, name: &str, value: &str) -> Result<TxReceipt> {
        let node = name_to_node(name)?;
        let call = PublicResolver::setNameCall {
            node,
            name: normalize_name(value)?,
        };
        self.execute_resolver(name, node, call).await
    }
}
