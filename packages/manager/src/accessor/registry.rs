use super::{join_name, Ens};
use crate::error::Result;
use crate::ledger::{LogFilter, TxReceipt};
use alloy_sol_types::SolEvent;
use ens::abi::decode_event;
use ens::registry::EnsRegistry;
use ens::utils::{labelhash, name_to_node, namehash, normalize_label, normalize_name, subnode};
use ens::{Address, B256};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct DomainDetails {
    pub name: String,
    pub label: String,
    #[schemars(with = "String")]
    pub label_hash: B256,
    #[schemars(with = "String")]
    pub node: B256,
    #[schemars(with = "String")]
    pub owner: Address,
    #[schemars(with = "String")]
    pub resolver: Address,
    /// Only looked up when a resolver is set; `None` if it has no record.
    #[schemars(with = "Option<String>")]
    pub addr: Option<Address>,
    #[schemars(with = "Option<String>")]
    pub content: Option<B256>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct SubDomain {
    /// Label text, or `[labelhash]` when the text is unknown.
    pub label: String,
    #[schemars(with = "String")]
    pub label_hash: B256,
    pub decrypted: bool,
    #[schemars(with = "String")]
    pub node: B256,
    pub name: String,
    #[schemars(with = "String")]
    pub owner: Address,
}

impl Ens {
    pub(super) async fn owner_of(&self, node: B256) -> Result<Address> {
        let owner = self
            .query(self.registry, EnsRegistry::ownerCall { node })
            .await?;
        Ok(owner._0)
    }

    pub(super) async fn resolver_of(&self, node: B256) -> Result<Address> {
        let resolver = self
            .query(self.registry, EnsRegistry::resolverCall { node })
            .await?;
        Ok(resolver._0)
    }

    /// Zero address when the name is unowned.
    pub async fn get_owner(&self, name: &str) -> Result<Address> {
        self.owner_of(name_to_node(name)?).await
    }

    pub async fn set_owner(&self, name: &str, owner: Address) -> Result<TxReceipt> {
        let node = name_to_node(name)?;
        self.transact(self.registry, EnsRegistry::setOwnerCall { node, owner })
            .await
    }

    /// Creates or overwrites the owner of `label.parent`.
    pub async fn set_subnode_owner(
        &self,
        label: &str,
        parent: &str,
        owner: Address,
    ) -> Result<TxReceipt> {
        let label = normalize_label(label)?;
        let node = name_to_node(parent)?;
        let label = self.remember_label(&label);
        self.transact(
            self.registry,
            EnsRegistry::setSubnodeOwnerCall { node, label, owner },
        )
        .await
    }

    /// Zero address when no resolver is set.
    pub async fn get_resolver(&self, name: &str) -> Result<Address> {
        self.resolver_of(name_to_node(name)?).await
    }

    pub async fn set_resolver(&self, name: &str, resolver: Address) -> Result<TxReceipt> {
        let node = name_to_node(name)?;
        self.transact(self.registry, EnsRegistry::setResolverCall { node, resolver })
            .await
    }

    pub async fn get_ttl(&self, name: &str) -> Result<u64> {
        let node = name_to_node(name)?;
        let ttl = self
            .query(self.registry, EnsRegistry::ttlCall { node })
            .await?;
        Ok(ttl._0)
    }

    pub async fn set_ttl(&self, name: &str, ttl: u64) -> Result<TxReceipt> {
        let node = name_to_node(name)?;
        self.transact(self.registry, EnsRegistry::setTTLCall { node, ttl })
            .await
    }

    /// `label.parent` owned by the sender.
    pub async fn create_subdomain(&self, label: &str, parent: &str) -> Result<TxReceipt> {
        let owner = self.sender().await?;
        self.set_subnode_owner(label, parent, owner).await
    }

    /// Clears the subdomain's resolver if one is set (taking ownership first),
    /// then hands the subdomain to the zero address.
    pub async fn delete_subdomain(&self, label: &str, parent: &str) -> Result<TxReceipt> {
        let label = normalize_label(label)?;
        let parent = normalize_name(parent)?;
        let name = join_name(&label, &parent);
        let resolver = self.get_resolver(&name).await?;
        if !resolver.is_zero() {
            debug!(%name, %resolver, "clearing resolver before delete");
            let sender = self.sender().await?;
            self.set_subnode_owner(&label, &parent, sender).await?;
            self.set_resolver(&name, Address::ZERO).await?;
        }
        self.set_subnode_owner(&label, &parent, Address::ZERO)
            .await
    }

    pub async fn get_domain_details(&self, name: &str) -> Result<DomainDetails> {
        let name = normalize_name(name)?;
        let node = namehash(&name);
        let label = name.split('.').next().unwrap_or_default().to_string();
        let (owner, resolver) = tokio::try_join!(self.owner_of(node), self.resolver_of(node))?;
        let mut details = DomainDetails {
            label_hash: labelhash(&label),
            name,
            label,
            node,
            owner,
            resolver,
            addr: None,
            content: None,
        };
        if resolver.is_zero() {
            return Ok(details);
        }

        let (addr, content) = tokio::join!(
            self.addr_with_resolver(resolver, node),
            self.content_with_resolver(resolver, node)
        );
        details.addr = match addr {
            Ok(addr) => Some(addr),
            Err(err) if err.is_missing_record() => {
                warn!(name = %details.name, %err, "no addr record");
                None
            }
            Err(err) => return Err(err),
        };
        details.content = match content {
            Ok(content) => Some(content),
            Err(err) if err.is_missing_record() => {
                warn!(name = %details.name, %err, "no content record");
                None
            }
            Err(err) => return Err(err),
        };
        Ok(details)
    }

    /// Children of `name` seen in the registry's `NewOwner` events that still
    /// have an owner, in the order they were first created.
    pub async fn get_subdomains(&self, name: &str) -> Result<Vec<SubDomain>> {
        let parent = normalize_name(name)?;
        let node = namehash(&parent);
        let filter = LogFilter::new(self.registry)
            .topic(EnsRegistry::NewOwner::SIGNATURE_HASH)
            .topic(node);
        let logs = self.ledger.logs(filter).await?;

        let mut label_hashes: Vec<B256> = vec![];
        for log in logs.iter() {
            if let Some(event) = decode_event::<EnsRegistry::NewOwner>(&log.topics, &log.data)? {
                if event.node == node && !label_hashes.contains(&event.label) {
                    label_hashes.push(event.label);
                }
            }
        }

        let mut subdomains = vec![];
        for label_hash in label_hashes {
            let child = subnode(&node, &label_hash);
            let owner = self.owner_of(child).await?;
            if owner.is_zero() {
                continue;
            }
            let (label, decrypted) = self.label_text(&label_hash);
            subdomains.push(SubDomain {
                name: join_name(&label, &parent),
                label,
                label_hash,
                decrypted,
                node: child,
                owner,
            });
        }
        Ok(subdomains)
    }
}
