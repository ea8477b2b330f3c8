//! In-process ledger for tests. Runs registry, resolver and reverse registrar
//! logic on decoded call data, reverts the way a development node does, and
//! rolls back all state touched by a reverted transaction.

use crate::accessor::Ens;
use crate::ledger::{Ledger, LedgerError, Log, LogFilter, TxReceipt};
use alloy_sol_types::{SolCall, SolEvent, SolInterface};
use async_trait::async_trait;
use ens::registry::EnsRegistry::{self, EnsRegistryCalls};
use ens::resolver::PublicResolver::{self, PublicResolverCalls};
use ens::reverse_registrar::ReverseRegistrar::{self, ReverseRegistrarCalls};
use ens::utils::{keccak256, labelhash, namehash, reverse_node, subnode, REVERSE_SUFFIX};
use ens::{Address, B256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const REVERT: &str = "VM Exception while processing transaction: revert";

pub const FOO_CONTENT: &str = "0x736f6d65436f6e74656e74000000000000000000000000000000000000000001";

fn revert(reason: &str) -> LedgerError {
    LedgerError::Rpc {
        code: -32000,
        message: format!("{} {}", REVERT, reason),
    }
}

fn bad_call_data(err: alloy_sol_types::Error) -> LedgerError {
    revert(&err.to_string())
}

pub fn account(n: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xac;
    bytes[19] = n;
    Address::from(bytes)
}

#[derive(Clone, Default)]
struct Record {
    owner: Address,
    resolver: Address,
    ttl: u64,
}

#[derive(Clone, Default)]
struct RegistryState {
    records: HashMap<B256, Record>,
}

#[derive(Clone)]
struct ResolverState {
    registry: Address,
    addresses: HashMap<B256, Address>,
    contents: HashMap<B256, B256>,
    names: HashMap<B256, String>,
}

#[derive(Clone)]
struct ReverseRegistrarState {
    registry: Address,
    default_resolver: Address,
}

#[derive(Clone, Default)]
struct Chain {
    registries: HashMap<Address, RegistryState>,
    resolvers: HashMap<Address, ResolverState>,
    reverse_registrars: HashMap<Address, ReverseRegistrarState>,
    logs: Vec<Log>,
    block_number: u64,
    deployed: u8,
}

fn only_authorized(registry: &RegistryState, sender: &Address, node: &B256) -> Result<(), LedgerError> {
    match registry.records.get(node) {
        Some(record) if record.owner == *sender => Ok(()),
        _ => Err(revert("NotNodeOwner")),
    }
}

fn log<E: SolEvent>(address: Address, event: &E) -> Log {
    let data = event.encode_log_data();
    Log {
        address,
        topics: data.topics().to_vec(),
        data: data.data.to_vec(),
        block_number: 0,
    }
}

impl Chain {
    fn next_address(&mut self) -> Address {
        self.deployed += 1;
        let mut bytes = [0u8; 20];
        bytes[0] = 0xc0;
        bytes[19] = self.deployed;
        Address::from(bytes)
    }

    fn registry_owner(&self, registry: &Address, node: &B256) -> Address {
        self.registries
            .get(registry)
            .and_then(|state| state.records.get(node))
            .map(|record| record.owner)
            .unwrap_or_default()
    }

    fn registry_resolver(&self, registry: &Address, node: &B256) -> Address {
        self.registries
            .get(registry)
            .and_then(|state| state.records.get(node))
            .map(|record| record.resolver)
            .unwrap_or_default()
    }

    fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>, LedgerError> {
        if let Some(registry) = self.registries.get(to) {
            let record = |node: &B256| registry.records.get(node).cloned().unwrap_or_default();
            let call = EnsRegistryCalls::abi_decode(data, true).map_err(bad_call_data)?;
            return Ok(match call {
                EnsRegistryCalls::owner(call) => {
                    EnsRegistry::ownerCall::abi_encode_returns(&(record(&call.node).owner,))
                }
                EnsRegistryCalls::resolver(call) => {
                    EnsRegistry::resolverCall::abi_encode_returns(&(record(&call.node).resolver,))
                }
                EnsRegistryCalls::ttl(call) => {
                    EnsRegistry::ttlCall::abi_encode_returns(&(record(&call.node).ttl,))
                }
                _ => return Err(revert("NotAView")),
            });
        }
        if let Some(resolver) = self.resolvers.get(to) {
            let call = PublicResolverCalls::abi_decode(data, true).map_err(bad_call_data)?;
            return Ok(match call {
                PublicResolverCalls::addr(call) => {
                    let addr = resolver.addresses.get(&call.node).ok_or_else(|| revert("NoAddress"))?;
                    PublicResolver::addrCall::abi_encode_returns(&(*addr,))
                }
                PublicResolverCalls::content(call) => {
                    let hash = resolver.contents.get(&call.node).ok_or_else(|| revert("NoContent"))?;
                    PublicResolver::contentCall::abi_encode_returns(&(*hash,))
                }
                PublicResolverCalls::name(call) => {
                    let name = resolver.names.get(&call.node).cloned().unwrap_or_default();
                    PublicResolver::nameCall::abi_encode_returns(&(name,))
                }
                _ => return Err(revert("NotAView")),
            });
        }
        if let Some(registrar) = self.reverse_registrars.get(to) {
            let call = ReverseRegistrarCalls::abi_decode(data, true).map_err(bad_call_data)?;
            return Ok(match call {
                ReverseRegistrarCalls::node(call) => {
                    ReverseRegistrar::nodeCall::abi_encode_returns(&(reverse_node(&call.addr),))
                }
                ReverseRegistrarCalls::defaultResolver(_) => {
                    ReverseRegistrar::defaultResolverCall::abi_encode_returns(&(
                        registrar.default_resolver,
                    ))
                }
                _ => return Err(revert("NotAView")),
            });
        }
        // no code at this address
        Ok(vec![])
    }

    fn execute(
        &mut self,
        sender: Address,
        to: Address,
        data: &[u8],
        logs: &mut Vec<Log>,
    ) -> Result<Vec<u8>, LedgerError> {
        if self.registries.contains_key(&to) {
            let call = EnsRegistryCalls::abi_decode(data, true).map_err(bad_call_data)?;
            self.execute_registry(sender, to, call, logs)?;
            return Ok(vec![]);
        }
        if self.resolvers.contains_key(&to) {
            let call = PublicResolverCalls::abi_decode(data, true).map_err(bad_call_data)?;
            self.execute_resolver(sender, to, call)?;
            return Ok(vec![]);
        }
        if self.reverse_registrars.contains_key(&to) {
            let call = ReverseRegistrarCalls::abi_decode(data, true).map_err(bad_call_data)?;
            let node = self.execute_reverse_registrar(sender, to, call, logs)?;
            return Ok(ReverseRegistrar::claimCall::abi_encode_returns(&(node,)));
        }
        Ok(vec![])
    }

    fn execute_registry(
        &mut self,
        sender: Address,
        to: Address,
        call: EnsRegistryCalls,
        logs: &mut Vec<Log>,
    ) -> Result<(), LedgerError> {
        let registry = self
            .registries
            .get_mut(&to)
            .ok_or_else(|| revert("NoRegistry"))?;
        match call {
            EnsRegistryCalls::setSubnodeOwner(call) => {
                only_authorized(registry, &sender, &call.node)?;
                let child = subnode(&call.node, &call.label);
                registry.records.entry(child).or_default().owner = call.owner;
                let event = EnsRegistry::NewOwner {
                    node: call.node,
                    label: call.label,
                    owner: call.owner,
                };
                logs.push(log(to, &event));
            }
            EnsRegistryCalls::setOwner(call) => {
                only_authorized(registry, &sender, &call.node)?;
                registry.records.entry(call.node).or_default().owner = call.owner;
                let event = EnsRegistry::Transfer {
                    node: call.node,
                    owner: call.owner,
                };
                logs.push(log(to, &event));
            }
            EnsRegistryCalls::setResolver(call) => {
                only_authorized(registry, &sender, &call.node)?;
                registry.records.entry(call.node).or_default().resolver = call.resolver;
                let event = EnsRegistry::NewResolver {
                    node: call.node,
                    resolver: call.resolver,
                };
                logs.push(log(to, &event));
            }
            EnsRegistryCalls::setTTL(call) => {
                only_authorized(registry, &sender, &call.node)?;
                registry.records.entry(call.node).or_default().ttl = call.ttl;
                let event = EnsRegistry::NewTTL {
                    node: call.node,
                    ttl: call.ttl,
                };
                logs.push(log(to, &event));
            }
            _ => return Err(revert("NotATransaction")),
        }
        Ok(())
    }

    fn execute_resolver(
        &mut self,
        sender: Address,
        to: Address,
        call: PublicResolverCalls,
    ) -> Result<(), LedgerError> {
        let registry = match self.resolvers.get(&to) {
            Some(resolver) => resolver.registry,
            None => return Err(revert("NoResolver")),
        };
        let node = match &call {
            PublicResolverCalls::setAddr(call) => call.node,
            PublicResolverCalls::setContent(call) => call.node,
            PublicResolverCalls::setName(call) => call.node,
            _ => return Err(revert("NotATransaction")),
        };
        if self.registry_owner(&registry, &node) != sender {
            return Err(revert("NotNodeOwner"));
        }
        let resolver = self
            .resolvers
            .get_mut(&to)
            .ok_or_else(|| revert("NoResolver"))?;
        match call {
            PublicResolverCalls::setAddr(call) => {
                resolver.addresses.insert(call.node, call.addr);
            }
            PublicResolverCalls::setContent(call) => {
                resolver.contents.insert(call.node, call.hash);
            }
            PublicResolverCalls::setName(call) => {
                resolver.names.insert(call.node, call.name);
            }
            _ => return Err(revert("NotATransaction")),
        }
        Ok(())
    }

    fn claim_with_resolver(
        &mut self,
        registrar: Address,
        sender: Address,
        owner: Address,
        resolver: Address,
        logs: &mut Vec<Log>,
    ) -> Result<B256, LedgerError> {
        let registry = self
            .reverse_registrars
            .get(&registrar)
            .map(|state| state.registry)
            .ok_or_else(|| revert("NoReverseRegistrar"))?;
        let reverse_base = namehash(REVERSE_SUFFIX);
        let label = labelhash(&hex::encode(sender.as_slice()));
        let node = subnode(&reverse_base, &label);
        let current_owner = self.registry_owner(&registry, &node);

        if !resolver.is_zero() && resolver != self.registry_resolver(&registry, &node) {
            if current_owner != registrar {
                let call = EnsRegistry::setSubnodeOwnerCall {
                    node: reverse_base,
                    label,
                    owner: registrar,
                };
                self.execute(registrar, registry, &call.abi_encode(), logs)?;
            }
            let call = EnsRegistry::setResolverCall { node, resolver };
            self.execute(registrar, registry, &call.abi_encode(), logs)?;
        }
        if self.registry_owner(&registry, &node) != owner {
            let call = EnsRegistry::setSubnodeOwnerCall {
                node: reverse_base,
                label,
                owner,
            };
            self.execute(registrar, registry, &call.abi_encode(), logs)?;
        }
        Ok(node)
    }

    fn execute_reverse_registrar(
        &mut self,
        sender: Address,
        to: Address,
        call: ReverseRegistrarCalls,
        logs: &mut Vec<Log>,
    ) -> Result<B256, LedgerError> {
        match call {
            ReverseRegistrarCalls::claim(call) => {
                self.claim_with_resolver(to, sender, call.owner, Address::ZERO, logs)
            }
            ReverseRegistrarCalls::claimWithResolver(call) => {
                self.claim_with_resolver(to, sender, call.owner, call.resolver, logs)
            }
            ReverseRegistrarCalls::setName(call) => {
                let default_resolver = self
                    .reverse_registrars
                    .get(&to)
                    .map(|state| state.default_resolver)
                    .ok_or_else(|| revert("NoReverseRegistrar"))?;
                let node = self.claim_with_resolver(to, sender, to, default_resolver, logs)?;
                let set_name = PublicResolver::setNameCall {
                    node,
                    name: call.name,
                };
                self.execute(to, default_resolver, &set_name.abi_encode(), logs)?;
                Ok(node)
            }
            _ => Err(revert("NotATransaction")),
        }
    }
}

pub struct MockLedger {
    accounts: Vec<Address>,
    chain: Mutex<Chain>,
}

impl MockLedger {
    pub fn new(accounts: Vec<Address>) -> Self {
        MockLedger {
            accounts,
            chain: Mutex::new(Chain::default()),
        }
    }

    /// Registry whose root node is owned by `owner`.
    pub fn deploy_registry(&self, owner: Address) -> Address {
        let mut chain = self.chain.lock().unwrap();
        let address = chain.next_address();
        let mut state = RegistryState::default();
        state.records.insert(
            B256::ZERO,
            Record {
                owner,
                ..Record::default()
            },
        );
        chain.registries.insert(address, state);
        address
    }

    pub fn deploy_resolver(&self, registry: Address) -> Address {
        let mut chain = self.chain.lock().unwrap();
        let address = chain.next_address();
        chain.resolvers.insert(
            address,
            ResolverState {
                registry,
                addresses: HashMap::new(),
                contents: HashMap::new(),
                names: HashMap::new(),
            },
        );
        address
    }

    pub fn deploy_reverse_registrar(&self, registry: Address, default_resolver: Address) -> Address {
        let mut chain = self.chain.lock().unwrap();
        let address = chain.next_address();
        chain.reverse_registrars.insert(
            address,
            ReverseRegistrarState {
                registry,
                default_resolver,
            },
        );
        address
    }

    pub fn submit(&self, from: Address, to: Address, data: &[u8]) -> Result<TxReceipt, LedgerError> {
        let mut chain = self.chain.lock().unwrap();
        let snapshot = chain.clone();
        let mut logs = vec![];
        if let Err(err) = chain.execute(from, to, data, &mut logs) {
            *chain = snapshot;
            return Err(err);
        }
        chain.block_number += 1;
        let block_number = chain.block_number;
        for log in logs.iter_mut() {
            log.block_number = block_number;
        }
        chain.logs.extend(logs.iter().cloned());
        Ok(TxReceipt {
            transaction_hash: B256::from(keccak256(&block_number.to_be_bytes())),
            block_number,
            logs,
        })
    }

    pub fn log_count(&self) -> usize {
        self.chain.lock().unwrap().logs.len()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn accounts(&self) -> Result<Vec<Address>, LedgerError> {
        Ok(self.accounts.clone())
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, LedgerError> {
        self.chain.lock().unwrap().call(&to, &data)
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Vec<u8>,
    ) -> Result<TxReceipt, LedgerError> {
        self.submit(from, to, &data)
    }

    async fn logs(&self, filter: LogFilter) -> Result<Vec<Log>, LedgerError> {
        let chain = self.chain.lock().unwrap();
        Ok(chain
            .logs
            .iter()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect())
    }
}

pub struct TestEns {
    pub ledger: Arc<MockLedger>,
    pub ens: Ens,
    pub accounts: Vec<Address>,
    pub deployer: Address,
    pub registry: Address,
    pub resolver: Address,
    pub reverse_registrar: Address,
}

/// Registry, public resolver and reverse registrar seeded with dummy names:
/// `foo.eth` (resolver, addr, content), `bar.eth` (resolver only),
/// `foobar.eth`, `givethisaway.eth`, `givesub.eth`, and the reverse record
/// `deployer.eth` for the deployer.
pub fn deploy_test_ens() -> TestEns {
    let accounts: Vec<Address> = (0..4).map(account).collect();
    let deployer = accounts[0];
    let ledger = Arc::new(MockLedger::new(accounts.clone()));
    let registry = ledger.deploy_registry(deployer);
    let resolver = ledger.deploy_resolver(registry);
    let reverse_registrar = ledger.deploy_reverse_registrar(registry, resolver);

    let exec = |to: Address, data: Vec<u8>| {
        ledger.submit(deployer, to, &data).unwrap();
    };
    let set_subnode_owner = |parent: &str, label: &str, owner: Address| {
        let call = EnsRegistry::setSubnodeOwnerCall {
            node: namehash(parent),
            label: labelhash(label),
            owner,
        };
        exec(registry, call.abi_encode());
    };

    set_subnode_owner("", "eth", deployer);
    set_subnode_owner("", "reverse", deployer);
    set_subnode_owner("reverse", "addr", reverse_registrar);
    for label in ["foo", "bar", "foobar", "givethisaway", "givesub"].iter() {
        set_subnode_owner("eth", label, deployer);
    }
    for name in ["foo.eth", "bar.eth"].iter() {
        let call = EnsRegistry::setResolverCall {
            node: namehash(name),
            resolver,
        };
        exec(registry, call.abi_encode());
    }
    let set_addr = PublicResolver::setAddrCall {
        node: namehash("foo.eth"),
        addr: deployer,
    };
    exec(resolver, set_addr.abi_encode());
    let set_content = PublicResolver::setContentCall {
        node: namehash("foo.eth"),
        hash: FOO_CONTENT.parse().unwrap(),
    };
    exec(resolver, set_content.abi_encode());
    let set_name = ReverseRegistrar::setNameCall {
        name: String::from("deployer.eth"),
    };
    exec(reverse_registrar, set_name.abi_encode());

    let ens = Ens::new(ledger.clone(), registry);
    TestEns {
        ledger,
        ens,
        accounts,
        deployer,
        registry,
        resolver,
        reverse_registrar,
    }
}
